use url::Url;

use crate::{
    api::{ApiClient, ApiError},
    config::ResolvedEndpoint,
    domain::{Acquisition, AppError, ExtractionResult},
};

use super::acquisition::Acquirer;

/// Path of the extraction endpoint, relative to the resolved base.
pub const EXTRACTION_PATH: &str = "/download";

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::RequestError(e) => AppError::Transport(e.to_string()),
            ApiError::ServiceError { message, .. } => AppError::Service(message),
            ApiError::InvalidResponse(message) => AppError::MalformedResponse(message),
        }
    }
}

/// Runs one request/response/acquisition cycle per submission.
#[derive(Clone)]
pub struct DownloadOrchestrator {
    api_client: ApiClient,
    endpoint: ResolvedEndpoint,
    acquirer: Acquirer,
}

impl DownloadOrchestrator {
    pub fn new(api_client: ApiClient, endpoint: ResolvedEndpoint, acquirer: Acquirer) -> Self {
        Self {
            api_client,
            endpoint,
            acquirer,
        }
    }

    pub fn endpoint(&self) -> &ResolvedEndpoint {
        &self.endpoint
    }

    /// Submit `source_link` and normalize whatever comes back. Never fails:
    /// every error is folded into `ExtractionResult::Failure`.
    /// Blank links are turned away earlier by `Session::begin`.
    pub async fn submit(&self, source_link: &str) -> ExtractionResult {
        match self.extract(source_link).await {
            Ok(Some(artifact_url)) => {
                tracing::info!("Artifact ready at {}", artifact_url);
                ExtractionResult::Success(self.acquire(artifact_url))
            }
            Ok(None) => {
                tracing::info!("Extraction succeeded without an artifact location");
                ExtractionResult::NoArtifact
            }
            Err(e) => {
                tracing::warn!("Extraction failed for {}: {}", source_link, e);
                ExtractionResult::Failure {
                    message: e.user_message(),
                }
            }
        }
    }

    async fn extract(&self, source_link: &str) -> Result<Option<Url>, AppError> {
        let target = self.endpoint.join_path(EXTRACTION_PATH)?;
        let response = self.api_client.request_download(&target, source_link).await?;

        response
            .artifact_location()
            .map(|location| self.endpoint.resolve_artifact(location))
            .transpose()
    }

    fn acquire(&self, artifact_url: Url) -> Acquisition {
        self.acquirer.trigger(artifact_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::GENERIC_FAILURE_MESSAGE;
    use crate::api::ApiConfig;
    use mockito::Matcher;
    use serde_json::json;

    fn orchestrator(base: &str, download_dir: &std::path::Path) -> DownloadOrchestrator {
        DownloadOrchestrator::new(
            ApiClient::new(ApiConfig::default()),
            ResolvedEndpoint::parse(base).unwrap(),
            Acquirer::new(download_dir.to_path_buf(), true),
        )
    }

    async fn mock_success(server: &mut mockito::Server, body: serde_json::Value) -> mockito::Mock {
        server
            .mock("POST", "/download")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_relative_download_url_is_resolved() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/download")
            .match_body(Matcher::Json(json!({"url": "https://instagram.com/p/xyz"})))
            .with_status(200)
            .with_body(r#"{"download_url": "/files/xyz.mp4"}"#)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let result = orchestrator(&server.url(), dir.path())
            .submit("https://instagram.com/p/xyz")
            .await;

        mock.assert_async().await;
        match result {
            ExtractionResult::Success(acquisition) => {
                assert_eq!(
                    acquisition.artifact_url.as_str(),
                    format!("{}/files/xyz.mp4", server.url())
                );
                assert_eq!(acquisition.auto_save_path, Some(dir.path().join("xyz.mp4")));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_forced_url_takes_precedence() {
        let mut server = mockito::Server::new_async().await;
        mock_success(
            &mut server,
            json!({
                "force_download_url": "/force/xyz.mp4",
                "download_url": "https://cdn.example.net/xyz.mp4"
            }),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();

        let result = orchestrator(&server.url(), dir.path())
            .submit("https://www.tiktok.com/@a/video/1")
            .await;

        let ExtractionResult::Success(acquisition) = result else {
            panic!("expected success, got {result:?}");
        };
        assert_eq!(
            acquisition.artifact_url.as_str(),
            format!("{}/force/xyz.mp4", server.url())
        );
    }

    #[tokio::test]
    async fn test_absolute_url_is_unchanged() {
        let mut server = mockito::Server::new_async().await;
        mock_success(
            &mut server,
            json!({"download_url": "https://cdn.example.net/v/clip.mp4?sig=abc"}),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();

        let result = orchestrator(&server.url(), dir.path())
            .submit("https://facebook.com/watch?v=1")
            .await;

        let ExtractionResult::Success(acquisition) = result else {
            panic!("expected success, got {result:?}");
        };
        assert_eq!(
            acquisition.artifact_url.as_str(),
            "https://cdn.example.net/v/clip.mp4?sig=abc"
        );
    }

    #[tokio::test]
    async fn test_missing_fields_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        mock_success(&mut server, json!({"title": "clip", "download_url": ""})).await;
        let dir = tempfile::tempdir().unwrap();

        let result = orchestrator(&server.url(), dir.path())
            .submit("https://instagram.com/p/xyz")
            .await;

        assert_eq!(result, ExtractionResult::NoArtifact);
    }

    #[tokio::test]
    async fn test_service_detail_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/download")
            .with_status(422)
            .with_body(r#"{"detail": "Unsupported platform"}"#)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let result = orchestrator(&server.url(), dir.path())
            .submit("https://example.org/video")
            .await;

        assert_eq!(
            result,
            ExtractionResult::Failure {
                message: "Unsupported platform".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unparseable_error_body_uses_generic_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/download")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let result = orchestrator(&server.url(), dir.path())
            .submit("https://example.org/video")
            .await;

        assert_eq!(
            result,
            ExtractionResult::Failure {
                message: GENERIC_FAILURE_MESSAGE.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_success_body_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/download")
            .with_status(200)
            .with_body("<html>ok</html>")
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();

        let result = orchestrator(&server.url(), dir.path())
            .submit("https://example.org/video")
            .await;

        assert!(matches!(result, ExtractionResult::Failure { message } if message.starts_with("Invalid response format")));
    }

    #[tokio::test]
    async fn test_bad_artifact_location_fails() {
        let mut server = mockito::Server::new_async().await;
        mock_success(&mut server, json!({"download_url": "//bad host/file.mp4"})).await;
        let dir = tempfile::tempdir().unwrap();

        let result = orchestrator(&server.url(), dir.path())
            .submit("https://example.org/video")
            .await;

        assert!(matches!(result, ExtractionResult::Failure { message } if message.starts_with("Invalid URL")));
    }

    #[tokio::test]
    async fn test_transport_error() {
        // Nothing listens on the discard port
        let dir = tempfile::tempdir().unwrap();
        let result = orchestrator("http://127.0.0.1:9", dir.path())
            .submit("https://example.org/video")
            .await;

        match result {
            ExtractionResult::Failure { message } => assert!(!message.is_empty()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_repeat_submission_is_classified_the_same() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/download")
            .with_status(200)
            .with_body(r#"{"download_url": "/files/xyz.mp4"}"#)
            .expect(2)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(&server.url(), dir.path());

        let first = orchestrator.submit("https://instagram.com/p/xyz").await;
        let second = orchestrator.submit("https://instagram.com/p/xyz").await;

        assert!(matches!(first, ExtractionResult::Success(_)));
        assert!(matches!(second, ExtractionResult::Success(_)));
    }
}
