use std::time::Duration;

use futures::Stream;
use futures::TryStreamExt;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use super::models::{ApiConfig, DownloadRequest, DownloadResponse, ErrorResponse};

#[derive(Error, Debug)]
pub enum ApiError {
    /// No response was obtained at all.
    #[error("{0}")]
    RequestError(#[from] reqwest::Error),

    #[error("{message}")]
    ServiceError { status: StatusCode, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    request_timeout: Duration,
    read_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        // No overall timeout on the client: artifact bodies may take a long time
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            http,
            request_timeout: config.request_timeout,
            read_timeout: config.read_timeout,
        }
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Ask the extraction service to resolve `source_link`.
    pub async fn request_download(&self, target: &Url, source_link: &str) -> Result<DownloadResponse> {
        tracing::debug!(%target, "Submitting extraction request");

        let response = self
            .http
            .post(target.clone())
            .timeout(self.request_timeout)
            .json(&DownloadRequest { url: source_link })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = ErrorResponse::message_from_body(&body);
            tracing::info!(%status, %message, "Extraction service rejected request");
            return Err(ApiError::ServiceError { status, message });
        }

        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode error: {}", e)))
    }

    /// Download the artifact with a progress stream.
    /// Returns (total_size, stream)
    pub async fn download_file_stream(
        &self,
        artifact_url: &Url,
    ) -> Result<(Option<u64>, impl Stream<Item = Result<bytes::Bytes>>)> {
        let response = self
            .http
            .get(artifact_url.clone())
            .send()
            .await?
            .error_for_status()?;

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(ApiError::RequestError);

        Ok((total_size, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::GENERIC_FAILURE_MESSAGE;
    use futures::TryStreamExt;
    use mockito::Matcher;
    use serde_json::json;

    fn target(server: &mockito::Server) -> Url {
        Url::parse(&format!("{}/download", server.url())).unwrap()
    }

    #[tokio::test]
    async fn test_request_download_posts_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/download")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"url": "https://instagram.com/p/xyz"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"download_url": "/files/xyz.mp4"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(ApiConfig::default());
        let response = client
            .request_download(&target(&server), "https://instagram.com/p/xyz")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.download_url.as_deref(), Some("/files/xyz.mp4"));
        assert_eq!(response.force_download_url, None);
    }

    #[tokio::test]
    async fn test_service_error_carries_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/download")
            .with_status(422)
            .with_body(r#"{"detail": "Unsupported platform"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(ApiConfig::default());
        let err = client
            .request_download(&target(&server), "https://example.com/v")
            .await
            .unwrap_err();

        match err {
            ApiError::ServiceError { status, message } => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
                assert_eq!(message, "Unsupported platform");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_service_error_with_unparseable_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/download")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let client = ApiClient::new(ApiConfig::default());
        let err = client
            .request_download(&target(&server), "https://example.com/v")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), GENERIC_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_success_with_invalid_json() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/download")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = ApiClient::new(ApiConfig::default());
        let err = client
            .request_download(&target(&server), "https://example.com/v")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_download_file_stream() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/files/clip.mp4")
            .with_status(200)
            .with_body("0123456789")
            .create_async()
            .await;

        let client = ApiClient::new(ApiConfig::default());
        let url = Url::parse(&format!("{}/files/clip.mp4", server.url())).unwrap();
        let (total, stream) = client.download_file_stream(&url).await.unwrap();
        let chunks: Vec<bytes::Bytes> = stream.try_collect().await.unwrap();

        assert_eq!(total, Some(10));
        assert_eq!(chunks.concat(), b"0123456789");
    }

    #[tokio::test]
    async fn test_download_file_stream_rejects_missing_file() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/files/gone.mp4")
            .with_status(404)
            .create_async()
            .await;

        let client = ApiClient::new(ApiConfig::default());
        let url = Url::parse(&format!("{}/files/gone.mp4", server.url())).unwrap();

        assert!(client.download_file_stream(&url).await.is_err());
    }

    #[tokio::test]
    async fn test_extraction_request_times_out() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target = Url::parse(&format!("http://{}/download", listener.local_addr().unwrap())).unwrap();
        let client = ApiClient::new(ApiConfig {
            request_timeout: Duration::from_millis(200),
            ..ApiConfig::default()
        });

        let err = client
            .request_download(&target, "https://example.com/v")
            .await
            .unwrap_err();

        match err {
            ApiError::RequestError(e) => assert!(e.is_timeout()),
            other => panic!("unexpected error: {other:?}"),
        }
        drop(listener);
    }
}
