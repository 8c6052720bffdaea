use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback message when an error response has no usable `detail`.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong.";

/// Body of `POST /download`
#[derive(Debug, Clone, Serialize)]
pub struct DownloadRequest<'a> {
    pub url: &'a str,
}

/// Successful response from `POST /download`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DownloadResponse {
    #[serde(default)]
    pub force_download_url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl DownloadResponse {
    /// First non-empty artifact location, forced variant first.
    pub fn artifact_location(&self) -> Option<&str> {
        [&self.force_download_url, &self.download_url]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .map(str::trim)
            .find(|location| !location.is_empty())
    }
}

/// Error response body, `{"detail": ...}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorResponse {
    /// Human readable reason for a failed request body, or the generic message.
    pub fn message_from_body(body: &str) -> String {
        serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|response| response.detail_message())
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
    }

    fn detail_message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
            // Validation errors come back as a list of {"msg": ...} entries
            Value::Array(entries) => {
                let messages: Vec<&str> = entries
                    .iter()
                    .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                    .collect();
                (!messages.is_empty()).then(|| messages.join("; "))
            }
            _ => None,
        }
    }
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Limit for the whole extraction request.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Longest wait for the next chunk of an artifact body.
    pub read_timeout: Duration,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            user_agent: format!("video-dl-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
