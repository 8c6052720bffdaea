use thiserror::Error;

/// Message shown when a failure carries no usable text.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// No response was obtained from the extraction service.
    #[error("{0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("{0}")]
    Service(String),

    #[error("Invalid response format: {0}")]
    MalformedResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl AppError {
    /// Text surfaced to the user for this failure.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(e: url::ParseError) -> Self {
        AppError::InvalidUrl(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}
