use std::path::PathBuf;

use url::Url;

/// Artifact produced by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquisition {
    pub artifact_url: Url,
    /// Where the automatic download will be written, if it could be armed.
    pub auto_save_path: Option<PathBuf>,
}

impl Acquisition {
    pub fn triggered(&self) -> bool {
        self.auto_save_path.is_some()
    }
}

/// Normalized outcome of one extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Success(Acquisition),
    /// 2xx response that carried no artifact location.
    NoArtifact,
    Failure { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Succeeded(Option<Acquisition>),
    Failed(String),
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }
}

impl From<ExtractionResult> for RequestState {
    fn from(result: ExtractionResult) -> Self {
        match result {
            ExtractionResult::Success(acquisition) => RequestState::Succeeded(Some(acquisition)),
            ExtractionResult::NoArtifact => RequestState::Succeeded(None),
            ExtractionResult::Failure { message } => RequestState::Failed(message),
        }
    }
}

/// Progress of the file transfer that follows a successful submission.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TransferState {
    #[default]
    Idle,
    Downloading(f32),
    Saved(PathBuf),
    Failed(String),
}
