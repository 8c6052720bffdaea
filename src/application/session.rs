//! UI-facing request state and the one-submission-at-a-time gate.

use thiserror::Error;

use crate::domain::{ExtractionResult, RequestState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("Enter a URL")]
    EmptyLink,

    #[error("A download request is already in progress")]
    AlreadyPending,
}

#[derive(Debug, Default)]
pub struct Session {
    state: RequestState,
}

impl Session {
    pub fn state(&self) -> &RequestState {
        &self.state
    }

    /// Clears the previous outcome and enters `Pending`.
    /// Returns the trimmed link to submit.
    pub fn begin(&mut self, source_link: &str) -> Result<String, SubmitRejected> {
        if self.state.is_pending() {
            return Err(SubmitRejected::AlreadyPending);
        }

        let source_link = source_link.trim();
        if source_link.is_empty() {
            return Err(SubmitRejected::EmptyLink);
        }

        self.state = RequestState::Pending;
        Ok(source_link.to_string())
    }

    /// Records the outcome and leaves `Pending`.
    pub fn finish(&mut self, result: ExtractionResult) -> &RequestState {
        self.state = result.into();
        &self.state
    }
}
