use iced::{
    widget::{button, column, row, text, text_input, Column, Space},
    Element, Length,
};

use crate::domain::{Acquisition, RequestState, TransferState};

/// Main view state
pub struct DownloadView {
    pub source_link: String,
    /// Shown while idle, e.g. when an empty link was submitted.
    pub notice: Option<String>,
    pub transfer: TransferState,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            source_link: String::new(),
            notice: None,
            transfer: TransferState::Idle,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    SourceLinkChanged(String),
    SubmitPressed,
    SaveAsPressed,
    CopyLinkPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::SourceLinkChanged(link) => {
                self.source_link = link;
                self.notice = None;
            }
            // Will be handled by the app
            DownloadMessage::SubmitPressed
            | DownloadMessage::SaveAsPressed
            | DownloadMessage::CopyLinkPressed => {}
        }
    }

    pub fn view<'a>(&'a self, request: &'a RequestState) -> Element<'a, DownloadMessage> {
        let pending = request.is_pending();

        let mut input = text_input("Paste a video link...", &self.source_link).padding(10);
        if !pending {
            input = input
                .on_input(DownloadMessage::SourceLinkChanged)
                .on_submit(DownloadMessage::SubmitPressed);
        }

        let content = column![
            text("Video Downloader").size(32),
            text("Instagram, Facebook and TikTok links").size(14),
            Space::new().height(Length::Fixed(20.0)),
            input,
            button(if pending { "Working..." } else { "Download" })
                .on_press_maybe((!pending).then_some(DownloadMessage::SubmitPressed))
                .padding([10, 20]),
            Space::new().height(Length::Fixed(10.0)),
        ]
        .padding(20)
        .spacing(10);

        self.status(content, request).into()
    }

    fn status<'a>(
        &'a self,
        content: Column<'a, DownloadMessage>,
        request: &'a RequestState,
    ) -> Column<'a, DownloadMessage> {
        match request {
            RequestState::Idle => match &self.notice {
                Some(notice) => content.push(text(notice).size(14)),
                None => content,
            },
            RequestState::Pending => content.push(text("Fetching download link...").size(14)),
            RequestState::Failed(message) => content.push(text(format!("Error: {}", message)).size(14)),
            RequestState::Succeeded(None) => content.push(
                text("The request completed but no download link was returned.").size(14),
            ),
            RequestState::Succeeded(Some(acquisition)) => content
                .push(text("Download ready").size(18))
                .push(text(acquisition.artifact_url.as_str()).size(12))
                .push(text(self.transfer_status(acquisition)).size(14))
                .push(row![
                    button("Save as...")
                        .on_press(DownloadMessage::SaveAsPressed)
                        .padding([8, 16]),
                    button("Copy link")
                        .on_press(DownloadMessage::CopyLinkPressed)
                        .padding([8, 16]),
                ]
                .spacing(10)),
        }
    }

    fn transfer_status(&self, acquisition: &Acquisition) -> String {
        match &self.transfer {
            TransferState::Idle if acquisition.triggered() => "Starting download...".to_string(),
            TransferState::Idle => {
                "Automatic download unavailable, use Save as... or copy the link".to_string()
            }
            TransferState::Downloading(progress) if *progress > 0.0 => {
                format!("Downloading: {:.1}%", progress * 100.0)
            }
            TransferState::Downloading(_) => "Downloading...".to_string(),
            TransferState::Saved(path) => format!("Saved: {}", path.display()),
            TransferState::Failed(message) => format!("Download failed: {}", message),
        }
    }
}
