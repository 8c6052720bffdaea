use std::path::PathBuf;

use futures::StreamExt;
use iced::{task, Task};
use url::Url;

use crate::api::ApiClient;
use crate::application::{
    Acquirer, DownloadCoordinator, DownloadOrchestrator, Session, SubmitRejected, TransferEvent,
};
use crate::config::AppConfig;
use crate::domain::{ExtractionResult, RequestState, TransferState};
use crate::ui::{DownloadMessage, DownloadView};
use crate::utils::partial_path;

pub struct DownloadApp {
    view: DownloadView,
    session: Session,
    orchestrator: DownloadOrchestrator,
    coordinator: DownloadCoordinator,
    // Events from older transfers are ignored
    transfer_generation: u64,
    active_transfer: Option<ActiveTransfer>,
}

/// Transfer currently shown in the view.
struct ActiveTransfer {
    handle: task::Handle,
    path: PathBuf,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new(AppConfig::from_env())
    }
}

impl DownloadApp {
    pub fn new(config: AppConfig) -> Self {
        let api_client = ApiClient::new(config.api_config());
        let endpoint = config.endpoint_resolver().resolve().clone();
        let acquirer = Acquirer::new(config.download_dir.clone(), config.auto_download);

        Self {
            view: DownloadView::default(),
            session: Session::default(),
            orchestrator: DownloadOrchestrator::new(api_client.clone(), endpoint, acquirer),
            coordinator: DownloadCoordinator::new(api_client),
            transfer_generation: 0,
            active_transfer: None,
        }
    }

    fn artifact_url(&self) -> Option<Url> {
        match self.session.state() {
            RequestState::Succeeded(Some(acquisition)) => Some(acquisition.artifact_url.clone()),
            _ => None,
        }
    }

    /// Stops the transfer in the view, if any, and drops its partial file.
    fn cancel_transfer(&mut self) {
        self.transfer_generation += 1;
        self.view.transfer = TransferState::Idle;

        if let Some(active) = self.active_transfer.take() {
            active.handle.abort();
            let part_path = partial_path(&active.path);
            if let Err(e) = std::fs::remove_file(&part_path) {
                tracing::debug!("Could not remove {}: {}", part_path.display(), e);
            }
            tracing::info!("Cancelled transfer to {}", active.path.display());
        }
    }

    fn start_transfer(&mut self, url: Url, path: PathBuf) -> Task<Message> {
        self.cancel_transfer();
        self.view.transfer = TransferState::Downloading(0.0);

        let generation = self.transfer_generation;
        let (transfer, handle) = Task::stream(
            self.coordinator
                .download_stream(url, path.clone())
                .map(move |event| Message::Transfer(generation, event)),
        )
        .abortable();
        self.active_transfer = Some(ActiveTransfer { handle, path });

        transfer
    }
}

/// The work behind `Message::SubmissionFinished`. It always resolves to a
/// result, so the session always leaves `Pending`.
async fn submit_link(orchestrator: DownloadOrchestrator, source_link: String) -> ExtractionResult {
    orchestrator.submit(&source_link).await
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    SubmissionFinished(ExtractionResult),
    /// (Selected Path, Artifact URL)
    SaveLocationSelected(Option<PathBuf>, Url),
    /// (Transfer generation, event)
    Transfer(u64, TransferEvent),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::SubmitPressed => match app.session.begin(&app.view.source_link) {
                    Ok(source_link) => {
                        app.view.notice = None;
                        app.cancel_transfer();

                        let orchestrator = app.orchestrator.clone();
                        tracing::debug!(
                            "Submitting {} to {}",
                            source_link,
                            orchestrator.endpoint()
                        );

                        // iced Task::perform runs in the background tokio executor
                        return Task::perform(
                            submit_link(orchestrator, source_link),
                            Message::SubmissionFinished,
                        );
                    }
                    Err(SubmitRejected::AlreadyPending) => {
                        tracing::debug!("Ignoring submit while a request is pending");
                    }
                    Err(rejected) => {
                        app.view.notice = Some(rejected.to_string());
                    }
                },
                DownloadMessage::SaveAsPressed => {
                    if let Some(url) = app.artifact_url() {
                        let coordinator = app.coordinator.clone();
                        return Task::perform(
                            async move {
                                let path = coordinator.choose_save_path(&url).await;
                                (path, url)
                            },
                            |(path, url)| Message::SaveLocationSelected(path, url),
                        );
                    }
                }
                DownloadMessage::CopyLinkPressed => {
                    if let Some(url) = app.artifact_url() {
                        return iced::clipboard::write(url.to_string());
                    }
                }
                DownloadMessage::SourceLinkChanged(_) => {}
            }
        }
        Message::SubmissionFinished(result) => {
            if let RequestState::Succeeded(Some(acquisition)) = app.session.finish(result) {
                if let Some(path) = acquisition.auto_save_path.clone() {
                    let url = acquisition.artifact_url.clone();
                    return app.start_transfer(url, path);
                }
            }
        }
        Message::SaveLocationSelected(path_opt, url) => match path_opt {
            Some(path) => return app.start_transfer(url, path),
            // User cancelled dialog
            None => tracing::debug!("Save dialog cancelled"),
        },
        Message::Transfer(generation, event) => {
            if generation != app.transfer_generation {
                return Task::none();
            }
            app.view.transfer = match event {
                TransferEvent::Progress(progress) => TransferState::Downloading(progress),
                TransferEvent::Completed(path) => {
                    app.active_transfer = None;
                    TransferState::Saved(path)
                }
                TransferEvent::Failed(e) => {
                    tracing::warn!("Transfer failed: {}", e);
                    app.active_transfer = None;
                    TransferState::Failed(e.user_message())
                }
            };
        }
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view
        .view(app.session.state())
        .map(Message::UiMessage)
}
