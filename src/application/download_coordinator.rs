use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::{stream::BoxStream, StreamExt};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::{
    api::ApiClient,
    domain::AppError,
    utils::{filename_from_url, partial_path},
};

#[derive(Debug, Clone)]
pub enum TransferEvent {
    Progress(f32),
    Completed(PathBuf),
    Failed(AppError),
}

/// Streams artifacts to disk.
#[derive(Clone)]
pub struct DownloadCoordinator {
    api_client: ApiClient,
}

impl DownloadCoordinator {
    pub fn new(api_client: ApiClient) -> Self {
        Self { api_client }
    }

    pub async fn choose_save_path(&self, artifact_url: &Url) -> Option<PathBuf> {
        rfd::AsyncFileDialog::new()
            .set_file_name(filename_from_url(artifact_url))
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    /// Writes into `<path>.part` and renames once the body is complete.
    pub fn download_stream(&self, url: Url, path: PathBuf) -> BoxStream<'static, TransferEvent> {
        futures::stream::unfold(
            TransferRuntimeState::Start {
                client: self.api_client.clone(),
                url,
                path,
            },
            |state| async move {
                match state {
                    TransferRuntimeState::Start { client, url, path } => {
                        tracing::info!("Downloading {} to {}", url, path.display());
                        let part_path = partial_path(&path);

                        let file = match tokio::fs::File::create(&part_path).await {
                            Ok(file) => file,
                            Err(e) => {
                                return Some((
                                    TransferEvent::Failed(AppError::Io(format!(
                                        "Failed to create file: {}",
                                        e
                                    ))),
                                    TransferRuntimeState::Finished,
                                ));
                            }
                        };

                        match client.download_file_stream(&url).await {
                            Ok((total_size, stream)) => Some((
                                TransferEvent::Progress(0.0),
                                TransferRuntimeState::Downloading {
                                    file,
                                    stream: stream.boxed(),
                                    read_timeout: client.read_timeout(),
                                    downloaded: 0,
                                    total: total_size,
                                    path,
                                    part_path,
                                },
                            )),
                            Err(e) => {
                                drop(file);
                                discard(&part_path).await;
                                Some((
                                    TransferEvent::Failed(AppError::from(e)),
                                    TransferRuntimeState::Finished,
                                ))
                            }
                        }
                    }
                    TransferRuntimeState::Downloading {
                        mut file,
                        mut stream,
                        read_timeout,
                        mut downloaded,
                        total,
                        path,
                        part_path,
                    } => match tokio::time::timeout(read_timeout, stream.next()).await {
                        Err(_) => {
                            drop(file);
                            discard(&part_path).await;
                            Some((
                                TransferEvent::Failed(AppError::Transport(format!(
                                    "No data received for {} seconds",
                                    read_timeout.as_secs_f32()
                                ))),
                                TransferRuntimeState::Finished,
                            ))
                        }
                        Ok(Some(Ok(chunk))) => {
                            if let Err(e) = file.write_all(&chunk).await {
                                drop(file);
                                discard(&part_path).await;
                                return Some((
                                    TransferEvent::Failed(AppError::Io(format!(
                                        "Write error: {}",
                                        e
                                    ))),
                                    TransferRuntimeState::Finished,
                                ));
                            }

                            downloaded += chunk.len() as u64;

                            let progress = match total {
                                Some(total_size) if total_size > 0 => {
                                    (downloaded as f32 / total_size as f32).min(1.0)
                                }
                                _ => 0.0,
                            };

                            Some((
                                TransferEvent::Progress(progress),
                                TransferRuntimeState::Downloading {
                                    file,
                                    stream,
                                    read_timeout,
                                    downloaded,
                                    total,
                                    path,
                                    part_path,
                                },
                            ))
                        }
                        Ok(Some(Err(e))) => {
                            drop(file);
                            discard(&part_path).await;
                            Some((
                                TransferEvent::Failed(AppError::from(e)),
                                TransferRuntimeState::Finished,
                            ))
                        }
                        Ok(None) => {
                            let finalized: std::io::Result<()> = async {
                                file.sync_all().await?;
                                drop(file);
                                tokio::fs::rename(&part_path, &path).await
                            }
                            .await;

                            match finalized {
                                Ok(()) => {
                                    tracing::info!(
                                        "Saved {} bytes to {}",
                                        downloaded,
                                        path.display()
                                    );
                                    Some((TransferEvent::Completed(path), TransferRuntimeState::Finished))
                                }
                                Err(e) => {
                                    discard(&part_path).await;
                                    Some((
                                        TransferEvent::Failed(AppError::Io(format!(
                                            "Failed to finalize file: {}",
                                            e
                                        ))),
                                        TransferRuntimeState::Finished,
                                    ))
                                }
                            }
                        }
                    },
                    TransferRuntimeState::Finished => None,
                }
            },
        )
        .boxed()
    }
}

enum TransferRuntimeState {
    Start {
        client: ApiClient,
        url: Url,
        path: PathBuf,
    },
    Downloading {
        file: tokio::fs::File,
        stream: BoxStream<'static, crate::api::Result<bytes::Bytes>>,
        read_timeout: Duration,
        downloaded: u64,
        total: Option<u64>,
        path: PathBuf,
        part_path: PathBuf,
    },
    Finished,
}

async fn discard(part_path: &Path) {
    if let Err(e) = tokio::fs::remove_file(part_path).await {
        tracing::debug!("Could not remove {}: {}", part_path.display(), e);
    }
}
