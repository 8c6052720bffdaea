//! Best-effort automatic download of a resolved artifact.

use std::path::PathBuf;

use url::Url;

use crate::{
    domain::{Acquisition, AppError},
    utils::{filename_from_url, unique_path},
};

/// Arms the automatic download of an artifact into a fixed directory.
#[derive(Debug, Clone)]
pub struct Acquirer {
    download_dir: PathBuf,
    enabled: bool,
}

impl Acquirer {
    pub fn new(download_dir: PathBuf, enabled: bool) -> Self {
        Self {
            download_dir,
            enabled,
        }
    }

    /// Always hands back the artifact URL; `auto_save_path` is only set when
    /// the automatic download could be armed.
    pub fn trigger(&self, artifact_url: Url) -> Acquisition {
        let auto_save_path = if self.enabled {
            match self.prepare(&artifact_url) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Automatic download unavailable for {}: {}", artifact_url, e);
                    None
                }
            }
        } else {
            None
        };

        Acquisition {
            artifact_url,
            auto_save_path,
        }
    }

    fn prepare(&self, artifact_url: &Url) -> Result<PathBuf, AppError> {
        std::fs::create_dir_all(&self.download_dir)?;
        Ok(unique_path(&self.download_dir, &filename_from_url(artifact_url)))
    }
}
