//! Runtime configuration read from the environment (and an optional `.env`).

pub mod endpoint;

pub use endpoint::{EndpointResolver, ResolvedEndpoint};

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;

use crate::api::ApiConfig;

pub const API_BASE_VAR: &str = "VIDEO_DL_API_BASE";
pub const DOWNLOAD_DIR_VAR: &str = "VIDEO_DL_DOWNLOAD_DIR";
pub const AUTO_DOWNLOAD_VAR: &str = "VIDEO_DL_AUTO_DOWNLOAD";
pub const TIMEOUT_VAR: &str = "VIDEO_DL_TIMEOUT_SECS";

const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Explicit extraction service address, highest priority.
    pub api_base_override: Option<String>,
    /// URL the client was launched with; its origin is the second choice.
    pub launch_url: Option<String>,
    pub download_dir: PathBuf,
    pub auto_download: bool,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_override: None,
            launch_url: None,
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            auto_download: true,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and the first CLI argument.
    pub fn from_env() -> Self {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok(), env::args().nth(1))
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F, launch_url: Option<String>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let auto_download = match non_blank(AUTO_DOWNLOAD_VAR) {
            Some(value) => !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            ),
            None => defaults.auto_download,
        };

        let request_timeout = match non_blank(TIMEOUT_VAR) {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!("{} must be a positive number of seconds, got {:?}", TIMEOUT_VAR, value);
                    defaults.request_timeout
                }
            },
            None => defaults.request_timeout,
        };

        Self {
            api_base_override: non_blank(API_BASE_VAR).map(|value| value.trim().to_string()),
            launch_url: launch_url.filter(|value| !value.trim().is_empty()),
            download_dir: non_blank(DOWNLOAD_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            auto_download,
            request_timeout,
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            request_timeout: self.request_timeout,
            ..ApiConfig::default()
        }
    }

    pub fn endpoint_resolver(&self) -> EndpointResolver {
        EndpointResolver::standard(self.api_base_override.clone(), self.launch_url.clone())
    }
}
