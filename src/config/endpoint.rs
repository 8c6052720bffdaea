//! Resolution of the extraction service address.
//!
//! Providers are consulted in order and the first one that yields a usable
//! `http`/`https` address wins. The chain is evaluated once and cached.

use std::fmt;
use std::sync::OnceLock;

use url::Url;

use crate::domain::AppError;

/// Address used when nothing else is configured.
pub const FALLBACK_ENDPOINT: &str = "http://localhost:8000";

/// A single source of a candidate base address.
pub trait EndpointProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Candidate address, or `None` to defer to the next provider.
    fn provide(&self) -> Option<String>;
}

/// Explicitly configured override.
pub struct ConfiguredOverride(pub Option<String>);

impl EndpointProvider for ConfiguredOverride {
    fn name(&self) -> &'static str {
        "configured override"
    }

    fn provide(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Origin of the location the client was launched from.
pub struct LaunchOrigin(pub Option<String>);

impl EndpointProvider for LaunchOrigin {
    fn name(&self) -> &'static str {
        "launch origin"
    }

    fn provide(&self) -> Option<String> {
        let url = Url::parse(self.0.as_deref()?).ok()?;
        let origin = url.origin();
        // file:// and similar have no usable origin
        origin.is_tuple().then(|| origin.ascii_serialization())
    }
}

pub struct Fallback(pub &'static str);

impl EndpointProvider for Fallback {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn provide(&self) -> Option<String> {
        Some(self.0.to_string())
    }
}

/// Base address of the extraction service, without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    base: String,
}

impl ResolvedEndpoint {
    /// Parse a candidate; only absolute http(s) URLs with a host qualify.
    pub fn parse(candidate: &str) -> Option<Self> {
        let base = candidate.trim().trim_end_matches('/');
        let url = Url::parse(base).ok()?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return None;
        }

        Some(Self {
            base: base.to_string(),
        })
    }

    fn fallback() -> Self {
        Self {
            base: FALLBACK_ENDPOINT.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Append a fixed path such as `/download` to the base.
    pub fn join_path(&self, path: &str) -> Result<Url, AppError> {
        Ok(Url::parse(&format!("{}{}", self.base, path))?)
    }

    /// Absolute locations are returned as-is, relative ones are resolved
    /// against the base.
    pub fn resolve_artifact(&self, location: &str) -> Result<Url, AppError> {
        match Url::parse(location) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(Url::parse(&self.base)?.join(location)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl fmt::Display for ResolvedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct EndpointResolver {
    providers: Vec<Box<dyn EndpointProvider>>,
    resolved: OnceLock<ResolvedEndpoint>,
}

impl EndpointResolver {
    pub fn new(providers: Vec<Box<dyn EndpointProvider>>) -> Self {
        Self {
            providers,
            resolved: OnceLock::new(),
        }
    }

    /// Override, then launch origin, then the fixed fallback.
    pub fn standard(api_base_override: Option<String>, launch_url: Option<String>) -> Self {
        Self::new(vec![
            Box::new(ConfiguredOverride(api_base_override)),
            Box::new(LaunchOrigin(launch_url)),
            Box::new(Fallback(FALLBACK_ENDPOINT)),
        ])
    }

    pub fn resolve(&self) -> &ResolvedEndpoint {
        self.resolved.get_or_init(|| {
            for provider in &self.providers {
                let Some(candidate) = provider.provide() else {
                    continue;
                };
                match ResolvedEndpoint::parse(&candidate) {
                    Some(endpoint) => {
                        tracing::info!("Using extraction service at {} ({})", endpoint, provider.name());
                        return endpoint;
                    }
                    None => {
                        tracing::warn!("Ignoring unusable {} address {:?}", provider.name(), candidate);
                    }
                }
            }

            tracing::info!("Using extraction service at {} (built-in default)", FALLBACK_ENDPOINT);
            ResolvedEndpoint::fallback()
        })
    }
}
