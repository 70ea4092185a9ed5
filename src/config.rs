//! Collector configuration parsing and validation.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_window_seconds() -> u64 {
    10
}

fn default_cors_max_age_seconds() -> u64 {
    86_400
}

/// Collector configuration parsed from `collector.toml`.
///
/// Every field has a default, so an empty document (or no file at all)
/// yields the stock loopback collector with a ten second window.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct CollectorConfig {
    /// Address the HTTP transport listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Length of one capture window.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// Preflight cache lifetime advertised through `Access-Control-Max-Age`.
    #[serde(default = "default_cors_max_age_seconds")]
    pub cors_max_age_seconds: u64,
    /// Directory served for any `GET` path that is not a collector route.
    #[serde(default)]
    pub static_root: Option<PathBuf>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            window_seconds: default_window_seconds(),
            cors_max_age_seconds: default_cors_max_age_seconds(),
            static_root: None,
        }
    }
}

impl CollectorConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and normalize paths.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Capture window length as a [`Duration`].
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    /// Preflight cache lifetime as a [`Duration`].
    #[must_use]
    pub fn cors_max_age(&self) -> Duration {
        Duration::from_secs(self.cors_max_age_seconds)
    }

    /// Check invariants and canonicalize `static_root`.
    ///
    /// Called by the parsers; call it again after applying CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the window is zero or the static
    /// root does not exist or is not a directory.
    pub fn validate(&mut self) -> Result<()> {
        if self.window_seconds == 0 {
            return Err(AppError::Config(
                "window_seconds must be greater than zero".into(),
            ));
        }

        if let Some(root) = &self.static_root {
            let canonical = root
                .canonicalize()
                .map_err(|err| AppError::Config(format!("static_root invalid: {err}")))?;
            if !canonical.is_dir() {
                return Err(AppError::Config(format!(
                    "static_root is not a directory: {}",
                    canonical.display()
                )));
            }
            self.static_root = Some(canonical);
        }

        Ok(())
    }
}
