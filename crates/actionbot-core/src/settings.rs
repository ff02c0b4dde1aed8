//! Client settings persisted as JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::pipeline::DEFAULT_BATCH_SIZE;

/// Environment variable overriding [`Settings::backend_url`].
pub const BACKEND_URL_ENV: &str = "ACTIONBOT_BACKEND_URL";

/// Environment variable overriding [`Settings::batch_size`].
pub const BATCH_SIZE_ENV: &str = "ACTIONBOT_BATCH_SIZE";

/// Where the logged-in user id is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// System keyring; survives restarts.
    #[default]
    Keyring,
    /// Process memory; gone on exit.
    Memory,
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the triage backend.
    pub backend_url: String,
    /// Concurrent classification requests per batch.
    pub batch_size: usize,
    /// Timeout of a single backend request, in seconds.
    pub request_timeout_secs: u64,
    /// How long the "sent" notice stays up, in milliseconds.
    pub send_complete_delay_ms: u64,
    /// Session storage.
    pub session_backend: SessionBackend,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3000".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout_secs: 30,
            send_complete_delay_ms: 1500,
            session_backend: SessionBackend::Keyring,
        }
    }
}

impl Settings {
    /// Default location of the settings file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("actionbot")
            .join("settings.json")
    }

    /// Load settings from the default location and apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if an override is malformed.
    pub async fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
            .await?
            .with_overrides(|key| std::env::var(key).ok())
    }

    /// Load settings from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save settings to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Apply overrides looked up by environment variable name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the batch size override is not a number.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.backend_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(BATCH_SIZE_ENV) {
            self.batch_size = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{BATCH_SIZE_ENV} must be a number, got {raw:?}")))?;
        }

        Ok(self)
    }

    /// Timeout of a single backend request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// How long the "sent" notice stays up.
    #[must_use]
    pub const fn send_complete_delay(&self) -> Duration {
        Duration::from_millis(self.send_complete_delay_ms)
    }
}
