//! Check-in configuration.
//!
//! Values come from the process environment with documented defaults.
//! Builder methods override individual values for tests and embedders.

use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

/// Scanner timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Window during which the same code is ignored, and the minimum time
    /// between a failed validation and re-arming the scanner.
    ///
    /// Default: 1500 ms
    pub cooldown: Duration,
}

impl ScanConfig {
    /// Default cooldown between scans.
    pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1500);

    /// Set the cooldown.
    #[must_use]
    pub const fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            cooldown: Self::DEFAULT_COOLDOWN,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckinConfig {
    /// Base URL of the event-management API.
    ///
    /// Default: `http://localhost:8000/api/v1`
    pub api_url: String,

    /// Timeout applied to every HTTP request.
    ///
    /// Default: 15 seconds
    pub http_timeout: Duration,

    /// Scanner timing.
    pub scan: ScanConfig,

    /// Directory holding persisted credentials.
    ///
    /// Default: `.checkin`
    pub storage_dir: PathBuf,
}

impl CheckinConfig {
    /// Default API base URL.
    pub const DEFAULT_API_URL: &'static str = "http://localhost:8000/api/v1";

    /// Default HTTP timeout in seconds.
    pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

    /// Load configuration from the process environment.
    ///
    /// Reads `CHECKIN_API_URL`, `CHECKIN_HTTP_TIMEOUT_SECS`,
    /// `CHECKIN_SCAN_COOLDOWN_MS` and `CHECKIN_STORAGE_DIR`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiUrl`] if the API URL is blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Numeric values that fail to parse fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiUrl`] if the API URL is blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = lookup("CHECKIN_API_URL").unwrap_or(defaults.api_url);

        let http_timeout = lookup("CHECKIN_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(defaults.http_timeout, Duration::from_secs);

        let cooldown = lookup("CHECKIN_SCAN_COOLDOWN_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(defaults.scan.cooldown, Duration::from_millis);

        let storage_dir = lookup("CHECKIN_STORAGE_DIR")
            .filter(|v| !v.trim().is_empty())
            .map_or(defaults.storage_dir, PathBuf::from);

        let config = Self {
            api_url,
            http_timeout,
            scan: ScanConfig { cooldown },
            storage_dir,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiUrl`] if the API URL is blank.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::EmptyApiUrl);
        }
        Ok(())
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set the scan cooldown.
    #[must_use]
    pub const fn with_scan_cooldown(mut self, cooldown: Duration) -> Self {
        self.scan.cooldown = cooldown;
        self
    }

    /// Set the credential directory.
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }
}

impl Default for CheckinConfig {
    fn default() -> Self {
        Self {
            api_url: Self::DEFAULT_API_URL.to_string(),
            http_timeout: Duration::from_secs(Self::DEFAULT_HTTP_TIMEOUT_SECS),
            scan: ScanConfig::default(),
            storage_dir: PathBuf::from(".checkin"),
        }
    }
}
