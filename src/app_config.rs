//! Module for application configuration settings.
//!
//! User configurations may be specified in a TOML configuration file; every
//! key has a sensible default. The parsed [`Config`] resolves into the plain
//! [`Settings`] value the library consumes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use burrow::settings::Settings;

/// Application configuration structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Hostname advertised in menu lines.
    pub hostname: String,

    /// Port to listen on and advertise.
    pub port: u16,

    /// Root directory all served paths live under.
    pub root: PathBuf,

    /// Maximum width in bytes of reflowed info lines.
    pub page_width: usize,

    /// Maximum number of entries in the file cache.
    pub cache_size: usize,

    /// Seconds between freshness monitor sweeps.
    pub cache_check_secs: u64,

    /// Free-form server description for `caps.txt`.
    pub description: String,

    /// Administrator contact for `caps.txt`.
    pub admin_email: String,

    /// Geolocation string for `caps.txt`.
    pub geolocation: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_owned(),
            port: 70,
            root: PathBuf::from("/srv/gopher"),
            page_width: 80,
            cache_size: 50,
            cache_check_secs: 60,
            description: "Gopher server".to_owned(),
            admin_email: String::new(),
            geolocation: String::new(),
        }
    }
}

/// Why loading the configuration failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was unreadable.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file was not valid TOML for [`Config`].
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),
}

impl Config {
    /// Load configuration from `path`, or the built-in defaults when no file
    /// is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        debug!(path = ?path, "Loading configuration file.");
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate the correctness of the configuration.
    ///
    /// Returns every violation found, not just the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.hostname.is_empty() {
            errors.push("hostname must not be empty.".to_owned());
        }
        if !self.root.is_absolute() {
            errors.push(format!(
                "root '{}' must be an absolute path.",
                self.root.display()
            ));
        }
        if self.page_width == 0 {
            errors.push("page-width must be at least 1.".to_owned());
        }
        if self.cache_size == 0 {
            errors.push("cache-size must be at least 1.".to_owned());
        }
        if self.cache_check_secs == 0 {
            errors.push("cache-check-secs must be at least 1.".to_owned());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Resolve into the settings value the library consumes.
    #[must_use]
    pub fn into_settings(self) -> Settings {
        Settings {
            hostname: self.hostname,
            port: self.port,
            root: self.root,
            page_width: self.page_width,
            cache_capacity: self.cache_size,
            monitor_interval: Duration::from_secs(self.cache_check_secs),
            description: self.description,
            admin_email: self.admin_email,
            geolocation: self.geolocation,
        }
    }
}
