//! Resolved server settings.
//!
//! The library consumes configuration as plain resolved values; parsing a
//! configuration file and filling in defaults is the binary's job.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Process-wide, read-only configuration established before any worker starts.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Hostname advertised in menu lines and substituted for `$hostname`.
    pub hostname: String,

    /// Port advertised in menu lines.
    pub port: u16,

    /// Absolute root directory all served paths live under.
    pub root: PathBuf,

    /// Maximum width in bytes of a reflowed info line.
    pub page_width: usize,

    /// Maximum number of entries the file cache may hold.
    pub cache_capacity: usize,

    /// Interval between freshness monitor sweeps.
    pub monitor_interval: Duration,

    /// Free-form server description for `caps.txt`.
    pub description: String,

    /// Administrator contact for `caps.txt`.
    pub admin_email: String,

    /// Geolocation string for `caps.txt`.
    pub geolocation: String,
}

impl Settings {
    /// The canonical cache path of the generated `caps.txt` policy file.
    #[must_use]
    pub fn caps_txt_path(&self) -> PathBuf {
        self.root.join("caps.txt")
    }

    /// The canonical cache path of the generated `robots.txt` policy file.
    #[must_use]
    pub fn robots_txt_path(&self) -> PathBuf {
        self.root.join("robots.txt")
    }

    /// The selector a client would use for `path`, i.e. the path relative to
    /// the server root with a leading `/`.
    #[must_use]
    pub fn selector_for(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        format!("/{}", rel.display())
    }
}
