//! Probe configuration.
//!
//! [`ProbeConfig`] holds the few knobs the probe exposes. All fields have defaults,
//! so an empty TOML document is a valid config:
//!
//! ```toml
//! # ~30 Hz
//! poll_interval_ms = 33
//! thread_name = "portprobe-poll"
//! ```

use crate::error::{ProbeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default refresh period of the polling loop (~30 Hz).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000 / 30;

/// Default OS thread name for the polling loop.
pub const DEFAULT_THREAD_NAME: &str = "portprobe-poll";

/// Tunables for [`DevicePortProbe`](crate::probe::DevicePortProbe).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Sleep between two enumeration passes, in milliseconds. Must be non-zero.
    pub poll_interval_ms: u64,

    /// Name given to the background polling thread.
    pub thread_name: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl ProbeConfig {
    /// Parse and validate a config from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: ProbeConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Builder-style override of the polling interval.
    ///
    /// Sub-millisecond durations round down; a zero result is rejected by [`validate`](Self::validate).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Builder-style override of the polling thread name.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(ProbeError::Config("poll_interval_ms must be > 0".into()));
        }
        if self.thread_name.trim().is_empty() {
            return Err(ProbeError::Config("thread_name must not be empty".into()));
        }
        if self.thread_name.contains('\0') {
            return Err(ProbeError::Config("thread_name must not contain NUL bytes".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_is_thirty_hertz() {
        let cfg = ProbeConfig::default();
        assert_eq!(cfg.poll_interval(), Duration::from_millis(33));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = ProbeConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, ProbeConfig::default());
    }

    #[test]
    fn partial_document_overrides_one_field() {
        let cfg = ProbeConfig::from_toml_str("poll_interval_ms = 10").unwrap();
        assert_eq!(cfg.poll_interval_ms, 10);
        assert_eq!(cfg.thread_name, DEFAULT_THREAD_NAME);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = ProbeConfig::from_toml_str("poll_interval_ms = 0").unwrap_err();
        assert!(matches!(err, ProbeError::Config(_)));

        let cfg = ProbeConfig::default().with_poll_interval(Duration::from_micros(500));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn blank_thread_name_is_rejected() {
        let cfg = ProbeConfig::default().with_thread_name("  ");
        assert!(matches!(cfg.validate(), Err(ProbeError::Config(_))));
    }

    #[test]
    fn nul_in_thread_name_is_rejected() {
        let err = ProbeConfig::from_toml_str("thread_name = \"scan\\u0000er\"").unwrap_err();
        assert!(matches!(err, ProbeError::Config(_)));
    }

    #[test]
    fn unknown_keys_are_errors() {
        let err = ProbeConfig::from_toml_str("poll_hz = 30").unwrap_err();
        assert!(matches!(err, ProbeError::Toml(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_ms = 50\nthread_name = \"midi-scan\"").unwrap();

        let cfg = ProbeConfig::load(file.path()).unwrap();
        assert_eq!(cfg.poll_interval(), Duration::from_millis(50));
        assert_eq!(cfg.thread_name, "midi-scan");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProbeConfig::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ProbeError::Io(_)));
    }
}
