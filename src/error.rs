//! Error types for `portprobe`.
//!
//! The caller-facing probe API ([`DevicePortProbe`](crate::probe::DevicePortProbe),
//! [`PortReader`](crate::probe::PortReader)) never returns these. Every failure there
//! degrades to "zero ports" or "no name for this index". Errors only surface from
//! the subsystem traits (where the polling loop logs them) and from config loading.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Errors produced by device subsystems and configuration loading.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The device subsystem could not be opened for enumeration.
    #[error("failed to open device subsystem for enumeration: {0}")]
    Acquire(String),

    /// The subsystem handed back a handle that reports itself as not usable.
    #[error("enumeration handle reported not ok")]
    HandleNotOk,

    /// A port count or port name query failed during a refresh cycle.
    #[error("port query failed: {0}")]
    Query(String),

    /// The polling thread could not be started.
    #[error("failed to spawn polling thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// Configuration values are out of range.
    #[error("invalid probe configuration: {0}")]
    Config(String),

    /// Config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for [`ProbeConfig`](crate::config::ProbeConfig).
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let err = ProbeError::Acquire("no backend".into());
        assert_eq!(
            err.to_string(),
            "failed to open device subsystem for enumeration: no backend"
        );
        assert_eq!(
            ProbeError::HandleNotOk.to_string(),
            "enumeration handle reported not ok"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ProbeError = io.into();
        assert!(matches!(err, ProbeError::Io(_)));
    }
}
