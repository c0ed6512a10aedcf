//! Error types for the idle-session sentinel.
//!
//! Failures here are construction-time only (bad configuration) or slot I/O
//! that the synchronizer swallows and degrades on. Nothing in the mechanism
//! propagates an error into the consumer's driver path after construction.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SentinelError {
    #[error("Invalid idle configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Activity slot record malformed: {context}: {source}")]
    SlotFormat {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Home directory not found")]
    HomeDirNotFound,
}

/// Convenience type alias for Results using SentinelError.
pub type Result<T> = std::result::Result<T, SentinelError>;
