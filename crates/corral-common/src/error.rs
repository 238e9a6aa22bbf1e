//! Unified error types for the corral workspace.
//!
//! Query-style helpers degrade to empty/optional results instead of using
//! these variants; only operations whose failure the caller must act on
//! (destruction, syscalls, bad configuration) surface a `CorralError`.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CorralError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A cgroup still had member processes after the kill budget ran out.
    ///
    /// The process tree is no longer bounded by the cgroup's limits at this
    /// point, so callers should treat this as unrecoverable for the run.
    #[error("cgroup {cgroup} still has live members after {attempts} kill attempts")]
    KillTimeout {
        /// The cgroup that refused to empty.
        cgroup: PathBuf,
        /// Number of kill/poll rounds performed before giving up.
        attempts: u32,
    },

    /// A system call failed.
    #[error("{call} failed: {source}")]
    Sys {
        /// Name of the failing system call.
        call: &'static str,
        /// OS error returned by the call.
        source: std::io::Error,
    },

    /// The requested facility does not exist on this platform.
    #[error("{feature} is not supported on this platform")]
    Unsupported {
        /// Name of the missing facility.
        feature: &'static str,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CorralError>;
