//! Error types for the cache crate

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for cache operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error during cache operations
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(runway::cache::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "copy")
        operation: String,
    },

    /// Configuration or validation error
    #[error("Cache configuration error: {message}")]
    #[diagnostic(code(runway::cache::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },

    /// A committed entry whose recorded files cannot be read back.
    ///
    /// The commit marker promises the entry is complete; an unreadable
    /// terminal output behind it means the entry was damaged after commit,
    /// which is surfaced rather than silently degraded to a miss.
    #[error("Cache entry {hash} is committed but unreadable")]
    #[diagnostic(
        code(runway::cache::corrupted),
        help("Remove the entry directory and its .commit marker to recover")
    )]
    CorruptedEntry {
        /// Hash of the damaged entry
        hash: String,
        /// The underlying read error
        #[source]
        source: std::io::Error,
    },

    /// Remote store failure
    #[error("Remote cache error: {message}")]
    #[diagnostic(code(runway::cache::remote))]
    Remote {
        /// Error message from the remote store
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create a corrupted-entry error
    #[must_use]
    pub fn corrupted(hash: impl Into<String>, source: std::io::Error) -> Self {
        Self::CorruptedEntry {
            hash: hash.into(),
            source,
        }
    }

    /// Create a remote store error
    #[must_use]
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote {
            message: msg.into(),
        }
    }
}

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a best-effort operation.
///
/// Hash-record writes and maintenance launches degrade performance when they
/// fail (extra recomputation, delayed pruning) but never correctness, so
/// their failures are reported as a [`BestEffort::Degraded`] outcome instead
/// of an [`Error`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestEffort {
    /// The operation fully completed
    Completed,
    /// Part of the operation failed; the failure was logged and skipped
    Degraded,
}

impl BestEffort {
    /// Whether any part of the operation was skipped
    #[must_use]
    pub fn is_degraded(self) -> bool {
        matches!(self, Self::Degraded)
    }

    /// Combine two outcomes; degradation is sticky
    pub fn and(self, other: Self) -> Self {
        if self.is_degraded() || other.is_degraded() {
            Self::Degraded
        } else {
            Self::Completed
        }
    }
}
