//! Error types for scanning operations.
//!
//! Per-entry I/O failures during a scan are counted in the progress
//! snapshot, never raised; only structural failures surface here.

use thiserror::Error;

/// Errors that fail a whole scan.
#[derive(Debug, Clone, Error)]
pub enum ScanError {
    /// The scan was cancelled before completion; no tree is delivered.
    #[error("scan cancelled")]
    Cancelled,

    /// The scan worker died unexpectedly.
    #[error("scan worker failed: {message}")]
    Worker { message: String },
}

impl ScanError {
    /// Wrap an unexpected worker failure.
    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_error_message() {
        let err = ScanError::worker("task panicked");
        assert!(err.to_string().contains("task panicked"));
    }
}
