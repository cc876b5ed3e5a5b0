// This module defines the error types for the fallible ambient operations around a
// compilation using the thiserror crate. The orchestration itself never returns an error:
// backend failure is reported through an empty compilation result and internal
// inconsistencies are fatal assertions. What can fail recoverably is configuration parsing
// (trace flags read from the environment) and trace-file I/O, which the orchestrator logs
// and then ignores. CompileResult<T> is the matching Result alias.

//! Error types for wasm-tier.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by configuration and trace output.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Failed to write trace file {}: {source}", path.display())]
    TraceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value {value:?} for {key}")]
    InvalidConfig {
        key: &'static str,
        value: String,
    },
}

/// Result type alias for fallible ambient operations.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CompileError::InvalidConfig {
            key: "WASM_TIER_TRACE_TEXT",
            value: "maybe".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value \"maybe\" for WASM_TIER_TRACE_TEXT"
        );

        let err = CompileError::TraceIo {
            path: PathBuf::from("/tmp/turbo-1.cfg"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().starts_with("Failed to write trace file /tmp/turbo-1.cfg"));
    }
}
