//! Error types for dispatch

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Exit status used by shells when a command cannot be found
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit status used by shells when a command is found but cannot be executed
pub const EXIT_NOT_EXECUTABLE: i32 = 126;
/// Exit status for failures that happen before any step runs
pub const EXIT_FAILURE: i32 = 1;
/// Exit status for configuration errors
pub const EXIT_CONFIG: i32 = 2;

/// Error type for dispatch operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// I/O error while preparing the run
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(gettext_ci::dispatch::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "create", "read")
        operation: String,
    },

    /// A step's program could not be started
    #[error("Failed to spawn '{program}': {source}")]
    #[diagnostic(code(gettext_ci::dispatch::spawn))]
    Spawn {
        /// Program that failed to start
        program: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A step ran and exited unsuccessfully
    #[error("'{program}' exited with status {exit_code}")]
    #[diagnostic(code(gettext_ci::dispatch::step_failed))]
    StepFailed {
        /// Program that failed
        program: String,
        /// Its exit status
        exit_code: i32,
    },

    /// Invalid dispatch configuration
    #[error("Dispatch configuration error: {message}")]
    #[diagnostic(code(gettext_ci::dispatch::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },

    /// A host directory needed for the container mounts could not be located
    #[error("Cannot locate {what}")]
    #[diagnostic(code(gettext_ci::dispatch::host_path))]
    HostPath {
        /// Which directory was being looked up
        what: &'static str,
        /// How to provide it explicitly
        #[help]
        help: String,
    },
}

impl Error {
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

    /// Create an I/O error without path context
    #[must_use]
    pub fn io_no_path(source: std::io::Error, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: None,
            operation: operation.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// The process exit status this error should surface as
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StepFailed { exit_code, .. } => *exit_code,
            Self::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                EXIT_NOT_FOUND
            }
            Self::Spawn { .. } => EXIT_NOT_EXECUTABLE,
            Self::Configuration { .. } => EXIT_CONFIG,
            Self::Io { .. } | Self::HostPath { .. } => EXIT_FAILURE,
        }
    }
}

/// Result type for dispatch operations
pub type Result<T> = std::result::Result<T, Error>;
