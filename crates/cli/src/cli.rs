// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use crate::tracing::{LogLevel, TracingFormat};
use clap::Parser;
use miette::{Diagnostic, Report};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;

/// CLI-specific error types with exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(gettext_ci::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The dispatch could not be carried out
    #[error("{message}")]
    #[diagnostic(code(gettext_ci::cli::failed))]
    Failed {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
        /// Exit code to terminate with
        exit_code: i32,
    },
    /// A delegated step exited non-zero; its status is propagated as-is
    #[error("'{program}' exited with status {exit_code}")]
    #[diagnostic(code(gettext_ci::cli::step))]
    Step {
        /// The failing program
        program: String,
        /// Its exit status
        exit_code: i32,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<gettext_ci_platform::Error> for CliError {
    fn from(err: gettext_ci_platform::Error) -> Self {
        let help = err.help().map(|h| h.to_string());
        let message = err.to_string();
        match help {
            Some(help) => Self::config_with_help(message, help),
            None => Self::config(message),
        }
    }
}

impl From<gettext_ci_dispatch::Error> for CliError {
    fn from(err: gettext_ci_dispatch::Error) -> Self {
        use gettext_ci_dispatch::Error;

        let exit_code = err.exit_code();
        match err {
            Error::StepFailed { program, exit_code } => Self::Step { program, exit_code },
            // Extract just the message to avoid a doubled prefix
            Error::Configuration { message } => Self::config(message),
            Error::Io { ref source, .. } => Self::Failed {
                message: format!("{err}: {source}"),
                help: err.help().map(|h| h.to_string()),
                exit_code,
            },
            Error::Spawn { .. } | Error::HostPath { .. } => Self::Failed {
                message: err.to_string(),
                help: err.help().map(|h| h.to_string()),
                exit_code,
            },
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Failed { exit_code, .. } | CliError::Step { exit_code, .. } => *exit_code,
    }
}

/// Render error appropriately based on JSON flag.
///
/// Step failures are not rendered in human mode: the step's own output is
/// the report.
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let mut error = serde_json::json!({
            "code": match err {
                CliError::Config { .. } => "config",
                CliError::Failed { .. } => "failed",
                CliError::Step { .. } => "step",
            },
            "message": err.to_string(),
            "exitCode": exit_code_for(err),
        });
        if let Some(help) = err.help() {
            error["help"] = serde_json::Value::String(help.to_string());
        }

        match serde_json::to_string(&ErrorEnvelope::new(error)) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else if !matches!(err, CliError::Step { .. }) {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        // Ensure output is flushed before potential process exit
        let _ = io::stderr().flush();
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Run the gettext-rs CI for a platform.
///
/// Resolves LABEL to a target triple and gettext location, then runs
/// ci/run.sh on the host (macOS labels) or inside the platform's container
/// image (Linux labels).
#[derive(Parser, Debug)]
#[command(name = "gettext-ci")]
#[command(version)]
pub struct Cli {
    /// Platform label (see --list).
    #[arg(value_name = "LABEL", required_unless_present = "list")]
    pub label: Option<String>,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format.
    #[arg(long, default_value = "compact", value_enum)]
    pub log_format: TracingFormat,

    /// Emit JSON envelopes for --list, --dry-run and errors.
    #[arg(long, help = "Emit JSON envelopes for --list, --dry-run and errors")]
    pub json: bool,

    /// TOML dispatch configuration file.
    #[arg(short = 'c', long, env = "GETTEXT_CI_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Container runtime executable.
    #[arg(long, env = "GETTEXT_CI_RUNTIME", value_name = "PROGRAM")]
    pub runtime: Option<String>,

    /// Host toolchain directory mounted into containers.
    #[arg(long, env = "GETTEXT_CI_SYSROOT", value_name = "DIR")]
    pub sysroot: Option<PathBuf>,

    /// Do not attach an interactive terminal to the container.
    #[arg(long)]
    pub no_tty: bool,

    /// Print the commands instead of running them.
    #[arg(long)]
    pub dry_run: bool,

    /// List the known platforms and exit.
    #[arg(long, conflicts_with_all = ["dry_run", "label"])]
    pub list: bool,
}

/// Parse command line arguments
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
