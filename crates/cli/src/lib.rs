//! gettext-ci - run the gettext-rs CI for a platform label
//!
//! The binary resolves a label such as `linux64-system` into a
//! [`PlatformProfile`](gettext_ci_platform::PlatformProfile) and hands it to a
//! [`Dispatcher`](gettext_ci_dispatch::Dispatcher). This library exposes the
//! pieces the binary is assembled from so they can be tested directly.

// CLI output goes to stdout/stderr by design
#![allow(clippy::print_stdout, clippy::print_stderr)]

/// CLI argument parsing, errors and exit codes.
pub mod cli;
/// Command implementations (list, dry-run, dispatch).
pub mod commands;
/// Tracing and logging configuration.
pub mod tracing;
