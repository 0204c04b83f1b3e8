//! gettext-ci CLI application
//!
//! `gettext-ci <LABEL>` runs `ci/run.sh` for the selected platform and exits
//! with its status.

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use gettext_ci::cli::{self, Cli, EXIT_OK, exit_code_for, render_error};
use gettext_ci::commands;
use gettext_ci::tracing::{TracingConfig, init_tracing};
use std::io::Write;

fn main() {
    // NOTE: Using eprintln! in panic hook is intentional - tracing infrastructure
    // may be corrupted during a panic, so we use the most reliable output method.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    // Ignore error if tracing already initialized
    let _ = init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
        filter: None,
    });

    let exit_code = if cli.list {
        run_sync(&cli)
    } else {
        run_with_tokio(&cli)
    };
    std::process::exit(exit_code);
}

/// `--list` needs no runtime
fn run_sync(cli: &Cli) -> i32 {
    finish(cli, commands::list_platforms(cli.json))
}

/// Create tokio runtime and dispatch
fn run_with_tokio(cli: &Cli) -> i32 {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            return 1;
        }
    };

    let result = rt.block_on(commands::run(cli));
    finish(cli, result)
}

fn finish(cli: &Cli, result: Result<String, cli::CliError>) -> i32 {
    match result {
        Ok(output) => {
            print!("{output}");
            let _ = std::io::stdout().flush();
            EXIT_OK
        }
        Err(err) => {
            render_error(&err, cli.json);
            exit_code_for(&err)
        }
    }
}
