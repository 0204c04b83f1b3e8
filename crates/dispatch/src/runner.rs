//! Command runners
//!
//! [`CommandRunner`] is the seam between plan execution and the operating
//! system. [`ProcessRunner`] spawns real processes with inherited stdio so an
//! interactive container run is attached to the caller's terminal.

use crate::error::{Error, Result};
use crate::invocation::Invocation;
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

/// Executes invocations on behalf of the dispatcher
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion with inherited stdio and return the exit status.
    ///
    /// A non-zero status is not an error at this level.
    async fn run(&self, invocation: &Invocation) -> Result<i32>;

    /// Run to completion and return trimmed stdout.
    ///
    /// A non-zero status is reported as [`Error::StepFailed`].
    async fn capture(&self, invocation: &Invocation) -> Result<String>;
}

/// Runner that spawns real processes through tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a new process runner
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(&invocation.env)
            .kill_on_drop(true);
        for name in &invocation.env_remove {
            cmd.env_remove(name);
        }
        cmd
    }

    fn spawn_error(invocation: &Invocation, source: std::io::Error) -> Error {
        Error::Spawn {
            program: invocation.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    #[tracing::instrument(name = "run_step", skip_all, fields(program = %invocation.program))]
    async fn run(&self, invocation: &Invocation) -> Result<i32> {
        tracing::info!(command = %invocation, "Starting step");
        let start = std::time::Instant::now();

        let status = Self::command(invocation)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| Self::spawn_error(invocation, e))?;

        let exit_code = exit_code_of(status);
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(exit_code, duration_ms, "Step completed");
        Ok(exit_code)
    }

    async fn capture(&self, invocation: &Invocation) -> Result<String> {
        tracing::debug!(command = %invocation, "Capturing output");

        let output = Self::command(invocation)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|e| Self::spawn_error(invocation, e))?;

        if !output.status.success() {
            return Err(Error::StepFailed {
                program: invocation.program.clone(),
                exit_code: exit_code_of(output.status),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Exit status as a shell would report it: the code, or 128 + signal
#[must_use]
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
