//! Plan construction and fail-fast execution

use crate::config::DispatchConfig;
use crate::error::{Error, Result};
use crate::host::HostContext;
use crate::invocation::Invocation;
use crate::plan::{HostMounts, Plan};
use crate::runner::CommandRunner;
use gettext_ci_platform::{Execution, PlatformProfile};
use std::path::PathBuf;

/// Dispatches a resolved profile natively or into a container
pub struct Dispatcher<R> {
    config: DispatchConfig,
    runner: R,
}

impl<R: CommandRunner> Dispatcher<R> {
    /// Create a dispatcher
    pub fn new(config: DispatchConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// The runner steps are executed with
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Build the plan for `profile`.
    ///
    /// Container plans need the host toolchain directory; unless configured it
    /// is asked from `rustc --print sysroot`.
    ///
    /// # Errors
    ///
    /// Fails if the toolchain or cargo home directories cannot be determined.
    pub async fn plan(&self, profile: &PlatformProfile, host: &HostContext) -> Result<Plan> {
        let plan = match &profile.execution {
            Execution::Native => Plan::native(profile, &self.config, host),
            Execution::Container { image } => {
                let mounts = self.host_mounts(host).await?;
                Plan::container(profile, image, &self.config, host, &mounts)
            }
        };
        tracing::debug!(
            platform = %profile.platform,
            steps = plan.steps.len(),
            directories = plan.directories.len(),
            "Built dispatch plan"
        );
        Ok(plan)
    }

    /// Create the plan's directories, then run its steps in order.
    ///
    /// # Errors
    ///
    /// The first failure aborts the plan: an I/O error creating a directory,
    /// a step that cannot be spawned, or a step exiting non-zero
    /// ([`Error::StepFailed`] carries its status).
    pub async fn execute(&self, plan: &Plan) -> Result<()> {
        for dir in &plan.directories {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| Error::io(e, dir, "create"))?;
        }

        for step in &plan.steps {
            let exit_code = self.runner.run(step).await?;
            if exit_code != 0 {
                tracing::error!(program = %step.program, exit_code, "Step failed");
                return Err(Error::StepFailed {
                    program: step.program.clone(),
                    exit_code,
                });
            }
        }
        Ok(())
    }

    /// Plan and execute `profile`
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::plan`] and [`Dispatcher::execute`].
    #[tracing::instrument(name = "dispatch", skip_all, fields(platform = %profile.platform))]
    pub async fn run(&self, profile: &PlatformProfile, host: &HostContext) -> Result<()> {
        let plan = self.plan(profile, host).await?;
        tracing::info!(
            target_triple = %profile.target,
            image = profile.execution.image().unwrap_or("native"),
            "Dispatching CI run"
        );
        self.execute(&plan).await
    }

    async fn host_mounts(&self, host: &HostContext) -> Result<HostMounts> {
        let toolchain = match &self.config.sysroot {
            Some(sysroot) => host.resolve(sysroot),
            None => self.detect_sysroot(host).await?,
        };
        let registry = host
            .cargo_home(self.config.cargo_home.as_deref())?
            .join("registry");
        Ok(HostMounts {
            toolchain,
            registry,
        })
    }

    async fn detect_sysroot(&self, host: &HostContext) -> Result<PathBuf> {
        let query = Invocation::new("rustc", &host.workdir).args(["--print", "sysroot"]);
        let sysroot = self.runner.capture(&query).await?;
        if sysroot.is_empty() {
            return Err(Error::HostPath {
                what: "the Rust toolchain (sysroot)",
                help: "Pass --sysroot or set `sysroot` in the configuration file".to_string(),
            });
        }
        tracing::debug!(sysroot = %sysroot, "Detected toolchain sysroot");
        Ok(PathBuf::from(sysroot))
    }
}
