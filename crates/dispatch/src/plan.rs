//! Dispatch plans
//!
//! A [`Plan`] is the fully resolved list of side effects a dispatch will
//! perform. Building it is pure; executing it is left to the dispatcher.

use crate::config::DispatchConfig;
use crate::host::HostContext;
use crate::invocation::Invocation;
use gettext_ci_platform::{Execution, Platform, PlatformProfile, vars};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Directories and commands for one dispatch, in execution order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Platform the plan was built for
    pub platform: Platform,
    /// Native or containerized
    pub execution: Execution,
    /// Directories created (if absent) before the first step
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<PathBuf>,
    /// Commands run in order; the first failure aborts the rest
    pub steps: Vec<Invocation>,
}

impl Plan {
    /// Run the script on the host with the profile's variables.
    ///
    /// An inherited `DOCKER` is removed so the script sees the native path.
    #[must_use]
    pub fn native(profile: &PlatformProfile, config: &DispatchConfig, host: &HostContext) -> Self {
        let script = host.resolve(&config.script);
        let step = Invocation::new(path_arg(&script), &host.workdir)
            .envs(profile.env_vars())
            .env_remove(vars::DOCKER);

        Self {
            platform: profile.platform,
            execution: Execution::Native,
            directories: Vec::new(),
            steps: vec![step],
        }
    }

    /// Build the image and run the script inside it
    #[must_use]
    pub fn container(
        profile: &PlatformProfile,
        image: &str,
        config: &DispatchConfig,
        host: &HostContext,
        mounts: &HostMounts,
    ) -> Self {
        let cache_dir = host.resolve(&config.cache_dir);
        let output_dir = host.resolve(&config.output_dir);
        let target_dir = config.container_target_dir();

        let build = Invocation::new(&config.runtime, &host.workdir)
            .arg("build")
            .arg("-t")
            .arg(&config.image_tag)
            .arg("-f")
            .arg(path_arg(&config.dockerfile_for(image)))
            .arg(path_arg(&config.dockerfile_dir));

        let mut run = Invocation::new(&config.runtime, &host.workdir)
            .arg("run")
            .arg("-w")
            .arg(&config.workdir)
            .arg("-v")
            .arg(format!("{}:{}", host.workdir.display(), config.workdir))
            .arg("-v")
            .arg(format!("{}:{target_dir}", output_dir.display()))
            .arg("-v")
            .arg(format!(
                "{}:{}:ro",
                mounts.toolchain.display(),
                config.toolchain_mount
            ))
            .arg("-v")
            .arg(format!(
                "{}:{}",
                mounts.registry.display(),
                config.registry_mount
            ));

        for (name, value) in forwarded_env(profile, host, &target_dir) {
            run = run.arg("-e").arg(format!("{name}={value}"));
        }
        if config.tty {
            run = run.arg("-it");
        }
        run = run.arg(&config.image_tag).arg(path_arg(&config.script));

        Self {
            platform: profile.platform,
            execution: Execution::container(image),
            directories: vec![cache_dir, output_dir],
            steps: vec![build, run],
        }
    }
}

/// Host directories bind-mounted into the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMounts {
    /// Installed toolchain, mounted read-only
    pub toolchain: PathBuf,
    /// Registry cache, mounted read-write
    pub registry: PathBuf,
}

/// Ambient knobs, overlaid by the profile, plus the fixed target directory
fn forwarded_env(
    profile: &PlatformProfile,
    host: &HostContext,
    target_dir: &str,
) -> BTreeMap<String, String> {
    let mut env = host.ambient.vars().clone();
    env.extend(profile.env_vars());
    env.insert(vars::CARGO_TARGET_DIR.to_string(), target_dir.to_string());
    env
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::AmbientEnv;

    fn mounts() -> HostMounts {
        HostMounts {
            toolchain: PathBuf::from("/home/ci/.rustup/toolchains/stable"),
            registry: PathBuf::from("/home/ci/.cargo/registry"),
        }
    }

    #[test]
    fn test_native_plan_is_single_script_step() {
        let profile = Platform::MacosHomebrew.profile();
        let host = HostContext::new("/src/gettext-rs");
        let plan = Plan::native(&profile, &DispatchConfig::default(), &host);

        assert!(plan.directories.is_empty());
        assert_eq!(plan.steps.len(), 1);
        let step = &plan.steps[0];
        assert_eq!(step.program, "/src/gettext-rs/ci/run.sh");
        assert!(step.args.is_empty());
        assert_eq!(step.cwd, PathBuf::from("/src/gettext-rs"));
        assert_eq!(step.env, profile.env_vars());
        assert_eq!(step.env_remove, ["DOCKER"]);
    }

    #[test]
    fn test_container_plan_full_command_lines() {
        let profile = Platform::Build.profile();
        let host = HostContext::new("/src/gettext-rs");
        let plan = Plan::container(
            &profile,
            "linux64-build",
            &DispatchConfig::default(),
            &host,
            &mounts(),
        );

        assert_eq!(
            plan.directories,
            vec![
                PathBuf::from("/src/gettext-rs/.cargo"),
                PathBuf::from("/src/gettext-rs/target")
            ]
        );
        assert_eq!(
            plan.steps[0].to_string(),
            "docker build -t gettext-rs -f ci/Dockerfile-linux64-build ci"
        );
        assert_eq!(
            plan.steps[1].to_string(),
            "docker run -w /checkout \
             -v /src/gettext-rs:/checkout \
             -v /src/gettext-rs/target:/checkout/target \
             -v /home/ci/.rustup/toolchains/stable:/rust:ro \
             -v /home/ci/.cargo/registry:/cargo/registry \
             -e CARGO_TARGET_DIR=/checkout/target \
             -e DOCKER=linux64-build \
             -e GETTEXT_DIR=/result \
             -e TARGET=x86_64-unknown-linux-gnu \
             -it gettext-rs ci/run.sh"
        );
    }

    #[test]
    fn test_profile_overrides_ambient_knobs() {
        let profile = Platform::Build2.profile();
        let host = HostContext::new("/w").with_ambient(AmbientEnv::from_vars([
            ("GETTEXT_LIB_DIR", "/ambient/lib"),
            ("GETTEXT_STATIC", "1"),
            ("NO_RUN", "1"),
        ]));
        let env = forwarded_env(&profile, &host, "/checkout/target");

        assert_eq!(env["GETTEXT_LIB_DIR"], "/result/lib");
        assert_eq!(env["GETTEXT_STATIC"], "1");
        assert_eq!(env["NO_RUN"], "1");
        assert_eq!(env["CARGO_TARGET_DIR"], "/checkout/target");
    }

    #[test]
    fn test_no_tty_and_custom_runtime() {
        let config = DispatchConfig {
            runtime: "podman".to_string(),
            tty: false,
            ..DispatchConfig::default()
        };
        let plan = Plan::container(
            &Platform::Musl.profile(),
            "musl",
            &config,
            &HostContext::new("/w"),
            &mounts(),
        );
        assert!(plan.steps.iter().all(|s| s.program == "podman"));
        assert!(!plan.steps[1].args.iter().any(|a| a == "-it"));
        assert_eq!(plan.steps[1].args.last().map(String::as_str), Some("ci/run.sh"));
    }
}
