//! Dispatcher behavior against a recording runner

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use gettext_ci_dispatch::{
    CommandRunner, DispatchConfig, Dispatcher, Error, HostContext, Invocation, Result,
};
use gettext_ci_platform::{Platform, resolve};
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// What the recording runner saw when a step was started
#[derive(Debug, Clone)]
struct Recorded {
    invocation: Invocation,
    dirs_existed: bool,
}

/// Records every invocation and answers with scripted exit codes
struct RecordingRunner {
    recorded: Mutex<Vec<Recorded>>,
    captures: Mutex<Vec<Invocation>>,
    /// (program, first argument) pairs that exit with the given status
    failures: Vec<(String, Option<String>, i32)>,
    sysroot: String,
}

impl RecordingRunner {
    fn new() -> Self {
        Self {
            recorded: Mutex::new(Vec::new()),
            captures: Mutex::new(Vec::new()),
            failures: Vec::new(),
            sysroot: "/opt/rust/stable".to_string(),
        }
    }

    fn failing(mut self, program: &str, first_arg: Option<&str>, code: i32) -> Self {
        self.failures
            .push((program.to_string(), first_arg.map(str::to_string), code));
        self
    }

    fn with_sysroot(mut self, sysroot: &str) -> Self {
        self.sysroot = sysroot.to_string();
        self
    }

    fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    fn captures(&self) -> Vec<Invocation> {
        self.captures.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> Result<i32> {
        let dirs_existed =
            invocation.cwd.join(".cargo").is_dir() && invocation.cwd.join("target").is_dir();
        self.recorded.lock().unwrap().push(Recorded {
            invocation: invocation.clone(),
            dirs_existed,
        });

        let first = invocation.args.first().cloned();
        let code = self
            .failures
            .iter()
            .find(|(program, arg, _)| {
                *program == invocation.program && (arg.is_none() || *arg == first)
            })
            .map_or(0, |(_, _, code)| *code);
        Ok(code)
    }

    async fn capture(&self, invocation: &Invocation) -> Result<String> {
        self.captures.lock().unwrap().push(invocation.clone());
        Ok(self.sysroot.clone())
    }
}

fn host(dir: &TempDir) -> HostContext {
    HostContext::new(dir.path()).with_cargo_home("/home/ci/.cargo")
}

fn script_path(dir: &TempDir) -> String {
    dir.path().join("ci/run.sh").to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_native_labels_only_run_the_script() {
    for label in ["macos", "macos-homebrew", "macos-homebrew2"] {
        let dir = TempDir::new().unwrap();
        let dispatcher = Dispatcher::new(DispatchConfig::default(), RecordingRunner::new());
        let profile = resolve(label).unwrap();

        dispatcher.run(&profile, &host(&dir)).await.unwrap();

        let recorded = dispatcher.runner().recorded();
        assert_eq!(recorded.len(), 1, "{label}");
        assert_eq!(recorded[0].invocation.program, script_path(&dir), "{label}");
        assert_eq!(recorded[0].invocation.env, profile.env_vars(), "{label}");
        assert_eq!(recorded[0].invocation.env_remove, ["DOCKER"], "{label}");
        assert!(dispatcher.runner().captures().is_empty(), "{label}");
        assert!(!dir.path().join("target").exists(), "{label}");
        assert!(!dir.path().join(".cargo").exists(), "{label}");
    }
}

#[tokio::test]
async fn test_native_failure_propagates_exit_code() {
    let dir = TempDir::new().unwrap();
    let runner = RecordingRunner::new().failing(&script_path(&dir), None, 5);
    let dispatcher = Dispatcher::new(DispatchConfig::default(), runner);

    let err = dispatcher
        .run(&Platform::Macos.profile(), &host(&dir))
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 5);
    let recorded = dispatcher.runner().recorded();
    assert_eq!(recorded.len(), 1);
    assert!(recorded.iter().all(|r| r.invocation.program != "docker"));
}

#[tokio::test]
async fn test_container_labels_create_dirs_before_build() {
    let labels = [
        ("linux64-system", "linux64-gettext"),
        ("linux64", "linux64"),
        ("linux32-system", "linux32-gettext"),
        ("linux32", "linux32"),
        ("musl", "musl"),
        ("build", "linux64-build"),
        ("build2", "linux64-build"),
    ];

    for (label, image) in labels {
        let dir = TempDir::new().unwrap();
        let dispatcher = Dispatcher::new(DispatchConfig::default(), RecordingRunner::new());

        dispatcher
            .run(&resolve(label).unwrap(), &host(&dir))
            .await
            .unwrap();

        let recorded = dispatcher.runner().recorded();
        assert_eq!(recorded.len(), 2, "{label}");

        let dockerfile = format!("ci/Dockerfile-{image}");
        let build = &recorded[0];
        assert!(build.dirs_existed, "{label}: directories must exist before the build");
        assert_eq!(build.invocation.program, "docker");
        assert_eq!(
            build.invocation.args,
            [
                "build",
                "-t",
                "gettext-rs",
                "-f",
                dockerfile.as_str(),
                "ci"
            ],
            "{label}"
        );

        let run = &recorded[1].invocation;
        assert_eq!(run.args[0], "run");
        assert!(run.args.contains(&format!("DOCKER={image}")), "{label}");
        assert!(run.args.contains(&"/opt/rust/stable:/rust:ro".to_string()));
        assert!(
            run.args
                .contains(&"/home/ci/.cargo/registry:/cargo/registry".to_string())
        );
        assert_eq!(run.args.last().map(String::as_str), Some("ci/run.sh"));
    }
}

#[tokio::test]
async fn test_sysroot_is_detected_with_rustc() {
    let dir = TempDir::new().unwrap();
    let dispatcher = Dispatcher::new(
        DispatchConfig::default(),
        RecordingRunner::new().with_sysroot("/home/ci/.rustup/toolchains/nightly"),
    );

    let plan = dispatcher
        .plan(&Platform::Linux64.profile(), &host(&dir))
        .await
        .unwrap();

    let captures = dispatcher.runner().captures();
    assert_eq!(captures.len(), 1);
    assert_eq!(captures[0].program, "rustc");
    assert_eq!(captures[0].args, ["--print", "sysroot"]);
    assert!(
        plan.steps[1]
            .args
            .contains(&"/home/ci/.rustup/toolchains/nightly:/rust:ro".to_string())
    );
}

#[tokio::test]
async fn test_configured_sysroot_skips_detection() {
    let dir = TempDir::new().unwrap();
    let config = DispatchConfig {
        sysroot: Some(PathBuf::from("/toolchains/pinned")),
        ..DispatchConfig::default()
    };
    let dispatcher = Dispatcher::new(config, RecordingRunner::new());

    let plan = dispatcher
        .plan(&Platform::Musl.profile(), &host(&dir))
        .await
        .unwrap();

    assert!(dispatcher.runner().captures().is_empty());
    assert!(
        plan.steps[1]
            .args
            .contains(&"/toolchains/pinned:/rust:ro".to_string())
    );
}

#[tokio::test]
async fn test_empty_sysroot_is_an_error() {
    let dir = TempDir::new().unwrap();
    let dispatcher = Dispatcher::new(
        DispatchConfig::default(),
        RecordingRunner::new().with_sysroot(""),
    );

    let err = dispatcher
        .run(&Platform::Linux32.profile(), &host(&dir))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HostPath { .. }));
    assert!(dispatcher.runner().recorded().is_empty());
}

#[tokio::test]
async fn test_failed_image_build_skips_run() {
    let dir = TempDir::new().unwrap();
    let runner = RecordingRunner::new().failing("docker", Some("build"), 17);
    let dispatcher = Dispatcher::new(DispatchConfig::default(), runner);

    let err = dispatcher
        .run(&Platform::Linux64System.profile(), &host(&dir))
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 17);
    assert_eq!(dispatcher.runner().recorded().len(), 1);
}

#[tokio::test]
async fn test_failed_container_run_propagates_exit_code() {
    let dir = TempDir::new().unwrap();
    let runner = RecordingRunner::new().failing("docker", Some("run"), 101);
    let dispatcher = Dispatcher::new(DispatchConfig::default(), runner);

    let err = dispatcher
        .run(&Platform::Build2.profile(), &host(&dir))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::StepFailed { ref program, exit_code: 101 } if program == "docker"
    ));
    assert_eq!(dispatcher.runner().recorded().len(), 2);
}

#[cfg(unix)]
#[tokio::test]
async fn test_directory_creation_failure_aborts_before_build() {
    let dir = TempDir::new().unwrap();
    // A regular file where the output directory should go
    std::fs::write(dir.path().join("target"), b"").unwrap();
    let dispatcher = Dispatcher::new(DispatchConfig::default(), RecordingRunner::new());

    let err = dispatcher
        .run(&Platform::Musl.profile(), &host(&dir))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Io { .. }));
    assert_eq!(err.exit_code(), 1);
    assert!(dispatcher.runner().recorded().is_empty());
}

#[tokio::test]
async fn test_existing_directories_are_kept() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("target/debug")).unwrap();
    std::fs::write(dir.path().join("target/debug/marker"), b"keep").unwrap();
    let dispatcher = Dispatcher::new(DispatchConfig::default(), RecordingRunner::new());

    dispatcher
        .run(&Platform::Linux64.profile(), &host(&dir))
        .await
        .unwrap();

    assert_eq!(
        std::fs::read(dir.path().join("target/debug/marker")).unwrap(),
        b"keep"
    );
    assert!(dir.path().join(".cargo").is_dir());
}
