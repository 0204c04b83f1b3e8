//! Command implementations behind the CLI flags

use crate::cli::{Cli, CliError, OkEnvelope};
use gettext_ci_dispatch::{DispatchConfig, Dispatcher, HostContext, Plan, ProcessRunner};
use gettext_ci_platform::{GettextSource, Platform, PlatformProfile};
use std::fmt::Write as _;

/// Render the platform table
///
/// # Errors
///
/// Only fails if the JSON envelope cannot be serialized.
pub fn list_platforms(json: bool) -> Result<String, CliError> {
    let profiles: Vec<PlatformProfile> = Platform::ALL.into_iter().map(Platform::profile).collect();

    if json {
        return to_json(&OkEnvelope::new(profiles));
    }

    let mut out = String::new();
    for profile in &profiles {
        let _ = writeln!(
            out,
            "{:<16} {:<26} {:<16} {}",
            profile.platform.as_str(),
            profile.target,
            profile.execution.image().unwrap_or("(native)"),
            describe_gettext(&profile.gettext),
        );
    }
    Ok(out)
}

/// Merge the configuration file (if any) with command-line overrides
///
/// # Errors
///
/// Fails if the configuration file cannot be read or parsed.
pub fn dispatch_config(cli: &Cli) -> Result<DispatchConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => DispatchConfig::load(path)?,
        None => DispatchConfig::default(),
    };

    if let Some(runtime) = &cli.runtime {
        if runtime.trim().is_empty() {
            return Err(CliError::config("--runtime must not be empty"));
        }
        config.runtime.clone_from(runtime);
    }
    if let Some(sysroot) = &cli.sysroot {
        config.sysroot = Some(sysroot.clone());
    }
    if cli.no_tty {
        config.tty = false;
    }
    Ok(config)
}

/// Resolve the label and dispatch it, or print the plan under `--dry-run`.
///
/// Returns what should be written to stdout.
///
/// # Errors
///
/// Unknown labels are configuration errors; dispatch failures carry the
/// failing step's exit status.
pub async fn run(cli: &Cli) -> Result<String, CliError> {
    let label = cli.label.as_deref().unwrap_or_default();
    let profile = gettext_ci_platform::resolve(label)?;
    let config = dispatch_config(cli)?;
    let host = HostContext::from_process()?;
    let dispatcher = Dispatcher::new(config, ProcessRunner::new());

    if cli.dry_run {
        let plan = dispatcher.plan(&profile, &host).await?;
        return render_plan(&plan, cli.json);
    }

    dispatcher.run(&profile, &host).await?;
    Ok(String::new())
}

/// Render a plan as shell commands or a JSON envelope
///
/// # Errors
///
/// Only fails if the JSON envelope cannot be serialized.
pub fn render_plan(plan: &Plan, json: bool) -> Result<String, CliError> {
    if json {
        return to_json(&OkEnvelope::new(plan));
    }

    let mut out = String::new();
    for dir in &plan.directories {
        let _ = writeln!(out, "mkdir -p {}", dir.display());
    }
    for step in &plan.steps {
        let _ = writeln!(out, "{step}");
    }
    Ok(out)
}

fn describe_gettext(source: &GettextSource) -> String {
    match source {
        GettextSource::Bundled => "bundled".to_string(),
        GettextSource::System => "system package".to_string(),
        GettextSource::Prefix { root } => format!("prefix {root}"),
        GettextSource::Split { lib, bin, include } => {
            format!("lib {lib}, bin {bin}, include {include}")
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map(|mut s| {
            s.push('\n');
            s
        })
        .map_err(|e| CliError::Failed {
            message: format!("Failed to serialize output: {e}"),
            help: None,
            exit_code: 1,
        })
}
