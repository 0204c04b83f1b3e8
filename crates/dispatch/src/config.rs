//! Dispatch configuration
//!
//! Every field has a default matching the layout of the gettext-rs
//! repository, so a configuration file is only needed to deviate from it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Settings controlling how a CI run is dispatched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct DispatchConfig {
    /// The delegated build entry point, relative to the working directory.
    ///
    /// Also run inside the container relative to `workdir`.
    pub script: PathBuf,
    /// Directory holding `Dockerfile-<image>` definitions; also the build context
    pub dockerfile_dir: PathBuf,
    /// Tag given to the built image
    pub image_tag: String,
    /// Container runtime executable
    pub runtime: String,
    /// Working directory inside the container
    pub workdir: String,
    /// Where the host toolchain is mounted (read-only) inside the container
    pub toolchain_mount: String,
    /// Where the host registry cache is mounted inside the container
    pub registry_mount: String,
    /// Local credentials/cache directory created before a container run
    pub cache_dir: PathBuf,
    /// Local build output directory created before a container run
    pub output_dir: PathBuf,
    /// Attach an interactive terminal to the container
    pub tty: bool,
    /// Host toolchain directory; `rustc --print sysroot` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sysroot: Option<PathBuf>,
    /// Host cargo home; `$CARGO_HOME` or `~/.cargo` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo_home: Option<PathBuf>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            script: PathBuf::from("ci/run.sh"),
            dockerfile_dir: PathBuf::from("ci"),
            image_tag: "gettext-rs".to_string(),
            runtime: "docker".to_string(),
            workdir: "/checkout".to_string(),
            toolchain_mount: "/rust".to_string(),
            registry_mount: "/cargo/registry".to_string(),
            cache_dir: PathBuf::from(".cargo"),
            output_dir: PathBuf::from("target"),
            tty: true,
            sysroot: None,
            cargo_home: None,
        }
    }
}

impl DispatchConfig {
    /// Parse a TOML configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the document is not valid TOML or
    /// contains unknown keys.
    pub fn from_toml(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| Error::configuration(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or a configuration
    /// error if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::io(e, path, "read"))?;
        tracing::debug!(path = %path.display(), "Loaded dispatch configuration");
        Self::from_toml(&source).map_err(|e| match e {
            Error::Configuration { message } => {
                Error::configuration(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// Path of the Dockerfile for `image`, relative to the working directory
    #[must_use]
    pub fn dockerfile_for(&self, image: &str) -> PathBuf {
        self.dockerfile_dir.join(format!("Dockerfile-{image}"))
    }

    /// Cargo's target directory inside the container
    #[must_use]
    pub fn container_target_dir(&self) -> String {
        format!(
            "{}/{}",
            self.workdir.trim_end_matches('/'),
            self.output_dir.display()
        )
    }

    fn validate(&self) -> Result<()> {
        if self.runtime.trim().is_empty() {
            return Err(Error::configuration("runtime must not be empty"));
        }
        if self.image_tag.trim().is_empty() {
            return Err(Error::configuration("image-tag must not be empty"));
        }
        for (key, path) in [
            ("script", &self.script),
            ("cache-dir", &self.cache_dir),
            ("output-dir", &self.output_dir),
        ] {
            if !is_checkout_relative(path) {
                return Err(Error::configuration(format!(
                    "{key} must be a relative path inside the checkout, got '{}'",
                    path.display()
                )));
            }
        }
        for (key, mount) in [
            ("workdir", &self.workdir),
            ("toolchain-mount", &self.toolchain_mount),
            ("registry-mount", &self.registry_mount),
        ] {
            if !mount.starts_with('/') {
                return Err(Error::configuration(format!(
                    "{key} must be an absolute container path, got '{mount}'"
                )));
            }
        }
        Ok(())
    }
}

/// Non-empty, relative and never stepping out through `..`
fn is_checkout_relative(path: &Path) -> bool {
    path.components().next().is_some()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
