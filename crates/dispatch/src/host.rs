//! Host-side inputs to a dispatch: the working directory, pass-through
//! environment knobs and the toolchain/registry locations.

use crate::error::{Error, Result};
use gettext_ci_platform::vars;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variables inherited from the caller and forwarded untouched
/// unless the profile overrides them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbientEnv {
    vars: BTreeMap<String, String>,
}

impl AmbientEnv {
    /// Whether `name` is a pass-through knob
    #[must_use]
    pub fn is_forwarded(name: &str) -> bool {
        name == vars::NO_RUN || name.starts_with(vars::GETTEXT_PREFIX)
    }

    /// Keep the pass-through knobs from an arbitrary set of variables
    pub fn from_vars<I, K, V>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| Self::is_forwarded(k))
            .collect();
        Self { vars }
    }

    /// Snapshot the pass-through knobs of the current process.
    ///
    /// Variables that are not valid UTF-8 are skipped.
    #[must_use]
    pub fn from_process() -> Self {
        Self::from_vars(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    /// The captured variables
    #[must_use]
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }
}

/// Everything the dispatcher needs to know about the invoking host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    /// Directory the run is dispatched from; mounted as the container workdir
    pub workdir: PathBuf,
    /// Pass-through knobs
    pub ambient: AmbientEnv,
    /// `$CARGO_HOME`, if set
    pub cargo_home: Option<PathBuf>,
}

impl HostContext {
    /// Capture the current process's directory and environment
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the current directory cannot be determined.
    pub fn from_process() -> Result<Self> {
        let workdir = std::env::current_dir()
            .map_err(|e| Error::io_no_path(e, "read current directory"))?;
        Ok(Self {
            workdir,
            ambient: AmbientEnv::from_process(),
            cargo_home: std::env::var_os("CARGO_HOME")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        })
    }

    /// A context rooted at `workdir` with no inherited knobs
    #[must_use]
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            ambient: AmbientEnv::default(),
            cargo_home: None,
        }
    }

    /// Replace the pass-through knobs
    #[must_use]
    pub fn with_ambient(mut self, ambient: AmbientEnv) -> Self {
        self.ambient = ambient;
        self
    }

    /// Set the cargo home
    #[must_use]
    pub fn with_cargo_home(mut self, cargo_home: impl Into<PathBuf>) -> Self {
        self.cargo_home = Some(cargo_home.into());
        self
    }

    /// Resolve `path` against the working directory
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workdir.join(path)
        }
    }

    /// Cargo home: explicit override, then `$CARGO_HOME`, then `~/.cargo`
    ///
    /// # Errors
    ///
    /// Returns [`Error::HostPath`] when no home directory can be found.
    pub fn cargo_home(&self, configured: Option<&Path>) -> Result<PathBuf> {
        configured
            .map(Path::to_path_buf)
            .or_else(|| self.cargo_home.clone())
            .or_else(|| dirs::home_dir().map(|home| home.join(".cargo")))
            .ok_or(Error::HostPath {
                what: "the cargo home directory",
                help: "Set CARGO_HOME or `cargo-home` in the configuration file".to_string(),
            })
    }
}
