//! Resolved platform profiles and their environment encoding

use crate::platform::Platform;
use serde::Serialize;
use std::collections::BTreeMap;

/// Names of the environment variables understood by `ci/run.sh` and the
/// gettext-sys build script
pub mod vars {
    /// Target triple to build for
    pub const TARGET: &str = "TARGET";
    /// Container image the run was dispatched to
    pub const DOCKER: &str = "DOCKER";
    /// Link against the system gettext instead of building it
    pub const GETTEXT_SYSTEM: &str = "GETTEXT_SYSTEM";
    /// Prefix containing `lib/`, `bin/` and `include/`
    pub const GETTEXT_DIR: &str = "GETTEXT_DIR";
    /// Library directory
    pub const GETTEXT_LIB_DIR: &str = "GETTEXT_LIB_DIR";
    /// Binary directory
    pub const GETTEXT_BIN_DIR: &str = "GETTEXT_BIN_DIR";
    /// Header directory
    pub const GETTEXT_INCLUDE_DIR: &str = "GETTEXT_INCLUDE_DIR";
    /// Build only, skip running the tests
    pub const NO_RUN: &str = "NO_RUN";
    /// Cargo's output directory inside the container
    pub const CARGO_TARGET_DIR: &str = "CARGO_TARGET_DIR";

    /// Prefix shared by every gettext override
    pub const GETTEXT_PREFIX: &str = "GETTEXT_";
}

/// Where the CI run executes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum Execution {
    /// Directly on the host
    Native,
    /// Inside a container built from the named image definition
    Container {
        /// Image identifier, e.g. `linux64-gettext`
        image: String,
    },
}

impl Execution {
    /// Containerized execution for `image`
    #[must_use]
    pub fn container(image: impl Into<String>) -> Self {
        Self::Container {
            image: image.into(),
        }
    }

    /// The container image, if any
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        match self {
            Self::Native => None,
            Self::Container { image } => Some(image),
        }
    }

    /// Whether this runs on the host
    #[must_use]
    pub const fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }
}

/// How the build locates gettext
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GettextSource {
    /// Build the copy bundled with gettext-sys
    Bundled,
    /// Use the package manager's installation
    System,
    /// A single installation prefix
    Prefix {
        /// Root containing `lib/`, `bin/` and `include/`
        root: String,
    },
    /// Separately specified directories
    Split {
        /// Library directory
        lib: String,
        /// Binary directory
        bin: String,
        /// Header directory
        include: String,
    },
}

impl GettextSource {
    /// A combined installation prefix
    #[must_use]
    pub fn prefix(root: impl Into<String>) -> Self {
        Self::Prefix { root: root.into() }
    }

    /// Separate `lib`, `bin` and `include` directories under `root`
    #[must_use]
    pub fn split_under(root: &str) -> Self {
        let root = root.trim_end_matches('/');
        Self::Split {
            lib: format!("{root}/lib"),
            bin: format!("{root}/bin"),
            include: format!("{root}/include"),
        }
    }

    fn env_vars(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Bundled => Vec::new(),
            Self::System => vec![(vars::GETTEXT_SYSTEM, "1".to_string())],
            Self::Prefix { root } => vec![(vars::GETTEXT_DIR, root.clone())],
            Self::Split { lib, bin, include } => vec![
                (vars::GETTEXT_LIB_DIR, lib.clone()),
                (vars::GETTEXT_BIN_DIR, bin.clone()),
                (vars::GETTEXT_INCLUDE_DIR, include.clone()),
            ],
        }
    }
}

/// Everything a label resolves to. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    /// The platform this profile was resolved from
    pub platform: Platform,
    /// Target triple
    pub target: String,
    /// Native or containerized execution
    pub execution: Execution,
    /// gettext location overrides
    pub gettext: GettextSource,
}

impl PlatformProfile {
    /// Encode the profile as environment variables for the delegated build
    #[must_use]
    pub fn env_vars(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(vars::TARGET.to_string(), self.target.clone());
        if let Some(image) = self.execution.image() {
            env.insert(vars::DOCKER.to_string(), image.to_string());
        }
        for (name, value) in self.gettext.env_vars() {
            env.insert(name.to_string(), value);
        }
        env
    }
}
