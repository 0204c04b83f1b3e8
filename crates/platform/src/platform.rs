//! Platform labels accepted on the command line

use crate::error::{Error, Result};
use crate::profile::{Execution, GettextSource, PlatformProfile};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Target triple for 64-bit glibc Linux
pub const LINUX64_TARGET: &str = "x86_64-unknown-linux-gnu";
/// Target triple for 32-bit glibc Linux
pub const LINUX32_TARGET: &str = "i686-unknown-linux-gnu";
/// Target triple for 64-bit musl Linux
pub const MUSL_TARGET: &str = "x86_64-unknown-linux-musl";
/// Target triple for Intel macOS
pub const MACOS_TARGET: &str = "x86_64-apple-darwin";

/// Prefix gettext is installed into by the `linux64-build` image
pub const BUILD_PREFIX: &str = "/result";
/// Prefix of Homebrew's keg-only gettext
pub const HOMEBREW_PREFIX: &str = "/usr/local/opt/gettext";

/// A named CI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    /// 64-bit Linux against the distribution's gettext package
    Linux64System,
    /// 64-bit Linux against the bundled gettext
    Linux64,
    /// 32-bit Linux against the distribution's gettext package
    Linux32System,
    /// 32-bit Linux against the bundled gettext
    Linux32,
    /// 64-bit musl Linux
    Musl,
    /// gettext built from source into a single prefix
    Build,
    /// gettext built from source, located through separate directories
    Build2,
    /// macOS against Homebrew's gettext prefix
    MacosHomebrew,
    /// macOS against Homebrew's gettext, located through separate directories
    MacosHomebrew2,
    /// macOS against the bundled gettext
    Macos,
}

impl Platform {
    /// Every platform, in the order they are listed to users
    pub const ALL: [Self; 10] = [
        Self::Linux64System,
        Self::Linux64,
        Self::Linux32System,
        Self::Linux32,
        Self::Musl,
        Self::Build,
        Self::Build2,
        Self::MacosHomebrew,
        Self::MacosHomebrew2,
        Self::Macos,
    ];

    /// The label used to select this platform
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux64System => "linux64-system",
            Self::Linux64 => "linux64",
            Self::Linux32System => "linux32-system",
            Self::Linux32 => "linux32",
            Self::Musl => "musl",
            Self::Build => "build",
            Self::Build2 => "build2",
            Self::MacosHomebrew => "macos-homebrew",
            Self::MacosHomebrew2 => "macos-homebrew2",
            Self::Macos => "macos",
        }
    }

    /// Resolve this platform into its profile
    #[must_use]
    pub fn profile(self) -> PlatformProfile {
        let (target, execution, gettext) = match self {
            Self::Linux64System => (
                LINUX64_TARGET,
                Execution::container("linux64-gettext"),
                GettextSource::System,
            ),
            Self::Linux64 => (
                LINUX64_TARGET,
                Execution::container("linux64"),
                GettextSource::Bundled,
            ),
            // The linux32-gettext image provides the package, but the build
            // does not opt into it.
            Self::Linux32System => (
                LINUX32_TARGET,
                Execution::container("linux32-gettext"),
                GettextSource::Bundled,
            ),
            Self::Linux32 => (
                LINUX32_TARGET,
                Execution::container("linux32"),
                GettextSource::Bundled,
            ),
            Self::Musl => (
                MUSL_TARGET,
                Execution::container("musl"),
                GettextSource::Bundled,
            ),
            Self::Build => (
                LINUX64_TARGET,
                Execution::container("linux64-build"),
                GettextSource::prefix(BUILD_PREFIX),
            ),
            Self::Build2 => (
                LINUX64_TARGET,
                Execution::container("linux64-build"),
                GettextSource::split_under(BUILD_PREFIX),
            ),
            Self::MacosHomebrew => (
                MACOS_TARGET,
                Execution::Native,
                GettextSource::prefix(HOMEBREW_PREFIX),
            ),
            Self::MacosHomebrew2 => (
                MACOS_TARGET,
                Execution::Native,
                GettextSource::split_under(HOMEBREW_PREFIX),
            ),
            Self::Macos => (MACOS_TARGET, Execution::Native, GettextSource::Bundled),
        };

        PlatformProfile {
            platform: self,
            target: target.to_string(),
            execution,
            gettext,
        }
    }

    /// Labels of every platform
    pub fn labels() -> impl Iterator<Item = &'static str> {
        Self::ALL.iter().map(|p| p.as_str())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::MissingPlatform);
        }
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::unknown_platform(s, Self::labels()))
    }
}

/// Resolve a label straight into its profile
///
/// # Errors
///
/// Returns [`Error::UnknownPlatform`] when the label is not one of
/// [`Platform::ALL`], and [`Error::MissingPlatform`] when it is empty.
pub fn resolve(label: &str) -> Result<PlatformProfile> {
    label.parse::<Platform>().map(Platform::profile)
}
