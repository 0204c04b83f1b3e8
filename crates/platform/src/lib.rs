//! Platform profiles for the gettext-rs CI
//!
//! A CI job is selected by a short label such as `linux64-system` or
//! `macos-homebrew`. Each label resolves to a [`PlatformProfile`]: the target
//! triple to build for, whether the job runs natively or inside a container
//! image, and how the build should locate gettext.
//!
//! ```
//! use gettext_ci_platform::{Execution, resolve};
//!
//! let profile = resolve("musl").unwrap();
//! assert_eq!(profile.target, "x86_64-unknown-linux-musl");
//! assert_eq!(profile.execution, Execution::container("musl"));
//! ```

pub mod error;
pub mod platform;
pub mod profile;

pub use error::{Error, Result};
pub use platform::{Platform, resolve};
pub use profile::{Execution, GettextSource, PlatformProfile, vars};
