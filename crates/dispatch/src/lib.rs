//! Dispatch of the gettext-rs CI script
//!
//! Given a [`PlatformProfile`](gettext_ci_platform::PlatformProfile), the
//! [`Dispatcher`] either runs `ci/run.sh` directly on the host, or builds the
//! profile's container image and runs the script inside it with the checkout,
//! build output, toolchain and registry cache mounted.
//!
//! Execution is fail-fast: the first step that cannot be started or exits
//! non-zero aborts the dispatch, and its status becomes the result.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod invocation;
pub mod plan;
pub mod runner;

pub use config::DispatchConfig;
pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use host::{AmbientEnv, HostContext};
pub use invocation::Invocation;
pub use plan::{HostMounts, Plan};
pub use runner::{CommandRunner, ProcessRunner};
