//! # fleet-ops
//!
//! Everything that talks to `git` and `gh`.
//!
//! - [`runner`]: process execution seam ([`CommandRunner`], [`SystemRunner`])
//! - [`git`] / [`gh`]: [`VersionControl`] and [`HostingApi`] plus their CLI
//!   implementations
//! - [`state`]: Sync State classification and `status`
//! - [`propagate`]: the Fleet Change Propagator
//! - [`bootstrap`]: the Repository Bootstrapper and `configure`
//! - [`workspace`]: handle resolution and organization clone
//! - [`maintenance`]: `cleanup`, `close`, `trigger`
//!
//! Repositories are processed one at a time in the order given; a failure in
//! one is recorded in its [`RepoReport`] and never stops the rest.

pub mod bootstrap;
mod error;
pub mod gh;
pub mod git;
pub mod maintenance;
pub mod propagate;
pub mod report;
pub mod runner;
pub mod state;
pub mod workspace;

pub use bootstrap::{configure, BootstrapOutcome, BootstrapStatus, BootstrapStep, Bootstrapper};
pub use error::{CommandError, OpsError};
pub use gh::{GhCli, HostingApi, NewPullRequest};
pub use git::{GitCli, VersionControl};
pub use maintenance::{cleanup, close, trigger};
pub use propagate::{PropagateOutcome, PropagateSettings, Propagator, WatchSettings};
pub use report::{any_errors, Outcome, RepoReport, StatusOutcome, TaskOutcome};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use state::{classify, status};
pub use workspace::{clone_workspace, resolve_handles, CloneRequest};
