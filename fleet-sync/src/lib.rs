//! # fleet-sync
//!
//! Template Synchronizer: mirrors configured subtrees of the template
//! checkout into every fleet repository with hash-gated atomic writes.
//!
//! Call [`sync_template`] with a [`SyncRequest`] and the target checkouts
//! (usually from [`fleet_core::workspace::scan_at`]).

pub mod error;
pub mod mirror;
pub mod pipeline;
pub mod writer;

pub use error::SyncError;
pub use mirror::{MirrorOptions, MirrorOutcome};
pub use pipeline::{sync_target, sync_template, SyncRequest, SyncWarning, TargetReport};
pub use writer::{file_digest, WriteResult};
