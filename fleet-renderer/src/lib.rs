//! # fleet-renderer
//!
//! Tera-based rendering of the text the fleet tool generates (pull-request
//! bodies), plus declarative placeholder substitution for configuration
//! files in newly bootstrapped repositories.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fleet_core::types::RepoHandle;
//! use fleet_renderer::{PullRequestContext, Renderer};
//!
//! fn body_for(repo: &RepoHandle) -> Option<String> {
//!     let renderer = Renderer::new().ok()?;
//!     let ctx = PullRequestContext::new(repo, "Update sensor X", "wip", "main");
//!     renderer.pull_request_body(&ctx).ok()
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod placeholders;

pub use context::PullRequestContext;
pub use engine::{Renderer, TemplateKind};
pub use error::RenderError;
pub use placeholders::{RewriteOutcome, Substitutions};
