//! Template context: serializable rendering payload for pull-request text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fleet_core::types::RepoHandle;

use crate::error::RenderError;

/// Payload handed to the pull-request templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestContext {
    pub repo: RepoCtx,
    pub change: ChangeCtx,
    pub meta: MetaCtx,
}

/// Which repository the PR is opened against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoCtx {
    pub owner: String,
    pub name: String,
    pub slug: String,
}

/// What the PR carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeCtx {
    /// The commit message; also the PR title.
    pub message: String,
    pub head: String,
    pub base: String,
    /// `true` when the branch was pushed by an earlier, interrupted run.
    pub resumed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaCtx {
    pub fleet_version: String,
    pub rendered_at: DateTime<Utc>,
}

impl PullRequestContext {
    pub fn new(repo: &RepoHandle, message: &str, head: &str, base: &str) -> Self {
        PullRequestContext {
            repo: RepoCtx {
                owner: repo.owner.0.clone(),
                name: repo.name.0.clone(),
                slug: repo.slug(),
            },
            change: ChangeCtx {
                message: message.to_string(),
                head: head.to_string(),
                base: base.to_string(),
                resumed: false,
            },
            meta: MetaCtx {
                fleet_version: env!("CARGO_PKG_VERSION").to_string(),
                rendered_at: Utc::now(),
            },
        }
    }

    pub fn resumed(mut self) -> Self {
        self.change.resumed = true;
        self
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_fields_populated() {
        let handle = RepoHandle::new("OBDb", "Toyota-Camry", "/ws/Toyota-Camry");
        let ctx = PullRequestContext::new(&handle, "Update sensor X", "wip", "main");
        assert_eq!(ctx.repo.slug, "OBDb/Toyota-Camry");
        assert_eq!(ctx.change.head, "wip");
        assert!(!ctx.change.resumed);
        assert!(ctx.resumed().change.resumed);
    }

    #[test]
    fn to_tera_context_succeeds() {
        let handle = RepoHandle::new("OBDb", "Kia-Niro", "/ws/Kia-Niro");
        let ctx = PullRequestContext::new(&handle, "msg", "wip", "main");
        ctx.to_tera_context().expect("context conversion");
    }
}
