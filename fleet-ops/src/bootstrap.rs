//! Repository Bootstrapper.
//!
//! Creation from the template is the only step whose failure aborts. Every
//! later step (merge settings, branch protection, placeholder rewrite,
//! workflow dispatch) is attempted independently; any failure leaves the
//! repository created but marks the report `needs_attention`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use fleet_core::config::{BootstrapConfig, RewriteConfig};
use fleet_core::types::{ErrorKind, Owner, RepoHandle};
use fleet_renderer::Substitutions;

use crate::error::OpsError;
use crate::gh::HostingApi;
use crate::git::VersionControl;
use crate::report::{Outcome, RepoReport, TaskOutcome};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapStep {
    Create,
    MergeSettings,
    BranchProtection,
    RewritePlaceholders,
    DispatchWorkflow,
}

impl BootstrapStep {
    pub fn key(&self) -> &'static str {
        match self {
            BootstrapStep::Create => "create",
            BootstrapStep::MergeSettings => "merge_settings",
            BootstrapStep::BranchProtection => "branch_protection",
            BootstrapStep::RewritePlaceholders => "rewrite_placeholders",
            BootstrapStep::DispatchWorkflow => "dispatch_workflow",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    pub step: BootstrapStep,
    pub kind: ErrorKind,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapStatus {
    /// Created and every requested step succeeded.
    Complete,
    /// Created, but at least one configuration step failed.
    NeedsAttention,
    /// Not created; nothing else was attempted.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapOutcome {
    pub status: BootstrapStatus,
    pub completed: Vec<BootstrapStep>,
    pub failures: Vec<StepFailure>,
}

impl Outcome for BootstrapOutcome {
    fn label(&self) -> &'static str {
        match self.status {
            BootstrapStatus::Complete => "complete",
            BootstrapStatus::NeedsAttention => "needs_attention",
            BootstrapStatus::Failed => "failed",
        }
    }

    fn detail(&self) -> String {
        if self.failures.is_empty() {
            return self
                .completed
                .iter()
                .map(BootstrapStep::key)
                .collect::<Vec<_>>()
                .join(", ");
        }
        self.failures
            .iter()
            .map(|f| format!("{}: {}", f.step.key(), f.reason))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn is_error(&self) -> bool {
        self.status != BootstrapStatus::Complete
    }
}

// ---------------------------------------------------------------------------
// Bootstrapper
// ---------------------------------------------------------------------------

pub struct Bootstrapper<'a, V: ?Sized, H: ?Sized> {
    vcs: &'a V,
    host: &'a H,
    config: &'a BootstrapConfig,
    owner: Owner,
    workspace: PathBuf,
    base: String,
}

impl<'a, V, H> Bootstrapper<'a, V, H>
where
    V: VersionControl + ?Sized,
    H: HostingApi + ?Sized,
{
    pub fn new(
        vcs: &'a V,
        host: &'a H,
        config: &'a BootstrapConfig,
        owner: Owner,
        workspace: impl Into<PathBuf>,
        base: impl Into<String>,
    ) -> Self {
        Bootstrapper {
            vcs,
            host,
            config,
            owner,
            workspace: workspace.into(),
            base: base.into(),
        }
    }

    /// Bootstrap each name in turn, pausing `dispatch_delay_secs` between
    /// consecutive workflow dispatches.
    pub fn run(&self, names: &[String]) -> Vec<RepoReport<BootstrapOutcome>> {
        let delay = Duration::from_secs(self.config.dispatch_delay_secs);
        let mut dispatched_before = false;
        let mut reports = Vec::new();
        for name in names {
            if dispatched_before && self.config.workflow.is_some() && !delay.is_zero() {
                std::thread::sleep(delay);
            }
            let outcome = self.bootstrap_one(name);
            dispatched_before = outcome.completed.contains(&BootstrapStep::DispatchWorkflow)
                || outcome
                    .failures
                    .iter()
                    .any(|f| f.step == BootstrapStep::DispatchWorkflow);
            match outcome.status {
                BootstrapStatus::Complete => tracing::info!(repo = %name, "bootstrapped"),
                status => tracing::warn!(repo = %name, ?status, detail = %outcome.detail(), "bootstrap incomplete"),
            }
            reports.push(RepoReport::new(format!("{}/{}", self.owner, name), outcome));
        }
        reports
    }

    pub fn bootstrap_one(&self, name: &str) -> BootstrapOutcome {
        let slug = format!("{}/{}", self.owner, name);
        let mut completed = Vec::new();
        let mut failures = Vec::new();

        if let Err(err) =
            self.host
                .create_from_template(&slug, &self.config.template_ref, self.config.visibility)
        {
            return BootstrapOutcome {
                status: BootstrapStatus::Failed,
                completed,
                failures: vec![failure(BootstrapStep::Create, &err)],
            };
        }
        completed.push(BootstrapStep::Create);

        let mut attempt = |step: BootstrapStep, result: Result<(), OpsError>| match result {
            Ok(()) => completed.push(step),
            Err(err) => failures.push(failure(step, &err)),
        };

        attempt(
            BootstrapStep::MergeSettings,
            self.host.apply_merge_settings(&slug),
        );
        if let Some(protection) = &self.config.protection {
            attempt(
                BootstrapStep::BranchProtection,
                self.host.protect_branch(&slug, &self.base, protection),
            );
        }
        if let Some(rewrite) = &self.config.rewrite {
            attempt(
                BootstrapStep::RewritePlaceholders,
                self.rewrite(name, &slug, rewrite),
            );
        }
        if let Some(workflow) = &self.config.workflow {
            attempt(
                BootstrapStep::DispatchWorkflow,
                self.host.dispatch_workflow(&slug, workflow, &self.base),
            );
        }

        let status = if failures.is_empty() {
            BootstrapStatus::Complete
        } else {
            BootstrapStatus::NeedsAttention
        };
        BootstrapOutcome {
            status,
            completed,
            failures,
        }
    }

    fn rewrite(&self, name: &str, slug: &str, rewrite: &RewriteConfig) -> Result<(), OpsError> {
        let checkout = self.workspace.join(name);
        ensure_checkout(self.vcs, self.host, slug, &checkout, &self.base)?;

        let target = checkout.join(&rewrite.path);
        let subs = Substitutions::for_repo(name, &rewrite.placeholders);
        let outcome = subs.rewrite_file(&target).map_err(|err| match err {
            fleet_renderer::RenderError::RewriteTargetMissing { path } => {
                OpsError::Missing(format!("{} not found in new repository", path.display()))
            }
            other => OpsError::Render(other),
        })?;

        if !outcome.changed {
            return Err(OpsError::Missing(format!(
                "no placeholder tokens found in {}",
                rewrite.path.display()
            )));
        }
        if !outcome.missing_tokens.is_empty() {
            tracing::warn!(
                repo = %slug,
                tokens = ?outcome.missing_tokens,
                "some placeholder tokens were not present"
            );
        }

        self.vcs.stage_all(&checkout)?;
        self.vcs.commit(&checkout, &rewrite.commit_message)?;
        self.vcs.push_upstream(&checkout, &self.base)
    }
}

fn failure(step: BootstrapStep, err: &OpsError) -> StepFailure {
    StepFailure {
        step,
        kind: err.kind(),
        reason: err.to_string(),
    }
}

/// Clone `slug` into `dest`, or bring an existing checkout up to date.
pub(crate) fn ensure_checkout<V, H>(
    vcs: &V,
    host: &H,
    slug: &str,
    dest: &Path,
    base: &str,
) -> Result<&'static str, OpsError>
where
    V: VersionControl + ?Sized,
    H: HostingApi + ?Sized,
{
    if dest.exists() {
        vcs.reset_to_remote(dest, base)?;
        Ok("updated")
    } else {
        host.clone_repo(slug, dest)?;
        Ok("cloned")
    }
}

// ---------------------------------------------------------------------------
// configure
// ---------------------------------------------------------------------------

/// Apply merge settings and (when configured) branch protection to existing
/// repositories.
pub fn configure<H: HostingApi + ?Sized>(
    host: &H,
    repos: &[RepoHandle],
    config: &BootstrapConfig,
    base: &str,
    dry_run: bool,
) -> Vec<RepoReport<TaskOutcome>> {
    repos
        .iter()
        .map(|repo| {
            let slug = repo.slug();
            let outcome = if dry_run {
                TaskOutcome::would_run(match config.protection {
                    Some(_) => "apply merge settings and branch protection",
                    None => "apply merge settings",
                })
            } else {
                configure_one(host, &slug, config, base)
            };
            RepoReport::new(slug, outcome)
        })
        .collect()
}

fn configure_one<H: HostingApi + ?Sized>(
    host: &H,
    slug: &str,
    config: &BootstrapConfig,
    base: &str,
) -> TaskOutcome {
    let mut errors = Vec::new();
    let mut kind = ErrorKind::ExternalCallFailure;
    if let Err(err) = host.apply_merge_settings(slug) {
        kind = err.kind();
        errors.push(format!("merge settings: {err}"));
    }
    if let Some(protection) = &config.protection {
        if let Err(err) = host.protect_branch(slug, base, protection) {
            kind = err.kind();
            errors.push(format!("branch protection: {err}"));
        }
    }
    if errors.is_empty() {
        TaskOutcome::done(match config.protection {
            Some(_) => "merge settings and branch protection applied",
            None => "merge settings applied",
        })
    } else {
        TaskOutcome::Error {
            kind,
            reason: errors.join("; "),
        }
    }
}
