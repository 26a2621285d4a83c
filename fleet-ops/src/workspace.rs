//! Fleet membership on disk: turning workspace checkouts into
//! [`RepoHandle`]s, and cloning or refreshing the whole organization.

use std::path::Path;

use fleet_core::types::{Owner, RepoHandle, RepoName};
use fleet_core::workspace::{RepoCandidate, RepoFilter};
use fleet_detector::{detect_repo, Confidence};

use crate::bootstrap::ensure_checkout;
use crate::error::{io_err, OpsError};
use crate::gh::HostingApi;
use crate::git::VersionControl;
use crate::report::{RepoReport, TaskOutcome};

/// Build handles for `candidates`, taking the owner from each checkout's
/// remote when it can be read and falling back to `default_owner`.
pub fn resolve_handles(candidates: &[RepoCandidate], default_owner: &Owner) -> Vec<RepoHandle> {
    candidates
        .iter()
        .map(|c| match detect_repo(&c.path) {
            Ok(detected) => {
                if detected.confidence == Confidence::Medium {
                    tracing::warn!(
                        path = %c.path.display(),
                        remote = detected.remote_url.as_deref().unwrap_or("<none>"),
                        owner = %default_owner,
                        "no GitHub remote recognized; using the default owner and directory name"
                    );
                }
                detected.into_handle(default_owner)
            }
            Err(err) => {
                tracing::debug!(path = %c.path.display(), error = %err, "remote not detected");
                RepoHandle::new(default_owner.clone(), c.name.clone(), c.path.clone())
            }
        })
        .collect()
}

/// Parameters for [`clone_workspace`].
#[derive(Debug, Clone, Copy)]
pub struct CloneRequest<'a> {
    pub org: &'a Owner,
    pub workspace: &'a Path,
    pub filter: &'a RepoFilter,
    pub template: &'a RepoName,
    pub base: &'a str,
    pub dry_run: bool,
}

/// Clone every organization repository that passes `filter` into
/// `workspace`, or hard-reset existing checkouts to `origin/<base>`.
///
/// The template repository is handled first. Names containing `.` are
/// dropped from the listing. Only a failed listing is fatal.
pub fn clone_workspace<V, H>(
    vcs: &V,
    host: &H,
    request: CloneRequest<'_>,
) -> Result<Vec<RepoReport<TaskOutcome>>, OpsError>
where
    V: VersionControl + ?Sized,
    H: HostingApi + ?Sized,
{
    let CloneRequest {
        org,
        workspace,
        filter,
        template,
        base,
        dry_run,
    } = request;
    let listed = host.list_org_repos(org)?;
    let names = filter.select(listed.iter().filter(|n| !n.contains('.')));
    tracing::info!(org = %org, listed = listed.len(), selected = names.len(), "organization listed");

    if !dry_run {
        std::fs::create_dir_all(workspace).map_err(|e| io_err(workspace, e))?;
    }

    let mut reports = Vec::new();
    for name in std::iter::once(template).chain(names.iter()) {
        let slug = format!("{org}/{name}");
        let dest = workspace.join(&name.0);
        let outcome = if dry_run {
            TaskOutcome::would_run(if dest.exists() { "update" } else { "clone" })
        } else {
            match ensure_checkout(vcs, host, &slug, &dest, base) {
                Ok(action) => TaskOutcome::done(action),
                Err(err) => {
                    tracing::warn!(repo = %slug, error = %err, "clone/update failed");
                    err.into()
                }
            }
        };
        reports.push(RepoReport::new(slug, outcome));
    }
    Ok(reports)
}
