//! Hosting collaborator: the [`HostingApi`] trait and its `gh`
//! command-line implementation.
//!
//! Every call names its repository with `--repo owner/name` (or an API path),
//! so none depend on the working directory.

use std::path::Path;

use serde::Deserialize;
use serde_json::json;

use fleet_core::config::ProtectionConfig;
use fleet_core::types::{MergeMethod, Owner, PullRequestRef, PullRequestState, Visibility};

use crate::error::OpsError;
use crate::runner::{run_checked, CommandRunner};

/// A pull request to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub head: &'a str,
    pub base: &'a str,
}

/// Operations against the hosting platform. `slug` is `owner/name`.
pub trait HostingApi {
    /// The open pull request whose head is `head`, if any.
    fn find_open_pr(&self, slug: &str, head: &str) -> Result<Option<PullRequestRef>, OpsError>;
    fn create_pr(&self, slug: &str, pr: &NewPullRequest<'_>) -> Result<PullRequestRef, OpsError>;
    fn enable_auto_merge(
        &self,
        slug: &str,
        pr: &PullRequestRef,
        method: MergeMethod,
    ) -> Result<(), OpsError>;
    /// Close a pull request and delete its head branch.
    fn close_pr(&self, slug: &str, pr: &PullRequestRef) -> Result<(), OpsError>;
    fn pull_request_state(
        &self,
        slug: &str,
        pr: &PullRequestRef,
    ) -> Result<PullRequestState, OpsError>;

    fn create_from_template(
        &self,
        slug: &str,
        template: &str,
        visibility: Visibility,
    ) -> Result<(), OpsError>;
    /// Auto-merge on, delete-branch-on-merge on, merge commits and rebase
    /// merges off.
    fn apply_merge_settings(&self, slug: &str) -> Result<(), OpsError>;
    fn protect_branch(
        &self,
        slug: &str,
        branch: &str,
        protection: &ProtectionConfig,
    ) -> Result<(), OpsError>;
    fn dispatch_workflow(&self, slug: &str, workflow: &str, git_ref: &str) -> Result<(), OpsError>;

    /// Names of every repository owned by `org`.
    fn list_org_repos(&self, org: &Owner) -> Result<Vec<String>, OpsError>;
    fn clone_repo(&self, slug: &str, dest: &Path) -> Result<(), OpsError>;
}

/// Request body for `PUT /repos/{owner}/{repo}/branches/{branch}/protection`.
pub fn protection_payload(protection: &ProtectionConfig) -> serde_json::Value {
    json!({
        "required_status_checks": {
            "strict": true,
            "contexts": protection.required_checks,
        },
        "enforce_admins": true,
        "required_pull_request_reviews": {
            "require_code_owner_reviews": false,
            "required_approving_review_count": 0,
        },
        "restrictions": null,
        "allow_force_pushes": false,
        "block_creations": protection.block_creations,
        "allow_deletions": false,
        "block_deletions": true,
    })
}

/// Parse the URL printed by `gh pr create` into a [`PullRequestRef`].
pub fn parse_pr_url(output: &str) -> Option<PullRequestRef> {
    let url = output
        .lines()
        .map(str::trim)
        .rev()
        .find(|l| l.starts_with("https://") && l.contains("/pull/"))?;
    let number = url.rsplit('/').next()?.parse().ok()?;
    Some(PullRequestRef {
        number,
        url: url.to_string(),
    })
}

#[derive(Deserialize)]
struct ListedPr {
    number: u64,
    url: String,
}

#[derive(Deserialize)]
struct ViewedPr {
    state: String,
    #[serde(rename = "mergedAt", default)]
    merged_at: Option<String>,
}

impl ViewedPr {
    fn lifecycle(&self) -> PullRequestState {
        let merged = self.merged_at.as_deref().is_some_and(|at| !at.is_empty());
        match self.state.as_str() {
            _ if merged => PullRequestState::Merged,
            "MERGED" => PullRequestState::Merged,
            "CLOSED" => PullRequestState::Closed,
            _ => PullRequestState::Open,
        }
    }
}

/// [`HostingApi`] implemented by shelling out to `gh`.
#[derive(Debug, Clone, Default)]
pub struct GhCli<R> {
    runner: R,
}

impl<R: CommandRunner> GhCli<R> {
    pub fn new(runner: R) -> Self {
        GhCli { runner }
    }

    fn gh(&self, args: &[&str]) -> Result<String, OpsError> {
        Ok(run_checked(&self.runner, "gh", args, None, None)?.stdout)
    }
}

impl<R: CommandRunner> HostingApi for GhCli<R> {
    fn find_open_pr(&self, slug: &str, head: &str) -> Result<Option<PullRequestRef>, OpsError> {
        let out = self.gh(&[
            "pr", "list", "--repo", slug, "--head", head, "--state", "open", "--json",
            "number,url",
        ])?;
        let listed: Vec<ListedPr> = serde_json::from_str(out.trim())?;
        Ok(listed.into_iter().next().map(|pr| PullRequestRef {
            number: pr.number,
            url: pr.url,
        }))
    }

    fn create_pr(&self, slug: &str, pr: &NewPullRequest<'_>) -> Result<PullRequestRef, OpsError> {
        let out = self.gh(&[
            "pr", "create", "--repo", slug, "--base", pr.base, "--head", pr.head, "--title",
            pr.title, "--body", pr.body,
        ])?;
        parse_pr_url(&out).ok_or_else(|| OpsError::UnexpectedOutput {
            program: "gh pr create".into(),
            detail: format!("no pull request URL in {:?}", out.trim()),
        })
    }

    fn enable_auto_merge(
        &self,
        slug: &str,
        pr: &PullRequestRef,
        method: MergeMethod,
    ) -> Result<(), OpsError> {
        let number = pr.number.to_string();
        self.gh(&[
            "pr",
            "merge",
            number.as_str(),
            "--repo",
            slug,
            "--auto",
            "--delete-branch",
            method.gh_flag(),
        ])
        .map(drop)
    }

    fn close_pr(&self, slug: &str, pr: &PullRequestRef) -> Result<(), OpsError> {
        let number = pr.number.to_string();
        self.gh(&["pr", "close", number.as_str(), "--repo", slug, "--delete-branch"])
            .map(drop)
    }

    fn pull_request_state(
        &self,
        slug: &str,
        pr: &PullRequestRef,
    ) -> Result<PullRequestState, OpsError> {
        let number = pr.number.to_string();
        let out = self.gh(&[
            "pr", "view", &number, "--repo", slug, "--json", "state,mergedAt",
        ])?;
        let viewed: ViewedPr = serde_json::from_str(out.trim())?;
        Ok(viewed.lifecycle())
    }

    fn create_from_template(
        &self,
        slug: &str,
        template: &str,
        visibility: Visibility,
    ) -> Result<(), OpsError> {
        self.gh(&[
            "repo",
            "create",
            slug,
            "--template",
            template,
            visibility.gh_flag(),
        ])
        .map(drop)
    }

    fn apply_merge_settings(&self, slug: &str) -> Result<(), OpsError> {
        self.gh(&[
            "repo",
            "edit",
            slug,
            "--enable-auto-merge",
            "--delete-branch-on-merge",
            "--enable-merge-commit=false",
            "--enable-rebase-merge=false",
        ])
        .map(drop)
    }

    fn protect_branch(
        &self,
        slug: &str,
        branch: &str,
        protection: &ProtectionConfig,
    ) -> Result<(), OpsError> {
        let endpoint = format!("/repos/{slug}/branches/{branch}/protection");
        let payload = serde_json::to_string(&protection_payload(protection))?;
        run_checked(
            &self.runner,
            "gh",
            &["api", "-X", "PUT", endpoint.as_str(), "--input", "-"],
            None,
            Some(&payload),
        )?;
        Ok(())
    }

    fn dispatch_workflow(&self, slug: &str, workflow: &str, git_ref: &str) -> Result<(), OpsError> {
        self.gh(&["workflow", "run", workflow, "--repo", slug, "--ref", git_ref])
            .map(drop)
    }

    fn list_org_repos(&self, org: &Owner) -> Result<Vec<String>, OpsError> {
        let endpoint = format!("/orgs/{org}/repos");
        let out = self.gh(&[
            "api",
            "-H",
            "Accept: application/vnd.github+json",
            "-H",
            "X-GitHub-Api-Version: 2022-11-28",
            endpoint.as_str(),
            "--jq",
            ".[].name",
            "-X",
            "GET",
            "--paginate",
        ])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn clone_repo(&self, slug: &str, dest: &Path) -> Result<(), OpsError> {
        let dest = dest.to_string_lossy();
        self.gh(&["repo", "clone", slug, dest.as_ref()]).map(drop)
    }
}
