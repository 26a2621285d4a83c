//! Version control collaborator: the [`VersionControl`] trait and its `git`
//! command-line implementation.

use std::path::Path;

use crate::error::{CommandError, OpsError};
use crate::runner::{run_checked, CommandRunner};

/// Operations on a local checkout. Every method takes the checkout path.
pub trait VersionControl {
    /// Uncommitted changes (tracked or untracked) present?
    fn is_dirty(&self, repo: &Path) -> Result<bool, OpsError>;
    fn local_branch_exists(&self, repo: &Path, branch: &str) -> Result<bool, OpsError>;
    /// Queries `origin` directly, not the possibly stale remote-tracking refs.
    fn remote_branch_exists(&self, repo: &Path, branch: &str) -> Result<bool, OpsError>;

    fn create_branch(&self, repo: &Path, branch: &str) -> Result<(), OpsError>;
    /// Fetch `origin/<branch>` and check it out as a tracking branch.
    fn checkout_tracking(&self, repo: &Path, branch: &str) -> Result<(), OpsError>;
    fn checkout(&self, repo: &Path, branch: &str) -> Result<(), OpsError>;
    fn stage_all(&self, repo: &Path) -> Result<(), OpsError>;
    fn commit(&self, repo: &Path, message: &str) -> Result<(), OpsError>;
    /// Push `branch` to `origin` and set it as upstream.
    fn push_upstream(&self, repo: &Path, branch: &str) -> Result<(), OpsError>;

    fn fetch_prune(&self, repo: &Path) -> Result<(), OpsError>;
    fn rebase_onto_remote(&self, repo: &Path, base: &str) -> Result<(), OpsError>;
    fn delete_local_branch(&self, repo: &Path, branch: &str) -> Result<(), OpsError>;
    fn delete_remote_branch(&self, repo: &Path, branch: &str) -> Result<(), OpsError>;
    /// `fetch --all` then hard-reset to `origin/<base>`.
    fn reset_to_remote(&self, repo: &Path, base: &str) -> Result<(), OpsError>;
}

/// [`VersionControl`] implemented by shelling out to `git`.
#[derive(Debug, Clone, Default)]
pub struct GitCli<R> {
    runner: R,
}

impl<R: CommandRunner> GitCli<R> {
    pub fn new(runner: R) -> Self {
        GitCli { runner }
    }

    fn git(&self, repo: &Path, args: &[&str]) -> Result<String, OpsError> {
        let out = run_checked(&self.runner, "git", args, Some(repo), None)?;
        Ok(out.stdout)
    }
}

impl<R: CommandRunner> VersionControl for GitCli<R> {
    fn is_dirty(&self, repo: &Path) -> Result<bool, OpsError> {
        let status = self.git(repo, &["status", "--porcelain"])?;
        Ok(!status.trim().is_empty())
    }

    fn local_branch_exists(&self, repo: &Path, branch: &str) -> Result<bool, OpsError> {
        let refname = format!("refs/heads/{branch}");
        let args = ["show-ref", "--verify", "--quiet", refname.as_str()];
        let out = self.runner.run("git", &args, Some(repo), None)?;
        match out.status {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            status => Err(CommandError::Failed {
                program: "git".into(),
                args: args.join(" "),
                status,
                stderr: out.stderr.trim().to_string(),
            }
            .into()),
        }
    }

    fn remote_branch_exists(&self, repo: &Path, branch: &str) -> Result<bool, OpsError> {
        let listing = self.git(repo, &["ls-remote", "--heads", "origin", branch])?;
        let wanted = format!("refs/heads/{branch}");
        Ok(listing
            .lines()
            .filter_map(|line| line.split_whitespace().nth(1))
            .any(|r| r == wanted))
    }

    fn create_branch(&self, repo: &Path, branch: &str) -> Result<(), OpsError> {
        self.git(repo, &["checkout", "-b", branch]).map(drop)
    }

    fn checkout_tracking(&self, repo: &Path, branch: &str) -> Result<(), OpsError> {
        self.git(repo, &["fetch", "origin", branch])?;
        let upstream = format!("origin/{branch}");
        self.git(repo, &["checkout", "--track", upstream.as_str()])
            .map(drop)
    }

    fn checkout(&self, repo: &Path, branch: &str) -> Result<(), OpsError> {
        self.git(repo, &["checkout", branch]).map(drop)
    }

    fn stage_all(&self, repo: &Path) -> Result<(), OpsError> {
        self.git(repo, &["add", "--all"]).map(drop)
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<(), OpsError> {
        self.git(repo, &["commit", "-m", message]).map(drop)
    }

    fn push_upstream(&self, repo: &Path, branch: &str) -> Result<(), OpsError> {
        self.git(repo, &["push", "--set-upstream", "origin", branch])
            .map(drop)
    }

    fn fetch_prune(&self, repo: &Path) -> Result<(), OpsError> {
        self.git(repo, &["fetch", "--all", "--prune"]).map(drop)
    }

    fn rebase_onto_remote(&self, repo: &Path, base: &str) -> Result<(), OpsError> {
        let upstream = format!("origin/{base}");
        self.git(repo, &["rebase", upstream.as_str()]).map(drop)
    }

    fn delete_local_branch(&self, repo: &Path, branch: &str) -> Result<(), OpsError> {
        self.git(repo, &["branch", "-D", branch]).map(drop)
    }

    fn delete_remote_branch(&self, repo: &Path, branch: &str) -> Result<(), OpsError> {
        self.git(repo, &["push", "origin", "--delete", branch])
            .map(drop)
    }

    fn reset_to_remote(&self, repo: &Path, base: &str) -> Result<(), OpsError> {
        self.git(repo, &["fetch", "--all"])?;
        let upstream = format!("origin/{base}");
        self.git(repo, &["reset", "--hard", upstream.as_str()])
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::runner::recording::RecordingRunner;

    fn git() -> GitCli<RecordingRunner> {
        GitCli::new(RecordingRunner::default())
    }

    #[test]
    fn dirty_when_porcelain_output_present() {
        let g = git();
        g.runner.reply(0, " M signalset.json\n");
        assert!(g.is_dirty(Path::new("/ws/Kia-Niro")).unwrap());
        g.runner.reply(0, "");
        assert!(!g.is_dirty(Path::new("/ws/Kia-Niro")).unwrap());
    }

    #[test]
    fn every_call_carries_the_checkout_as_cwd() {
        let g = git();
        let repo = Path::new("/ws/Kia-Niro");
        g.create_branch(repo, "wip").unwrap();
        g.stage_all(repo).unwrap();
        g.commit(repo, "Update sensor X").unwrap();
        g.push_upstream(repo, "wip").unwrap();
        let calls = g.runner.calls.borrow();
        assert!(calls
            .iter()
            .all(|c| c.cwd.as_deref() == Some(PathBuf::from("/ws/Kia-Niro").as_path())));
        assert_eq!(
            g.runner.lines(),
            vec![
                "git checkout -b wip",
                "git add --all",
                "git commit -m Update sensor X",
                "git push --set-upstream origin wip",
            ]
        );
    }

    #[test]
    fn local_branch_check_distinguishes_absent_from_failure() {
        let g = git();
        g.runner.reply(0, "");
        assert!(g.local_branch_exists(Path::new("/r"), "wip").unwrap());
        g.runner.reply(1, "");
        assert!(!g.local_branch_exists(Path::new("/r"), "wip").unwrap());
        g.runner.reply(128, "");
        assert!(g.local_branch_exists(Path::new("/r"), "wip").is_err());
    }

    #[test]
    fn remote_branch_requires_exact_ref() {
        let g = git();
        g.runner
            .reply(0, "abc123\trefs/heads/wip-old\n");
        assert!(!g.remote_branch_exists(Path::new("/r"), "wip").unwrap());
        g.runner.reply(0, "abc123\trefs/heads/wip\n");
        assert!(g.remote_branch_exists(Path::new("/r"), "wip").unwrap());
    }

    #[test]
    fn failing_push_is_external_failure() {
        let g = git();
        g.runner.reply(1, "");
        let err = g.push_upstream(Path::new("/r"), "wip").unwrap_err();
        assert_eq!(err.kind(), fleet_core::ErrorKind::ExternalCallFailure);
    }
}
