//! In-memory stand-in for a git checkout plus its hosting platform.
//!
//! Implements both `VersionControl` and `HostingApi`, records every mutating
//! call, and lets a test force specific operations to fail.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use fleet_core::config::ProtectionConfig;
use fleet_core::types::{
    MergeMethod, Owner, PullRequestRef, PullRequestState, RepoHandle, Visibility,
};
use fleet_ops::{CommandError, HostingApi, NewPullRequest, OpsError, VersionControl};

#[derive(Debug, Clone, Default)]
pub struct FakeRepo {
    pub slug: String,
    pub dirty: bool,
    pub current: String,
    pub local_branches: BTreeSet<String>,
    pub remote_branches: BTreeSet<String>,
    /// Commit messages per branch.
    pub commits: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakePr {
    pub slug: String,
    pub number: u64,
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
    pub open: bool,
    pub auto_merge: Option<MergeMethod>,
}

impl FakePr {
    pub fn url(&self) -> String {
        format!("https://github.com/{}/pull/{}", self.slug, self.number)
    }
}

#[derive(Default)]
pub struct FakeForge {
    pub repos: RefCell<BTreeMap<PathBuf, FakeRepo>>,
    pub prs: RefCell<Vec<FakePr>>,
    pub org_listing: RefCell<Vec<String>>,
    /// Files written into a checkout by `clone_repo`.
    pub clone_files: RefCell<Vec<(String, String)>>,
    pub created: RefCell<Vec<String>>,
    pub dispatched: RefCell<Vec<String>>,
    pub mutations: RefCell<Vec<String>>,
    /// States reported by successive `pull_request_state` calls, per slug.
    /// An exhausted queue reports `Open`.
    pub pr_states: RefCell<BTreeMap<String, VecDeque<PullRequestState>>>,
    failing: RefCell<HashSet<(String, String)>>,
}

pub fn failure(op: &str) -> OpsError {
    OpsError::Command(CommandError::Failed {
        program: "fake".into(),
        args: op.into(),
        status: Some(1),
        stderr: format!("{op} rejected"),
    })
}

impl FakeForge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a checkout on `main` and return its handle.
    pub fn add_repo(&self, name: &str) -> RepoHandle {
        let path = PathBuf::from("/ws").join(name);
        let slug = format!("OBDb/{name}");
        let mut repo = FakeRepo {
            slug,
            current: "main".into(),
            ..FakeRepo::default()
        };
        repo.local_branches.insert("main".into());
        repo.remote_branches.insert("main".into());
        self.repos.borrow_mut().insert(path.clone(), repo);
        RepoHandle::new("OBDb", name, path)
    }

    pub fn edit<F: FnOnce(&mut FakeRepo)>(&self, handle: &RepoHandle, f: F) {
        let mut repos = self.repos.borrow_mut();
        let repo = repos.get_mut(handle.path()).expect("registered repo");
        f(repo);
    }

    pub fn repo(&self, handle: &RepoHandle) -> FakeRepo {
        self.repos.borrow()[handle.path()].clone()
    }

    /// Make `op` fail for the repository identified by `key` (path or slug).
    pub fn fail(&self, op: &str, key: &str) {
        self.failing
            .borrow_mut()
            .insert((op.to_string(), key.to_string()));
    }

    pub fn open_prs(&self, slug: &str) -> Vec<FakePr> {
        self.prs
            .borrow()
            .iter()
            .filter(|p| p.slug == slug && p.open)
            .cloned()
            .collect()
    }

    pub fn open_pr(&self, slug: &str, head: &str) -> FakePr {
        let number = self.prs.borrow().len() as u64 + 1;
        let pr = FakePr {
            slug: slug.to_string(),
            number,
            title: "earlier run".into(),
            body: String::new(),
            head: head.to_string(),
            base: "main".into(),
            open: true,
            auto_merge: None,
        };
        self.prs.borrow_mut().push(pr.clone());
        pr
    }

    pub fn script_states(&self, slug: &str, states: &[PullRequestState]) {
        self.pr_states
            .borrow_mut()
            .insert(slug.to_string(), states.iter().copied().collect());
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.borrow().len()
    }

    fn check(&self, op: &str, key: &str) -> Result<(), OpsError> {
        if self
            .failing
            .borrow()
            .contains(&(op.to_string(), key.to_string()))
        {
            Err(failure(op))
        } else {
            Ok(())
        }
    }

    fn mutate<T>(
        &self,
        op: &str,
        repo: &Path,
        f: impl FnOnce(&mut FakeRepo) -> T,
    ) -> Result<T, OpsError> {
        let key = repo.display().to_string();
        self.check(op, &key)?;
        self.mutations.borrow_mut().push(format!("{op} {key}"));
        let mut repos = self.repos.borrow_mut();
        let state = repos
            .get_mut(repo)
            .ok_or_else(|| OpsError::Missing(format!("{key} not cloned")))?;
        Ok(f(state))
    }

    fn read<T>(&self, op: &str, repo: &Path, f: impl FnOnce(&FakeRepo) -> T) -> Result<T, OpsError> {
        let key = repo.display().to_string();
        self.check(op, &key)?;
        let repos = self.repos.borrow();
        let state = repos
            .get(repo)
            .ok_or_else(|| OpsError::Missing(format!("{key} not cloned")))?;
        Ok(f(state))
    }

    fn host_mutation(&self, op: &str, slug: &str) -> Result<(), OpsError> {
        self.check(op, slug)?;
        self.mutations.borrow_mut().push(format!("{op} {slug}"));
        Ok(())
    }
}

impl VersionControl for FakeForge {
    fn is_dirty(&self, repo: &Path) -> Result<bool, OpsError> {
        self.read("status", repo, |r| r.dirty)
    }

    fn local_branch_exists(&self, repo: &Path, branch: &str) -> Result<bool, OpsError> {
        self.read("show-ref", repo, |r| r.local_branches.contains(branch))
    }

    fn remote_branch_exists(&self, repo: &Path, branch: &str) -> Result<bool, OpsError> {
        self.read("ls-remote", repo, |r| r.remote_branches.contains(branch))
    }

    fn create_branch(&self, repo: &Path, branch: &str) -> Result<(), OpsError> {
        self.mutate("checkout -b", repo, |r| {
            r.local_branches.insert(branch.to_string());
            r.current = branch.to_string();
        })
    }

    fn checkout_tracking(&self, repo: &Path, branch: &str) -> Result<(), OpsError> {
        self.mutate("checkout --track", repo, |r| {
            r.local_branches.insert(branch.to_string());
            r.current = branch.to_string();
        })
    }

    fn checkout(&self, repo: &Path, branch: &str) -> Result<(), OpsError> {
        self.mutate("checkout", repo, |r| r.current = branch.to_string())
    }

    fn stage_all(&self, repo: &Path) -> Result<(), OpsError> {
        self.mutate("add", repo, |_| ())
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<(), OpsError> {
        self.mutate("commit", repo, |r| {
            let current = r.current.clone();
            r.commits
                .entry(current)
                .or_default()
                .push(message.to_string());
            r.dirty = false;
        })
    }

    fn push_upstream(&self, repo: &Path, branch: &str) -> Result<(), OpsError> {
        self.mutate("push", repo, |r| {
            r.remote_branches.insert(branch.to_string());
        })
    }

    fn fetch_prune(&self, repo: &Path) -> Result<(), OpsError> {
        self.mutate("fetch --prune", repo, |_| ())
    }

    fn rebase_onto_remote(&self, repo: &Path, _base: &str) -> Result<(), OpsError> {
        self.mutate("rebase", repo, |_| ())
    }

    fn delete_local_branch(&self, repo: &Path, branch: &str) -> Result<(), OpsError> {
        self.mutate("branch -D", repo, |r| {
            r.local_branches.remove(branch);
        })
    }

    fn delete_remote_branch(&self, repo: &Path, branch: &str) -> Result<(), OpsError> {
        self.mutate("push --delete", repo, |r| {
            r.remote_branches.remove(branch);
        })
    }

    fn reset_to_remote(&self, repo: &Path, _base: &str) -> Result<(), OpsError> {
        let key = repo.display().to_string();
        self.check("reset", &key)?;
        self.mutations.borrow_mut().push(format!("reset {key}"));
        Ok(())
    }
}

impl HostingApi for FakeForge {
    fn find_open_pr(&self, slug: &str, head: &str) -> Result<Option<PullRequestRef>, OpsError> {
        self.check("pr list", slug)?;
        Ok(self
            .prs
            .borrow()
            .iter()
            .find(|p| p.slug == slug && p.head == head && p.open)
            .map(|p| PullRequestRef {
                number: p.number,
                url: p.url(),
            }))
    }

    fn create_pr(&self, slug: &str, pr: &NewPullRequest<'_>) -> Result<PullRequestRef, OpsError> {
        self.host_mutation("pr create", slug)?;
        let number = self.prs.borrow().len() as u64 + 1;
        let created = FakePr {
            slug: slug.to_string(),
            number,
            title: pr.title.to_string(),
            body: pr.body.to_string(),
            head: pr.head.to_string(),
            base: pr.base.to_string(),
            open: true,
            auto_merge: None,
        };
        let url = created.url();
        self.prs.borrow_mut().push(created);
        Ok(PullRequestRef { number, url })
    }

    fn enable_auto_merge(
        &self,
        slug: &str,
        pr: &PullRequestRef,
        method: MergeMethod,
    ) -> Result<(), OpsError> {
        self.host_mutation("pr merge", slug)?;
        if let Some(p) = self
            .prs
            .borrow_mut()
            .iter_mut()
            .find(|p| p.slug == slug && p.number == pr.number)
        {
            p.auto_merge = Some(method);
        }
        Ok(())
    }

    fn close_pr(&self, slug: &str, pr: &PullRequestRef) -> Result<(), OpsError> {
        self.host_mutation("pr close", slug)?;
        let mut prs = self.prs.borrow_mut();
        if let Some(p) = prs
            .iter_mut()
            .find(|p| p.slug == slug && p.number == pr.number)
        {
            p.open = false;
            let head = p.head.clone();
            for repo in self.repos.borrow_mut().values_mut() {
                if repo.slug == slug {
                    repo.remote_branches.remove(&head);
                }
            }
        }
        Ok(())
    }

    fn pull_request_state(
        &self,
        slug: &str,
        pr: &PullRequestRef,
    ) -> Result<PullRequestState, OpsError> {
        self.check("pr view", slug)?;
        let state = self
            .pr_states
            .borrow_mut()
            .get_mut(slug)
            .and_then(VecDeque::pop_front)
            .unwrap_or(PullRequestState::Open);
        if state != PullRequestState::Open {
            // Landing closes the PR; a merge also deletes its head branch.
            let mut prs = self.prs.borrow_mut();
            if let Some(p) = prs
                .iter_mut()
                .find(|p| p.slug == slug && p.number == pr.number)
            {
                p.open = false;
                if state == PullRequestState::Merged {
                    let head = p.head.clone();
                    for repo in self.repos.borrow_mut().values_mut() {
                        if repo.slug == slug {
                            repo.remote_branches.remove(&head);
                        }
                    }
                }
            }
        }
        Ok(state)
    }

    fn create_from_template(
        &self,
        slug: &str,
        _template: &str,
        _visibility: Visibility,
    ) -> Result<(), OpsError> {
        self.host_mutation("repo create", slug)?;
        self.created.borrow_mut().push(slug.to_string());
        Ok(())
    }

    fn apply_merge_settings(&self, slug: &str) -> Result<(), OpsError> {
        self.host_mutation("repo edit", slug)
    }

    fn protect_branch(
        &self,
        slug: &str,
        _branch: &str,
        _protection: &ProtectionConfig,
    ) -> Result<(), OpsError> {
        self.host_mutation("protect", slug)
    }

    fn dispatch_workflow(&self, slug: &str, workflow: &str, _git_ref: &str) -> Result<(), OpsError> {
        self.host_mutation("workflow run", slug)?;
        self.dispatched
            .borrow_mut()
            .push(format!("{slug}:{workflow}"));
        Ok(())
    }

    fn list_org_repos(&self, org: &Owner) -> Result<Vec<String>, OpsError> {
        self.check("repo list", &org.0)?;
        Ok(self.org_listing.borrow().clone())
    }

    fn clone_repo(&self, slug: &str, dest: &Path) -> Result<(), OpsError> {
        self.host_mutation("repo clone", slug)?;
        for (rel, content) in self.clone_files.borrow().iter() {
            let path = dest.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|_| failure("mkdir"))?;
            }
            std::fs::write(&path, content).map_err(|_| failure("write"))?;
        }
        let mut repo = FakeRepo {
            slug: slug.to_string(),
            current: "main".into(),
            ..FakeRepo::default()
        };
        repo.local_branches.insert("main".into());
        repo.remote_branches.insert("main".into());
        self.repos.borrow_mut().insert(dest.to_path_buf(), repo);
        Ok(())
    }
}
