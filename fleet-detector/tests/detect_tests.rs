//! Parameterised checkout detection tests for `fleet-detector`.
//!
//! Each `#[case]` gets an isolated `TempDir`: no shared state.

use std::fs;
use std::path::PathBuf;

use fleet_core::types::Owner;
use fleet_detector::{detect_repo, parse_remote_url, Confidence, DetectError};
use git2::{Repository, Signature};
use rstest::rstest;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_checkout(root: &TempDir, name: &str, remotes: &[(&str, &str)]) -> PathBuf {
    let path = root.path().join(name);
    let repo = Repository::init(&path).expect("git init");
    for (remote, url) in remotes {
        repo.remote(remote, url).expect("add remote");
    }
    path
}

fn commit_empty_tree(repo: &Repository) {
    let sig = Signature::now("fleet", "fleet@example.invalid").expect("signature");
    let tree_id = repo.index().expect("index").write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("tree");
    repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
        .expect("commit");
}

// ---------------------------------------------------------------------------
// URL forms
// ---------------------------------------------------------------------------

#[rstest]
#[case("https://github.com/OBDb/Toyota-Camry.git", "OBDb", "Toyota-Camry")]
#[case("https://github.com/OBDb/Toyota-Camry", "OBDb", "Toyota-Camry")]
#[case("https://github.com/OBDb/Toyota-Camry/", "OBDb", "Toyota-Camry")]
#[case("git@github.com:OBDb/Ford-F-150.git", "OBDb", "Ford-F-150")]
#[case("ssh://git@github.com/ElectricSidecar/Kia-Niro.git", "ElectricSidecar", "Kia-Niro")]
#[case("ssh://git@github.com:22/OBDb/Kia-Niro.git", "OBDb", "Kia-Niro")]
fn remote_url_forms(#[case] url: &str, #[case] owner: &str, #[case] name: &str) {
    assert_eq!(
        parse_remote_url(url),
        Some((owner.to_string(), name.to_string()))
    );
}

#[rstest]
#[case("")]
#[case("origin")]
#[case("https://github.com/OBDb")]
fn unusable_urls(#[case] url: &str) {
    assert_eq!(parse_remote_url(url), None);
}

// ---------------------------------------------------------------------------
// Checkout detection
// ---------------------------------------------------------------------------

#[test]
fn origin_remote_wins() {
    let root = TempDir::new().expect("tempdir");
    let repo = make_checkout(
        &root,
        "Toyota-Camry",
        &[
            ("upstream", "https://github.com/Other/Fork.git"),
            ("origin", "git@github.com:OBDb/Toyota-Camry.git"),
        ],
    );

    let detected = detect_repo(&repo).expect("detect");
    assert_eq!(detected.owner, Some(Owner::from("OBDb")));
    assert_eq!(detected.name.0, "Toyota-Camry");
    assert_eq!(
        detected.remote_url.as_deref(),
        Some("git@github.com:OBDb/Toyota-Camry.git")
    );
    assert_eq!(detected.confidence, Confidence::High);
}

#[test]
fn upstream_is_used_without_origin() {
    let root = TempDir::new().expect("tempdir");
    let repo = make_checkout(
        &root,
        "camry",
        &[("upstream", "https://github.com/OBDb/Toyota-Camry.git")],
    );

    let detected = detect_repo(&repo).expect("detect");
    assert_eq!(detected.owner, Some(Owner::from("OBDb")));
    assert_eq!(detected.name.0, "Toyota-Camry");
}

#[test]
fn remote_name_may_differ_from_directory() {
    let root = TempDir::new().expect("tempdir");
    let repo = make_checkout(
        &root,
        "ford",
        &[("origin", "https://github.com/OBDb/Ford-F-150.git")],
    );

    let handle = detect_repo(&repo)
        .expect("detect")
        .into_handle(&Owner::from("Fallback"));
    assert_eq!(handle.slug(), "OBDb/Ford-F-150");
    assert_eq!(handle.path, repo);
}

#[test]
fn no_remote_falls_back_to_directory_and_default_owner() {
    let root = TempDir::new().expect("tempdir");
    let repo = make_checkout(&root, "Kia-Niro", &[]);

    let detected = detect_repo(&repo).expect("detect");
    assert_eq!(detected.confidence, Confidence::Medium);
    assert!(detected.remote_url.is_none());
    let handle = detected.into_handle(&Owner::from("OBDb"));
    assert_eq!(handle.slug(), "OBDb/Kia-Niro");
}

#[test]
fn linked_worktree_reports_the_main_checkout_remote() {
    let root = TempDir::new().expect("tempdir");
    let main = make_checkout(
        &root,
        "Kia-Niro",
        &[("origin", "https://github.com/OtherOrg/Kia-Niro.git")],
    );
    let repo = Repository::open(&main).expect("open");
    commit_empty_tree(&repo);
    let worktree = root.path().join("Kia-Niro-wt");
    repo.worktree("Kia-Niro-wt", &worktree, None)
        .expect("add worktree");
    assert!(worktree.join(".git").is_file(), "worktree uses a gitdir file");

    let detected = detect_repo(&worktree).expect("detect");
    assert_eq!(detected.owner, Some(Owner::from("OtherOrg")));
    assert_eq!(detected.name.0, "Kia-Niro");
    assert_eq!(detected.confidence, Confidence::High);
    let handle = detected.into_handle(&Owner::from("OBDb"));
    assert_eq!(handle.slug(), "OtherOrg/Kia-Niro");
    assert_eq!(handle.path, worktree);
}

#[test]
fn plain_directory_is_not_a_checkout() {
    let root = TempDir::new().expect("tempdir");
    let err = detect_repo(root.path()).unwrap_err();
    assert!(matches!(err, DetectError::NotACheckout { .. }), "got: {err}");
}

#[test]
fn broken_git_entry_is_a_git_error() {
    let root = TempDir::new().expect("tempdir");
    let path = root.path().join("Audi-A4");
    fs::create_dir_all(path.join(".git")).expect("mkdir");

    let err = detect_repo(&path).unwrap_err();
    assert!(matches!(err, DetectError::Git { .. }), "got: {err}");
}
