//! Scenario 2 (spec §8): pull dry-run reports how far behind without pulling.

mod common;

use std::process::Command;

use gzr::gitops::ProcessGitOps;
use gzr::model::{CommonOptions, Options, PullOptions, RepoFilter, StatusCode};
use gzr::runner::CancelToken;

#[test]
fn dry_run_pull_reports_commits_behind_and_does_not_mutate() {
    let origin = common::BareRepo::init();

    let seed = common::TestRepo::init();
    seed.write("README.md", "hello\n");
    seed.commit("initial");
    seed.add_remote("origin", origin.path());
    seed.push("origin", "main");

    let workspace = tempfile::tempdir().unwrap();
    let clone_dir = workspace.path().join("x");
    let out = Command::new("git")
        .args(["clone", &origin.path().to_string_lossy(), &clone_dir.to_string_lossy()])
        .output()
        .unwrap();
    assert!(out.status.success(), "clone failed: {}", String::from_utf8_lossy(&out.stderr));

    // Three additional upstream commits the clone hasn't seen yet.
    for n in 1..=3 {
        seed.write("README.md", &format!("hello {n}\n"));
        seed.commit(&format!("update {n}"));
    }
    seed.push("origin", "main");

    let fetch = Command::new("git").current_dir(&clone_dir).args(["fetch", "origin"]).output().unwrap();
    assert!(fetch.status.success());

    let gitops = ProcessGitOps::new();
    let cancel = CancelToken::new();
    let opts = Options::Pull(PullOptions {
        common: CommonOptions {
            parallel: 1,
            dry_run: true,
            verbose: false,
            filter: RepoFilter::default(),
            progress: None,
        },
        ..Default::default()
    });

    let bulk = gzr::run_bulk(&gitops, workspace.path(), &opts, &cancel).unwrap();
    assert_eq!(bulk.repositories.len(), 1);
    let result = &bulk.repositories[0];
    assert_eq!(result.status, StatusCode::WouldPull);
    assert_eq!(result.commits_behind, Some(3));

    // Nothing should have actually merged: HEAD in the clone is unchanged.
    let head = Command::new("git").current_dir(&clone_dir).args(["rev-parse", "HEAD"]).output().unwrap();
    let head_sha = String::from_utf8_lossy(&head.stdout).trim().to_string();
    let origin_head = Command::new("git")
        .current_dir(&clone_dir)
        .args(["rev-parse", "origin/main"])
        .output()
        .unwrap();
    let origin_sha = String::from_utf8_lossy(&origin_head.stdout).trim().to_string();
    assert_ne!(head_sha, origin_sha, "dry-run must not fast-forward the local branch");
}
