//! Scenario 3 (spec §8): cleanup leaves protected/fresh branches alone and
//! only deletes merged or stale candidates.

mod common;

use std::time::Duration;

use gzr::gitops::ProcessGitOps;
use gzr::model::{CleanupOptions, CommonOptions, Options, RepoFilter, StatusCode};
use gzr::runner::CancelToken;

const DAY: i64 = 86_400;

#[test]
fn only_merged_and_stale_non_protected_branches_are_deleted() {
    let repo = common::TestRepo::init();
    repo.write("README.md", "hello\n");
    repo.commit_with_age("initial", 120 * DAY);

    // `feature/done`: merged into main, should be deleted.
    repo.create_branch("feature/done");
    repo.git(&["checkout", "feature/done"]);
    repo.write("done.txt", "done\n");
    repo.commit_with_age("finish feature", 100 * DAY);
    repo.git(&["checkout", "main"]);
    repo.git(&["merge", "--no-ff", "feature/done", "-m", "merge feature/done"]);

    // `old`: not merged, but its last commit is 90 days old, should be deleted as stale.
    repo.create_branch("old");
    repo.git(&["checkout", "old"]);
    repo.write("old.txt", "old\n");
    repo.commit_with_age("old work", 95 * DAY);
    repo.git(&["checkout", "main"]);

    // `release/1.0`: protected by name pattern regardless of merge/stale status.
    repo.create_branch("release/1.0");
    repo.git(&["checkout", "release/1.0"]);
    repo.write("release.txt", "release\n");
    repo.commit_with_age("cut release", 95 * DAY);
    repo.git(&["checkout", "main"]);

    let gitops = ProcessGitOps::new();
    let cancel = CancelToken::new();
    let workspace = tempfile::tempdir().unwrap();
    let dest = workspace.path().join("x");
    std::fs::rename(repo.path(), &dest).unwrap();

    let opts = Options::Cleanup(CleanupOptions {
        common: CommonOptions {
            parallel: 1,
            dry_run: true,
            verbose: false,
            filter: RepoFilter::default(),
            progress: None,
        },
        include_merged: true,
        include_stale: true,
        include_gone: false,
        stale_threshold: Duration::from_secs(90 * DAY as u64),
        base_branch: Some("main".into()),
        delete_remote: false,
        protect_patterns: Vec::new(),
    });

    let bulk = gzr::run_bulk(&gitops, workspace.path(), &opts, &cancel).unwrap();
    assert_eq!(bulk.repositories.len(), 1);
    let result = &bulk.repositories[0];
    assert_eq!(result.status, StatusCode::WouldCleanup);
    let message = result.message.clone().unwrap_or_default();

    assert!(message.contains("feature/done"), "expected feature/done among candidates: {message}");
    assert!(message.contains("old"), "expected old among candidates: {message}");
    assert!(!message.contains("release/1.0"), "release/1.0 must be protected: {message}");
    assert!(!message.contains("main"), "main must never be a candidate: {message}");
}
