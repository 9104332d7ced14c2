//! Scenario 6 (spec §8): commit's two-phase contract — a dry-run classify
//! pass suggests a message without committing, then a `--yes` pass commits
//! with the resolved message and produces exactly one new commit per repo.

mod common;

use std::process::Command;

use gzr::gitops::ProcessGitOps;
use gzr::model::{CommitOptions, CommonOptions, Options, RepoFilter, StatusCode};
use gzr::runner::CancelToken;

fn commit_count(dir: &std::path::Path) -> u32 {
    let out = Command::new("git").current_dir(dir).args(["rev-list", "--count", "HEAD"]).output().unwrap();
    String::from_utf8_lossy(&out.stdout).trim().parse().unwrap()
}

#[test]
fn dry_run_suggests_then_yes_commits_exactly_once_per_repo() {
    let workspace = tempfile::tempdir().unwrap();

    let r1 = common::TestRepo::init();
    r1.write("README.md", "hello\n");
    r1.commit("initial");
    let r1_dest = workspace.path().join("r1");
    std::fs::rename(r1.path(), &r1_dest).unwrap();
    std::fs::write(r1_dest.join("dirty.txt"), "uncommitted change\n").unwrap();

    let r2 = common::TestRepo::init();
    r2.write("README.md", "hello\n");
    r2.commit("initial");
    let r2_dest = workspace.path().join("r2");
    std::fs::rename(r2.path(), &r2_dest).unwrap();
    std::fs::write(r2_dest.join("dirty.txt"), "uncommitted change\n").unwrap();

    let gitops = ProcessGitOps::new();
    let cancel = CancelToken::new();

    let common_opts = CommonOptions {
        parallel: 1,
        dry_run: true,
        verbose: false,
        filter: RepoFilter::default(),
        progress: None,
    };

    // Phase 1: classification only, no commit should occur.
    let phase1 = Options::Commit(CommitOptions {
        common: common_opts.clone(),
        common_message: None,
        per_repo_messages: Default::default(),
        yes: false,
        edit: false,
    });
    let bulk1 = gzr::run_bulk(&gitops, workspace.path(), &phase1, &cancel).unwrap();
    assert_eq!(bulk1.repositories.len(), 2);
    for result in &bulk1.repositories {
        assert_eq!(result.status, StatusCode::WouldCommit);
        assert!(result.message.as_deref().map(|m| !m.is_empty()).unwrap_or(false));
    }
    assert_eq!(commit_count(&r1_dest), 1);
    assert_eq!(commit_count(&r2_dest), 1);

    // Phase 2: non-interactive commit with a shared message.
    let phase2 = Options::Commit(CommitOptions {
        common: CommonOptions { dry_run: false, ..common_opts },
        common_message: Some("chore: sync".into()),
        per_repo_messages: Default::default(),
        yes: true,
        edit: false,
    });
    let bulk2 = gzr::run_bulk(&gitops, workspace.path(), &phase2, &cancel).unwrap();
    assert_eq!(bulk2.repositories.len(), 2);
    for result in &bulk2.repositories {
        assert_eq!(result.status, StatusCode::Success);
        assert!(result.message.as_deref().map(|m| !m.is_empty()).unwrap_or(false));
    }
    assert_eq!(commit_count(&r1_dest), 2);
    assert_eq!(commit_count(&r2_dest), 2);
}
