//! Shared test harness for the integration suite: spins up real git
//! repositories under a `tempfile::TempDir` and drives them with the crate's
//! own [`gzr::gitops::ProcessGitOps`], mirroring the teacher's `TestRepo`
//! fixture but against a real `git` binary rather than canned fixtures,
//! since these tests exercise end-to-end scenarios (spec §8) rather than
//! single-call unit behavior.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// A git working tree rooted at a temp directory, with deterministic author/
/// committer identity so commit output is stable across machines.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// `git init` a fresh working tree.
    pub fn init() -> Self {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init", "--initial-branch=main"]);
        let repo = Self { dir };
        repo.configure_identity();
        repo
    }

    fn configure_identity(&self) {
        self.git(&["config", "user.name", "Test"]);
        self.git(&["config", "user.email", "test@example.com"]);
        self.git(&["config", "commit.gpgsign", "false"]);
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn git(&self, args: &[&str]) {
        run_git(self.dir.path(), args);
    }

    pub fn git_in(&self, sub: &str, args: &[&str]) {
        run_git(&self.dir.path().join(sub), args);
    }

    /// Write `contents` to `name` relative to the working tree root.
    pub fn write(&self, name: &str, contents: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    /// Stage everything and commit, optionally back-dating the commit so
    /// "stale" classification has something to measure.
    pub fn commit_with_age(&self, message: &str, age_seconds: i64) {
        self.git(&["add", "-A"]);
        let when = chrono::Utc::now() - chrono::Duration::seconds(age_seconds);
        let stamp = when.to_rfc3339();
        let mut cmd = Command::new("git");
        cmd.current_dir(self.dir.path())
            .args(["commit", "-m", message])
            .env("GIT_AUTHOR_DATE", &stamp)
            .env("GIT_COMMITTER_DATE", &stamp);
        let out = cmd.output().expect("git commit");
        assert!(out.status.success(), "git commit failed: {}", String::from_utf8_lossy(&out.stderr));
    }

    pub fn commit(&self, message: &str) {
        self.commit_with_age(message, 0);
    }

    pub fn head_sha(&self) -> String {
        let out = Command::new("git")
            .current_dir(self.dir.path())
            .args(["rev-parse", "HEAD"])
            .output()
            .unwrap();
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    pub fn current_branch(&self) -> String {
        let out = Command::new("git")
            .current_dir(self.dir.path())
            .args(["rev-parse", "--abbrev-ref", "HEAD"])
            .output()
            .unwrap();
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    pub fn create_branch(&self, name: &str) {
        self.git(&["branch", name]);
    }

    pub fn add_remote(&self, name: &str, url: &Path) {
        self.git(&["remote", "add", name, &url.to_string_lossy()]);
    }

    pub fn push(&self, remote: &str, refspec: &str) {
        self.git(&["push", remote, refspec]);
    }

    pub fn fetch(&self, remote: &str) {
        self.git(&["fetch", remote]);
    }

    pub fn set_upstream(&self, branch: &str, upstream: &str) {
        self.git(&["branch", &format!("--set-upstream-to={upstream}"), branch]);
    }
}

fn run_git(dir: &Path, args: &[&str]) {
    let out = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run git {args:?} in {}: {e}", dir.display()));
    assert!(
        out.status.success(),
        "git {args:?} in {} failed: {}",
        dir.display(),
        String::from_utf8_lossy(&out.stderr)
    );
}

/// A bare repository used as a push/fetch target, standing in for a remote.
pub struct BareRepo {
    dir: TempDir,
}

impl BareRepo {
    pub fn init() -> Self {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init", "--bare", "--initial-branch=main"]);
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Create an empty directory tree of `.git`-less scratch directories, used by
/// the scanner-filter scenario where no real git state is needed.
pub fn make_dir(root: &Path, rel: &str) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(&path).unwrap();
    path
}

pub fn make_bare_repo_marker(root: &Path, rel: &str) {
    let path = root.join(rel).join(".git");
    std::fs::create_dir_all(path).unwrap();
}
