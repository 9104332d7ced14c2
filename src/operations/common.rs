//! Shared preamble every verb's policy opens with (spec §4.3).

use std::time::{Duration, Instant};

use crate::error::ErrorKind;
use crate::gitops::{GitOps, RepoStatus};
use crate::model::{RepoPath, RepositoryResult, StatusCode};

/// A repository's status plus timing, read once per invocation. Mirrors the
/// teacher's status-read-first idiom (`Repository::require_current_branch`):
/// every verb looks at the same snapshot before deciding what to do.
pub struct RepoState {
    pub status: RepoStatus,
    pub read_at: Instant,
}

/// Read-status preamble. Returns `Err` carrying a ready-made `NotARepository`
/// result when `path` is not a working tree, so callers can `return` it
/// directly without duplicating the error-result plumbing.
pub fn read_repo_state(gitops: &dyn GitOps, repo: &RepoPath, root: &std::path::Path) -> Result<RepoState, RepositoryResult> {
    let t0 = Instant::now();
    if !gitops.is_repo(repo.as_path()) {
        return Err(not_a_repository(repo, root, t0.elapsed()));
    }
    match gitops.status(repo.as_path()) {
        Ok(status) => Ok(RepoState { status, read_at: t0 }),
        Err(e) => Err(error_result(repo, root, &e, t0.elapsed())),
    }
}

pub fn not_a_repository(repo: &RepoPath, root: &std::path::Path, duration: Duration) -> RepositoryResult {
    let rel = repo.relative_to(root).to_string_lossy().into_owned();
    RepositoryResult::new(rel, repo.to_string(), StatusCode::Error, duration)
        .with_error(ErrorKind::NotARepository, format!("not a git working tree: {repo}"))
}

pub fn error_result(repo: &RepoPath, root: &std::path::Path, err: &crate::error::CoreError, duration: Duration) -> RepositoryResult {
    let rel = repo.relative_to(root).to_string_lossy().into_owned();
    RepositoryResult::new(rel, repo.to_string(), StatusCode::Error, duration)
        .with_error(ErrorKind::from(err), err.to_string())
}

/// Build a bare result with `status`, stamping path fields and duration;
/// callers fill in the verb-specific fields afterward.
pub fn base_result(repo: &RepoPath, root: &std::path::Path, status: StatusCode, duration: Duration) -> RepositoryResult {
    let rel = repo.relative_to(root).to_string_lossy().into_owned();
    let mut result = RepositoryResult::new(rel, repo.to_string(), status, duration);
    result.uncommitted_files = None;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitops::{
        BranchInfo, BranchListOpts, CloneOpts, CmdOutput, CommitOpts, DeleteBranchOpts, DiffBundle, DiffOpts, FetchOpts,
        PullOpts, PullOutcome, PushOpts, PushOutcome,
    };

    struct FakeGitOps {
        is_repo: bool,
    }

    impl GitOps for FakeGitOps {
        fn is_repo(&self, _path: &std::path::Path) -> bool {
            self.is_repo
        }
        fn status(&self, _path: &std::path::Path) -> Result<RepoStatus, crate::error::CoreError> {
            Ok(RepoStatus::default())
        }
        fn fetch(&self, _path: &std::path::Path, _opts: &FetchOpts) -> Result<(), crate::error::CoreError> {
            unimplemented!()
        }
        fn pull(&self, _path: &std::path::Path, _opts: &PullOpts) -> Result<PullOutcome, crate::error::CoreError> {
            unimplemented!()
        }
        fn push(&self, _path: &std::path::Path, _opts: &PushOpts) -> Result<PushOutcome, crate::error::CoreError> {
            unimplemented!()
        }
        fn clone_repo(&self, _path: &std::path::Path, _opts: &CloneOpts) -> Result<(), crate::error::CoreError> {
            unimplemented!()
        }
        fn list_branches(&self, _path: &std::path::Path, _opts: &BranchListOpts) -> Result<Vec<BranchInfo>, crate::error::CoreError> {
            unimplemented!()
        }
        fn delete_branch(&self, _path: &std::path::Path, _opts: &DeleteBranchOpts) -> Result<(), crate::error::CoreError> {
            unimplemented!()
        }
        fn switch_branch(&self, _path: &std::path::Path, _branch: &str, _create: bool) -> Result<(), crate::error::CoreError> {
            unimplemented!()
        }
        fn is_merged_into(&self, _path: &std::path::Path, _branch: &str, _base: &str) -> Result<bool, crate::error::CoreError> {
            unimplemented!()
        }
        fn stash_save(&self, _path: &std::path::Path, _include_untracked: bool) -> Result<(), crate::error::CoreError> {
            unimplemented!()
        }
        fn stash_list(&self, _path: &std::path::Path) -> Result<Vec<String>, crate::error::CoreError> {
            unimplemented!()
        }
        fn stash_pop(&self, _path: &std::path::Path) -> Result<(), crate::error::CoreError> {
            unimplemented!()
        }
        fn tag_create(&self, _path: &std::path::Path, _name: &str) -> Result<(), crate::error::CoreError> {
            unimplemented!()
        }
        fn tag_list(&self, _path: &std::path::Path) -> Result<Vec<String>, crate::error::CoreError> {
            unimplemented!()
        }
        fn tag_push(&self, _path: &std::path::Path, _name: &str) -> Result<(), crate::error::CoreError> {
            unimplemented!()
        }
        fn diff(&self, _path: &std::path::Path, _opts: &DiffOpts) -> Result<DiffBundle, crate::error::CoreError> {
            unimplemented!()
        }
        fn commit(&self, _path: &std::path::Path, _opts: &CommitOpts) -> Result<String, crate::error::CoreError> {
            unimplemented!()
        }
        fn run_hook(
            &self,
            _path: &std::path::Path,
            _argv: &[String],
            _timeout: Duration,
            _env: &[(String, String)],
        ) -> Result<CmdOutput, crate::error::CoreError> {
            unimplemented!()
        }
    }

    #[test]
    fn missing_repo_yields_not_a_repository_error() {
        let gitops = FakeGitOps { is_repo: false };
        let repo = RepoPath::new("/ws/a");
        let root = std::path::Path::new("/ws");
        let result = read_repo_state(&gitops, &repo, root).unwrap_err();
        assert_eq!(result.status, StatusCode::Error);
        assert_eq!(result.error, Some(ErrorKind::NotARepository));
    }

    #[test]
    fn present_repo_reads_status() {
        let gitops = FakeGitOps { is_repo: true };
        let repo = RepoPath::new("/ws/a");
        let root = std::path::Path::new("/ws");
        assert!(read_repo_state(&gitops, &repo, root).is_ok());
    }
}
