//! Pull policy (spec §4.3 "Pull").

use std::path::Path;

use crate::error::{CoreError, GitOperationError};
use crate::gitops::{GitOps, PullOpts as GitPullOpts, PullStrategyArg};
use crate::model::{PullOptions, PullStrategy, RepoPath, RepositoryResult, StatusCode};

use super::common::{base_result, read_repo_state};

fn to_gitops_strategy(strategy: PullStrategy) -> PullStrategyArg {
    match strategy {
        PullStrategy::Merge => PullStrategyArg::Merge,
        PullStrategy::Rebase => PullStrategyArg::Rebase,
        PullStrategy::FfOnly => PullStrategyArg::FfOnly,
    }
}

pub fn run(gitops: &dyn GitOps, repo: &RepoPath, root: &Path, opts: &PullOptions) -> RepositoryResult {
    run_with_fetch_mode(gitops, repo, root, opts, false)
}

/// `no_fetch` skips the network and integrates against the remote-tracking
/// ref already on disk — only the Update verb sets this (spec §4.3 "Update").
pub(crate) fn run_with_fetch_mode(
    gitops: &dyn GitOps,
    repo: &RepoPath,
    root: &Path,
    opts: &PullOptions,
    no_fetch: bool,
) -> RepositoryResult {
    let state = match read_repo_state(gitops, repo, root) {
        Ok(state) => state,
        Err(result) => return result,
    };
    let status = &state.status;

    if status.rebase_in_progress {
        return skip(repo, root, status, StatusCode::RebaseInProgress);
    }
    if status.merge_in_progress {
        return skip(repo, root, status, StatusCode::MergeInProgress);
    }

    let dirty = status.modified > 0 || status.conflicts > 0 || status.untracked > 0;
    let mut stashed = false;
    if dirty {
        if opts.stash && !opts.common.dry_run {
            if gitops.stash_save(repo.as_path(), true).is_err() {
                return skip(repo, root, status, StatusCode::Dirty);
            }
            stashed = true;
        } else if !opts.stash {
            return skip(repo, root, status, StatusCode::Dirty);
        }
    }

    if opts.common.dry_run {
        let mut result = with_common_fields(base_result(repo, root, StatusCode::WouldPull, std::time::Duration::ZERO), status);
        result.commits_ahead = Some(status.ahead);
        result.commits_behind = Some(status.behind);
        return result;
    }

    let pull_result = gitops.pull(
        repo.as_path(),
        &GitPullOpts {
            strategy: to_gitops_strategy(opts.strategy),
            prune: opts.prune,
            tags: opts.tags,
            no_fetch,
        },
    );

    let mut result = match pull_result {
        Ok(outcome) => {
            let code = if outcome.commits_applied > 0 {
                StatusCode::Pulled
            } else {
                StatusCode::UpToDate
            };
            let mut result = base_result(repo, root, code, std::time::Duration::ZERO);
            result.commits_behind = Some(outcome.commits_applied);
            result
        }
        Err(CoreError::GitOperation(GitOperationError::Conflict)) => {
            base_result(repo, root, StatusCode::Conflict, std::time::Duration::ZERO)
        }
        Err(e) => {
            let mut result = base_result(repo, root, StatusCode::Error, std::time::Duration::ZERO);
            result.error = Some(crate::error::ErrorKind::from(&e));
            result.message = Some(e.to_string());
            return with_common_fields(result, status);
        }
    };

    // Restore whatever was auto-stashed regardless of whether new commits
    // actually landed (`Pulled` vs `UpToDate`) — only a conflict leaves the
    // stash in place, since popping onto a conflicted tree would just stack
    // a second conflict on top of the first.
    if stashed && matches!(result.status, StatusCode::Pulled | StatusCode::UpToDate) {
        if gitops.stash_pop(repo.as_path()).is_ok() {
            result.stash_count = Some(0);
        }
    }

    with_common_fields(result, status)
}

fn with_common_fields(mut result: RepositoryResult, status: &crate::gitops::RepoStatus) -> RepositoryResult {
    result.branch = status.branch.clone();
    result.upstream = status.upstream.clone();
    result.uncommitted_files = Some(status.modified);
    result.untracked_files = Some(status.untracked);
    result
}

fn skip(repo: &RepoPath, root: &Path, status: &crate::gitops::RepoStatus, code: StatusCode) -> RepositoryResult {
    with_common_fields(base_result(repo, root, code, std::time::Duration::ZERO), status)
}
