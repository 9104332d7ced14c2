//! Push policy (spec §4.3 "Push").

use std::path::Path;

use crate::error::{CoreError, ErrorKind, GitOperationError};
use crate::gitops::{GitOps, PushOpts as GitPushOpts};
use crate::model::{PushOptions, RepoPath, RepositoryResult, StatusCode};

use super::common::{base_result, read_repo_state};

pub fn run(gitops: &dyn GitOps, repo: &RepoPath, root: &Path, opts: &PushOptions) -> RepositoryResult {
    let state = match read_repo_state(gitops, repo, root) {
        Ok(state) => state,
        Err(result) => return result,
    };
    let status = &state.status;

    if status.upstream.is_none() && !opts.set_upstream {
        return with_common(base_result(repo, root, StatusCode::NoUpstream, std::time::Duration::ZERO), status);
    }
    if status.rebase_in_progress {
        return with_common(base_result(repo, root, StatusCode::RebaseInProgress, std::time::Duration::ZERO), status);
    }
    if status.merge_in_progress {
        return with_common(base_result(repo, root, StatusCode::MergeInProgress, std::time::Duration::ZERO), status);
    }

    if opts.common.dry_run {
        return with_common(base_result(repo, root, StatusCode::WouldPush, std::time::Duration::ZERO), status);
    }

    if status.ahead == 0 {
        return with_common(base_result(repo, root, StatusCode::NothingToPush, std::time::Duration::ZERO), status);
    }

    let remotes = if opts.all_remotes { status.remotes.clone() } else { opts.remotes.clone() };

    let outcome = gitops.push(
        repo.as_path(),
        &GitPushOpts {
            remotes,
            refspec: opts.refspec.clone(),
            force_with_lease: opts.force,
            set_upstream: opts.set_upstream,
            tags: opts.tags,
        },
    );

    let mut result = match outcome {
        Ok(outcome) => {
            let code = if outcome.pushed_commits > 0 {
                StatusCode::Pushed
            } else {
                StatusCode::NothingToPush
            };
            let mut result = base_result(repo, root, code, std::time::Duration::ZERO);
            result.pushed_commits = Some(outcome.pushed_commits);
            result
        }
        Err(CoreError::GitOperation(GitOperationError::NoUpstream)) => {
            base_result(repo, root, StatusCode::NoUpstream, std::time::Duration::ZERO)
        }
        Err(e) => {
            let mut result = base_result(repo, root, StatusCode::Error, std::time::Duration::ZERO);
            result.error = Some(ErrorKind::from(&e));
            result.message = Some(e.to_string());
            result
        }
    };

    result.commits_ahead = Some(status.ahead);
    with_common(result, status)
}

fn with_common(mut result: RepositoryResult, status: &crate::gitops::RepoStatus) -> RepositoryResult {
    result.branch = status.branch.clone();
    result.upstream = status.upstream.clone();
    result
}
