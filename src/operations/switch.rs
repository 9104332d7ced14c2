//! Switch policy (spec §4.3 "Switch").

use std::path::Path;

use crate::error::ErrorKind;
use crate::gitops::GitOps;
use crate::model::{RepoPath, RepositoryResult, StatusCode, SwitchOptions};

use super::common::{base_result, read_repo_state};

pub fn run(gitops: &dyn GitOps, repo: &RepoPath, root: &Path, opts: &SwitchOptions) -> RepositoryResult {
    let state = match read_repo_state(gitops, repo, root) {
        Ok(state) => state,
        Err(result) => return result,
    };
    let status = &state.status;

    if status.branch.as_deref() == Some(opts.branch.as_str()) {
        return with_branch(base_result(repo, root, StatusCode::Already, std::time::Duration::ZERO), &opts.branch);
    }

    let exists = status.local_branches.iter().any(|b| b == &opts.branch);
    if !exists && !opts.create {
        return with_branch(base_result(repo, root, StatusCode::NotFound, std::time::Duration::ZERO), &opts.branch);
    }

    let dirty = status.modified > 0 || status.conflicts > 0 || status.untracked > 0;
    if dirty && !opts.force {
        return with_branch(base_result(repo, root, StatusCode::Dirty, std::time::Duration::ZERO), &status.branch.clone().unwrap_or_default());
    }

    if opts.common.dry_run {
        return with_branch(base_result(repo, root, StatusCode::WouldSwitch, std::time::Duration::ZERO), &opts.branch);
    }

    let creating = !exists && opts.create;
    match gitops.switch_branch(repo.as_path(), &opts.branch, creating) {
        Ok(()) => {
            let code = if creating { StatusCode::Created } else { StatusCode::Switched };
            with_branch(base_result(repo, root, code, std::time::Duration::ZERO), &opts.branch)
        }
        Err(e) => {
            let mut result = base_result(repo, root, StatusCode::Error, std::time::Duration::ZERO);
            result.error = Some(ErrorKind::from(&e));
            result.message = Some(e.to_string());
            result
        }
    }
}

fn with_branch(mut result: RepositoryResult, branch: &str) -> RepositoryResult {
    result.branch = Some(branch.to_string());
    result
}
