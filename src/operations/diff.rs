//! Diff policy (spec §4.3 "Stash / Tag / Diff").

use std::path::Path;

use crate::error::ErrorKind;
use crate::gitops::{DiffOpts as GitDiffOpts, GitOps};
use crate::model::{DiffOptions, RepoPath, RepositoryResult, StatusCode};

use super::common::{base_result, read_repo_state};

pub fn run(gitops: &dyn GitOps, repo: &RepoPath, root: &Path, opts: &DiffOptions) -> RepositoryResult {
    let state = match read_repo_state(gitops, repo, root) {
        Ok(state) => state,
        Err(result) => return result,
    };

    let bundle = gitops.diff(
        repo.as_path(),
        &GitDiffOpts {
            staged: opts.staged,
            include_untracked: opts.include_untracked,
            context: opts.context,
            max_bytes: opts.max_diff_size,
        },
    );

    let mut result = match bundle {
        Ok(bundle) => {
            let mut result = base_result(repo, root, StatusCode::Success, std::time::Duration::ZERO);
            result.files_changed = Some(bundle.files.len() as u32);
            result.additions = Some(bundle.files.iter().map(|f| f.additions).sum());
            result.deletions = Some(bundle.files.iter().map(|f| f.deletions).sum());
            result.changed_files = bundle.files;
            result.diff_content = Some(bundle.content);
            result.truncated = bundle.truncated;
            result
        }
        Err(e) => {
            let mut result = base_result(repo, root, StatusCode::Error, std::time::Duration::ZERO);
            result.error = Some(ErrorKind::from(&e));
            result.message = Some(e.to_string());
            result
        }
    };
    result.branch = state.status.branch;
    result
}
