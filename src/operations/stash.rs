//! Stash policy (spec §4.3 "Stash").

use std::path::Path;

use crate::error::ErrorKind;
use crate::gitops::GitOps;
use crate::model::{RepoPath, RepositoryResult, StashAction, StashOptions, StatusCode};

use super::common::{base_result, read_repo_state};

pub fn run(gitops: &dyn GitOps, repo: &RepoPath, root: &Path, opts: &StashOptions) -> RepositoryResult {
    let state = match read_repo_state(gitops, repo, root) {
        Ok(state) => state,
        Err(result) => return result,
    };
    let status = &state.status;

    match opts.action {
        StashAction::List => {
            let mut result = match gitops.stash_list(repo.as_path()) {
                Ok(stashes) => {
                    let mut result = base_result(repo, root, StatusCode::Listed, std::time::Duration::ZERO);
                    result.stash_count = Some(stashes.len() as u32);
                    result
                }
                Err(e) => error_result(repo, root, &e),
            };
            result.branch = status.branch.clone();
            result
        }
        StashAction::Save { include_untracked } => {
            if opts.common.dry_run {
                let mut result = base_result(repo, root, StatusCode::WouldStash, std::time::Duration::ZERO);
                result.branch = status.branch.clone();
                return result;
            }
            let mut result = match gitops.stash_save(repo.as_path(), include_untracked) {
                Ok(()) => base_result(repo, root, StatusCode::Stashed, std::time::Duration::ZERO),
                Err(e) => error_result(repo, root, &e),
            };
            result.branch = status.branch.clone();
            result
        }
        StashAction::Pop => {
            let mut result = match gitops.stash_pop(repo.as_path()) {
                Ok(()) => base_result(repo, root, StatusCode::Popped, std::time::Duration::ZERO),
                Err(e) => match &e {
                    crate::error::CoreError::GitOperation(crate::error::GitOperationError::Conflict) => {
                        base_result(repo, root, StatusCode::Conflict, std::time::Duration::ZERO)
                    }
                    _ => error_result(repo, root, &e),
                },
            };
            result.branch = status.branch.clone();
            result
        }
    }
}

fn error_result(repo: &RepoPath, root: &Path, err: &crate::error::CoreError) -> RepositoryResult {
    let mut result = base_result(repo, root, StatusCode::Error, std::time::Duration::ZERO);
    result.error = Some(ErrorKind::from(err));
    result.message = Some(err.to_string());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::test_support::FakeGitOps;

    #[test]
    fn list_surfaces_stash_count() {
        let gitops = FakeGitOps::new();
        let repo = RepoPath::new("/ws/a");
        let opts = StashOptions {
            common: Default::default(),
            action: StashAction::List,
        };
        let result = run(&gitops, &repo, Path::new("/ws"), &opts);
        assert_eq!(result.status, StatusCode::Listed);
        assert_eq!(result.stash_count, Some(0));
    }

    #[test]
    fn pop_conflict_is_reported() {
        let mut gitops = FakeGitOps::new();
        gitops.stash_pop_result = Some(Err(crate::error::CoreError::GitOperation(
            crate::error::GitOperationError::Conflict,
        )));
        let repo = RepoPath::new("/ws/a");
        let opts = StashOptions {
            common: Default::default(),
            action: StashAction::Pop,
        };
        let result = run(&gitops, &repo, Path::new("/ws"), &opts);
        assert_eq!(result.status, StatusCode::Conflict);
    }
}
