//! Fetch policy (spec §4.3 "Fetch").

use std::path::Path;

use crate::error::{CoreError, ErrorKind, NetworkError};
use crate::gitops::{FetchOpts as GitFetchOpts, GitOps};
use crate::model::{FetchOptions, RepoPath, RepositoryResult, StatusCode};

use super::common::{base_result, read_repo_state};

pub fn run(gitops: &dyn GitOps, repo: &RepoPath, root: &Path, opts: &FetchOptions) -> RepositoryResult {
    let state = match read_repo_state(gitops, repo, root) {
        Ok(state) => state,
        Err(result) => return result,
    };

    if state.status.remotes.is_empty() {
        let mut result = base_result(repo, root, StatusCode::NoRemote, state.read_at.elapsed());
        result.branch = state.status.branch;
        return result;
    }
    if state.status.upstream.is_none() {
        let mut result = base_result(repo, root, StatusCode::NoUpstream, state.read_at.elapsed());
        result.branch = state.status.branch;
        result.message = Some("no upstream configured; run with --set-upstream after adding one".into());
        return result;
    }

    result_with_worktree_counts(repo, root, &state.status, || {
        if opts.common.dry_run {
            return Ok((StatusCode::WouldFetch, None));
        }
        let pre_behind = state.status.behind;
        gitops
            .fetch(
                repo.as_path(),
                &GitFetchOpts {
                    all_remotes: opts.all_remotes,
                    prune: opts.prune,
                    tags: opts.tags,
                    timeout: None,
                },
            )
            .map_err(classify)?;
        let post = gitops.status(repo.as_path()).map_err(classify)?;
        let code = if post.behind > pre_behind { StatusCode::Fetched } else { StatusCode::UpToDate };
        Ok((code, Some((post.ahead, post.behind))))
    })
    .unwrap_or_else(|(kind, message)| {
        let mut result = base_result(repo, root, StatusCode::Error, state.read_at.elapsed());
        result.branch = state.status.branch.clone();
        result.error = Some(kind);
        result.message = Some(message);
        result
    })
}

fn classify(err: CoreError) -> CoreError {
    err
}

/// Shared tail: run `action`, stamp branch/worktree counts either way.
/// `action` also returns the post-fetch `(ahead, behind)` pair when it
/// actually fetched, so the delta spec §4.3 requires ("post > pre ⇒
/// `fetched`, record the delta") survives into the result, not just the
/// classification it produced.
fn result_with_worktree_counts(
    repo: &RepoPath,
    root: &Path,
    status: &crate::gitops::RepoStatus,
    action: impl FnOnce() -> Result<(StatusCode, Option<(u32, u32)>), CoreError>,
) -> Result<RepositoryResult, (ErrorKind, String)> {
    match action() {
        Ok((code, counts)) => {
            let mut result = base_result(repo, root, code, std::time::Duration::ZERO);
            result.branch = status.branch.clone();
            result.upstream = status.upstream.clone();
            result.uncommitted_files = Some(status.modified);
            result.untracked_files = Some(status.untracked);
            if let Some((ahead, behind)) = counts {
                result.commits_ahead = Some(ahead);
                result.commits_behind = Some(behind);
            }
            Ok(result)
        }
        Err(err) => {
            let kind = ErrorKind::from(&err);
            let status_code = match &err {
                CoreError::Network(NetworkError::AuthRequired) => Some(StatusCode::AuthRequired),
                CoreError::Network(NetworkError::Timeout) | CoreError::Network(NetworkError::Unreachable) | CoreError::Network(NetworkError::Dns) => {
                    Some(StatusCode::Unreachable)
                }
                _ => None,
            };
            if let Some(code) = status_code {
                let mut result = base_result(repo, root, code, std::time::Duration::ZERO);
                result.branch = status.branch.clone();
                result.message = Some(err.to_string());
                return Ok(result);
            }
            Err((kind, err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::test_support::FakeGitOps;

    #[test]
    fn no_remotes_short_circuits() {
        let gitops = FakeGitOps::new();
        let repo = RepoPath::new("/ws/a");
        let result = run(&gitops, &repo, Path::new("/ws"), &FetchOptions::default());
        assert_eq!(result.status, StatusCode::NoRemote);
    }

    #[test]
    fn no_upstream_is_reported() {
        let mut gitops = FakeGitOps::new();
        gitops.status_override.remotes = vec!["origin".into()];
        let repo = RepoPath::new("/ws/a");
        let result = run(&gitops, &repo, Path::new("/ws"), &FetchOptions::default());
        assert_eq!(result.status, StatusCode::NoUpstream);
    }

    #[test]
    fn dry_run_reports_would_fetch() {
        let mut gitops = FakeGitOps::new();
        gitops.status_override.remotes = vec!["origin".into()];
        gitops.status_override.upstream = Some("origin/main".into());
        let repo = RepoPath::new("/ws/a");
        let opts = FetchOptions {
            common: crate::model::CommonOptions {
                dry_run: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = run(&gitops, &repo, Path::new("/ws"), &opts);
        assert_eq!(result.status, StatusCode::WouldFetch);
    }

    #[test]
    fn fetch_with_new_commits_is_reported_fetched() {
        let mut gitops = FakeGitOps::new();
        gitops.status_override.remotes = vec!["origin".into()];
        gitops.status_override.upstream = Some("origin/main".into());
        gitops.status_override.behind = 0;
        gitops.post_fetch_behind = Some(3);
        let repo = RepoPath::new("/ws/a");
        let result = run(&gitops, &repo, Path::new("/ws"), &FetchOptions::default());
        assert_eq!(result.status, StatusCode::Fetched);
        assert_eq!(result.commits_behind, Some(3));
    }
}
