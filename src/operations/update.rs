//! Update policy (spec §4.3 "Update") — a rebase pull, optionally skipping
//! the network when the caller only wants the current tracking state.

use std::path::Path;

use crate::gitops::GitOps;
use crate::model::{PullOptions, PullStrategy, RepoPath, RepositoryResult, StatusCode, UpdateOptions};

pub fn run(gitops: &dyn GitOps, repo: &RepoPath, root: &Path, opts: &UpdateOptions) -> RepositoryResult {
    let pull_opts = PullOptions {
        common: opts.common.clone(),
        strategy: PullStrategy::Rebase,
        prune: false,
        tags: false,
        stash: false,
    };

    let mut result = super::pull::run_with_fetch_mode(gitops, repo, root, &pull_opts, opts.no_fetch);
    if result.status == StatusCode::Pulled {
        result.status = StatusCode::Updated;
    } else if result.status == StatusCode::WouldPull {
        result.status = StatusCode::WouldUpdate;
    }
    result
}
