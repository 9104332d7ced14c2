//! Per-verb policies: pure `(GitOps, RepoPath, Options) -> RepositoryResult`
//! functions run by [`crate::runner::run_bulk`] against each scanned repository
//! (spec §4.3). Clone and health have their own entry points since they
//! don't scan pre-existing repositories the same way the mutating verbs do.

mod cleanup;
mod clone;
mod commit;
mod common;
mod diff;
mod fetch;
mod health;
mod pull;
mod push;
mod stash;
mod switch;
mod tag;
mod update;

#[cfg(test)]
mod test_support;

use std::path::Path;

use crate::gitops::GitOps;
use crate::model::{Options, RepoPath, RepositoryResult};

pub use clone::run as run_clone;
pub use health::run as run_health;

/// Run the mutating verb named by `opts` against a single repository.
pub fn dispatch(gitops: &dyn GitOps, repo: &RepoPath, root: &Path, opts: &Options) -> RepositoryResult {
    match opts {
        Options::Fetch(o) => fetch::run(gitops, repo, root, o),
        Options::Pull(o) => pull::run(gitops, repo, root, o),
        Options::Push(o) => push::run(gitops, repo, root, o),
        Options::Update(o) => update::run(gitops, repo, root, o),
        Options::Switch(o) => switch::run(gitops, repo, root, o),
        Options::Cleanup(o) => cleanup::run(gitops, repo, root, o),
        Options::Commit(o) => commit::run(gitops, repo, root, o),
        Options::Stash(o) => stash::run(gitops, repo, root, o),
        Options::Tag(o) => tag::run(gitops, repo, root, o),
        Options::Diff(o) => diff::run(gitops, repo, root, o),
    }
}
