//! The external collaborator interface the core engine is written against
//! (spec §6.2). Every verb's [`crate::operations`] policy takes a `&dyn GitOps`
//! rather than shelling out itself, so tests can swap in a fake.

mod cmd;
mod parse;
mod process;

pub use cmd::{Cmd, CmdError, CmdOutput};
pub use process::ProcessGitOps;

use std::path::Path;
use std::time::Duration;

use crate::error::CoreError;
use crate::model::CloneStrategy;

#[derive(Debug, Clone, Default)]
pub struct RepoStatus {
    pub branch: Option<String>,
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
    pub modified: u32,
    pub untracked: u32,
    pub conflicts: u32,
    pub stash_count: u32,
    pub head_sha: Option<String>,
    pub last_commit: Option<String>,
    pub remotes: Vec<String>,
    pub local_branches: Vec<String>,
    pub describe: Option<String>,
    pub rebase_in_progress: bool,
    pub merge_in_progress: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FetchOpts {
    pub all_remotes: bool,
    pub prune: bool,
    pub tags: bool,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullStrategyArg {
    Merge,
    Rebase,
    FfOnly,
}

#[derive(Debug, Clone)]
pub struct PullOpts {
    pub strategy: PullStrategyArg,
    pub prune: bool,
    pub tags: bool,
    /// Rebase/merge onto the already-known remote-tracking ref without
    /// touching the network (spec §4.3 "Update").
    pub no_fetch: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PullOutcome {
    pub fast_forwarded: bool,
    pub commits_applied: u32,
    pub conflicted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PushOpts {
    pub remotes: Vec<String>,
    pub refspec: Option<String>,
    pub force_with_lease: bool,
    pub set_upstream: bool,
    pub tags: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PushOutcome {
    pub pushed_commits: u32,
    pub rejected: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CloneOpts {
    pub url: String,
    pub branch: Option<String>,
    pub depth: Option<u32>,
    pub single_branch: bool,
    pub submodules: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BranchListOpts {
    pub include_remote: bool,
}

#[derive(Debug, Clone)]
pub struct BranchInfo {
    pub name: String,
    pub sha: String,
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
    pub is_head: bool,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone)]
pub struct DeleteBranchOpts {
    pub name: String,
    pub remote: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DiffOpts {
    pub staged: bool,
    pub include_untracked: bool,
    pub context: u32,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DiffBundle {
    pub files: Vec<crate::model::ChangedFile>,
    pub content: String,
    pub truncated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CommitOpts {
    pub message: String,
    pub files: Option<Vec<String>>,
}

/// Thin wrapper so call sites can name a strategy without importing the
/// clone-plan enum directly; kept identical in meaning to [`CloneStrategy`].
pub type UpdateStrategy = CloneStrategy;

/// Git primitives the core orchestrates (spec §6.2). Implemented by
/// [`ProcessGitOps`] against a real `git` binary; test code implements it
/// against an in-memory fake.
pub trait GitOps: Send + Sync {
    fn is_repo(&self, path: &Path) -> bool;
    fn status(&self, path: &Path) -> Result<RepoStatus, CoreError>;
    fn fetch(&self, path: &Path, opts: &FetchOpts) -> Result<(), CoreError>;
    fn pull(&self, path: &Path, opts: &PullOpts) -> Result<PullOutcome, CoreError>;
    fn push(&self, path: &Path, opts: &PushOpts) -> Result<PushOutcome, CoreError>;
    fn clone_repo(&self, path: &Path, opts: &CloneOpts) -> Result<(), CoreError>;
    fn list_branches(&self, path: &Path, opts: &BranchListOpts) -> Result<Vec<BranchInfo>, CoreError>;
    fn delete_branch(&self, path: &Path, opts: &DeleteBranchOpts) -> Result<(), CoreError>;
    /// Checkout `branch`, creating it from the current HEAD first if `create`.
    /// Not part of the literal §6.2 enumeration, but the Switch policy has no
    /// other way to change HEAD; added as a natural extension of the same
    /// primitive layer.
    fn switch_branch(&self, path: &Path, branch: &str, create: bool) -> Result<(), CoreError>;
    /// Is every commit on `branch` reachable from `base`? Backs Cleanup's
    /// "merged" classification; also not in the literal §6.2 enumeration.
    fn is_merged_into(&self, path: &Path, branch: &str, base: &str) -> Result<bool, CoreError>;
    fn stash_save(&self, path: &Path, include_untracked: bool) -> Result<(), CoreError>;
    fn stash_list(&self, path: &Path) -> Result<Vec<String>, CoreError>;
    fn stash_pop(&self, path: &Path) -> Result<(), CoreError>;
    fn tag_create(&self, path: &Path, name: &str) -> Result<(), CoreError>;
    fn tag_list(&self, path: &Path) -> Result<Vec<String>, CoreError>;
    fn tag_push(&self, path: &Path, name: &str) -> Result<(), CoreError>;
    fn diff(&self, path: &Path, opts: &DiffOpts) -> Result<DiffBundle, CoreError>;
    fn commit(&self, path: &Path, opts: &CommitOpts) -> Result<String, CoreError>;
    fn run_hook(
        &self,
        path: &Path,
        argv: &[String],
        timeout: Duration,
        env: &[(String, String)],
    ) -> Result<CmdOutput, CoreError>;
}
