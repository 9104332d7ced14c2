//! Per-verb option records (spec §3, §4.3).
//!
//! Each verb gets its own small options struct rather than one sprawling
//! struct with mostly-irrelevant fields per call site — the same shape the
//! teacher uses for its per-command flag structs, just expressed as plain
//! data instead of `clap::Args` (flag wiring is the CLI's job, not the
//! core's; see spec §1).

use std::sync::Arc;
use std::time::Duration;

use crate::model::RepoFilter;

/// Progress callback: `(completed, total, rel_path)`, 1-based `completed` (spec §4.2).
pub type ProgressCallback = Arc<dyn Fn(usize, usize, &str) + Send + Sync>;

/// Fields shared by every verb's options.
#[derive(Clone)]
pub struct CommonOptions {
    pub parallel: usize,
    pub dry_run: bool,
    pub verbose: bool,
    pub filter: RepoFilter,
    pub progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for CommonOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommonOptions")
            .field("parallel", &self.parallel)
            .field("dry_run", &self.dry_run)
            .field("verbose", &self.verbose)
            .field("filter", &self.filter)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self {
            parallel: crate::runner::default_parallelism(),
            dry_run: false,
            verbose: false,
            filter: RepoFilter::default(),
            progress: None,
        }
    }
}

impl CommonOptions {
    pub fn validate(&self) -> Result<(), crate::error::CoreError> {
        if self.parallel == 0 {
            return Err(crate::error::CoreError::ConfigInvalid(
                "parallel must be >= 1".into(),
            ));
        }
        self.filter.validate()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub common: CommonOptions,
    pub all_remotes: bool,
    pub prune: bool,
    pub tags: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PullStrategy {
    #[default]
    Merge,
    Rebase,
    FfOnly,
}

#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    pub common: CommonOptions,
    pub strategy: PullStrategy,
    pub prune: bool,
    pub tags: bool,
    pub stash: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    pub common: CommonOptions,
    /// Always applied as force-with-lease, never a naked force (spec §9).
    pub force: bool,
    pub set_upstream: bool,
    pub tags: bool,
    pub refspec: Option<String>,
    pub remotes: Vec<String>,
    pub all_remotes: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub common: CommonOptions,
    pub no_fetch: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SwitchOptions {
    pub common: CommonOptions,
    pub branch: String,
    pub create: bool,
    pub force: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CleanupOptions {
    pub common: CommonOptions,
    pub include_merged: bool,
    pub include_stale: bool,
    pub include_gone: bool,
    pub stale_threshold: Duration,
    pub base_branch: Option<String>,
    pub delete_remote: bool,
    pub protect_patterns: Vec<regex::Regex>,
}

#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    pub common: CommonOptions,
    pub common_message: Option<String>,
    pub per_repo_messages: std::collections::HashMap<std::path::PathBuf, String>,
    pub yes: bool,
    pub edit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StashAction {
    Save { include_untracked: bool },
    List,
    Pop,
}

#[derive(Debug, Clone)]
pub struct StashOptions {
    pub common: CommonOptions,
    pub action: StashAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemverBump {
    Major,
    Minor,
    Patch,
}

#[derive(Debug, Clone)]
pub enum TagAction {
    Create { name: String },
    Auto { bump: SemverBump },
    List,
    Push { name: String },
    Status,
}

#[derive(Debug, Clone)]
pub struct TagOptions {
    pub common: CommonOptions,
    pub action: TagAction,
}

#[derive(Debug, Clone)]
pub struct DiffOptions {
    pub common: CommonOptions,
    pub staged: bool,
    pub include_untracked: bool,
    pub context: u32,
    pub max_diff_size: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            common: CommonOptions::default(),
            staged: false,
            include_untracked: false,
            context: 3,
            max_diff_size: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HealthOptions {
    pub common: CommonOptions,
    pub skip_fetch: bool,
    pub per_fetch_timeout: Option<Duration>,
}

impl HealthOptions {
    pub fn effective_timeout(&self) -> Duration {
        self.per_fetch_timeout.unwrap_or(Duration::from_secs(30))
    }
}

/// Tagged variant over every verb's options, used by [`crate::runner::run_bulk`]
/// as the single entry point signature (spec §6.1).
#[derive(Clone)]
pub enum Options {
    Fetch(FetchOptions),
    Pull(PullOptions),
    Push(PushOptions),
    Update(UpdateOptions),
    Switch(SwitchOptions),
    Cleanup(CleanupOptions),
    Commit(CommitOptions),
    Stash(StashOptions),
    Tag(TagOptions),
    Diff(DiffOptions),
}

impl Options {
    pub fn common(&self) -> &CommonOptions {
        match self {
            Options::Fetch(o) => &o.common,
            Options::Pull(o) => &o.common,
            Options::Push(o) => &o.common,
            Options::Update(o) => &o.common,
            Options::Switch(o) => &o.common,
            Options::Cleanup(o) => &o.common,
            Options::Commit(o) => &o.common,
            Options::Stash(o) => &o.common,
            Options::Tag(o) => &o.common,
            Options::Diff(o) => &o.common,
        }
    }
}
