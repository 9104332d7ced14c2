//! Neutral data model shared by every component.
//!
//! These types are the contract between the engine and everything outside it
//! (formatters, the thin CLI, tests). Nothing in here renders to a terminal;
//! see `styling` for that.

mod clone;
mod health;
mod options;
mod result;

pub use clone::{
    CloneSpec, CloneStrategy, CloneStructure, GroupSpec, Hooks, PlannedClone, RawGroupSpec, RawHooks, RepoEntry,
};
pub use health::{DivergenceCode, HealthReport, HealthStatus, HealthSummary, NetworkCode, RepoHealth, WorkTreeCode};
pub use options::{
    CleanupOptions, CommitOptions, CommonOptions, DiffOptions, FetchOptions, HealthOptions, Options,
    ProgressCallback, PullOptions, PullStrategy, PushOptions, SemverBump, StashAction, StashOptions,
    SwitchOptions, TagAction, TagOptions, UpdateOptions,
};
pub use result::{BulkResult, ChangedFile, RepositoryResult, StatusCode};

use std::path::{Path, PathBuf};

/// An absolute filesystem path known to contain a working tree.
///
/// Immutable for the life of an operation: constructed once by the [`crate::scanner`]
/// (or directly, for a single-repository invocation) and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoPath(PathBuf);

impl RepoPath {
    /// Wrap an already-resolved absolute path. Does not touch the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    /// Path relative to `root`, falling back to the absolute path if `root`
    /// is not an ancestor (e.g. the root itself is the repository).
    pub fn relative_to(&self, root: &Path) -> PathBuf {
        self.0
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.0.clone())
    }
}

impl AsRef<Path> for RepoPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for RepoPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Discovery and filtering parameters for the [`crate::scanner`].
#[derive(Debug, Clone)]
pub struct RepoFilter {
    pub include: Option<regex::Regex>,
    pub exclude: Option<regex::Regex>,
    /// Must be `>= 1`. `1` means the root plus its immediate children are candidates.
    pub max_depth: u32,
    pub include_submodules: bool,
}

impl Default for RepoFilter {
    fn default() -> Self {
        Self {
            include: None,
            exclude: None,
            max_depth: 3,
            include_submodules: false,
        }
    }
}

impl RepoFilter {
    /// Validate the invariant `max_depth >= 1`.
    ///
    /// Regex compilation failures are surfaced earlier, at construction time
    /// in the CLI wrapper, as `ConfigInvalid` (§4.1).
    pub fn validate(&self) -> Result<(), crate::error::CoreError> {
        if self.max_depth == 0 {
            return Err(crate::error::CoreError::ConfigInvalid(
                "max_depth must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Does `rel_path` (relative to the scan root) pass the include/exclude filters?
    pub fn matches(&self, rel_path: &Path) -> bool {
        let rel = rel_path.to_string_lossy();
        if let Some(include) = &self.include
            && !include.is_match(&rel)
        {
            return false;
        }
        if let Some(exclude) = &self.exclude
            && exclude.is_match(&rel)
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_path_relative_to_root() {
        let repo = RepoPath::new("/home/me/ws/a/r1");
        assert_eq!(repo.relative_to(Path::new("/home/me/ws")), PathBuf::from("a/r1"));
    }

    #[test]
    fn repo_path_relative_to_unrelated_root_falls_back_to_absolute() {
        let repo = RepoPath::new("/home/me/ws/a/r1");
        assert_eq!(
            repo.relative_to(Path::new("/other")),
            PathBuf::from("/home/me/ws/a/r1")
        );
    }

    #[test]
    fn filter_rejects_zero_depth() {
        let filter = RepoFilter {
            max_depth: 0,
            ..Default::default()
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn filter_include_exclude() {
        let filter = RepoFilter {
            include: Some(regex::Regex::new("^a/").unwrap()),
            exclude: Some(regex::Regex::new(".*tmp$").unwrap()),
            ..Default::default()
        };
        assert!(filter.matches(Path::new("a/r1")));
        assert!(!filter.matches(Path::new("b/r1")));
        assert!(!filter.matches(Path::new("a/tmp")));
    }
}
