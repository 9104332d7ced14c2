//! The neutral per-repository result record and its aggregate.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Exhaustive, tagged status codes across every verb.
///
/// Design note: the teacher's original formatter branched on loosely-typed
/// strings; here the compiler enforces icon/formatter coverage (a `match`
/// with no wildcard arm fails to compile when a variant is added), while the
/// wire representation is still a plain kebab-case string for downstream
/// JSON/tabular consumers (spec §9 "Formatter branching on string status
/// codes").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StatusCode {
    // Shared / fetch-ish
    Clean,
    UpToDate,
    NoRemote,
    NoUpstream,
    Fetched,
    AuthRequired,
    Unreachable,
    // Pull / update
    Dirty,
    RebaseInProgress,
    MergeInProgress,
    Pulled,
    Conflict,
    Updated,
    // Push
    NothingToPush,
    Pushed,
    // Switch
    Already,
    NotFound,
    Switched,
    Created,
    // Cleanup
    WouldCleanup,
    CleanedUp,
    // Commit
    WouldCommit,
    Success,
    // Stash / tag
    Stashed,
    Popped,
    Listed,
    Tagged,
    // Clone
    Cloned,
    Skipped,
    // Dry-run shunt (applies to any mutating verb)
    WouldFetch,
    WouldPull,
    WouldPush,
    WouldUpdate,
    WouldSwitch,
    WouldClone,
    WouldStash,
    WouldTag,
    // Terminal
    Error,
    Canceled,
}

/// A single changed path surfaced by `diff` or `commit` (phase 1 classification).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: String,
    pub additions: u32,
    pub deletions: u32,
    /// `"added" | "modified" | "deleted" | "renamed"`.
    pub change_class: String,
}

/// The neutral record every [`crate::operations`] policy produces, exactly once
/// per repository per invocation (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryResult {
    pub rel_path: String,
    pub abs_path: String,
    pub branch: Option<String>,
    pub status: StatusCode,
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commits_ahead: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commits_behind: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pushed_commits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_changed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncommitted_files: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub untracked_files: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stash_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_files: Vec<ChangedFile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub untracked_files_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_content: Option<String>,
    #[serde(default)]
    pub truncated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_status: Option<crate::model::NetworkCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divergence: Option<crate::model::DivergenceCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_state: Option<crate::model::WorkTreeCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,

    pub duration: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_duration: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl RepositoryResult {
    /// Start a minimal, successful result for `repo`; callers fill in the rest.
    pub fn new(rel_path: String, abs_path: String, status: StatusCode, duration: Duration) -> Self {
        Self {
            rel_path,
            abs_path,
            branch: None,
            status,
            message: None,
            commits_ahead: None,
            commits_behind: None,
            pushed_commits: None,
            files_changed: None,
            additions: None,
            deletions: None,
            uncommitted_files: None,
            untracked_files: None,
            stash_count: None,
            changed_files: Vec::new(),
            untracked_files_list: Vec::new(),
            diff_content: None,
            truncated: false,
            upstream: None,
            remote: None,
            network_status: None,
            divergence: None,
            worktree_state: None,
            recommendation: None,
            duration,
            fetch_duration: None,
            error: None,
        }
    }

    pub fn with_error(mut self, kind: ErrorKind, message: impl Into<String>) -> Self {
        self.status = StatusCode::Error;
        self.error = Some(kind);
        self.message = Some(message.into());
        self
    }
}

/// Aggregate produced by the [`crate::report::Reporter`] (spec §3, §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkResult {
    pub total_scanned: usize,
    pub total_processed: usize,
    pub duration: Duration,
    pub per_status_histogram: BTreeMap<StatusCode, u32>,
    pub repositories: Vec<RepositoryResult>,
}

// BTreeMap needs Ord on the key for serde when the map is (de)serialized as a
// map-of-maps; StatusCode only derives PartialEq/Eq above, so give it a total
// order via its string discriminant. This keeps StatusCode's derive list
// focused on what call sites actually need (display + serde + parsing).
impl PartialOrd for StatusCode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StatusCode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl BulkResult {
    /// Check the invariants spec'd in §3 and §8. Debug-only helper for tests.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert!(self.total_scanned >= self.total_processed);
        assert_eq!(self.total_processed, self.repositories.len());
        let sum: u32 = self.per_status_histogram.values().sum();
        assert_eq!(sum as usize, self.total_processed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_round_trips_through_kebab_case() {
        let s = StatusCode::RebaseInProgress;
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"rebase-in-progress\"");
        let back: StatusCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn bulk_result_invariants_hold_for_empty_run() {
        let result = BulkResult {
            total_scanned: 0,
            total_processed: 0,
            duration: Duration::ZERO,
            per_status_histogram: BTreeMap::new(),
            repositories: Vec::new(),
        };
        result.check_invariants();
    }
}
