//! Diagnostic status types (spec §4.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum NetworkCode {
    Reachable,
    Timeout,
    Unreachable,
    AuthFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DivergenceCode {
    None,
    FastForward,
    Ahead,
    Diverged,
    Conflict,
    NoUpstream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WorkTreeCode {
    Clean,
    Dirty,
    Conflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Error,
    Unreachable,
}

/// Richer shape joining divergence, work-tree, and network axes (spec §3, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoHealth {
    pub rel_path: String,
    pub abs_path: String,
    pub branch: Option<String>,
    pub upstream: Option<String>,
    pub remote: Option<String>,
    pub network: Option<NetworkCode>,
    pub divergence: Option<DivergenceCode>,
    pub worktree: Option<WorkTreeCode>,
    pub ahead_by: u32,
    pub behind_by: u32,
    pub modified: u32,
    pub untracked: u32,
    pub conflicts: u32,
    pub health: HealthStatus,
    pub recommendation: Option<String>,
    pub fetch_duration: Option<Duration>,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HealthSummary {
    pub healthy: u32,
    pub warning: u32,
    pub error: u32,
    pub unreachable: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub results: Vec<RepoHealth>,
    pub summary: HealthSummary,
    pub total_duration: Duration,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let s = &self.summary;
        assert_eq!(s.total as usize, self.results.len());
        assert_eq!(s.total, s.healthy + s.warning + s.error + s.unreachable);
    }
}
