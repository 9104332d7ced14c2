//! Error taxonomy for the bulk engine.
//!
//! Mirrors the structured-enum-with-manual-`Display` style used throughout this
//! corpus for user-facing errors: each variant owns its message and, where one
//! exists, a fix hint. Whole-run failures (config, scanner root IO) are raised
//! through these variants wrapped in `anyhow::Error`; per-repository failures
//! are captured as [`ErrorKind`] inside a `RepositoryResult` and never abort
//! sibling repositories.

use std::fmt;

/// Whole-run or per-repository error taxonomy (spec §7).
#[derive(Debug, Clone)]
pub enum CoreError {
    /// Malformed YAML, unknown strategy, duplicate destination, invalid regex,
    /// invalid interval/depth.
    ConfigInvalid(String),
    /// Path absent of `.git` at operation time.
    NotARepository { path: String },
    /// Transport-level failure.
    Network(NetworkError),
    /// Git returned non-zero.
    GitOperation(GitOperationError),
    /// External hook command failed or timed out.
    HookFailure { command: String, detail: String },
    /// Clone target exists and is not a repository.
    DestinationOccupied { path: String },
    /// Cooperative shutdown.
    Canceled,
}

#[derive(Debug, Clone)]
pub enum NetworkError {
    Timeout,
    Unreachable,
    AuthRequired,
    Dns,
    Other(String),
}

#[derive(Debug, Clone)]
pub enum GitOperationError {
    Conflict,
    FastForwardNotPossible,
    RebaseInProgress,
    MergeInProgress,
    NoUpstream,
    NoRemote,
    Dirty,
    Other(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::ConfigInvalid(msg) => write!(f, "invalid configuration: {msg}"),
            CoreError::NotARepository { path } => {
                write!(f, "not a git working tree: {path}")
            }
            CoreError::Network(net) => write!(f, "{net}"),
            CoreError::GitOperation(op) => write!(f, "{op}"),
            CoreError::HookFailure { command, detail } => {
                write!(f, "hook `{command}` failed: {detail}")
            }
            CoreError::DestinationOccupied { path } => {
                write!(f, "clone destination exists and is not a repository: {path}")
            }
            CoreError::Canceled => write!(f, "canceled"),
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::Timeout => write!(f, "network timeout"),
            NetworkError::Unreachable => write!(f, "remote unreachable"),
            NetworkError::AuthRequired => {
                write!(f, "authentication required (configure a credential helper)")
            }
            NetworkError::Dns => write!(f, "DNS resolution failed"),
            NetworkError::Other(msg) => write!(f, "network error: {msg}"),
        }
    }
}

impl fmt::Display for GitOperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitOperationError::Conflict => write!(f, "merge conflict"),
            GitOperationError::FastForwardNotPossible => write!(f, "not a fast-forward"),
            GitOperationError::RebaseInProgress => write!(f, "rebase in progress"),
            GitOperationError::MergeInProgress => write!(f, "merge in progress"),
            GitOperationError::NoUpstream => write!(f, "no upstream configured"),
            GitOperationError::NoRemote => write!(f, "no remotes configured"),
            GitOperationError::Dirty => write!(f, "working tree has uncommitted changes"),
            GitOperationError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

/// Per-repository error kind, stored on [`crate::model::RepositoryResult::error`].
///
/// A thinner, serializable cousin of [`CoreError`] — it drops message strings
/// that belong to the whole-run abort path and keeps only what a formatter
/// needs to render a hint.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display)]
#[serde(tag = "kind", rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    NotARepository,
    NetworkTimeout,
    NetworkUnreachable,
    NetworkAuthRequired,
    NetworkDns,
    NetworkOther,
    Conflict,
    FastForwardNotPossible,
    RebaseInProgress,
    MergeInProgress,
    NoUpstream,
    NoRemote,
    Dirty,
    HookFailure,
    DestinationOccupied,
    Canceled,
    Other,
}

impl From<&CoreError> for ErrorKind {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::ConfigInvalid(_) => ErrorKind::Other,
            CoreError::NotARepository { .. } => ErrorKind::NotARepository,
            CoreError::Network(net) => match net {
                NetworkError::Timeout => ErrorKind::NetworkTimeout,
                NetworkError::Unreachable => ErrorKind::NetworkUnreachable,
                NetworkError::AuthRequired => ErrorKind::NetworkAuthRequired,
                NetworkError::Dns => ErrorKind::NetworkDns,
                NetworkError::Other(_) => ErrorKind::NetworkOther,
            },
            CoreError::GitOperation(op) => match op {
                GitOperationError::Conflict => ErrorKind::Conflict,
                GitOperationError::FastForwardNotPossible => ErrorKind::FastForwardNotPossible,
                GitOperationError::RebaseInProgress => ErrorKind::RebaseInProgress,
                GitOperationError::MergeInProgress => ErrorKind::MergeInProgress,
                GitOperationError::NoUpstream => ErrorKind::NoUpstream,
                GitOperationError::NoRemote => ErrorKind::NoRemote,
                GitOperationError::Dirty => ErrorKind::Dirty,
                GitOperationError::Other(_) => ErrorKind::Other,
            },
            CoreError::HookFailure { .. } => ErrorKind::HookFailure,
            CoreError::DestinationOccupied { .. } => ErrorKind::DestinationOccupied,
            CoreError::Canceled => ErrorKind::Canceled,
        }
    }
}
