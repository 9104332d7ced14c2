//! Diagnostic status (health) policy (spec §4.4).

use std::path::Path;
use std::time::Instant;

use crate::error::{CoreError, NetworkError};
use crate::gitops::{FetchOpts, GitOps};
use crate::model::{DivergenceCode, HealthOptions, HealthStatus, NetworkCode, RepoHealth, WorkTreeCode};

pub fn run(gitops: &dyn GitOps, path: &Path, root: &Path, opts: &HealthOptions) -> RepoHealth {
    let t0 = Instant::now();
    let rel_path = path.strip_prefix(root).unwrap_or(path).to_string_lossy().into_owned();

    if !gitops.is_repo(path) {
        return RepoHealth {
            rel_path,
            abs_path: path.display().to_string(),
            branch: None,
            upstream: None,
            remote: None,
            network: None,
            divergence: None,
            worktree: None,
            ahead_by: 0,
            behind_by: 0,
            modified: 0,
            untracked: 0,
            conflicts: 0,
            health: HealthStatus::Error,
            recommendation: Some("not a git working tree".into()),
            fetch_duration: None,
            duration: t0.elapsed(),
        };
    }

    let (network, fetch_duration) = if opts.skip_fetch {
        (None, None)
    } else {
        let fetch_t0 = Instant::now();
        let result = gitops.fetch(path, &FetchOpts {
            all_remotes: true,
            prune: false,
            tags: false,
            timeout: Some(opts.effective_timeout()),
        });
        (Some(classify_network(&result)), Some(fetch_t0.elapsed()))
    };

    let status = match gitops.status(path) {
        Ok(status) => status,
        Err(_) => {
            return RepoHealth {
                rel_path,
                abs_path: path.display().to_string(),
                branch: None,
                upstream: None,
                remote: None,
                network,
                divergence: None,
                worktree: None,
                ahead_by: 0,
                behind_by: 0,
                modified: 0,
                untracked: 0,
                conflicts: 0,
                health: HealthStatus::Error,
                recommendation: Some("could not read repository status".into()),
                fetch_duration,
                duration: t0.elapsed(),
            };
        }
    };

    let divergence = classify_divergence(status.upstream.is_some(), status.ahead, status.behind, status.conflicts > 0);
    let worktree = classify_worktree(status.modified, status.conflicts, status.untracked);
    let health = synthesize_health(network, divergence, worktree);
    let recommendation = recommend(network, divergence, worktree);

    RepoHealth {
        rel_path,
        abs_path: path.display().to_string(),
        branch: status.branch,
        upstream: status.upstream,
        remote: status.remotes.first().cloned(),
        network,
        divergence: Some(divergence),
        worktree: Some(worktree),
        ahead_by: status.ahead,
        behind_by: status.behind,
        modified: status.modified,
        untracked: status.untracked,
        conflicts: status.conflicts,
        health,
        recommendation,
        fetch_duration,
        duration: t0.elapsed(),
    }
}

fn classify_network(result: &Result<(), CoreError>) -> NetworkCode {
    match result {
        Ok(()) => NetworkCode::Reachable,
        Err(CoreError::Network(NetworkError::Timeout)) => NetworkCode::Timeout,
        Err(CoreError::Network(NetworkError::Dns)) | Err(CoreError::Network(NetworkError::Unreachable)) => {
            NetworkCode::Unreachable
        }
        Err(CoreError::Network(NetworkError::AuthRequired)) => NetworkCode::AuthFailed,
        Err(_) => NetworkCode::Unreachable,
    }
}

fn classify_divergence(has_upstream: bool, ahead: u32, behind: u32, conflict: bool) -> DivergenceCode {
    if conflict {
        return DivergenceCode::Conflict;
    }
    if !has_upstream {
        return DivergenceCode::NoUpstream;
    }
    match (ahead, behind) {
        (0, 0) => DivergenceCode::None,
        (0, _) => DivergenceCode::FastForward,
        (_, 0) => DivergenceCode::Ahead,
        _ => DivergenceCode::Diverged,
    }
}

fn classify_worktree(modified: u32, conflicts: u32, untracked: u32) -> WorkTreeCode {
    if conflicts > 0 {
        WorkTreeCode::Conflict
    } else if modified > 0 || untracked > 0 {
        WorkTreeCode::Dirty
    } else {
        WorkTreeCode::Clean
    }
}

fn synthesize_health(network: Option<NetworkCode>, divergence: DivergenceCode, worktree: WorkTreeCode) -> HealthStatus {
    if matches!(network, Some(n) if n != NetworkCode::Reachable) {
        return HealthStatus::Unreachable;
    }
    if divergence == DivergenceCode::Conflict || worktree == WorkTreeCode::Conflict {
        return HealthStatus::Error;
    }
    if divergence == DivergenceCode::Diverged {
        return HealthStatus::Warning;
    }
    if worktree == WorkTreeCode::Dirty {
        return HealthStatus::Warning;
    }
    if divergence == DivergenceCode::FastForward {
        return HealthStatus::Warning;
    }
    HealthStatus::Healthy
}

fn recommend(network: Option<NetworkCode>, divergence: DivergenceCode, worktree: WorkTreeCode) -> Option<String> {
    if let Some(NetworkCode::AuthFailed) = network {
        return Some("configure credential helper".into());
    }
    if matches!(network, Some(n) if n != NetworkCode::Reachable) {
        return Some("check network connectivity".into());
    }
    if divergence == DivergenceCode::Conflict || worktree == WorkTreeCode::Conflict {
        return Some("resolve conflicts".into());
    }
    if divergence == DivergenceCode::Diverged {
        return Some("rebase or merge".into());
    }
    if worktree == WorkTreeCode::Dirty {
        return Some("commit or stash".into());
    }
    match divergence {
        DivergenceCode::FastForward => Some("pull".into()),
        DivergenceCode::Ahead => Some("push".into()),
        DivergenceCode::NoUpstream => Some("set an upstream".into()),
        _ => None,
    }
}
