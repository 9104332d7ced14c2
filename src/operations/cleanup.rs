//! Cleanup (branches) policy (spec §4.3 "Cleanup").

use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::gitops::{BranchInfo, BranchListOpts, DeleteBranchOpts, GitOps};
use crate::model::{CleanupOptions, RepoPath, RepositoryResult, StatusCode};

use super::common::{base_result, read_repo_state};

const DEFAULT_PROTECTED_NAMES: &[&str] = &["main", "master", "develop"];

fn is_default_protected(name: &str) -> bool {
    DEFAULT_PROTECTED_NAMES.contains(&name) || name.starts_with("release/") || name.starts_with("hotfix/")
}

fn is_protected(name: &str, patterns: &[regex::Regex]) -> bool {
    is_default_protected(name) || patterns.iter().any(|p| p.is_match(name))
}

fn detect_base_branch(local_branches: &[String], explicit: Option<&str>) -> Option<String> {
    if let Some(base) = explicit {
        return Some(base.to_string());
    }
    ["main", "master", "develop"]
        .iter()
        .find(|candidate| local_branches.iter().any(|b| b == *candidate))
        .map(|s| s.to_string())
}

fn is_stale(branch: &BranchInfo, threshold: Duration) -> bool {
    match branch.updated_at {
        Some(updated_at) => {
            let age = chrono::Utc::now().signed_duration_since(updated_at);
            age.to_std().map(|age| age > threshold).unwrap_or(false)
        }
        None => false,
    }
}

pub fn run(gitops: &dyn GitOps, repo: &RepoPath, root: &Path, opts: &CleanupOptions) -> RepositoryResult {
    let state = match read_repo_state(gitops, repo, root) {
        Ok(state) => state,
        Err(result) => return result,
    };
    let status = &state.status;

    let base = match detect_base_branch(&status.local_branches, opts.base_branch.as_deref()) {
        Some(base) => base,
        None => {
            let mut result = base_result(repo, root, StatusCode::Error, std::time::Duration::ZERO);
            result.message = Some("could not detect a base branch (main/master/develop) and none was given".into());
            return result;
        }
    };

    // Fetched separately rather than filtered out of one combined list:
    // local branch names routinely contain `/` themselves (`feature/done`,
    // `release/1.0`), so a remote-tracking ref can only be told apart from a
    // local one by which namespace `for-each-ref` found it in, not by its
    // name's shape.
    let local_branches = match gitops.list_branches(repo.as_path(), &BranchListOpts { include_remote: false }) {
        Ok(branches) => branches,
        Err(e) => {
            let mut result = base_result(repo, root, StatusCode::Error, std::time::Duration::ZERO);
            result.error = Some(crate::error::ErrorKind::from(&e));
            result.message = Some(e.to_string());
            return result;
        }
    };
    let all_refs = match gitops.list_branches(repo.as_path(), &BranchListOpts { include_remote: true }) {
        Ok(branches) => branches,
        Err(e) => {
            let mut result = base_result(repo, root, StatusCode::Error, std::time::Duration::ZERO);
            result.error = Some(crate::error::ErrorKind::from(&e));
            result.message = Some(e.to_string());
            return result;
        }
    };
    let local_names: std::collections::HashSet<&str> = local_branches.iter().map(|b| b.name.as_str()).collect();
    let remote_refs: std::collections::HashSet<&str> = all_refs
        .iter()
        .map(|b| b.name.as_str())
        .filter(|name| !local_names.contains(name))
        .collect();

    let current = status.branch.as_deref().unwrap_or("");
    let mut candidates: Vec<String> = Vec::new();

    for branch in &local_branches {
        if branch.name == current || is_protected(&branch.name, &opts.protect_patterns) {
            continue;
        }

        let merged = opts.include_merged
            && gitops
                .is_merged_into(repo.as_path(), &branch.name, &base)
                .unwrap_or(false);
        let stale = opts.include_stale && is_stale(branch, opts.stale_threshold);
        let gone = opts.include_gone
            && branch
                .upstream
                .as_deref()
                .map(|u| !remote_refs.contains(u))
                .unwrap_or(false);

        if merged || stale || gone {
            candidates.push(branch.name.clone());
        }
    }
    candidates.sort();

    if opts.common.dry_run {
        let mut result = base_result(repo, root, StatusCode::WouldCleanup, std::time::Duration::ZERO);
        result.branch = status.branch.clone();
        result.message = Some(format!("would delete: {}", candidates.join(", ")));
        return result;
    }

    let mut deleted = Vec::new();
    for name in &candidates {
        if gitops
            .delete_branch(repo.as_path(), &DeleteBranchOpts {
                name: name.clone(),
                remote: opts.delete_remote,
            })
            .is_ok()
        {
            deleted.push(name.clone());
        }
    }

    let mut result = base_result(repo, root, StatusCode::CleanedUp, std::time::Duration::ZERO);
    result.branch = status.branch.clone();
    result.message = Some(format!("deleted: {}", deleted.join(", ")));
    result
}
