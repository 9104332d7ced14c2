//! Commit (bulk) policy (spec §4.3 "Commit").
//!
//! Two-phase by design: [`classify`] always runs in read-only mode and
//! produces a candidate result carrying a suggested message; [`commit_with_message`]
//! performs the actual commit once a caller (the CLI wrapper, after an
//! editor round-trip or a `--yes`) has settled on a final message per
//! repository. [`run`] wires the two together for the non-interactive case
//! (`yes`); interactive `edit` is the CLI wrapper's responsibility, since an
//! editor invocation isn't something the core can own.

use std::path::Path;

use crate::error::ErrorKind;
use crate::gitops::{CommitOpts as GitCommitOpts, DiffOpts, GitOps};
use crate::model::{ChangedFile, CommitOptions, RepoPath, RepositoryResult, StatusCode};

use super::common::{base_result, read_repo_state};

pub fn run(gitops: &dyn GitOps, repo: &RepoPath, root: &Path, opts: &CommitOptions) -> RepositoryResult {
    let candidate = classify(gitops, repo, root, opts);
    if candidate.status != StatusCode::WouldCommit {
        return candidate;
    }
    if !opts.yes {
        return candidate;
    }

    let message = resolve_message(repo, opts, candidate.message.as_deref());
    commit_with_message(gitops, repo, root, &message)
}

/// Phase 1: read-only classification. Always safe to call, including under
/// `dry_run`.
pub fn classify(gitops: &dyn GitOps, repo: &RepoPath, root: &Path, _opts: &CommitOptions) -> RepositoryResult {
    let state = match read_repo_state(gitops, repo, root) {
        Ok(state) => state,
        Err(result) => return result,
    };
    let status = &state.status;

    if status.modified == 0 && status.untracked == 0 {
        let mut result = base_result(repo, root, StatusCode::Clean, std::time::Duration::ZERO);
        result.branch = status.branch.clone();
        return result;
    }

    let bundle = gitops.diff(
        repo.as_path(),
        &DiffOpts {
            staged: false,
            include_untracked: true,
            context: 0,
            max_bytes: usize::MAX,
        },
    );

    let files = bundle.map(|b| b.files).unwrap_or_default();
    let mut result = base_result(repo, root, StatusCode::WouldCommit, std::time::Duration::ZERO);
    result.branch = status.branch.clone();
    result.files_changed = Some(files.len() as u32);
    result.message = Some(suggest_message(&files));
    result.changed_files = files;
    result
}

/// Phase 2: commit using an already-resolved message.
pub fn commit_with_message(gitops: &dyn GitOps, repo: &RepoPath, root: &Path, message: &str) -> RepositoryResult {
    match gitops.commit(repo.as_path(), &GitCommitOpts {
        message: message.to_string(),
        files: None,
    }) {
        Ok(hash) => {
            let mut result = base_result(repo, root, StatusCode::Success, std::time::Duration::ZERO);
            result.message = Some(format!("commit {hash}"));
            result
        }
        Err(e) => {
            let mut result = base_result(repo, root, StatusCode::Error, std::time::Duration::ZERO);
            result.error = Some(ErrorKind::from(&e));
            result.message = Some(e.to_string());
            result
        }
    }
}

fn resolve_message(repo: &RepoPath, opts: &CommitOptions, suggested: Option<&str>) -> String {
    if let Some(message) = opts.per_repo_messages.get(repo.as_path()) {
        return message.clone();
    }
    if let Some(message) = &opts.common_message {
        return message.clone();
    }
    suggested.map(str::to_string).unwrap_or_else(|| "update".to_string())
}

fn infer_commit_type(files: &[ChangedFile]) -> &'static str {
    let all_tests = files.iter().all(|f| f.path.contains("test") || f.path.contains("spec"));
    let all_docs = files.iter().all(|f| f.path.ends_with(".md") || f.path.starts_with("docs/"));
    let any_deleted = files.iter().any(|f| f.change_class == "deleted");
    let any_added = files.iter().any(|f| f.change_class == "added");

    if all_tests && !files.is_empty() {
        "test"
    } else if all_docs && !files.is_empty() {
        "docs"
    } else if any_added && !any_deleted {
        "feat"
    } else {
        "chore"
    }
}

fn common_directory_prefix(files: &[ChangedFile]) -> Option<String> {
    let mut components: Option<Vec<&str>> = None;
    for file in files {
        let path = Path::new(&file.path);
        let dirs: Vec<&str> = path
            .parent()
            .unwrap_or(Path::new(""))
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();
        components = Some(match components {
            None => dirs,
            Some(prev) => prev.into_iter().zip(dirs).take_while(|(a, b)| a == b).map(|(a, _)| a).collect(),
        });
    }
    let components = components?;
    if components.is_empty() {
        None
    } else {
        Some(components.join("/"))
    }
}

fn suggest_message(files: &[ChangedFile]) -> String {
    let kind = infer_commit_type(files);
    match common_directory_prefix(files) {
        Some(scope) if !scope.is_empty() => format!("{kind}({scope}): update {} file(s)", files.len()),
        _ => format!("{kind}: update {} file(s)", files.len()),
    }
}
