//! Bounded-depth discovery of git working trees under a root directory
//! (spec §4.1, GLOSSARY "Scan Root", "Max Depth").
//!
//! Depth-first walk that records every working tree it finds and keeps
//! descending past it (so a repo nested inside another repo is still
//! discovered up to `max_depth`), except once a submodule is found, which
//! is suppressed — and not descended into — unless explicitly opted back in.
//! Unreadable directories are logged and skipped rather than aborting the
//! whole scan — one bad permission bit shouldn't sink a thousand-repo sweep.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::model::{RepoFilter, RepoPath};

/// Discover every working tree under `root` that passes `filter`.
///
/// Results are sorted by relative path for deterministic ordering across
/// runs and platforms (spec §8 "Determinism").
pub fn scan(root: &Path, filter: &RepoFilter) -> Result<Vec<RepoPath>, CoreError> {
    filter.validate()?;

    let canonical_root = dunce::canonicalize(root).map_err(|e| CoreError::ConfigInvalid(format!(
        "scan root `{}` is not accessible: {e}",
        root.display()
    )))?;

    let mut found = Vec::new();
    let mut visited = HashSet::new();
    walk(&canonical_root, &canonical_root, 0, filter, &mut visited, &mut found);
    found.sort_by(|a: &RepoPath, b: &RepoPath| a.as_path().cmp(b.as_path()));
    Ok(found)
}

fn is_git_repo(dir: &Path) -> bool {
    dir.join(".git").exists()
}

fn is_submodule(dir: &Path) -> bool {
    // A submodule working tree has a `.git` *file* (pointing at the
    // superproject's modules dir), never a `.git` directory.
    match fs::symlink_metadata(dir.join(".git")) {
        Ok(meta) => meta.is_file(),
        Err(_) => false,
    }
}

fn walk(
    root: &Path,
    dir: &Path,
    depth: u32,
    filter: &RepoFilter,
    visited: &mut HashSet<PathBuf>,
    out: &mut Vec<RepoPath>,
) {
    let Ok(canonical) = dunce::canonicalize(dir) else {
        log::warn!("skipping unreadable path: {}", dir.display());
        return;
    };
    if !visited.insert(canonical.clone()) {
        return; // symlink cycle
    }

    if is_git_repo(dir) {
        let submodule = is_submodule(dir);
        if submodule && !filter.include_submodules {
            return;
        }
        let rel = dir.strip_prefix(root).unwrap_or(dir);
        if filter.matches(rel) {
            out.push(RepoPath::new(dir.to_path_buf()));
        }
        // Submodule suppression already returned above; a non-submodule repo
        // (or one found with `include_submodules == true`) still gets
        // descended into, since nested repos beneath it are fair game up to
        // `max_depth` (spec §4.1).
    }

    if depth >= filter.max_depth {
        return;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("could not read directory {}: {e}", dir.display());
            return;
        }
    };

    let mut children: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else { continue };
        if file_type.is_dir() || file_type.is_symlink() {
            children.push(path);
        }
    }
    children.sort();

    for child in children {
        if !child.is_dir() {
            continue;
        }
        walk(root, &child, depth + 1, filter, visited, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_repo(path: &Path) {
        fs::create_dir_all(path.join(".git")).unwrap();
    }

    #[test]
    fn finds_repos_at_varying_depths() {
        let tmp = tempdir().unwrap();
        make_repo(&tmp.path().join("a"));
        make_repo(&tmp.path().join("b/c"));
        fs::create_dir_all(tmp.path().join("b/empty")).unwrap();

        let filter = RepoFilter::default();
        let found = scan(tmp.path(), &filter).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn respects_max_depth() {
        let tmp = tempdir().unwrap();
        make_repo(&tmp.path().join("a/b/c/d"));

        let filter = RepoFilter {
            max_depth: 2,
            ..Default::default()
        };
        let found = scan(tmp.path(), &filter).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn root_itself_as_repo_is_found() {
        let tmp = tempdir().unwrap();
        make_repo(tmp.path());

        let filter = RepoFilter::default();
        let found = scan(tmp.path(), &filter).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn suppresses_submodules_by_default() {
        let tmp = tempdir().unwrap();
        let repo = tmp.path().join("a");
        fs::create_dir_all(&repo).unwrap();
        fs::write(repo.join(".git"), "gitdir: ../.git/modules/a\n").unwrap();

        let filter = RepoFilter::default();
        let found = scan(tmp.path(), &filter).unwrap();
        assert!(found.is_empty());

        let filter_with_submodules = RepoFilter {
            include_submodules: true,
            ..Default::default()
        };
        let found = scan(tmp.path(), &filter_with_submodules).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn include_exclude_filters_apply_to_relative_path() {
        let tmp = tempdir().unwrap();
        make_repo(&tmp.path().join("keep"));
        make_repo(&tmp.path().join("skip"));

        let filter = RepoFilter {
            exclude: Some(regex::Regex::new("^skip$").unwrap()),
            ..Default::default()
        };
        let found = scan(tmp.path(), &filter).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].as_path().ends_with("keep"));
    }
}
