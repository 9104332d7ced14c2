//! Tag policy (spec §4.3 "Stash / Tag / Diff").

use std::path::Path;

use crate::error::ErrorKind;
use crate::gitops::GitOps;
use crate::model::{RepoPath, RepositoryResult, SemverBump, StatusCode, TagAction, TagOptions};

use super::common::{base_result, read_repo_state};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Semver(u64, u64, u64);

// NB: `Semver` must stay `Copy` — `next_version` reads `highest` twice after
// the `max_by_key` call below.

fn parse_semver(tag: &str) -> Option<Semver> {
    let rest = tag.strip_prefix('v').unwrap_or(tag);
    let mut parts = rest.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Semver(major, minor, patch))
}

fn next_version(tags: &[String], bump: SemverBump) -> String {
    let highest = tags.iter().filter_map(|t| parse_semver(t).map(|v| (v, t))).max_by_key(|(v, _)| *v);

    let Semver(major, minor, patch) = highest.map(|(v, _)| v).unwrap_or(Semver(0, 0, 0));
    let had_v_prefix = highest.map(|(_, t)| t.starts_with('v')).unwrap_or(true);

    let next = match bump {
        SemverBump::Major => Semver(major + 1, 0, 0),
        SemverBump::Minor => Semver(major, minor + 1, 0),
        SemverBump::Patch => Semver(major, minor, patch + 1),
    };

    if had_v_prefix {
        format!("v{}.{}.{}", next.0, next.1, next.2)
    } else {
        format!("{}.{}.{}", next.0, next.1, next.2)
    }
}

pub fn run(gitops: &dyn GitOps, repo: &RepoPath, root: &Path, opts: &TagOptions) -> RepositoryResult {
    let state = match read_repo_state(gitops, repo, root) {
        Ok(state) => state,
        Err(result) => return result,
    };
    let branch = state.status.branch.clone();

    let mut result = match &opts.action {
        TagAction::List | TagAction::Status => match gitops.tag_list(repo.as_path()) {
            Ok(tags) => {
                let mut result = base_result(repo, root, StatusCode::Listed, std::time::Duration::ZERO);
                result.message = Some(tags.join(", "));
                result
            }
            Err(e) => error_result(repo, root, &e),
        },
        TagAction::Create { name } => {
            if opts.common.dry_run {
                let mut result = base_result(repo, root, StatusCode::WouldTag, std::time::Duration::ZERO);
                result.message = Some(name.clone());
                return with_branch(result, branch);
            }
            match gitops.tag_create(repo.as_path(), name) {
                Ok(()) => {
                    let mut result = base_result(repo, root, StatusCode::Tagged, std::time::Duration::ZERO);
                    result.message = Some(name.clone());
                    result
                }
                Err(e) => error_result(repo, root, &e),
            }
        }
        TagAction::Auto { bump } => {
            let tags = match gitops.tag_list(repo.as_path()) {
                Ok(tags) => tags,
                Err(e) => return with_branch(error_result(repo, root, &e), branch),
            };
            let name = next_version(&tags, *bump);
            if opts.common.dry_run {
                let mut result = base_result(repo, root, StatusCode::WouldTag, std::time::Duration::ZERO);
                result.message = Some(name);
                return with_branch(result, branch);
            }
            match gitops.tag_create(repo.as_path(), &name) {
                Ok(()) => {
                    let mut result = base_result(repo, root, StatusCode::Tagged, std::time::Duration::ZERO);
                    result.message = Some(name);
                    result
                }
                Err(e) => error_result(repo, root, &e),
            }
        }
        TagAction::Push { name } => match gitops.tag_push(repo.as_path(), name) {
            Ok(()) => {
                let mut result = base_result(repo, root, StatusCode::Tagged, std::time::Duration::ZERO);
                result.message = Some(format!("pushed {name}"));
                result
            }
            Err(e) => error_result(repo, root, &e),
        },
    };

    result.branch = branch;
    result
}

fn with_branch(mut result: RepositoryResult, branch: Option<String>) -> RepositoryResult {
    result.branch = branch;
    result
}

fn error_result(repo: &RepoPath, root: &Path, err: &crate::error::CoreError) -> RepositoryResult {
    let mut result = base_result(repo, root, StatusCode::Error, std::time::Duration::ZERO);
    result.error = Some(ErrorKind::from(err));
    result.message = Some(err.to_string());
    result
}
