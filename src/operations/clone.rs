//! Clone plan execution policy (spec §4.5 "Execute").
//!
//! Operates on an already-compiled [`PlannedClone`] (see `crate::config::plan`),
//! not on the raw [`crate::model::CloneSpec`] document — cascading, strategy
//! precedence, and destination-uniqueness validation all happen upstream, in
//! the compiler.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{CoreError, ErrorKind};
use crate::gitops::{CloneOpts, FetchOpts, GitOps, PullOpts, PullStrategyArg};
use crate::model::{CloneStrategy, PlannedClone, RepoPath, RepositoryResult, StatusCode};

const HOOK_TIMEOUT: Duration = Duration::from_secs(30);

pub fn run(gitops: &dyn GitOps, planned: &PlannedClone, root: &Path, dry_run: bool) -> RepositoryResult {
    let t0 = Instant::now();
    let repo = RepoPath::new(planned.destination.clone());

    if !planned.destination.exists() {
        return clone_fresh(gitops, planned, &repo, root, t0, dry_run);
    }

    if !gitops.is_repo(&planned.destination) {
        return error_result(&repo, root, t0.elapsed(), ErrorKind::DestinationOccupied, format!(
            "{} exists and is not a git working tree",
            planned.destination.display()
        ));
    }

    if planned.strategy == CloneStrategy::Skip {
        let mut result = base_result(&repo, root, StatusCode::Skipped, t0.elapsed());
        result.message = Some("destination already exists, strategy=skip".into());
        return result;
    }

    if dry_run {
        let mut result = base_result(&repo, root, StatusCode::WouldUpdate, t0.elapsed());
        result.message = Some(format!("would update via {}", planned.strategy));
        return result;
    }

    if let Err((kind, message)) = run_before_hooks(gitops, planned) {
        return error_result(&repo, root, t0.elapsed(), kind, message);
    }

    if let Err(e) = update_existing(gitops, planned) {
        return error_result(&repo, root, t0.elapsed(), ErrorKind::from(&e), e.to_string());
    }

    if let Err((kind, message)) = run_after_hooks(gitops, planned) {
        return error_result(&repo, root, t0.elapsed(), kind, message);
    }

    let mut result = base_result(&repo, root, StatusCode::Updated, t0.elapsed());
    result.message = Some(format!("updated via {}", planned.strategy));
    result
}

fn clone_fresh(gitops: &dyn GitOps, planned: &PlannedClone, repo: &RepoPath, root: &Path, t0: Instant, dry_run: bool) -> RepositoryResult {
    if dry_run {
        let mut result = base_result(repo, root, StatusCode::WouldClone, t0.elapsed());
        result.message = Some(planned.url.clone());
        return result;
    }

    if let Some(parent) = planned.destination.parent()
        && !parent.exists()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        return error_result(repo, root, t0.elapsed(), ErrorKind::Other, format!("could not create {}: {e}", parent.display()));
    }

    if let Err((kind, message)) = run_before_hooks(gitops, planned) {
        return error_result(repo, root, t0.elapsed(), kind, message);
    }

    let clone_opts = CloneOpts {
        url: planned.url.clone(),
        branch: planned.branch.clone(),
        depth: planned.depth,
        single_branch: planned.depth.is_some(),
        submodules: false,
    };
    if let Err(e) = gitops.clone_repo(&planned.destination, &clone_opts) {
        return error_result(repo, root, t0.elapsed(), ErrorKind::from(&e), e.to_string());
    }

    if let Err((kind, message)) = run_after_hooks(gitops, planned) {
        return error_result(repo, root, t0.elapsed(), kind, message);
    }

    let mut result = base_result(repo, root, StatusCode::Cloned, t0.elapsed());
    result.message = Some(planned.url.clone());
    result
}

fn update_existing(gitops: &dyn GitOps, planned: &PlannedClone) -> Result<(), CoreError> {
    match planned.strategy {
        CloneStrategy::Skip => Ok(()),
        CloneStrategy::Fetch => gitops.fetch(&planned.destination, &FetchOpts::default()),
        CloneStrategy::Pull | CloneStrategy::Rebase => {
            if planned.strategy == CloneStrategy::Rebase {
                let status = gitops.status(&planned.destination)?;
                if status.modified > 0 {
                    return Err(CoreError::GitOperation(crate::error::GitOperationError::Dirty));
                }
            }
            gitops
                .pull(&planned.destination, &PullOpts {
                    strategy: PullStrategyArg::Rebase,
                    prune: false,
                    tags: false,
                    no_fetch: false,
                })
                .map(|_| ())
        }
        CloneStrategy::Reset => {
            gitops.fetch(&planned.destination, &FetchOpts::default())?;
            gitops
                .pull(&planned.destination, &PullOpts {
                    strategy: PullStrategyArg::FfOnly,
                    prune: false,
                    tags: false,
                    no_fetch: false,
                })
                .map(|_| ())
        }
    }
}

fn run_before_hooks(gitops: &dyn GitOps, planned: &PlannedClone) -> Result<(), (ErrorKind, String)> {
    let parent = planned.destination.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    run_hooks(gitops, &parent, &planned.hooks.before)
}

fn run_after_hooks(gitops: &dyn GitOps, planned: &PlannedClone) -> Result<(), (ErrorKind, String)> {
    run_hooks(gitops, &planned.destination, &planned.hooks.after)
}

fn run_hooks(gitops: &dyn GitOps, cwd: &Path, hooks: &[Vec<String>]) -> Result<(), (ErrorKind, String)> {
    for argv in hooks {
        if argv.is_empty() {
            continue;
        }
        match gitops.run_hook(cwd, argv, HOOK_TIMEOUT, &[]) {
            Ok(output) if output.success() => {}
            Ok(output) => {
                return Err((ErrorKind::HookFailure, format!("hook `{}` failed: {}", argv.join(" "), output.stderr)));
            }
            Err(e) => return Err((ErrorKind::from(&e), format!("hook `{}` failed: {e}", argv.join(" ")))),
        }
    }
    Ok(())
}

fn base_result(repo: &RepoPath, root: &Path, status: StatusCode, duration: Duration) -> RepositoryResult {
    let rel = repo.relative_to(root).to_string_lossy().into_owned();
    RepositoryResult::new(rel, repo.to_string(), status, duration)
}

fn error_result(repo: &RepoPath, root: &Path, duration: Duration, kind: ErrorKind, message: String) -> RepositoryResult {
    base_result(repo, root, StatusCode::Error, duration).with_error(kind, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Hooks;
    use crate::operations::test_support::FakeGitOps;

    fn planned(destination: PathBuf, strategy: CloneStrategy) -> PlannedClone {
        PlannedClone {
            url: "https://example.com/a.git".into(),
            destination,
            branch: None,
            depth: None,
            strategy,
            hooks: Hooks::default(),
        }
    }

    #[test]
    fn clones_into_missing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a");
        let gitops = FakeGitOps::new();
        let result = run(&gitops, &planned(dest, CloneStrategy::Skip), dir.path(), false);
        assert_eq!(result.status, StatusCode::Cloned);
    }

    #[test]
    fn skip_strategy_on_existing_repo_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a");
        std::fs::create_dir_all(&dest).unwrap();
        let gitops = FakeGitOps::new();
        let result = run(&gitops, &planned(dest, CloneStrategy::Skip), dir.path(), false);
        assert_eq!(result.status, StatusCode::Skipped);
    }

    #[test]
    fn occupied_non_repo_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a");
        std::fs::create_dir_all(&dest).unwrap();
        let mut gitops = FakeGitOps::new();
        gitops.is_repo_flag = false;
        let result = run(&gitops, &planned(dest, CloneStrategy::Skip), dir.path(), false);
        assert_eq!(result.status, StatusCode::Error);
        assert_eq!(result.error, Some(ErrorKind::DestinationOccupied));
    }

    #[test]
    fn hook_failure_aborts_and_marks_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a");
        let mut gitops = FakeGitOps::new();
        gitops.hook_result = Some(Ok(crate::gitops::CmdOutput {
            status_code: Some(1),
            stdout: String::new(),
            stderr: "not found".into(),
        }));
        let mut entry = planned(dest, CloneStrategy::Skip);
        entry.hooks.before = vec![vec!["missing-tool".into()]];
        let result = run(&gitops, &entry, dir.path(), false);
        assert_eq!(result.status, StatusCode::Error);
        assert_eq!(result.error, Some(ErrorKind::HookFailure));
    }

    #[test]
    fn dry_run_on_missing_destination_reports_would_clone_without_cloning() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a");
        let gitops = FakeGitOps::new();
        let result = run(&gitops, &planned(dest.clone(), CloneStrategy::Pull), dir.path(), true);
        assert_eq!(result.status, StatusCode::WouldClone);
        assert!(!dest.exists());
    }

    #[test]
    fn dry_run_on_existing_destination_reports_would_update() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a");
        std::fs::create_dir_all(&dest).unwrap();
        let gitops = FakeGitOps::new();
        let result = run(&gitops, &planned(dest, CloneStrategy::Pull), dir.path(), true);
        assert_eq!(result.status, StatusCode::WouldUpdate);
    }
}
