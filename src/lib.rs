//! `gzr`: bulk git operations across many local working trees, in parallel
//! (spec §1).
//!
//! The crate is a thin composition of five pieces — [`scanner`] discovers
//! working trees, [`runner`] fans an operation out across them, [`operations`]
//! holds each verb's policy, [`config`] resolves layered configuration and
//! compiles clone plans, and [`watch`] re-runs a bulk operation on a timer.
//! [`model`] is the neutral data contract between all of them; nothing
//! outside [`styling`] renders to a terminal. Five functions below are the
//! whole public surface a CLI needs (spec §6.1).

pub mod config;
pub mod error;
pub mod gitops;
pub mod model;
mod operations;
pub mod report;
pub mod runner;
pub mod scanner;
pub mod styling;
pub mod watch;

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;

use error::CoreError;
use gitops::GitOps;
use model::{
    BulkResult, CommonOptions, HealthOptions, HealthReport, HealthStatus, HealthSummary, Options, PlannedClone,
    RepoHealth, RepoPath,
};
use runner::CancelToken;

/// Scan `root`, then run the verb named by `opts` over every matching
/// repository in parallel, honoring `cancel` (spec §6.1 "run_bulk", §4.1–§4.3).
pub fn run_bulk(gitops: &dyn GitOps, root: &Path, opts: &Options, cancel: &CancelToken) -> Result<BulkResult, CoreError> {
    let common = opts.common();
    common.validate()?;
    let repos = scanner::scan(root, &common.filter)?;
    let total_scanned = repos.len();
    let (results, duration) = runner::run_bulk(&repos, common, cancel, |repo| operations::dispatch(gitops, repo, root, opts));
    Ok(report::summarize(total_scanned, results, duration))
}

fn canceled_health(repo: &RepoPath, root: &Path) -> RepoHealth {
    RepoHealth {
        rel_path: repo.relative_to(root).to_string_lossy().into_owned(),
        abs_path: repo.as_path().to_string_lossy().into_owned(),
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
        recommendation: Some("canceled".into()),
        fetch_duration: None,
        duration: std::time::Duration::ZERO,
    }
}

/// Run the diagnostic health check across every repository under `root`
/// (spec §6.1 "check_health", §4.4).
pub fn check_health(
    gitops: &dyn GitOps,
    root: &Path,
    opts: &HealthOptions,
    cancel: &CancelToken,
) -> Result<HealthReport, CoreError> {
    opts.common.validate()?;
    let t0 = Instant::now();
    let repos = scanner::scan(root, &opts.common.filter)?;
    let total = repos.len();
    let completed = std::sync::atomic::AtomicUsize::new(0);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.common.parallel.max(1))
        .build()
        .map_err(|e| CoreError::ConfigInvalid(format!("could not build worker pool: {e}")))?;

    let results: Vec<RepoHealth> = pool.install(|| {
        repos
            .par_iter()
            .map(|repo| {
                let health = if cancel.is_canceled() {
                    canceled_health(repo, root)
                } else {
                    operations::run_health(gitops, repo.as_path(), root, opts)
                };
                let n = completed.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
                if let Some(cb) = &opts.common.progress {
                    cb(n, total, repo.as_path().to_string_lossy().as_ref());
                }
                health
            })
            .collect()
    });

    let mut summary = HealthSummary::default();
    for r in &results {
        summary.total += 1;
        match r.health {
            HealthStatus::Healthy => summary.healthy += 1,
            HealthStatus::Warning => summary.warning += 1,
            HealthStatus::Error => summary.error += 1,
            HealthStatus::Unreachable => summary.unreachable += 1,
        }
    }

    Ok(HealthReport {
        results,
        summary,
        total_duration: t0.elapsed(),
        checked_at: chrono::Utc::now(),
    })
}

/// Parse, validate, and compile a clone plan document (spec §6.1
/// "compile_clone_plan", §4.5). `cli_dir` anchors relative destinations;
/// `cli_strategy` is the highest-priority strategy override.
pub fn compile_clone_plan(
    yaml: &str,
    cli_dir: &Path,
    cli_strategy: Option<model::CloneStrategy>,
) -> Result<Vec<PlannedClone>, CoreError> {
    let spec = config::parse_clone_spec(yaml)?;
    config::compile_clone_plan(&spec, cli_dir, cli_strategy)
}

/// Execute an already-compiled clone plan in parallel, honoring `cancel`
/// (spec §4.5 "Execute"). Destination paths, not a pre-existing scan, define
/// the work list — a clone plan may target directories that don't exist yet.
pub fn run_clone_plan(
    gitops: &dyn GitOps,
    root: &Path,
    planned: &[PlannedClone],
    common: &CommonOptions,
    cancel: &CancelToken,
) -> Result<BulkResult, CoreError> {
    common.validate()?;
    let t0 = Instant::now();
    let total = planned.len();
    let completed = std::sync::atomic::AtomicUsize::new(0);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(common.parallel.max(1))
        .build()
        .map_err(|e| CoreError::ConfigInvalid(format!("could not build worker pool: {e}")))?;

    let results: Vec<_> = pool.install(|| {
        planned
            .par_iter()
            .map(|entry| {
                let result = if cancel.is_canceled() {
                    let repo = RepoPath::new(entry.destination.clone());
                    model::RepositoryResult::new(
                        repo.relative_to(root).to_string_lossy().into_owned(),
                        repo.to_string(),
                        model::StatusCode::Canceled,
                        std::time::Duration::ZERO,
                    )
                } else {
                    operations::run_clone(gitops, entry, root, common.dry_run)
                };
                let n = completed.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
                if let Some(cb) = &common.progress {
                    cb(n, total, entry.destination.to_string_lossy().as_ref());
                }
                result
            })
            .collect()
    });

    Ok(report::summarize(total, results, t0.elapsed()))
}

/// Resolve layered configuration into an [`config::EffectiveConfig`] (spec
/// §6.1 "resolve_config", §4.6). Layers are read by the caller (the CLI
/// wrapper knows where `.gz-git.yaml` / `config.yaml` / profiles live);
/// this function only performs the precedence merge.
pub fn resolve_config(layers: &config::ConfigLayer) -> config::EffectiveConfig {
    let env = config::resolver::env_overlay();
    config::resolver::resolve(layers, &env)
}

/// Run `op` once immediately, then again on every `interval` tick until
/// canceled by SIGINT/SIGTERM or `cancel` (spec §6.1 "watch", §4.7).
pub fn watch<F>(interval: std::time::Duration, cancel: CancelToken, op: F) -> Result<(), CoreError>
where
    F: Fn() -> Result<(), CoreError>,
{
    let driver = watch::WatchDriver::new(interval, op, cancel)?;
    driver.run();
    Ok(())
}
