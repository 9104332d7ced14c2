//! Generic parallel executor (spec §4.2).
//!
//! Flattens every discovered repository into a single `rayon` work queue —
//! the same flat-parallelism shape the teacher's `list/collect` module uses
//! for its per-worktree task queue — rather than nesting a pool per
//! directory. Results stream back over a `crossbeam-channel` so the progress
//! callback can fire as each repository finishes, while the final aggregate
//! is reassembled in input order regardless of completion order.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel as chan;

use crate::model::{CommonOptions, RepoPath, RepositoryResult};

/// Default worker count, mirroring the teacher's "2x CPU cores unless
/// RAYON_NUM_THREADS is set" default.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism().map(|n| n.get() * 2).unwrap_or(4)
}

/// Cooperative cancellation flag shared between a [`crate::watch::WatchDriver`]
/// (or a signal handler) and in-flight operations.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run `op` over every repository in `repos`, bounded to `common.parallel`
/// concurrent operations, reporting progress via `common.progress` and
/// honoring `cancel`.
///
/// Results are returned in the same order as `repos`, independent of which
/// finished first — formatters and tests depend on index-stable output
/// (spec §8 "Determinism").
pub fn run_bulk<F>(repos: &[RepoPath], common: &CommonOptions, cancel: &CancelToken, op: F) -> (Vec<RepositoryResult>, std::time::Duration)
where
    F: Fn(&RepoPath) -> RepositoryResult + Send + Sync,
{
    let t0 = Instant::now();
    let total = repos.len();
    let completed = AtomicUsize::new(0);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(common.parallel.max(1))
        .build()
        .expect("failed to build worker pool");

    let (tx, rx) = chan::unbounded::<(usize, RepositoryResult)>();

    pool.scope(|scope| {
        for (idx, repo) in repos.iter().enumerate() {
            let tx = tx.clone();
            let op = &op;
            let cancel = cancel.clone();
            let completed = &completed;
            let progress = common.progress.clone();
            scope.spawn(move |_| {
                let result = if cancel.is_canceled() {
                    canceled_result(repo)
                } else {
                    op(repo)
                };
                let n = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(cb) = &progress {
                    cb(n, total, repo.as_path().to_string_lossy().as_ref());
                }
                let _ = tx.send((idx, result));
            });
        }
    });
    drop(tx);

    let mut ordered: Vec<Option<RepositoryResult>> = (0..total).map(|_| None).collect();
    for (idx, result) in rx.iter() {
        ordered[idx] = Some(result);
    }

    let results: Vec<RepositoryResult> = ordered.into_iter().flatten().collect();
    (results, t0.elapsed())
}

fn canceled_result(repo: &RepoPath) -> RepositoryResult {
    let rel = repo.to_string();
    RepositoryResult::new(
        rel.clone(),
        rel,
        crate::model::StatusCode::Canceled,
        std::time::Duration::ZERO,
    )
}
