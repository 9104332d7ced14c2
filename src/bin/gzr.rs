//! Thin CLI wrapper around the `gzr` library (spec §6.1).
//!
//! Parses flags, builds the matching `Options`/`HealthOptions` record, calls
//! straight into one of the library's five entry points, and prints one
//! neutral summary line per repository. No JSON/tabular/LLM formatters here —
//! those are a formatter's job, not this binary's.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use gzr::gitops::ProcessGitOps;
use gzr::model::{
    CloneStrategy, CommonOptions, FetchOptions, HealthOptions, Options, PullOptions, PullStrategy as LibPullStrategy,
    PushOptions, RepoFilter,
};
use gzr::runner::CancelToken;
use gzr::styling;

#[derive(Parser)]
#[command(name = "gzr", about = "Bulk git operations across many local working trees", version)]
struct Cli {
    /// Root directory to scan for working trees.
    #[arg(short = 'C', long = "dir", global = true, default_value = ".")]
    dir: PathBuf,
    /// Maximum concurrent operations (defaults to 2x available cores).
    #[arg(long, global = true)]
    parallel: Option<usize>,
    /// Only operate on repositories whose relative path matches this regex.
    #[arg(long, global = true)]
    include: Option<String>,
    /// Skip repositories whose relative path matches this regex.
    #[arg(long, global = true)]
    exclude: Option<String>,
    /// How many directory levels to descend while scanning.
    #[arg(long, global = true, default_value_t = 3)]
    max_depth: u32,
    /// Classify without mutating anything.
    #[arg(long, global = true)]
    dry_run: bool,
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every remote without merging.
    Fetch {
        #[arg(long)]
        all_remotes: bool,
        #[arg(long)]
        prune: bool,
        #[arg(long)]
        tags: bool,
    },
    /// Fetch and integrate upstream changes.
    Pull {
        #[arg(long, value_enum, default_value_t = PullStrategyArg::Merge)]
        strategy: PullStrategyArg,
        #[arg(long)]
        prune: bool,
        #[arg(long)]
        tags: bool,
        #[arg(long)]
        stash: bool,
    },
    /// Push local commits to the upstream remote (force-with-lease only, never naked force).
    Push {
        #[arg(long)]
        force: bool,
        #[arg(long)]
        set_upstream: bool,
        #[arg(long)]
        tags: bool,
        #[arg(long)]
        refspec: Option<String>,
        #[arg(long)]
        all_remotes: bool,
    },
    /// Diagnostic health check (network reachability, divergence, work-tree state).
    Status {
        #[arg(long)]
        skip_fetch: bool,
    },
    /// Clone (or update) every repository named in a clone-plan document.
    Clone {
        /// Path to the YAML clone-plan document.
        plan: PathBuf,
        #[arg(long, value_enum)]
        strategy: Option<CloneStrategyArg>,
    },
    /// Configuration inspection.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the resolved effective configuration and each field's source layer.
    Show,
}

#[derive(Clone, Copy, ValueEnum)]
enum PullStrategyArg {
    Merge,
    Rebase,
    FfOnly,
}

impl std::fmt::Display for PullStrategyArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PullStrategyArg::Merge => "merge",
            PullStrategyArg::Rebase => "rebase",
            PullStrategyArg::FfOnly => "ff-only",
        };
        write!(f, "{s}")
    }
}

impl From<PullStrategyArg> for LibPullStrategy {
    fn from(v: PullStrategyArg) -> Self {
        match v {
            PullStrategyArg::Merge => LibPullStrategy::Merge,
            PullStrategyArg::Rebase => LibPullStrategy::Rebase,
            PullStrategyArg::FfOnly => LibPullStrategy::FfOnly,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CloneStrategyArg {
    Skip,
    Pull,
    Reset,
    Rebase,
    Fetch,
}

impl From<CloneStrategyArg> for CloneStrategy {
    fn from(v: CloneStrategyArg) -> Self {
        match v {
            CloneStrategyArg::Skip => CloneStrategy::Skip,
            CloneStrategyArg::Pull => CloneStrategy::Pull,
            CloneStrategyArg::Reset => CloneStrategy::Reset,
            CloneStrategyArg::Rebase => CloneStrategy::Rebase,
            CloneStrategyArg::Fetch => CloneStrategy::Fetch,
        }
    }
}

fn build_filter(cli: &Cli) -> anyhow::Result<RepoFilter> {
    Ok(RepoFilter {
        include: cli.include.as_deref().map(regex::Regex::new).transpose().context("invalid --include regex")?,
        exclude: cli.exclude.as_deref().map(regex::Regex::new).transpose().context("invalid --exclude regex")?,
        max_depth: cli.max_depth,
        include_submodules: false,
    })
}

fn build_common(cli: &Cli, filter: RepoFilter) -> CommonOptions {
    CommonOptions {
        parallel: cli.parallel.unwrap_or_else(gzr::runner::default_parallelism),
        dry_run: cli.dry_run,
        verbose: cli.verbose,
        filter,
        progress: None,
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let filter = build_filter(&cli)?;
    let root = dunce::canonicalize(&cli.dir).with_context(|| format!("cannot access {}", cli.dir.display()))?;
    let gitops = ProcessGitOps::new();
    let cancel = CancelToken::new();

    match &cli.command {
        Command::Fetch { all_remotes, prune, tags } => {
            let opts = Options::Fetch(FetchOptions {
                common: build_common(&cli, filter),
                all_remotes: *all_remotes,
                prune: *prune,
                tags: *tags,
            });
            run_and_print(&gitops, &root, &opts, &cancel)
        }
        Command::Pull { strategy, prune, tags, stash } => {
            let opts = Options::Pull(PullOptions {
                common: build_common(&cli, filter),
                strategy: (*strategy).into(),
                prune: *prune,
                tags: *tags,
                stash: *stash,
            });
            run_and_print(&gitops, &root, &opts, &cancel)
        }
        Command::Push {
            force,
            set_upstream,
            tags,
            refspec,
            all_remotes,
        } => {
            let opts = Options::Push(PushOptions {
                common: build_common(&cli, filter),
                force: *force,
                set_upstream: *set_upstream,
                tags: *tags,
                refspec: refspec.clone(),
                remotes: Vec::new(),
                all_remotes: *all_remotes,
            });
            run_and_print(&gitops, &root, &opts, &cancel)
        }
        Command::Status { skip_fetch } => {
            let opts = HealthOptions {
                common: build_common(&cli, filter),
                skip_fetch: *skip_fetch,
                per_fetch_timeout: None,
            };
            let report = gzr::check_health(&gitops, &root, &opts, &cancel)?;
            for r in &report.results {
                let message = r.recommendation.as_deref();
                println!("{}", styling::format_summary_line(&r.rel_path, status_for_health(r.health), message));
            }
            log::info!(
                "{} healthy, {} warning, {} error, {} unreachable",
                report.summary.healthy,
                report.summary.warning,
                report.summary.error,
                report.summary.unreachable
            );
            if report.summary.error > 0 || report.summary.unreachable > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Clone { plan, strategy } => {
            let yaml = std::fs::read_to_string(plan).with_context(|| format!("cannot read {}", plan.display()))?;
            let planned = gzr::compile_clone_plan(&yaml, &root, (*strategy).map(Into::into))?;
            let common = build_common(&cli, filter);
            let bulk = gzr::run_clone_plan(&gitops, &root, &planned, &common, &cancel)?;
            print_bulk(&bulk);
            exit_for(&bulk)
        }
        Command::Config { action } => match action {
            ConfigCommand::Show => {
                let layers = gzr::config::ConfigLayer::default();
                let effective = gzr::resolve_config(&layers);
                println!("parallel = {} ({})", effective.parallel, effective.source_map["parallel"]);
                println!("max_depth = {} ({})", effective.max_depth, effective.source_map["max_depth"]);
                if let Some(token) = &effective.token {
                    println!("token = {}", gzr::config::resolver::sanitize_token(token));
                }
                Ok(())
            }
        },
    }
}

fn status_for_health(health: gzr::model::HealthStatus) -> gzr::model::StatusCode {
    use gzr::model::{HealthStatus, StatusCode};
    match health {
        HealthStatus::Healthy => StatusCode::Clean,
        HealthStatus::Warning => StatusCode::Dirty,
        HealthStatus::Error => StatusCode::Error,
        HealthStatus::Unreachable => StatusCode::Unreachable,
    }
}

fn run_and_print(gitops: &ProcessGitOps, root: &std::path::Path, opts: &Options, cancel: &CancelToken) -> anyhow::Result<()> {
    let bulk = gzr::run_bulk(gitops, root, opts, cancel)?;
    print_bulk(&bulk);
    exit_for(&bulk)
}

fn print_bulk(bulk: &gzr::model::BulkResult) {
    for r in &bulk.repositories {
        println!("{}", styling::format_summary_line(&r.rel_path, r.status, r.message.as_deref()));
    }
}

fn exit_for(bulk: &gzr::model::BulkResult) -> anyhow::Result<()> {
    use gzr::model::StatusCode;
    let failed = bulk
        .repositories
        .iter()
        .any(|r| matches!(r.status, StatusCode::Error | StatusCode::Conflict));
    if failed {
        std::process::exit(1);
    }
    Ok(())
}
