//! Concrete [`GitOps`] backed by a real `git` binary on `PATH`.

use std::path::Path;
use std::time::Duration;

use crate::error::{CoreError, GitOperationError, NetworkError};

use super::cmd::{Cmd, CmdOutput};
use super::parse::{parse_branch_lines, parse_status_v2};
use super::{
    BranchInfo, BranchListOpts, CloneOpts, CommitOpts, DeleteBranchOpts, DiffBundle, DiffOpts,
    FetchOpts, GitOps, PullOpts, PullOutcome, PullStrategyArg, PushOpts, PushOutcome, RepoStatus,
};

#[derive(Debug, Clone, Default)]
pub struct ProcessGitOps;

impl ProcessGitOps {
    pub fn new() -> Self {
        Self
    }

    fn git(&self, path: &Path) -> Cmd {
        Cmd::new("git", path)
    }

    fn run(&self, path: &Path, args: &[&str], context: Option<&str>) -> Result<CmdOutput, CoreError> {
        self.git(path)
            .args(args)
            .run(context)
            .map_err(|e| CoreError::GitOperation(GitOperationError::Other(e.to_string())))
    }

    fn classify_network_failure(stderr: &str) -> NetworkError {
        let lower = stderr.to_lowercase();
        if lower.contains("could not resolve host") {
            NetworkError::Dns
        } else if lower.contains("timed out") || lower.contains("timeout") {
            NetworkError::Timeout
        } else if lower.contains("authentication failed") || lower.contains("permission denied") || lower.contains("403") {
            NetworkError::AuthRequired
        } else if lower.contains("could not connect") || lower.contains("unreachable") || lower.contains("network is unreachable") {
            NetworkError::Unreachable
        } else {
            NetworkError::Other(stderr.trim().to_string())
        }
    }
}

impl GitOps for ProcessGitOps {
    fn is_repo(&self, path: &Path) -> bool {
        path.join(".git").exists()
    }

    fn status(&self, path: &Path) -> Result<RepoStatus, CoreError> {
        let out = self.run(path, &["status", "--porcelain=v2", "--branch"], None)?;
        let mut status = parse_status_v2(&out.stdout);

        let head = self.run(path, &["rev-parse", "HEAD"], None);
        status.head_sha = head.ok().map(|o| o.stdout.trim().to_string());

        let last_commit = self.run(path, &["log", "-1", "--format=%s"], None);
        status.last_commit = last_commit.ok().map(|o| o.stdout.trim().to_string());

        if let Ok(remotes_out) = self.run(path, &["remote"], None) {
            status.remotes = remotes_out
                .stdout
                .lines()
                .map(str::to_string)
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(branches_out) = self.run(path, &["for-each-ref", "--format=%(refname:short)", "refs/heads"], None) {
            status.local_branches = branches_out
                .stdout
                .lines()
                .map(str::to_string)
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(describe_out) = self.run(path, &["describe", "--tags", "--always"], None) {
            if describe_out.success() {
                status.describe = Some(describe_out.stdout.trim().to_string());
            }
        }

        if let Ok(stash_out) = self.run(path, &["stash", "list"], None) {
            status.stash_count = stash_out.stdout.lines().filter(|l| !l.is_empty()).count() as u32;
        }

        status.rebase_in_progress = path.join(".git/rebase-merge").exists() || path.join(".git/rebase-apply").exists();
        status.merge_in_progress = path.join(".git/MERGE_HEAD").exists();

        Ok(status)
    }

    fn fetch(&self, path: &Path, opts: &FetchOpts) -> Result<(), CoreError> {
        let mut args: Vec<&str> = vec!["fetch"];
        if opts.all_remotes {
            args.push("--all");
        }
        if opts.prune {
            args.push("--prune");
        }
        if opts.tags {
            args.push("--tags");
        }

        let out = self
            .git(path)
            .args(&args)
            .timeout(opts.timeout.unwrap_or(Duration::from_secs(60)))
            .run(None)
            .map_err(|e| match e {
                super::cmd::CmdError::TimedOut => CoreError::Network(NetworkError::Timeout),
                super::cmd::CmdError::Io(io) => CoreError::Network(NetworkError::Other(io.to_string())),
            })?;

        if !out.success() {
            return Err(CoreError::Network(Self::classify_network_failure(&out.stderr)));
        }
        Ok(())
    }

    fn pull(&self, path: &Path, opts: &PullOpts) -> Result<PullOutcome, CoreError> {
        let before = self.run(path, &["rev-parse", "HEAD"], None).ok();

        let out = if opts.no_fetch {
            // `git pull` always hits the network; integrating against the
            // remote-tracking ref already on disk means driving merge/rebase
            // directly instead.
            let args: Vec<&str> = match opts.strategy {
                PullStrategyArg::Merge => vec!["merge", "@{upstream}"],
                PullStrategyArg::Rebase => vec!["rebase", "@{upstream}"],
                PullStrategyArg::FfOnly => vec!["merge", "--ff-only", "@{upstream}"],
            };
            self.run(path, &args, None)?
        } else {
            let mut args: Vec<&str> = vec!["pull"];
            match opts.strategy {
                PullStrategyArg::Merge => {}
                PullStrategyArg::Rebase => args.push("--rebase"),
                PullStrategyArg::FfOnly => args.push("--ff-only"),
            }
            if opts.prune {
                args.push("--prune");
            }
            if opts.tags {
                args.push("--tags");
            }
            self.run(path, &args, None)?
        };

        if !out.success() {
            if out.stderr.contains("CONFLICT") || out.stdout.contains("CONFLICT") {
                return Err(CoreError::GitOperation(GitOperationError::Conflict));
            }
            if out.stderr.to_lowercase().contains("not possible to fast-forward") {
                return Err(CoreError::GitOperation(GitOperationError::FastForwardNotPossible));
            }
            return Err(CoreError::Network(Self::classify_network_failure(&out.stderr)));
        }

        let after = self.run(path, &["rev-parse", "HEAD"], None).ok();
        let fast_forwarded = out.stdout.contains("Fast-forward");
        let commits_applied = match (before, after) {
            (Some(b), Some(a)) if b.stdout != a.stdout => self
                .run(path, &["rev-list", "--count", &format!("{}..{}", b.stdout.trim(), a.stdout.trim())], None)
                .ok()
                .and_then(|o| o.stdout.trim().parse().ok())
                .unwrap_or(0),
            _ => 0,
        };

        Ok(PullOutcome {
            fast_forwarded,
            commits_applied,
            conflicted: false,
        })
    }

    fn push(&self, path: &Path, opts: &PushOpts) -> Result<PushOutcome, CoreError> {
        let remotes: Vec<&str> = if opts.remotes.is_empty() {
            vec!["origin"]
        } else {
            opts.remotes.iter().map(String::as_str).collect()
        };

        let mut rejected = false;
        let mut pushed_commits = 0u32;

        for remote in remotes {
            let mut args: Vec<&str> = vec!["push"];
            // Never a naked force: force is always expressed as force-with-lease.
            if opts.force_with_lease {
                args.push("--force-with-lease");
            }
            if opts.set_upstream {
                args.push("--set-upstream");
            }
            if opts.tags {
                args.push("--tags");
            }
            args.push(remote);
            if let Some(refspec) = &opts.refspec {
                args.push(refspec);
            }

            let out = self.run(path, &args, None)?;
            if !out.success() {
                if out.stderr.contains("[rejected]") || out.stderr.contains("stale info") {
                    rejected = true;
                    continue;
                }
                if out.stderr.contains("has no upstream branch") {
                    return Err(CoreError::GitOperation(GitOperationError::NoUpstream));
                }
                return Err(CoreError::Network(Self::classify_network_failure(&out.stderr)));
            }
            pushed_commits += 1;
        }

        Ok(PushOutcome { pushed_commits, rejected })
    }

    fn clone_repo(&self, path: &Path, opts: &CloneOpts) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CoreError::ConfigInvalid(format!("could not create `{}`: {e}", parent.display()))
            })?;
        }

        let mut args: Vec<String> = vec!["clone".into()];
        if let Some(branch) = &opts.branch {
            args.push("--branch".into());
            args.push(branch.clone());
        }
        if let Some(depth) = opts.depth {
            args.push("--depth".into());
            args.push(depth.to_string());
        }
        if opts.single_branch {
            args.push("--single-branch".into());
        }
        if opts.submodules {
            args.push("--recurse-submodules".into());
        }
        args.push(opts.url.clone());
        args.push(path.to_string_lossy().into_owned());

        let cwd = path.parent().unwrap_or(path);
        let args_ref: Vec<&str> = args.iter().map(String::as_str).collect();
        let out = self
            .git(cwd)
            .args(&args_ref)
            .timeout(Duration::from_secs(300))
            .run(None)
            .map_err(|e| match e {
                super::cmd::CmdError::TimedOut => CoreError::Network(NetworkError::Timeout),
                super::cmd::CmdError::Io(io) => CoreError::Network(NetworkError::Other(io.to_string())),
            })?;

        if !out.success() {
            return Err(CoreError::Network(Self::classify_network_failure(&out.stderr)));
        }
        Ok(())
    }

    fn list_branches(&self, path: &Path, opts: &BranchListOpts) -> Result<Vec<BranchInfo>, CoreError> {
        let refspec = if opts.include_remote { "refs/heads refs/remotes" } else { "refs/heads" };
        let format = "%(refname:short)\t%(objectname)\t%(upstream:short)\t%(HEAD)\t%(committerdate:iso-strict)";
        let mut args = vec!["for-each-ref", "--format", format];
        args.extend(refspec.split_whitespace());

        let out = self.run(path, &args, None)?;
        let head = self
            .run(path, &["rev-parse", "--abbrev-ref", "HEAD"], None)
            .map(|o| o.stdout.trim().to_string())
            .unwrap_or_default();
        Ok(parse_branch_lines(&out.stdout, &head))
    }

    fn delete_branch(&self, path: &Path, opts: &DeleteBranchOpts) -> Result<(), CoreError> {
        if opts.remote {
            self.run(path, &["push", "origin", "--delete", &opts.name], None)?;
        } else {
            self.run(path, &["branch", "-D", &opts.name], None)?;
        }
        Ok(())
    }

    fn is_merged_into(&self, path: &Path, branch: &str, base: &str) -> Result<bool, CoreError> {
        let out = self.run(path, &["merge-base", "--is-ancestor", branch, base], None)?;
        Ok(out.success())
    }

    fn switch_branch(&self, path: &Path, branch: &str, create: bool) -> Result<(), CoreError> {
        let args: Vec<&str> = if create {
            vec!["checkout", "-b", branch]
        } else {
            vec!["checkout", branch]
        };
        let out = self.run(path, &args, None)?;
        if !out.success() {
            return Err(CoreError::GitOperation(GitOperationError::Other(out.stderr)));
        }
        Ok(())
    }

    fn stash_save(&self, path: &Path, include_untracked: bool) -> Result<(), CoreError> {
        let mut args = vec!["stash", "push"];
        if include_untracked {
            args.push("--include-untracked");
        }
        self.run(path, &args, None)?;
        Ok(())
    }

    fn stash_list(&self, path: &Path) -> Result<Vec<String>, CoreError> {
        let out = self.run(path, &["stash", "list"], None)?;
        Ok(out.stdout.lines().map(str::to_string).filter(|l| !l.is_empty()).collect())
    }

    fn stash_pop(&self, path: &Path) -> Result<(), CoreError> {
        let out = self.run(path, &["stash", "pop"], None)?;
        if !out.success() {
            if out.stdout.contains("CONFLICT") || out.stderr.contains("CONFLICT") {
                return Err(CoreError::GitOperation(GitOperationError::Conflict));
            }
            return Err(CoreError::GitOperation(GitOperationError::Other(out.stderr)));
        }
        Ok(())
    }

    fn tag_create(&self, path: &Path, name: &str) -> Result<(), CoreError> {
        self.run(path, &["tag", name], None)?;
        Ok(())
    }

    fn tag_list(&self, path: &Path) -> Result<Vec<String>, CoreError> {
        let out = self.run(path, &["tag", "--list"], None)?;
        Ok(out.stdout.lines().map(str::to_string).filter(|l| !l.is_empty()).collect())
    }

    fn tag_push(&self, path: &Path, name: &str) -> Result<(), CoreError> {
        let out = self.run(path, &["push", "origin", name], None)?;
        if !out.success() {
            return Err(CoreError::Network(Self::classify_network_failure(&out.stderr)));
        }
        Ok(())
    }

    fn diff(&self, path: &Path, opts: &DiffOpts) -> Result<DiffBundle, CoreError> {
        let context = format!("-U{}", opts.context);
        let mut args: Vec<&str> = vec!["diff", "--numstat", &context];
        if opts.staged {
            args.push("--cached");
        }
        let numstat = self.run(path, &args, None)?;

        let mut args: Vec<&str> = vec!["diff", &context];
        if opts.staged {
            args.push("--cached");
        }
        let full = self.run(path, &args, None)?;

        let mut files = Vec::new();
        for line in numstat.stdout.lines() {
            let mut fields = line.split('\t');
            let additions: u32 = fields.next().and_then(|s| s.parse().ok()).unwrap_or(0);
            let deletions: u32 = fields.next().and_then(|s| s.parse().ok()).unwrap_or(0);
            let Some(file_path) = fields.next() else { continue };
            files.push(crate::model::ChangedFile {
                path: file_path.to_string(),
                additions,
                deletions,
                change_class: if additions > 0 && deletions == 0 {
                    "added"
                } else if deletions > 0 && additions == 0 {
                    "deleted"
                } else {
                    "modified"
                }
                .to_string(),
            });
        }

        if opts.include_untracked && !opts.staged {
            if let Ok(untracked_out) = self.run(path, &["ls-files", "--others", "--exclude-standard"], None) {
                for f in untracked_out.stdout.lines().filter(|l| !l.is_empty()) {
                    files.push(crate::model::ChangedFile {
                        path: f.to_string(),
                        additions: 0,
                        deletions: 0,
                        change_class: "added".to_string(),
                    });
                }
            }
        }

        let mut content = full.stdout;
        let mut truncated = false;
        if content.len() > opts.max_bytes {
            let cut = content[..opts.max_bytes]
                .rfind('\n')
                .unwrap_or(opts.max_bytes);
            content.truncate(cut);
            truncated = true;
        }

        Ok(DiffBundle { files, content, truncated })
    }

    fn commit(&self, path: &Path, opts: &CommitOpts) -> Result<String, CoreError> {
        if let Some(files) = &opts.files {
            let args: Vec<&str> = std::iter::once("add").chain(files.iter().map(String::as_str)).collect();
            self.run(path, &args, None)?;
        } else {
            self.run(path, &["add", "-A"], None)?;
        }

        let out = self.run(path, &["commit", "-m", &opts.message], None)?;
        if !out.success() {
            return Err(CoreError::GitOperation(GitOperationError::Other(out.stderr)));
        }

        let hash = self.run(path, &["rev-parse", "HEAD"], None)?;
        Ok(hash.stdout.trim().to_string())
    }

    fn run_hook(
        &self,
        path: &Path,
        argv: &[String],
        timeout: Duration,
        env: &[(String, String)],
    ) -> Result<CmdOutput, CoreError> {
        let Some((program, rest)) = argv.split_first() else {
            return Err(CoreError::HookFailure {
                command: String::new(),
                detail: "empty hook command".into(),
            });
        };

        let mut cmd = Cmd::new(program, path).args(rest).timeout(timeout);
        for (k, v) in env {
            cmd = cmd.env(k, v);
        }

        let out = cmd.run(None).map_err(|e| CoreError::HookFailure {
            command: argv.join(" "),
            detail: e.to_string(),
        })?;

        if !out.success() {
            return Err(CoreError::HookFailure {
                command: argv.join(" "),
                detail: out.stderr,
            });
        }
        Ok(out)
    }
}
