//! A configurable in-memory [`GitOps`] fake for operation policy tests.
//!
//! Every method returns a canned value from a field on the struct; tests
//! set only the fields relevant to the scenario they're exercising and
//! leave the rest at their defaults.

use std::cell::Cell;
use std::path::Path;
use std::time::Duration;

use crate::error::CoreError;
use crate::gitops::{
    BranchInfo, BranchListOpts, CloneOpts, CmdOutput, CommitOpts, DeleteBranchOpts, DiffBundle, DiffOpts, FetchOpts,
    GitOps, PullOpts, PullOutcome, PushOpts, PushOutcome, RepoStatus,
};

pub struct FakeGitOps {
    pub is_repo_flag: bool,
    pub status_override: RepoStatus,
    /// `status()`'s `behind` field after `fetch()` has been called once.
    pub post_fetch_behind: Option<u32>,
    fetched: Cell<bool>,

    pub fetch_err: Option<CoreError>,
    pub pull_outcome: Option<Result<PullOutcome, CoreError>>,
    pub push_outcome: Option<Result<PushOutcome, CoreError>>,
    pub clone_result: Option<Result<(), CoreError>>,
    pub stash_pop_result: Option<Result<(), CoreError>>,
    pub commit_result: Option<Result<String, CoreError>>,
    pub diff_result: Option<DiffBundle>,
    pub branches: Vec<BranchInfo>,
    pub tags: Vec<String>,
    pub deleted_branches: Cell<u32>,
    pub merged_branches: Vec<String>,

    pub hook_result: Option<Result<CmdOutput, CoreError>>,
    pub hook_calls: std::cell::RefCell<Vec<Vec<String>>>,
    /// Counts `pull()` invocations, so dry-run tests can assert no mutation occurred.
    pub pull_calls: Cell<u32>,
    /// `no_fetch` from the most recent `pull()` call, so Update can be checked
    /// for passing it through instead of silently always hitting the network.
    pub last_pull_no_fetch: Cell<Option<bool>>,
}

impl FakeGitOps {
    pub fn new() -> Self {
        Self {
            is_repo_flag: true,
            status_override: RepoStatus::default(),
            post_fetch_behind: None,
            fetched: Cell::new(false),
            fetch_err: None,
            pull_outcome: None,
            push_outcome: None,
            clone_result: None,
            stash_pop_result: None,
            commit_result: None,
            diff_result: None,
            branches: Vec::new(),
            tags: Vec::new(),
            deleted_branches: Cell::new(0),
            merged_branches: Vec::new(),
            hook_result: None,
            hook_calls: std::cell::RefCell::new(Vec::new()),
            pull_calls: Cell::new(0),
            last_pull_no_fetch: Cell::new(None),
        }
    }
}

impl Default for FakeGitOps {
    fn default() -> Self {
        Self::new()
    }
}

impl GitOps for FakeGitOps {
    fn is_repo(&self, _path: &Path) -> bool {
        self.is_repo_flag
    }

    fn status(&self, _path: &Path) -> Result<RepoStatus, CoreError> {
        let mut status = self.status_override.clone();
        if self.fetched.get() {
            if let Some(behind) = self.post_fetch_behind {
                status.behind = behind;
            }
        }
        Ok(status)
    }

    fn fetch(&self, _path: &Path, _opts: &FetchOpts) -> Result<(), CoreError> {
        self.fetched.set(true);
        match &self.fetch_err {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn pull(&self, _path: &Path, opts: &PullOpts) -> Result<PullOutcome, CoreError> {
        self.pull_calls.set(self.pull_calls.get() + 1);
        self.last_pull_no_fetch.set(Some(opts.no_fetch));
        self.pull_outcome.clone().unwrap_or(Ok(PullOutcome::default()))
    }

    fn push(&self, _path: &Path, _opts: &PushOpts) -> Result<PushOutcome, CoreError> {
        self.push_outcome.clone().unwrap_or(Ok(PushOutcome::default()))
    }

    fn clone_repo(&self, _path: &Path, _opts: &CloneOpts) -> Result<(), CoreError> {
        self.clone_result.clone().unwrap_or(Ok(()))
    }

    fn list_branches(&self, _path: &Path, _opts: &BranchListOpts) -> Result<Vec<BranchInfo>, CoreError> {
        Ok(self.branches.clone())
    }

    fn delete_branch(&self, _path: &Path, _opts: &DeleteBranchOpts) -> Result<(), CoreError> {
        self.deleted_branches.set(self.deleted_branches.get() + 1);
        Ok(())
    }

    fn switch_branch(&self, _path: &Path, _branch: &str, _create: bool) -> Result<(), CoreError> {
        Ok(())
    }

    fn is_merged_into(&self, _path: &Path, branch: &str, _base: &str) -> Result<bool, CoreError> {
        Ok(self.merged_branches.contains(&branch.to_string()))
    }

    fn stash_save(&self, _path: &Path, _include_untracked: bool) -> Result<(), CoreError> {
        Ok(())
    }

    fn stash_list(&self, _path: &Path) -> Result<Vec<String>, CoreError> {
        Ok(Vec::new())
    }

    fn stash_pop(&self, _path: &Path) -> Result<(), CoreError> {
        self.stash_pop_result.clone().unwrap_or(Ok(()))
    }

    fn tag_create(&self, _path: &Path, _name: &str) -> Result<(), CoreError> {
        Ok(())
    }

    fn tag_list(&self, _path: &Path) -> Result<Vec<String>, CoreError> {
        Ok(self.tags.clone())
    }

    fn tag_push(&self, _path: &Path, _name: &str) -> Result<(), CoreError> {
        Ok(())
    }

    fn diff(&self, _path: &Path, _opts: &DiffOpts) -> Result<DiffBundle, CoreError> {
        Ok(self.diff_result.clone().unwrap_or_default())
    }

    fn commit(&self, _path: &Path, _opts: &CommitOpts) -> Result<String, CoreError> {
        self.commit_result.clone().unwrap_or(Ok("deadbeef".into()))
    }

    fn run_hook(&self, _path: &Path, argv: &[String], _timeout: Duration, _env: &[(String, String)]) -> Result<CmdOutput, CoreError> {
        self.hook_calls.borrow_mut().push(argv.to_vec());
        self.hook_result.clone().unwrap_or(Ok(CmdOutput {
            status_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }))
    }
}
