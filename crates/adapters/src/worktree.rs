// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git worktree manager.
//!
//! Operates relative to a repository's primary checkout. Worker and review
//! agents get disposable worktrees; the `workspace` agent gets a long-lived
//! one on the `workspace/default` branch.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::process::Command;
use tracing::warn;

use crate::subprocess::{run_with_timeout, GIT_TIMEOUT};

/// Canonical branch for the workspace worktree.
pub const WORKSPACE_BRANCH: &str = "workspace/default";

/// Legacy singleton branch name, migrated to [`WORKSPACE_BRANCH`].
pub const LEGACY_WORKSPACE_BRANCH: &str = "workspace";

/// Errors from worktree operations.
#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error("git {context} failed: {stderr}")]
    GitFailed { context: String, stderr: String },

    #[error(
        "both '{legacy}' and '{canonical}' branches exist; \
         delete or rename one of them (e.g. `git branch -D {legacy}`) and retry"
    )]
    BranchConflict {
        legacy: &'static str,
        canonical: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One entry from `git worktree list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeEntry {
    pub path: PathBuf,
    pub branch: String,
}

/// Manager for the worktrees of one repository checkout.
#[derive(Debug, Clone)]
pub struct WorktreeManager {
    repo_dir: PathBuf,
}

impl WorktreeManager {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Run git in `dir`, surfacing stderr verbatim on failure.
    async fn git_in(&self, dir: &Path, args: &[&str]) -> Result<String, WorktreeError> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(dir).args(args);
        let context = args.join(" ");

        let output = run_with_timeout(cmd, GIT_TIMEOUT, &format!("git {context}"))
            .await
            .map_err(|e| WorktreeError::GitFailed {
                context: context.clone(),
                stderr: e,
            })?;

        if !output.status.success() {
            return Err(WorktreeError::GitFailed {
                context,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn git(&self, args: &[&str]) -> Result<String, WorktreeError> {
        let dir = self.repo_dir.clone();
        self.git_in(&dir, args).await
    }

    /// Attach a new worktree at `path` to an existing branch.
    pub async fn create(&self, path: &Path, branch: &str) -> Result<(), WorktreeError> {
        let path_str = path.display().to_string();
        self.git(&["worktree", "add", &path_str, branch]).await?;
        Ok(())
    }

    /// Create `branch` at `start` and check it out in a new worktree.
    pub async fn create_new_branch(
        &self,
        path: &Path,
        branch: &str,
        start: &str,
    ) -> Result<(), WorktreeError> {
        let path_str = path.display().to_string();
        self.git(&["worktree", "add", "-b", branch, &path_str, start])
            .await?;
        Ok(())
    }

    pub async fn remove(&self, path: &Path, force: bool) -> Result<(), WorktreeError> {
        let path_str = path.display().to_string();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&path_str);
        self.git(&args).await?;
        Ok(())
    }

    /// All worktrees of the repository as `(path, branch)` pairs.
    /// Detached worktrees report an empty branch.
    pub async fn list(&self) -> Result<Vec<WorktreeEntry>, WorktreeError> {
        let stdout = self.git(&["worktree", "list", "--porcelain"]).await?;
        Ok(parse_worktree_list(&stdout))
    }

    /// Drop metadata for worktrees whose directories are gone.
    pub async fn prune(&self) -> Result<(), WorktreeError> {
        self.git(&["worktree", "prune"]).await?;
        Ok(())
    }

    /// Whether a local branch exists.
    pub async fn branch_exists(&self, branch: &str) -> bool {
        let refname = format!("refs/heads/{branch}");
        self.git(&["show-ref", "--verify", "--quiet", &refname])
            .await
            .is_ok()
    }

    pub async fn has_uncommitted_changes(&self, path: &Path) -> Result<bool, WorktreeError> {
        let stdout = self.git_in(path, &["status", "--porcelain"]).await?;
        Ok(!stdout.trim().is_empty())
    }

    /// Whether the worktree's branch has commits its upstream lacks.
    ///
    /// A branch with no upstream counts as unpushed: its commits exist
    /// nowhere else, so sweeps must treat the worktree as holding work.
    pub async fn has_unpushed_commits(&self, path: &Path) -> Result<bool, WorktreeError> {
        match self
            .git_in(path, &["rev-list", "--count", "@{upstream}..HEAD"])
            .await
        {
            Ok(stdout) => Ok(stdout.trim().parse::<u64>().unwrap_or(0) > 0),
            Err(_) => Ok(true),
        }
    }

    pub async fn get_current_branch(&self, path: &Path) -> Result<String, WorktreeError> {
        let stdout = self.git_in(path, &["branch", "--show-current"]).await?;
        Ok(stdout.trim().to_string())
    }

    /// Remove directories under `root_dir` that no live worktree entry
    /// claims (paths compared after resolving symlinks). Returns the
    /// removed paths.
    pub async fn cleanup_orphaned(&self, root_dir: &Path) -> Result<Vec<PathBuf>, WorktreeError> {
        if !root_dir.exists() {
            return Ok(Vec::new());
        }

        let live: Vec<PathBuf> = self
            .list()
            .await?
            .into_iter()
            .map(|entry| entry.path.canonicalize().unwrap_or(entry.path))
            .collect();

        let mut removed = Vec::new();
        for entry in std::fs::read_dir(root_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let path = entry.path();
            let resolved = path.canonicalize().unwrap_or_else(|_| path.clone());
            if live.iter().any(|l| *l == resolved) {
                continue;
            }
            match std::fs::remove_dir_all(&path) {
                Ok(()) => removed.push(path),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove orphaned worktree dir"),
            }
        }
        Ok(removed)
    }

    /// Rename the legacy singleton `workspace` branch to
    /// `workspace/default`. Returns true when a migration happened.
    ///
    /// If both branches exist the state is ambiguous and a human has to
    /// resolve it; the manager refuses to guess.
    pub async fn migrate_legacy_workspace_branch(&self) -> Result<bool, WorktreeError> {
        let legacy = self.branch_exists(LEGACY_WORKSPACE_BRANCH).await;
        let canonical = self.branch_exists(WORKSPACE_BRANCH).await;

        match (legacy, canonical) {
            (true, true) => Err(WorktreeError::BranchConflict {
                legacy: LEGACY_WORKSPACE_BRANCH,
                canonical: WORKSPACE_BRANCH,
            }),
            (true, false) => {
                self.git(&["branch", "-m", LEGACY_WORKSPACE_BRANCH, WORKSPACE_BRANCH])
                    .await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Parse `git worktree list --porcelain` output into entries.
fn parse_worktree_list(stdout: &str) -> Vec<WorktreeEntry> {
    let mut entries = Vec::new();
    let mut path: Option<PathBuf> = None;
    let mut branch = String::new();

    for line in stdout.lines() {
        if let Some(p) = line.strip_prefix("worktree ") {
            if let Some(done) = path.take() {
                entries.push(WorktreeEntry {
                    path: done,
                    branch: std::mem::take(&mut branch),
                });
            }
            path = Some(PathBuf::from(p));
        } else if let Some(b) = line.strip_prefix("branch ") {
            branch = b
                .strip_prefix("refs/heads/")
                .unwrap_or(b)
                .to_string();
        }
    }
    if let Some(done) = path {
        entries.push(WorktreeEntry { path: done, branch });
    }
    entries
}

#[cfg(test)]
#[path = "worktree_tests.rs"]
mod tests;
