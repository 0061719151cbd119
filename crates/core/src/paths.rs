// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical filesystem layout under the per-user root.
//!
//! Everything the daemon and CLI touch lives under one root directory,
//! default `$HOME/.multiclaude/`, overridable with `MULTICLAUDE_DIR`.

use std::io;
use std::path::{Path, PathBuf};

/// Canonical paths under the multiclaude root.
#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the per-user root: `$MULTICLAUDE_DIR` if set, else
    /// `$HOME/.multiclaude`.
    pub fn resolve() -> Result<Self, crate::Error> {
        if let Some(dir) = std::env::var_os("MULTICLAUDE_DIR") {
            return Ok(Self::new(PathBuf::from(dir)));
        }
        let home = dirs::home_dir().ok_or_else(|| crate::Error::config(
            "could not determine home directory",
            Some("set MULTICLAUDE_DIR to choose a state directory explicitly"),
        ))?;
        Ok(Self::new(home.join(".multiclaude")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pid_file(&self) -> PathBuf {
        self.root.join("daemon.pid")
    }

    pub fn socket_path(&self) -> PathBuf {
        self.root.join("daemon.sock")
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join("daemon.log")
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join("state.json")
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.root.join("repos")
    }

    /// Primary checkout for a repository.
    pub fn repo_dir(&self, repo: &str) -> PathBuf {
        self.repos_dir().join(repo)
    }

    pub fn worktrees_dir(&self) -> PathBuf {
        self.root.join("wts")
    }

    /// Directory holding all of one repository's agent worktrees.
    pub fn repo_worktrees_dir(&self, repo: &str) -> PathBuf {
        self.worktrees_dir().join(repo)
    }

    /// Canonical per-agent worktree path.
    pub fn worktree_dir(&self, repo: &str, agent: &str) -> PathBuf {
        self.repo_worktrees_dir(repo).join(agent)
    }

    pub fn messages_dir(&self) -> PathBuf {
        self.root.join("messages")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    /// Pane-capture log for a system agent (supervisor, merge-queue, workspace).
    pub fn agent_log(&self, repo: &str, agent: &str) -> PathBuf {
        self.output_dir().join(repo).join(format!("{agent}.log"))
    }

    /// Pane-capture log for a worker or review agent.
    pub fn worker_log(&self, repo: &str, agent: &str) -> PathBuf {
        self.output_dir()
            .join(repo)
            .join("workers")
            .join(format!("{agent}.log"))
    }

    /// Per-agent ancillary config directory.
    pub fn claude_config_dir(&self, repo: &str, agent: &str) -> PathBuf {
        self.root.join("claude-config").join(repo).join(agent)
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.root.join("prompts")
    }

    /// Composed prompt file for one agent.
    pub fn prompt_file(&self, agent: &str) -> PathBuf {
        self.prompts_dir().join(format!("{agent}.md"))
    }

    /// Create the directories the daemon expects to exist.
    pub fn ensure_layout(&self) -> io::Result<()> {
        for dir in [
            self.root.clone(),
            self.repos_dir(),
            self.worktrees_dir(),
            self.messages_dir(),
            self.output_dir(),
            self.prompts_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
