// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session restoration.
//!
//! When a repository's session has disappeared but its checkout still exists
//! on disk, the daemon rebuilds the session from scratch: fresh supervisor,
//! merge-queue when enabled, and a workspace window when the workspace
//! worktree exists or can be created. Stale agent records are dropped first;
//! their windows are definitionally gone.

use std::path::PathBuf;

use mc_adapters::worktree::WORKSPACE_BRANCH;
use mc_adapters::{TerminalDriver, WorktreeError};
use mc_core::{AgentKind, Clock, Repository};
use tracing::{debug, info, warn};

use crate::daemon::{Daemon, DaemonError};
use crate::starter::StartAgent;

/// Window (and agent) names for the persistent agents.
pub const SUPERVISOR_WINDOW: &str = "supervisor";
pub const MERGE_QUEUE_WINDOW: &str = "merge-queue";
pub const WORKSPACE_WINDOW: &str = "workspace";

impl<T: TerminalDriver, C: Clock> Daemon<T, C> {
    /// Rebuild one repository's session. Any failure abandons the attempt;
    /// the next health pass retries (or cleans up if the checkout is gone).
    pub async fn restore_repo(&self, name: &str, repo: &Repository) -> Result<(), DaemonError> {
        let repo_path = self.config.paths.repo_dir(name);
        if !repo_path.exists() {
            return Err(DaemonError::RepoPathMissing(repo_path));
        }

        for agent_name in repo.agents.keys() {
            if let Err(e) = self.state.remove_agent(name, agent_name) {
                debug!(repo = %name, agent = %agent_name, error = %e, "stale agent already gone");
            }
        }

        let mq_config = repo.merge_queue_config();

        self.terminal
            .create_session(&repo.tmux_session, SUPERVISOR_WINDOW, &repo_path, true)
            .await?;

        let supervisor = self
            .start_agent(StartAgent {
                repo: name,
                session: &repo.tmux_session,
                window: SUPERVISOR_WINDOW,
                name: SUPERVISOR_WINDOW,
                kind: AgentKind::Supervisor,
                worktree_path: &repo_path,
                task: None,
                initial_message: None,
                track_mode: mq_config.track_mode,
            })
            .await?;
        self.state.add_agent(name, SUPERVISOR_WINDOW, supervisor)?;

        if mq_config.enabled {
            self.terminal
                .create_window(&repo.tmux_session, MERGE_QUEUE_WINDOW, &repo_path)
                .await?;
            let merge_queue = self
                .start_agent(StartAgent {
                    repo: name,
                    session: &repo.tmux_session,
                    window: MERGE_QUEUE_WINDOW,
                    name: MERGE_QUEUE_WINDOW,
                    kind: AgentKind::MergeQueue,
                    worktree_path: &repo_path,
                    task: None,
                    initial_message: None,
                    track_mode: mq_config.track_mode,
                })
                .await?;
            self.state.add_agent(name, MERGE_QUEUE_WINDOW, merge_queue)?;
        }

        // A workspace that cannot be created is not fatal: the session is
        // healthy without it and the next pass can try again.
        match self.ensure_workspace_worktree(name).await {
            Ok(worktree) => {
                self.terminal
                    .create_window(&repo.tmux_session, WORKSPACE_WINDOW, &worktree)
                    .await?;
                let workspace = self
                    .start_agent(StartAgent {
                        repo: name,
                        session: &repo.tmux_session,
                        window: WORKSPACE_WINDOW,
                        name: WORKSPACE_WINDOW,
                        kind: AgentKind::Workspace,
                        worktree_path: &worktree,
                        task: None,
                        initial_message: None,
                        track_mode: mq_config.track_mode,
                    })
                    .await?;
                self.state.add_agent(name, WORKSPACE_WINDOW, workspace)?;
            }
            Err(e) => {
                warn!(repo = %name, error = %e, "workspace worktree unavailable, skipping workspace agent");
            }
        }

        Ok(())
    }

    /// Ensure the canonical workspace worktree exists, attaching to an
    /// existing workspace branch when possible.
    async fn ensure_workspace_worktree(&self, repo: &str) -> Result<PathBuf, DaemonError> {
        let path = self.config.paths.worktree_dir(repo, WORKSPACE_WINDOW);
        if path.exists() {
            return Ok(path);
        }

        let manager = self.worktrees(repo);

        // Fold the legacy singleton branch into the canonical name. A
        // conflict needs a human; everything else is just a probe failure.
        match manager.migrate_legacy_workspace_branch().await {
            Ok(true) => info!(repo = %repo, "migrated legacy workspace branch"),
            Ok(false) => {}
            Err(e @ WorktreeError::BranchConflict { .. }) => return Err(e.into()),
            Err(e) => debug!(repo = %repo, error = %e, "legacy branch probe failed"),
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if manager.branch_exists(WORKSPACE_BRANCH).await {
            manager.create(&path, WORKSPACE_BRANCH).await?;
        } else {
            manager
                .create_new_branch(&path, WORKSPACE_BRANCH, "HEAD")
                .await?;
        }
        Ok(path)
    }
}

#[cfg(test)]
#[path = "restore_tests.rs"]
mod tests;
