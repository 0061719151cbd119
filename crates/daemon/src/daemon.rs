// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon core: owns the periodic loops, cleanup, routing, and waking.
//!
//! Loops never hold the state-store lock across subprocess calls: each pass
//! snapshots the graph via `get_all_repos` and operates on the copy. Errors
//! inside a pass are logged and the pass moves to the next item; nothing
//! propagates out of a loop.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mc_adapters::{TerminalDriver, TerminalError, WorktreeError, WorktreeManager};
use mc_core::{Agent, AgentKind, Clock, MessageStatus, Repository};
use mc_storage::{MessageError, MessageStore, StateError, StateStore};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::env;
use crate::pidfile::pid_alive;

/// Interval shared by the health, routing, and wake loops.
pub const LOOP_INTERVAL: Duration = Duration::from_secs(120);

/// An agent is re-nudged once its last nudge is at least this old.
pub const NUDGE_INTERVAL_MS: u64 = 2 * 60 * 1000;

/// Marker prefixed to routed messages so recipients can spot injected mail.
pub const MAIL_MARKER: &str = "\u{1F4EC}";

/// Errors from daemon-core operations.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("repository path missing: {0}")]
    RepoPathMissing(PathBuf),

    #[error("worker binary not found")]
    WorkerBinaryMissing,

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("message error: {0}")]
    Message(#[from] MessageError),

    #[error("terminal error: {0}")]
    Terminal(#[from] TerminalError),

    #[error("worktree error: {0}")]
    Worktree(#[from] WorktreeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The control-plane core, shared by the listener and the loops.
pub struct Daemon<T: TerminalDriver, C: Clock> {
    pub config: Config,
    pub state: Arc<StateStore>,
    pub messages: Arc<MessageStore>,
    pub terminal: T,
    pub clock: C,
    /// Cancelling this stops every loop and the listener.
    pub cancel: CancellationToken,
    pub start_time: Instant,
}

/// Status-check prompt for a kind; workspaces are never nudged.
pub fn wake_prompt(kind: AgentKind) -> Option<&'static str> {
    match kind {
        AgentKind::Supervisor => {
            Some("Status check: Review worker progress and check merge queue.")
        }
        AgentKind::MergeQueue => Some("Status check: Review open PRs and check CI status."),
        AgentKind::Worker => Some("Status check: Update on your progress?"),
        AgentKind::Review => Some("Status check: Update on your review progress?"),
        AgentKind::Workspace => None,
    }
}

/// Loop interval, overridable for tests via `MULTICLAUDE_INTERVAL_MS`.
fn loop_interval() -> Duration {
    env::interval_override().unwrap_or(LOOP_INTERVAL)
}

impl<T: TerminalDriver, C: Clock> Daemon<T, C> {
    pub fn new(
        config: Config,
        state: Arc<StateStore>,
        messages: Arc<MessageStore>,
        terminal: T,
        clock: C,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            state,
            messages,
            terminal,
            clock,
            cancel: CancellationToken::new(),
            start_time: Instant::now(),
        })
    }

    /// Worktree manager for one repository's primary checkout.
    pub fn worktrees(&self, repo: &str) -> WorktreeManager {
        WorktreeManager::new(self.config.paths.repo_dir(repo))
    }

    /// Spawn the three periodic loops. Each runs a pass immediately, then
    /// every interval, until the shared token is cancelled.
    pub fn spawn_loops(self: &Arc<Self>) {
        let interval = loop_interval();

        let daemon = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = daemon.cancel.cancelled() => break,
                    _ = ticker.tick() => daemon.health_pass().await,
                }
            }
        });

        let daemon = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = daemon.cancel.cancelled() => break,
                    _ = ticker.tick() => daemon.route_pass().await,
                }
            }
        });

        let daemon = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = daemon.cancel.cancelled() => break,
                    _ = ticker.tick() => daemon.wake_pass().await,
                }
            }
        });
    }

    /// One health-check pass over every repository.
    pub async fn health_pass(&self) {
        for (name, repo) in self.state.get_all_repos() {
            let session_alive = match self.terminal.has_session(&repo.tmux_session).await {
                Ok(alive) => alive,
                Err(e) => {
                    warn!(repo = %name, error = %e, "session liveness check failed");
                    continue;
                }
            };

            if !session_alive {
                match self.restore_repo(&name, &repo).await {
                    Ok(()) => info!(repo = %name, session = %repo.tmux_session, "restored session"),
                    Err(e) => {
                        // Only a failed restoration marks the agents dead.
                        warn!(repo = %name, error = %e, "restoration failed, removing dead agents");
                        for agent_name in repo.agents.keys() {
                            if let Err(e) = self.state.remove_agent(&name, agent_name) {
                                debug!(repo = %name, agent = %agent_name, error = %e, "stale agent already gone");
                            }
                        }
                    }
                }
                continue;
            }

            for agent in repo.agents.values() {
                if agent.ready_for_cleanup {
                    info!(repo = %name, agent = %agent.name, "agent ready for cleanup");
                    self.cleanup_agent(&name, &repo, agent).await;
                    continue;
                }

                let window_alive = self
                    .terminal
                    .has_window(&repo.tmux_session, &agent.tmux_window)
                    .await
                    .unwrap_or(false);
                if !window_alive {
                    info!(repo = %name, agent = %agent.name, "window gone, cleaning up agent");
                    self.cleanup_agent(&name, &repo, agent).await;
                    continue;
                }

                // A dead pid alone is not grounds for cleanup: the user may
                // have restarted the child manually inside the window.
                if agent.pid != 0 && !pid_alive(agent.pid) {
                    warn!(
                        repo = %name,
                        agent = %agent.name,
                        pid = agent.pid,
                        "agent process appears dead; leaving window in place"
                    );
                }
            }

            self.sweep_repo(&name).await;
        }
    }

    /// Sweep one repository's orphaned worktree directories, dangling
    /// worktree metadata, and orphaned message directories.
    async fn sweep_repo(&self, name: &str) {
        let manager = self.worktrees(name);
        match manager
            .cleanup_orphaned(&self.config.paths.repo_worktrees_dir(name))
            .await
        {
            Ok(removed) if !removed.is_empty() => {
                info!(repo = %name, count = removed.len(), "removed orphaned worktree directories");
            }
            Ok(_) => {}
            Err(e) => debug!(repo = %name, error = %e, "worktree orphan sweep failed"),
        }
        if let Err(e) = manager.prune().await {
            debug!(repo = %name, error = %e, "worktree prune failed");
        }

        let valid: HashSet<String> = self
            .state
            .list_agents(name)
            .map(|v| v.into_iter().collect())
            .unwrap_or_default();
        if let Err(e) = self.messages.cleanup_orphaned(name, &valid) {
            warn!(repo = %name, error = %e, "message orphan sweep failed");
        }
    }

    /// Remove one agent: kill its window, drop it from state, reclaim its
    /// worktree (workers and reviews), and sweep orphaned message dirs.
    /// Every step is best-effort; cleanup must make progress.
    pub async fn cleanup_agent(&self, repo_name: &str, repo: &Repository, agent: &Agent) {
        if let Err(e) = self
            .terminal
            .stop_pipe_pane(&repo.tmux_session, &agent.tmux_window)
            .await
        {
            debug!(repo = %repo_name, agent = %agent.name, error = %e, "stop pane capture failed");
        }
        if let Err(e) = self
            .terminal
            .kill_window(&repo.tmux_session, &agent.tmux_window)
            .await
        {
            debug!(repo = %repo_name, agent = %agent.name, error = %e, "kill window failed");
        }

        if let Err(e) = self.state.remove_agent(repo_name, &agent.name) {
            debug!(repo = %repo_name, agent = %agent.name, error = %e, "agent already removed");
        }

        if agent.kind.owns_worktree() {
            let manager = self.worktrees(repo_name);

            // The worktree goes either way; unsaved work only changes what
            // we tell the operator.
            let dirty = manager
                .has_uncommitted_changes(&agent.worktree_path)
                .await
                .unwrap_or(false);
            let unpushed = manager
                .has_unpushed_commits(&agent.worktree_path)
                .await
                .unwrap_or(false);
            if dirty || unpushed {
                warn!(
                    repo = %repo_name,
                    agent = %agent.name,
                    worktree = %agent.worktree_path.display(),
                    dirty,
                    unpushed,
                    "removing worktree that still holds unmerged work"
                );
            }

            if let Err(e) = manager.remove(&agent.worktree_path, true).await {
                warn!(repo = %repo_name, agent = %agent.name, error = %e, "worktree removal failed");
            }
        }

        let valid: HashSet<String> = self
            .state
            .list_agents(repo_name)
            .map(|v| v.into_iter().collect())
            .unwrap_or_default();
        if let Err(e) = self.messages.cleanup_orphaned(repo_name, &valid) {
            warn!(repo = %repo_name, error = %e, "message orphan sweep failed");
        }
    }

    /// One routing pass: inject every pending message into its recipient's
    /// window and mark it delivered. Workspace agents are skipped.
    pub async fn route_pass(&self) {
        for (name, repo) in self.state.get_all_repos() {
            for agent in repo.agents.values() {
                if agent.kind.is_workspace() {
                    continue;
                }
                if !self.messages.has_pending(&name, &agent.name) {
                    continue;
                }

                let unread = match self.messages.list_unread(&name, &agent.name) {
                    Ok(messages) => messages,
                    Err(e) => {
                        warn!(repo = %name, agent = %agent.name, error = %e, "listing messages failed");
                        continue;
                    }
                };

                for message in unread
                    .into_iter()
                    .filter(|m| m.status == MessageStatus::Pending)
                {
                    let text =
                        format!("{MAIL_MARKER} Message from {}: {}", message.from, message.body);
                    match self
                        .terminal
                        .send_keys_literal_with_enter(&repo.tmux_session, &agent.tmux_window, &text)
                        .await
                    {
                        Ok(()) => {
                            if let Err(e) = self.messages.update_status(
                                &name,
                                &agent.name,
                                &message.id,
                                MessageStatus::Delivered,
                            ) {
                                warn!(repo = %name, agent = %agent.name, id = %message.id, error = %e, "marking message delivered failed");
                            }
                        }
                        Err(e) => {
                            warn!(repo = %name, agent = %agent.name, id = %message.id, error = %e, "message delivery failed");
                        }
                    }
                }
            }
        }
    }

    /// One wake pass: nudge every non-workspace agent whose last nudge is
    /// zero or at least [`NUDGE_INTERVAL_MS`] old.
    pub async fn wake_pass(&self) {
        let now = self.clock.now_ms();
        for (name, repo) in self.state.get_all_repos() {
            for agent in repo.agents.values() {
                let Some(prompt) = wake_prompt(agent.kind) else {
                    continue;
                };
                if agent.last_nudge_ms != 0
                    && now.saturating_sub(agent.last_nudge_ms) < NUDGE_INTERVAL_MS
                {
                    continue;
                }

                match self
                    .terminal
                    .send_keys_literal_with_enter(&repo.tmux_session, &agent.tmux_window, prompt)
                    .await
                {
                    Ok(()) => {
                        // Re-read before updating so a concurrent mutation
                        // (e.g. complete_agent) is not clobbered.
                        if let Some(mut latest) = self.state.get_agent(&name, &agent.name) {
                            latest.last_nudge_ms = now;
                            if let Err(e) = self.state.update_agent(&name, &agent.name, latest) {
                                warn!(repo = %name, agent = %agent.name, error = %e, "recording nudge failed");
                            }
                        }
                    }
                    Err(e) => {
                        debug!(repo = %name, agent = %agent.name, error = %e, "wake nudge failed");
                    }
                }
            }
        }
    }

    /// Repair inconsistencies the normal loops do not cover. Returns
    /// `(agents_removed, issues_fixed)`.
    pub async fn repair_state(&self) -> (u64, u64) {
        let mut agents_removed = 0u64;
        let mut issues_fixed = 0u64;

        for (name, repo) in self.state.get_all_repos() {
            let session_alive = self
                .terminal
                .has_session(&repo.tmux_session)
                .await
                .unwrap_or(false);

            for agent in repo.agents.values() {
                if session_alive {
                    let window_alive = self
                        .terminal
                        .has_window(&repo.tmux_session, &agent.tmux_window)
                        .await
                        .unwrap_or(false);
                    if !window_alive {
                        if self.state.remove_agent(&name, &agent.name).is_ok() {
                            agents_removed += 1;
                        }
                        continue;
                    }
                }

                if agent.session_id.is_empty() {
                    let mut fixed = agent.clone();
                    fixed.session_id = uuid::Uuid::new_v4().to_string();
                    if self.state.update_agent(&name, &agent.name, fixed).is_ok() {
                        issues_fixed += 1;
                    }
                }
            }
        }

        if let Some(current) = self.state.get_current_repo() {
            if self.state.get_repo(&current).is_none()
                && self.state.clear_current_repo().is_ok()
            {
                issues_fixed += 1;
            }
        }

        (agents_removed, issues_fixed)
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
