// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent starter: launches one worker process inside a window.
//!
//! In `MULTICLAUDE_TEST_MODE` the starter composes the prompt and returns a
//! fully-formed agent record without touching the child process.

use std::path::Path;
use std::time::Duration;

use mc_adapters::TerminalDriver;
use mc_core::{Agent, AgentKind, Clock, TrackMode};
use tracing::warn;

use crate::daemon::{Daemon, DaemonError};
use crate::prompts;

/// Wait after launching the child before reading the pane pid.
const STARTUP_DELAY: Duration = Duration::from_millis(500);

/// Extra wait before injecting the initial message, so the child's input
/// handling is up.
const INITIAL_MESSAGE_DELAY: Duration = Duration::from_secs(1);

/// Parameters for starting one agent in an existing window.
pub struct StartAgent<'a> {
    pub repo: &'a str,
    pub session: &'a str,
    pub window: &'a str,
    pub name: &'a str,
    pub kind: AgentKind,
    pub worktree_path: &'a Path,
    pub task: Option<String>,
    pub initial_message: Option<&'a str>,
    pub track_mode: TrackMode,
}

impl<T: TerminalDriver, C: Clock> Daemon<T, C> {
    /// Start a worker process in `params.window` and return its record.
    ///
    /// The returned pid is 0 when the pane pid could not be read (degraded
    /// but functional) and always 0 in test mode.
    pub async fn start_agent(&self, params: StartAgent<'_>) -> Result<Agent, DaemonError> {
        let session_id = uuid::Uuid::new_v4().to_string();

        let prompt_path = self.write_prompt(&params)?;
        self.copy_hooks_config(params.repo, params.worktree_path);
        self.start_output_capture(&params).await;

        let mut pid = 0u32;
        if !self.config.test_mode {
            let bin = self
                .config
                .worker_bin
                .as_ref()
                .ok_or(DaemonError::WorkerBinaryMissing)?;
            let command = format!(
                "{} --session-id {} --dangerously-skip-permissions --append-system-prompt-file {}",
                bin.display(),
                session_id,
                prompt_path.display(),
            );
            self.terminal
                .send_keys(params.session, params.window, &command)
                .await?;

            tokio::time::sleep(STARTUP_DELAY).await;
            pid = match self
                .terminal
                .get_pane_pid(params.session, params.window)
                .await
            {
                Ok(p) => p,
                Err(e) => {
                    warn!(agent = %params.name, error = %e, "could not read pane pid");
                    0
                }
            };

            if let Some(message) = params.initial_message {
                tokio::time::sleep(INITIAL_MESSAGE_DELAY).await;
                self.terminal
                    .send_keys_literal_with_enter(params.session, params.window, message)
                    .await?;
            }
        }

        Ok(Agent {
            name: params.name.to_string(),
            kind: params.kind,
            worktree_path: params.worktree_path.to_path_buf(),
            tmux_window: params.window.to_string(),
            session_id,
            pid,
            created_at_ms: self.clock.now_ms(),
            last_nudge_ms: 0,
            ready_for_cleanup: false,
            task: params.task,
        })
    }

    /// Compose and write the agent's prompt file, returning its path.
    fn write_prompt(&self, params: &StartAgent<'_>) -> Result<std::path::PathBuf, DaemonError> {
        let override_path = self
            .config
            .paths
            .repo_dir(params.repo)
            .join(".multiclaude")
            .join(prompts::override_file_name(params.kind));
        let override_text = std::fs::read_to_string(&override_path).ok();

        let prompt = prompts::compose(params.kind, params.track_mode, override_text.as_deref());

        let prompt_path = self.config.paths.prompt_file(params.name);
        if let Some(parent) = prompt_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&prompt_path, prompt)?;
        Ok(prompt_path)
    }

    /// Copy `<repo>/.multiclaude/hooks.json` into the worktree's
    /// `.claude/settings.json`. Best-effort: a failed copy degrades the
    /// agent, it does not fail the start.
    fn copy_hooks_config(&self, repo: &str, worktree: &Path) {
        let hooks = self
            .config
            .paths
            .repo_dir(repo)
            .join(".multiclaude")
            .join("hooks.json");
        if !hooks.exists() {
            return;
        }

        let dest = worktree.join(".claude").join("settings.json");
        let copied = match dest.parent() {
            Some(parent) => {
                std::fs::create_dir_all(parent).and_then(|()| std::fs::copy(&hooks, &dest))
            }
            None => std::fs::copy(&hooks, &dest),
        };
        if let Err(e) = copied {
            warn!(repo = %repo, dest = %dest.display(), error = %e, "hook config copy failed");
        }
    }

    /// Begin pane capture to the agent's output log. Best-effort.
    async fn start_output_capture(&self, params: &StartAgent<'_>) {
        let log_path = if params.kind.owns_worktree() {
            self.config.paths.worker_log(params.repo, params.name)
        } else {
            self.config.paths.agent_log(params.repo, params.name)
        };
        if let Some(parent) = log_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(agent = %params.name, error = %e, "could not create output dir");
                return;
            }
        }
        if let Err(e) = self
            .terminal
            .start_pipe_pane(params.session, params.window, &log_path)
            .await
        {
            warn!(agent = %params.name, error = %e, "pane capture failed");
        }
    }
}

#[cfg(test)]
#[path = "starter_tests.rs"]
mod tests;
