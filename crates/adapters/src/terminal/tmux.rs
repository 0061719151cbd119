// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux terminal driver

use super::{TerminalDriver, TerminalError};
use crate::subprocess::{run_with_timeout, TMUX_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Buffer name used to stage multi-line pastes.
const PASTE_BUFFER: &str = "mc-paste";

/// Tmux-based terminal driver
#[derive(Clone, Default)]
pub struct TmuxDriver;

impl TmuxDriver {
    pub fn new() -> Self {
        Self
    }

    /// Exact-match pane target. The leading `=` stops tmux from doing
    /// prefix matching on session names.
    fn target(session: &str, window: &str) -> String {
        format!("={session}:{window}")
    }

    /// Run tmux, surfacing stderr verbatim on failure.
    async fn tmux(&self, args: &[&str]) -> Result<String, TerminalError> {
        let mut cmd = Command::new("tmux");
        cmd.args(args);
        let description = format!("tmux {}", args.first().unwrap_or(&""));

        let output = run_with_timeout(cmd, TMUX_TIMEOUT, &description)
            .await
            .map_err(TerminalError::CommandFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TerminalError::CommandFailed(format!(
                "{description}: {}",
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run tmux where a non-zero exit is an answer, not an error
    /// (`has-session` and friends).
    async fn tmux_check(&self, args: &[&str]) -> Result<bool, TerminalError> {
        let mut cmd = Command::new("tmux");
        cmd.args(args);
        let description = format!("tmux {}", args.first().unwrap_or(&""));

        let output = run_with_timeout(cmd, TMUX_TIMEOUT, &description)
            .await
            .map_err(TerminalError::CommandFailed)?;
        Ok(output.status.success())
    }
}

#[async_trait]
impl TerminalDriver for TmuxDriver {
    async fn is_available(&self) -> bool {
        self.tmux_check(&["-V"]).await.unwrap_or(false)
    }

    async fn has_session(&self, session: &str) -> Result<bool, TerminalError> {
        let target = format!("={session}");
        self.tmux_check(&["has-session", "-t", &target]).await
    }

    async fn has_window(&self, session: &str, window: &str) -> Result<bool, TerminalError> {
        Ok(self.list_windows(session).await?.iter().any(|w| w == window))
    }

    async fn list_sessions(&self) -> Result<Vec<String>, TerminalError> {
        // list-sessions fails when no server is running; that means no sessions.
        let mut cmd = Command::new("tmux");
        cmd.args(["list-sessions", "-F", "#{session_name}"]);
        let output = run_with_timeout(cmd, TMUX_TIMEOUT, "tmux list-sessions")
            .await
            .map_err(TerminalError::CommandFailed)?;
        if !output.status.success() {
            return Ok(Vec::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(String::from)
            .collect())
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<String>, TerminalError> {
        let target = format!("={session}");
        let stdout = self
            .tmux(&["list-windows", "-t", &target, "-F", "#{window_name}"])
            .await?;
        Ok(stdout.lines().map(String::from).collect())
    }

    async fn get_pane_pid(&self, session: &str, window: &str) -> Result<u32, TerminalError> {
        let target = Self::target(session, window);
        let stdout = self
            .tmux(&["list-panes", "-t", &target, "-F", "#{pane_pid}"])
            .await?;
        stdout
            .lines()
            .next()
            .and_then(|line| line.trim().parse::<u32>().ok())
            .ok_or_else(|| TerminalError::CommandFailed(format!("no pane pid for {target}")))
    }

    async fn create_session(
        &self,
        name: &str,
        first_window: &str,
        cwd: &Path,
        detached: bool,
    ) -> Result<(), TerminalError> {
        if !cwd.exists() {
            return Err(TerminalError::SpawnFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }

        let cwd_str = cwd.display().to_string();
        let mut args = vec!["new-session"];
        if detached {
            args.push("-d");
        }
        args.extend(["-s", name, "-n", first_window, "-c", cwd_str.as_str()]);
        self.tmux(&args).await.map_err(|e| match e {
            TerminalError::CommandFailed(msg) => TerminalError::SpawnFailed(msg),
            other => other,
        })?;
        Ok(())
    }

    async fn create_window(
        &self,
        session: &str,
        name: &str,
        cwd: &Path,
    ) -> Result<(), TerminalError> {
        let target = format!("={session}");
        let cwd_str = cwd.display().to_string();
        self.tmux(&["new-window", "-t", &target, "-n", name, "-c", &cwd_str])
            .await?;
        Ok(())
    }

    async fn kill_session(&self, name: &str) -> Result<(), TerminalError> {
        let target = format!("={name}");
        self.tmux(&["kill-session", "-t", &target]).await?;
        Ok(())
    }

    async fn kill_window(&self, session: &str, window: &str) -> Result<(), TerminalError> {
        let target = Self::target(session, window);
        self.tmux(&["kill-window", "-t", &target]).await?;
        Ok(())
    }

    async fn send_keys(
        &self,
        session: &str,
        window: &str,
        text: &str,
    ) -> Result<(), TerminalError> {
        let target = Self::target(session, window);
        self.tmux(&["send-keys", "-t", &target, "--", text, "Enter"])
            .await?;
        Ok(())
    }

    async fn send_keys_literal(
        &self,
        session: &str,
        window: &str,
        text: &str,
    ) -> Result<(), TerminalError> {
        let target = Self::target(session, window);
        if text.contains('\n') {
            // Stage the whole block in a buffer and paste it in one action,
            // so the attached process sees every line before any
            // line-triggered processing fires.
            self.tmux(&["set-buffer", "-b", PASTE_BUFFER, "--", text])
                .await?;
            self.tmux(&["paste-buffer", "-d", "-b", PASTE_BUFFER, "-t", &target])
                .await?;
        } else {
            // -l = literal mode (no key name interpretation)
            // -- = end of options (handles text starting with -)
            self.tmux(&["send-keys", "-t", &target, "-l", "--", text])
                .await?;
        }
        Ok(())
    }

    async fn send_enter(&self, session: &str, window: &str) -> Result<(), TerminalError> {
        let target = Self::target(session, window);
        self.tmux(&["send-keys", "-t", &target, "Enter"]).await?;
        Ok(())
    }

    async fn send_keys_literal_with_enter(
        &self,
        session: &str,
        window: &str,
        text: &str,
    ) -> Result<(), TerminalError> {
        self.send_keys_literal(session, window, text).await?;
        self.send_enter(session, window).await
    }

    async fn start_pipe_pane(
        &self,
        session: &str,
        window: &str,
        file: &Path,
    ) -> Result<(), TerminalError> {
        let target = Self::target(session, window);
        let sink = format!("cat >> '{}'", file.display());
        self.tmux(&["pipe-pane", "-t", &target, "-o", &sink]).await?;
        Ok(())
    }

    async fn stop_pipe_pane(&self, session: &str, window: &str) -> Result<(), TerminalError> {
        let target = Self::target(session, window);
        // pipe-pane with no command closes the existing pipe.
        self.tmux(&["pipe-pane", "-t", &target]).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
