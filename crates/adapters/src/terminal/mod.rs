// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal multiplexer driver.
//!
//! The daemon addresses panes by `(session, window)`. Prompt delivery uses
//! [`TerminalDriver::send_keys_literal_with_enter`] as its atomic unit so
//! the attached process never sees text and Enter split across races.

mod tmux;

pub use tmux::TmuxDriver;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeDriver, TerminalCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from terminal operations.
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("spawn failed: {0}")]
    SpawnFailed(String),

    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Driver for the terminal multiplexer (tmux in production).
#[async_trait]
pub trait TerminalDriver: Clone + Send + Sync + 'static {
    /// Whether the multiplexer binary is usable at all.
    async fn is_available(&self) -> bool;

    async fn has_session(&self, session: &str) -> Result<bool, TerminalError>;

    async fn has_window(&self, session: &str, window: &str) -> Result<bool, TerminalError>;

    async fn list_sessions(&self) -> Result<Vec<String>, TerminalError>;

    async fn list_windows(&self, session: &str) -> Result<Vec<String>, TerminalError>;

    /// Pid of the window's pane process.
    async fn get_pane_pid(&self, session: &str, window: &str) -> Result<u32, TerminalError>;

    /// Create a session whose first window is `first_window`, rooted at `cwd`.
    async fn create_session(
        &self,
        name: &str,
        first_window: &str,
        cwd: &Path,
        detached: bool,
    ) -> Result<(), TerminalError>;

    async fn create_window(
        &self,
        session: &str,
        name: &str,
        cwd: &Path,
    ) -> Result<(), TerminalError>;

    async fn kill_session(&self, name: &str) -> Result<(), TerminalError>;

    async fn kill_window(&self, session: &str, window: &str) -> Result<(), TerminalError>;

    /// Submit `text` followed by a newline (shell-style input).
    async fn send_keys(&self, session: &str, window: &str, text: &str)
        -> Result<(), TerminalError>;

    /// Send literal text without key-name interpretation and without Enter.
    ///
    /// Multi-line text is staged in a paste buffer and pasted as one block
    /// so the attached process sees all lines before any line-triggered
    /// processing runs.
    async fn send_keys_literal(
        &self,
        session: &str,
        window: &str,
        text: &str,
    ) -> Result<(), TerminalError>;

    async fn send_enter(&self, session: &str, window: &str) -> Result<(), TerminalError>;

    /// Literal text then Enter as one atomic driver call. This is the unit
    /// used for prompt delivery.
    async fn send_keys_literal_with_enter(
        &self,
        session: &str,
        window: &str,
        text: &str,
    ) -> Result<(), TerminalError>;

    /// Start streaming the pane's output to `file`.
    async fn start_pipe_pane(
        &self,
        session: &str,
        window: &str,
        file: &Path,
    ) -> Result<(), TerminalError>;

    async fn stop_pipe_pane(&self, session: &str, window: &str) -> Result<(), TerminalError>;
}
