// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mc-adapters: subprocess-backed adapters for the multiclaude daemon.
//!
//! The terminal driver wraps tmux; the worktree manager wraps git. Both are
//! thin imperative wrappers that surface subprocess failures verbatim so the
//! daemon can log them with context.

pub mod subprocess;
pub mod terminal;
pub mod worktree;

pub use terminal::{TerminalDriver, TerminalError, TmuxDriver};
pub use worktree::{WorktreeError, WorktreeManager};

#[cfg(any(test, feature = "test-support"))]
pub use terminal::{FakeDriver, TerminalCall};
