// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for daemon tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use std::path::PathBuf;
use std::sync::Arc;

use mc_adapters::FakeDriver;
use mc_core::{Agent, AgentKind, FakeClock, Repository};
use mc_storage::{MessageStore, StateStore};
use tempfile::TempDir;

use crate::config::Config;
use crate::daemon::Daemon;

pub(crate) type TestDaemon = Arc<Daemon<FakeDriver, FakeClock>>;

/// Daemon against a fake driver, a fake clock at t=1_000_000 ms, and a
/// throwaway root. Test mode is on: the starter never launches children.
pub(crate) fn test_daemon() -> (TempDir, TestDaemon) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_root(dir.path());
    config.paths.ensure_layout().unwrap();

    let state = Arc::new(StateStore::load(config.paths.state_file()).unwrap());
    let messages = Arc::new(MessageStore::new(config.paths.messages_dir()));
    let daemon = Daemon::new(
        config,
        state,
        messages,
        FakeDriver::new(),
        FakeClock::new(1_000_000),
    );
    (dir, daemon)
}

/// Register a repository in state and create its on-disk checkout dir.
pub(crate) fn add_repo(daemon: &TestDaemon, name: &str) -> Repository {
    let repo = Repository::new(name, format!("https://example.org/{name}"));
    std::fs::create_dir_all(daemon.config.paths.repo_dir(name)).unwrap();
    daemon.state.add_repo(name, repo.clone()).unwrap();
    repo
}

/// A minimal agent record.
pub(crate) fn make_agent(name: &str, kind: AgentKind, worktree: PathBuf) -> Agent {
    Agent {
        name: name.to_string(),
        kind,
        worktree_path: worktree,
        tmux_window: name.to_string(),
        session_id: format!("session-{name}"),
        pid: 0,
        created_at_ms: 1_000,
        last_nudge_ms: 0,
        ready_for_cleanup: false,
        task: None,
    }
}

/// Register an agent in state and create its window in the fake driver.
pub(crate) fn add_live_agent(daemon: &TestDaemon, repo: &Repository, name: &str, kind: AgentKind) {
    let worktree = daemon.config.paths.worktree_dir(&repo.name, name);
    daemon.terminal.add_window(&repo.tmux_session, name, 0);
    daemon
        .state
        .add_agent(&repo.name, name, make_agent(name, kind, worktree))
        .unwrap();
}
