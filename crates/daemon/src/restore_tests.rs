// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{add_repo, make_agent, test_daemon, TestDaemon};
use mc_adapters::TerminalCall;
use mc_core::{MergeQueueConfig, TrackMode};

fn seed_stale_agents(daemon: &TestDaemon, repo: &str) {
    for (name, kind) in [
        ("supervisor", AgentKind::Supervisor),
        ("merge-queue", AgentKind::MergeQueue),
        ("worker-a", AgentKind::Worker),
    ] {
        daemon
            .state
            .add_agent(
                repo,
                name,
                make_agent(name, kind, daemon.config.paths.worktree_dir(repo, name)),
            )
            .unwrap();
    }
}

#[tokio::test]
async fn restoration_rebuilds_persistent_agents_and_drops_stale_ones() {
    let (_dir, daemon) = test_daemon();
    let repo = add_repo(&daemon, "r1");
    seed_stale_agents(&daemon, "r1");

    let old_supervisor = daemon.state.get_agent("r1", "supervisor").unwrap();

    daemon.restore_repo("r1", &daemon.state.get_repo("r1").unwrap()).await.unwrap();

    // worker-a was stale state for a vanished window; it must not survive.
    let mut agents = daemon.state.list_agents("r1").unwrap();
    agents.sort();
    assert_eq!(agents, vec!["merge-queue", "supervisor"]);

    // Fresh agents got fresh session ids.
    let new_supervisor = daemon.state.get_agent("r1", "supervisor").unwrap();
    assert_ne!(new_supervisor.session_id, old_supervisor.session_id);
    assert!(!new_supervisor.session_id.is_empty());

    // The session came up detached with the supervisor window first.
    assert!(daemon.terminal.calls().contains(&TerminalCall::CreateSession {
        name: repo.tmux_session.clone(),
        first_window: "supervisor".to_string(),
        cwd: daemon.config.paths.repo_dir("r1"),
    }));
    assert!(daemon.terminal.has_window(&repo.tmux_session, "merge-queue").await.unwrap());
}

#[tokio::test]
async fn restoration_fails_when_checkout_is_gone() {
    let (_dir, daemon) = test_daemon();
    // Repo registered but never checked out on disk.
    let repo = mc_core::Repository::new("r1", "https://example.org/r1");
    daemon.state.add_repo("r1", repo.clone()).unwrap();

    let err = daemon.restore_repo("r1", &repo).await.unwrap_err();
    assert!(matches!(err, DaemonError::RepoPathMissing(_)));
}

#[tokio::test]
async fn merge_queue_window_is_skipped_when_disabled() {
    let (_dir, daemon) = test_daemon();
    let repo = add_repo(&daemon, "r1");
    daemon
        .state
        .set_merge_queue_config(
            "r1",
            MergeQueueConfig {
                enabled: false,
                track_mode: TrackMode::All,
            },
        )
        .unwrap();

    daemon.restore_repo("r1", &daemon.state.get_repo("r1").unwrap()).await.unwrap();

    let agents = daemon.state.list_agents("r1").unwrap();
    assert_eq!(agents, vec!["supervisor"]);
    assert!(!daemon.terminal.has_window(&repo.tmux_session, "merge-queue").await.unwrap());
}

// The workspace leg needs a real git repository; these tests skip
// themselves when git is unavailable.

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn init_checkout(daemon: &TestDaemon, repo: &str) -> bool {
    let path = daemon.config.paths.repo_dir(repo);
    let run = |args: &[&str]| {
        std::process::Command::new("git")
            .arg("-C")
            .arg(&path)
            .args(args)
            .env("GIT_AUTHOR_NAME", "t")
            .env("GIT_AUTHOR_EMAIL", "t@example.org")
            .env("GIT_COMMITTER_NAME", "t")
            .env("GIT_COMMITTER_EMAIL", "t@example.org")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    };
    if !run(&["init", "-q", "-b", "main"]) {
        return false;
    }
    std::fs::write(path.join("README"), "hello\n").is_ok()
        && run(&["add", "."])
        && run(&["commit", "-q", "-m", "init"])
}

#[tokio::test]
async fn restoration_adds_a_workspace_agent_when_git_cooperates() {
    if !git_available() {
        return;
    }
    let (_dir, daemon) = test_daemon();
    let repo = add_repo(&daemon, "r1");
    assert!(init_checkout(&daemon, "r1"));

    daemon.restore_repo("r1", &daemon.state.get_repo("r1").unwrap()).await.unwrap();

    let mut agents = daemon.state.list_agents("r1").unwrap();
    agents.sort();
    assert_eq!(agents, vec!["merge-queue", "supervisor", "workspace"]);

    let workspace = daemon.state.get_agent("r1", "workspace").unwrap();
    assert_eq!(
        workspace.worktree_path,
        daemon.config.paths.worktree_dir("r1", "workspace")
    );
    assert!(workspace.worktree_path.exists());
    assert!(daemon.terminal.has_window(&repo.tmux_session, "workspace").await.unwrap());

    // The worktree sits on the canonical workspace branch.
    let branch = daemon
        .worktrees("r1")
        .get_current_branch(&workspace.worktree_path)
        .await
        .unwrap();
    assert_eq!(branch, "workspace/default");
}

#[tokio::test]
async fn second_restoration_reattaches_the_existing_worktree() {
    if !git_available() {
        return;
    }
    let (_dir, daemon) = test_daemon();
    let repo = add_repo(&daemon, "r1");
    assert!(init_checkout(&daemon, "r1"));

    let state_repo = daemon.state.get_repo("r1").unwrap();
    daemon.restore_repo("r1", &state_repo).await.unwrap();

    // Simulate the session dying while the worktree survives.
    daemon.terminal.kill_session(&repo.tmux_session).await.unwrap();
    let state_repo = daemon.state.get_repo("r1").unwrap();
    daemon.restore_repo("r1", &state_repo).await.unwrap();

    let mut agents = daemon.state.list_agents("r1").unwrap();
    agents.sort();
    assert_eq!(agents, vec!["merge-queue", "supervisor", "workspace"]);
}

#[tokio::test]
async fn workspace_is_skipped_when_the_checkout_is_not_a_repo() {
    let (_dir, daemon) = test_daemon();
    add_repo(&daemon, "r1"); // plain directory, not a git repo

    daemon.restore_repo("r1", &daemon.state.get_repo("r1").unwrap()).await.unwrap();

    // Supervisor and merge-queue come up; the workspace leg degrades.
    let mut agents = daemon.state.list_agents("r1").unwrap();
    agents.sort();
    assert_eq!(agents, vec!["merge-queue", "supervisor"]);
}

#[tokio::test]
async fn health_pass_restores_missing_sessions() {
    let (_dir, daemon) = test_daemon();
    add_repo(&daemon, "r1");
    seed_stale_agents(&daemon, "r1");

    // No session exists in the fake driver: the health pass must rebuild.
    daemon.health_pass().await;

    let mut agents = daemon.state.list_agents("r1").unwrap();
    agents.sort();
    assert_eq!(agents, vec!["merge-queue", "supervisor"]);
    let repo = daemon.state.get_repo("r1").unwrap();
    assert!(daemon.terminal.has_session(&repo.tmux_session).await.unwrap());
}
