// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{add_live_agent, add_repo, test_daemon, TestDaemon};
use mc_core::MessageStatus;
use mc_storage::StateStore;

async fn send(daemon: &TestDaemon, request: Request) -> Response {
    dispatch(daemon, request).await
}

#[tokio::test]
async fn ping_pongs() {
    let (_dir, daemon) = test_daemon();
    let response = send(&daemon, Request::new("ping")).await;
    assert!(response.success);
    assert_eq!(response.data, Some(json!("pong")));
}

#[tokio::test]
async fn unknown_commands_are_rejected() {
    let (_dir, daemon) = test_daemon();
    let response = send(&daemon, Request::new("frobnicate")).await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("unknown command"));
}

#[tokio::test]
async fn status_reports_counts_and_pid() {
    let (_dir, daemon) = test_daemon();
    let repo = add_repo(&daemon, "r1");
    daemon.terminal.add_session(&repo.tmux_session);
    add_live_agent(&daemon, &repo, "supervisor", AgentKind::Supervisor);

    let response = send(&daemon, Request::new("status")).await;
    let data = response.data.unwrap();
    assert_eq!(data["repos"], json!(1));
    assert_eq!(data["agents"], json!(1));
    assert_eq!(data["pid"], json!(std::process::id()));
    assert!(data["socket"].as_str().unwrap().ends_with("daemon.sock"));
}

#[tokio::test(start_paused = true)]
async fn stop_replies_first_then_cancels() {
    let (_dir, daemon) = test_daemon();

    let response = send(&daemon, Request::new("stop")).await;
    assert!(response.success);
    assert!(!daemon.cancel.is_cancelled());

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert!(daemon.cancel.is_cancelled());
}

#[tokio::test]
async fn add_repo_then_reload_preserves_agents() {
    // Scenario: add a repo and an agent over the wire, then reload the
    // state file the way a daemon restart would.
    let (_dir, daemon) = test_daemon();

    let response = send(
        &daemon,
        Request::new("add_repo")
            .arg("name", "r1")
            .arg("github_url", "https://example.org/r1")
            .arg("tmux_session", "mc-r1"),
    )
    .await;
    assert!(response.success, "{:?}", response.error);

    let response = send(
        &daemon,
        Request::new("add_agent")
            .arg("repo", "r1")
            .arg("agent", "supervisor")
            .arg("type", "supervisor")
            .arg("worktree_path", "/tmp/r1")
            .arg("tmux_window", "supervisor")
            .arg("session_id", "u1"),
    )
    .await;
    assert!(response.success, "{:?}", response.error);

    let reloaded = StateStore::load(daemon.state.path()).unwrap();
    assert_eq!(reloaded.list_agents("r1").unwrap(), vec!["supervisor"]);
    assert_eq!(reloaded.get_agent("r1", "supervisor").unwrap().session_id, "u1");
}

#[tokio::test]
async fn add_repo_derives_session_name_when_omitted() {
    let (_dir, daemon) = test_daemon();
    let response = send(
        &daemon,
        Request::new("add_repo")
            .arg("name", "demos.expanso.io")
            .arg("github_url", "https://example.org/demos"),
    )
    .await;
    assert!(response.success);
    assert_eq!(
        response.data.unwrap()["tmux_session"],
        json!("mc-demos-expanso-io")
    );
}

#[tokio::test]
async fn add_repo_twice_is_an_error() {
    let (_dir, daemon) = test_daemon();
    let request = Request::new("add_repo")
        .arg("name", "r1")
        .arg("github_url", "https://example.org/r1");

    assert!(send(&daemon, request.clone()).await.success);
    let response = send(&daemon, request).await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("already exists"));
}

#[tokio::test]
async fn add_agent_accepts_pid_as_integer_or_float() {
    let (_dir, daemon) = test_daemon();
    add_repo(&daemon, "r1");

    let base = |name: &str| {
        Request::new("add_agent")
            .arg("repo", "r1")
            .arg("agent", name)
            .arg("type", "worker")
            .arg("worktree_path", "/tmp/wt")
    };

    assert!(send(&daemon, base("w1").arg("pid", 4321)).await.success);
    assert!(send(&daemon, base("w2").arg("pid", 4321.0)).await.success);

    assert_eq!(daemon.state.get_agent("r1", "w1").unwrap().pid, 4321);
    assert_eq!(daemon.state.get_agent("r1", "w2").unwrap().pid, 4321);
}

#[tokio::test]
async fn add_agent_rejects_unknown_kind() {
    let (_dir, daemon) = test_daemon();
    add_repo(&daemon, "r1");

    let response = send(
        &daemon,
        Request::new("add_agent")
            .arg("repo", "r1")
            .arg("agent", "x")
            .arg("type", "manager")
            .arg("worktree_path", "/tmp/x"),
    )
    .await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("invalid agent type"));
}

#[tokio::test]
async fn add_agent_generates_session_id_when_missing() {
    let (_dir, daemon) = test_daemon();
    add_repo(&daemon, "r1");

    assert!(
        send(
            &daemon,
            Request::new("add_agent")
                .arg("repo", "r1")
                .arg("agent", "w1")
                .arg("type", "worker")
                .arg("worktree_path", "/tmp/w1"),
        )
        .await
        .success
    );
    assert!(!daemon.state.get_agent("r1", "w1").unwrap().session_id.is_empty());
}

#[tokio::test]
async fn list_agents_requires_known_repo() {
    let (_dir, daemon) = test_daemon();
    let response = send(&daemon, Request::new("list_agents").arg("repo", "nope")).await;
    assert!(!response.success);
}

#[tokio::test]
async fn list_repos_plain_and_rich_shapes() {
    let (_dir, daemon) = test_daemon();
    let repo = add_repo(&daemon, "r1");
    daemon.terminal.add_session(&repo.tmux_session);
    add_live_agent(&daemon, &repo, "supervisor", AgentKind::Supervisor);
    add_live_agent(&daemon, &repo, "worker1", AgentKind::Worker);
    add_repo(&daemon, "r2"); // no session

    let plain = send(&daemon, Request::new("list_repos")).await;
    assert_eq!(plain.data, Some(json!(["r1", "r2"])));

    // The CLI flag parser produces strings; "true" must work as a bool.
    let rich = send(&daemon, Request::new("list_repos").arg("rich", "true")).await;
    let entries = rich.data.unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[0],
        json!({
            "name": "r1",
            "total_agents": 2,
            "worker_count": 1,
            "session_healthy": true,
            "tmux_session": "mc-r1",
        })
    );
    assert_eq!(entries[1]["session_healthy"], json!(false));
}

#[tokio::test]
async fn complete_agent_flags_and_notifies() {
    let (_dir, daemon) = test_daemon();
    let repo = add_repo(&daemon, "r1");
    daemon.terminal.add_session(&repo.tmux_session);
    add_live_agent(&daemon, &repo, "worker1", AgentKind::Worker);

    let mut agent = daemon.state.get_agent("r1", "worker1").unwrap();
    agent.task = Some("do X".to_string());
    daemon.state.update_agent("r1", "worker1", agent).unwrap();

    let response = send(
        &daemon,
        Request::new("complete_agent")
            .arg("repo", "r1")
            .arg("agent", "worker1"),
    )
    .await;
    assert!(response.success);

    // The flag is set synchronously, before any background pass runs.
    assert!(daemon.state.get_agent("r1", "worker1").unwrap().ready_for_cleanup);

    // One notification each for supervisor and merge queue, both naming the
    // worker and its task.
    for recipient in ["supervisor", "merge-queue"] {
        let messages = daemon.messages.list("r1", recipient).unwrap();
        assert_eq!(messages.len(), 1, "missing notification for {recipient}");
        assert_eq!(messages[0].status, MessageStatus::Pending);
        assert!(messages[0].body.contains("worker1"));
        assert!(messages[0].body.contains("do X"));
    }
}

#[tokio::test]
async fn complete_review_notifies_merge_queue_only() {
    let (_dir, daemon) = test_daemon();
    let repo = add_repo(&daemon, "r1");
    daemon.terminal.add_session(&repo.tmux_session);
    add_live_agent(&daemon, &repo, "review1", AgentKind::Review);

    let response = send(
        &daemon,
        Request::new("complete_agent")
            .arg("repo", "r1")
            .arg("agent", "review1"),
    )
    .await;
    assert!(response.success);

    assert_eq!(daemon.messages.list("r1", "merge-queue").unwrap().len(), 1);
    assert!(daemon.messages.list("r1", "supervisor").unwrap().is_empty());
}

#[tokio::test]
async fn complete_supervisor_sends_no_notifications() {
    let (_dir, daemon) = test_daemon();
    let repo = add_repo(&daemon, "r1");
    daemon.terminal.add_session(&repo.tmux_session);
    add_live_agent(&daemon, &repo, "supervisor", AgentKind::Supervisor);

    assert!(
        send(
            &daemon,
            Request::new("complete_agent")
                .arg("repo", "r1")
                .arg("agent", "supervisor"),
        )
        .await
        .success
    );
    assert!(daemon.messages.list("r1", "merge-queue").unwrap().is_empty());
}

#[tokio::test]
async fn remove_agent_cleans_up() {
    let (_dir, daemon) = test_daemon();
    let repo = add_repo(&daemon, "r1");
    daemon.terminal.add_session(&repo.tmux_session);
    add_live_agent(&daemon, &repo, "worker1", AgentKind::Worker);

    let response = send(
        &daemon,
        Request::new("remove_agent")
            .arg("repo", "r1")
            .arg("agent", "worker1"),
    )
    .await;
    assert!(response.success);
    assert!(daemon.state.get_agent("r1", "worker1").is_none());
    assert!(!daemon.terminal.has_window(&repo.tmux_session, "worker1").await.unwrap());
}

#[tokio::test]
async fn remove_repo_kills_session_and_state() {
    let (_dir, daemon) = test_daemon();
    let repo = add_repo(&daemon, "r1");
    daemon.terminal.add_session(&repo.tmux_session);

    let response = send(&daemon, Request::new("remove_repo").arg("name", "r1")).await;
    assert!(response.success);
    assert!(daemon.state.get_repo("r1").is_none());
    assert!(!daemon.terminal.has_session(&repo.tmux_session).await.unwrap());
}

#[tokio::test]
async fn repo_config_defaults_update_and_reject_unknown_modes() {
    let (_dir, daemon) = test_daemon();
    add_repo(&daemon, "r1");

    let defaults = send(&daemon, Request::new("get_repo_config").arg("repo", "r1")).await;
    assert_eq!(
        defaults.data,
        Some(json!({"enabled": true, "track_mode": "all"}))
    );

    let updated = send(
        &daemon,
        Request::new("update_repo_config")
            .arg("repo", "r1")
            .arg("enabled", "false")
            .arg("track_mode", "author"),
    )
    .await;
    assert!(updated.success);
    assert_eq!(
        updated.data,
        Some(json!({"enabled": false, "track_mode": "author"}))
    );

    let rejected = send(
        &daemon,
        Request::new("update_repo_config")
            .arg("repo", "r1")
            .arg("track_mode", "everything"),
    )
    .await;
    assert!(!rejected.success);
    assert!(rejected.error.unwrap().contains("invalid track_mode"));

    // The rejected update must not have mutated the config.
    let config = daemon.state.get_merge_queue_config("r1").unwrap();
    assert_eq!(config.track_mode.to_string(), "author");
}

#[tokio::test]
async fn route_messages_and_trigger_cleanup_reply_immediately() {
    let (_dir, daemon) = test_daemon();

    let route = send(&daemon, Request::new("route_messages")).await;
    assert_eq!(route.data, Some(json!("Message routing triggered")));

    let cleanup = send(&daemon, Request::new("trigger_cleanup")).await;
    assert_eq!(cleanup.data, Some(json!("Cleanup triggered")));
}

#[tokio::test]
async fn repair_state_reports_counts() {
    let (_dir, daemon) = test_daemon();
    let response = send(&daemon, Request::new("repair_state")).await;
    let data = response.data.unwrap();
    assert_eq!(data["agents_removed"], json!(0));
    assert_eq!(data["issues_fixed"], json!(0));
}
