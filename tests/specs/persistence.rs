// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-crate persistence specs: the state file round-trips through a
//! store reload, and the message queue honors its lifecycle on disk.

use std::collections::HashSet;

use mc_core::{session_name, Agent, AgentKind, MessageStatus, Repository};
use mc_storage::{MessageStore, StateStore};

fn agent(name: &str, kind: AgentKind, session_id: &str) -> Agent {
    Agent {
        name: name.to_string(),
        kind,
        worktree_path: format!("/tmp/{name}").into(),
        tmux_window: name.to_string(),
        session_id: session_id.to_string(),
        pid: 0,
        created_at_ms: 1,
        last_nudge_ms: 0,
        ready_for_cleanup: false,
        task: None,
    }
}

#[test]
fn state_survives_a_daemon_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    // First daemon lifetime
    {
        let store = StateStore::load(&path).unwrap();
        let mut repo = Repository::new("r1", "https://example.org/r1");
        repo.tmux_session = "mc-r1".to_string();
        store.add_repo("r1", repo).unwrap();
        store
            .add_agent("r1", "supervisor", agent("supervisor", AgentKind::Supervisor, "u1"))
            .unwrap();
    }

    // Second daemon lifetime
    let store = StateStore::load(&path).unwrap();
    assert_eq!(store.list_agents("r1").unwrap(), vec!["supervisor"]);
    let restored = store.get_agent("r1", "supervisor").unwrap();
    assert_eq!(restored.session_id, "u1");
    assert_eq!(restored.kind, AgentKind::Supervisor);
}

#[test]
fn state_file_is_plain_json_with_the_documented_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let store = StateStore::load(&path).unwrap();
    store
        .add_repo("r1", Repository::new("r1", "https://example.org/r1"))
        .unwrap();
    store.set_current_repo("r1").unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(raw["repos"]["r1"].is_object());
    assert_eq!(raw["current_repo"], serde_json::json!("r1"));
}

#[test]
fn session_names_derive_without_consulting_state() {
    assert_eq!(session_name("demos.expanso.io"), "mc-demos-expanso-io");
    let repo = Repository::new("demos.expanso.io", "https://example.org/x");
    assert_eq!(repo.tmux_session, session_name("demos.expanso.io"));
}

#[test]
fn orphaned_message_directories_are_swept() {
    let dir = tempfile::tempdir().unwrap();
    let store = MessageStore::new(dir.path().join("messages"));

    store.send("r1", "a", "supervisor", "keep").unwrap();
    let ghost_dir = dir.path().join("messages/r1/ghost");
    std::fs::create_dir_all(&ghost_dir).unwrap();
    std::fs::write(ghost_dir.join("m.json"), "{}").unwrap();

    let valid: HashSet<String> = ["supervisor".to_string()].into_iter().collect();
    assert_eq!(store.cleanup_orphaned("r1", &valid).unwrap(), 1);
    assert!(!ghost_dir.exists());
    assert_eq!(store.list("r1", "supervisor").unwrap().len(), 1);
}

#[test]
fn message_lifecycle_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = MessageStore::new(dir.path().join("messages"));

    let msg = store.send("r1", "supervisor", "worker1", "hello").unwrap();
    assert!(msg.id.starts_with("msg-"));
    assert_eq!(msg.status, MessageStatus::Pending);

    store
        .update_status("r1", "worker1", &msg.id, MessageStatus::Delivered)
        .unwrap();
    let acked = store.ack("r1", "worker1", &msg.id).unwrap();
    assert_eq!(acked.status, MessageStatus::Acked);
    assert!(acked.acked_at.is_some());

    // The on-disk file carries the documented field set.
    let raw: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(
            dir.path()
                .join("messages/r1/worker1")
                .join(format!("{}.json", msg.id)),
        )
        .unwrap(),
    )
    .unwrap();
    for field in ["id", "from", "to", "timestamp", "body", "status", "acked_at"] {
        assert!(raw.get(field).is_some(), "missing field {field}");
    }
}
