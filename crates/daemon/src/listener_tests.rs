// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::{Request, Response};
use crate::protocol_wire::{self, DEFAULT_TIMEOUT};
use crate::test_support::{add_live_agent, add_repo, test_daemon, TestDaemon};
use mc_core::{AgentKind, MessageStatus};

async fn start_listener(daemon: &TestDaemon) -> std::path::PathBuf {
    let socket_path = daemon.config.paths.socket_path();
    let listener = UnixListener::bind(&socket_path).unwrap();
    let listener = Listener::new(listener, Arc::clone(daemon));
    tokio::spawn(listener.run());
    socket_path
}

async fn roundtrip(socket_path: &std::path::Path, request: Request) -> Response {
    let stream = UnixStream::connect(socket_path).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    protocol_wire::write_request(&mut writer, &request, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    protocol_wire::read_response(&mut reader, DEFAULT_TIMEOUT)
        .await
        .unwrap()
}

#[tokio::test]
async fn ping_over_the_socket() {
    let (_dir, daemon) = test_daemon();
    let socket_path = start_listener(&daemon).await;

    let response = roundtrip(&socket_path, Request::new("ping")).await;
    assert!(response.success);
    assert_eq!(response.data, Some(serde_json::json!("pong")));
}

#[tokio::test]
async fn each_connection_carries_one_exchange() {
    let (_dir, daemon) = test_daemon();
    let socket_path = start_listener(&daemon).await;

    // Two sequential connections both get served.
    let first = roundtrip(&socket_path, Request::new("status")).await;
    assert!(first.success);
    let second = roundtrip(&socket_path, Request::new("list_repos")).await;
    assert_eq!(second.data, Some(serde_json::json!([])));
}

#[tokio::test]
async fn route_messages_command_delivers_pending_mail() {
    let (_dir, daemon) = test_daemon();
    let socket_path = start_listener(&daemon).await;

    let repo = add_repo(&daemon, "r1");
    daemon.terminal.add_session(&repo.tmux_session);
    add_live_agent(&daemon, &repo, "supervisor", AgentKind::Supervisor);
    add_live_agent(&daemon, &repo, "worker1", AgentKind::Worker);

    let msg = daemon
        .messages
        .send("r1", "supervisor", "worker1", "hello")
        .unwrap();

    let response = roundtrip(&socket_path, Request::new("route_messages")).await;
    assert!(response.success);

    // The routing pass runs in the background; poll briefly for the flip.
    let deadline = std::time::Instant::now() + std::time::Duration::from_millis(500);
    loop {
        let status = daemon.messages.get("r1", "worker1", &msg.id).unwrap().status;
        if status == MessageStatus::Delivered {
            break;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "message never delivered"
        );
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn listener_stops_on_cancel() {
    let (_dir, daemon) = test_daemon();
    let socket_path = start_listener(&daemon).await;

    assert!(roundtrip(&socket_path, Request::new("ping")).await.success);

    daemon.cancel.cancel();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    // New connections may still connect to the bound socket, but no
    // exchange completes once the listener has returned.
    let stream = UnixStream::connect(&socket_path).await;
    if let Ok(stream) = stream {
        let (mut reader, mut writer) = stream.into_split();
        let _ = protocol_wire::write_request(&mut writer, &Request::new("ping"), DEFAULT_TIMEOUT)
            .await;
        let result = protocol_wire::read_response(
            &mut reader,
            std::time::Duration::from_millis(200),
        )
        .await;
        assert!(result.is_err());
    }
}
