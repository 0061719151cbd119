// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn sessions_and_windows_are_queryable() {
    let driver = FakeDriver::new();
    assert!(!driver.has_session("mc-r1").await.unwrap());

    driver
        .create_session("mc-r1", "supervisor", Path::new("/tmp"), true)
        .await
        .unwrap();
    assert!(driver.has_session("mc-r1").await.unwrap());
    assert!(driver.has_window("mc-r1", "supervisor").await.unwrap());

    driver
        .create_window("mc-r1", "worker1", Path::new("/tmp"))
        .await
        .unwrap();
    let mut windows = driver.list_windows("mc-r1").await.unwrap();
    windows.sort();
    assert_eq!(windows, vec!["supervisor", "worker1"]);
}

#[tokio::test]
async fn kill_window_then_session() {
    let driver = FakeDriver::new();
    driver.add_session("mc-r1");
    driver.add_window("mc-r1", "w1", 42);

    assert_eq!(driver.get_pane_pid("mc-r1", "w1").await.unwrap(), 42);

    driver.kill_window("mc-r1", "w1").await.unwrap();
    assert!(!driver.has_window("mc-r1", "w1").await.unwrap());

    driver.kill_session("mc-r1").await.unwrap();
    assert!(!driver.has_session("mc-r1").await.unwrap());
}

#[tokio::test]
async fn sends_to_missing_window_fail() {
    let driver = FakeDriver::new();
    driver.add_session("mc-r1");

    let err = driver
        .send_keys("mc-r1", "ghost", "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, TerminalError::NotFound(_)));
}

#[tokio::test]
async fn lists_sessions_and_pipes() {
    let driver = FakeDriver::new();
    assert!(driver.is_available().await);
    assert!(driver.list_sessions().await.unwrap().is_empty());

    driver.add_session("mc-r1");
    driver.add_window("mc-r1", "w1", 1);
    assert_eq!(driver.list_sessions().await.unwrap(), vec!["mc-r1"]);

    driver
        .start_pipe_pane("mc-r1", "w1", Path::new("/tmp/out.log"))
        .await
        .unwrap();
    driver.stop_pipe_pane("mc-r1", "w1").await.unwrap();

    driver.send_keys_literal("mc-r1", "w1", "line one").await.unwrap();
    driver.send_enter("mc-r1", "w1").await.unwrap();
    assert_eq!(driver.sent_to("mc-r1", "w1"), vec!["line one"]);

    let calls = driver.calls();
    assert!(calls.contains(&TerminalCall::StartPipePane {
        session: "mc-r1".to_string(),
        window: "w1".to_string(),
        file: "/tmp/out.log".into(),
    }));
    assert!(calls.contains(&TerminalCall::StopPipePane {
        session: "mc-r1".to_string(),
        window: "w1".to_string(),
    }));
    assert!(calls.contains(&TerminalCall::SendEnter {
        session: "mc-r1".to_string(),
        window: "w1".to_string(),
    }));
}

#[tokio::test]
async fn injected_failures_and_recorded_sends() {
    let driver = FakeDriver::new();
    driver.add_session("mc-r1");
    driver.add_window("mc-r1", "w1", 1);

    driver
        .send_keys_literal_with_enter("mc-r1", "w1", "one")
        .await
        .unwrap();
    driver.send_keys("mc-r1", "w1", "two").await.unwrap();
    assert_eq!(driver.sent_to("mc-r1", "w1"), vec!["one", "two"]);

    driver.set_fail_sends(true);
    assert!(driver.send_keys("mc-r1", "w1", "three").await.is_err());
}
