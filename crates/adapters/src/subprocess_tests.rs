// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn successful_command_returns_output() {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", "printf hello"]);
    let output = run_with_timeout(cmd, Duration::from_secs(5), "sh printf")
        .await
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello");
}

#[tokio::test]
async fn missing_binary_is_a_described_error() {
    let cmd = Command::new("definitely-not-a-real-binary-mc");
    let err = run_with_timeout(cmd, Duration::from_secs(5), "missing binary")
        .await
        .unwrap_err();
    assert!(err.contains("missing binary"));
    assert!(err.contains("failed"));
}

#[tokio::test]
async fn timeout_is_reported_with_duration() {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", "sleep 5"]);
    let err = run_with_timeout(cmd, Duration::from_millis(50), "sleepy command")
        .await
        .unwrap_err();
    assert!(err.contains("sleepy command"));
    assert!(err.contains("timed out"));
}
