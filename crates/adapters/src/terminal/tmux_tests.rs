// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn target_is_exact_match() {
    assert_eq!(TmuxDriver::target("mc-r1", "supervisor"), "=mc-r1:supervisor");
}

#[tokio::test]
async fn create_session_requires_existing_cwd() {
    let driver = TmuxDriver::new();
    let err = driver
        .create_session("mc-test", "supervisor", Path::new("/nonexistent/dir/mc"), true)
        .await
        .unwrap_err();
    assert!(matches!(err, TerminalError::SpawnFailed(_)));
    assert!(err.to_string().contains("working directory does not exist"));
}

// Everything else shells out to tmux and is exercised through the daemon's
// fake-driver tests; running a real tmux server in unit tests is not worth
// the flakiness.
