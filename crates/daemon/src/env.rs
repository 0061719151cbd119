// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-variable knobs for the daemon.

use std::path::PathBuf;
use std::time::Duration;

/// `MULTICLAUDE_TEST_MODE=1` skips child-process start-up so tests never
/// launch the worker binary.
pub fn test_mode() -> bool {
    std::env::var("MULTICLAUDE_TEST_MODE").as_deref() == Ok("1")
}

/// Explicit worker-binary override.
pub fn claude_bin() -> Option<PathBuf> {
    std::env::var_os("MULTICLAUDE_CLAUDE_BIN").map(PathBuf::from)
}

/// Periodic-loop interval override (`MULTICLAUDE_INTERVAL_MS`), for tests.
pub fn interval_override() -> Option<Duration> {
    std::env::var("MULTICLAUDE_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}
