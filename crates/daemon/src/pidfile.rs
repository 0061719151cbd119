// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Singleton-daemon enforcement via a pid file.
//!
//! The claim protocol: read any existing pid, probe it with a no-op signal,
//! and refuse to start while that process is alive. A stale pid (dead
//! process, unparseable file) is overwritten.

use std::path::PathBuf;

use nix::sys::signal::kill;
use nix::unistd::Pid;
use thiserror::Error;

/// Errors from pid-file operations.
#[derive(Debug, Error)]
pub enum PidFileError {
    #[error("daemon already running with pid {0}")]
    AlreadyRunning(u32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether a process with `pid` is alive (signal-0 probe).
pub fn pid_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Handle to the daemon's pid file.
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Claim the pid file for this process, failing fast if another live
    /// daemon owns it.
    pub fn check_and_claim(&self) -> Result<(), PidFileError> {
        if let (true, pid) = self.is_running() {
            return Err(PidFileError::AlreadyRunning(pid));
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, std::process::id().to_string())?;
        Ok(())
    }

    /// Whether a daemon is currently alive, and the pid recorded on disk
    /// (0 when the file is missing or unparseable).
    pub fn is_running(&self) -> (bool, u32) {
        let pid = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(0);
        (pid_alive(pid), pid)
    }

    /// Remove the pid file (best-effort no-op when absent).
    pub fn remove(&self) -> Result<(), PidFileError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "pidfile_tests.rs"]
mod tests;
