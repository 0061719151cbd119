// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration.

use std::path::PathBuf;

use mc_core::Paths;

use crate::env;

/// Daemon configuration: the filesystem layout plus startup knobs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Canonical layout under the per-user root
    pub paths: Paths,
    /// Resolved worker binary; None when not found (fatal outside test mode)
    pub worker_bin: Option<PathBuf>,
    /// Skip child-process start-up (tests)
    pub test_mode: bool,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, mc_core::Error> {
        let paths = Paths::resolve()?;
        Ok(Self {
            worker_bin: resolve_worker_bin(),
            test_mode: env::test_mode(),
            paths,
        })
    }

    /// Test configuration rooted at a throwaway directory.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: Paths::new(root),
            worker_bin: None,
            test_mode: true,
        }
    }
}

/// Resolve the worker binary: env override first, then `$PATH`.
fn resolve_worker_bin() -> Option<PathBuf> {
    if let Some(bin) = env::claude_bin() {
        return Some(bin);
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join("claude"))
        .find(|candidate| candidate.is_file())
}
