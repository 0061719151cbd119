// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracked repositories and merge-queue configuration.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::agent::Agent;

/// Prefix for every multiplexer session owned by the daemon.
pub const SESSION_PREFIX: &str = "mc-";

/// Derive the multiplexer session name for a repository.
///
/// `mc-` plus the repo name with control characters stripped and every
/// character outside `[A-Za-z0-9_-]` replaced with `-`. The result is a
/// pure function of the name, so callers never need to consult state.
pub fn session_name(repo: &str) -> String {
    let sanitized: String = repo
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '-',
        })
        .collect();
    format!("{SESSION_PREFIX}{sanitized}")
}

/// Which pull requests the merge-queue agent tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackMode {
    /// Track every open PR on the repository
    #[default]
    All,
    /// Track only PRs authored by the agent's identity
    Author,
    /// Track only PRs assigned to the agent's identity
    Assigned,
}

impl fmt::Display for TrackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackMode::All => write!(f, "all"),
            TrackMode::Author => write!(f, "author"),
            TrackMode::Assigned => write!(f, "assigned"),
        }
    }
}

impl FromStr for TrackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TrackMode::All),
            "author" => Ok(TrackMode::Author),
            "assigned" => Ok(TrackMode::Assigned),
            other => Err(format!(
                "invalid track_mode: {other} (expected all, author, or assigned)"
            )),
        }
    }
}

/// Merge-queue configuration for a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeQueueConfig {
    pub enabled: bool,
    #[serde(default)]
    pub track_mode: TrackMode,
}

impl Default for MergeQueueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            track_mode: TrackMode::All,
        }
    }
}

/// A tracked source repository and its supervised agents.
///
/// The agent map is keyed by agent name; names are unique within a repo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub github_url: String,
    pub tmux_session: String,
    #[serde(default)]
    pub agents: HashMap<String, Agent>,
    /// None means "never configured" and resolves to [`MergeQueueConfig::default`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_queue: Option<MergeQueueConfig>,
}

impl Repository {
    /// Create a repository with a derived session name and no agents.
    pub fn new(name: impl Into<String>, github_url: impl Into<String>) -> Self {
        let name = name.into();
        let tmux_session = session_name(&name);
        Self {
            name,
            github_url: github_url.into(),
            tmux_session,
            agents: HashMap::new(),
            merge_queue: None,
        }
    }

    /// Effective merge-queue configuration (defaults when never configured).
    pub fn merge_queue_config(&self) -> MergeQueueConfig {
        self.merge_queue.unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "repo_tests.rs"]
mod tests;
