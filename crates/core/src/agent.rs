// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervised agent records.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The role an agent plays within its repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    /// Coordinates workers and reviews progress
    Supervisor,
    /// Watches open PRs and CI
    MergeQueue,
    /// Executes a single task in its own worktree
    Worker,
    /// Human-driven interactive window; never nudged or routed to
    Workspace,
    /// Reviews a worker's output in its own worktree
    Review,
}

impl AgentKind {
    /// Worker and review agents own a disposable worktree that is removed
    /// with the agent.
    pub fn owns_worktree(self) -> bool {
        matches!(self, AgentKind::Worker | AgentKind::Review)
    }

    /// Workspace agents are driven exclusively by interactive human input.
    pub fn is_workspace(self) -> bool {
        matches!(self, AgentKind::Workspace)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Supervisor => write!(f, "supervisor"),
            AgentKind::MergeQueue => write!(f, "merge-queue"),
            AgentKind::Worker => write!(f, "worker"),
            AgentKind::Workspace => write!(f, "workspace"),
            AgentKind::Review => write!(f, "review"),
        }
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supervisor" => Ok(AgentKind::Supervisor),
            "merge-queue" => Ok(AgentKind::MergeQueue),
            "worker" => Ok(AgentKind::Worker),
            "workspace" => Ok(AgentKind::Workspace),
            "review" => Ok(AgentKind::Review),
            other => Err(format!(
                "invalid agent type: {other} (expected supervisor, merge-queue, worker, workspace, or review)"
            )),
        }
    }
}

/// One running supervised process in a multiplexer window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    #[serde(alias = "type")]
    pub kind: AgentKind,
    pub worktree_path: PathBuf,
    pub tmux_window: String,
    /// Opaque session identifier (UUID v4) handed to the child on start
    pub session_id: String,
    /// Pane process id; 0 when unknown (degraded start)
    #[serde(default)]
    pub pid: u32,
    /// Epoch milliseconds when the agent was registered
    #[serde(default)]
    pub created_at_ms: u64,
    /// Epoch milliseconds of the last status-check nudge; 0 = never nudged
    #[serde(default)]
    pub last_nudge_ms: u64,
    /// Set by `complete_agent`; the next health pass reaps the agent
    #[serde(default)]
    pub ready_for_cleanup: bool,
    /// Task description for workers and reviews
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
