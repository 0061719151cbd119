// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository/agent graph with atomic file persistence.
//!
//! All mutation goes through [`StateStore`]; an internal lock serializes
//! writers and every successful mutation is followed by an atomic save
//! (write to a sibling temp file, then rename). Readers get deep-copied
//! snapshots so no caller ever iterates while holding the lock.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use mc_core::{Agent, MergeQueueConfig, Repository};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from state-store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("repository already exists: {0}")]
    RepoExists(String),

    #[error("repository not found: {0}")]
    RepoNotFound(String),

    #[error("agent already exists: {repo}/{agent}")]
    AgentExists { repo: String, agent: String },

    #[error("window already in use: {repo}:{window}")]
    WindowInUse { repo: String, window: String },

    #[error("agent has no session id: {repo}/{agent}")]
    EmptySessionId { repo: String, agent: String },

    #[error("agent not found: {repo}/{agent}")]
    AgentNotFound { repo: String, agent: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed state file: {0}")]
    Json(#[from] serde_json::Error),
}

/// The persisted shape of `state.json`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub repos: HashMap<String, Repository>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_repo: Option<String>,
}

/// Locked, persistent store for the repository/agent graph.
pub struct StateStore {
    path: PathBuf,
    inner: Mutex<State>,
}

impl StateStore {
    /// Load the store from `path`.
    ///
    /// A missing file yields an empty store; malformed JSON is a hard error
    /// (silently discarding state would orphan live sessions).
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();
        let state = if path.exists() {
            let file = File::open(&path)?;
            serde_json::from_reader(BufReader::new(file))?
        } else {
            State::default()
        };
        Ok(Self {
            path,
            inner: Mutex::new(state),
        })
    }

    /// Path of the backing state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn add_repo(&self, name: &str, repo: Repository) -> Result<(), StateError> {
        let mut state = self.inner.lock();
        if state.repos.contains_key(name) {
            return Err(StateError::RepoExists(name.to_string()));
        }
        state.repos.insert(name.to_string(), repo);
        self.save(&state)
    }

    pub fn remove_repo(&self, name: &str) -> Result<(), StateError> {
        let mut state = self.inner.lock();
        if state.repos.remove(name).is_none() {
            return Err(StateError::RepoNotFound(name.to_string()));
        }
        if state.current_repo.as_deref() == Some(name) {
            state.current_repo = None;
        }
        self.save(&state)
    }

    /// Deep copy of one repository, if present.
    pub fn get_repo(&self, name: &str) -> Option<Repository> {
        self.inner.lock().repos.get(name).cloned()
    }

    /// Repository names in unspecified order.
    pub fn list_repos(&self) -> Vec<String> {
        self.inner.lock().repos.keys().cloned().collect()
    }

    /// Deep copy of the whole graph; callers may iterate without the lock.
    pub fn get_all_repos(&self) -> HashMap<String, Repository> {
        self.inner.lock().repos.clone()
    }

    pub fn add_agent(&self, repo: &str, name: &str, agent: Agent) -> Result<(), StateError> {
        if agent.session_id.is_empty() {
            return Err(StateError::EmptySessionId {
                repo: repo.to_string(),
                agent: name.to_string(),
            });
        }

        let mut state = self.inner.lock();
        let entry = state
            .repos
            .get_mut(repo)
            .ok_or_else(|| StateError::RepoNotFound(repo.to_string()))?;
        if entry.agents.contains_key(name) {
            return Err(StateError::AgentExists {
                repo: repo.to_string(),
                agent: name.to_string(),
            });
        }
        if entry
            .agents
            .values()
            .any(|a| a.tmux_window == agent.tmux_window)
        {
            return Err(StateError::WindowInUse {
                repo: repo.to_string(),
                window: agent.tmux_window.clone(),
            });
        }
        entry.agents.insert(name.to_string(), agent);
        self.save(&state)
    }

    pub fn update_agent(&self, repo: &str, name: &str, agent: Agent) -> Result<(), StateError> {
        let mut state = self.inner.lock();
        let entry = state
            .repos
            .get_mut(repo)
            .ok_or_else(|| StateError::RepoNotFound(repo.to_string()))?;
        if !entry.agents.contains_key(name) {
            return Err(StateError::AgentNotFound {
                repo: repo.to_string(),
                agent: name.to_string(),
            });
        }
        entry.agents.insert(name.to_string(), agent);
        self.save(&state)
    }

    pub fn remove_agent(&self, repo: &str, name: &str) -> Result<(), StateError> {
        let mut state = self.inner.lock();
        let entry = state
            .repos
            .get_mut(repo)
            .ok_or_else(|| StateError::RepoNotFound(repo.to_string()))?;
        if entry.agents.remove(name).is_none() {
            return Err(StateError::AgentNotFound {
                repo: repo.to_string(),
                agent: name.to_string(),
            });
        }
        self.save(&state)
    }

    /// Deep copy of one agent, if present.
    pub fn get_agent(&self, repo: &str, name: &str) -> Option<Agent> {
        self.inner
            .lock()
            .repos
            .get(repo)
            .and_then(|r| r.agents.get(name))
            .cloned()
    }

    /// Agent names for a repository; errors if the repository is unknown.
    pub fn list_agents(&self, repo: &str) -> Result<Vec<String>, StateError> {
        let state = self.inner.lock();
        let entry = state
            .repos
            .get(repo)
            .ok_or_else(|| StateError::RepoNotFound(repo.to_string()))?;
        Ok(entry.agents.keys().cloned().collect())
    }

    /// Set the current-repo hint; the named repo must exist.
    pub fn set_current_repo(&self, name: &str) -> Result<(), StateError> {
        let mut state = self.inner.lock();
        if !state.repos.contains_key(name) {
            return Err(StateError::RepoNotFound(name.to_string()));
        }
        state.current_repo = Some(name.to_string());
        self.save(&state)
    }

    pub fn get_current_repo(&self) -> Option<String> {
        self.inner.lock().current_repo.clone()
    }

    pub fn clear_current_repo(&self) -> Result<(), StateError> {
        let mut state = self.inner.lock();
        state.current_repo = None;
        self.save(&state)
    }

    /// Effective merge-queue config, defaulting when never configured.
    pub fn get_merge_queue_config(&self, repo: &str) -> Result<MergeQueueConfig, StateError> {
        let state = self.inner.lock();
        let entry = state
            .repos
            .get(repo)
            .ok_or_else(|| StateError::RepoNotFound(repo.to_string()))?;
        Ok(entry.merge_queue_config())
    }

    pub fn set_merge_queue_config(
        &self,
        repo: &str,
        config: MergeQueueConfig,
    ) -> Result<(), StateError> {
        let mut state = self.inner.lock();
        let entry = state
            .repos
            .get_mut(repo)
            .ok_or_else(|| StateError::RepoNotFound(repo.to_string()))?;
        entry.merge_queue = Some(config);
        self.save(&state)
    }

    /// Persist atomically: write to a sibling temp file, fsync, rename.
    fn save(&self, state: &State) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, state)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
