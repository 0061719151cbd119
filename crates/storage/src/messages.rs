// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem queue of inter-agent messages.
//!
//! Layout: `<root>/<repo>/<agent>/<msg-id>.json` — the recipient owns the
//! file. This store only tracks message state; injecting a message into a
//! recipient's window is the daemon's routing loop, not this store.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use mc_core::{Message, MessageStatus};
use thiserror::Error;
use tracing::debug;

/// Errors from message-store operations.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("message not found: {repo}/{agent}/{id}")]
    NotFound {
        repo: String,
        agent: String,
        id: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed message file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Store for recipient-owned message files.
pub struct MessageStore {
    root: PathBuf,
}

impl MessageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn agent_dir(&self, repo: &str, agent: &str) -> PathBuf {
        self.root.join(repo).join(agent)
    }

    fn message_path(&self, repo: &str, agent: &str, id: &str) -> PathBuf {
        self.agent_dir(repo, agent).join(format!("{id}.json"))
    }

    /// Create a `pending` message in the recipient's directory.
    pub fn send(
        &self,
        repo: &str,
        from: &str,
        to: &str,
        body: &str,
    ) -> Result<Message, MessageError> {
        let message = Message::new(from, to, body);
        let dir = self.agent_dir(repo, to);
        fs::create_dir_all(&dir)?;
        self.write(&self.message_path(repo, to, &message.id), &message)?;
        Ok(message)
    }

    /// All messages for an agent, in directory-enumeration order.
    ///
    /// No ordering is guaranteed; ids are random so filename order would be
    /// random too. Files that fail to parse are skipped.
    pub fn list(&self, repo: &str, agent: &str) -> Result<Vec<Message>, MessageError> {
        let dir = self.agent_dir(repo, agent);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut messages = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(MessageError::from)
                .and_then(|s| serde_json::from_str::<Message>(&s).map_err(MessageError::from))
            {
                Ok(message) => messages.push(message),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping unreadable message file"),
            }
        }
        Ok(messages)
    }

    /// Messages still awaiting attention (`pending` or `delivered`).
    pub fn list_unread(&self, repo: &str, agent: &str) -> Result<Vec<Message>, MessageError> {
        Ok(self
            .list(repo, agent)?
            .into_iter()
            .filter(|m| m.status.is_unread())
            .collect())
    }

    pub fn get(&self, repo: &str, agent: &str, id: &str) -> Result<Message, MessageError> {
        let path = self.message_path(repo, agent, id);
        if !path.exists() {
            return Err(MessageError::NotFound {
                repo: repo.to_string(),
                agent: agent.to_string(),
                id: id.to_string(),
            });
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Set a message's status.
    ///
    /// Setting `acked` stamps `acked_at` with the current time, refreshing
    /// it on every re-ack.
    pub fn update_status(
        &self,
        repo: &str,
        agent: &str,
        id: &str,
        status: MessageStatus,
    ) -> Result<Message, MessageError> {
        let mut message = self.get(repo, agent, id)?;
        message.status = status;
        if status == MessageStatus::Acked {
            message.acked_at = Some(Utc::now());
        }
        self.write(&self.message_path(repo, agent, id), &message)?;
        Ok(message)
    }

    /// Shortcut for `update_status(.., Acked)`.
    pub fn ack(&self, repo: &str, agent: &str, id: &str) -> Result<Message, MessageError> {
        self.update_status(repo, agent, id, MessageStatus::Acked)
    }

    pub fn delete(&self, repo: &str, agent: &str, id: &str) -> Result<(), MessageError> {
        let path = self.message_path(repo, agent, id);
        if !path.exists() {
            return Err(MessageError::NotFound {
                repo: repo.to_string(),
                agent: agent.to_string(),
                id: id.to_string(),
            });
        }
        fs::remove_file(path)?;
        Ok(())
    }

    /// Delete every acked message for an agent; returns how many went.
    pub fn delete_acked(&self, repo: &str, agent: &str) -> Result<usize, MessageError> {
        let mut removed = 0;
        for message in self.list(repo, agent)? {
            if message.status == MessageStatus::Acked {
                fs::remove_file(self.message_path(repo, agent, &message.id))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Cheap check for undelivered mail.
    pub fn has_pending(&self, repo: &str, agent: &str) -> bool {
        self.list(repo, agent)
            .map(|msgs| msgs.iter().any(|m| m.status == MessageStatus::Pending))
            .unwrap_or(false)
    }

    /// Remove recipient directories whose agent is not in `valid_agents`.
    /// Returns the number of directories removed.
    pub fn cleanup_orphaned(
        &self,
        repo: &str,
        valid_agents: &HashSet<String>,
    ) -> Result<usize, MessageError> {
        let repo_dir = self.root.join(repo);
        if !repo_dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&repo_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !valid_agents.contains(&name) {
                fs::remove_dir_all(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Atomic write: temp file in the same directory, then rename.
    fn write(&self, path: &Path, message: &Message) -> Result<(), MessageError> {
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(message)?)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
