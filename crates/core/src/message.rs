// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inter-agent messages and their lifecycle states.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix for every message id.
pub const MESSAGE_ID_PREFIX: &str = "msg-";

/// Number of UUID characters kept in a message id.
const MESSAGE_ID_LEN: usize = 13;

/// Generate a fresh message id: `msg-` plus 13 characters of a new UUID.
pub fn new_message_id() -> String {
    let uuid = uuid::Uuid::new_v4().to_string();
    format!("{MESSAGE_ID_PREFIX}{}", &uuid[..MESSAGE_ID_LEN])
}

/// Delivery state of a message.
///
/// `pending` → `delivered` is driven by the daemon's routing loop;
/// `read` and `acked` are set by the recipient via CLI subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Delivered,
    Read,
    Acked,
}

impl MessageStatus {
    /// Pending and delivered messages count as unread.
    pub fn is_unread(self) -> bool {
        matches!(self, MessageStatus::Pending | MessageStatus::Delivered)
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageStatus::Pending => write!(f, "pending"),
            MessageStatus::Delivered => write!(f, "delivered"),
            MessageStatus::Read => write!(f, "read"),
            MessageStatus::Acked => write!(f, "acked"),
        }
    }
}

impl FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MessageStatus::Pending),
            "delivered" => Ok(MessageStatus::Delivered),
            "read" => Ok(MessageStatus::Read),
            "acked" => Ok(MessageStatus::Acked),
            other => Err(format!(
                "invalid message status: {other} (expected pending, delivered, read, or acked)"
            )),
        }
    }
}

/// One inter-agent message. The recipient's directory owns the file; the
/// repository is implied by the file's location on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub from: String,
    pub to: String,
    pub timestamp: DateTime<Utc>,
    pub body: String,
    pub status: MessageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acked_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a fresh `pending` message stamped with the current time.
    pub fn new(from: impl Into<String>, to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            from: from.into(),
            to: to.into(),
            timestamp: Utc::now(),
            body: body.into(),
            status: MessageStatus::Pending,
            acked_at: None,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
