// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing error kinds.
//!
//! Internal crates carry their own thiserror enums; this type is the shape
//! errors take when they reach a human: a kind, a message, and where it
//! helps, a one-line remediation suggestion.

use thiserror::Error;

/// User-facing error with an optional remediation suggestion.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed argument or missing required field
    #[error("{0}")]
    Usage(String),

    /// Missing worker binary, missing tracked repo path, bad configuration
    #[error("{message}")]
    Config {
        message: String,
        suggestion: Option<String>,
    },

    /// Daemon unreachable, socket error
    #[error("{message}")]
    Connection {
        message: String,
        suggestion: Option<String>,
    },

    /// Subprocess or filesystem failure
    #[error("{message}")]
    Runtime { message: String },

    /// Agent, repo, workspace, or log not present
    #[error("{message}")]
    NotFound {
        message: String,
        suggestion: Option<String>,
    },
}

impl Error {
    pub fn usage(message: impl Into<String>) -> Self {
        Error::Usage(message.into())
    }

    pub fn config(message: impl Into<String>, suggestion: Option<&str>) -> Self {
        Error::Config {
            message: message.into(),
            suggestion: suggestion.map(String::from),
        }
    }

    pub fn connection(message: impl Into<String>, suggestion: Option<&str>) -> Self {
        Error::Connection {
            message: message.into(),
            suggestion: suggestion.map(String::from),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Error::Runtime {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>, suggestion: Option<&str>) -> Self {
        Error::NotFound {
            message: message.into(),
            suggestion: suggestion.map(String::from),
        }
    }

    /// Remediation hint, when one exists.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Error::Config { suggestion, .. }
            | Error::Connection { suggestion, .. }
            | Error::NotFound { suggestion, .. } => suggestion.as_deref(),
            Error::Usage(_) | Error::Runtime { .. } => None,
        }
    }

    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
