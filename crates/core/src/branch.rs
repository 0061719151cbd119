// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-name validation.
//!
//! Workspace names become source-control branch names, so they must satisfy
//! the branch-name rules up front rather than failing deep inside a worktree
//! operation.

use thiserror::Error;

/// Why a workspace name was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BranchNameError {
    #[error("workspace name cannot be empty")]
    Empty,

    #[error("workspace name cannot be '.' or '..'")]
    Reserved,

    #[error("workspace name cannot start with '{0}'")]
    BadLeading(char),

    #[error("workspace name cannot end with '{0}'")]
    BadTrailing(char),

    #[error("workspace name cannot contain '..'")]
    DoubleDot,

    #[error("workspace name cannot contain '{0}'")]
    BadChar(char),
}

/// Characters git forbids anywhere in a ref name.
const FORBIDDEN: &[char] = &[
    '\\', '~', '^', ':', '?', '*', '[', '@', '{', '}', ' ', '\t', '\n',
];

/// Validate a workspace name against source-control branch rules.
pub fn validate_workspace_name(name: &str) -> Result<(), BranchNameError> {
    if name.is_empty() {
        return Err(BranchNameError::Empty);
    }
    if name == "." || name == ".." {
        return Err(BranchNameError::Reserved);
    }
    if name.starts_with('.') {
        return Err(BranchNameError::BadLeading('.'));
    }
    if name.starts_with('-') {
        return Err(BranchNameError::BadLeading('-'));
    }
    if name.ends_with('.') {
        return Err(BranchNameError::BadTrailing('.'));
    }
    if name.ends_with('/') {
        return Err(BranchNameError::BadTrailing('/'));
    }
    if name.contains("..") {
        return Err(BranchNameError::DoubleDot);
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(BranchNameError::BadChar(c));
    }
    Ok(())
}

#[cfg(test)]
#[path = "branch_tests.rs"]
mod tests;
