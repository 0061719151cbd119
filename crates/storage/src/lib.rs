// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mc-storage: persistent state for the multiclaude daemon.
//!
//! Two stores, two ownership domains:
//! - [`StateStore`] owns the repository/agent graph, persisted as one JSON
//!   file replaced atomically after every mutation.
//! - [`MessageStore`] owns the filesystem message queue, one JSON file per
//!   message under the recipient's directory.

pub mod messages;
pub mod state;

pub use messages::{MessageError, MessageStore};
pub use state::{State, StateError, StateStore};
