// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message subcommands.
//!
//! These operate on the message store directly, on the agent's behalf: the
//! recipient's directory is the source of truth and delivery stays a daemon
//! concern.

use clap::Subcommand;
use mc_core::{Error, MessageStatus, Paths};
use mc_storage::MessageStore;

#[derive(Subcommand)]
pub enum MsgCommand {
    /// Queue a message for another agent
    Send {
        repo: String,
        from: String,
        to: String,
        /// Message body (remaining words are joined)
        #[arg(trailing_var_arg = true, required = true)]
        body: Vec<String>,
    },
    /// List an agent's messages
    List {
        repo: String,
        agent: String,
        /// Only pending and delivered messages
        #[arg(long)]
        unread: bool,
    },
    /// Mark a message read and print it
    Read {
        repo: String,
        agent: String,
        id: String,
    },
    /// Acknowledge a message
    Ack {
        repo: String,
        agent: String,
        id: String,
    },
    /// Delete acknowledged messages
    Clean { repo: String, agent: String },
}

fn store() -> Result<MessageStore, Error> {
    let paths = Paths::resolve()?;
    Ok(MessageStore::new(paths.messages_dir()))
}

pub async fn run(command: MsgCommand) -> Result<(), Error> {
    let store = store()?;
    match command {
        MsgCommand::Send {
            repo,
            from,
            to,
            body,
        } => {
            let message = store
                .send(&repo, &from, &to, &body.join(" "))
                .map_err(|e| Error::runtime(e.to_string()))?;
            println!("{}", message.id);
        }
        MsgCommand::List { repo, agent, unread } => {
            let messages = if unread {
                store.list_unread(&repo, &agent)
            } else {
                store.list(&repo, &agent)
            }
            .map_err(|e| Error::runtime(e.to_string()))?;
            for message in messages {
                println!(
                    "{}  {}  from={}  {}",
                    message.id, message.status, message.from, message.body
                );
            }
        }
        MsgCommand::Read { repo, agent, id } => {
            let message = store
                .update_status(&repo, &agent, &id, MessageStatus::Read)
                .map_err(not_found_or_runtime)?;
            println!("from: {}", message.from);
            println!("at:   {}", message.timestamp);
            println!();
            println!("{}", message.body);
        }
        MsgCommand::Ack { repo, agent, id } => {
            store.ack(&repo, &agent, &id).map_err(not_found_or_runtime)?;
            println!("acked");
        }
        MsgCommand::Clean { repo, agent } => {
            let removed = store
                .delete_acked(&repo, &agent)
                .map_err(|e| Error::runtime(e.to_string()))?;
            println!("removed {removed} acked messages");
        }
    }
    Ok(())
}

fn not_found_or_runtime(err: mc_storage::MessageError) -> Error {
    match err {
        mc_storage::MessageError::NotFound { .. } => Error::not_found(
            err.to_string(),
            Some("list messages with `mc msg list <repo> <agent>`"),
        ),
        other => Error::runtime(other.to_string()),
    }
}
