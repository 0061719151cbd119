// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mc: CLI for the multiclaude orchestrator.
//!
//! Thin collaborator: every stateful operation goes through the daemon's
//! socket; only message reads/acks touch the filesystem directly (on the
//! agent's behalf, per the ownership rules).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod exit_error;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mc", version, about = "Supervise coding agents in tmux sessions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the background daemon
    Daemon {
        #[command(subcommand)]
        command: commands::daemon::DaemonCommand,
    },
    /// Manage tracked repositories
    Repo {
        #[command(subcommand)]
        command: commands::repo::RepoCommand,
    },
    /// Manage agents within a repository
    Agent {
        #[command(subcommand)]
        command: commands::agent::AgentCommand,
    },
    /// Send, read, and acknowledge inter-agent messages
    Msg {
        #[command(subcommand)]
        command: commands::msg::MsgCommand,
    },
    /// Inspect or change a repository's merge-queue configuration
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommand,
    },
    /// Trigger a message-routing pass
    Route,
    /// Trigger a cleanup pass
    Cleanup,
    /// Repair state inconsistencies
    Repair,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Daemon { command } => commands::daemon::run(command).await,
        Commands::Repo { command } => commands::repo::run(command).await,
        Commands::Agent { command } => commands::agent::run(command).await,
        Commands::Msg { command } => commands::msg::run(command).await,
        Commands::Config { command } => commands::config::run(command).await,
        Commands::Route => commands::daemon::trigger("route_messages").await,
        Commands::Cleanup => commands::daemon::trigger("trigger_cleanup").await,
        Commands::Repair => commands::daemon::repair().await,
    };

    if let Err(err) = result {
        exit_error::report(&err);
    }
}
