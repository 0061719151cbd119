// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository subcommands.

use clap::Subcommand;
use mc_core::Error;
use mc_daemon::Request;

use crate::client::DaemonClient;

#[derive(Subcommand)]
pub enum RepoCommand {
    /// Track a repository
    Add {
        /// Short unique name
        name: String,
        /// Source URL
        github_url: String,
    },
    /// Stop tracking a repository (kills its session)
    Remove { name: String },
    /// List tracked repositories
    List {
        /// Include agent counts and session health
        #[arg(long)]
        rich: bool,
    },
}

pub async fn run(command: RepoCommand) -> Result<(), Error> {
    let client = DaemonClient::connect()?;
    match command {
        RepoCommand::Add { name, github_url } => {
            let data = client
                .expect_ok(
                    Request::new("add_repo")
                        .arg("name", name)
                        .arg("github_url", github_url),
                )
                .await?;
            println!(
                "added {} (session {})",
                data["name"].as_str().unwrap_or_default(),
                data["tmux_session"].as_str().unwrap_or_default()
            );
        }
        RepoCommand::Remove { name } => {
            client
                .expect_ok(Request::new("remove_repo").arg("name", name))
                .await?;
            println!("removed");
        }
        RepoCommand::List { rich } => {
            // Flag values travel as strings; the daemon accepts both forms.
            let request = Request::new("list_repos")
                .arg("rich", if rich { "true" } else { "false" });
            let data = client.expect_ok(request).await?;
            if rich {
                for entry in data.as_array().unwrap_or(&Vec::new()) {
                    println!(
                        "{}  agents={} workers={} session={} {}",
                        entry["name"].as_str().unwrap_or_default(),
                        entry["total_agents"],
                        entry["worker_count"],
                        entry["tmux_session"].as_str().unwrap_or_default(),
                        if entry["session_healthy"].as_bool().unwrap_or(false) {
                            "healthy"
                        } else {
                            "down"
                        },
                    );
                }
            } else {
                for name in data.as_array().unwrap_or(&Vec::new()) {
                    println!("{}", name.as_str().unwrap_or_default());
                }
            }
        }
    }
    Ok(())
}
