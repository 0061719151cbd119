// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merge-queue configuration subcommands.

use clap::Subcommand;
use mc_core::Error;
use mc_daemon::Request;

use crate::client::DaemonClient;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show a repository's merge-queue configuration
    Get { repo: String },
    /// Change a repository's merge-queue configuration
    Set {
        repo: String,
        /// true or false
        #[arg(long)]
        enabled: Option<String>,
        /// all, author, or assigned
        #[arg(long)]
        track_mode: Option<String>,
    },
}

pub async fn run(command: ConfigCommand) -> Result<(), Error> {
    let client = DaemonClient::connect()?;
    match command {
        ConfigCommand::Get { repo } => {
            let data = client
                .expect_ok(Request::new("get_repo_config").arg("repo", repo))
                .await?;
            println!(
                "enabled: {}  track_mode: {}",
                data["enabled"],
                data["track_mode"].as_str().unwrap_or_default()
            );
        }
        ConfigCommand::Set {
            repo,
            enabled,
            track_mode,
        } => {
            let mut request = Request::new("update_repo_config").arg("repo", repo);
            if let Some(enabled) = enabled {
                // Passed through as a string; the daemon coerces it.
                request = request.arg("enabled", enabled);
            }
            if let Some(mode) = track_mode {
                request = request.arg("track_mode", mode);
            }
            let data = client.expect_ok(request).await?;
            println!(
                "enabled: {}  track_mode: {}",
                data["enabled"],
                data["track_mode"].as_str().unwrap_or_default()
            );
        }
    }
    Ok(())
}
