// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle subcommands.

use std::time::{Duration, Instant};

use clap::Subcommand;
use mc_core::Error;
use mc_daemon::Request;

use crate::client::DaemonClient;

/// How long `mc daemon start` waits for the socket to come up.
const START_TIMEOUT: Duration = Duration::from_secs(5);
const START_POLL: Duration = Duration::from_millis(50);

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background
    Start,
    /// Stop the running daemon
    Stop,
    /// Show daemon status
    Status,
    /// Check that the daemon answers
    Ping,
}

pub async fn run(command: DaemonCommand) -> Result<(), Error> {
    match command {
        DaemonCommand::Start => start().await,
        DaemonCommand::Stop => stop().await,
        DaemonCommand::Status => status().await,
        DaemonCommand::Ping => ping().await,
    }
}

async fn start() -> Result<(), Error> {
    let client = DaemonClient::connect()?;
    if client.request(Request::new("ping")).await.is_ok() {
        println!("daemon already running");
        return Ok(());
    }

    // mcd ships next to mc
    let mcd = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("mcd")))
        .filter(|p| p.is_file())
        .ok_or_else(|| {
            Error::config(
                "mcd binary not found next to mc",
                Some("reinstall multiclaude or run mcd directly"),
            )
        })?;

    std::process::Command::new(&mcd)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| Error::runtime(format!("failed to spawn {}: {e}", mcd.display())))?;

    let deadline = Instant::now() + START_TIMEOUT;
    while Instant::now() < deadline {
        if client.request(Request::new("ping")).await.is_ok() {
            println!("daemon started");
            return Ok(());
        }
        tokio::time::sleep(START_POLL).await;
    }
    Err(Error::connection(
        "daemon did not come up within 5s",
        Some("check the daemon log under ~/.multiclaude/daemon.log"),
    ))
}

async fn stop() -> Result<(), Error> {
    let client = DaemonClient::connect()?;
    client.expect_ok(Request::new("stop")).await?;
    println!("daemon stopping");
    Ok(())
}

async fn status() -> Result<(), Error> {
    let client = DaemonClient::connect()?;
    let data = client.expect_ok(Request::new("status")).await?;
    println!(
        "repos: {}  agents: {}  pid: {}",
        data["repos"], data["agents"], data["pid"]
    );
    if let Some(socket) = data["socket"].as_str() {
        println!("socket: {socket}");
    }
    Ok(())
}

async fn ping() -> Result<(), Error> {
    let client = DaemonClient::connect()?;
    let data = client.expect_ok(Request::new("ping")).await?;
    println!("{}", data.as_str().unwrap_or("pong"));
    Ok(())
}

/// Fire a background pass (`route_messages` / `trigger_cleanup`).
pub async fn trigger(command: &str) -> Result<(), Error> {
    let client = DaemonClient::connect()?;
    let data = client.expect_ok(Request::new(command)).await?;
    if let Some(text) = data.as_str() {
        println!("{text}");
    }
    Ok(())
}

pub async fn repair() -> Result<(), Error> {
    let client = DaemonClient::connect()?;
    let data = client.expect_ok(Request::new("repair_state")).await?;
    println!(
        "agents removed: {}  issues fixed: {}",
        data["agents_removed"], data["issues_fixed"]
    );
    Ok(())
}
