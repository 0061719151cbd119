// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multiclaude Daemon (mcd)
//!
//! Background process that supervises agent sessions and routes messages.
//!
//! Architecture:
//! - Listener task: socket I/O, dispatching commands against the core
//! - Health / routing / wake loops: periodic passes over the state snapshot

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use mc_adapters::{TerminalDriver, TmuxDriver};
use mc_core::SystemClock;
use mc_daemon::daemon::Daemon;
use mc_daemon::listener::Listener;
use mc_daemon::pidfile::PidFile;
use mc_daemon::Config;
use mc_storage::{MessageStore, StateStore};
use tokio::net::UnixListener;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("mcd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("mcd {}", env!("CARGO_PKG_VERSION"));
                println!("Multiclaude daemon - supervises agent sessions and routes messages");
                println!();
                println!("USAGE:");
                println!("    mcd");
                println!();
                println!("The daemon is typically started by the `mc` CLI and should not");
                println!("be invoked directly. It listens on a Unix socket for commands");
                println!("from `mc`.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: mcd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    // 1. Directories
    let config = Config::load()?;
    config.paths.ensure_layout()?;

    // 2. Logging + state
    rotate_log_if_needed(&config.paths.log_path());
    let _log_guard = setup_logging(&config)?;
    info!("Starting multiclaude daemon");

    let state = match StateStore::load(config.paths.state_file()) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            // A malformed state file must fail loudly, not be overwritten.
            error!("failed to load state: {}", e);
            eprintln!("mcd: failed to load state: {e}");
            std::process::exit(1);
        }
    };
    let messages = Arc::new(MessageStore::new(config.paths.messages_dir()));

    // 3. Worker binary
    if config.worker_bin.is_none() && !config.test_mode {
        error!("worker binary not found");
        eprintln!("mcd: worker binary not found");
        eprintln!("  install `claude` or set MULTICLAUDE_CLAUDE_BIN");
        std::process::exit(1);
    }

    // 4. PID file: fail fast if another instance is live
    let pid_file = PidFile::new(config.paths.pid_file());
    if let Err(e) = pid_file.check_and_claim() {
        eprintln!("mcd: {e}");
        std::process::exit(1);
    }

    // 5. Socket (clean up a stale file from a dead daemon first)
    let socket_path = config.paths.socket_path();
    if socket_path.exists() {
        let _ = std::fs::remove_file(&socket_path);
    }
    let unix_listener = UnixListener::bind(&socket_path)?;

    let daemon = Daemon::new(
        config,
        state,
        messages,
        TmuxDriver::new(),
        SystemClock,
    );

    if !daemon.terminal.is_available().await {
        warn!("tmux is not available; sessions cannot be managed until it is installed");
    }

    // 6. Restoration pass, before the loops so health-check does not race
    // its own restorations.
    for (name, repo) in daemon.state.get_all_repos() {
        let session_alive = daemon
            .terminal
            .has_session(&repo.tmux_session)
            .await
            .unwrap_or(false);
        if session_alive || !daemon.config.paths.repo_dir(&name).exists() {
            continue;
        }
        match daemon.restore_repo(&name, &repo).await {
            Ok(()) => info!(repo = %name, "restored session at startup"),
            Err(e) => warn!(repo = %name, error = %e, "startup restoration failed"),
        }
    }

    // 7. Loops: server + health + router + wake
    let listener = Listener::new(unix_listener, Arc::clone(&daemon));
    let server = tokio::spawn(listener.run());
    daemon.spawn_loops();

    info!("Daemon ready, listening on {}", socket_path.display());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = daemon.cancel.cancelled() => info!("Shutdown requested via command"),
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
            daemon.cancel.cancel();
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down...");
            daemon.cancel.cancel();
        }
    }

    // Graceful shutdown: stop accepting, then drop our claim files.
    // Sessions are intentionally preserved so agents keep running; the next
    // daemon reconnects to them.
    let _ = server.await;
    if let Err(e) = std::fs::remove_file(&socket_path) {
        warn!("failed to remove socket file: {}", e);
    }
    if let Err(e) = pid_file.remove() {
        warn!("failed to remove pid file: {}", e);
    }
    info!("Daemon stopped");
    Ok(())
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (daemon.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `daemon.log` → `daemon.log.1` → `daemon.log.2` → `daemon.log.3`,
/// deleting the oldest. Best-effort: rotation failures are silently ignored
/// so the daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_path = config.paths.log_path();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let dir = log_path
        .parent()
        .ok_or_else(|| std::io::Error::other("log path has no parent"))?;
    let file_name = log_path
        .file_name()
        .ok_or_else(|| std::io::Error::other("log path has no file name"))?;

    // Rotation happens at startup via rotate_log_if_needed
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
