// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The listener runs in a spawned task, accepting connections and handling
//! each in its own task so a slow client cannot stall the loops. One
//! request/response exchange per connection.

use std::sync::Arc;

use mc_adapters::TerminalDriver;
use mc_core::Clock;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

use crate::daemon::Daemon;
use crate::handlers;
use crate::protocol_wire::{self, ProtocolError, DEFAULT_TIMEOUT};

/// Listener task for accepting socket connections.
pub struct Listener<T: TerminalDriver, C: Clock> {
    socket: UnixListener,
    daemon: Arc<Daemon<T, C>>,
}

impl<T: TerminalDriver, C: Clock> Listener<T, C> {
    pub fn new(socket: UnixListener, daemon: Arc<Daemon<T, C>>) -> Self {
        Self { socket, daemon }
    }

    /// Accept connections until the daemon's token is cancelled.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.daemon.cancel.cancelled() => {
                    info!("listener stopping");
                    break;
                }
                accepted = self.socket.accept() => match accepted {
                    Ok((stream, _)) => {
                        let daemon = Arc::clone(&self.daemon);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &daemon).await {
                                match e {
                                    ProtocolError::ConnectionClosed => debug!("client disconnected"),
                                    ProtocolError::Timeout => warn!("connection timeout"),
                                    _ => error!("connection error: {}", e),
                                }
                            }
                        });
                    }
                    Err(e) => error!("accept error: {}", e),
                }
            }
        }
    }
}

/// Handle a single client connection: one request, one response.
async fn handle_connection<T: TerminalDriver, C: Clock>(
    stream: UnixStream,
    daemon: &Arc<Daemon<T, C>>,
) -> Result<(), ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = protocol_wire::read_request(&mut reader, DEFAULT_TIMEOUT).await?;

    // Pings are frequent polling; keep them out of the info log.
    if request.command == "ping" {
        debug!("received ping");
    } else {
        info!(command = %request.command, "received request");
    }

    let response = handlers::dispatch(daemon, request).await;
    protocol_wire::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
    Ok(())
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
