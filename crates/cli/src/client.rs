// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::PathBuf;

use mc_core::{Error, Paths};
use mc_daemon::protocol_wire::{self, DEFAULT_TIMEOUT};
use mc_daemon::{Request, Response};
use tokio::net::UnixStream;

/// Client for the daemon's Unix socket: one request per connection.
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Resolve the socket path from the standard layout.
    pub fn connect() -> Result<Self, Error> {
        let paths = Paths::resolve()?;
        Ok(Self {
            socket_path: paths.socket_path(),
        })
    }

    pub fn socket_path(&self) -> &std::path::Path {
        &self.socket_path
    }

    /// Send one request and return the raw response.
    pub async fn request(&self, request: Request) -> Result<Response, Error> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            Error::connection(
                format!(
                    "daemon not reachable at {}: {e}",
                    self.socket_path.display()
                ),
                Some("run `mc daemon start`"),
            )
        })?;
        let (mut reader, mut writer) = stream.into_split();

        protocol_wire::write_request(&mut writer, &request, DEFAULT_TIMEOUT)
            .await
            .map_err(|e| Error::connection(format!("sending request failed: {e}"), None))?;
        protocol_wire::read_response(&mut reader, DEFAULT_TIMEOUT)
            .await
            .map_err(|e| Error::connection(format!("reading response failed: {e}"), None))
    }

    /// Send one request; a `success: false` response becomes a Runtime error.
    pub async fn expect_ok(&self, request: Request) -> Result<serde_json::Value, Error> {
        let response = self.request(request).await?;
        if response.success {
            Ok(response.data.unwrap_or(serde_json::Value::Null))
        } else {
            Err(Error::runtime(
                response.error.unwrap_or_else(|| "daemon reported failure".to_string()),
            ))
        }
    }
}
