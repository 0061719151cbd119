// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for daemon communication.
//!
//! One request and one response per connection. Request shape
//! `{command, args}`; response shape `{success, data?, error?}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request from CLI to daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub command: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl Request {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Map::new(),
        }
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

/// Response from daemon to CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(data: impl Into<Value>) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
            error: None,
        }
    }

    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Argument extraction for request handlers.
///
/// Errors are plain strings; they land verbatim in `Response::err`.
pub mod args {
    use super::{Map, Value};

    /// Required string argument.
    pub fn require_str<'a>(args: &'a Map<String, Value>, key: &str) -> Result<&'a str, String> {
        match args.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s),
            Some(Value::String(_)) => Err(format!("argument '{key}' cannot be empty")),
            Some(other) => Err(format!("argument '{key}' must be a string, got {other}")),
            None => Err(format!("missing required argument '{key}'")),
        }
    }

    /// Optional string argument.
    pub fn optional_str<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
        args.get(key).and_then(Value::as_str)
    }

    /// Boolean argument. The CLI flag parser produces strings, so both JSON
    /// booleans and the strings "true"/"false" are accepted.
    pub fn get_bool(args: &Map<String, Value>, key: &str, default: bool) -> Result<bool, String> {
        match args.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(format!("argument '{key}' must be a boolean, got '{other}'")),
            },
            Some(other) => Err(format!("argument '{key}' must be a boolean, got {other}")),
        }
    }

    /// Pid argument: accepts an integer or any JSON number (clients that
    /// round-trip through generic JSON produce floats).
    pub fn get_pid(args: &Map<String, Value>, key: &str) -> Result<u32, String> {
        match args.get(key) {
            None | Some(Value::Null) => Ok(0),
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    u32::try_from(v).map_err(|_| format!("argument '{key}' out of range: {v}"))
                } else if let Some(f) = n.as_f64() {
                    if f >= 0.0 && f <= f64::from(u32::MAX) && f.fract() == 0.0 {
                        Ok(f as u32)
                    } else {
                        Err(format!("argument '{key}' is not a valid pid: {f}"))
                    }
                } else {
                    Err(format!("argument '{key}' is not a valid pid"))
                }
            }
            Some(other) => Err(format!("argument '{key}' must be a number, got {other}")),
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
