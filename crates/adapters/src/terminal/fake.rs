// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake terminal driver for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{TerminalDriver, TerminalError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded driver call
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalCall {
    CreateSession {
        name: String,
        first_window: String,
        cwd: PathBuf,
    },
    CreateWindow {
        session: String,
        window: String,
        cwd: PathBuf,
    },
    KillSession {
        name: String,
    },
    KillWindow {
        session: String,
        window: String,
    },
    SendKeys {
        session: String,
        window: String,
        text: String,
    },
    SendKeysLiteral {
        session: String,
        window: String,
        text: String,
    },
    SendEnter {
        session: String,
        window: String,
    },
    LiteralWithEnter {
        session: String,
        window: String,
        text: String,
    },
    StartPipePane {
        session: String,
        window: String,
        file: PathBuf,
    },
    StopPipePane {
        session: String,
        window: String,
    },
}

#[derive(Debug, Clone, Default)]
struct FakeWindow {
    pane_pid: u32,
}

#[derive(Default)]
struct FakeTerminalState {
    sessions: HashMap<String, HashMap<String, FakeWindow>>,
    calls: Vec<TerminalCall>,
    fail_sends: bool,
}

/// Fake terminal driver: sessions and windows live in memory, every call is
/// recorded for assertions.
#[derive(Clone, Default)]
pub struct FakeDriver {
    inner: Arc<Mutex<FakeTerminalState>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<TerminalCall> {
        self.inner.lock().calls.clone()
    }

    /// Pre-create a session with no windows.
    pub fn add_session(&self, name: &str) {
        self.inner
            .lock()
            .sessions
            .entry(name.to_string())
            .or_default();
    }

    /// Pre-create a window with a pane pid.
    pub fn add_window(&self, session: &str, window: &str, pane_pid: u32) {
        self.inner
            .lock()
            .sessions
            .entry(session.to_string())
            .or_default()
            .insert(window.to_string(), FakeWindow { pane_pid });
    }

    /// Make every send operation fail, for delivery-failure paths.
    pub fn set_fail_sends(&self, fail: bool) {
        self.inner.lock().fail_sends = fail;
    }

    /// Text sent to one window via any send variant, in call order.
    pub fn sent_to(&self, session: &str, window: &str) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                TerminalCall::SendKeys {
                    session: s,
                    window: w,
                    text,
                }
                | TerminalCall::SendKeysLiteral {
                    session: s,
                    window: w,
                    text,
                }
                | TerminalCall::LiteralWithEnter {
                    session: s,
                    window: w,
                    text,
                } if s == session && w == window => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn check_window(
        state: &FakeTerminalState,
        session: &str,
        window: &str,
    ) -> Result<(), TerminalError> {
        if state.fail_sends {
            return Err(TerminalError::CommandFailed("injected failure".to_string()));
        }
        match state.sessions.get(session) {
            Some(windows) if windows.contains_key(window) => Ok(()),
            _ => Err(TerminalError::NotFound(format!("{session}:{window}"))),
        }
    }
}

#[async_trait]
impl TerminalDriver for FakeDriver {
    async fn is_available(&self) -> bool {
        true
    }

    async fn has_session(&self, session: &str) -> Result<bool, TerminalError> {
        Ok(self.inner.lock().sessions.contains_key(session))
    }

    async fn has_window(&self, session: &str, window: &str) -> Result<bool, TerminalError> {
        Ok(self
            .inner
            .lock()
            .sessions
            .get(session)
            .is_some_and(|w| w.contains_key(window)))
    }

    async fn list_sessions(&self) -> Result<Vec<String>, TerminalError> {
        Ok(self.inner.lock().sessions.keys().cloned().collect())
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<String>, TerminalError> {
        let inner = self.inner.lock();
        match inner.sessions.get(session) {
            Some(windows) => Ok(windows.keys().cloned().collect()),
            None => Err(TerminalError::NotFound(session.to_string())),
        }
    }

    async fn get_pane_pid(&self, session: &str, window: &str) -> Result<u32, TerminalError> {
        let inner = self.inner.lock();
        inner
            .sessions
            .get(session)
            .and_then(|w| w.get(window))
            .map(|w| w.pane_pid)
            .ok_or_else(|| TerminalError::NotFound(format!("{session}:{window}")))
    }

    async fn create_session(
        &self,
        name: &str,
        first_window: &str,
        cwd: &Path,
        _detached: bool,
    ) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::CreateSession {
            name: name.to_string(),
            first_window: first_window.to_string(),
            cwd: cwd.to_path_buf(),
        });
        let windows = inner.sessions.entry(name.to_string()).or_default();
        windows.insert(first_window.to_string(), FakeWindow::default());
        Ok(())
    }

    async fn create_window(
        &self,
        session: &str,
        name: &str,
        cwd: &Path,
    ) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::CreateWindow {
            session: session.to_string(),
            window: name.to_string(),
            cwd: cwd.to_path_buf(),
        });
        match inner.sessions.get_mut(session) {
            Some(windows) => {
                windows.insert(name.to_string(), FakeWindow::default());
                Ok(())
            }
            None => Err(TerminalError::NotFound(session.to_string())),
        }
    }

    async fn kill_session(&self, name: &str) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::KillSession {
            name: name.to_string(),
        });
        inner.sessions.remove(name);
        Ok(())
    }

    async fn kill_window(&self, session: &str, window: &str) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TerminalCall::KillWindow {
            session: session.to_string(),
            window: window.to_string(),
        });
        if let Some(windows) = inner.sessions.get_mut(session) {
            windows.remove(window);
        }
        Ok(())
    }

    async fn send_keys(
        &self,
        session: &str,
        window: &str,
        text: &str,
    ) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        Self::check_window(&inner, session, window)?;
        inner.calls.push(TerminalCall::SendKeys {
            session: session.to_string(),
            window: window.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_keys_literal(
        &self,
        session: &str,
        window: &str,
        text: &str,
    ) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        Self::check_window(&inner, session, window)?;
        inner.calls.push(TerminalCall::SendKeysLiteral {
            session: session.to_string(),
            window: window.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_enter(&self, session: &str, window: &str) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        Self::check_window(&inner, session, window)?;
        inner.calls.push(TerminalCall::SendEnter {
            session: session.to_string(),
            window: window.to_string(),
        });
        Ok(())
    }

    async fn send_keys_literal_with_enter(
        &self,
        session: &str,
        window: &str,
        text: &str,
    ) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        Self::check_window(&inner, session, window)?;
        inner.calls.push(TerminalCall::LiteralWithEnter {
            session: session.to_string(),
            window: window.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn start_pipe_pane(
        &self,
        session: &str,
        window: &str,
        file: &Path,
    ) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        Self::check_window(&inner, session, window)?;
        inner.calls.push(TerminalCall::StartPipePane {
            session: session.to_string(),
            window: window.to_string(),
            file: file.to_path_buf(),
        });
        Ok(())
    }

    async fn stop_pipe_pane(&self, session: &str, window: &str) -> Result<(), TerminalError> {
        let mut inner = self.inner.lock();
        Self::check_window(&inner, session, window)?;
        inner.calls.push(TerminalCall::StopPipePane {
            session: session.to_string(),
            window: window.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
