// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error reporting at the process boundary.

use mc_core::Error;

/// Print a user-facing error (with its remediation suggestion, when one
/// exists) and exit with the kind's exit code.
pub fn report(err: &Error) -> ! {
    eprintln!("error: {err}");
    if let Some(suggestion) = err.suggestion() {
        eprintln!("  try: {suggestion}");
    }
    std::process::exit(err.exit_code());
}
