// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt composition for supervised agents.
//!
//! Each agent gets: the default template for its kind, the generated CLI
//! reference, and (when present) the repo-local override file
//! `<repo>/.multiclaude/<KIND>.md`. Merge-queue prompts are prefixed with a
//! tracking-mode preamble.

use mc_core::{AgentKind, TrackMode};

const SUPERVISOR: &str = "\
You are the supervisor agent for this repository.

Your job:
- Break incoming work into tasks and hand each task to a worker agent.
- Track worker progress; unblock stuck workers or reassign their tasks.
- When a worker reports completion, confirm the result landed in the merge
  queue before retiring the task.
- Keep the human informed: summarize state when asked, never invent status.

Use the `mc` CLI to message other agents and to inspect daemon state.
";

const MERGE_QUEUE: &str = "\
You are the merge-queue agent for this repository.

Your job:
- Watch open pull requests and their CI status.
- Merge PRs that are green and approved, in order.
- When CI fails, report the failure to the supervisor with enough context
  to assign a fix.
- Never force-merge and never rewrite history.

Use the `mc` CLI to message other agents and to inspect daemon state.
";

const WORKER: &str = "\
You are a worker agent operating in your own git worktree.

Your job:
- Complete the single task you were assigned; it is in your prompt or was
  sent as a message.
- Commit your work on your branch and push it when done.
- Open a pull request for the result.
- When finished, run `mc agent complete` so the daemon can notify the
  supervisor and merge queue and reclaim your worktree.

Stay inside your worktree; the primary checkout is not yours to touch.
";

const WORKSPACE: &str = "\
This is an interactive workspace window on the shared workspace branch.

The daemon never nudges this window and never injects messages here; it is
driven entirely by the human at the keyboard. Work here persists on the
workspace branch across daemon restarts.
";

const REVIEW: &str = "\
You are a review agent operating in your own git worktree.

Your job:
- Review the change you were assigned: correctness first, then style.
- Leave your findings as PR review comments.
- When the review is finished, run `mc agent complete` so the daemon can
  notify the merge queue and reclaim your worktree.
";

/// Generated reference for the `mc` subcommands agents are expected to use.
const CLI_REFERENCE: &str = "\
## mc CLI reference

- `mc msg send <repo> <from> <to> <body>` — queue a message for another agent
- `mc msg list <repo> <agent> [--unread]` — list your messages
- `mc msg read <repo> <agent> <id>` — mark a message read
- `mc msg ack <repo> <agent> <id>` — acknowledge a message
- `mc agent complete <repo> <agent>` — declare your task finished
- `mc agent list <repo>` — list agents in this repository
- `mc repo list [--rich]` — list tracked repositories
";

/// Tracking-mode preamble for merge-queue prompts.
fn tracking_preamble(mode: TrackMode) -> &'static str {
    match mode {
        TrackMode::All => "Tracking mode: all — watch every open PR on the repository.\n\n",
        TrackMode::Author => {
            "Tracking mode: author — watch only PRs you authored; ignore the rest.\n\n"
        }
        TrackMode::Assigned => {
            "Tracking mode: assigned — watch only PRs assigned to you; ignore the rest.\n\n"
        }
    }
}

/// Default template for an agent kind.
pub fn default_template(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::Supervisor => SUPERVISOR,
        AgentKind::MergeQueue => MERGE_QUEUE,
        AgentKind::Worker => WORKER,
        AgentKind::Workspace => WORKSPACE,
        AgentKind::Review => REVIEW,
    }
}

/// Repo-local override file name for a kind (under `.multiclaude/`).
pub fn override_file_name(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::Supervisor => "SUPERVISOR.md",
        AgentKind::MergeQueue => "MERGE_QUEUE.md",
        AgentKind::Worker => "WORKER.md",
        AgentKind::Workspace => "WORKSPACE.md",
        AgentKind::Review => "REVIEW.md",
    }
}

/// Compose the full prompt for an agent.
pub fn compose(kind: AgentKind, track_mode: TrackMode, repo_override: Option<&str>) -> String {
    let mut prompt = String::new();
    if kind == AgentKind::MergeQueue {
        prompt.push_str(tracking_preamble(track_mode));
    }
    prompt.push_str(default_template(kind));
    prompt.push('\n');
    prompt.push_str(CLI_REFERENCE);
    if let Some(extra) = repo_override {
        prompt.push('\n');
        prompt.push_str(extra.trim_end());
        prompt.push('\n');
    }
    prompt
}

#[cfg(test)]
#[path = "prompts_tests.rs"]
mod tests;
