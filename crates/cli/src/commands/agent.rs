// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent subcommands.

use clap::Subcommand;
use mc_core::Error;
use mc_daemon::Request;

use crate::client::DaemonClient;

#[derive(Subcommand)]
pub enum AgentCommand {
    /// Register an agent (used by scripts and tests; the daemon starts its
    /// own system agents during restoration)
    Add {
        repo: String,
        agent: String,
        /// supervisor, merge-queue, worker, workspace, or review
        #[arg(long = "type")]
        kind: String,
        #[arg(long)]
        worktree_path: String,
        #[arg(long)]
        tmux_window: Option<String>,
        #[arg(long)]
        session_id: Option<String>,
        #[arg(long)]
        pid: Option<u32>,
        #[arg(long)]
        task: Option<String>,
    },
    /// Remove an agent and reclaim its resources
    Remove { repo: String, agent: String },
    /// List agents in a repository
    List { repo: String },
    /// Declare an agent's task finished
    Complete { repo: String, agent: String },
}

pub async fn run(command: AgentCommand) -> Result<(), Error> {
    let client = DaemonClient::connect()?;
    match command {
        AgentCommand::Add {
            repo,
            agent,
            kind,
            worktree_path,
            tmux_window,
            session_id,
            pid,
            task,
        } => {
            let mut request = Request::new("add_agent")
                .arg("repo", repo)
                .arg("agent", agent)
                .arg("type", kind)
                .arg("worktree_path", worktree_path);
            if let Some(window) = tmux_window {
                request = request.arg("tmux_window", window);
            }
            if let Some(session_id) = session_id {
                request = request.arg("session_id", session_id);
            }
            if let Some(pid) = pid {
                request = request.arg("pid", pid);
            }
            if let Some(task) = task {
                request = request.arg("task", task);
            }
            client.expect_ok(request).await?;
            println!("agent added");
        }
        AgentCommand::Remove { repo, agent } => {
            client
                .expect_ok(
                    Request::new("remove_agent")
                        .arg("repo", repo)
                        .arg("agent", agent),
                )
                .await?;
            println!("agent removed");
        }
        AgentCommand::List { repo } => {
            let data = client
                .expect_ok(Request::new("list_agents").arg("repo", repo))
                .await?;
            for name in data.as_array().unwrap_or(&Vec::new()) {
                println!("{}", name.as_str().unwrap_or_default());
            }
        }
        AgentCommand::Complete { repo, agent } => {
            let data = client
                .expect_ok(
                    Request::new("complete_agent")
                        .arg("repo", repo)
                        .arg("agent", agent),
                )
                .await?;
            if let Some(text) = data.as_str() {
                println!("{text}");
            }
        }
    }
    Ok(())
}
