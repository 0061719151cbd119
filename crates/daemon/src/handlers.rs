// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request handlers: the daemon's command table.
//!
//! Handlers return `Result<Response, String>`; an `Err` becomes
//! `{success: false, error}`. They never crash the daemon.

use std::sync::Arc;
use std::time::Duration;

use mc_adapters::TerminalDriver;
use mc_core::{Agent, AgentKind, Clock, Repository};
use serde_json::json;
use tracing::warn;

use crate::daemon::Daemon;
use crate::protocol::{args, Request, Response};

/// Delay between replying to `stop` and actually cancelling, so the
/// response reaches the client first.
const STOP_DELAY: Duration = Duration::from_millis(100);

/// Dispatch one request to its handler.
pub async fn dispatch<T: TerminalDriver, C: Clock>(
    daemon: &Arc<Daemon<T, C>>,
    request: Request,
) -> Response {
    let args = &request.args;
    let result = match request.command.as_str() {
        "ping" => Ok(Response::ok("pong")),
        "status" => handle_status(daemon),
        "stop" => handle_stop(daemon),
        "list_repos" => handle_list_repos(daemon, args).await,
        "add_repo" => handle_add_repo(daemon, args).await,
        "remove_repo" => handle_remove_repo(daemon, args).await,
        "add_agent" => handle_add_agent(daemon, args),
        "remove_agent" => handle_remove_agent(daemon, args).await,
        "list_agents" => handle_list_agents(daemon, args),
        "complete_agent" => handle_complete_agent(daemon, args),
        "trigger_cleanup" => handle_trigger_cleanup(daemon),
        "repair_state" => handle_repair_state(daemon).await,
        "route_messages" => handle_route_messages(daemon),
        "get_repo_config" => handle_get_repo_config(daemon, args),
        "update_repo_config" => handle_update_repo_config(daemon, args),
        unknown => Err(format!("unknown command: {unknown}")),
    };
    result.unwrap_or_else(Response::err)
}

type Args = serde_json::Map<String, serde_json::Value>;
type HandlerResult = Result<Response, String>;

fn handle_status<T: TerminalDriver, C: Clock>(daemon: &Arc<Daemon<T, C>>) -> HandlerResult {
    let repos = daemon.state.get_all_repos();
    let agents: usize = repos.values().map(|r| r.agents.len()).sum();
    Ok(Response::ok(json!({
        "repos": repos.len(),
        "agents": agents,
        "pid": std::process::id(),
        "socket": daemon.config.paths.socket_path().display().to_string(),
    })))
}

fn handle_stop<T: TerminalDriver, C: Clock>(daemon: &Arc<Daemon<T, C>>) -> HandlerResult {
    let cancel = daemon.cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(STOP_DELAY).await;
        cancel.cancel();
    });
    Ok(Response::ok("Daemon stopping"))
}

async fn handle_list_repos<T: TerminalDriver, C: Clock>(
    daemon: &Arc<Daemon<T, C>>,
    args: &Args,
) -> HandlerResult {
    let rich = args::get_bool(args, "rich", false)?;

    if !rich {
        let mut names = daemon.state.list_repos();
        names.sort();
        return Ok(Response::ok(json!(names)));
    }

    let mut repos: Vec<(String, Repository)> = daemon.state.get_all_repos().into_iter().collect();
    repos.sort_by(|a, b| a.0.cmp(&b.0));

    let mut entries = Vec::with_capacity(repos.len());
    for (name, repo) in repos {
        let healthy = daemon
            .terminal
            .has_session(&repo.tmux_session)
            .await
            .unwrap_or(false);
        entries.push(json!({
            "name": name,
            "total_agents": repo.agents.len(),
            "worker_count": repo
                .agents
                .values()
                .filter(|a| a.kind == AgentKind::Worker)
                .count(),
            "session_healthy": healthy,
            "tmux_session": repo.tmux_session,
        }));
    }
    Ok(Response::ok(json!(entries)))
}

async fn handle_add_repo<T: TerminalDriver, C: Clock>(
    daemon: &Arc<Daemon<T, C>>,
    args: &Args,
) -> HandlerResult {
    let name = args::require_str(args, "name")?;
    let url = args::require_str(args, "github_url")?;

    let mut repo = Repository::new(name, url);
    if let Some(session) = args::optional_str(args, "tmux_session") {
        repo.tmux_session = session.to_string();
    }
    let session = repo.tmux_session.clone();

    daemon.state.add_repo(name, repo).map_err(|e| e.to_string())?;

    // Converge to a running session without waiting for the health tick.
    let repo_path = daemon.config.paths.repo_dir(name);
    if repo_path.exists()
        && !daemon.terminal.has_session(&session).await.unwrap_or(false)
    {
        let background = Arc::clone(daemon);
        let name = name.to_string();
        tokio::spawn(async move {
            let Some(repo) = background.state.get_repo(&name) else {
                return;
            };
            if let Err(e) = background.restore_repo(&name, &repo).await {
                warn!(repo = %name, error = %e, "initial restoration failed");
            }
        });
    }

    Ok(Response::ok(json!({
        "name": name,
        "tmux_session": session,
    })))
}

async fn handle_remove_repo<T: TerminalDriver, C: Clock>(
    daemon: &Arc<Daemon<T, C>>,
    args: &Args,
) -> HandlerResult {
    let name = args::require_str(args, "name")?;
    let repo = daemon
        .state
        .get_repo(name)
        .ok_or_else(|| format!("repository not found: {name}"))?;

    if let Err(e) = daemon.terminal.kill_session(&repo.tmux_session).await {
        warn!(repo = %name, error = %e, "kill session failed");
    }
    for agent in repo.agents.values().filter(|a| a.kind.owns_worktree()) {
        if let Err(e) = daemon
            .worktrees(name)
            .remove(&agent.worktree_path, true)
            .await
        {
            warn!(repo = %name, agent = %agent.name, error = %e, "worktree removal failed");
        }
    }

    daemon.state.remove_repo(name).map_err(|e| e.to_string())?;
    Ok(Response::ok(json!(format!("Repository {name} removed"))))
}

fn handle_add_agent<T: TerminalDriver, C: Clock>(
    daemon: &Arc<Daemon<T, C>>,
    args: &Args,
) -> HandlerResult {
    let repo = args::require_str(args, "repo")?;
    let name = args::require_str(args, "agent")?;
    let kind: AgentKind = args::require_str(args, "type")?.parse()?;
    let worktree_path = args::require_str(args, "worktree_path")?;
    let window = args::optional_str(args, "tmux_window").unwrap_or(name);
    let pid = args::get_pid(args, "pid")?;

    // Every persisted agent carries a non-empty session id.
    let session_id = args::optional_str(args, "session_id")
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let agent = Agent {
        name: name.to_string(),
        kind,
        worktree_path: worktree_path.into(),
        tmux_window: window.to_string(),
        session_id,
        pid,
        created_at_ms: daemon.clock.now_ms(),
        last_nudge_ms: 0,
        ready_for_cleanup: false,
        task: args::optional_str(args, "task").map(String::from),
    };

    daemon
        .state
        .add_agent(repo, name, agent)
        .map_err(|e| e.to_string())?;
    Ok(Response::ok(json!({ "repo": repo, "agent": name })))
}

async fn handle_remove_agent<T: TerminalDriver, C: Clock>(
    daemon: &Arc<Daemon<T, C>>,
    args: &Args,
) -> HandlerResult {
    let repo_name = args::require_str(args, "repo")?;
    let agent_name = args::require_str(args, "agent")?;

    let repo = daemon
        .state
        .get_repo(repo_name)
        .ok_or_else(|| format!("repository not found: {repo_name}"))?;
    let agent = repo
        .agents
        .get(agent_name)
        .ok_or_else(|| format!("agent not found: {repo_name}/{agent_name}"))?;

    daemon.cleanup_agent(repo_name, &repo, agent).await;
    Ok(Response::ok(json!(format!("Agent {agent_name} removed"))))
}

fn handle_list_agents<T: TerminalDriver, C: Clock>(
    daemon: &Arc<Daemon<T, C>>,
    args: &Args,
) -> HandlerResult {
    let repo = args::require_str(args, "repo")?;
    let mut agents = daemon.state.list_agents(repo).map_err(|e| e.to_string())?;
    agents.sort();
    Ok(Response::ok(json!(agents)))
}

fn handle_complete_agent<T: TerminalDriver, C: Clock>(
    daemon: &Arc<Daemon<T, C>>,
    args: &Args,
) -> HandlerResult {
    let repo = args::require_str(args, "repo")?;
    let name = args::require_str(args, "agent")?;

    let mut agent = daemon
        .state
        .get_agent(repo, name)
        .ok_or_else(|| format!("agent not found: {repo}/{name}"))?;
    agent.ready_for_cleanup = true;
    let kind = agent.kind;
    let task = agent
        .task
        .clone()
        .unwrap_or_else(|| "(no task recorded)".to_string());
    daemon
        .state
        .update_agent(repo, name, agent)
        .map_err(|e| e.to_string())?;

    // Completion notifications: workers report to supervisor and merge
    // queue, reviews to merge queue only.
    let notifications: Vec<(&str, String)> = match kind {
        AgentKind::Worker => vec![
            (
                "supervisor",
                format!("Worker {name} has completed its task: {task}. The worktree will be reclaimed."),
            ),
            (
                "merge-queue",
                format!("Worker {name} has completed its task: {task}. Watch for its PR."),
            ),
        ],
        AgentKind::Review => vec![(
            "merge-queue",
            format!("Review agent {name} has finished its review: {task}."),
        )],
        _ => vec![],
    };
    for (to, body) in &notifications {
        if let Err(e) = daemon.messages.send(repo, name, to, body) {
            warn!(repo = %repo, agent = %name, to = %to, error = %e, "completion notification failed");
        }
    }

    // Deliver and reap promptly. These run after the reply; callers get no
    // visibility guarantee.
    let background = Arc::clone(daemon);
    tokio::spawn(async move { background.route_pass().await });
    let background = Arc::clone(daemon);
    tokio::spawn(async move { background.health_pass().await });

    Ok(Response::ok(json!(format!("Agent {name} marked complete"))))
}

fn handle_trigger_cleanup<T: TerminalDriver, C: Clock>(daemon: &Arc<Daemon<T, C>>) -> HandlerResult {
    let background = Arc::clone(daemon);
    tokio::spawn(async move { background.health_pass().await });
    Ok(Response::ok("Cleanup triggered"))
}

async fn handle_repair_state<T: TerminalDriver, C: Clock>(
    daemon: &Arc<Daemon<T, C>>,
) -> HandlerResult {
    let (agents_removed, issues_fixed) = daemon.repair_state().await;
    Ok(Response::ok(json!({
        "agents_removed": agents_removed,
        "issues_fixed": issues_fixed,
    })))
}

fn handle_route_messages<T: TerminalDriver, C: Clock>(daemon: &Arc<Daemon<T, C>>) -> HandlerResult {
    let background = Arc::clone(daemon);
    tokio::spawn(async move { background.route_pass().await });
    Ok(Response::ok("Message routing triggered"))
}

fn handle_get_repo_config<T: TerminalDriver, C: Clock>(
    daemon: &Arc<Daemon<T, C>>,
    args: &Args,
) -> HandlerResult {
    let repo = args::require_str(args, "repo")?;
    let config = daemon
        .state
        .get_merge_queue_config(repo)
        .map_err(|e| e.to_string())?;
    Ok(Response::ok(json!({
        "enabled": config.enabled,
        "track_mode": config.track_mode.to_string(),
    })))
}

fn handle_update_repo_config<T: TerminalDriver, C: Clock>(
    daemon: &Arc<Daemon<T, C>>,
    args: &Args,
) -> HandlerResult {
    let repo = args::require_str(args, "repo")?;
    let mut config = daemon
        .state
        .get_merge_queue_config(repo)
        .map_err(|e| e.to_string())?;

    config.enabled = args::get_bool(args, "enabled", config.enabled)?;
    if let Some(mode) = args::optional_str(args, "track_mode") {
        config.track_mode = mode.parse()?;
    }

    daemon
        .state
        .set_merge_queue_config(repo, config)
        .map_err(|e| e.to_string())?;
    Ok(Response::ok(json!({
        "enabled": config.enabled,
        "track_mode": config.track_mode.to_string(),
    })))
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
