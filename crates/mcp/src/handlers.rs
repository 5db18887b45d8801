//! Tool-call dispatch.
//!
//! Domain failures go back on the tool-result error channel (`isError`),
//! never as JSON-RPC protocol errors — the agent reads the message and can
//! retry with different arguments.

use std::collections::HashSet;
use std::fmt::Write as _;

use engram_core::{
    suggest_topic_key, truncate_chars, AddObservationParams, AddPromptParams,
    PassiveCaptureParams, SearchOptions, UpdateObservationParams,
};
use engram_storage::Storage;
use serde_json::{json, Value};

use crate::tools::McpTool;
use crate::{McpError, McpResponse};

const DEFAULT_SESSION: &str = "manual-save";

pub(crate) fn mcp_text(text: &str) -> Value {
    json!({ "content": [{ "type": "text", "text": text }] })
}

pub(crate) fn mcp_err(msg: impl std::fmt::Display) -> Value {
    json!({ "content": [{ "type": "text", "text": format!("Error: {msg}") }], "isError": true })
}

fn str_arg<'a>(args: &'a Value, key: &str) -> &'a str {
    args.get(key).and_then(Value::as_str).unwrap_or("")
}

fn opt_str_arg(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()).map(str::to_owned)
}

fn int_arg(args: &Value, key: &str) -> Option<i64> {
    args.get(key).and_then(Value::as_i64)
}

fn bool_arg(args: &Value, key: &str) -> bool {
    args.get(key).and_then(Value::as_bool).unwrap_or(false)
}

pub fn handle_tool_call(
    storage: &Storage,
    allowlist: Option<&HashSet<String>>,
    params: &Value,
    id: Value,
) -> McpResponse {
    let tool_name = params.get("name").and_then(Value::as_str).unwrap_or("");
    let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    let allowed = match allowlist {
        Some(allowed) => allowed.contains(tool_name),
        None => true,
    };
    let tool = McpTool::parse(tool_name).filter(|_| allowed);
    let Some(tool) = tool else {
        return McpResponse {
            jsonrpc: "2.0".to_owned(),
            id,
            result: None,
            error: Some(McpError {
                code: -32602,
                message: format!("Unknown tool: {tool_name:?}"),
            }),
        };
    };

    let result = dispatch(storage, tool, &args);
    McpResponse { jsonrpc: "2.0".to_owned(), id, result: Some(result), error: None }
}

fn dispatch(storage: &Storage, tool: McpTool, args: &Value) -> Value {
    match tool {
        McpTool::Search => handle_search(storage, args),
        McpTool::Save => handle_save(storage, args),
        McpTool::Context => handle_context(storage, args),
        McpTool::SessionSummary => handle_session_summary(storage, args),
        McpTool::SessionStart => handle_session_start(storage, args),
        McpTool::SessionEnd => handle_session_end(storage, args),
        McpTool::GetObservation => handle_get_observation(storage, args),
        McpTool::SuggestTopicKey => handle_suggest_topic_key(args),
        McpTool::CapturePassive => handle_capture_passive(storage, args),
        McpTool::SavePrompt => handle_save_prompt(storage, args),
        McpTool::Update => handle_update(storage, args),
        McpTool::Delete => handle_delete(storage, args),
        McpTool::Stats => handle_stats(storage),
        McpTool::Timeline => handle_timeline(storage, args),
    }
}

fn handle_search(storage: &Storage, args: &Value) -> Value {
    let query = str_arg(args, "query");
    let opts = SearchOptions {
        kind: opt_str_arg(args, "type"),
        project: opt_str_arg(args, "project"),
        scope: opt_str_arg(args, "scope"),
        limit: int_arg(args, "limit").map(|n| n.max(0) as usize),
    };

    let results = match storage.search(query, &opts) {
        Ok(results) => results,
        Err(err) => return mcp_err(format!("Search error: {err}. Try simpler keywords.")),
    };

    if results.is_empty() {
        return mcp_text(&format!("No memories found for: {query:?}"));
    }

    let mut out = format!("Found {} memories:\n\n", results.len());
    for (index, result) in results.iter().enumerate() {
        let obs = &result.observation;
        let project = obs
            .project
            .as_deref()
            .map(|p| format!(" | project: {p}"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "[{}] #{} ({}) — {}\n    {}\n    {}{} | scope: {}\n",
            index + 1,
            obs.id,
            obs.kind,
            obs.title,
            truncate_chars(&obs.content, 300),
            obs.created_at,
            project,
            obs.scope,
        );
    }
    mcp_text(&out)
}

fn handle_save(storage: &Storage, args: &Value) -> Value {
    let title = str_arg(args, "title").to_owned();
    let content = str_arg(args, "content").to_owned();
    let mut kind = str_arg(args, "type").to_owned();
    if kind.is_empty() {
        kind = "manual".to_owned();
    }
    let mut session_id = str_arg(args, "session_id").to_owned();
    if session_id.is_empty() {
        session_id = DEFAULT_SESSION.to_owned();
    }
    let project = opt_str_arg(args, "project");
    let topic_key = opt_str_arg(args, "topic_key");

    let suggested = suggest_topic_key(&kind, &title, &content);

    if let Err(err) =
        storage.create_session(&session_id, project.as_deref().unwrap_or(""), "")
    {
        return mcp_err(format!("Failed to save: {err}"));
    }

    let params = AddObservationParams {
        session_id,
        kind: kind.clone(),
        title: title.clone(),
        content,
        tool_name: None,
        project,
        scope: opt_str_arg(args, "scope"),
        topic_key: topic_key.clone(),
    };
    if let Err(err) = storage.add_observation(&params) {
        return mcp_err(format!("Failed to save: {err}"));
    }

    if topic_key.is_none() && !suggested.is_empty() {
        return mcp_text(&format!(
            "Memory saved: {title:?} ({kind})\nSuggested topic_key: {suggested}"
        ));
    }
    mcp_text(&format!("Memory saved: {title:?} ({kind})"))
}

fn handle_context(storage: &Storage, args: &Value) -> Value {
    let project = opt_str_arg(args, "project");
    let scope = opt_str_arg(args, "scope");

    let context = match storage.format_context(project.as_deref(), scope.as_deref()) {
        Ok(context) => context,
        Err(err) => return mcp_err(format!("Failed to get context: {err}")),
    };

    if context.is_empty() {
        return mcp_text("No previous session memories found.");
    }

    let stats = storage.stats().unwrap_or_default();
    let projects =
        if stats.projects.is_empty() { "none".to_owned() } else { stats.projects.join(", ") };

    mcp_text(&format!(
        "{context}\n---\nMemory stats: {} sessions, {} observations across projects: {projects}",
        stats.total_sessions, stats.total_observations,
    ))
}

fn handle_session_summary(storage: &Storage, args: &Value) -> Value {
    let content = str_arg(args, "content").to_owned();
    let project = str_arg(args, "project").to_owned();
    let mut session_id = str_arg(args, "session_id").to_owned();
    if session_id.is_empty() {
        session_id = DEFAULT_SESSION.to_owned();
    }

    if let Err(err) = storage.create_session(&session_id, &project, "") {
        return mcp_err(format!("Failed to save session summary: {err}"));
    }

    let params = AddObservationParams {
        session_id,
        kind: "session_summary".to_owned(),
        title: format!("Session summary: {project}"),
        content,
        project: Some(project.clone()).filter(|p| !p.is_empty()),
        ..Default::default()
    };
    match storage.add_observation(&params) {
        Ok(_) => mcp_text(&format!("Session summary saved for project {project:?}")),
        Err(err) => mcp_err(format!("Failed to save session summary: {err}")),
    }
}

fn handle_session_start(storage: &Storage, args: &Value) -> Value {
    let id = str_arg(args, "id");
    let project = str_arg(args, "project");
    let directory = str_arg(args, "directory");

    match storage.create_session(id, project, directory) {
        Ok(()) => mcp_text(&format!("Session {id:?} started for project {project:?}")),
        Err(err) => mcp_err(format!("Failed to start session: {err}")),
    }
}

fn handle_session_end(storage: &Storage, args: &Value) -> Value {
    let id = str_arg(args, "id");
    let summary = opt_str_arg(args, "summary");

    match storage.end_session(id, summary.as_deref()) {
        Ok(()) => mcp_text(&format!("Session {id:?} completed")),
        Err(err) => mcp_err(format!("Failed to end session: {err}")),
    }
}

fn handle_get_observation(storage: &Storage, args: &Value) -> Value {
    let Some(id) = int_arg(args, "id").filter(|id| *id > 0) else {
        return mcp_err("id is required");
    };

    let obs = match storage.get_observation(id) {
        Ok(obs) => obs,
        Err(_) => return mcp_err(format!("Observation #{id} not found")),
    };

    let mut meta = String::new();
    if let Some(project) = &obs.project {
        let _ = write!(meta, "\nProject: {project}");
    }
    let _ = write!(meta, "\nScope: {}", obs.scope);
    if let Some(topic) = &obs.topic_key {
        let _ = write!(meta, "\nTopic: {topic}");
    }
    if let Some(tool) = &obs.tool_name {
        let _ = write!(meta, "\nTool: {tool}");
    }
    let _ = write!(meta, "\nDuplicates: {}", obs.duplicate_count);
    let _ = write!(meta, "\nRevisions: {}", obs.revision_count);

    mcp_text(&format!(
        "#{} [{}] {}\n{}\nSession: {}{}\nCreated: {}",
        obs.id, obs.kind, obs.title, obs.content, obs.session_id, meta, obs.created_at,
    ))
}

fn handle_suggest_topic_key(args: &Value) -> Value {
    let kind = str_arg(args, "type");
    let title = str_arg(args, "title");
    let content = str_arg(args, "content");

    if title.trim().is_empty() && content.trim().is_empty() {
        return mcp_err("provide title or content to suggest a topic_key");
    }

    let topic_key = suggest_topic_key(kind, title, content);
    mcp_text(&format!("Suggested topic_key: {topic_key}"))
}

fn handle_capture_passive(storage: &Storage, args: &Value) -> Value {
    let content = str_arg(args, "content").to_owned();
    if content.is_empty() {
        return mcp_err("content is required — include text with a '## Key Learnings:' section");
    }

    let params = PassiveCaptureParams {
        session_id: str_arg(args, "session_id").to_owned(),
        content,
        project: opt_str_arg(args, "project"),
        source: opt_str_arg(args, "source").or_else(|| Some("mcp-passive".to_owned())),
    };

    match storage.passive_capture(&params) {
        Ok(result) => mcp_text(&format!(
            "Passive capture complete: extracted={} saved={} duplicates={}",
            result.extracted, result.saved, result.duplicates,
        )),
        Err(err) => mcp_err(format!("Passive capture failed: {err}")),
    }
}

fn handle_save_prompt(storage: &Storage, args: &Value) -> Value {
    let content = str_arg(args, "content").to_owned();
    let mut session_id = str_arg(args, "session_id").to_owned();
    if session_id.is_empty() {
        session_id = DEFAULT_SESSION.to_owned();
    }
    let project = opt_str_arg(args, "project");

    if let Err(err) =
        storage.create_session(&session_id, project.as_deref().unwrap_or(""), "")
    {
        return mcp_err(format!("Failed to save prompt: {err}"));
    }

    let params = AddPromptParams { session_id, content: content.clone(), project };
    match storage.add_prompt(&params) {
        Ok(_) => mcp_text(&format!("Prompt saved: {:?}", truncate_chars(&content, 80))),
        Err(err) => mcp_err(format!("Failed to save prompt: {err}")),
    }
}

fn handle_update(storage: &Storage, args: &Value) -> Value {
    let Some(id) = int_arg(args, "id").filter(|id| *id > 0) else {
        return mcp_err("id is required");
    };

    let params = UpdateObservationParams {
        kind: opt_str_arg(args, "type"),
        title: opt_str_arg(args, "title"),
        content: opt_str_arg(args, "content"),
        project: opt_str_arg(args, "project"),
        scope: opt_str_arg(args, "scope"),
        topic_key: opt_str_arg(args, "topic_key"),
    };
    if params.is_empty() {
        return mcp_err("provide at least one field to update");
    }

    match storage.update_observation(id, &params) {
        Ok(obs) => mcp_text(&format!(
            "Memory updated: #{} {:?} ({}, scope={})",
            obs.id, obs.title, obs.kind, obs.scope
        )),
        Err(err) => mcp_err(format!("Failed to update memory: {err}")),
    }
}

fn handle_delete(storage: &Storage, args: &Value) -> Value {
    let Some(id) = int_arg(args, "id").filter(|id| *id > 0) else {
        return mcp_err("id is required");
    };
    let hard_delete = bool_arg(args, "hard_delete");

    match storage.delete_observation(id, hard_delete) {
        Ok(()) => {
            let mode = if hard_delete { "permanently deleted" } else { "soft-deleted" };
            mcp_text(&format!("Memory #{id} {mode}"))
        },
        Err(err) => mcp_err(format!("Failed to delete memory: {err}")),
    }
}

fn handle_stats(storage: &Storage) -> Value {
    let stats = match storage.stats() {
        Ok(stats) => stats,
        Err(err) => return mcp_err(format!("Failed to get stats: {err}")),
    };

    let projects =
        if stats.projects.is_empty() { "none yet".to_owned() } else { stats.projects.join(", ") };
    mcp_text(&format!(
        "Memory System Stats:\n- Sessions: {}\n- Observations: {}\n- Prompts: {}\n- Projects: {projects}",
        stats.total_sessions, stats.total_observations, stats.total_prompts,
    ))
}

fn handle_timeline(storage: &Storage, args: &Value) -> Value {
    let Some(observation_id) = int_arg(args, "observation_id").filter(|id| *id > 0) else {
        return mcp_err("observation_id is required");
    };
    let before = int_arg(args, "before");
    let after = int_arg(args, "after");

    let result = match storage.timeline(observation_id, before, after) {
        Ok(result) => result,
        Err(err) => return mcp_err(format!("Timeline error: {err}")),
    };

    let mut out = String::new();

    if let Some(session) = &result.session_info {
        let summary = session
            .summary
            .as_deref()
            .map(|s| format!(" — {}", truncate_chars(s, 100)))
            .unwrap_or_default();
        let _ = writeln!(out, "Session: {} ({}){summary}", session.project, session.started_at);
        let _ = writeln!(out, "Total observations in session: {}\n", result.total_in_range);
    }

    if !result.before.is_empty() {
        out.push_str("--- Before ---\n");
        for entry in &result.before {
            let _ = writeln!(
                out,
                "  #{} [{}] {} — {}",
                entry.id,
                entry.kind,
                entry.title,
                truncate_chars(&entry.content, 150)
            );
        }
        out.push('\n');
    }

    let focus = &result.focus;
    let _ = writeln!(out, ">>> #{} [{}] {} <<<", focus.id, focus.kind, focus.title);
    let _ = writeln!(out, "    {}", truncate_chars(&focus.content, 500));
    let _ = writeln!(out, "    {}\n", focus.created_at);

    if !result.after.is_empty() {
        out.push_str("--- After ---\n");
        for entry in &result.after {
            let _ = writeln!(
                out,
                "  #{} [{}] {} — {}",
                entry.id,
                entry.kind,
                entry.title,
                truncate_chars(&entry.content, 150)
            );
        }
    }

    mcp_text(&out)
}
