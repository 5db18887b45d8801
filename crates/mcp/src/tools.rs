//! Tool registry: names, profiles, and `tools/list` schemas.

use std::collections::HashSet;

use serde_json::{json, Value};

/// Every tool this server can expose. The enum keeps dispatch exhaustive;
/// a new tool that is not wired into the handler fails to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpTool {
    Save,
    Search,
    Context,
    SessionSummary,
    SessionStart,
    SessionEnd,
    GetObservation,
    SuggestTopicKey,
    CapturePassive,
    SavePrompt,
    Update,
    Delete,
    Stats,
    Timeline,
}

impl McpTool {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "mem_save" => Some(Self::Save),
            "mem_search" => Some(Self::Search),
            "mem_context" => Some(Self::Context),
            "mem_session_summary" => Some(Self::SessionSummary),
            "mem_session_start" => Some(Self::SessionStart),
            "mem_session_end" => Some(Self::SessionEnd),
            "mem_get_observation" => Some(Self::GetObservation),
            "mem_suggest_topic_key" => Some(Self::SuggestTopicKey),
            "mem_capture_passive" => Some(Self::CapturePassive),
            "mem_save_prompt" => Some(Self::SavePrompt),
            "mem_update" => Some(Self::Update),
            "mem_delete" => Some(Self::Delete),
            "mem_stats" => Some(Self::Stats),
            "mem_timeline" => Some(Self::Timeline),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Save => "mem_save",
            Self::Search => "mem_search",
            Self::Context => "mem_context",
            Self::SessionSummary => "mem_session_summary",
            Self::SessionStart => "mem_session_start",
            Self::SessionEnd => "mem_session_end",
            Self::GetObservation => "mem_get_observation",
            Self::SuggestTopicKey => "mem_suggest_topic_key",
            Self::CapturePassive => "mem_capture_passive",
            Self::SavePrompt => "mem_save_prompt",
            Self::Update => "mem_update",
            Self::Delete => "mem_delete",
            Self::Stats => "mem_stats",
            Self::Timeline => "mem_timeline",
        }
    }
}

/// Tools agents use during coding sessions.
const PROFILE_AGENT: &[&str] = &[
    "mem_save",
    "mem_search",
    "mem_context",
    "mem_session_summary",
    "mem_session_start",
    "mem_session_end",
    "mem_get_observation",
    "mem_suggest_topic_key",
    "mem_capture_passive",
    "mem_save_prompt",
    "mem_update",
];

/// Tools for manual curation and dashboards.
const PROFILE_ADMIN: &[&str] = &["mem_delete", "mem_stats", "mem_timeline"];

/// Resolves a comma-separated list of profile names and/or individual tool
/// names into an allowlist. `None` means "register everything".
pub fn resolve_tools(input: &str) -> Option<HashSet<String>> {
    let input = input.trim();
    if input.is_empty() || input == "all" {
        return None;
    }

    let mut result = HashSet::new();
    for token in input.split(',') {
        let token = token.trim();
        match token {
            "" => {},
            "all" => return None,
            "agent" => result.extend(PROFILE_AGENT.iter().map(|s| (*s).to_owned())),
            "admin" => result.extend(PROFILE_ADMIN.iter().map(|s| (*s).to_owned())),
            name => {
                result.insert(name.to_owned());
            },
        }
    }

    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

/// The `tools/list` payload, filtered by the allowlist.
pub fn tools_json(allowlist: Option<&HashSet<String>>) -> Value {
    let tools: Vec<Value> = tool_schemas()
        .into_iter()
        .filter(|tool| match allowlist {
            Some(allowed) => {
                tool.get("name").and_then(Value::as_str).is_some_and(|name| allowed.contains(name))
            },
            None => true,
        })
        .collect();
    json!({ "tools": tools })
}

fn tool_schemas() -> Vec<Value> {
    vec![
        json!({
            "name": "mem_search",
            "description": "Search your persistent memory across all sessions. Use this to find past decisions, bugs fixed, patterns used, or any context from previous coding sessions.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query — natural language or keywords" },
                    "type": { "type": "string", "description": "Filter by type: decision, architecture, bugfix, pattern, config, discovery, manual, tool_use" },
                    "project": { "type": "string", "description": "Filter by project name" },
                    "scope": { "type": "string", "description": "Filter by scope: project (default) or personal" },
                    "limit": { "type": "integer", "description": "Max results (default: 10, max: 20)" }
                },
                "required": ["query"]
            }
        }),
        json!({
            "name": "mem_save",
            "description": "Save an important observation to persistent memory. Call this proactively after significant work: decisions, bug fixes, new patterns, configuration changes, discoveries. Use a short searchable title and structured **What**/**Why**/**Where**/**Learned** content.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "Short, searchable title" },
                    "content": { "type": "string", "description": "Structured content using **What**, **Why**, **Where**, **Learned**" },
                    "type": { "type": "string", "description": "Category: decision, architecture, bugfix, pattern, config, discovery, learning (default: manual)" },
                    "session_id": { "type": "string", "description": "Session ID to associate with (default: manual-save)" },
                    "project": { "type": "string", "description": "Project name" },
                    "scope": { "type": "string", "description": "project (default) or personal" },
                    "topic_key": { "type": "string", "description": "Optional topic identifier for upserts, e.g. architecture/auth-model" }
                },
                "required": ["title", "content"]
            }
        }),
        json!({
            "name": "mem_context",
            "description": "Get recent memory context from previous sessions: recent sessions, prompts, and observations.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "project": { "type": "string", "description": "Filter by project (omit for all projects)" },
                    "scope": { "type": "string", "description": "Filter observations by scope: project (default) or personal" }
                }
            }
        }),
        json!({
            "name": "mem_session_summary",
            "description": "Save a comprehensive end-of-session summary (Goal / Instructions / Discoveries / Accomplished / Relevant Files) so future sessions can pick up where this one left off.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "content": { "type": "string", "description": "Full session summary" },
                    "session_id": { "type": "string", "description": "Session ID (default: manual-save)" },
                    "project": { "type": "string", "description": "Project name" }
                },
                "required": ["content", "project"]
            }
        }),
        json!({
            "name": "mem_session_start",
            "description": "Register the start of a new coding session.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "Unique session identifier" },
                    "project": { "type": "string", "description": "Project name" },
                    "directory": { "type": "string", "description": "Working directory" }
                },
                "required": ["id", "project"]
            }
        }),
        json!({
            "name": "mem_session_end",
            "description": "Mark a coding session as completed with an optional summary.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "id": { "type": "string", "description": "Session identifier to close" },
                    "summary": { "type": "string", "description": "Summary of what was accomplished" }
                },
                "required": ["id"]
            }
        }),
        json!({
            "name": "mem_get_observation",
            "description": "Get the full, untruncated content of a specific observation found via mem_search or mem_timeline.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "id": { "type": "integer", "description": "The observation ID to retrieve" }
                },
                "required": ["id"]
            }
        }),
        json!({
            "name": "mem_suggest_topic_key",
            "description": "Suggest a stable topic_key for memory upserts. Use before mem_save when an evolving topic should update a single observation over time.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "type": { "type": "string", "description": "Observation type, e.g. architecture, decision, bugfix" },
                    "title": { "type": "string", "description": "Observation title (preferred input for stable keys)" },
                    "content": { "type": "string", "description": "Fallback when title is empty" }
                }
            }
        }),
        json!({
            "name": "mem_capture_passive",
            "description": "Extract and save structured learnings from text ending in a '## Key Learnings:' section. Duplicates are detected and skipped, so re-running on the same text is safe.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "content": { "type": "string", "description": "Text containing a learnings section with numbered or bulleted items" },
                    "session_id": { "type": "string", "description": "Session ID (default: manual-save)" },
                    "project": { "type": "string", "description": "Project name" },
                    "source": { "type": "string", "description": "Source identifier, e.g. 'subagent-stop'" }
                },
                "required": ["content"]
            }
        }),
        json!({
            "name": "mem_save_prompt",
            "description": "Save a user prompt to persistent memory so future sessions know what the user asked for.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "content": { "type": "string", "description": "The user's prompt text" },
                    "session_id": { "type": "string", "description": "Session ID to associate with (default: manual-save)" },
                    "project": { "type": "string", "description": "Project name" }
                },
                "required": ["content"]
            }
        }),
        json!({
            "name": "mem_update",
            "description": "Update an existing observation by ID. Only provided fields are changed.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "id": { "type": "integer", "description": "Observation ID to update" },
                    "title": { "type": "string" },
                    "content": { "type": "string" },
                    "type": { "type": "string" },
                    "project": { "type": "string" },
                    "scope": { "type": "string", "description": "project or personal" },
                    "topic_key": { "type": "string", "description": "Normalized internally" }
                },
                "required": ["id"]
            }
        }),
        json!({
            "name": "mem_delete",
            "description": "Delete an observation by ID. Soft-delete by default; set hard_delete=true for permanent deletion.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "id": { "type": "integer", "description": "Observation ID to delete" },
                    "hard_delete": { "type": "boolean", "description": "If true, permanently deletes the observation" }
                },
                "required": ["id"]
            }
        }),
        json!({
            "name": "mem_stats",
            "description": "Show memory system statistics: total sessions, observations, prompts, and projects tracked.",
            "inputSchema": { "type": "object", "properties": {} }
        }),
        json!({
            "name": "mem_timeline",
            "description": "Show chronological context around a specific observation. Search first, then use the timeline to drill into the surrounding events.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "observation_id": { "type": "integer", "description": "The observation ID to center on" },
                    "before": { "type": "integer", "description": "Observations to show before the focus (default: 5)" },
                    "after": { "type": "integer", "description": "Observations to show after the focus (default: 5)" }
                },
                "required": ["observation_id"]
            }
        }),
    ]
}
