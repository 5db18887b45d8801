//! Model Context Protocol server over stdio.
//!
//! Newline-delimited JSON-RPC 2.0: one request per line on stdin, one
//! response per line on stdout. Any agent that speaks MCP gets persistent
//! memory by registering `engram mcp` as a stdio server. Tool profiles
//! (`--tools=agent`, `--tools=admin`, individual names) trim the
//! registered set for clients that budget tool context.

mod handlers;
mod tools;

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Write};

use engram_storage::Storage;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub use tools::{resolve_tools, McpTool};

use handlers::handle_tool_call;
use tools::tools_json;

const SERVER_INSTRUCTIONS: &str = "Engram provides persistent memory that survives across \
    sessions and context compactions. Use these tools to save decisions, bugs, architecture \
    choices, or discoveries to memory; recall past work from previous sessions; manage session \
    lifecycle; and recover context after compaction. Key tools: mem_save, mem_search, \
    mem_context, mem_session_summary, mem_get_observation, mem_suggest_topic_key.";

#[derive(Deserialize)]
struct McpRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<serde_json::Value>,
    method: String,
    #[serde(default)]
    params: serde_json::Value,
}

#[derive(Serialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

#[derive(Serialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
}

/// Serves MCP over stdio until stdin closes. `allowlist` of `None`
/// registers every tool.
pub fn run_mcp_server(storage: &Storage, allowlist: Option<HashSet<String>>) {
    tracing::info!("MCP server starting on stdio");
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let reader = BufReader::new(stdin.lock());

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        if line.is_empty() {
            continue;
        }

        let Some(response) = handle_line(storage, allowlist.as_ref(), &line) else {
            continue;
        };
        if let Ok(raw) = serde_json::to_string(&response) {
            let _ = writeln!(stdout, "{raw}");
            let _ = stdout.flush();
        }
    }
}

fn handle_line(
    storage: &Storage,
    allowlist: Option<&HashSet<String>>,
    line: &str,
) -> Option<McpResponse> {
    let parsed: serde_json::Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            return Some(McpResponse {
                jsonrpc: "2.0".to_owned(),
                id: json!(null),
                result: None,
                error: Some(McpError { code: -32700, message: format!("Parse error: {err}") }),
            });
        },
    };

    let request: McpRequest = match serde_json::from_value(parsed.clone()) {
        Ok(request) => request,
        Err(err) => {
            return Some(McpResponse {
                jsonrpc: "2.0".to_owned(),
                id: parsed.get("id").cloned().unwrap_or(json!(null)),
                result: None,
                error: Some(McpError {
                    code: -32600,
                    message: format!("Invalid Request: {err}"),
                }),
            });
        },
    };

    // Notifications (no id) get no response.
    let id = request.id?;

    Some(match request.method.as_str() {
        "initialize" => McpResponse {
            jsonrpc: "2.0".to_owned(),
            id,
            result: Some(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "engram", "version": env!("CARGO_PKG_VERSION") },
                "instructions": SERVER_INSTRUCTIONS,
            })),
            error: None,
        },
        "tools/list" => McpResponse {
            jsonrpc: "2.0".to_owned(),
            id,
            result: Some(tools_json(allowlist)),
            error: None,
        },
        "tools/call" => handle_tool_call(storage, allowlist, &request.params, id),
        method => McpResponse {
            jsonrpc: "2.0".to_owned(),
            id,
            result: None,
            error: Some(McpError {
                code: -32601,
                message: format!("Method not found: {method}"),
            }),
        },
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use engram_core::Config;
    use tempfile::TempDir;

    use super::*;

    fn test_store() -> (Storage, TempDir) {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            data_dir: dir.path().to_path_buf(),
            dedupe_window: Duration::from_secs(3600),
            ..Config::default()
        };
        (Storage::open(cfg).unwrap(), dir)
    }

    fn call(storage: &Storage, line: &str) -> serde_json::Value {
        let response = handle_line(storage, None, line).expect("expected a response");
        serde_json::to_value(&response).unwrap()
    }

    #[test]
    fn initialize_reports_server_info() {
        let (storage, _dir) = test_store();
        let response =
            call(&storage, r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#);
        assert_eq!(response["result"]["serverInfo"]["name"], "engram");
        assert!(response.get("error").is_none());
    }

    #[test]
    fn tools_list_includes_mem_save() {
        let (storage, _dir) = test_store();
        let response =
            call(&storage, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list","params":{}}"#);
        let names: Vec<&str> = response["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"mem_save"));
        assert!(names.contains(&"mem_timeline"));
    }

    #[test]
    fn save_then_search_round_trip() {
        let (storage, _dir) = test_store();

        let save = call(
            &storage,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"mem_save","arguments":{"title":"JWT middleware","content":"Validated tokens at the gateway","type":"decision","project":"engram"}}}"#,
        );
        let text = save["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Memory saved"));
        assert!(text.contains("Suggested topic_key:"));

        let search = call(
            &storage,
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"mem_search","arguments":{"query":"gateway"}}}"#,
        );
        let text = search["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Found 1 memories"));
        assert!(text.contains("JWT middleware"));
    }

    #[test]
    fn errors_use_tool_error_channel() {
        let (storage, _dir) = test_store();
        let response = call(
            &storage,
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"mem_get_observation","arguments":{"id":999}}}"#,
        );
        assert!(response.get("error").is_none() || response["error"].is_null());
        assert_eq!(response["result"]["isError"], true);
    }

    #[test]
    fn unknown_tool_is_a_protocol_error() {
        let (storage, _dir) = test_store();
        let response = call(
            &storage,
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"mem_nope","arguments":{}}}"#,
        );
        assert_eq!(response["error"]["code"], -32602);
    }

    #[test]
    fn allowlist_blocks_unregistered_tools() {
        let (storage, _dir) = test_store();
        let allow = resolve_tools("admin");
        let response = handle_line(
            &storage,
            allow.as_ref(),
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"mem_save","arguments":{"title":"t","content":"c"}}}"#,
        )
        .unwrap();
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], -32602);
    }

    #[test]
    fn parse_errors_report_code() {
        let (storage, _dir) = test_store();
        let value = call(&storage, "{not json");
        assert_eq!(value["error"]["code"], -32700);
    }

    #[test]
    fn notifications_get_no_response() {
        let (storage, _dir) = test_store();
        assert!(handle_line(
            &storage,
            None,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#
        )
        .is_none());
    }
}
