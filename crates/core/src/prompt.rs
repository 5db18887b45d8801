//! User prompt row types.

use serde::{Deserialize, Serialize};

/// Verbatim user intent captured by an adapter. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub id: i64,
    pub session_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub created_at: String,
}

/// Input for appending a prompt.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddPromptParams {
    pub session_id: String,
    pub content: String,
    #[serde(default)]
    pub project: Option<String>,
}
