//! Observation row and parameter types.

use serde::{Deserialize, Serialize};

use crate::session::Session;

/// One atomic unit of recalled knowledge.
///
/// Timestamps are carried as their persisted `YYYY-MM-DD HH:MM:SS` UTC
/// strings; the engine never round-trips them through a datetime type.
/// The internal `normalized_hash` column is deliberately absent here — it
/// is recomputed on every write and never crosses the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub id: i64,
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_key: Option<String>,
    pub revision_count: i64,
    pub duplicate_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
}

/// An observation plus its FTS5 rank (lower is a better match).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub observation: Observation,
    pub rank: f64,
}

/// Optional filters for full-text search.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub kind: Option<String>,
    pub project: Option<String>,
    pub scope: Option<String>,
    pub limit: Option<usize>,
}

/// Input for creating (or upserting) an observation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddObservationParams {
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub topic_key: Option<String>,
}

/// Partial update of an observation; `None` fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateObservationParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub project: Option<String>,
    pub scope: Option<String>,
    pub topic_key: Option<String>,
}

impl UpdateObservationParams {
    /// True when no field is set, which the engine rejects.
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.title.is_none()
            && self.content.is_none()
            && self.project.is_none()
            && self.scope.is_none()
            && self.topic_key.is_none()
    }
}

/// Input for passive learnings capture.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PassiveCaptureParams {
    #[serde(default)]
    pub session_id: String,
    pub content: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Counters reported by passive capture. `extracted` counts the items that
/// passed the minimum-length filter, so `extracted == saved + duplicates`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CaptureResult {
    pub extracted: usize,
    pub saved: usize,
    pub duplicates: usize,
}

/// Chronological neighborhood of a focus observation within its session.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineResult {
    pub focus: Observation,
    pub before: Vec<Observation>,
    pub after: Vec<Observation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_info: Option<Session>,
    pub total_in_range: i64,
}

/// Aggregate totals over the live database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total_sessions: i64,
    pub total_observations: i64,
    pub total_prompts: i64,
    pub projects: Vec<String>,
}
