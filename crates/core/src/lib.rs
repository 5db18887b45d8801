//! Core types and pure functions for Engram.
//!
//! This crate holds the domain types shared across the storage, sync, and
//! adapter crates, plus the side-effect-free pieces of the memory engine:
//! private-tag redaction, scope/topic/query normalization, and learnings
//! extraction.

mod capture;
mod config;
mod env_config;
mod error;
mod normalize;
mod observation;
mod prompt;
mod redact;
mod session;
mod snapshot;
mod time;

pub use capture::extract_learnings;
pub use config::Config;
pub use env_config::env_parse_with_default;
pub use error::{EngramError, Result};
pub use normalize::{
    classify_tool, content_hash, normalize_scope, normalize_topic_key, normalize_topic_segment,
    sanitize_fts_query, suggest_topic_key,
};
pub use observation::{
    AddObservationParams, CaptureResult, Observation, PassiveCaptureParams, SearchOptions,
    SearchResult, Stats, TimelineResult, UpdateObservationParams,
};
pub use prompt::{AddPromptParams, Prompt};
pub use redact::strip_private_tags;
pub use session::{Session, SessionSummary};
pub use snapshot::{ExportData, ImportResult};
pub use time::{now, truncate_chars, truncate_with_marker};
