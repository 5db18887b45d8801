//! Whole-database snapshot format for export/import.

use serde::{Deserialize, Serialize};

use crate::observation::Observation;
use crate::prompt::Prompt;
use crate::session::Session;

/// Serializable dump of the whole database.
///
/// Observation ids are reassigned on import and `normalized_hash` is
/// recomputed; everything else round-trips as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: String,
    pub exported_at: String,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub prompts: Vec<Prompt>,
}

impl ExportData {
    /// True when the snapshot carries no records at all.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty() && self.observations.is_empty() && self.prompts.is_empty()
    }
}

/// Row counts affected by an import.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ImportResult {
    pub sessions_imported: usize,
    pub observations_imported: usize,
    pub prompts_imported: usize,
}
