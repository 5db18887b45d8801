//! The `manifest.json` listing known chunks.
//!
//! The manifest is the only sync file that receives diffs in version
//! control; chunk files themselves are immutable once written.

use std::path::Path;

use engram_core::{EngramError, Result};
use serde::{Deserialize, Serialize};

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    #[serde(default)]
    pub chunks: Vec<ChunkEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkEntry {
    pub id: String,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub counts: RecordCounts,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RecordCounts {
    pub sessions: usize,
    pub observations: usize,
    pub prompts: usize,
}

impl Default for Manifest {
    fn default() -> Self {
        Self { version: MANIFEST_VERSION, chunks: Vec::new() }
    }
}

impl Manifest {
    /// Loads the manifest, defaulting to empty when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| EngramError::storage("read manifest", e)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(EngramError::storage("read manifest", err)),
        }
    }

    /// Writes the manifest as pretty JSON (the file is diffed in git).
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| EngramError::storage("write manifest", e))?;
        std::fs::write(path, raw).map_err(|e| EngramError::storage("write manifest", e))
    }

    pub fn contains(&self, chunk_id: &str) -> bool {
        self.chunks.iter().any(|chunk| chunk.id == chunk_id)
    }
}
