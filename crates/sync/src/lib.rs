//! Per-checkout memory sync over version-controlled files.
//!
//! `engram sync` writes new memories as a content-addressed gzipped chunk
//! under `<work>/.engram/chunks/` and lists it in `manifest.json`;
//! teammates commit those files and import them on their own machines. The
//! `sync_chunks` table in the database records which chunk ids have been
//! applied, so repeated imports (and the same chunk reaching a checkout
//! through different paths) are absorbed silently.

mod chunk;
mod manifest;

use std::path::{Path, PathBuf};

use engram_core::{now, EngramError, Result};
use engram_storage::Storage;

pub use chunk::ChunkRecord;
pub use manifest::{ChunkEntry, Manifest, RecordCounts};

/// Outcome of a sync export.
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    pub chunk_id: String,
    pub sessions_exported: usize,
    pub observations_exported: usize,
    pub prompts_exported: usize,
    /// Nothing new: the snapshot was empty or this exact chunk already
    /// exists.
    pub is_empty: bool,
}

/// Outcome of a sync import.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncImportResult {
    pub chunks_imported: usize,
    pub chunks_skipped: usize,
    pub sessions_imported: usize,
    pub observations_imported: usize,
    pub prompts_imported: usize,
}

/// Sync status: chunks applied locally, chunks listed in the checkout, and
/// how many of the latter are still pending import.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncStatus {
    pub local_chunks: usize,
    pub remote_chunks: usize,
    pub pending_import: usize,
}

pub struct Syncer<'a> {
    store: &'a Storage,
    sync_dir: PathBuf,
}

impl<'a> Syncer<'a> {
    /// `sync_dir` is the checkout-relative `.engram` directory.
    pub fn new(store: &'a Storage, sync_dir: impl Into<PathBuf>) -> Self {
        Self { store, sync_dir: sync_dir.into() }
    }

    fn manifest_path(&self) -> PathBuf {
        self.sync_dir.join("manifest.json")
    }

    fn chunk_path(&self, chunk_id: &str) -> PathBuf {
        self.sync_dir.join("chunks").join(format!("{chunk_id}.jsonl.gz"))
    }

    /// Snapshots the database (optionally filtered to one project) into a
    /// new chunk. Re-running on an unchanged database is a no-op: the
    /// content-derived chunk id is already recorded.
    pub fn export(&self, created_by: &str, project: Option<&str>) -> Result<SyncResult> {
        let data = self.store.export_project(project)?;
        if data.is_empty() {
            return Ok(SyncResult { is_empty: true, ..SyncResult::default() });
        }

        let content = chunk::encode_records(&data)?;
        let chunk_id = chunk::chunk_id(&content);

        if self.store.synced_chunks()?.contains(&chunk_id) {
            return Ok(SyncResult { chunk_id, is_empty: true, ..SyncResult::default() });
        }

        std::fs::create_dir_all(self.sync_dir.join("chunks"))
            .map_err(|e| EngramError::storage("create sync dir", e))?;
        std::fs::write(self.chunk_path(&chunk_id), chunk::gzip(&content)?)
            .map_err(|e| EngramError::storage("write chunk", e))?;

        let mut manifest = Manifest::load(&self.manifest_path())?;
        if !manifest.contains(&chunk_id) {
            manifest.chunks.push(ChunkEntry {
                id: chunk_id.clone(),
                created_by: created_by.to_owned(),
                project: project.map(str::to_owned),
                counts: RecordCounts {
                    sessions: data.sessions.len(),
                    observations: data.observations.len(),
                    prompts: data.prompts.len(),
                },
                created_at: now(),
            });
            manifest.save(&self.manifest_path())?;
        }

        self.store.record_synced_chunk(&chunk_id)?;
        tracing::info!(chunk = %chunk_id, observations = data.observations.len(), "exported sync chunk");

        Ok(SyncResult {
            chunk_id,
            sessions_exported: data.sessions.len(),
            observations_exported: data.observations.len(),
            prompts_exported: data.prompts.len(),
            is_empty: false,
        })
    }

    /// Applies every manifest-listed chunk that this database has not seen
    /// yet. Each chunk goes through the transactional snapshot import and
    /// is then recorded, so a second run skips everything.
    pub fn import(&self) -> Result<SyncImportResult> {
        let manifest = Manifest::load(&self.manifest_path())?;
        let applied = self.store.synced_chunks()?;

        let mut result = SyncImportResult::default();
        for entry in &manifest.chunks {
            if applied.contains(&entry.id) {
                result.chunks_skipped += 1;
                continue;
            }

            let bytes = std::fs::read(self.chunk_path(&entry.id))
                .map_err(|e| EngramError::storage("read chunk", format!("{}: {e}", entry.id)))?;
            let content = chunk::gunzip(&bytes)?;

            if chunk::chunk_id(&content) != entry.id {
                return Err(EngramError::storage(
                    "read chunk",
                    format!("{}: content does not match its id", entry.id),
                ));
            }

            let data = chunk::decode_records(&content)?;
            let imported = self.store.import(&data)?;

            self.store.record_synced_chunk(&entry.id)?;
            result.chunks_imported += 1;
            result.sessions_imported += imported.sessions_imported;
            result.observations_imported += imported.observations_imported;
            result.prompts_imported += imported.prompts_imported;
            tracing::info!(chunk = %entry.id, "imported sync chunk");
        }

        Ok(result)
    }

    pub fn status(&self) -> Result<SyncStatus> {
        let manifest = Manifest::load(&self.manifest_path())?;
        let applied = self.store.synced_chunks()?;
        let pending = manifest.chunks.iter().filter(|entry| !applied.contains(&entry.id)).count();

        Ok(SyncStatus {
            local_chunks: applied.len(),
            remote_chunks: manifest.chunks.len(),
            pending_import: pending,
        })
    }

    /// Where chunk files live, for callers that print hints.
    pub fn sync_dir(&self) -> &Path {
        &self.sync_dir
    }
}

/// Label recorded as a chunk's creator.
pub fn username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_owned())
}
