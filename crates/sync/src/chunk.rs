//! Content-addressed chunk files.
//!
//! A chunk is the gzipped newline-delimited JSON of a snapshot: one record
//! per line, each tagged with its kind. The chunk id is the hex SHA-256 of
//! the uncompressed content, so identical snapshots produce identical
//! files and re-exporting is naturally idempotent.

use std::io::{Read, Write};

use engram_core::{EngramError, ExportData, Observation, Prompt, Result, Session};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One line of a chunk file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChunkRecord {
    Session(Session),
    Observation(Observation),
    Prompt(Prompt),
}

/// Renders a snapshot as JSONL, sessions first so imports satisfy the
/// session foreign key before observations and prompts arrive.
pub fn encode_records(data: &ExportData) -> Result<String> {
    let mut out = String::new();
    let mut push = |record: &ChunkRecord| -> Result<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| EngramError::storage("encode chunk", e))?;
        out.push_str(&line);
        out.push('\n');
        Ok(())
    };

    for session in &data.sessions {
        push(&ChunkRecord::Session(session.clone()))?;
    }
    for observation in &data.observations {
        push(&ChunkRecord::Observation(observation.clone()))?;
    }
    for prompt in &data.prompts {
        push(&ChunkRecord::Prompt(prompt.clone()))?;
    }
    Ok(out)
}

/// Parses chunk JSONL back into a snapshot. Blank lines are tolerated;
/// malformed lines are a storage error naming the line number.
pub fn decode_records(content: &str) -> Result<ExportData> {
    let mut data = ExportData {
        version: String::new(),
        exported_at: String::new(),
        sessions: Vec::new(),
        observations: Vec::new(),
        prompts: Vec::new(),
    };

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: ChunkRecord = serde_json::from_str(line).map_err(|e| {
            EngramError::storage("decode chunk", format!("line {}: {e}", index + 1))
        })?;
        match record {
            ChunkRecord::Session(session) => data.sessions.push(session),
            ChunkRecord::Observation(observation) => data.observations.push(observation),
            ChunkRecord::Prompt(prompt) => data.prompts.push(prompt),
        }
    }
    Ok(data)
}

/// Hex SHA-256 of the uncompressed chunk content.
pub fn chunk_id(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("{digest:x}")
}

pub fn gzip(content: &str) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(content.as_bytes())
        .and_then(|()| encoder.finish())
        .map_err(|e| EngramError::storage("gzip chunk", e))
}

pub fn gunzip(bytes: &[u8]) -> Result<String> {
    let mut decoder = GzDecoder::new(bytes);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .map_err(|e| EngramError::storage("gunzip chunk", e))?;
    Ok(content)
}
