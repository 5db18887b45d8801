//! Passive capture: learnings extracted from free text, each saved as its
//! own `passive` observation through the normal dedup path.

use engram_core::{
    extract_learnings, truncate_chars, AddObservationParams, CaptureResult, PassiveCaptureParams,
    Result,
};

use super::observations::WriteOutcome;
use super::Storage;

impl Storage {
    /// Scans `content` for a learnings section and saves each item long
    /// enough to carry signal. Items are deduplicated like any other
    /// observation write; the counters report what happened so callers can
    /// re-run on the same text safely.
    ///
    /// A missing `session_id` falls back to `manual-save`, which is created
    /// on demand. An explicit `session_id` is used as-is; pointing it at a
    /// session that does not exist surfaces the foreign-key failure.
    pub fn passive_capture(&self, p: &PassiveCaptureParams) -> Result<CaptureResult> {
        let session_id = if p.session_id.trim().is_empty() {
            self.create_session("manual-save", p.project.as_deref().unwrap_or(""), "")?;
            "manual-save"
        } else {
            p.session_id.as_str()
        };

        let source = p.source.clone().filter(|s| !s.is_empty());
        let min_len = self.config().min_passive_item_len;

        let mut result = CaptureResult::default();
        for item in extract_learnings(&p.content) {
            if item.len() < min_len {
                continue;
            }
            result.extracted += 1;

            let params = AddObservationParams {
                session_id: session_id.to_owned(),
                kind: "passive".to_owned(),
                title: truncate_chars(&item, 80),
                content: item,
                tool_name: source.clone(),
                project: p.project.clone(),
                scope: None,
                topic_key: None,
            };
            match self.add_observation_outcome(&params)? {
                (_, WriteOutcome::Inserted) => result.saved += 1,
                (_, WriteOutcome::Upserted | WriteOutcome::Deduplicated) => result.duplicates += 1,
            }
        }

        Ok(result)
    }
}
