use std::path::PathBuf;
use std::time::Duration;

/// Store configuration.
///
/// Resolved once per process and passed as an explicit dependency; the
/// engine keeps no hidden globals. `ENGRAM_DATA_DIR` is applied by the CLI
/// before opening the store, never read here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `engram.db`. Created on open if absent.
    pub data_dir: PathBuf,
    /// Byte cap for observation and prompt content before the truncation
    /// marker is appended.
    pub max_observation_length: usize,
    /// Row count for the recent-context window.
    pub max_context_results: usize,
    /// Hard cap on search result limits requested by callers.
    pub max_search_results: usize,
    /// Window inside which whitespace-equivalent content merges into the
    /// existing observation instead of creating a new row.
    pub dedupe_window: Duration,
    /// Minimum byte length for an extracted learning to be saved.
    pub min_passive_item_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            data_dir: home.join(".engram"),
            max_observation_length: 2_000,
            max_context_results: 20,
            max_search_results: 20,
            dedupe_window: Duration::from_secs(15 * 60),
            min_passive_item_len: 40,
        }
    }
}

impl Config {
    /// Full path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("engram.db")
    }

    /// The dedupe window as a SQLite datetime modifier, e.g. `-15 minutes`.
    pub fn dedupe_window_modifier(&self) -> String {
        let minutes = (self.dedupe_window.as_secs() / 60).max(1);
        format!("-{minutes} minutes")
    }
}
