use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::*;

pub const GUEST_NAME: &str = "Guest";

/// Result of a won round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub elapsed_secs: u32,
    pub timestamp: DateTime<Utc>,
}

impl ScoreEntry {
    /// Blank or missing names are recorded as [`GUEST_NAME`].
    pub fn new(name: Option<&str>, elapsed_secs: u32, timestamp: DateTime<Utc>) -> Self {
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => GUEST_NAME.to_owned(),
        };
        Self {
            name,
            elapsed_secs,
            timestamp,
        }
    }
}

/// Append-only sink for won rounds.
pub trait ScoreStore {
    fn append(&mut self, entry: ScoreEntry);
    fn list(&self) -> &[ScoreEntry];
}

/// In-memory store that can round-trip through JSON for the embedder to persist.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryScoreStore {
    entries: Vec<ScoreEntry>,
}

impl MemoryScoreStore {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Fastest rounds first, ties broken by who got there earlier.
    pub fn best(&self, count: usize) -> Vec<&ScoreEntry> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by_key(|entry| (entry.elapsed_secs, entry.timestamp));
        entries.truncate(count);
        entries
    }
}

impl ScoreStore for MemoryScoreStore {
    fn append(&mut self, entry: ScoreEntry) {
        log::debug!("score recorded: {} in {}s", entry.name, entry.elapsed_secs);
        self.entries.push(entry);
    }

    fn list(&self) -> &[ScoreEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn blank_names_become_guest() {
        assert_eq!(ScoreEntry::new(None, 1, at(0)).name, GUEST_NAME);
        assert_eq!(ScoreEntry::new(Some("  "), 1, at(0)).name, GUEST_NAME);
        assert_eq!(ScoreEntry::new(Some(" Ada "), 1, at(0)).name, "Ada");
    }

    #[test]
    fn store_keeps_insertion_order_and_ranks_best() {
        let mut store = MemoryScoreStore::default();
        store.append(ScoreEntry::new(Some("slow"), 90, at(10)));
        store.append(ScoreEntry::new(Some("fast"), 12, at(20)));
        store.append(ScoreEntry::new(Some("tie"), 12, at(5)));

        let names: Vec<_> = store.list().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["slow", "fast", "tie"]);

        let best: Vec<_> = store.best(2).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(best, ["tie", "fast"]);
    }

    #[test]
    fn json_round_trip_preserves_entries() {
        let mut store = MemoryScoreStore::default();
        store.append(ScoreEntry::new(Some("Ada"), 42, at(1_700_000_000)));

        let restored = MemoryScoreStore::from_json(&store.to_json().unwrap()).unwrap();
        assert_eq!(restored, store);
        assert!(matches!(
            MemoryScoreStore::from_json("{"),
            Err(GameError::Scores(_))
        ));
    }
}
