// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Progress record document.
//!
//! JSON targets hold a small progress record: one entry per calendar date,
//! plus a last-modified timestamp and an entry count. The document on disk is
//! the only copy. Every update reads it back, upserts today's entry, and
//! rewrites the whole file.
//!
//! # Layout
//!
//! ```json
//! {
//!   "daily_updates": {
//!     "2025-06-01": {
//!       "timestamp": "2025-06-01T09:30:00+02:00",
//!       "activity": "testing",
//!       "status": "completed",
//!       "notes": "Quick update",
//!       "emoji": "🚀"
//!     }
//!   },
//!   "last_modified": "2025-06-01T09:30:00+02:00",
//!   "total_entries": 1
//! }
//! ```
//!
//! Top-level keys other than these three are carried over untouched, and so
//! are entries of earlier dates that do not follow the layout above.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    collections::BTreeMap,
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// Progress record stored in a JSON target.
///
/// # Invariant
///
/// - At most one entry per calendar date.
/// - `total_entries` equals the number of entries after every upsert.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProgressRecord {
    /// Entries keyed by `YYYY-MM-DD`.
    #[serde(default)]
    pub daily_updates: BTreeMap<String, DailyUpdate>,

    /// Timestamp of last upsert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    /// Number of entries in `daily_updates`.
    #[serde(default)]
    pub total_entries: usize,

    /// Unrelated top-level keys.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProgressRecord {
    /// Load record from disk.
    ///
    /// A missing file, a file that is not UTF-8, or a file that is not a JSON
    /// object all yield an empty record. Any JSON object is salvaged: entries
    /// and unrelated keys survive even when they do not match the layout.
    ///
    /// # Errors
    ///
    /// - Return [`ProgressError`] if file exists but cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = match read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no progress record at {:?}, starting fresh", path.display());
                return Ok(Self::default());
            }
            Err(err) if err.kind() == ErrorKind::InvalidData => {
                warn!("progress record {:?} is not UTF-8, starting fresh", path.display());
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(ProgressError {
                    source: err,
                    path: path.to_path_buf(),
                })
            }
        };

        match serde_json::from_str::<Value>(&data) {
            Ok(Value::Object(document)) => Ok(Self::from_document(document)),
            Ok(_) => {
                warn!(
                    "progress record {:?} is not a JSON object, starting fresh",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(err) => {
                warn!(
                    "progress record {:?} does not parse, starting fresh: {err}",
                    path.display()
                );
                Ok(Self::default())
            }
        }
    }

    fn from_document(mut document: Map<String, Value>) -> Self {
        let daily_updates = match document.remove("daily_updates") {
            Some(updates) => serde_json::from_value(updates).unwrap_or_else(|err| {
                warn!("dropping daily_updates that is not an object: {err}");
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };

        let last_modified = match document.remove("last_modified") {
            Some(Value::String(stamp)) => Some(stamp),
            _ => None,
        };

        // INVARIANT: Entry count is always derived, never trusted from disk.
        document.remove("total_entries");

        Self {
            total_entries: daily_updates.len(),
            daily_updates,
            last_modified,
            extra: document.into_iter().collect(),
        }
    }

    /// Insert or overwrite entry for given date, then refresh aggregates.
    pub fn upsert(
        &mut self,
        date: impl Into<String>,
        entry: ProgressEntry,
        modified: impl Into<String>,
    ) {
        self.daily_updates.insert(date.into(), DailyUpdate::Entry(entry));
        self.last_modified = Some(modified.into());
        self.total_entries = self.daily_updates.len();
    }

    /// Render record as pretty JSON document with trailing newline.
    ///
    /// # Errors
    ///
    /// - Return [`serde_json::Error`] if serialization fails.
    pub fn to_document(&self) -> serde_json::Result<String> {
        let mut document = serde_json::to_string_pretty(self)?;
        document.push('\n');
        Ok(document)
    }
}

/// Value stored under one date.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DailyUpdate {
    Entry(ProgressEntry),

    /// Anything else found on disk, carried over verbatim.
    Foreign(Value),
}

impl DailyUpdate {
    /// Entry in the known layout, if it is one.
    pub fn entry(&self) -> Option<&ProgressEntry> {
        match self {
            Self::Entry(entry) => Some(entry),
            Self::Foreign(_) => None,
        }
    }
}

/// Single day of progress.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProgressEntry {
    pub timestamp: String,
    pub activity: String,
    pub status: ProgressStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub emoji: String,
}

/// Status of a day's work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    InProgress,
    Completed,
    Planned,
}

impl ProgressStatus {
    pub const ALL: [Self; 3] = [Self::InProgress, Self::Completed, Self::Planned];
}

/// Existing progress record cannot be read.
#[derive(Debug, thiserror::Error)]
#[error("failed to read progress record at {:?}", path.display())]
pub struct ProgressError {
    #[source]
    source: std::io::Error,
    path: PathBuf,
}

/// Friendly result alias :3
pub type Result<T, E = ProgressError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::fs::write;
    use tempfile::TempDir;

    fn entry(activity: &str) -> ProgressEntry {
        ProgressEntry {
            timestamp: "2025-06-01T09:30:00+00:00".into(),
            activity: activity.into(),
            status: ProgressStatus::Completed,
            notes: "Quick update".into(),
            emoji: "🚀".into(),
        }
    }

    #[test]
    fn upsert_overwrites_same_date() {
        let mut record = ProgressRecord::default();

        record.upsert("2025-06-01", entry("testing"), "2025-06-01T09:30:00+00:00");
        record.upsert("2025-06-01", entry("research"), "2025-06-01T18:00:00+00:00");

        assert_eq!(record.daily_updates.len(), 1);
        assert_eq!(record.total_entries, 1);
        assert_eq!(
            record.daily_updates["2025-06-01"].entry().map(|entry| entry.activity.as_str()),
            Some("research")
        );
        assert_eq!(record.last_modified.as_deref(), Some("2025-06-01T18:00:00+00:00"));
    }

    #[test]
    fn document_layout_is_stable() -> anyhow::Result<()> {
        let mut record = ProgressRecord::default();
        record.upsert("2025-06-02", entry("testing"), "2025-06-02T10:00:00+00:00");
        record.upsert("2025-06-01", entry("cleanup"), "2025-06-02T10:00:00+00:00");

        let expect = indoc! {r#"
            {
              "daily_updates": {
                "2025-06-01": {
                  "timestamp": "2025-06-01T09:30:00+00:00",
                  "activity": "cleanup",
                  "status": "completed",
                  "notes": "Quick update",
                  "emoji": "🚀"
                },
                "2025-06-02": {
                  "timestamp": "2025-06-01T09:30:00+00:00",
                  "activity": "testing",
                  "status": "completed",
                  "notes": "Quick update",
                  "emoji": "🚀"
                }
              },
              "last_modified": "2025-06-02T10:00:00+00:00",
              "total_entries": 2
            }
        "#};
        assert_eq!(record.to_document()?, expect);

        Ok(())
    }

    #[test]
    fn load_keeps_unknown_keys() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("progress.json");
        write(
            &path,
            r#"{"owner": "me", "daily_updates": {}, "total_entries": 0}"#,
        )?;

        let record = ProgressRecord::load(&path)?;
        assert_eq!(record.extra.get("owner"), Some(&Value::from("me")));
        assert!(record.to_document()?.contains(r#""owner": "me""#));

        Ok(())
    }

    #[test]
    fn load_missing_or_corrupt_starts_fresh() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("progress.json");
        assert_eq!(ProgressRecord::load(&path)?, ProgressRecord::default());

        write(&path, "{ not json")?;
        assert_eq!(ProgressRecord::load(&path)?, ProgressRecord::default());

        write(&path, [0xff, 0xfe, 0x00])?;
        assert_eq!(ProgressRecord::load(&path)?, ProgressRecord::default());

        write(&path, "[1, 2, 3]")?;
        assert_eq!(ProgressRecord::load(&path)?, ProgressRecord::default());

        Ok(())
    }

    #[test]
    fn upsert_keeps_history_outside_known_layout() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("progress.json");
        write(
            &path,
            indoc! {r#"
                {
                  "daily_updates": {
                    "2025-05-30": {
                      "timestamp": "2025-05-30T08:00:00+00:00",
                      "activity": "testing",
                      "status": "completed"
                    },
                    "2025-05-31": {
                      "timestamp": "2025-05-31T08:00:00+00:00",
                      "activity": "planning",
                      "status": "blocked",
                      "mood": "grumpy"
                    },
                    "2025-06-01": "worked offline"
                  },
                  "total_entries": "three"
                }
            "#},
        )?;

        let mut record = ProgressRecord::load(&path)?;
        assert_eq!(record.total_entries, 3);
        assert!(record.daily_updates["2025-05-30"].entry().is_some());
        assert!(record.daily_updates["2025-05-31"].entry().is_none());

        record.upsert("2025-06-02", entry("cleanup"), "2025-06-02T09:30:00+00:00");
        write(&path, record.to_document()?)?;

        let reloaded = ProgressRecord::load(&path)?;
        assert_eq!(reloaded.total_entries, 4);
        assert_eq!(
            reloaded.daily_updates.keys().collect::<Vec<_>>(),
            vec!["2025-05-30", "2025-05-31", "2025-06-01", "2025-06-02"]
        );
        assert_eq!(
            reloaded.daily_updates["2025-05-31"],
            DailyUpdate::Foreign(serde_json::json!({
                "timestamp": "2025-05-31T08:00:00+00:00",
                "activity": "planning",
                "status": "blocked",
                "mood": "grumpy"
            }))
        );
        assert_eq!(
            reloaded.daily_updates["2025-06-01"],
            DailyUpdate::Foreign(Value::from("worked offline"))
        );

        Ok(())
    }
}
