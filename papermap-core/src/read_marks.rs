//! "Already read" flags keyed by paper id, persisted across sessions.
//!
//! Writes go through the usual atomic pattern (write a `.tmp` sibling, then
//! rename) so a crash never leaves a half-written store behind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::Paper;

/// Atomically write JSON data to a file, creating parent directories.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json.as_bytes())?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Load and deserialize JSON from a file. `Ok(None)` if the file doesn't exist.
pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredMarks {
    #[serde(default)]
    papers: BTreeMap<String, bool>,
}

/// The read-marks store for one namespace.
#[derive(Debug, Clone)]
pub struct ReadMarks {
    path: PathBuf,
    marks: BTreeMap<String, bool>,
}

impl ReadMarks {
    /// Default location: `<data dir>/<namespace>.json`.
    pub fn default_path(namespace: &str) -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "papermap", "papermap")
            .map(|dirs| dirs.data_dir().join(format!("{namespace}.json")))
    }

    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let stored: StoredMarks = load_json(&path)?.unwrap_or_default();
        tracing::debug!(path = %path.display(), marks = stored.papers.len(), "Opened read marks");
        Ok(Self {
            path,
            marks: stored.papers,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set the flag for `id` and persist immediately. Clearing removes the entry.
    pub fn mark(&mut self, id: &str, read: bool) -> Result<()> {
        if read {
            self.marks.insert(id.to_string(), true);
        } else {
            self.marks.remove(id);
        }
        self.save()
    }

    pub fn is_read(&self, id: &str) -> bool {
        self.marks.get(id).copied().unwrap_or(false)
    }

    pub fn read_ids(&self) -> impl Iterator<Item = &str> {
        self.marks
            .iter()
            .filter(|(_, read)| **read)
            .map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Copy the flags onto the papers' `read` field.
    pub fn apply_to(&self, papers: &mut [Paper]) {
        for paper in papers {
            paper.content.read = self.is_read(&paper.id);
        }
    }

    fn save(&self) -> Result<()> {
        atomic_write_json(
            &self.path,
            &StoredMarks {
                papers: self.marks.clone(),
            },
        )
    }
}
