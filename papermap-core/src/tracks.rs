//! Track naming, track file selection, and session labels.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::model::Paper;

/// Label used for "no track restriction" in page URLs and config.
pub const ALL_TRACKS: &str = "All tracks";

pub const SYSTEM_DEMONSTRATIONS: &str = "System Demonstrations";
pub const STUDENT_RESEARCH_WORKSHOP: &str = "Student Research Workshop";

/// Expand the short track codes used in raw paper sheets.
pub fn normalize_track_name(name: &str) -> &str {
    match name {
        "SRW" => STUDENT_RESEARCH_WORKSHOP,
        "Demo" => SYSTEM_DEMONSTRATIONS,
        other => other,
    }
}

/// Distinct tracks sorted by name, always followed by the demo and SRW tracks.
pub fn ordered_tracks(papers: &[Paper]) -> Vec<String> {
    let trailing = [SYSTEM_DEMONSTRATIONS, STUDENT_RESEARCH_WORKSHOP];
    let present: BTreeSet<&str> = papers
        .iter()
        .map(|p| p.content.track.as_str())
        .filter(|t| !t.is_empty())
        .collect();

    let mut tracks: Vec<String> = present
        .iter()
        .filter(|t| !trailing.contains(*t))
        .map(|t| t.to_string())
        .collect();
    tracks.extend(trailing.iter().map(|t| t.to_string()));
    tracks
}

/// Which slice of the paper collection a view loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrackSelection {
    #[default]
    All,
    Track(String),
}

impl TrackSelection {
    /// File holding this track's papers (or its id subset, for the keyword map).
    pub fn track_file(&self) -> Option<String> {
        match self {
            Self::All => None,
            Self::Track(name) => Some(format!("track_{name}.json")),
        }
    }

    /// File the catalog loads its papers from.
    pub fn papers_file(&self) -> String {
        self.track_file().unwrap_or_else(|| "papers.json".to_string())
    }
}

impl From<String> for TrackSelection {
    fn from(value: String) -> Self {
        if value.is_empty() || value == ALL_TRACKS {
            Self::All
        } else {
            Self::Track(value)
        }
    }
}

impl From<&str> for TrackSelection {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<TrackSelection> for String {
    fn from(value: TrackSelection) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TrackSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_TRACKS),
            Self::Track(name) => f.write_str(name),
        }
    }
}

/// Human label for a session code, shown in the session notice.
///
/// `"D3"` is demo session 3; any other code is a regular Q&A session.
pub fn session_label(code: &str) -> String {
    match code.strip_prefix('D') {
        Some(rest) => format!("Demo Session {rest}"),
        None => format!("Session {code}"),
    }
}
