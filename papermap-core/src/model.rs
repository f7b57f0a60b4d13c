//! Paper records as published in `papers.json` and its companion files.
//!
//! Records are immutable inputs. Only `pos` (joined from the projection file),
//! `is_selected` and `read` are written by this crate, and those are advisory
//! flags for the rendering side.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Timestamp format used for session start and end times.
const SESSION_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One entry of `papers.json` (or `track_<TRACK>.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: String,
    #[serde(default)]
    pub forum: Option<String>,
    #[serde(default)]
    pub card_image_path: Option<String>,
    #[serde(default)]
    pub presentation_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: PaperContent,
    /// 2-D projection coordinate; absent papers are left out of the keyword map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<[f64; 2]>,
    /// Advisory match flag set by the filter evaluator.
    #[serde(default)]
    pub is_selected: bool,
}

/// Display and search fields of a paper.
///
/// Every field defaults when missing or `null` so that a sparse record still
/// loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperContent {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub authors: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub track: String,
    #[serde(deserialize_with = "null_as_default")]
    pub paper_type: String,
    #[serde(rename = "abstract", deserialize_with = "null_as_default")]
    pub abstract_text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tldr: String,
    pub pdf_url: Option<String>,
    pub demo_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub sessions: Vec<SessionInfo>,
    #[serde(deserialize_with = "null_as_default")]
    pub similar_paper_uids: Vec<String>,
    /// Whether the reader has already opened this paper.
    #[serde(deserialize_with = "null_as_default")]
    pub read: bool,
}

/// A live Q&A slot a paper is presented in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub session_name: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub zoom_link: Option<String>,
}

impl SessionInfo {
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        parse_session_time(self.start_time.as_deref()?)
    }

    pub fn ends_at(&self) -> Option<NaiveDateTime> {
        parse_session_time(self.end_time.as_deref()?)
    }

    /// `"(05:00-06:00 GMT)"`, or `None` when either bound is missing.
    pub fn time_string(&self) -> Option<String> {
        let start = self.starts_at()?;
        let end = self.ends_at()?;
        Some(format!(
            "({}-{} GMT)",
            start.format("%H:%M"),
            end.format("%H:%M")
        ))
    }
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn parse_session_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, SESSION_TIME_FORMAT).ok()
}

/// One entry of `serve_papers_projection.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub id: String,
    pub pos: [f64; 2],
}

/// One entry of a track highlight subset file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMember {
    pub id: String,
}

/// The lightweight record stored inside keyword groups.
///
/// Carries only what the list panel and tooltips display, never the full paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSummary {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub track: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_image_path: Option<String>,
}

impl PaperSummary {
    /// Build a summary from a paper, recording it under `track`.
    pub fn from_paper(
        paper: &Paper,
        track: &str,
        include_keywords: bool,
        include_image: bool,
    ) -> Self {
        Self {
            id: paper.id.clone(),
            title: paper.content.title.clone(),
            authors: paper.content.authors.clone(),
            track: track.to_string(),
            keywords: include_keywords.then(|| paper.content.keywords.clone()),
            card_image_path: if include_image {
                paper.card_image_path.clone()
            } else {
                None
            },
        }
    }
}

/// Attach projection coordinates and drop papers that have none.
///
/// A missing projection is an expected sparse-data condition, not an error.
pub fn join_projection(papers: Vec<Paper>, points: &[ProjectionPoint]) -> Vec<Paper> {
    let by_id: HashMap<&str, [f64; 2]> = points.iter().map(|p| (p.id.as_str(), p.pos)).collect();
    let total = papers.len();

    let joined: Vec<Paper> = papers
        .into_iter()
        .filter_map(|mut paper| {
            let pos = by_id.get(paper.id.as_str())?;
            paper.pos = Some(*pos);
            Some(paper)
        })
        .collect();

    if joined.len() < total {
        tracing::debug!(
            dropped = total - joined.len(),
            kept = joined.len(),
            "Papers without a projection left out of the keyword map"
        );
    }
    joined
}
