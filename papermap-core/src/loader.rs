//! Fetching the static JSON inputs.
//!
//! A view issues all of its fetches at once and waits for every one of them.
//! The first failure fails the whole load; there is no partial result and no
//! retry.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::LoadError;
use crate::model::{Paper, ProjectionPoint, TrackMember, join_projection};
use crate::tracks::{TrackSelection, normalize_track_name};

/// All papers of the conference.
pub const PAPERS_FILE: &str = "papers.json";
/// 2-D projection coordinates for the keyword map.
pub const PROJECTION_FILE: &str = "serve_papers_projection.json";

/// Somewhere the JSON files can be read from.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable location, for logs.
    fn describe(&self) -> String;

    /// Fetch and parse one JSON file by name.
    async fn fetch_json(&self, name: &str) -> Result<serde_json::Value, LoadError>;
}

/// Fetch one file and decode it into `T`.
pub async fn fetch<T: DeserializeOwned>(
    source: &dyn DataSource,
    name: &str,
) -> Result<T, LoadError> {
    let value = source.fetch_json(name).await?;
    serde_json::from_value(value).map_err(|e| LoadError::Decode {
        resource: name.to_string(),
        message: e.to_string(),
    })
}

// ── HTTP ──────────────────────────────────────────────────────

/// Reads files relative to a base URL.
pub struct HttpSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, LoadError> {
        // Url::join replaces the last path segment unless the base ends with '/'.
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&normalized).map_err(|e| LoadError::InvalidSource {
            message: format!("{base}: {e}"),
        })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent("papermap/0.3")
            .build()
            .map_err(|e| LoadError::InvalidSource {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client, base })
    }

    fn url_for(&self, name: &str) -> Result<Url, LoadError> {
        self.base.join(name).map_err(|e| LoadError::InvalidSource {
            message: format!("{name}: {e}"),
        })
    }
}

#[async_trait]
impl DataSource for HttpSource {
    fn describe(&self) -> String {
        self.base.to_string()
    }

    async fn fetch_json(&self, name: &str) -> Result<serde_json::Value, LoadError> {
        let url = self.url_for(name)?;
        tracing::debug!(url = %url, "Fetching");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::Fetch {
                resource: name.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                resource: name.to_string(),
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| LoadError::Decode {
            resource: name.to_string(),
            message: e.to_string(),
        })
    }
}

// ── Local directory ───────────────────────────────────────────

/// Reads files from a local directory, e.g. a built site checkout.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DataSource for DirSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn fetch_json(&self, name: &str) -> Result<serde_json::Value, LoadError> {
        let path = self.root.join(name);
        tracing::debug!(path = %path.display(), "Reading");

        let bytes = tokio::fs::read(&path).await.map_err(|e| LoadError::Fetch {
            resource: name.to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| LoadError::Decode {
            resource: name.to_string(),
            message: e.to_string(),
        })
    }
}

/// Pick a source from a config `base`: URLs go over HTTP, anything else is a
/// directory.
pub fn source_for(base: &str, timeout: Duration) -> Result<Box<dyn DataSource>, LoadError> {
    if base.starts_with("http://") || base.starts_with("https://") {
        Ok(Box::new(HttpSource::new(base, timeout)?))
    } else {
        Ok(Box::new(DirSource::new(base)))
    }
}

// ── View loads ────────────────────────────────────────────────

fn normalize_tracks(papers: &mut [Paper]) {
    for paper in papers {
        let normalized = normalize_track_name(&paper.content.track);
        if normalized != paper.content.track {
            paper.content.track = normalized.to_string();
        }
    }
}

/// Load the papers the catalog shows: all of them, or one track's file.
pub async fn load_catalog(
    source: &dyn DataSource,
    track: &TrackSelection,
) -> Result<Vec<Paper>, LoadError> {
    let file = track.papers_file();
    let mut papers: Vec<Paper> = fetch(source, &file).await?;
    normalize_tracks(&mut papers);
    tracing::info!(source = %source.describe(), file = %file, papers = papers.len(), "Loaded catalog");
    Ok(papers)
}

/// Everything the keyword map needs, fetched together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedKeywordMap {
    /// Papers that have a projection, with `pos` filled in.
    pub papers: Vec<Paper>,
    /// Bounding box of all projection points: `[min_x, min_y]`, `[max_x, max_y]`.
    pub extent: Option<([f64; 2], [f64; 2])>,
    /// Ids from the selected track's subset file; empty for all tracks.
    pub track_highlight: Vec<String>,
}

/// Fetch papers, projection and (for a single track) the highlight subset
/// concurrently.
pub async fn load_keyword_map(
    source: &dyn DataSource,
    track: &TrackSelection,
) -> Result<LoadedKeywordMap, LoadError> {
    let highlight = async {
        match track.track_file() {
            Some(file) => fetch::<Vec<TrackMember>>(source, &file).await.map(Some),
            None => Ok(None),
        }
    };

    let (mut papers, projection, highlight) = futures::try_join!(
        fetch::<Vec<Paper>>(source, PAPERS_FILE),
        fetch::<Vec<ProjectionPoint>>(source, PROJECTION_FILE),
        highlight,
    )?;
    normalize_tracks(&mut papers);

    let extent = projection_extent(&projection);
    let papers = join_projection(papers, &projection);
    let track_highlight = highlight
        .unwrap_or_default()
        .into_iter()
        .map(|m| m.id)
        .collect::<Vec<_>>();

    tracing::info!(
        source = %source.describe(),
        papers = papers.len(),
        highlighted = track_highlight.len(),
        "Loaded keyword map"
    );
    Ok(LoadedKeywordMap {
        papers,
        extent,
        track_highlight,
    })
}

/// Bounding box of the projection, `None` when empty.
pub fn projection_extent(points: &[ProjectionPoint]) -> Option<([f64; 2], [f64; 2])> {
    let first = points.first()?.pos;
    Some(points.iter().fold((first, first), |(min, max), p| {
        (
            [min[0].min(p.pos[0]), min[1].min(p.pos[1])],
            [max[0].max(p.pos[0]), max[1].max(p.pos[1])],
        )
    }))
}
