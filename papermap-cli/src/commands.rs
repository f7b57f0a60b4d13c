//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use crate::render::{JsonRenderer, LatestFrame, TextRenderer};
use anyhow::Context;
use papermap_core::config::{PapermapConfig, resolve_config as load_validated};
use papermap_core::facets::FacetIndex;
use papermap_core::filter::{FilterDimension, FilterSet};
use papermap_core::keywords::normalize_keyword;
use papermap_core::loader::{DataSource, load_catalog, load_keyword_map, source_for};
use papermap_core::ordering::{shuffle_papers, visited_first};
use papermap_core::query::PageQuery;
use papermap_core::read_marks::ReadMarks;
use papermap_core::selection::{LeafKey, PointerEvent};
use papermap_core::tracks::{ALL_TRACKS, TrackSelection, ordered_tracks};
use papermap_core::view::{
    CatalogView, KeywordMapView, Renderer, View, ViewEvent, Viewport, dispatch_and_render,
    run_events,
};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

/// Load the layered configuration and apply the global `--data` override.
pub fn resolve_config(
    workspace: &Path,
    explicit: Option<&Path>,
    data: Option<&str>,
) -> anyhow::Result<PapermapConfig> {
    let mut config = load_validated(Some(workspace), explicit)?;
    if let Some(base) = data {
        config.data.base = base.to_string();
    }
    tracing::debug!(base = %config.data.base, track = %config.data.track, "Resolved configuration");
    Ok(config)
}

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    config: &PapermapConfig,
) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    match command {
        Commands::Catalog {
            track,
            filter,
            search,
            session,
            url,
            visited_first,
            no_shuffle,
        } => {
            let request = CatalogRequest {
                track,
                filter,
                search,
                session,
                url,
                visited_first,
                shuffle: config.catalog.shuffle_on_load && !no_shuffle,
            };
            handle_catalog(request, config, &mut stdout).await
        }
        Commands::Keywords {
            track,
            select,
            json,
            window,
        } => handle_keywords(track, select, json, window, config, &mut stdout).await,
        Commands::Facets {
            dimension,
            prefix,
            limit,
        } => handle_facets(&dimension, prefix.as_deref(), limit, config, &mut stdout).await,
        Commands::Tracks => handle_tracks(config, &mut stdout).await,
        Commands::MarkRead { id, undo } => handle_mark_read(&id, undo, config, &mut stdout),
        Commands::Config { action } => handle_config(action, workspace, config, &mut stdout),
    }
}

fn data_source(config: &PapermapConfig) -> anyhow::Result<Box<dyn DataSource>> {
    let timeout = Duration::from_secs(config.data.timeout_secs);
    Ok(source_for(&config.data.base, timeout)?)
}

fn track_selection(track: Option<String>, config: &PapermapConfig) -> TrackSelection {
    track
        .map(TrackSelection::from)
        .unwrap_or_else(|| config.data.track.clone())
}

fn open_read_marks(config: &PapermapConfig) -> anyhow::Result<Option<ReadMarks>> {
    match config.storage.resolved_path() {
        Some(path) => Ok(Some(ReadMarks::open(&path).with_context(|| {
            format!("Failed to open read marks at {}", path.display())
        })?)),
        None => {
            tracing::warn!("No data directory available; read marks disabled");
            Ok(None)
        }
    }
}

pub(crate) struct CatalogRequest {
    pub track: Option<String>,
    pub filter: Option<String>,
    pub search: Option<String>,
    pub session: Option<String>,
    pub url: Option<String>,
    pub visited_first: bool,
    pub shuffle: bool,
}

impl CatalogRequest {
    /// Seed filters from `--url`, then let explicit flags override them.
    ///
    /// Flags replace URL parameters one by one, so `--filter` alone moves a
    /// URL-seeded search value onto the new dimension.
    fn filters(&self, default: FilterDimension) -> anyhow::Result<FilterSet> {
        let seeded = match self.url.as_deref() {
            Some(url) => PageQuery::parse(url)?,
            None => PageQuery::default(),
        };
        let merged = PageQuery {
            filter: self.filter.clone().or(seeded.filter),
            search: self.search.clone().or(seeded.search),
            session: self.session.clone().or(seeded.session),
        };
        let (_, filters) = merged.seed_filters(default)?;
        Ok(filters)
    }
}

async fn handle_catalog<W: Write>(
    request: CatalogRequest,
    config: &PapermapConfig,
    out: &mut W,
) -> anyhow::Result<()> {
    let filters = request.filters(config.catalog.default_filter)?;
    let track = track_selection(request.track.clone(), config);
    let source = data_source(config)?;
    let marks = open_read_marks(config)?;

    let mut view = CatalogView::new(filters);
    let mut renderer = TextRenderer::new(out, config.ui.card_width);

    let mut papers = match load_catalog(source.as_ref(), &track).await {
        Ok(papers) => papers,
        Err(e) => {
            dispatch_and_render(&mut view, &mut renderer, ViewEvent::LoadFailed(e.to_string()));
            return Err(e).context(format!("Failed to load papers from {}", source.describe()));
        }
    };

    if let Some(marks) = &marks {
        marks.apply_to(&mut papers);
    }
    if request.shuffle {
        shuffle_papers(&mut papers, &mut rand::thread_rng());
    }
    if request.visited_first {
        visited_first(&mut papers, |p| p.content.read);
    }

    dispatch_and_render(&mut view, &mut renderer, ViewEvent::DataLoaded(papers));
    renderer.finish()?;
    Ok(())
}

/// Parse `WIDTHxHEIGHT` into a viewport.
pub(crate) fn parse_window(raw: &str) -> Result<Viewport, String> {
    let (width, height) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let parse = |value: &str| {
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| format!("invalid size '{value}' in '{raw}'"))
    };
    Ok(Viewport::new(parse(height)?, parse(width)?))
}

async fn handle_keywords<W: Write>(
    track: Option<String>,
    select: Option<String>,
    json: bool,
    window: Option<Viewport>,
    config: &PapermapConfig,
    out: &mut W,
) -> anyhow::Result<()> {
    let track = track_selection(track, config);
    let source = data_source(config)?;
    let mut view = KeywordMapView::new(
        config.keyword_map.grouping.clone(),
        config.keyword_map.list_default,
    );

    let data = match load_keyword_map(source.as_ref(), &track).await {
        Ok(data) => data,
        Err(e) => {
            view.dispatch(ViewEvent::LoadFailed(e.to_string()));
            return Err(e).context(format!(
                "Failed to load keyword map from {}",
                source.describe()
            ));
        }
    };
    let mut latest = LatestFrame::default();
    dispatch_and_render(&mut view, &mut latest, ViewEvent::DataLoaded(data));

    let mut events = Vec::new();
    if let Some(raw) = select.as_deref() {
        let keyword = normalize_keyword(raw);
        let track = view
            .tree()
            .leaves()
            .find(|(_, leaf)| leaf.name == keyword)
            .map(|(track, _)| track.name.clone())
            .with_context(|| format!("No keyword group named '{keyword}'"))?;
        events.push(ViewEvent::SelectionChanged(PointerEvent::Click(LeafKey::new(
            track, keyword,
        ))));
    }
    if let Some(viewport) = window {
        events.push(ViewEvent::ViewportResized(viewport));
    }

    let (tx, rx) = mpsc::channel(events.len().max(1));
    for event in events {
        tx.send(event)
            .await
            .map_err(|_| anyhow::anyhow!("Keyword map event loop closed early"))?;
    }
    drop(tx);
    run_events(&mut view, &mut latest, rx, config.ui.resize_debounce()).await;

    let Some(output) = latest.into_inner() else {
        return Ok(());
    };
    if json {
        let mut renderer = JsonRenderer::new(out);
        renderer.render(&output);
        renderer.finish()?;
    } else {
        let mut renderer = TextRenderer::new(out, config.ui.card_width);
        renderer.render(&output);
        renderer.finish()?;
    }
    Ok(())
}

async fn handle_facets<W: Write>(
    dimension: &str,
    prefix: Option<&str>,
    limit: usize,
    config: &PapermapConfig,
    out: &mut W,
) -> anyhow::Result<()> {
    let dimension: FilterDimension = dimension.parse()?;
    let source = data_source(config)?;
    let papers = load_catalog(source.as_ref(), &config.data.track)
        .await
        .with_context(|| format!("Failed to load papers from {}", source.describe()))?;

    let index = FacetIndex::build(&papers);
    let values: Vec<&str> = match prefix {
        Some(prefix) => index.suggest(dimension, prefix, limit),
        None => index
            .keys(dimension)
            .iter()
            .take(limit)
            .map(String::as_str)
            .collect(),
    };
    for value in values {
        writeln!(out, "{value}")?;
    }
    Ok(())
}

async fn handle_tracks<W: Write>(config: &PapermapConfig, out: &mut W) -> anyhow::Result<()> {
    let source = data_source(config)?;
    let papers = load_catalog(source.as_ref(), &TrackSelection::All)
        .await
        .with_context(|| format!("Failed to load papers from {}", source.describe()))?;

    writeln!(out, "{ALL_TRACKS}")?;
    for track in ordered_tracks(&papers) {
        writeln!(out, "{track}")?;
    }
    Ok(())
}

fn handle_mark_read<W: Write>(
    id: &str,
    undo: bool,
    config: &PapermapConfig,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut marks = open_read_marks(config)?
        .context("No place to store read marks; set storage.path in the configuration")?;
    marks.mark(id, !undo)?;
    let state = if undo { "unread" } else { "read" };
    writeln!(out, "Marked {id} as {state} ({})", marks.path().display())?;
    Ok(())
}

fn handle_config<W: Write>(
    action: ConfigAction,
    workspace: &Path,
    config: &PapermapConfig,
    out: &mut W,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".papermap");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                writeln!(
                    out,
                    "Configuration file already exists at: {}",
                    config_path.display()
                )?;
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&PapermapConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            writeln!(
                out,
                "Created default configuration at: {}",
                config_path.display()
            )?;
            Ok(())
        }
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(config)?;
            writeln!(out, "{}", toml_str)?;
            Ok(())
        }
    }
}
