//! End-to-end tests: load a site directory, drive the views with events.

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use papermap_core::config::PapermapConfig;
use papermap_core::filter::{Filter, FilterDimension};
use papermap_core::grouping::GroupingOptions;
use papermap_core::loader::{
    DirSource, PAPERS_FILE, PROJECTION_FILE, load_catalog, load_keyword_map,
};
use papermap_core::ordering::visited_first;
use papermap_core::query::PageQuery;
use papermap_core::read_marks::ReadMarks;
use papermap_core::selection::{LeafKey, ListPanelDefault, PointerEvent};
use papermap_core::tracks::TrackSelection;
use papermap_core::view::{
    CatalogOutput, CatalogView, FilterChange, KeywordMapOutput, KeywordMapView, RenderOutput,
    Renderer, ResizeDebouncer, View, ViewEvent, Viewport, dispatch_and_render, run_events,
};
use tokio::sync::mpsc;
use std::time::{Duration, Instant};

fn write(dir: &TempDir, name: &str, value: serde_json::Value) {
    std::fs::write(dir.path().join(name), value.to_string()).unwrap();
}

fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        PAPERS_FILE,
        json!([
            { "id": "1", "content": {
                "title": "Fair Ranking", "authors": ["A. Smith"], "track": "T1",
                "keywords": ["Fairness", "fairness"],
                "sessions": [{ "session_name": "D3",
                    "start_time": "2020-07-06T17:00:00", "end_time": "2020-07-06T18:00:00" }] } },
            { "id": "2", "content": {
                "title": "Fair Parsing", "authors": ["B. Jones"], "track": "T1",
                "keywords": ["Fairness"], "sessions": [{ "session_name": "1A" }] } },
            { "id": "3", "content": {
                "title": "Private Parsing", "authors": ["A. Smith", "C. Lee"], "track": "T1",
                "keywords": ["Privacy"], "sessions": [{ "session_name": "1A" }, { "session_name": "D3" }] } },
            { "id": "4", "content": {
                "title": "Demo System", "authors": ["C. Lee"], "track": "Demo",
                "keywords": ["toolkit", "Toolkit!"] } }
        ]),
    );
    write(
        &dir,
        PROJECTION_FILE,
        json!([
            { "id": "1", "pos": [0.1, 0.2] },
            { "id": "2", "pos": [0.3, 0.4] },
            { "id": "3", "pos": [0.5, 0.6] }
        ]),
    );
    write(&dir, "track_T1.json", json!([{ "id": "1" }, { "id": "3" }]));
    dir
}

fn catalog(output: Option<RenderOutput>) -> CatalogOutput {
    match output {
        Some(RenderOutput::Catalog(out)) => out,
        other => panic!("expected catalog output, got {other:?}"),
    }
}

fn keyword_map(output: Option<RenderOutput>) -> KeywordMapOutput {
    match output {
        Some(RenderOutput::KeywordMap(out)) => out,
        other => panic!("expected keyword map output, got {other:?}"),
    }
}

#[tokio::test]
async fn test_keyword_map_fairness_scenario() {
    let dir = site();
    let source = DirSource::new(dir.path());
    let data = load_keyword_map(&source, &TrackSelection::All).await.unwrap();
    // Paper 4 has no projection.
    assert_eq!(data.papers.len(), 3);

    let mut view = KeywordMapView::new(GroupingOptions::default(), ListPanelDefault::Empty);
    let out = keyword_map(view.dispatch(ViewEvent::DataLoaded(data)));

    assert_eq!(out.tree.children.len(), 1);
    let t1 = &out.tree.children[0];
    assert_eq!(t1.name, "T1");
    assert_eq!(t1.children.len(), 1);
    assert_eq!(t1.children[0].name, "fairness");
    let ids: Vec<&str> = t1.children[0].papers.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn test_keyword_map_without_dedupe_keeps_duplicates() {
    let dir = site();
    let source = DirSource::new(dir.path());
    let data = load_keyword_map(&source, &TrackSelection::All).await.unwrap();

    let options = GroupingOptions {
        dedupe_within_group: false,
        ..GroupingOptions::default()
    };
    let mut view = KeywordMapView::new(options, ListPanelDefault::Empty);
    let out = keyword_map(view.dispatch(ViewEvent::DataLoaded(data)));
    let leaf = out.tree.leaf("T1", "fairness").unwrap();
    assert_eq!(leaf.value, 3);
}

#[tokio::test]
async fn test_keyword_map_session_selection_and_track_highlight() {
    let dir = site();
    let source = DirSource::new(dir.path());
    let data = load_keyword_map(&source, &TrackSelection::Track("T1".into()))
        .await
        .unwrap();

    let mut view = KeywordMapView::new(GroupingOptions::default(), ListPanelDefault::AllPapers);
    let out = keyword_map(view.dispatch(ViewEvent::DataLoaded(data)));
    assert_eq!(out.track_highlight, vec!["1", "3"]);
    assert!(out.selected_ids.is_empty());
    // Paper 3 is listed although its only group ("privacy") is a dropped singleton.
    let listed: Vec<&str> = out.list.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(listed, vec!["1", "2", "3"]);

    let out = keyword_map(view.dispatch(ViewEvent::FilterChanged(FilterChange::Set(
        Filter::Session("D3".into()),
    ))));
    assert_eq!(out.selected_ids, vec!["1", "3"]);

    let out = keyword_map(view.dispatch(ViewEvent::SelectionChanged(PointerEvent::Click(
        LeafKey::new("T1", "fairness"),
    ))));
    assert!(out.latched);
    assert_eq!(out.highlighted_ids, vec!["1", "2"]);

    let resized = keyword_map(view.dispatch(ViewEvent::ViewportResized(Viewport::new(
        1000.0, 1200.0,
    ))));
    assert_eq!(resized.tree, out.tree);
    assert_eq!(resized.selected_ids, out.selected_ids);
    assert_eq!(resized.list, out.list);
}

#[tokio::test]
async fn test_catalog_from_url_with_read_marks() {
    let dir = site();
    let source = DirSource::new(dir.path());
    let mut papers = load_catalog(&source, &TrackSelection::All).await.unwrap();
    assert_eq!(papers[3].content.track, "System Demonstrations");

    let mut marks = ReadMarks::open(dir.path().join("marks.json")).unwrap();
    marks.mark("3", true).unwrap();
    marks.apply_to(&mut papers);
    visited_first(&mut papers, |p| p.content.read);

    let (_, filters) = PageQuery::parse("https://conf.example/papers.html?filter=authors&search=A.%20Smith&session=D3")
        .unwrap()
        .seed_filters(FilterDimension::Titles)
        .unwrap();

    let mut view = CatalogView::new(filters);
    let out = catalog(view.dispatch(ViewEvent::DataLoaded(papers)));

    let ids: Vec<&str> = out.cards.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "1"]);
    assert!(out.cards[0].read);
    assert_eq!(out.session_notice.as_deref(), Some("Demo Session 3"));
    assert_eq!(out.cards[1].sessions, vec!["Demo Session 3 (17:00-18:00 GMT)"]);

    let out = catalog(view.dispatch(ViewEvent::FilterChanged(FilterChange::Clear(
        FilterDimension::Authors,
    ))));
    assert_eq!(out.cards.len(), 2);

    let out = catalog(view.dispatch(ViewEvent::FilterChanged(FilterChange::ClearAll)));
    assert_eq!(out.cards.len(), 4);
}

#[derive(Default)]
struct CountingRenderer {
    frames: usize,
}

impl Renderer for CountingRenderer {
    fn render(&mut self, _output: &RenderOutput) {
        self.frames += 1;
    }
}

#[tokio::test]
async fn test_failed_fetch_leaves_view_empty() {
    let dir = site();
    std::fs::remove_file(dir.path().join("track_T1.json")).unwrap();
    let source = DirSource::new(dir.path());

    let mut view = KeywordMapView::new(GroupingOptions::default(), ListPanelDefault::AllPapers);
    let mut renderer = CountingRenderer::default();

    let event = match load_keyword_map(&source, &TrackSelection::Track("T1".into())).await {
        Ok(data) => ViewEvent::DataLoaded(data),
        Err(e) => ViewEvent::LoadFailed(e.to_string()),
    };
    assert!(matches!(event, ViewEvent::LoadFailed(_)));
    assert!(!dispatch_and_render(&mut view, &mut renderer, event));
    assert_eq!(renderer.frames, 0);
    assert!(view.papers().is_empty());
    assert!(view.tree().children.is_empty());

    // Later events have nothing to draw either.
    assert!(!dispatch_and_render(
        &mut view,
        &mut renderer,
        ViewEvent::SelectionChanged(PointerEvent::Enter(LeafKey::new("T1", "fairness")))
    ));
}

#[tokio::test]
async fn test_debounced_resizes_render_once() {
    let dir = site();
    let source = DirSource::new(dir.path());
    let data = load_keyword_map(&source, &TrackSelection::All).await.unwrap();

    let config = PapermapConfig::default();
    let mut view = KeywordMapView::new(
        config.keyword_map.grouping.clone(),
        config.keyword_map.list_default,
    );
    let mut renderer = CountingRenderer::default();
    dispatch_and_render(&mut view, &mut renderer, ViewEvent::DataLoaded(data));
    let before = view.tree().clone();

    let mut debouncer = ResizeDebouncer::new(config.ui.resize_debounce());
    let start = Instant::now();
    for step in 0..10u32 {
        let at = start + Duration::from_millis(20) * step;
        debouncer.push(at, Viewport::new(700.0 + f64::from(step), 1100.0));
        if let Some(viewport) = debouncer.poll(at) {
            dispatch_and_render(&mut view, &mut renderer, ViewEvent::ViewportResized(viewport));
        }
    }
    let settled = debouncer.deadline().unwrap();
    if let Some(viewport) = debouncer.poll(settled) {
        dispatch_and_render(&mut view, &mut renderer, ViewEvent::ViewportResized(viewport));
    }

    assert_eq!(renderer.frames, 2);
    assert_eq!(view.tree(), &before);
}

#[tokio::test]
async fn test_event_loop_coalesces_resize_bursts() {
    let dir = site();
    let source = DirSource::new(dir.path());
    let data = load_keyword_map(&source, &TrackSelection::All).await.unwrap();

    let config = PapermapConfig::default();
    let mut view = KeywordMapView::new(
        config.keyword_map.grouping.clone(),
        config.keyword_map.list_default,
    );
    let mut renderer = CountingRenderer::default();

    let (tx, rx) = mpsc::channel(16);
    tx.send(ViewEvent::DataLoaded(data)).await.unwrap();
    for step in 0..10u32 {
        tx.send(ViewEvent::ViewportResized(Viewport::new(700.0 + f64::from(step), 1100.0)))
            .await
            .unwrap();
    }
    drop(tx);

    let frames = run_events(&mut view, &mut renderer, rx, config.ui.resize_debounce()).await;
    assert_eq!(frames, 2);
    assert_eq!(renderer.frames, 2);
}

#[tokio::test]
async fn test_event_loop_renders_settled_resize_before_close() {
    let dir = site();
    let source = DirSource::new(dir.path());
    let data = load_keyword_map(&source, &TrackSelection::All).await.unwrap();

    let mut view = KeywordMapView::new(GroupingOptions::default(), ListPanelDefault::Empty);
    let mut renderer = CountingRenderer::default();
    let (tx, rx) = mpsc::channel(4);

    let feed = async move {
        tx.send(ViewEvent::DataLoaded(data)).await.unwrap();
        tx.send(ViewEvent::ViewportResized(Viewport::new(700.0, 1100.0)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(ViewEvent::ViewportResized(Viewport::new(900.0, 1400.0)))
            .await
            .unwrap();
    };
    let (frames, ()) = tokio::join!(
        run_events(&mut view, &mut renderer, rx, Duration::from_millis(10)),
        feed
    );

    // Load, the settled first resize, then the second one flushed on close.
    assert_eq!(frames, 3);
    assert_eq!(renderer.frames, 3);
}
