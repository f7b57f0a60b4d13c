//! View state and event dispatch.
//!
//! Each view owns its state explicitly. Everything that can change it arrives
//! as a [`ViewEvent`] through `dispatch`, which returns the output to draw (or
//! `None` when there is nothing to draw). Drawing itself belongs to a
//! [`Renderer`].

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::facets::FacetIndex;
use crate::filter::{Filter, FilterDimension, FilterPolicy, FilterSet, apply_selection};
use crate::grouping::{GroupingOptions, build_groups, summarize_papers};
use crate::keywords::normalize_keyword;
use crate::loader::LoadedKeywordMap;
use crate::model::{Paper, PaperSummary};
use crate::selection::{LeafKey, ListPanel, ListPanelDefault, PointerEvent, SelectionState};
use crate::tracks::session_label;
use crate::tree::{HierarchyTree, LayoutFrame, assemble};

/// Inputs a view reacts to. `D` is the payload of a successful load.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent<D> {
    DataLoaded(D),
    /// A fetch failed; the view is left empty.
    LoadFailed(String),
    FilterChanged(FilterChange),
    SelectionChanged(PointerEvent),
    ViewportResized(Viewport),
}

/// An edit to the active filter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    Set(Filter),
    Clear(FilterDimension),
    ClearAll,
    Replace(FilterSet),
}

impl FilterChange {
    pub fn apply(self, filters: &mut FilterSet) {
        match self {
            Self::Set(filter) => filters.insert(filter),
            Self::Clear(dimension) => filters.clear(dimension),
            Self::ClearAll => filters.clear_all(),
            Self::Replace(set) => *filters = set,
        }
    }
}

/// Window and container size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub window_height: f64,
    pub container_width: f64,
}

impl Viewport {
    pub fn new(window_height: f64, container_width: f64) -> Self {
        Self {
            window_height,
            container_width,
        }
    }

    /// Plot area `(width, height)` for this viewport.
    ///
    /// Leaves room for the page chrome, never drops below 300px on wide
    /// screens, and squares the plot when it would get too tall.
    pub fn plot_size(&self) -> (f64, f64) {
        let height = (self.window_height - 280.0).max(300.0);
        let width = if self.container_width < 768.0 {
            self.container_width - 10.0
        } else {
            (self.container_width - 210.0).max(300.0)
        };

        if height / width > 1.3 {
            let side = height.min(width);
            (side, side)
        } else {
            (width, height)
        }
    }
}

/// Everything a renderer may be asked to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutput {
    Catalog(CatalogOutput),
    KeywordMap(KeywordMapOutput),
}

/// Draws view output. Implemented by front-ends.
pub trait Renderer {
    fn render(&mut self, output: &RenderOutput);
}

/// A view with explicit state driven by [`ViewEvent`]s.
pub trait View {
    type Data;

    fn dispatch(&mut self, event: ViewEvent<Self::Data>) -> Option<RenderOutput>;
}

/// Dispatch one event and hand the result, if any, to `renderer`. Returns
/// whether something was drawn.
pub fn dispatch_and_render<V, R>(view: &mut V, renderer: &mut R, event: ViewEvent<V::Data>) -> bool
where
    V: View,
    R: Renderer + ?Sized,
{
    match view.dispatch(event) {
        Some(output) => {
            renderer.render(&output);
            true
        }
        None => false,
    }
}

// ── Catalog ───────────────────────────────────────────────────

/// One result card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub track: String,
    pub keywords: Vec<String>,
    /// Session labels with their time window when known.
    pub sessions: Vec<String>,
    pub read: bool,
    pub pdf_url: Option<String>,
}

impl Card {
    fn from_paper(paper: &Paper) -> Self {
        let content = &paper.content;
        let sessions = content
            .sessions
            .iter()
            .map(|s| match s.time_string() {
                Some(time) => format!("{} {time}", session_label(&s.session_name)),
                None => session_label(&s.session_name),
            })
            .collect();

        Self {
            id: paper.id.clone(),
            title: content.title.clone(),
            authors: content.authors.clone(),
            track: content.track.clone(),
            keywords: content.keywords.clone(),
            sessions,
            read: content.read,
            pdf_url: content.pdf_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogOutput {
    pub cards: Vec<Card>,
    /// Papers loaded, before filtering.
    pub total: usize,
    pub filters: FilterSet,
    /// Shown above the cards while a session filter is active.
    pub session_notice: Option<String>,
    pub viewport: Option<Viewport>,
}

/// The paper catalog. Keeps the order papers were loaded in.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    papers: Vec<Paper>,
    filters: FilterSet,
    facets: FacetIndex,
    viewport: Option<Viewport>,
    loaded: bool,
}

impl CatalogView {
    pub fn new(filters: FilterSet) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn facets(&self) -> &FacetIndex {
        &self.facets
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn output(&self) -> RenderOutput {
        let cards = self
            .papers
            .iter()
            .filter(|p| self.filters.matches(p, FilterPolicy::ShowAllWhenEmpty))
            .map(Card::from_paper)
            .collect();

        RenderOutput::Catalog(CatalogOutput {
            cards,
            total: self.papers.len(),
            filters: self.filters.clone(),
            session_notice: self.filters.get(FilterDimension::Session).map(session_label),
            viewport: self.viewport,
        })
    }
}

impl View for CatalogView {
    type Data = Vec<Paper>;

    fn dispatch(&mut self, event: ViewEvent<Vec<Paper>>) -> Option<RenderOutput> {
        match event {
            ViewEvent::DataLoaded(papers) => {
                self.facets = FacetIndex::build(&papers);
                self.papers = papers;
                self.loaded = true;
                tracing::debug!(papers = self.papers.len(), "Catalog data loaded");
            }
            ViewEvent::LoadFailed(message) => {
                tracing::error!(error = %message, "Catalog load failed");
                self.papers.clear();
                self.facets = FacetIndex::default();
                self.loaded = false;
                return None;
            }
            ViewEvent::FilterChanged(change) => change.apply(&mut self.filters),
            ViewEvent::SelectionChanged(_) => return None,
            ViewEvent::ViewportResized(viewport) => self.viewport = Some(viewport),
        }

        self.loaded.then(|| self.output())
    }
}

// ── Keyword map ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMapOutput {
    pub tree: HierarchyTree,
    pub frame: LayoutFrame,
    /// Bounding box of the projection, for the scatter plot scales.
    pub extent: Option<([f64; 2], [f64; 2])>,
    /// Leaf driving highlight feedback (hovered or clicked).
    pub highlighted: Option<LeafKey>,
    pub latched: bool,
    /// Papers carrying the highlighted keyword, in load order.
    pub highlighted_ids: Vec<String>,
    /// Papers matching the active filters.
    pub selected_ids: Vec<String>,
    /// Papers of the selected track's subset file.
    pub track_highlight: Vec<String>,
    /// Contents of the linked list panel.
    pub list: Vec<PaperSummary>,
}

/// The keyword treemap with hover/click selection and a linked list panel.
#[derive(Debug, Clone)]
pub struct KeywordMapView {
    options: GroupingOptions,
    papers: Vec<Paper>,
    summaries: Vec<PaperSummary>,
    extent: Option<([f64; 2], [f64; 2])>,
    track_highlight: Vec<String>,
    filters: FilterSet,
    tree: HierarchyTree,
    selection: SelectionState,
    panel: ListPanel,
    frame: LayoutFrame,
    loaded: bool,
}

impl KeywordMapView {
    pub fn new(options: GroupingOptions, list_default: ListPanelDefault) -> Self {
        Self {
            options,
            papers: Vec::new(),
            summaries: Vec::new(),
            extent: None,
            track_highlight: Vec::new(),
            filters: FilterSet::new(),
            tree: HierarchyTree::default(),
            selection: SelectionState::default(),
            panel: ListPanel::new(list_default),
            frame: LayoutFrame::default(),
            loaded: false,
        }
    }

    pub fn tree(&self) -> &HierarchyTree {
        &self.tree
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    fn highlighted_ids(&self) -> Vec<String> {
        let Some(key) = self.selection.highlighted() else {
            return Vec::new();
        };
        self.papers
            .iter()
            .filter(|p| {
                p.content
                    .keywords
                    .iter()
                    .any(|k| normalize_keyword(k) == key.keyword)
            })
            .map(|p| p.id.clone())
            .collect()
    }

    fn output(&self) -> RenderOutput {
        let selected_ids = self
            .papers
            .iter()
            .filter(|p| p.is_selected)
            .map(|p| p.id.clone())
            .collect();

        RenderOutput::KeywordMap(KeywordMapOutput {
            tree: self.tree.clone(),
            frame: self.frame,
            extent: self.extent,
            highlighted: self.selection.highlighted().cloned(),
            latched: self.selection.is_latched(),
            highlighted_ids: self.highlighted_ids(),
            selected_ids,
            track_highlight: self.track_highlight.clone(),
            list: self
                .panel
                .papers(&self.tree, &self.summaries)
                .into_iter()
                .cloned()
                .collect(),
        })
    }

    fn clear(&mut self) {
        self.papers.clear();
        self.summaries.clear();
        self.extent = None;
        self.track_highlight.clear();
        self.tree = HierarchyTree::default();
        self.selection = SelectionState::default();
        self.panel.reset();
        self.loaded = false;
    }
}

impl View for KeywordMapView {
    type Data = LoadedKeywordMap;

    fn dispatch(&mut self, event: ViewEvent<LoadedKeywordMap>) -> Option<RenderOutput> {
        match event {
            ViewEvent::DataLoaded(data) => {
                self.papers = data.papers;
                self.extent = data.extent;
                self.track_highlight = data.track_highlight;
                self.tree = assemble(&build_groups(&self.papers, &self.options));
                self.summaries = summarize_papers(&self.papers, &self.options);
                self.selection = SelectionState::default();
                self.panel.reset();
                let selected =
                    apply_selection(&mut self.papers, &self.filters, FilterPolicy::SelectNoneWhenEmpty);
                self.loaded = true;
                tracing::debug!(
                    papers = self.papers.len(),
                    leaves = self.tree.leaves().count(),
                    selected,
                    "Keyword map data loaded"
                );
            }
            ViewEvent::LoadFailed(message) => {
                tracing::error!(error = %message, "Keyword map load failed");
                self.clear();
                return None;
            }
            ViewEvent::FilterChanged(change) => {
                change.apply(&mut self.filters);
                apply_selection(&mut self.papers, &self.filters, FilterPolicy::SelectNoneWhenEmpty);
            }
            ViewEvent::SelectionChanged(pointer) => {
                let state = std::mem::take(&mut self.selection);
                self.selection = state.transition(pointer);
                self.panel.observe(&self.selection);
            }
            ViewEvent::ViewportResized(viewport) => {
                let (width, height) = viewport.plot_size();
                self.frame = LayoutFrame {
                    width,
                    height,
                    ..LayoutFrame::default()
                };
            }
        }

        self.loaded.then(|| self.output())
    }
}

// ── Resize debouncing ─────────────────────────────────────────

/// Collapses a burst of resize notifications into one re-render once no new
/// notification has arrived for `quiet`.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    quiet: Duration,
    pending: Option<(Instant, Viewport)>,
}

impl ResizeDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record a resize seen at `at`. Later notifications replace earlier ones.
    pub fn push(&mut self, at: Instant, viewport: Viewport) {
        self.pending = Some((at, viewport));
    }

    /// When the pending resize becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(at, _)| at + self.quiet)
    }

    /// The settled viewport, once the quiet interval has passed.
    pub fn poll(&mut self, now: Instant) -> Option<Viewport> {
        match self.deadline() {
            Some(due) if now >= due => self.pending.take().map(|(_, viewport)| viewport),
            _ => None,
        }
    }

    /// Take the pending resize regardless of the deadline.
    pub fn flush(&mut self) -> Option<Viewport> {
        self.pending.take().map(|(_, viewport)| viewport)
    }
}

// ── Event loop ────────────────────────────────────────────────

/// Drive `view` from a channel of events until every sender is dropped.
///
/// Resizes go through a [`ResizeDebouncer`] with the `quiet` interval; all
/// other events are dispatched as they arrive. A resize still pending when
/// the channel closes is applied before returning. Returns the number of
/// frames handed to `renderer`.
pub async fn run_events<V, R>(
    view: &mut V,
    renderer: &mut R,
    mut events: mpsc::Receiver<ViewEvent<V::Data>>,
    quiet: Duration,
) -> usize
where
    V: View,
    R: Renderer + ?Sized,
{
    let mut debouncer = ResizeDebouncer::new(quiet);
    let mut frames = 0;

    loop {
        let deadline = debouncer.deadline();
        tokio::select! {
            event = events.recv() => match event {
                Some(ViewEvent::ViewportResized(viewport)) => {
                    debouncer.push(Instant::now(), viewport);
                }
                Some(event) => {
                    frames += usize::from(dispatch_and_render(view, renderer, event));
                }
                None => break,
            },
            _ = sleep_until(deadline), if deadline.is_some() => {
                if let Some(viewport) = debouncer.poll(Instant::now()) {
                    frames += usize::from(dispatch_and_render(
                        view,
                        renderer,
                        ViewEvent::ViewportResized(viewport),
                    ));
                }
            }
        }
    }

    if let Some(viewport) = debouncer.flush() {
        frames += usize::from(dispatch_and_render(
            view,
            renderer,
            ViewEvent::ViewportResized(viewport),
        ));
    }
    tracing::debug!(frames, "Event loop finished");
    frames
}

async fn sleep_until(deadline: Option<Instant>) {
    if let Some(deadline) = deadline {
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn papers() -> Vec<Paper> {
        serde_json::from_value(json!([
            { "id": "1", "pos": [0.0, 0.0], "content": {
                "title": "Fair Ranking", "authors": ["A. Smith"], "track": "T1",
                "keywords": ["Fairness"], "sessions": [{ "session_name": "D3" }] } },
            { "id": "2", "pos": [1.0, 1.0], "content": {
                "title": "Fair Parsing", "authors": ["B. Jones"], "track": "T1",
                "keywords": ["fairness", "Parsing"], "sessions": [{ "session_name": "1A" }] } },
            { "id": "3", "pos": [2.0, 2.0], "content": {
                "title": "Private Parsing", "authors": ["A. Smith"], "track": "T2",
                "keywords": ["parsing!"], "sessions": [{ "session_name": "D3" }] } }
        ]))
        .unwrap()
    }

    fn loaded_map() -> LoadedKeywordMap {
        LoadedKeywordMap {
            papers: papers(),
            extent: None,
            track_highlight: vec!["3".into()],
        }
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

    #[test]
    fn test_catalog_shows_all_until_filtered() {
        let mut view = CatalogView::default();
        let out = catalog(view.dispatch(ViewEvent::DataLoaded(papers())));
        assert_eq!(out.cards.len(), 3);
        assert_eq!(out.session_notice, None);

        let out = catalog(view.dispatch(ViewEvent::FilterChanged(FilterChange::Set(
            Filter::Session("D3".into()),
        ))));
        let ids: Vec<&str> = out.cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(out.total, 3);
        assert_eq!(out.session_notice.as_deref(), Some("Demo Session 3"));
        assert_eq!(out.cards[0].sessions, vec!["Demo Session 3"]);
    }

    #[test]
    fn test_catalog_renders_nothing_before_load() {
        let mut view = CatalogView::default();
        let out = view.dispatch(ViewEvent::FilterChanged(FilterChange::Set(Filter::Title(
            "fair".into(),
        ))));
        assert!(out.is_none());
        assert_eq!(view.filters().get(FilterDimension::Titles), Some("fair"));
    }

    #[test]
    fn test_catalog_load_failure_leaves_view_empty() {
        let mut view = CatalogView::default();
        view.dispatch(ViewEvent::DataLoaded(papers()));
        assert!(view.dispatch(ViewEvent::LoadFailed("boom".into())).is_none());
        assert!(view.papers().is_empty());
        assert!(!view.is_loaded());
        assert!(view.facets().keys(FilterDimension::Authors).is_empty());
    }

    #[test]
    fn test_keyword_map_select_none_without_filters() {
        let mut view = KeywordMapView::new(GroupingOptions::default(), ListPanelDefault::Empty);
        let out = keyword_map(view.dispatch(ViewEvent::DataLoaded(loaded_map())));
        assert!(out.selected_ids.is_empty());
        assert_eq!(out.track_highlight, vec!["3"]);
        assert_eq!(out.tree.track_names(), vec!["T1", "T2"]);
        assert_eq!(out.tree.children[1].children.len(), 0);

        let out = keyword_map(view.dispatch(ViewEvent::FilterChanged(FilterChange::Set(
            Filter::Authors("A. Smith".into()),
        ))));
        assert_eq!(out.selected_ids, vec!["1", "3"]);

        let out = keyword_map(view.dispatch(ViewEvent::FilterChanged(FilterChange::ClearAll)));
        assert!(out.selected_ids.is_empty());
    }

    #[test]
    fn test_keyword_map_hover_and_click() {
        let mut view = KeywordMapView::new(GroupingOptions::default(), ListPanelDefault::Empty);
        view.dispatch(ViewEvent::DataLoaded(loaded_map()));
        let leaf = LeafKey::new("T1", "fairness");

        let out = keyword_map(view.dispatch(ViewEvent::SelectionChanged(PointerEvent::Enter(
            leaf.clone(),
        ))));
        assert_eq!(out.highlighted, Some(leaf.clone()));
        assert_eq!(out.highlighted_ids, vec!["1", "2"]);
        assert!(out.list.is_empty());

        let out = keyword_map(view.dispatch(ViewEvent::SelectionChanged(PointerEvent::Click(
            leaf.clone(),
        ))));
        assert!(out.latched);
        let listed: Vec<&str> = out.list.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(listed, vec!["1", "2"]);

        let out = keyword_map(view.dispatch(ViewEvent::SelectionChanged(PointerEvent::Leave(
            leaf.clone(),
        ))));
        assert!(out.latched);

        let out = keyword_map(view.dispatch(ViewEvent::SelectionChanged(PointerEvent::Click(
            leaf,
        ))));
        assert_eq!(out.highlighted, None);
        assert!(out.highlighted_ids.is_empty());
        assert_eq!(out.list.len(), 2);
    }

    #[test]
    fn test_resize_keeps_grouping_identical() {
        let mut view = KeywordMapView::new(GroupingOptions::default(), ListPanelDefault::AllPapers);
        let before = keyword_map(view.dispatch(ViewEvent::DataLoaded(loaded_map())));
        let after = keyword_map(view.dispatch(ViewEvent::ViewportResized(Viewport::new(
            900.0, 1400.0,
        ))));

        assert_eq!(before.tree, after.tree);
        assert_eq!(before.list, after.list);
        assert_eq!(after.frame.width, 1190.0);
        assert_eq!(after.frame.height, 620.0);
        assert_eq!(after.frame.padding_top, 24.0);
    }

    #[test]
    fn test_keyword_map_load_failure_clears_state() {
        let mut view = KeywordMapView::new(GroupingOptions::default(), ListPanelDefault::Empty);
        view.dispatch(ViewEvent::DataLoaded(loaded_map()));
        view.dispatch(ViewEvent::SelectionChanged(PointerEvent::Click(LeafKey::new(
            "T1", "fairness",
        ))));

        assert!(view.dispatch(ViewEvent::LoadFailed("404".into())).is_none());
        assert!(view.papers().is_empty());
        assert!(view.tree().children.is_empty());
        assert_eq!(view.selection(), &SelectionState::Unselected);
    }

    #[test]
    fn test_plot_size() {
        assert_eq!(Viewport::new(900.0, 1400.0).plot_size(), (1190.0, 620.0));
        // Narrow container: width follows the container.
        assert_eq!(Viewport::new(900.0, 500.0).plot_size(), (490.0, 620.0));
        // Tall and narrow gets squared.
        assert_eq!(Viewport::new(1200.0, 400.0).plot_size(), (390.0, 390.0));
        // Short window clamps to the minimum height.
        assert_eq!(Viewport::new(400.0, 1000.0).plot_size(), (790.0, 300.0));
    }

    #[test]
    fn test_debouncer_collapses_bursts() {
        let start = Instant::now();
        let ms = Duration::from_millis;
        let mut debouncer = ResizeDebouncer::new(ms(150));
        assert_eq!(debouncer.poll(start), None);

        debouncer.push(start, Viewport::new(800.0, 1000.0));
        debouncer.push(start + ms(100), Viewport::new(810.0, 1000.0));
        debouncer.push(start + ms(200), Viewport::new(820.0, 1000.0));

        assert_eq!(debouncer.poll(start + ms(300)), None);
        assert_eq!(debouncer.deadline(), Some(start + ms(350)));
        assert_eq!(
            debouncer.poll(start + ms(350)),
            Some(Viewport::new(820.0, 1000.0))
        );
        assert_eq!(debouncer.poll(start + ms(1000)), None);
    }

    struct Recorder(Vec<RenderOutput>);

    impl Renderer for Recorder {
        fn render(&mut self, output: &RenderOutput) {
            self.0.push(output.clone());
        }
    }

    #[test]
    fn test_dispatch_and_render() {
        let mut view = CatalogView::default();
        let mut recorder = Recorder(Vec::new());
        assert!(!dispatch_and_render(
            &mut view,
            &mut recorder,
            ViewEvent::LoadFailed("offline".into())
        ));
        assert!(dispatch_and_render(
            &mut view,
            &mut recorder,
            ViewEvent::DataLoaded(papers())
        ));
        assert_eq!(recorder.0.len(), 1);
    }
}
