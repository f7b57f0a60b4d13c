//! # papermap Core
//!
//! Core library for browsing conference papers.
//! Provides keyword normalisation and grouping, the weighted treemap
//! hierarchy, filter evaluation, leaf selection, view state with event
//! dispatch, data loading, the read-marks store, configuration, and errors.

pub mod config;
pub mod error;
pub mod facets;
pub mod filter;
pub mod grouping;
pub mod keywords;
pub mod loader;
pub mod model;
pub mod ordering;
pub mod query;
pub mod read_marks;
pub mod selection;
pub mod tracks;
pub mod tree;
pub mod view;

// Re-export commonly used types at the crate root.
pub use config::{PapermapConfig, load_config, load_config_file, resolve_config};
pub use error::{ConfigError, FilterError, LoadError, PapermapError, Result};
pub use filter::{Filter, FilterDimension, FilterPolicy, FilterSet, matches};
pub use grouping::{GroupingOptions, KeywordGroups, build_groups, summarize_papers};
pub use keywords::normalize_keyword;
pub use loader::{DataSource, DirSource, HttpSource, LoadedKeywordMap, source_for};
pub use model::{Paper, PaperContent, PaperSummary, SessionInfo};
pub use read_marks::ReadMarks;
pub use selection::{LeafKey, ListPanel, ListPanelDefault, PointerEvent, SelectionState};
pub use tracks::TrackSelection;
pub use tree::{HierarchyTree, KeywordLeaf, LayoutEngine, LayoutFrame, TrackNode, assemble};
pub use view::{
    CatalogView, KeywordMapView, Renderer, RenderOutput, ResizeDebouncer, View, ViewEvent,
    Viewport, run_events,
};
