//! Filter predicates shared by the catalog and keyword-map views.
//!
//! A [`FilterSet`] holds at most one active value per [`FilterDimension`].
//! Active predicates are combined with logical AND. What an empty set means
//! depends on the call site, see [`FilterPolicy`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FilterError;
use crate::model::Paper;

/// The searchable fields of a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterDimension {
    Authors,
    Keywords,
    Titles,
    Session,
}

impl FilterDimension {
    pub const ALL: [FilterDimension; 4] = [
        FilterDimension::Authors,
        FilterDimension::Keywords,
        FilterDimension::Titles,
        FilterDimension::Session,
    ];

    /// Name used in page URLs (`?filter=...`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authors => "authors",
            Self::Keywords => "keywords",
            Self::Titles => "titles",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for FilterDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterDimension {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "authors" => Ok(Self::Authors),
            "keywords" => Ok(Self::Keywords),
            "titles" | "title" => Ok(Self::Titles),
            "session" | "sessions" => Ok(Self::Session),
            _ => Err(FilterError::UnknownDimension {
                name: s.to_string(),
            }),
        }
    }
}

/// One active predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "dimension", content = "value", rename_all = "lowercase")]
pub enum Filter {
    Authors(String),
    Keywords(String),
    Title(String),
    Session(String),
}

impl Filter {
    pub fn new(dimension: FilterDimension, value: impl Into<String>) -> Self {
        let value = value.into();
        match dimension {
            FilterDimension::Authors => Self::Authors(value),
            FilterDimension::Keywords => Self::Keywords(value),
            FilterDimension::Titles => Self::Title(value),
            FilterDimension::Session => Self::Session(value),
        }
    }

    pub fn dimension(&self) -> FilterDimension {
        match self {
            Self::Authors(_) => FilterDimension::Authors,
            Self::Keywords(_) => FilterDimension::Keywords,
            Self::Title(_) => FilterDimension::Titles,
            Self::Session(_) => FilterDimension::Session,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Authors(v) | Self::Keywords(v) | Self::Title(v) | Self::Session(v) => v,
        }
    }

    /// Evaluate this single predicate against a paper.
    ///
    /// Titles match case-insensitively as a substring. Authors and keywords
    /// match when the value is an element of the sequence. Sessions match when
    /// any session entry carries the value as its name.
    pub fn accepts(&self, paper: &Paper) -> bool {
        let content = &paper.content;
        match self {
            Self::Title(needle) => content
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            Self::Session(name) => content.sessions.iter().any(|s| &s.session_name == name),
            Self::Authors(author) => content.authors.iter().any(|a| a == author),
            Self::Keywords(keyword) => content.keywords.iter().any(|k| k == keyword),
        }
    }
}

/// What an empty filter set evaluates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPolicy {
    /// Result filtering (catalog): no filters shows everything.
    ShowAllWhenEmpty,
    /// Selection highlighting (keyword map): no filters selects nothing.
    SelectNoneWhenEmpty,
}

/// Active filters, at most one per dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from individual filters; later filters replace earlier ones
    /// on the same dimension.
    pub fn from_filters(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut set = Self::new();
        for filter in filters {
            set.insert(filter);
        }
        set
    }

    /// Replace the value of the filter's dimension. An empty value clears it.
    pub fn insert(&mut self, filter: Filter) {
        let dimension = filter.dimension();
        self.filters.retain(|f| f.dimension() != dimension);
        if !filter.value().is_empty() {
            self.filters.push(filter);
        }
    }

    pub fn set(&mut self, dimension: FilterDimension, value: impl Into<String>) {
        self.insert(Filter::new(dimension, value));
    }

    pub fn clear(&mut self, dimension: FilterDimension) {
        self.filters.retain(|f| f.dimension() != dimension);
    }

    pub fn clear_all(&mut self) {
        self.filters.clear();
    }

    pub fn get(&self, dimension: FilterDimension) -> Option<&str> {
        self.filters
            .iter()
            .find(|f| f.dimension() == dimension)
            .map(Filter::value)
    }

    pub fn active(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Evaluate the set against a paper under `policy`.
    pub fn matches(&self, paper: &Paper, policy: FilterPolicy) -> bool {
        matches(paper, self, policy)
    }
}

/// Does `paper` satisfy every active filter?
///
/// With no active filter the answer is decided by `policy`.
pub fn matches(paper: &Paper, filters: &FilterSet, policy: FilterPolicy) -> bool {
    if filters.is_empty() {
        return policy == FilterPolicy::ShowAllWhenEmpty;
    }
    filters.active().iter().all(|f| f.accepts(paper))
}

/// Papers passing the filters, in input order.
pub fn filter_papers<'a>(
    papers: &'a [Paper],
    filters: &FilterSet,
    policy: FilterPolicy,
) -> Vec<&'a Paper> {
    papers
        .iter()
        .filter(|paper| matches(paper, filters, policy))
        .collect()
}

/// Set the advisory `is_selected` flag on every paper. Returns the number of
/// selected papers.
pub fn apply_selection(papers: &mut [Paper], filters: &FilterSet, policy: FilterPolicy) -> usize {
    let mut selected = 0;
    for paper in papers.iter_mut() {
        paper.is_selected = matches(paper, filters, policy);
        if paper.is_selected {
            selected += 1;
        }
    }
    selected
}
