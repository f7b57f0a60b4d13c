//! Weighted hierarchy handed to the treemap layout engine.
//!
//! root -> track nodes -> keyword leaves, where a leaf's `value` is the number
//! of papers in its group. The serialised form matches the nested
//! `{children: [...]}` shape hierarchical layout libraries consume.

use serde::{Deserialize, Serialize};

use crate::grouping::KeywordGroups;
use crate::model::PaperSummary;

/// A keyword group as a treemap leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordLeaf {
    pub name: String,
    pub group: String,
    pub papers: Vec<PaperSummary>,
    pub value: usize,
}

/// A track as an inner treemap node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackNode {
    pub name: String,
    pub children: Vec<KeywordLeaf>,
}

impl TrackNode {
    /// Sum of the leaf weights below this track.
    pub fn value(&self) -> usize {
        self.children.iter().map(|leaf| leaf.value).sum()
    }
}

/// The root of the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyTree {
    pub children: Vec<TrackNode>,
}

impl HierarchyTree {
    /// Iterate over `(track, leaf)` pairs in layout order.
    pub fn leaves(&self) -> impl Iterator<Item = (&TrackNode, &KeywordLeaf)> {
        self.children
            .iter()
            .flat_map(|track| track.children.iter().map(move |leaf| (track, leaf)))
    }

    pub fn leaf(&self, track: &str, keyword: &str) -> Option<&KeywordLeaf> {
        self.children
            .iter()
            .find(|t| t.name == track)?
            .children
            .iter()
            .find(|leaf| leaf.name == keyword)
    }

    pub fn total_value(&self) -> usize {
        self.children.iter().map(TrackNode::value).sum()
    }

    pub fn track_names(&self) -> Vec<&str> {
        self.children.iter().map(|t| t.name.as_str()).collect()
    }

    /// Papers of every leaf named `keyword`, across all tracks, in layout order.
    pub fn papers_for_keyword(&self, keyword: &str) -> Vec<&PaperSummary> {
        self.leaves()
            .filter(|(_, leaf)| leaf.name == keyword)
            .flat_map(|(_, leaf)| leaf.papers.iter())
            .collect()
    }
}

/// Assemble the weighted tree from a grouping map. Pure.
pub fn assemble(groups: &KeywordGroups) -> HierarchyTree {
    let children = groups
        .tracks()
        .iter()
        .map(|track| TrackNode {
            name: track.track.clone(),
            children: track
                .groups()
                .iter()
                .map(|group| KeywordLeaf {
                    name: group.keyword.clone(),
                    group: group.keyword.clone(),
                    value: group.papers.len(),
                    papers: group.papers.clone(),
                })
                .collect(),
        })
        .collect();

    HierarchyTree { children }
}

// ── Layout collaborator ────────────────────────────────────────

/// Canvas size and padding convention for the treemap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutFrame {
    pub width: f64,
    pub height: f64,
    /// Space reserved above each track for its title band.
    pub padding_top: f64,
    pub padding_right: f64,
    /// Separator between sibling leaves.
    pub padding_inner: f64,
}

impl Default for LayoutFrame {
    fn default() -> Self {
        Self {
            width: 650.0,
            height: 650.0,
            padding_top: 24.0,
            padding_right: 1.0,
            padding_inner: 2.0,
        }
    }
}

/// A positioned leaf as returned by a layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafRect {
    pub track: String,
    pub keyword: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// External engine computing leaf rectangles with area proportional to
/// `value`. Only the weighted-tree input contract lives in this crate.
pub trait LayoutEngine {
    fn layout(&self, tree: &HierarchyTree, frame: LayoutFrame) -> Vec<LeafRect>;
}
