//! Hover/click highlighting for treemap leaves and the linked list panel.
//!
//! A click latches the selection. While latched, hover feedback is
//! suppressed, and the next click on any leaf releases it.

use serde::{Deserialize, Serialize};

use crate::model::PaperSummary;
use crate::tree::HierarchyTree;

/// Identifies one treemap leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeafKey {
    pub track: String,
    pub keyword: String,
}

impl LeafKey {
    pub fn new(track: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            track: track.into(),
            keyword: keyword.into(),
        }
    }
}

/// Pointer interaction on a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerEvent {
    Enter(LeafKey),
    Leave(LeafKey),
    Click(LeafKey),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionState {
    #[default]
    Unselected,
    Hovered(LeafKey),
    Clicked(LeafKey),
}

impl SelectionState {
    /// Apply a pointer event and return the next state.
    pub fn transition(self, event: PointerEvent) -> SelectionState {
        use PointerEvent::*;
        use SelectionState::*;

        match (self, event) {
            (Unselected, Enter(key)) => Hovered(key),
            (Hovered(_), Enter(key)) => Hovered(key),
            (Hovered(_), Leave(_)) => Unselected,
            (Unselected | Hovered(_), Click(key)) => Clicked(key),
            (Clicked(_), Click(_)) => Unselected,
            (state, _) => state,
        }
    }

    /// The leaf currently driving highlight feedback, if any.
    pub fn highlighted(&self) -> Option<&LeafKey> {
        match self {
            Self::Unselected => None,
            Self::Hovered(key) | Self::Clicked(key) => Some(key),
        }
    }

    pub fn clicked(&self) -> Option<&LeafKey> {
        match self {
            Self::Clicked(key) => Some(key),
            _ => None,
        }
    }

    pub fn is_latched(&self) -> bool {
        matches!(self, Self::Clicked(_))
    }
}

/// What the list panel shows before any leaf has been clicked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListPanelDefault {
    #[default]
    Empty,
    AllPapers,
}

/// The list panel linked to treemap clicks.
///
/// Keeps the most recent click even after the latch is released, so the
/// panel does not blank out when the user clicks again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPanel {
    default: ListPanelDefault,
    last_clicked: Option<LeafKey>,
}

impl ListPanel {
    pub fn new(default: ListPanelDefault) -> Self {
        Self {
            default,
            last_clicked: None,
        }
    }

    /// Record the selection after a transition.
    pub fn observe(&mut self, state: &SelectionState) {
        if let Some(key) = state.clicked() {
            self.last_clicked = Some(key.clone());
        }
    }

    pub fn last_clicked(&self) -> Option<&LeafKey> {
        self.last_clicked.as_ref()
    }

    pub fn reset(&mut self) {
        self.last_clicked = None;
    }

    /// Papers to list for the current tree.
    ///
    /// A clicked keyword lists the papers of every leaf sharing that keyword
    /// across tracks. Before any click, `loaded` (one summary per loaded
    /// paper) backs the all-papers default.
    pub fn papers<'a>(
        &self,
        tree: &'a HierarchyTree,
        loaded: &'a [PaperSummary],
    ) -> Vec<&'a PaperSummary> {
        match (&self.last_clicked, self.default) {
            (Some(key), _) => tree.papers_for_keyword(&key.keyword),
            (None, ListPanelDefault::AllPapers) => loaded.iter().collect(),
            (None, ListPanelDefault::Empty) => Vec::new(),
        }
    }
}
