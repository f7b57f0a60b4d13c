//! Typeahead key index.
//!
//! Collects the distinct values of each filter dimension so the search box
//! can suggest them. Values keep their first-seen order.

use std::collections::HashSet;

use crate::filter::FilterDimension;
use crate::model::Paper;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetIndex {
    authors: Vec<String>,
    keywords: Vec<String>,
    titles: Vec<String>,
    sessions: Vec<String>,
}

impl FacetIndex {
    pub fn build(papers: &[Paper]) -> Self {
        let mut index = Self::default();
        let mut seen: [HashSet<String>; 4] = Default::default();

        for paper in papers {
            let content = &paper.content;
            for author in &content.authors {
                push_unique(&mut index.authors, &mut seen[0], author);
            }
            for keyword in &content.keywords {
                push_unique(&mut index.keywords, &mut seen[1], keyword);
            }
            push_unique(&mut index.titles, &mut seen[2], &content.title);
            for session in &content.sessions {
                push_unique(&mut index.sessions, &mut seen[3], &session.session_name);
            }
        }
        index
    }

    pub fn keys(&self, dimension: FilterDimension) -> &[String] {
        match dimension {
            FilterDimension::Authors => &self.authors,
            FilterDimension::Keywords => &self.keywords,
            FilterDimension::Titles => &self.titles,
            FilterDimension::Session => &self.sessions,
        }
    }

    /// Keys containing `query` case-insensitively; prefix matches rank first.
    pub fn suggest(&self, dimension: FilterDimension, query: &str, limit: usize) -> Vec<&str> {
        let needle = query.to_lowercase();
        let (mut prefix, mut inner): (Vec<&str>, Vec<&str>) = (Vec::new(), Vec::new());

        for key in self.keys(dimension) {
            let lower = key.to_lowercase();
            if lower.starts_with(&needle) {
                prefix.push(key);
            } else if lower.contains(&needle) {
                inner.push(key);
            }
        }
        prefix.extend(inner);
        prefix.truncate(limit);
        prefix
    }
}

fn push_unique(keys: &mut Vec<String>, seen: &mut HashSet<String>, value: &str) {
    if value.is_empty() {
        return;
    }
    if seen.insert(value.to_string()) {
        keys.push(value.to_string());
    }
}
