//! Grouping of papers by track and normalised keyword.
//!
//! Produces `track -> (keyword -> [PaperSummary])` with first-occurrence
//! ordering at both levels, then drops groups below the minimum size. The
//! result is the only input the treemap tree is assembled from.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::keywords::normalize_keyword;
use crate::model::{Paper, PaperSummary};

/// Bucket used for papers whose track is missing or empty.
pub const UNDEFINED_TRACK: &str = "undefined";

/// Knobs for [`build_groups`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingOptions {
    /// Groups with fewer members are dropped before tree construction.
    pub min_group_size: usize,
    /// Insert a paper at most once per group even when several of its raw
    /// keywords normalise to the same key. `false` keeps every occurrence.
    pub dedupe_within_group: bool,
    /// Copy the raw keyword list into each summary.
    pub include_keywords: bool,
    /// Copy the card image path into each summary.
    pub include_image: bool,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            min_group_size: 2,
            dedupe_within_group: true,
            include_keywords: false,
            include_image: false,
        }
    }
}

/// Papers sharing one normalised keyword within one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordGroup {
    pub keyword: String,
    pub papers: Vec<PaperSummary>,
}

/// All keyword groups of one track, in keyword first-occurrence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackGroups {
    pub track: String,
    groups: Vec<KeywordGroup>,
    index: HashMap<String, usize>,
}

impl TrackGroups {
    fn new(track: String) -> Self {
        Self {
            track,
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn groups(&self) -> &[KeywordGroup] {
        &self.groups
    }

    pub fn get(&self, keyword: &str) -> Option<&KeywordGroup> {
        self.index.get(keyword).map(|&i| &self.groups[i])
    }

    fn push(&mut self, keyword: String, summary: PaperSummary) {
        match self.index.get(&keyword) {
            Some(&i) => self.groups[i].papers.push(summary),
            None => {
                self.index.insert(keyword.clone(), self.groups.len());
                self.groups.push(KeywordGroup {
                    keyword,
                    papers: vec![summary],
                });
            }
        }
    }

    fn retain_min_size(&mut self, min: usize) {
        self.groups.retain(|g| g.papers.len() >= min);
        self.index = self
            .groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.keyword.clone(), i))
            .collect();
    }
}

/// The full grouping map, in track first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordGroups {
    tracks: Vec<TrackGroups>,
    index: HashMap<String, usize>,
}

impl KeywordGroups {
    pub fn tracks(&self) -> &[TrackGroups] {
        &self.tracks
    }

    pub fn track(&self, name: &str) -> Option<&TrackGroups> {
        self.index.get(name).map(|&i| &self.tracks[i])
    }

    pub fn group(&self, track: &str, keyword: &str) -> Option<&KeywordGroup> {
        self.track(track)?.get(keyword)
    }

    /// Number of surviving (track, keyword) groups.
    pub fn group_count(&self) -> usize {
        self.tracks.iter().map(|t| t.groups.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.group_count() == 0
    }

    fn track_mut(&mut self, name: &str) -> &mut TrackGroups {
        let i = match self.index.get(name) {
            Some(&i) => i,
            None => {
                self.index.insert(name.to_string(), self.tracks.len());
                self.tracks.push(TrackGroups::new(name.to_string()));
                self.tracks.len() - 1
            }
        };
        &mut self.tracks[i]
    }
}

/// Group papers by (track, normalised keyword).
///
/// Every track seen is kept, even when all of its groups are dropped, so the
/// treemap can still draw its title band.
pub fn build_groups(papers: &[Paper], options: &GroupingOptions) -> KeywordGroups {
    let mut groups = KeywordGroups::default();

    for paper in papers {
        let track = track_key(paper);
        let bucket = groups.track_mut(track);
        let mut seen: HashSet<String> = HashSet::new();

        for raw in &paper.content.keywords {
            let key = normalize_keyword(raw);
            if options.dedupe_within_group && !seen.insert(key.clone()) {
                continue;
            }
            let summary = PaperSummary::from_paper(
                paper,
                track,
                options.include_keywords,
                options.include_image,
            );
            bucket.push(key, summary);
        }
    }

    for track in &mut groups.tracks {
        track.retain_min_size(options.min_group_size);
    }

    tracing::debug!(
        papers = papers.len(),
        tracks = groups.tracks.len(),
        groups = groups.group_count(),
        "Built keyword groups"
    );
    groups
}

/// One summary per paper in load order, recorded under the same track bucket
/// the grouping uses. Papers whose groups were all dropped are still listed.
pub fn summarize_papers(papers: &[Paper], options: &GroupingOptions) -> Vec<PaperSummary> {
    papers
        .iter()
        .map(|paper| {
            PaperSummary::from_paper(
                paper,
                track_key(paper),
                options.include_keywords,
                options.include_image,
            )
        })
        .collect()
}

fn track_key(paper: &Paper) -> &str {
    if paper.content.track.is_empty() {
        UNDEFINED_TRACK
    } else {
        &paper.content.track
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn paper(id: &str, track: &str, keywords: &[&str]) -> Paper {
        serde_json::from_value(json!({
            "id": id,
            "content": {
                "title": format!("Paper {id}"),
                "authors": ["A. Smith"],
                "track": track,
                "keywords": keywords,
            }
        }))
        .unwrap()
    }

    fn ids(group: &KeywordGroup) -> Vec<&str> {
        group.papers.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_fairness_scenario_deduped() {
        let papers = vec![
            paper("1", "T1", &["Fairness", "fairness"]),
            paper("2", "T1", &["Fairness"]),
            paper("3", "T1", &["Privacy"]),
        ];
        let groups = build_groups(&papers, &GroupingOptions::default());

        assert_eq!(groups.tracks().len(), 1);
        let t1 = groups.track("T1").unwrap();
        assert_eq!(t1.groups().len(), 1);
        assert_eq!(ids(t1.get("fairness").unwrap()), vec!["1", "2"]);
        assert!(t1.get("privacy").is_none());
    }

    #[test]
    fn test_fairness_scenario_without_dedupe() {
        let papers = vec![
            paper("1", "T1", &["Fairness", "fairness"]),
            paper("2", "T1", &["Fairness"]),
            paper("3", "T1", &["Privacy"]),
        ];
        let options = GroupingOptions {
            dedupe_within_group: false,
            ..Default::default()
        };
        let groups = build_groups(&papers, &options);
        assert_eq!(
            ids(groups.group("T1", "fairness").unwrap()),
            vec!["1", "1", "2"]
        );
        assert!(groups.group("T1", "privacy").is_none());
    }

    #[test]
    fn test_groups_are_per_track() {
        let papers = vec![
            paper("1", "T1", &["Parsing"]),
            paper("2", "T2", &["Parsing"]),
            paper("3", "T1", &["parsing!"]),
        ];
        let groups = build_groups(&papers, &GroupingOptions::default());
        assert_eq!(ids(groups.group("T1", "parsing").unwrap()), vec!["1", "3"]);
        // Only one T2 paper carries the keyword, so the group is dropped.
        assert!(groups.group("T2", "parsing").is_none());
        assert!(groups.track("T2").is_some());
    }

    #[test]
    fn test_insertion_order_of_tracks_and_keywords() {
        let papers = vec![
            paper("1", "Zeta", &["b", "a"]),
            paper("2", "Alpha", &["c"]),
            paper("3", "Zeta", &["a", "b"]),
            paper("4", "Alpha", &["c"]),
        ];
        let groups = build_groups(&papers, &GroupingOptions::default());
        let tracks: Vec<&str> = groups.tracks().iter().map(|t| t.track.as_str()).collect();
        assert_eq!(tracks, vec!["Zeta", "Alpha"]);
        let zeta: Vec<&str> = groups.track("Zeta").unwrap().groups().iter().map(|g| g.keyword.as_str()).collect();
        assert_eq!(zeta, vec!["b", "a"]);
    }

    #[test]
    fn test_missing_track_and_keywords() {
        let bare: Paper = serde_json::from_value(json!({ "id": "9", "content": {} })).unwrap();
        let papers = vec![
            bare,
            paper("1", "", &["Dialogue"]),
            paper("2", "", &["dialogue"]),
        ];
        let groups = build_groups(&papers, &GroupingOptions::default());
        assert_eq!(groups.tracks().len(), 1);
        let group = groups.group(UNDEFINED_TRACK, "dialogue").unwrap();
        assert_eq!(ids(group), vec!["1", "2"]);
        assert_eq!(group.papers[0].track, UNDEFINED_TRACK);
    }

    #[test]
    fn test_summarize_papers_lists_each_paper_once() {
        let papers = vec![
            paper("1", "T1", &["a", "b"]),
            paper("2", "T1", &["a", "b"]),
            paper("3", "", &["solo"]),
        ];
        let summaries = summarize_papers(&papers, &GroupingOptions::default());
        let ids: Vec<&str> = summaries.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(summaries[2].track, UNDEFINED_TRACK);
    }

    #[test]
    fn test_min_group_size_configurable() {
        let papers = vec![paper("1", "T1", &["Solo"])];
        let options = GroupingOptions {
            min_group_size: 1,
            ..Default::default()
        };
        let groups = build_groups(&papers, &options);
        assert_eq!(groups.group_count(), 1);

        let strict = build_groups(&papers, &GroupingOptions::default());
        assert!(strict.is_empty());
    }

    #[test]
    fn test_summaries_are_lightweight_by_default() {
        let papers = vec![paper("1", "T1", &["x"]), paper("2", "T1", &["x"])];
        let groups = build_groups(&papers, &GroupingOptions::default());
        let summary = &groups.group("T1", "x").unwrap().papers[0];
        assert_eq!(summary.title, "Paper 1");
        assert_eq!(summary.authors, vec!["A. Smith"]);
        assert_eq!(summary.keywords, None);
    }

    #[test]
    fn test_build_is_deterministic() {
        let papers = vec![
            paper("1", "T1", &["a", "b"]),
            paper("2", "T2", &["a"]),
            paper("3", "T1", &["b", "a"]),
            paper("4", "T2", &["a"]),
        ];
        let first = build_groups(&papers, &GroupingOptions::default());
        let second = build_groups(&papers, &GroupingOptions::default());
        assert_eq!(first, second);
    }
}
