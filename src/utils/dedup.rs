//! Deduplication of papers across providers.
//!
//! A candidate is a duplicate of an already kept paper when any of these
//! match, checked in order:
//!
//! 1. both DOIs are non-empty and equal (case-sensitive)
//! 2. both paper IDs are non-empty and equal
//! 3. titles are equal after lower-casing and trimming
//!
//! Kept papers always win: a later duplicate is dropped and never replaces an
//! earlier entry. Title matching is exact, so reprints sharing a title merge
//! and titles differing by a subtitle do not.

use std::collections::HashSet;

use crate::models::{non_empty, Paper};

/// Which rule identified a duplicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateMatch {
    Doi,
    PaperId,
    Title,
}

/// Index over the identity keys of a set of kept papers
#[derive(Debug, Default, Clone)]
pub struct PaperIndex {
    dois: HashSet<String>,
    ids: HashSet<String>,
    titles: HashSet<String>,
}

impl PaperIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over `papers`
    pub fn from_papers<'a>(papers: impl IntoIterator<Item = &'a Paper>) -> Self {
        let mut index = Self::new();
        for paper in papers {
            index.insert(paper);
        }
        index
    }

    /// Record a kept paper's keys
    pub fn insert(&mut self, paper: &Paper) {
        if let Some(doi) = non_empty(&paper.doi) {
            self.dois.insert(doi.to_string());
        }
        if let Some(id) = non_empty(&paper.paper_id) {
            self.ids.insert(id.to_string());
        }
        let title = normalize_title(&paper.title);
        if !title.is_empty() {
            self.titles.insert(title);
        }
    }

    /// Which rule, if any, makes `paper` a duplicate of an indexed paper
    pub fn find_match(&self, paper: &Paper) -> Option<DuplicateMatch> {
        if non_empty(&paper.doi).is_some_and(|doi| self.dois.contains(doi)) {
            return Some(DuplicateMatch::Doi);
        }
        if non_empty(&paper.paper_id).is_some_and(|id| self.ids.contains(id)) {
            return Some(DuplicateMatch::PaperId);
        }
        let title = normalize_title(&paper.title);
        if !title.is_empty() && self.titles.contains(&title) {
            return Some(DuplicateMatch::Title);
        }
        None
    }

    pub fn contains(&self, paper: &Paper) -> bool {
        self.find_match(paper).is_some()
    }
}

/// Normalize a title for comparison
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Check if two papers are duplicates of each other
pub fn is_duplicate(a: &Paper, b: &Paper) -> bool {
    PaperIndex::from_papers([a]).contains(b)
}

/// Remove duplicate papers, keeping the first occurrence
pub fn deduplicate_papers(papers: Vec<Paper>) -> Vec<Paper> {
    let (merged, _) = merge_unique(Vec::new(), papers);
    merged
}

/// Append the papers from `incoming` that duplicate neither `existing` nor
/// an earlier incoming paper
///
/// `existing` is kept as-is, even if it contains duplicates of its own.
/// Returns the merged list and the number of papers appended.
pub fn merge_unique(existing: Vec<Paper>, incoming: Vec<Paper>) -> (Vec<Paper>, usize) {
    let mut index = PaperIndex::from_papers(&existing);
    let mut merged = existing;
    let mut added = 0;

    for paper in incoming {
        if let Some(rule) = index.find_match(&paper) {
            tracing::trace!(title = %paper.title, ?rule, "Dropping duplicate paper");
            continue;
        }
        index.insert(&paper);
        merged.push(paper);
        added += 1;
    }

    (merged, added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaperBuilder, ProviderType};

    fn paper(id: &str, title: &str, source: ProviderType) -> Paper {
        PaperBuilder::new(title, source).paper_id(id).build()
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Attention Is All You Need "), "attention is all you need");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn test_deduplicate_by_doi() {
        let papers = vec![
            PaperBuilder::new("Test Paper", ProviderType::Arxiv)
                .paper_id("1")
                .doi("10.1234/test")
                .build(),
            PaperBuilder::new("Different Title", ProviderType::SemanticScholar)
                .paper_id("2")
                .doi("10.1234/test")
                .build(),
        ];

        let deduped = deduplicate_papers(papers);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].paper_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_doi_match_is_case_sensitive() {
        let a = PaperBuilder::new("A", ProviderType::Arxiv)
            .doi("10.1234/TEST")
            .build();
        let b = PaperBuilder::new("B", ProviderType::SemanticScholar)
            .doi("10.1234/test")
            .build();

        assert!(!is_duplicate(&a, &b));
    }

    #[test]
    fn test_blank_identifiers_do_not_match() {
        let a = PaperBuilder::new("A", ProviderType::Arxiv)
            .doi(" ")
            .paper_id("")
            .build();
        let b = PaperBuilder::new("B", ProviderType::SemanticScholar)
            .doi(" ")
            .paper_id("")
            .build();

        assert!(!is_duplicate(&a, &b));
    }

    #[test]
    fn test_deduplicate_by_paper_id() {
        let a = paper("2301.00001", "Title A", ProviderType::Arxiv);
        let b = paper("2301.00001", "Title A (v2)", ProviderType::HuggingFace);
        assert_eq!(
            PaperIndex::from_papers([&a]).find_match(&b),
            Some(DuplicateMatch::PaperId)
        );
    }

    #[test]
    fn test_deduplicate_by_title() {
        let papers = vec![
            paper("1", "Machine Learning for Cats", ProviderType::Arxiv),
            paper("abc", "  machine learning for cats", ProviderType::SemanticScholar),
        ];

        let deduped = deduplicate_papers(papers);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].source, ProviderType::Arxiv);
    }

    #[test]
    fn test_subtitle_is_not_a_duplicate() {
        let a = paper("1", "Deep Learning", ProviderType::Arxiv);
        let b = paper("2", "Deep Learning: A Survey", ProviderType::SemanticScholar);
        assert!(!is_duplicate(&a, &b));
    }

    #[test]
    fn test_deduplicate_empty_and_single() {
        assert!(deduplicate_papers(Vec::new()).is_empty());
        let single = vec![paper("1", "Only", ProviderType::Arxiv)];
        assert_eq!(deduplicate_papers(single).len(), 1);
    }

    #[test]
    fn test_merge_with_self_is_identity() {
        let papers = vec![
            paper("1", "One", ProviderType::Arxiv),
            paper("2", "Two", ProviderType::Arxiv),
            PaperBuilder::new("Three", ProviderType::SemanticScholar)
                .doi("10.1/three")
                .build(),
        ];

        let (merged, added) = merge_unique(papers.clone(), papers.clone());
        assert_eq!(added, 0);
        assert_eq!(merged, papers);
        assert_eq!(deduplicate_papers(papers.clone()), papers);
    }

    #[test]
    fn test_merge_appends_only_new_papers() {
        let existing = vec![paper("1", "Shared", ProviderType::SemanticScholar)];
        let incoming = vec![
            paper("2301.1", "Shared", ProviderType::Arxiv),
            paper("2301.2", "Fresh", ProviderType::Arxiv),
            paper("2301.3", "fresh ", ProviderType::Arxiv),
        ];

        let (merged, added) = merge_unique(existing, incoming);
        assert_eq!(added, 1);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].source, ProviderType::SemanticScholar);
        assert_eq!(merged[1].paper_id.as_deref(), Some("2301.2"));
    }
}
