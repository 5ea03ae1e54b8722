//! Mock source adapter for testing
//!
//! In-memory fixture implementing the full [`SourceAdapter`] contract,
//! including its degrade-to-absence semantics, without any network.

use super::{normalize_title, ExternalRecord, SourceAdapter};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory source adapter
#[derive(Default)]
pub struct MockSourceAdapter {
    papers: HashMap<String, ExternalRecord>,
    by_title: HashMap<String, String>,
    references: HashMap<String, Vec<String>>,
    unresolvable: HashSet<String>,
    resolve_calls: AtomicUsize,
    reference_calls: AtomicUsize,
    batch_calls: AtomicUsize,
}

/// Convenience constructor for fixture records.
pub fn record(id: &str, title: &str, citation_count: u64) -> ExternalRecord {
    ExternalRecord {
        id: id.to_string(),
        title: title.to_string(),
        authors: Vec::new(),
        year: None,
        abstract_text: None,
        citation_count,
        venue: None,
    }
}

impl MockSourceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a paper known to the source.
    pub fn with_paper(mut self, paper: ExternalRecord) -> Self {
        self.by_title
            .insert(normalize_title(&paper.title), paper.id.clone());
        self.papers.insert(paper.id.clone(), paper);
        self
    }

    /// Register the reference list (cited ids) of a paper.
    pub fn with_references(mut self, id: &str, refs: &[&str]) -> Self {
        self.references
            .insert(id.to_string(), refs.iter().map(|r| r.to_string()).collect());
        self
    }

    /// Make a title permanently unresolvable (simulates a paper the source
    /// does not know, or retry exhaustion).
    pub fn with_unresolvable(mut self, title: &str) -> Self {
        self.unresolvable.insert(normalize_title(title));
        self
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn reference_calls(&self) -> usize {
        self.reference_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SourceAdapter for MockSourceAdapter {
    async fn resolve(&self, title: &str, external_id: Option<&str>) -> Option<ExternalRecord> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);

        if self.unresolvable.contains(&normalize_title(title)) {
            return None;
        }
        if let Some(id) = external_id {
            if let Some(paper) = self.papers.get(id) {
                return Some(paper.clone());
            }
        }
        self.by_title
            .get(&normalize_title(title))
            .and_then(|id| self.papers.get(id))
            .cloned()
    }

    async fn references(&self, id: &str, limit: usize) -> Vec<ExternalRecord> {
        self.reference_calls.fetch_add(1, Ordering::SeqCst);

        self.references
            .get(id)
            .map(|refs| {
                refs.iter()
                    .filter_map(|r| self.papers.get(r))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn citations(&self, id: &str, limit: usize) -> Vec<ExternalRecord> {
        let citing: Vec<ExternalRecord> = self
            .references
            .iter()
            .filter(|(_, refs)| refs.iter().any(|r| r == id))
            .filter_map(|(citing_id, _)| self.papers.get(citing_id))
            .take(limit)
            .cloned()
            .collect();
        citing
    }

    async fn batch_references(&self, ids: &[String]) -> HashMap<String, Vec<String>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);

        ids.iter()
            .filter_map(|id| {
                self.references
                    .get(id)
                    .map(|refs| (id.clone(), refs.clone()))
            })
            .collect()
    }
}
