//! Network build orchestration
//!
//! Five phases: resolve, expand, select, cross-link, assemble. Independent
//! per-paper calls run across a bounded worker pool; the adapter's shared
//! rate limiter keeps the aggregate request rate in check. Any single
//! failure removes that paper or edge from consideration — a build always
//! completes with whatever subset succeeded, including after cancellation.

use super::{CitationNetwork, ExternalEdge, NetworkOptions, QueryPaper};
use citegraph_common::source::{ExternalRecord, SourceAdapter};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Orchestrates source lookups into a [`CitationNetwork`].
pub struct CitationNetworkBuilder {
    adapter: Arc<dyn SourceAdapter>,
    options: NetworkOptions,
}

/// A discovered candidate for the reviewed set.
struct Candidate {
    record: ExternalRecord,
    frequency: u32,
    first_seen: usize,
}

impl CitationNetworkBuilder {
    pub fn new(adapter: Arc<dyn SourceAdapter>, options: NetworkOptions) -> Self {
        Self { adapter, options }
    }

    /// Build the network for an ordered list of query papers.
    ///
    /// Cancellation is cooperative at the granularity of a single external
    /// call: papers and edges discovered before the token fired are
    /// retained and returned.
    pub async fn build(
        &self,
        queries: &[QueryPaper],
        cancel: CancellationToken,
    ) -> CitationNetwork {
        // Phase 1: resolve inputs (id first, then title search)
        let inputs = self.resolve_queries(queries, &cancel).await;
        if inputs.is_empty() {
            tracing::warn!("No query papers could be resolved");
            return CitationNetwork::default();
        }

        // Phase 2: expand references per input
        let reference_lists = self.expand_references(&inputs, &cancel).await;

        // Phase 3: select the reviewed set by frequency and citation count
        let input_set: HashSet<&str> = inputs.iter().map(|r| r.id.as_str()).collect();
        let reviewed = select_reviewed(&reference_lists, &input_set, self.options.max_reviewed);

        // Phase 4: cross-link the reviewed set itself
        let reviewed_ids: Vec<String> = reviewed.iter().map(|c| c.record.id.clone()).collect();
        let reviewed_refs = if cancel.is_cancelled() || reviewed_ids.is_empty() {
            HashMap::new()
        } else {
            self.adapter.batch_references(&reviewed_ids).await
        };

        // Phase 5: assemble the deduplicated edge list
        let reviewed_set: HashSet<&str> = reviewed_ids.iter().map(|s| s.as_str()).collect();
        let mut edges = Vec::new();
        let mut seen_pairs: HashSet<(String, String)> = HashSet::new();

        for (input, references) in inputs.iter().zip(&reference_lists) {
            for reference in references {
                if !reviewed_set.contains(reference.id.as_str()) {
                    continue;
                }
                if reference.id == input.id {
                    continue;
                }
                if seen_pairs.insert((input.id.clone(), reference.id.clone())) {
                    edges.push(ExternalEdge::new(&input.id, &reference.id));
                }
            }
        }

        for (from, targets) in &reviewed_refs {
            if !reviewed_set.contains(from.as_str()) {
                continue;
            }
            for to in targets {
                if !reviewed_set.contains(to.as_str()) || to == from {
                    continue;
                }
                if seen_pairs.insert((from.clone(), to.clone())) {
                    edges.push(ExternalEdge::new(from, to));
                }
            }
        }

        let mut papers = HashMap::with_capacity(inputs.len() + reviewed.len());
        let input_ids: Vec<String> = inputs.iter().map(|r| r.id.clone()).collect();
        for record in inputs {
            papers.insert(record.id.clone(), record);
        }
        let mut frequencies = HashMap::with_capacity(reviewed.len());
        for candidate in reviewed {
            frequencies.insert(candidate.record.id.clone(), candidate.frequency);
            papers.insert(candidate.record.id.clone(), candidate.record);
        }

        tracing::info!(
            inputs = input_ids.len(),
            reviewed = reviewed_ids.len(),
            edges = edges.len(),
            cancelled = cancel.is_cancelled(),
            "Citation network built"
        );

        CitationNetwork {
            papers,
            input_ids,
            reviewed_ids,
            edges,
            frequencies,
        }
    }

    /// Resolve all queries concurrently, preserving caller order and
    /// dropping (with a warning) anything the source does not know.
    async fn resolve_queries(
        &self,
        queries: &[QueryPaper],
        cancel: &CancellationToken,
    ) -> Vec<ExternalRecord> {
        let query_items: Vec<(usize, String, Option<String>)> = queries
            .iter()
            .enumerate()
            .map(|(index, query)| (index, query.title.clone(), query.external_id.clone()))
            .collect();
        let mut indexed: Vec<(usize, ExternalRecord)> = stream::iter(query_items)
            .map(|(index, title, external_id)| {
                let adapter = Arc::clone(&self.adapter);
                let cancel = cancel.clone();
                async move {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    match adapter
                        .resolve(&title, external_id.as_deref())
                        .await
                    {
                        Some(record) => Some((index, record)),
                        None => {
                            tracing::warn!(
                                title = %title,
                                "Query paper unresolved, dropping from build"
                            );
                            None
                        }
                    }
                }
            })
            .buffer_unordered(self.options.concurrency)
            .filter_map(futures::future::ready)
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);

        // Two queries may resolve to the same record; keep the first
        let mut seen = HashSet::new();
        indexed
            .into_iter()
            .filter(|(_, record)| seen.insert(record.id.clone()))
            .map(|(_, record)| record)
            .collect()
    }

    /// Fetch one reference page per resolved input, aligned to input order.
    async fn expand_references(
        &self,
        inputs: &[ExternalRecord],
        cancel: &CancellationToken,
    ) -> Vec<Vec<ExternalRecord>> {
        let input_items: Vec<(usize, String)> = inputs
            .iter()
            .enumerate()
            .map(|(index, record)| (index, record.id.clone()))
            .collect();
        let mut indexed: Vec<(usize, Vec<ExternalRecord>)> =
            stream::iter(input_items)
                .map(|(index, id)| {
                    let adapter = Arc::clone(&self.adapter);
                    let cancel = cancel.clone();
                    let page_size = self.options.page_size;
                    async move {
                        if cancel.is_cancelled() {
                            return (index, Vec::new());
                        }
                        (index, adapter.references(&id, page_size).await)
                    }
                })
                .buffer_unordered(self.options.concurrency)
                .collect()
                .await;

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, refs)| refs).collect()
    }
}

/// Rank candidates: citation count descending, ties broken by first-seen
/// order across the inputs' reference lists; take the top K.
fn select_reviewed(
    reference_lists: &[Vec<ExternalRecord>],
    input_set: &HashSet<&str>,
    max_reviewed: usize,
) -> Vec<Candidate> {
    let mut by_id: HashMap<String, usize> = HashMap::new();
    let mut candidates: Vec<Candidate> = Vec::new();

    for references in reference_lists {
        for record in references {
            if input_set.contains(record.id.as_str()) {
                continue;
            }
            match by_id.get(&record.id).copied() {
                Some(slot) => candidates[slot].frequency += 1,
                None => {
                    by_id.insert(record.id.clone(), candidates.len());
                    candidates.push(Candidate {
                        record: record.clone(),
                        frequency: 1,
                        first_seen: candidates.len(),
                    });
                }
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.record
            .citation_count
            .cmp(&a.record.citation_count)
            .then(a.first_seen.cmp(&b.first_seen))
    });
    candidates.truncate(max_reviewed);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use citegraph_common::source::mock::{record, MockSourceAdapter};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn builder(adapter: MockSourceAdapter, max_reviewed: usize) -> CitationNetworkBuilder {
        CitationNetworkBuilder::new(
            Arc::new(adapter),
            NetworkOptions::default().with_max_reviewed(max_reviewed),
        )
    }

    fn edge_set(network: &CitationNetwork) -> HashSet<(String, String)> {
        network
            .edges
            .iter()
            .map(|e| (e.from.clone(), e.to.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        // P1 cites P2 and P3; P2 cites P3
        let adapter = MockSourceAdapter::new()
            .with_paper(record("p1", "Paper One", 10))
            .with_paper(record("p2", "Paper Two", 8))
            .with_paper(record("p3", "Paper Three", 6))
            .with_references("p1", &["p2", "p3"])
            .with_references("p2", &["p3"]);

        let network = builder(adapter, 10)
            .build(&[QueryPaper::new("Paper One")], CancellationToken::new())
            .await;

        assert_eq!(network.input_ids, vec!["p1".to_string()]);
        assert_eq!(network.reviewed_ids.len(), 2);
        assert!(network.reviewed_ids.contains(&"p2".to_string()));
        assert!(network.reviewed_ids.contains(&"p3".to_string()));

        let edges = edge_set(&network);
        assert_eq!(edges.len(), 3);
        assert!(edges.contains(&("p1".to_string(), "p2".to_string())));
        assert!(edges.contains(&("p1".to_string(), "p3".to_string())));
        assert!(edges.contains(&("p2".to_string(), "p3".to_string())));
    }

    #[tokio::test]
    async fn test_reviewed_ranked_by_citation_count_then_first_seen() {
        // a (5 citations) seen first, then b and c tied at 10
        let adapter = MockSourceAdapter::new()
            .with_paper(record("in", "Input", 0))
            .with_paper(record("a", "Alpha", 5))
            .with_paper(record("b", "Beta", 10))
            .with_paper(record("c", "Gamma", 10))
            .with_references("in", &["a", "b", "c"]);

        let network = builder(adapter, 2)
            .build(&[QueryPaper::new("Input")], CancellationToken::new())
            .await;

        assert_eq!(
            network.reviewed_ids,
            vec!["b".to_string(), "c".to_string()]
        );
    }

    #[tokio::test]
    async fn test_input_papers_excluded_from_reviewed_set() {
        let adapter = MockSourceAdapter::new()
            .with_paper(record("p1", "One", 0))
            .with_paper(record("p2", "Two", 0))
            .with_paper(record("x", "Discovered", 3))
            .with_references("p1", &["p2", "x"])
            .with_references("p2", &["x"]);

        let network = builder(adapter, 10)
            .build(
                &[QueryPaper::new("One"), QueryPaper::new("Two")],
                CancellationToken::new(),
            )
            .await;

        assert_eq!(network.reviewed_ids, vec!["x".to_string()]);
        // x appeared in both inputs' reference lists
        assert_eq!(network.frequencies["x"], 2);
    }

    #[tokio::test]
    async fn test_unresolved_query_dropped_not_fatal() {
        let adapter = MockSourceAdapter::new()
            .with_paper(record("p1", "Known", 0))
            .with_references("p1", &[]);

        let network = builder(adapter, 10)
            .build(
                &[QueryPaper::new("Known"), QueryPaper::new("Unknown Paper")],
                CancellationToken::new(),
            )
            .await;

        assert_eq!(network.input_ids, vec!["p1".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_references_deduplicated() {
        let adapter = MockSourceAdapter::new()
            .with_paper(record("p1", "One", 0))
            .with_paper(record("p2", "Two", 1))
            .with_references("p1", &["p2", "p2"]);

        let network = builder(adapter, 10)
            .build(&[QueryPaper::new("One")], CancellationToken::new())
            .await;

        assert_eq!(network.edges.len(), 1);
        assert_eq!(network.frequencies["p2"], 2);
    }

    #[tokio::test]
    async fn test_reviewed_self_edges_dropped() {
        let adapter = MockSourceAdapter::new()
            .with_paper(record("p1", "One", 0))
            .with_paper(record("p2", "Two", 1))
            .with_references("p1", &["p2"])
            .with_references("p2", &["p2"]);

        let network = builder(adapter, 10)
            .build(&[QueryPaper::new("One")], CancellationToken::new())
            .await;

        let edges = edge_set(&network);
        assert_eq!(edges.len(), 1);
        assert!(edges.contains(&("p1".to_string(), "p2".to_string())));
    }

    /// Adapter that fires the cancellation token during reference
    /// expansion, simulating a caller abort mid-build.
    struct CancellingAdapter {
        inner: MockSourceAdapter,
        token: CancellationToken,
        fired: AtomicBool,
    }

    #[async_trait::async_trait]
    impl SourceAdapter for CancellingAdapter {
        async fn resolve(
            &self,
            title: &str,
            external_id: Option<&str>,
        ) -> Option<ExternalRecord> {
            self.inner.resolve(title, external_id).await
        }

        async fn references(&self, id: &str, limit: usize) -> Vec<ExternalRecord> {
            let refs = self.inner.references(id, limit).await;
            if !self.fired.swap(true, Ordering::SeqCst) {
                self.token.cancel();
            }
            refs
        }

        async fn citations(&self, id: &str, limit: usize) -> Vec<ExternalRecord> {
            self.inner.citations(id, limit).await
        }

        async fn batch_references(&self, ids: &[String]) -> HashMap<String, Vec<String>> {
            self.inner.batch_references(ids).await
        }
    }

    #[tokio::test]
    async fn test_cancellation_retains_partial_progress() {
        let token = CancellationToken::new();
        let inner = MockSourceAdapter::new()
            .with_paper(record("p1", "One", 0))
            .with_paper(record("p2", "Two", 5))
            .with_paper(record("p3", "Three", 4))
            .with_references("p1", &["p2", "p3"])
            .with_references("p2", &["p3"]);

        let adapter = CancellingAdapter {
            inner,
            token: token.clone(),
            fired: AtomicBool::new(false),
        };
        let builder = CitationNetworkBuilder::new(
            Arc::new(adapter),
            // Single worker so the cancel lands before any further call
            NetworkOptions {
                concurrency: 1,
                ..NetworkOptions::default()
            },
        );

        let network = builder
            .build(&[QueryPaper::new("One")], token.clone())
            .await;

        // Progress made before cancellation is retained
        assert_eq!(network.input_ids, vec!["p1".to_string()]);
        assert!(!network.is_empty());
        let edges = edge_set(&network);
        assert!(edges.contains(&("p1".to_string(), "p2".to_string())));
        // The cross-link phase was skipped, so no reviewed-to-reviewed edge
        assert!(!edges.contains(&("p2".to_string(), "p3".to_string())));
    }

    #[tokio::test]
    async fn test_no_resolvable_inputs_yields_empty_network() {
        let adapter = MockSourceAdapter::new();
        let network = builder(adapter, 10)
            .build(&[QueryPaper::new("Nothing")], CancellationToken::new())
            .await;

        assert!(network.is_empty());
        assert!(network.edges.is_empty());
    }
}
