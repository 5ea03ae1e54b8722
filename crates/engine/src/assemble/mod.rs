//! Graph assembly
//!
//! Consumes a [`CitationNetwork`] plus the caller-supplied paper records,
//! reconciles identities, and materializes the internal graph. Node order
//! is load-bearing: input papers first in caller order, then reviewed
//! papers in selection-rank order — the clustering engine aligns its
//! similarity-matrix indices to this order.

mod matcher;

pub use matcher::{DefaultMatcher, MatchDecision, RecordMatcher};

use crate::network::CitationNetwork;
use citegraph_common::model::{AttrValue, CitationEdge, PaperNode, PaperRecord, ResearchGraph};
use citegraph_common::source::ExternalRecord;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Materializes a [`ResearchGraph`] from network output and caller records.
pub struct GraphAssembler {
    matcher: Box<dyn RecordMatcher>,
}

impl Default for GraphAssembler {
    fn default() -> Self {
        Self::new(Box::new(DefaultMatcher))
    }
}

impl GraphAssembler {
    pub fn new(matcher: Box<dyn RecordMatcher>) -> Self {
        Self { matcher }
    }

    /// Build the graph. Inconsistent edges (an endpoint outside the final
    /// node set) are dropped, not raised.
    pub fn assemble(
        &self,
        name: &str,
        records: &[PaperRecord],
        network: &CitationNetwork,
    ) -> ResearchGraph {
        let mut graph = ResearchGraph::new(name);
        // External-to-internal map; kept only for the duration of assembly
        let mut id_map: HashMap<String, Uuid> = HashMap::new();
        let mut consumed: HashSet<String> = HashSet::new();

        // Input papers, caller order
        for record in records {
            let candidates: Vec<&ExternalRecord> = network
                .input_ids
                .iter()
                .filter(|id| !consumed.contains(*id))
                .filter_map(|id| network.paper(id))
                .collect();

            let decision = self.matcher.match_record(record, &candidates);
            let mut node = node_from_record(record);
            node.attributes
                .insert("paper_source".to_string(), AttrValue::from("input"));

            match decision.and_then(|d| network.paper(&d.external_id).map(|e| (d, e))) {
                Some((decision, external)) => {
                    consumed.insert(decision.external_id.clone());
                    node.citation_count = external.citation_count;
                    node.venue = external.venue.clone().unwrap_or_default();
                    if node.year.is_none() {
                        node.year = external.year;
                    }
                    if node.abstract_text.is_empty() {
                        node.abstract_text =
                            external.abstract_text.clone().unwrap_or_default();
                    }
                    node.attributes.insert(
                        "source_id".to_string(),
                        AttrValue::from(decision.external_id.clone()),
                    );
                    node.attributes.insert(
                        "match_confidence".to_string(),
                        AttrValue::Num(decision.confidence as f64),
                    );
                    id_map.insert(decision.external_id, node.id);
                }
                None => {
                    tracing::debug!(
                        title = %record.title,
                        "Input record has no external match; keeping bare node"
                    );
                }
            }

            graph.add_node(node);
        }
        let input_count = graph.nodes.len();

        // Reviewed papers, selection-rank order
        for external_id in &network.reviewed_ids {
            let Some(external) = network.paper(external_id) else {
                continue;
            };
            let mut node = node_from_external(external);
            node.attributes
                .insert("paper_source".to_string(), AttrValue::from("reviewed"));
            node.attributes.insert(
                "source_id".to_string(),
                AttrValue::from(external_id.clone()),
            );
            if let Some(frequency) = network.frequencies.get(external_id) {
                node.attributes.insert(
                    "reference_frequency".to_string(),
                    AttrValue::Num(*frequency as f64),
                );
            }
            node.visual.opacity = 0.8;
            node.visual.border_width = 1.0;

            id_map.insert(external_id.clone(), node.id);
            graph.add_node(node);
        }
        let reviewed_count = graph.nodes.len() - input_count;

        // Edges, translated through the id map; skip anything pointing
        // outside the final node set
        let mut dropped = 0usize;
        let mut seen_pairs: HashSet<(Uuid, Uuid)> = HashSet::new();
        for edge in &network.edges {
            match (id_map.get(&edge.from), id_map.get(&edge.to)) {
                (Some(&from), Some(&to)) if from != to => {
                    if seen_pairs.insert((from, to)) {
                        graph.add_edge(CitationEdge::new(from, to));
                    }
                }
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            tracing::debug!(dropped, "Skipped edges with unmapped endpoints");
        }

        let years: Vec<i32> = graph.nodes.iter().filter_map(|n| n.year).collect();
        graph
            .metadata
            .insert("total_papers".to_string(), json!(graph.nodes.len()));
        graph
            .metadata
            .insert("input_papers".to_string(), json!(input_count));
        graph
            .metadata
            .insert("reviewed_papers".to_string(), json!(reviewed_count));
        graph
            .metadata
            .insert("total_citations".to_string(), json!(graph.edges.len()));
        graph.metadata.insert(
            "date_range".to_string(),
            json!({
                "start": years.iter().min(),
                "end": years.iter().max(),
            }),
        );
        graph
            .metadata
            .insert("source".to_string(), json!("Semantic Scholar"));

        tracing::info!(
            graph_id = %graph.id,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            dropped_edges = dropped,
            "Graph assembled"
        );

        graph
    }
}

fn node_from_record(record: &PaperRecord) -> PaperNode {
    let mut node = PaperNode::new(&record.title);
    node.authors = record.authors.clone();
    node.abstract_text = record.abstract_text.clone();
    node.full_text = record.full_text.clone();
    node.year = record.year;
    node
}

fn node_from_external(external: &ExternalRecord) -> PaperNode {
    let mut node = PaperNode::new(&external.title);
    node.authors = external.authors.clone();
    node.abstract_text = external.abstract_text.clone().unwrap_or_default();
    node.year = external.year;
    node.venue = external.venue.clone().unwrap_or_default();
    node.citation_count = external.citation_count;
    node
}
