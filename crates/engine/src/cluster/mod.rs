//! Multi-modal clustering
//!
//! Three methods over an assembled graph:
//! - `content`: TF-IDF over `title + abstract`, agglomerative clustering on
//!   cosine distance
//! - `citations`: label propagation over the undirected citation topology
//!   (cluster count emergent)
//! - `hybrid`: weighted fusion of content and topology similarity, then
//!   agglomerative clustering on the combined distance
//!
//! Every run overwrites each node's `cluster_id` and replaces the graph's
//! clustering metadata; there is no history of prior assignments.

mod hierarchical;
mod similarity;
mod summary;
mod tfidf;
mod topology;

pub use summary::{ClusterSummary, SAMPLE_TITLES, TOP_TERMS};
pub use tfidf::{TfidfMatrix, TfidfVectorizer};

use citegraph_common::metrics::record_clustering;
use citegraph_common::model::ResearchGraph;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Instant;

/// Round limit for label propagation
const MAX_PROPAGATION_ROUNDS: usize = 100;

/// Seed for the label-propagation visiting order
const PROPAGATION_SEED: u64 = 42;

/// Requested clustering method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMethod {
    Content,
    Citations,
    Hybrid,
}

impl ClusterMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterMethod::Content => "content",
            ClusterMethod::Citations => "citations",
            ClusterMethod::Hybrid => "hybrid",
        }
    }
}

/// A clustering request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRequest {
    pub method: ClusterMethod,

    #[serde(default = "default_n_clusters")]
    pub n_clusters: usize,

    #[serde(default = "default_content_weight")]
    pub content_weight: f64,

    #[serde(default = "default_citation_weight")]
    pub citation_weight: f64,
}

fn default_n_clusters() -> usize { 5 }
fn default_content_weight() -> f64 { 0.7 }
fn default_citation_weight() -> f64 { 0.3 }

impl Default for ClusterRequest {
    fn default() -> Self {
        Self {
            method: ClusterMethod::Content,
            n_clusters: default_n_clusters(),
            content_weight: default_content_weight(),
            citation_weight: default_citation_weight(),
        }
    }
}

/// Outcome of a clustering run.
#[derive(Debug, Clone, Serialize)]
pub struct ClusteringReport {
    pub method: String,
    pub n_clusters: usize,
    pub cluster_sizes: BTreeMap<usize, usize>,
    pub summaries: Vec<ClusterSummary>,
}

/// Stateless clustering engine; all state lives on the graph it mutates.
#[derive(Debug, Default)]
pub struct ClusteringEngine;

impl ClusteringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run the requested clustering, overwriting prior assignments.
    pub fn cluster(&self, graph: &mut ResearchGraph, request: &ClusterRequest) -> ClusteringReport {
        let started = Instant::now();
        let report = match request.method {
            ClusterMethod::Content => self.cluster_by_content(graph, request.n_clusters),
            ClusterMethod::Citations => self.cluster_by_citations(graph),
            ClusterMethod::Hybrid => self.cluster_hybrid(
                graph,
                request.n_clusters,
                request.content_weight,
                request.citation_weight,
            ),
        };

        record_clustering(
            started.elapsed().as_secs_f64(),
            &report.method,
            report.n_clusters,
        );
        tracing::info!(
            graph_id = %graph.id,
            method = %report.method,
            n_clusters = report.n_clusters,
            "Clustering complete"
        );
        report
    }

    fn cluster_by_content(&self, graph: &mut ResearchGraph, n_clusters: usize) -> ClusteringReport {
        let documents = node_documents(graph);
        let matrix = TfidfVectorizer::default().fit_transform(&documents);
        let content = similarity::cosine_matrix(&matrix);
        let distance = similarity::to_distance(&content);

        let k = effective_k(graph.nodes.len(), n_clusters);
        let labels = hierarchical::agglomerative(&distance, k);
        apply_labels(graph, &labels);

        let sizes = count_sizes(&labels);
        graph.metadata.insert(
            "clusters".to_string(),
            json!({
                "method": "content",
                "n_clusters": k,
                "cluster_sizes": &sizes,
            }),
        );

        ClusteringReport {
            method: "content".to_string(),
            n_clusters: sizes.len(),
            summaries: summary::summarize(graph, Some(&matrix)),
            cluster_sizes: sizes,
        }
    }

    fn cluster_by_citations(&self, graph: &mut ResearchGraph) -> ClusteringReport {
        let labels = topology::label_propagation(graph, MAX_PROPAGATION_ROUNDS, PROPAGATION_SEED);
        apply_labels(graph, &labels);

        let sizes = count_sizes(&labels);
        graph.metadata.insert(
            "clusters".to_string(),
            json!({
                "method": "citations",
                "algorithm": "label_propagation",
                "n_clusters": sizes.len(),
                "cluster_sizes": &sizes,
            }),
        );

        ClusteringReport {
            method: "citations".to_string(),
            n_clusters: sizes.len(),
            // No term vectors exist for a topology-only run
            summaries: summary::summarize(graph, None),
            cluster_sizes: sizes,
        }
    }

    fn cluster_hybrid(
        &self,
        graph: &mut ResearchGraph,
        n_clusters: usize,
        content_weight: f64,
        citation_weight: f64,
    ) -> ClusteringReport {
        let documents = node_documents(graph);
        let matrix = TfidfVectorizer::default().fit_transform(&documents);
        let content = similarity::cosine_matrix(&matrix);
        let topology = similarity::jaccard_matrix(graph);
        let combined = similarity::combine(&content, &topology, content_weight, citation_weight);
        let distance = similarity::to_distance(&combined);

        let k = effective_k(graph.nodes.len(), n_clusters);
        let labels = hierarchical::agglomerative(&distance, k);
        apply_labels(graph, &labels);

        let sizes = count_sizes(&labels);
        graph.metadata.insert(
            "clusters".to_string(),
            json!({
                "method": "hybrid",
                "n_clusters": k,
                "content_weight": content_weight,
                "citation_weight": citation_weight,
                "cluster_sizes": &sizes,
            }),
        );

        ClusteringReport {
            method: "hybrid".to_string(),
            n_clusters: sizes.len(),
            summaries: summary::summarize(graph, Some(&matrix)),
            cluster_sizes: sizes,
        }
    }
}

/// `title + abstract` per node, aligned to node order.
fn node_documents(graph: &ResearchGraph) -> Vec<String> {
    graph
        .nodes
        .iter()
        .map(|node| format!("{} {}", node.title, node.abstract_text))
        .collect()
}

/// Reduce K for small graphs: fewer nodes than clusters requested means
/// K becomes `max(2, N / 2)`, and never more than N.
fn effective_k(n: usize, requested: usize) -> usize {
    if n == 0 {
        return 1;
    }
    let k = if n < requested {
        (n / 2).max(2)
    } else {
        requested.max(1)
    };
    k.min(n)
}

fn apply_labels(graph: &mut ResearchGraph, labels: &[usize]) {
    for (node, &label) in graph.nodes.iter_mut().zip(labels) {
        node.set_cluster(label);
    }
    graph.touch();
}

fn count_sizes(labels: &[usize]) -> BTreeMap<usize, usize> {
    let mut sizes = BTreeMap::new();
    for &label in labels {
        *sizes.entry(label).or_insert(0usize) += 1;
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use citegraph_common::model::{CitationEdge, PaperNode};

    fn paper(title: &str, abstract_text: &str, year: Option<i32>) -> PaperNode {
        let mut node = PaperNode::new(title);
        node.abstract_text = abstract_text.to_string();
        node.year = year;
        node
    }

    /// Six papers in two topical groups, with citations inside each group.
    fn two_topic_graph() -> ResearchGraph {
        let mut graph = ResearchGraph::new("topics");
        let papers = [
            ("Graph neural networks", "message passing on graph structures"),
            ("Graph attention", "attention weights over graph neighborhoods"),
            ("Graph transformers", "transformer layers for graph learning"),
            ("Protein folding", "predicting protein tertiary structure"),
            ("Protein design", "generative models for protein sequences"),
            ("Protein docking", "molecular docking of protein complexes"),
        ];
        let ids: Vec<_> = papers
            .iter()
            .map(|(title, text)| {
                let node = paper(title, text, Some(2021));
                let id = node.id;
                graph.add_node(node);
                id
            })
            .collect();
        for (from, to) in [(0, 1), (1, 2), (3, 4), (4, 5)] {
            graph.add_edge(CitationEdge::new(ids[from], ids[to]));
        }
        graph
    }

    #[test]
    fn test_k_reduced_when_fewer_nodes_than_clusters() {
        let mut graph = ResearchGraph::new("small");
        graph.add_node(paper("One", "alpha topic", None));
        graph.add_node(paper("Two", "beta topic", None));
        graph.add_node(paper("Three", "gamma topic", None));

        let report = ClusteringEngine::new().cluster(
            &mut graph,
            &ClusterRequest {
                method: ClusterMethod::Content,
                n_clusters: 5,
                ..ClusterRequest::default()
            },
        );

        // 3 nodes, K=5 requested: actual cluster count is 2
        assert_eq!(report.n_clusters, 2);
        let distinct: std::collections::HashSet<_> =
            graph.nodes.iter().filter_map(|n| n.cluster_id).collect();
        assert_eq!(distinct.len(), 2);
    }

    #[test]
    fn test_every_node_assigned_and_sizes_sum() {
        let mut graph = two_topic_graph();
        let report = ClusteringEngine::new().cluster(
            &mut graph,
            &ClusterRequest {
                method: ClusterMethod::Content,
                n_clusters: 2,
                ..ClusterRequest::default()
            },
        );

        assert!(graph.nodes.iter().all(|n| n.cluster_id.is_some()));
        assert_eq!(report.cluster_sizes.values().sum::<usize>(), 6);
        assert!(graph
            .nodes
            .iter()
            .all(|n| n.attributes.contains_key("cluster_id")));
    }

    #[test]
    fn test_content_clustering_separates_topics() {
        let mut graph = two_topic_graph();
        ClusteringEngine::new().cluster(
            &mut graph,
            &ClusterRequest {
                method: ClusterMethod::Content,
                n_clusters: 2,
                ..ClusterRequest::default()
            },
        );

        let labels: Vec<_> = graph.nodes.iter().map(|n| n.cluster_id.unwrap()).collect();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_hybrid_with_pure_content_weights_matches_content() {
        let mut content_graph = two_topic_graph();
        let mut hybrid_graph = content_graph.clone();

        let engine = ClusteringEngine::new();
        engine.cluster(
            &mut content_graph,
            &ClusterRequest {
                method: ClusterMethod::Content,
                n_clusters: 2,
                ..ClusterRequest::default()
            },
        );
        engine.cluster(
            &mut hybrid_graph,
            &ClusterRequest {
                method: ClusterMethod::Hybrid,
                n_clusters: 2,
                content_weight: 1.0,
                citation_weight: 0.0,
            },
        );

        let content_labels: Vec<_> = content_graph
            .nodes
            .iter()
            .map(|n| n.cluster_id.unwrap())
            .collect();
        let hybrid_labels: Vec<_> = hybrid_graph
            .nodes
            .iter()
            .map(|n| n.cluster_id.unwrap())
            .collect();
        assert_eq!(content_labels, hybrid_labels);
    }

    #[test]
    fn test_citations_method_has_emergent_count_and_no_terms() {
        let mut graph = two_topic_graph();
        let report = ClusteringEngine::new().cluster(
            &mut graph,
            &ClusterRequest {
                method: ClusterMethod::Citations,
                // Ignored by topology clustering
                n_clusters: 17,
                ..ClusterRequest::default()
            },
        );

        assert_eq!(report.n_clusters, 2);
        assert!(report.summaries.iter().all(|s| s.top_terms.is_empty()));
    }

    #[test]
    fn test_rerun_replaces_assignments_and_metadata() {
        let mut graph = two_topic_graph();
        let engine = ClusteringEngine::new();

        engine.cluster(
            &mut graph,
            &ClusterRequest {
                method: ClusterMethod::Content,
                n_clusters: 2,
                ..ClusterRequest::default()
            },
        );
        assert_eq!(graph.metadata["clusters"]["method"], "content");

        engine.cluster(
            &mut graph,
            &ClusterRequest {
                method: ClusterMethod::Citations,
                ..ClusterRequest::default()
            },
        );
        assert_eq!(graph.metadata["clusters"]["method"], "citations");
        assert_eq!(graph.metadata["clusters"]["algorithm"], "label_propagation");
    }

    #[test]
    fn test_hybrid_metadata_carries_weights() {
        let mut graph = two_topic_graph();
        ClusteringEngine::new().cluster(
            &mut graph,
            &ClusterRequest {
                method: ClusterMethod::Hybrid,
                n_clusters: 2,
                content_weight: 0.6,
                citation_weight: 0.4,
            },
        );

        assert_eq!(graph.metadata["clusters"]["content_weight"], 0.6);
        assert_eq!(graph.metadata["clusters"]["citation_weight"], 0.4);
    }

    #[test]
    fn test_empty_graph_does_not_panic() {
        let mut graph = ResearchGraph::new("empty");
        let report = ClusteringEngine::new()
            .cluster(&mut graph, &ClusterRequest::default());
        assert_eq!(report.n_clusters, 0);
        assert!(report.summaries.is_empty());
    }

    #[test]
    fn test_effective_k_reduction() {
        assert_eq!(effective_k(3, 5), 2);
        assert_eq!(effective_k(10, 5), 5);
        assert_eq!(effective_k(1, 5), 1);
        assert_eq!(effective_k(2, 5), 2);
        assert_eq!(effective_k(0, 5), 1);
        assert_eq!(effective_k(8, 8), 8);
    }

    #[test]
    fn test_cluster_request_defaults_from_wire() {
        let request: ClusterRequest =
            serde_json::from_value(serde_json::json!({"method": "hybrid"})).unwrap();
        assert_eq!(request.method, ClusterMethod::Hybrid);
        assert_eq!(request.n_clusters, 5);
        assert_eq!(request.content_weight, 0.7);
        assert_eq!(request.citation_weight, 0.3);
    }
}
