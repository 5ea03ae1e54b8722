//! Per-cluster summaries
//!
//! Size, top terms by mean TF-IDF weight among members, sample titles in
//! node order, and the mean publication year. Topology-only runs have no
//! term vectors, so their summaries carry no terms.

use super::tfidf::TfidfMatrix;
use citegraph_common::model::ResearchGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Terms reported per cluster
pub const TOP_TERMS: usize = 10;

/// Sample titles reported per cluster
pub const SAMPLE_TITLES: usize = 5;

/// Summary of a single cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster_id: usize,

    pub size: usize,

    /// Empty for topology-only clustering
    pub top_terms: Vec<String>,

    /// Up to five member titles, in node order
    pub sample_titles: Vec<String>,

    /// Mean publication year; unknown years count as 0, which biases mixed
    /// clusters toward zero
    pub mean_year: f64,
}

/// Summarize every cluster of an assigned graph.
pub fn summarize(graph: &ResearchGraph, matrix: Option<&TfidfMatrix>) -> Vec<ClusterSummary> {
    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, node) in graph.nodes.iter().enumerate() {
        members
            .entry(node.cluster_id.unwrap_or(0))
            .or_default()
            .push(index);
    }

    members
        .into_iter()
        .map(|(cluster_id, indices)| {
            let top_terms = matrix
                .map(|m| top_terms_for(m, &indices))
                .unwrap_or_default();
            let sample_titles = indices
                .iter()
                .take(SAMPLE_TITLES)
                .map(|&i| graph.nodes[i].title.clone())
                .collect();
            let mean_year = indices
                .iter()
                .map(|&i| graph.nodes[i].year.unwrap_or(0) as f64)
                .sum::<f64>()
                / indices.len() as f64;

            ClusterSummary {
                cluster_id,
                size: indices.len(),
                top_terms,
                sample_titles,
                mean_year,
            }
        })
        .collect()
}

fn top_terms_for(matrix: &TfidfMatrix, indices: &[usize]) -> Vec<String> {
    if matrix.vocabulary.is_empty() || indices.is_empty() {
        return Vec::new();
    }

    let mut mean = vec![0.0f64; matrix.vocabulary.len()];
    for &i in indices {
        for (j, weight) in matrix.vectors[i].iter().enumerate() {
            mean[j] += weight;
        }
    }
    for value in &mut mean {
        *value /= indices.len() as f64;
    }

    let mut ranked: Vec<(usize, f64)> = mean
        .into_iter()
        .enumerate()
        .filter(|(_, weight)| *weight > 0.0)
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(TOP_TERMS);
    ranked
        .into_iter()
        .map(|(i, _)| matrix.vocabulary[i].clone())
        .collect()
}
