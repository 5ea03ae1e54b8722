//! Similarity matrices and their weighted fusion
//!
//! Content similarity is cosine over TF-IDF vectors; topology similarity is
//! pairwise Jaccard over each node's combined in/out neighbor sets. The
//! hybrid matrix is `content_weight * content + citation_weight * topology`
//! (weights are caller-supplied and need not sum to 1), converted to a
//! distance matrix for hierarchical clustering.

use super::tfidf::TfidfMatrix;
use citegraph_common::model::ResearchGraph;
use std::collections::{HashMap, HashSet};

/// Pairwise cosine similarity. Rows are already L2-normalized, so this is
/// a plain dot product; zero vectors have similarity 0 with everything.
pub fn cosine_matrix(matrix: &TfidfMatrix) -> Vec<Vec<f64>> {
    let n = matrix.len();
    let mut similarity = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let dot: f64 = matrix.vectors[i]
                .iter()
                .zip(&matrix.vectors[j])
                .map(|(a, b)| a * b)
                .sum();
            similarity[i][j] = dot;
            similarity[j][i] = dot;
        }
    }
    similarity
}

/// Pairwise Jaccard similarity of combined in/out neighbor sets, aligned to
/// node order. Self-similarity is 1.
pub fn jaccard_matrix(graph: &ResearchGraph) -> Vec<Vec<f64>> {
    let n = graph.nodes.len();
    let index: HashMap<uuid::Uuid, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id, i))
        .collect();

    let mut neighbors: Vec<HashSet<usize>> = vec![HashSet::new(); n];
    for edge in &graph.edges {
        if let (Some(&from), Some(&to)) = (index.get(&edge.from_paper), index.get(&edge.to_paper))
        {
            neighbors[from].insert(to);
            neighbors[to].insert(from);
        }
    }

    let mut similarity = vec![vec![0.0; n]; n];
    for i in 0..n {
        similarity[i][i] = 1.0;
        for j in (i + 1)..n {
            let intersection = neighbors[i].intersection(&neighbors[j]).count();
            let union = neighbors[i].union(&neighbors[j]).count();
            let jaccard = if union == 0 {
                0.0
            } else {
                intersection as f64 / union as f64
            };
            similarity[i][j] = jaccard;
            similarity[j][i] = jaccard;
        }
    }
    similarity
}

/// Weighted fusion of two equally sized similarity matrices.
pub fn combine(
    content: &[Vec<f64>],
    topology: &[Vec<f64>],
    content_weight: f64,
    citation_weight: f64,
) -> Vec<Vec<f64>> {
    content
        .iter()
        .zip(topology)
        .map(|(content_row, topology_row)| {
            content_row
                .iter()
                .zip(topology_row)
                .map(|(c, t)| content_weight * c + citation_weight * t)
                .collect()
        })
        .collect()
}

/// Convert similarity to distance (`1 - s`, floored at 0 for weight sums
/// above 1).
pub fn to_distance(similarity: &[Vec<f64>]) -> Vec<Vec<f64>> {
    similarity
        .iter()
        .map(|row| row.iter().map(|s| (1.0 - s).max(0.0)).collect())
        .collect()
}
