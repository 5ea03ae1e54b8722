//! Citation-topology community detection
//!
//! Projects the directed citation graph to an undirected one and runs
//! label propagation: every node repeatedly adopts the most frequent label
//! among its neighbors (ties to the smallest label) until no label changes
//! or the round limit is hit. The cluster count is emergent, not requested.
//! Node visiting order is shuffled with a seeded generator, so runs are
//! reproducible.

use citegraph_common::model::ResearchGraph;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};

/// Run label propagation; returns one label per node, aligned to node
/// order and compressed to dense ids in first-appearance order.
pub fn label_propagation(graph: &ResearchGraph, max_rounds: usize, seed: u64) -> Vec<usize> {
    let n = graph.nodes.len();
    if n == 0 {
        return Vec::new();
    }

    let index: HashMap<uuid::Uuid, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id, i))
        .collect();

    // Undirected projection, deduplicated
    let mut neighbor_sets: Vec<HashSet<usize>> = vec![HashSet::new(); n];
    for edge in &graph.edges {
        if let (Some(&from), Some(&to)) = (index.get(&edge.from_paper), index.get(&edge.to_paper))
        {
            if from != to {
                neighbor_sets[from].insert(to);
                neighbor_sets[to].insert(from);
            }
        }
    }
    let adjacency: Vec<Vec<usize>> = neighbor_sets
        .into_iter()
        .map(|set| {
            let mut neighbors: Vec<usize> = set.into_iter().collect();
            neighbors.sort_unstable();
            neighbors
        })
        .collect();

    let mut labels: Vec<usize> = (0..n).collect();
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);

    for _ in 0..max_rounds {
        order.shuffle(&mut rng);
        let mut changed = false;

        for &node in &order {
            if adjacency[node].is_empty() {
                continue;
            }
            let mut counts: HashMap<usize, usize> = HashMap::new();
            for &neighbor in &adjacency[node] {
                *counts.entry(labels[neighbor]).or_insert(0) += 1;
            }
            // Most frequent label; ties resolve to the smallest label
            let best = counts
                .into_iter()
                .map(|(label, count)| (count, std::cmp::Reverse(label)))
                .max()
                .map(|(_, std::cmp::Reverse(label))| label)
                .unwrap();

            if labels[node] != best {
                labels[node] = best;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    compress(&labels)
}

/// Map arbitrary labels onto 0..k in first-appearance node order.
fn compress(labels: &[usize]) -> Vec<usize> {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    labels
        .iter()
        .map(|label| {
            let next = mapping.len();
            *mapping.entry(*label).or_insert(next)
        })
        .collect()
}
