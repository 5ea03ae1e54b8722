//! Shortest-path queries
//!
//! Breadth-first search over the directed edge list: one minimum-hop path
//! from source to target, or nothing. Exactly one path is ever returned.

use citegraph_common::model::ResearchGraph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

/// One hop along a found path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathEdge {
    pub from: Uuid,
    pub to: Uuid,
    pub category: String,
    pub context: String,
}

/// A single shortest path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathResult {
    /// Node ids from source to target, inclusive
    pub papers: Vec<Uuid>,
    pub edges: Vec<PathEdge>,
    /// Hop count (`papers.len() - 1`)
    pub length: usize,
}

/// Find one shortest path from `source` to `target`.
///
/// Returns `None` when either id is absent from the graph or no path
/// exists.
pub fn shortest_path(graph: &ResearchGraph, source: Uuid, target: Uuid) -> Option<PathResult> {
    if graph.node(source).is_none() || graph.node(target).is_none() {
        return None;
    }
    if source == target {
        return Some(PathResult {
            papers: vec![source],
            edges: Vec::new(),
            length: 0,
        });
    }

    // Unweighted directed adjacency in edge-insertion order
    let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for edge in &graph.edges {
        adjacency.entry(edge.from_paper).or_default().push(edge.to_paper);
    }

    let mut previous: HashMap<Uuid, Uuid> = HashMap::new();
    let mut visited: HashSet<Uuid> = HashSet::from([source]);
    let mut queue: VecDeque<Uuid> = VecDeque::from([source]);

    'search: while let Some(current) = queue.pop_front() {
        let Some(next_nodes) = adjacency.get(&current) else {
            continue;
        };
        for &next in next_nodes {
            if visited.insert(next) {
                previous.insert(next, current);
                if next == target {
                    break 'search;
                }
                queue.push_back(next);
            }
        }
    }

    if !previous.contains_key(&target) {
        return None;
    }

    let mut papers = vec![target];
    let mut current = target;
    while current != source {
        current = previous[&current];
        papers.push(current);
    }
    papers.reverse();

    let edges = papers
        .windows(2)
        .filter_map(|pair| {
            graph
                .edges
                .iter()
                .find(|e| e.from_paper == pair[0] && e.to_paper == pair[1])
                .map(|e| PathEdge {
                    from: pair[0],
                    to: pair[1],
                    category: e.category.clone(),
                    context: e.context.clone(),
                })
        })
        .collect();

    Some(PathResult {
        length: papers.len() - 1,
        papers,
        edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use citegraph_common::model::{CitationEdge, PaperNode};

    fn graph_with_edges(titles: &[&str], edges: &[(usize, usize)]) -> (ResearchGraph, Vec<Uuid>) {
        let mut graph = ResearchGraph::new("paths");
        let ids: Vec<Uuid> = titles
            .iter()
            .map(|t| {
                let node = PaperNode::new(*t);
                let id = node.id;
                graph.add_node(node);
                id
            })
            .collect();
        for &(from, to) in edges {
            graph.add_edge(CitationEdge::new(ids[from], ids[to]));
        }
        (graph, ids)
    }

    #[test]
    fn test_direct_edge_beats_longer_route() {
        // A -> B, B -> C, A -> C: the answer is [A, C], never [A, B, C]
        let (graph, ids) = graph_with_edges(&["A", "B", "C"], &[(0, 1), (1, 2), (0, 2)]);

        let result = shortest_path(&graph, ids[0], ids[2]).expect("path exists");
        assert_eq!(result.papers, vec![ids[0], ids[2]]);
        assert_eq!(result.length, 1);
        assert_eq!(result.edges.len(), 1);
    }

    #[test]
    fn test_multi_hop_path() {
        let (graph, ids) = graph_with_edges(&["A", "B", "C"], &[(0, 1), (1, 2)]);

        let result = shortest_path(&graph, ids[0], ids[2]).expect("path exists");
        assert_eq!(result.papers, vec![ids[0], ids[1], ids[2]]);
        assert_eq!(result.length, 2);
    }

    #[test]
    fn test_direction_matters() {
        let (graph, ids) = graph_with_edges(&["A", "B"], &[(0, 1)]);
        assert!(shortest_path(&graph, ids[1], ids[0]).is_none());
    }

    #[test]
    fn test_absent_ids_yield_none() {
        let (graph, ids) = graph_with_edges(&["A"], &[]);
        assert!(shortest_path(&graph, ids[0], Uuid::new_v4()).is_none());
        assert!(shortest_path(&graph, Uuid::new_v4(), ids[0]).is_none());
    }

    #[test]
    fn test_source_equals_target() {
        let (graph, ids) = graph_with_edges(&["A"], &[]);
        let result = shortest_path(&graph, ids[0], ids[0]).expect("trivial path");
        assert_eq!(result.length, 0);
        assert_eq!(result.papers, vec![ids[0]]);
        assert!(result.edges.is_empty());
    }

    #[test]
    fn test_deterministic_across_runs() {
        let (graph, ids) = graph_with_edges(
            &["A", "B", "C", "D"],
            &[(0, 1), (0, 2), (1, 3), (2, 3)],
        );
        let first = shortest_path(&graph, ids[0], ids[3]).unwrap();
        for _ in 0..5 {
            let again = shortest_path(&graph, ids[0], ids[3]).unwrap();
            assert_eq!(again.papers, first.papers);
        }
    }
}
