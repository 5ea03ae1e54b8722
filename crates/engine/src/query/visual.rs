//! Visual encoding derivation
//!
//! Maps node fields onto presentation attributes: categorical values onto a
//! fixed color palette and shape set (stable-sorted, cycled by index) and
//! numeric values onto a [10, 50] size range. Only the `visual` record is
//! touched; semantic fields never change, and re-applying the same encoding
//! is a no-op.

use citegraph_common::model::ResearchGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed categorical color palette
pub const COLOR_PALETTE: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#95E1D3", "#F38181", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F",
];

/// Fixed shape cycle for categorical encoding
pub const SHAPE_SET: [&str; 5] = [
    "ellipse",
    "round-rectangle",
    "triangle",
    "diamond",
    "pentagon",
];

/// Size range bounds and the all-equal fallback
const SIZE_MIN: f32 = 10.0;
const SIZE_MAX: f32 = 50.0;
const SIZE_FLAT: f32 = 20.0;

/// Which fields drive which visual channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualEncoding {
    #[serde(default)]
    pub color_by: Option<String>,

    #[serde(default)]
    pub size_by: Option<String>,

    #[serde(default)]
    pub shape_by: Option<String>,
}

/// Apply the requested encodings in place.
pub fn apply_visual_encoding(graph: &mut ResearchGraph, encoding: &VisualEncoding) {
    if let Some(field) = &encoding.color_by {
        apply_categorical(graph, field, &COLOR_PALETTE, |node, value| {
            node.visual.color = value;
        });
    }
    if let Some(field) = &encoding.size_by {
        apply_size(graph, field);
    }
    if let Some(field) = &encoding.shape_by {
        apply_categorical(graph, field, &SHAPE_SET, |node, value| {
            node.visual.shape = value;
        });
    }
    graph.touch();
}

/// Stable mapping: sorted distinct field values onto `options` by index.
fn apply_categorical(
    graph: &mut ResearchGraph,
    field: &str,
    options: &[&str],
    write: impl Fn(&mut citegraph_common::model::PaperNode, String),
) {
    let mut values: Vec<String> = graph
        .nodes
        .iter()
        .filter_map(|node| node.field_value(field))
        .map(|value| value.to_text())
        .collect();
    values.sort();
    values.dedup();

    let mapping: HashMap<String, String> = values
        .into_iter()
        .enumerate()
        .map(|(index, value)| (value, options[index % options.len()].to_string()))
        .collect();

    for node in &mut graph.nodes {
        if let Some(value) = node.field_value(field) {
            if let Some(option) = mapping.get(&value.to_text()) {
                write(node, option.clone());
            }
        }
    }
}

/// Linear min-max normalization into [SIZE_MIN, SIZE_MAX]; a degenerate
/// all-equal distribution maps every node to SIZE_FLAT.
fn apply_size(graph: &mut ResearchGraph, field: &str) {
    let values: Vec<f64> = graph
        .nodes
        .iter()
        .filter_map(|node| node.field_value(field).and_then(|v| v.as_num()))
        .collect();
    let (Some(&min), Some(&max)) = (
        values
            .iter()
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)),
        values
            .iter()
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)),
    ) else {
        return;
    };

    for node in &mut graph.nodes {
        let Some(value) = node.field_value(field).and_then(|v| v.as_num()) else {
            continue;
        };
        node.visual.size = if max == min {
            SIZE_FLAT
        } else {
            let normalized = (value - min) / (max - min);
            SIZE_MIN + (normalized as f32) * (SIZE_MAX - SIZE_MIN)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citegraph_common::model::{AttrValue, PaperNode};

    fn graph_with_citations(counts: &[u64]) -> ResearchGraph {
        let mut graph = ResearchGraph::new("visual");
        for (index, &count) in counts.iter().enumerate() {
            let mut node = PaperNode::new(format!("paper {}", index));
            node.citation_count = count;
            graph.add_node(node);
        }
        graph
    }

    #[test]
    fn test_size_maps_min_to_10_and_max_to_50() {
        let mut graph = graph_with_citations(&[0, 50, 100]);
        apply_visual_encoding(
            &mut graph,
            &VisualEncoding {
                size_by: Some("citation_count".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(graph.nodes[0].visual.size, 10.0);
        assert_eq!(graph.nodes[1].visual.size, 30.0);
        assert_eq!(graph.nodes[2].visual.size, 50.0);
    }

    #[test]
    fn test_all_equal_values_map_to_20() {
        let mut graph = graph_with_citations(&[7, 7, 7]);
        apply_visual_encoding(
            &mut graph,
            &VisualEncoding {
                size_by: Some("citation_count".to_string()),
                ..Default::default()
            },
        );

        for node in &graph.nodes {
            assert_eq!(node.visual.size, 20.0);
        }
    }

    #[test]
    fn test_color_assignment_is_stable_sorted() {
        let mut graph = ResearchGraph::new("colors");
        for topic in ["zebra", "alpha", "alpha", "middle"] {
            let mut node = PaperNode::new(topic);
            node.attributes
                .insert("topic".to_string(), AttrValue::from(topic));
            graph.add_node(node);
        }

        apply_visual_encoding(
            &mut graph,
            &VisualEncoding {
                color_by: Some("topic".to_string()),
                ..Default::default()
            },
        );

        // Sorted distinct values: alpha, middle, zebra
        assert_eq!(graph.nodes[0].visual.color, COLOR_PALETTE[2]); // zebra
        assert_eq!(graph.nodes[1].visual.color, COLOR_PALETTE[0]); // alpha
        assert_eq!(graph.nodes[2].visual.color, COLOR_PALETTE[0]); // alpha
        assert_eq!(graph.nodes[3].visual.color, COLOR_PALETTE[1]); // middle
    }

    #[test]
    fn test_shape_cycles_through_fixed_set() {
        let mut graph = ResearchGraph::new("shapes");
        for index in 0..7 {
            let mut node = PaperNode::new(format!("n{}", index));
            node.attributes.insert(
                "kind".to_string(),
                AttrValue::from(format!("kind-{}", index)),
            );
            graph.add_node(node);
        }

        apply_visual_encoding(
            &mut graph,
            &VisualEncoding {
                shape_by: Some("kind".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(graph.nodes[0].visual.shape, SHAPE_SET[0]);
        assert_eq!(graph.nodes[5].visual.shape, SHAPE_SET[0]);
        assert_eq!(graph.nodes[6].visual.shape, SHAPE_SET[1]);
    }

    #[test]
    fn test_encoding_is_idempotent_and_leaves_semantics_alone() {
        let mut graph = graph_with_citations(&[1, 2, 3]);
        let encoding = VisualEncoding {
            size_by: Some("citation_count".to_string()),
            ..Default::default()
        };

        apply_visual_encoding(&mut graph, &encoding);
        let sizes: Vec<f32> = graph.nodes.iter().map(|n| n.visual.size).collect();
        let counts: Vec<u64> = graph.nodes.iter().map(|n| n.citation_count).collect();

        apply_visual_encoding(&mut graph, &encoding);
        assert_eq!(
            sizes,
            graph.nodes.iter().map(|n| n.visual.size).collect::<Vec<_>>()
        );
        assert_eq!(
            counts,
            graph
                .nodes
                .iter()
                .map(|n| n.citation_count)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_nodes_missing_the_field_keep_defaults() {
        let mut graph = ResearchGraph::new("partial");
        let mut tagged = PaperNode::new("tagged");
        tagged
            .attributes
            .insert("group".to_string(), AttrValue::from("a"));
        graph.add_node(tagged);
        graph.add_node(PaperNode::new("untagged"));

        apply_visual_encoding(
            &mut graph,
            &VisualEncoding {
                color_by: Some("group".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(graph.nodes[0].visual.color, COLOR_PALETTE[0]);
        assert_eq!(graph.nodes[1].visual.color, "#4A90E2");
    }
}
