//! Attribute filtering
//!
//! AND-combined predicates over node fields. Field lookup checks the
//! attribute mapping first, then built-in fields; a missing field makes the
//! predicate false (closed world) rather than erroring. The result is a
//! derived graph keeping only nodes that satisfy every predicate and edges
//! whose both endpoints survive; the source graph is never mutated.

use citegraph_common::model::{AttrValue, PaperNode, ResearchGraph};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "contains")]
    Contains,
}

/// A single `{field, operator, value}` condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub field: String,
    pub operator: FilterOperator,
    pub value: serde_json::Value,
}

impl FilterPredicate {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: serde_json::Value,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

/// Apply AND-combined predicates, returning a derived subset graph.
pub fn filter_graph(graph: &ResearchGraph, predicates: &[FilterPredicate]) -> ResearchGraph {
    let mut filtered = ResearchGraph::new(format!("{} (filtered)", graph.name));
    filtered.layout = graph.layout.clone();

    let mut visible: HashSet<uuid::Uuid> = HashSet::new();
    for node in &graph.nodes {
        if predicates.iter().all(|p| node_matches(node, p)) {
            visible.insert(node.id);
            filtered.add_node(node.clone());
        }
    }

    for edge in &graph.edges {
        if visible.contains(&edge.from_paper) && visible.contains(&edge.to_paper) {
            filtered.add_edge(edge.clone());
        }
    }

    filtered
}

fn node_matches(node: &PaperNode, predicate: &FilterPredicate) -> bool {
    let Some(actual) = node.field_value(&predicate.field) else {
        // Unknown field excludes the node, for every operator
        return false;
    };

    match predicate.operator {
        FilterOperator::Eq => values_equal(&actual, &predicate.value),
        FilterOperator::Ne => !values_equal(&actual, &predicate.value),
        FilterOperator::Gt => {
            matches!(compare(&actual, &predicate.value), Some(Ordering::Greater))
        }
        FilterOperator::Ge => matches!(
            compare(&actual, &predicate.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOperator::Lt => {
            matches!(compare(&actual, &predicate.value), Some(Ordering::Less))
        }
        FilterOperator::Le => matches!(
            compare(&actual, &predicate.value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        FilterOperator::Contains => {
            let needle = value_text(&predicate.value).to_lowercase();
            actual.to_text().to_lowercase().contains(&needle)
        }
    }
}

fn values_equal(actual: &AttrValue, expected: &serde_json::Value) -> bool {
    match (actual, expected) {
        (AttrValue::Num(a), serde_json::Value::Number(n)) => {
            n.as_f64().map(|b| *a == b).unwrap_or(false)
        }
        (AttrValue::Str(a), serde_json::Value::String(b)) => a == b,
        (AttrValue::Bool(a), serde_json::Value::Bool(b)) => a == b,
        _ => false,
    }
}

fn compare(actual: &AttrValue, expected: &serde_json::Value) -> Option<Ordering> {
    match (actual, expected) {
        (AttrValue::Num(a), serde_json::Value::Number(n)) => {
            n.as_f64().and_then(|b| a.partial_cmp(&b))
        }
        (AttrValue::Str(a), serde_json::Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
