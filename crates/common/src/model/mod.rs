//! Citation graph data model
//!
//! The graph produced by assembly and consumed by every downstream
//! operation (filtering, path queries, visual encoding, clustering).
//! Serialized field names are part of the API contract and must stay
//! stable for presentation layers binding to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A schema-less attribute value attached to a node.
///
/// Extractor collaborators populate `node.attributes` with arbitrary
/// string-keyed values; the core only interprets them when a field name is
/// explicitly given to a filter, clustering, or visual-encoding operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Num(f64),
    Str(String),
}

impl AttrValue {
    /// Numeric view, if this value is a number.
    pub fn as_num(&self) -> Option<f64> {
        match self {
            AttrValue::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// String view, if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as display text (used by `contains` matching).
    pub fn to_text(&self) -> String {
        match self {
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::Num(n) => n.to_string(),
            AttrValue::Str(s) => s.clone(),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Num(n)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// Presentation-only state of a node. Never carries semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeVisual {
    pub color: String,
    pub size: f32,
    pub shape: String,
    pub opacity: f32,
    pub border_color: String,
    pub border_width: f32,
}

impl Default for NodeVisual {
    fn default() -> Self {
        Self {
            color: "#4A90E2".to_string(),
            size: 20.0,
            shape: "ellipse".to_string(),
            opacity: 1.0,
            border_color: "#2C3E50".to_string(),
            border_width: 2.0,
        }
    }
}

/// Presentation-only state of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeVisual {
    pub color: String,
    pub thickness: f32,
    pub style: String,
    pub opacity: f32,
}

impl Default for EdgeVisual {
    fn default() -> Self {
        Self {
            color: "#95A5A6".to_string(),
            thickness: 2.0,
            style: "solid".to_string(),
            opacity: 0.7,
        }
    }
}

/// A paper as a node in the citation graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperNode {
    /// Internal id, unique within the owning graph, stable for its lifetime
    pub id: Uuid,

    pub title: String,

    /// Ordered author list
    pub authors: Vec<String>,

    #[serde(rename = "abstract")]
    pub abstract_text: String,

    pub full_text: Option<String>,

    /// Publication year, when resolved
    pub year: Option<i32>,

    pub venue: String,

    pub citation_count: u64,

    /// Open string-keyed attribute mapping; `cluster_id` is written by the
    /// clustering engine, everything else by extractor collaborators
    pub attributes: BTreeMap<String, AttrValue>,

    /// Set only after a clustering operation has run
    pub cluster_id: Option<usize>,

    pub visual: NodeVisual,
}

impl PaperNode {
    /// Create a node with defaults for everything but the title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            authors: Vec::new(),
            abstract_text: String::new(),
            full_text: None,
            year: None,
            venue: String::new(),
            citation_count: 0,
            attributes: BTreeMap::new(),
            cluster_id: None,
            visual: NodeVisual::default(),
        }
    }

    /// Resolve a field by name: the attribute mapping first, then built-in
    /// fields. Returns `None` for unknown fields (closed world).
    pub fn field_value(&self, field: &str) -> Option<AttrValue> {
        if let Some(value) = self.attributes.get(field) {
            return Some(value.clone());
        }

        match field {
            "title" => Some(AttrValue::Str(self.title.clone())),
            "abstract" => Some(AttrValue::Str(self.abstract_text.clone())),
            "venue" => Some(AttrValue::Str(self.venue.clone())),
            "authors" => Some(AttrValue::Str(self.authors.join("; "))),
            "year" => self.year.map(|y| AttrValue::Num(y as f64)),
            "citation_count" => Some(AttrValue::Num(self.citation_count as f64)),
            "cluster_id" => self.cluster_id.map(|c| AttrValue::Num(c as f64)),
            _ => None,
        }
    }

    /// Record a cluster assignment on the node (field and attribute).
    pub fn set_cluster(&mut self, cluster_id: usize) {
        self.cluster_id = Some(cluster_id);
        self.attributes
            .insert("cluster_id".to_string(), AttrValue::Num(cluster_id as f64));
    }
}

/// A citation relationship: `from_paper` cites `to_paper`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationEdge {
    pub id: Uuid,

    pub from_paper: Uuid,

    pub to_paper: Uuid,

    /// Contribution/category label (free string)
    pub category: String,

    /// Importance of the citation, constrained to [0, 1]
    pub strength: f32,

    pub context: String,

    pub section: String,

    pub delta_description: Option<String>,

    pub visual: EdgeVisual,
}

impl CitationEdge {
    /// Create an edge with the default category and strength.
    pub fn new(from_paper: Uuid, to_paper: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_paper,
            to_paper,
            category: "related".to_string(),
            strength: 0.5,
            context: String::new(),
            section: String::new(),
            delta_description: None,
            visual: EdgeVisual::default(),
        }
    }

    /// Set the strength, clamped into [0, 1].
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength.clamp(0.0, 1.0);
        self
    }
}

/// Layout descriptor handed through to presentation layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLayout {
    pub algorithm: String,
    pub parameters: BTreeMap<String, serde_json::Value>,
}

impl Default for GraphLayout {
    fn default() -> Self {
        Self {
            algorithm: "cose".to_string(),
            parameters: BTreeMap::new(),
        }
    }
}

/// The complete citation graph.
///
/// Node order is meaningful: input papers first (caller order), then
/// reviewed papers in selection-rank order. The clustering engine aligns
/// similarity-matrix indices to this order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchGraph {
    pub id: Uuid,

    pub name: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub nodes: Vec<PaperNode>,

    pub edges: Vec<CitationEdge>,

    /// Counts, date range, clustering descriptors
    pub metadata: BTreeMap<String, serde_json::Value>,

    /// Idempotency/audit marker for extractor collaborators
    pub extractors_applied: Vec<String>,

    pub layout: GraphLayout,
}

impl ResearchGraph {
    /// Create an empty graph.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            nodes: Vec::new(),
            edges: Vec::new(),
            metadata: BTreeMap::new(),
            extractors_applied: Vec::new(),
            layout: GraphLayout::default(),
        }
    }

    /// Append a node, bumping `updated_at`.
    pub fn add_node(&mut self, node: PaperNode) {
        self.nodes.push(node);
        self.touch();
    }

    /// Append an edge, bumping `updated_at`.
    pub fn add_edge(&mut self, edge: CitationEdge) {
        self.edges.push(edge);
        self.touch();
    }

    /// Look up a node by id.
    pub fn node(&self, id: Uuid) -> Option<&PaperNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Mutable node lookup.
    pub fn node_mut(&mut self, id: Uuid) -> Option<&mut PaperNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Whether a directed edge between the pair already exists.
    pub fn has_edge(&self, from: Uuid, to: Uuid) -> bool {
        self.edges
            .iter()
            .any(|e| e.from_paper == from && e.to_paper == to)
    }

    /// All edges touching a node.
    pub fn edges_for(&self, id: Uuid) -> Vec<&CitationEdge> {
        self.edges
            .iter()
            .filter(|e| e.from_paper == id || e.to_paper == id)
            .collect()
    }

    /// Bump the update timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A caller-supplied paper record (parsed-paper contract).
///
/// Produced by PDF/ArXiv/DOI-resolution collaborators; the assembler
/// requires only title/authors/abstract/full_text — the rest is optional
/// enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    pub id: String,

    pub title: String,

    pub authors: Vec<String>,

    #[serde(rename = "abstract", default)]
    pub abstract_text: String,

    #[serde(default)]
    pub full_text: Option<String>,

    #[serde(default)]
    pub year: Option<i32>,

    /// Known external ids keyed by source name (e.g. "semantic_scholar")
    #[serde(default)]
    pub external_ids: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_node_and_edge() {
        let mut graph = ResearchGraph::new("test");
        let a = PaperNode::new("Paper A");
        let b = PaperNode::new("Paper B");
        let (a_id, b_id) = (a.id, b.id);

        graph.add_node(a);
        graph.add_node(b);
        graph.add_edge(CitationEdge::new(a_id, b_id));

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert!(graph.has_edge(a_id, b_id));
        assert!(!graph.has_edge(b_id, a_id));
        assert_eq!(graph.edges_for(a_id).len(), 1);
    }

    #[test]
    fn test_field_resolution_prefers_attributes() {
        let mut node = PaperNode::new("Attention Is All You Need");
        node.venue = "NeurIPS".to_string();
        node.attributes
            .insert("venue".to_string(), AttrValue::from("override"));

        assert_eq!(
            node.field_value("venue"),
            Some(AttrValue::Str("override".to_string()))
        );
        assert_eq!(
            node.field_value("title"),
            Some(AttrValue::Str("Attention Is All You Need".to_string()))
        );
        assert_eq!(node.field_value("no_such_field"), None);
    }

    #[test]
    fn test_missing_year_resolves_to_none() {
        let node = PaperNode::new("untitled");
        assert_eq!(node.field_value("year"), None);
        assert_eq!(node.field_value("citation_count"), Some(AttrValue::Num(0.0)));
    }

    #[test]
    fn test_set_cluster_writes_field_and_attribute() {
        let mut node = PaperNode::new("p");
        node.set_cluster(3);
        assert_eq!(node.cluster_id, Some(3));
        assert_eq!(node.attributes.get("cluster_id"), Some(&AttrValue::Num(3.0)));
    }

    #[test]
    fn test_node_serializes_abstract_field_name() {
        let node = PaperNode::new("p");
        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("abstract").is_some());
        assert!(json.get("abstract_text").is_none());
        assert!(json.get("visual").is_some());
    }

    #[test]
    fn test_attr_value_untagged_roundtrip() {
        let values = vec![
            AttrValue::Str("transformer".to_string()),
            AttrValue::Num(42.0),
            AttrValue::Bool(true),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"["transformer",42.0,true]"#);
        let back: Vec<AttrValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
