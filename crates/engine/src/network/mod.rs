//! Citation network orchestration
//!
//! Resolves query papers against the bibliographic source, discovers a
//! bounded reviewed set by reference frequency, and assembles an edge list
//! over external ids — including edges between the discovered papers.

mod builder;

pub use builder::CitationNetworkBuilder;

use citegraph_common::config::{BuilderConfig, SourceConfig};
use citegraph_common::source::ExternalRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A paper the caller wants in the graph, identified by title and an
/// optional external-id hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPaper {
    pub title: String,
    pub external_id: Option<String>,
}

impl QueryPaper {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            external_id: None,
        }
    }

    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }
}

/// Tuning knobs for a network build.
#[derive(Debug, Clone)]
pub struct NetworkOptions {
    /// Cap on the reviewed-paper set (K)
    pub max_reviewed: usize,

    /// Page size for per-paper reference fetches
    pub page_size: usize,

    /// Worker-pool width for independent per-paper calls
    pub concurrency: usize,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            max_reviewed: 50,
            page_size: 500,
            concurrency: 4,
        }
    }
}

impl NetworkOptions {
    /// Derive options from configuration.
    pub fn from_config(builder: &BuilderConfig, source: &SourceConfig) -> Self {
        Self {
            max_reviewed: builder.max_reviewed,
            page_size: source.page_size,
            concurrency: builder.concurrency.max(1),
        }
    }

    pub fn with_max_reviewed(mut self, max_reviewed: usize) -> Self {
        self.max_reviewed = max_reviewed;
        self
    }
}

/// A directed citation between two external ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalEdge {
    pub from: String,
    pub to: String,
}

impl ExternalEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// The raw network produced by a build: resolved records partitioned into
/// input and reviewed sets, plus the deduplicated external-id edge list.
#[derive(Debug, Clone, Default)]
pub struct CitationNetwork {
    /// Every resolved record, keyed by external id
    pub papers: HashMap<String, ExternalRecord>,

    /// Resolved input papers, caller order
    pub input_ids: Vec<String>,

    /// Reviewed papers, selection-rank order
    pub reviewed_ids: Vec<String>,

    /// Deduplicated edges; no self-edges
    pub edges: Vec<ExternalEdge>,

    /// How often each reviewed paper appeared across the inputs' reference
    /// sets (the selection signal's frequency component)
    pub frequencies: HashMap<String, u32>,
}

impl CitationNetwork {
    /// Record lookup by external id.
    pub fn paper(&self, id: &str) -> Option<&ExternalRecord> {
        self.papers.get(id)
    }

    /// Whether the build produced nothing at all.
    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty() && self.reviewed_ids.is_empty()
    }
}
