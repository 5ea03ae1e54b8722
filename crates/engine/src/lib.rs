//! CiteGraph Engine
//!
//! The graph assembly and analysis core:
//! - Network orchestration: turns noisy, rate-limited bibliographic lookups
//!   into a coherent paper/edge set over external ids
//! - Assembly: identity reconciliation and edge deduplication into the
//!   internal [`ResearchGraph`](citegraph_common::model::ResearchGraph)
//! - Queries: attribute filtering, shortest paths, visual encoding
//! - Clustering: content, citation-topology, and weighted hybrid

pub mod assemble;
pub mod cluster;
pub mod network;
pub mod query;

pub use assemble::{DefaultMatcher, GraphAssembler, RecordMatcher};
pub use cluster::{ClusterMethod, ClusterRequest, ClusteringEngine, ClusteringReport};
pub use network::{CitationNetwork, CitationNetworkBuilder, NetworkOptions, QueryPaper};
pub use query::{FilterPredicate, PathResult, VisualEncoding};
