//! CiteGraph Common Library
//!
//! Shared code for the CiteGraph services including:
//! - Citation graph data model
//! - Error types and handling
//! - Configuration management
//! - Bibliographic source adapter (Semantic Scholar)
//! - Metrics and observability

pub mod config;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod source;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use model::{AttrValue, CitationEdge, PaperNode, PaperRecord, ResearchGraph};
pub use source::{ExternalRecord, SourceAdapter};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default page size for reference/citation fetches
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// Default cap on the reviewed-paper set
pub const DEFAULT_MAX_REVIEWED: usize = 50;
