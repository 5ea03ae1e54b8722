//! Bibliographic source adapter
//!
//! Abstraction over the external bibliographic service used to resolve
//! papers and fetch citation data. Every operation retries transient
//! failures (rate limit, timeout) a bounded number of times with increasing
//! backoff, then degrades to absence — `None` or an empty collection —
//! rather than erroring. Callers never distinguish "not found" from "gave
//! up after retries".

pub mod mock;
mod retry;
mod semantic_scholar;

pub use mock::MockSourceAdapter;
pub use retry::RetryPolicy;
pub use semantic_scholar::SemanticScholarAdapter;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A paper as known to the external bibliographic source.
///
/// Transient: not persisted past assembly except as derived node fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalRecord {
    /// The source's own paper id
    pub id: String,

    pub title: String,

    pub authors: Vec<String>,

    pub year: Option<i32>,

    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,

    pub citation_count: u64,

    pub venue: Option<String>,
}

/// Contract for bibliographic lookups.
///
/// Implementations own their retry and rate-limiting discipline; the
/// network builder treats every absence the same way regardless of cause.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Resolve a paper by external id (preferred) or title search.
    async fn resolve(&self, title: &str, external_id: Option<&str>) -> Option<ExternalRecord>;

    /// Papers cited by this paper, up to `limit`.
    async fn references(&self, id: &str, limit: usize) -> Vec<ExternalRecord>;

    /// Papers citing this paper, up to `limit`.
    async fn citations(&self, id: &str, limit: usize) -> Vec<ExternalRecord>;

    /// Reference id lists for many papers at once. Papers the source does
    /// not know are simply absent from the result map.
    async fn batch_references(&self, ids: &[String]) -> HashMap<String, Vec<String>>;
}

/// Case/whitespace normalization used for title identity throughout.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(
            normalize_title("  Attention   Is\nAll You Need "),
            "attention is all you need"
        );
        assert_eq!(normalize_title("BERT"), "bert");
    }
}
