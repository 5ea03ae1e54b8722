//! Semantic Scholar Academic Graph API client
//!
//! Implements [`SourceAdapter`] against `api.semanticscholar.org`. All
//! outbound requests pass through one shared token-bucket limiter so that
//! concurrent workers cannot multiply the request rate, and every call runs
//! inside a bounded retry loop before degrading to absence.

use super::{ExternalRecord, RetryPolicy, SourceAdapter};
use crate::config::SourceConfig;
use crate::metrics::{record_source_giveup, record_source_request, record_source_retry};
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Shared outbound rate limiter (token bucket)
pub type SourceRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// Fields requested for every paper payload
const PAPER_FIELDS: &str = "paperId,title,authors,year,citationCount,abstract,venue";

/// Maximum ids per batch request
const BATCH_SIZE: usize = 100;

/// Client for the Semantic Scholar Academic Graph API
pub struct SemanticScholarAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    limiter: Arc<SourceRateLimiter>,
    retry: RetryPolicy,
    page_size: usize,
}

/// Internal classification of a failed call
enum CallError {
    /// Rate limit / timeout / server error: worth retrying
    Transient(String),
    /// Anything else: give up immediately
    Fatal(String),
}

impl SemanticScholarAdapter {
    /// Create a client from source configuration.
    pub fn new(config: &SourceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second.max(1)).unwrap(),
        )
        .allow_burst(NonZeroU32::new(config.burst.max(1)).unwrap());

        if config.api_key.is_some() {
            tracing::info!("Semantic Scholar client initialized with API key");
        } else {
            tracing::warn!("Semantic Scholar client initialized without API key (throttled)");
        }

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            limiter: Arc::new(RateLimiter::direct(quota)),
            retry: RetryPolicy::new(
                config.max_retries,
                Duration::from_millis(config.retry_base_delay_ms),
            ),
            page_size: config.page_size,
        }
    }

    /// Run a request through the limiter and the retry loop.
    ///
    /// `Ok(None)` from the wire (HTTP 404) is a definitive absence and is
    /// not retried; transient failures retry until the policy is exhausted,
    /// then also collapse into `None`.
    async fn execute<T, F>(&self, operation: &'static str, build: F) -> Option<T>
    where
        T: serde::de::DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempts = 0;
        loop {
            if attempts > 0 {
                record_source_retry(operation);
                tokio::time::sleep(self.retry.delay(attempts - 1)).await;
            }
            attempts += 1;

            self.limiter.until_ready().await;

            match self.send(build()).await {
                Ok(found) => {
                    record_source_request(operation, "ok");
                    return found;
                }
                Err(CallError::Transient(message)) => {
                    tracing::warn!(
                        operation,
                        attempt = attempts,
                        max_attempts = self.retry.max_attempts,
                        error = %message,
                        "Transient source failure"
                    );
                    if !self.retry.allows(attempts) {
                        record_source_giveup(operation);
                        return None;
                    }
                }
                Err(CallError::Fatal(message)) => {
                    record_source_request(operation, "error");
                    tracing::warn!(operation, error = %message, "Source request failed");
                    return None;
                }
            }
        }
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, CallError> {
        let request = match &self.api_key {
            Some(key) => request.header("x-api-key", key),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                CallError::Transient(e.to_string())
            } else {
                CallError::Fatal(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(CallError::Transient(format!("status {}", status)));
        }
        if !status.is_success() {
            return Err(CallError::Fatal(format!("status {}", status)));
        }

        let parsed = response
            .json::<T>()
            .await
            .map_err(|e| CallError::Fatal(format!("invalid response body: {}", e)))?;
        Ok(Some(parsed))
    }
}

#[async_trait::async_trait]
impl SourceAdapter for SemanticScholarAdapter {
    async fn resolve(&self, title: &str, external_id: Option<&str>) -> Option<ExternalRecord> {
        // Id lookup first: cheaper and unambiguous
        if let Some(id) = external_id {
            let url = format!("{}/paper/{}", self.base_url, id);
            let found: Option<ApiPaper> = self
                .execute("resolve", || {
                    self.client.get(&url).query(&[("fields", PAPER_FIELDS)])
                })
                .await;
            if let Some(record) = found.and_then(ApiPaper::into_record) {
                return Some(record);
            }
        }

        let query = title.trim().replace('\n', " ");
        let url = format!("{}/paper/search", self.base_url);
        let found: Option<SearchResponse> = self
            .execute("search", || {
                self.client.get(&url).query(&[
                    ("query", query.as_str()),
                    ("limit", "1"),
                    ("fields", PAPER_FIELDS),
                ])
            })
            .await;

        found
            .and_then(|r| r.data.into_iter().next())
            .and_then(ApiPaper::into_record)
    }

    async fn references(&self, id: &str, limit: usize) -> Vec<ExternalRecord> {
        let limit = limit.min(self.page_size).max(1).to_string();
        let url = format!("{}/paper/{}/references", self.base_url, id);
        let found: Option<ReferencesResponse> = self
            .execute("references", || {
                self.client
                    .get(&url)
                    .query(&[("fields", PAPER_FIELDS), ("limit", limit.as_str())])
            })
            .await;

        found
            .map(|r| {
                r.data
                    .into_iter()
                    .filter_map(|entry| entry.cited_paper)
                    .filter_map(ApiPaper::into_record)
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn citations(&self, id: &str, limit: usize) -> Vec<ExternalRecord> {
        let limit = limit.min(self.page_size).max(1).to_string();
        let url = format!("{}/paper/{}/citations", self.base_url, id);
        let found: Option<CitationsResponse> = self
            .execute("citations", || {
                self.client
                    .get(&url)
                    .query(&[("fields", PAPER_FIELDS), ("limit", limit.as_str())])
            })
            .await;

        found
            .map(|r| {
                r.data
                    .into_iter()
                    .filter_map(|entry| entry.citing_paper)
                    .filter_map(ApiPaper::into_record)
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn batch_references(&self, ids: &[String]) -> HashMap<String, Vec<String>> {
        let mut map = HashMap::with_capacity(ids.len());
        let url = format!("{}/paper/batch", self.base_url);

        for chunk in ids.chunks(BATCH_SIZE) {
            let body = BatchRequest { ids: chunk };
            let found: Option<Vec<Option<BatchPaper>>> = self
                .execute("batch_references", || {
                    self.client
                        .post(&url)
                        .query(&[("fields", "references.paperId")])
                        .json(&body)
                })
                .await;

            if let Some(entries) = found {
                for entry in entries.into_iter().flatten() {
                    if let Some(id) = entry.paper_id {
                        let refs = entry
                            .references
                            .into_iter()
                            .filter_map(|stub| stub.paper_id)
                            .collect();
                        map.insert(id, refs);
                    }
                }
            }
        }

        map
    }
}

// Wire DTOs

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPaper {
    paper_id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    authors: Vec<ApiAuthor>,
    year: Option<i32>,
    citation_count: Option<u64>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    venue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiAuthor {
    name: Option<String>,
}

impl ApiPaper {
    /// Convert into an [`ExternalRecord`]; entries without id or title are
    /// unusable and dropped.
    fn into_record(self) -> Option<ExternalRecord> {
        let id = self.paper_id?;
        let title = self.title?;
        Some(ExternalRecord {
            id,
            title,
            authors: self.authors.into_iter().filter_map(|a| a.name).collect(),
            year: self.year,
            abstract_text: self.abstract_text,
            citation_count: self.citation_count.unwrap_or(0),
            venue: self.venue,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<ApiPaper>,
}

#[derive(Debug, Deserialize)]
struct ReferencesResponse {
    #[serde(default)]
    data: Vec<ReferenceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReferenceEntry {
    cited_paper: Option<ApiPaper>,
}

#[derive(Debug, Deserialize)]
struct CitationsResponse {
    #[serde(default)]
    data: Vec<CitationEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CitationEntry {
    citing_paper: Option<ApiPaper>,
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    ids: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchPaper {
    paper_id: Option<String>,
    #[serde(default)]
    references: Vec<PaperStub>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaperStub {
    paper_id: Option<String>,
}
