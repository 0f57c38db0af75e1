//! The literature client contract (§4.B, §4.E).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use repurpose_domain::error::RepurposeResult;

/// One fetched article: enough text for NER extraction and enough metadata
/// to build a `Citation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub source_id: String,
    pub title: String,
    #[serde(default)]
    pub abstract_text: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub url: Option<String>,
}

/// Rate-limited external literature search and fetch.
///
/// Implementations must enforce the minimum delay specified in §4.B
/// (≤ 3 requests/second with an API key, ≤ 1/second without) internally —
/// callers never need to pace their own calls.
#[async_trait]
pub trait LiteratureClient: Send + Sync {
    /// Search for source ids matching `query_terms`. Returns a finite,
    /// ordered sequence; an empty result means "exit with no writes" to
    /// the ingestion pipeline.
    async fn search(&self, query_terms: &str, max_results: usize) -> RepurposeResult<Vec<String>>;

    /// Fetch articles (with abstracts) for the given ids, in batches of at
    /// most 50 per underlying request.
    async fn fetch(&self, ids: &[String]) -> RepurposeResult<Vec<Article>>;
}
