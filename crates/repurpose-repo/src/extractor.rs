//! The NER extractor contract (§4.B).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use repurpose_domain::entity::EntityKind;
use repurpose_domain::error::RepurposeResult;

/// One candidate entity span recognized in text, before normalization and
/// validation (§4.A) are applied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedSpan {
    pub text: String,
    pub kind: EntityKind,
    pub confidence: f64,
}

/// Named-entity recognition over raw text.
///
/// Implementations may be backed by a real model or may fall back to a
/// deterministic pattern extractor; either way, the `extraction_method` the
/// caller records reflects which path actually produced the span, not which
/// trait method was called.
#[async_trait]
pub trait NerExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> RepurposeResult<Vec<ExtractedSpan>>;
}
