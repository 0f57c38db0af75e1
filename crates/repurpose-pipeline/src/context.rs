//! Shared call-timeout helpers and the bundle of external collaborators
//! every stage is constructed with (§4.G, §5 "Timeouts").

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use repurpose_domain::error::{RepurposeError, RepurposeResult};
use repurpose_repo::{LiteratureClient, NerExtractor, Scorer, Synthesizer};
use repurpose_verify::SchemaVerifier;

/// §5 "Timeouts": literature 30s.
pub const LITERATURE_TIMEOUT: Duration = Duration::from_secs(30);
/// §5 "Timeouts": synthesizer 60s.
pub const SYNTHESIZER_TIMEOUT: Duration = Duration::from_secs(60);
/// §5 "Timeouts": scorer 10s.
pub const SCORER_TIMEOUT: Duration = Duration::from_secs(10);
/// Not named explicitly in §5's timeout table; held to the same budget as
/// the scorer since both are single model-inference calls.
pub const NER_TIMEOUT: Duration = Duration::from_secs(10);
/// §5 "Timeouts": per-stage wall time 120s.
pub const STAGE_TIMEOUT: Duration = Duration::from_secs(120);
/// §5 "Timeouts": per-request wall time 300s.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// The pipeline's external collaborators (§4.B), constructed once at process
/// startup and shared across every request — explicit dependency injection
/// in place of lazy singleton model loaders.
pub struct StageContext {
    pub extractor: Arc<dyn NerExtractor>,
    pub literature: Arc<dyn LiteratureClient>,
    pub scorer: Arc<dyn Scorer>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub verifier: SchemaVerifier,
}

/// Race a fallible external call against its declared budget. A timeout is
/// indistinguishable from the repository being down: both degrade the
/// calling stage's output rather than propagate (§7 `repository_unavailable`).
pub async fn call_with_timeout<T, F>(repository: &str, timeout: Duration, fut: F) -> RepurposeResult<T>
where
    F: Future<Output = RepurposeResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(RepurposeError::RepositoryUnavailable {
            repository: repository.to_string(),
            reason: "timed out".to_string(),
        }),
    }
}
