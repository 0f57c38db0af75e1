//! The primary/fallback audit store combinator (§4.C).
//!
//! Appends go to the primary store; when the primary reports
//! `RepositoryUnavailable`, the event is written to the file-backed fallback
//! instead. This is itself an `AuditStore` implementation, not a special
//! case the core branches on (§4.B).

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use repurpose_domain::audit_event::AuditEvent;
use repurpose_domain::error::{RepurposeError, RepurposeResult};
use repurpose_repo::AuditStore;

/// Wraps a primary `AuditStore` with a fallback that absorbs writes (and,
/// transparently, reads) when the primary is down.
pub struct FallbackAuditStore<P, F> {
    primary: P,
    fallback: F,
}

impl<P: AuditStore, F: AuditStore> FallbackAuditStore<P, F> {
    pub fn new(primary: P, fallback: F) -> FallbackAuditStore<P, F> {
        FallbackAuditStore { primary, fallback }
    }
}

fn is_unavailable(err: &RepurposeError) -> bool {
    matches!(err, RepurposeError::RepositoryUnavailable { .. })
}

#[async_trait]
impl<P: AuditStore, F: AuditStore> AuditStore for FallbackAuditStore<P, F> {
    async fn append(&self, event: AuditEvent) -> RepurposeResult<AuditEvent> {
        match self.primary.append(event.clone()).await {
            Ok(stored) => Ok(stored),
            Err(e) if is_unavailable(&e) => {
                warn!(request_id = %event.request_id, error = %e, "audit primary unavailable, falling back to file store");
                self.fallback.append(event).await
            }
            Err(e) => Err(e),
        }
    }

    async fn latest_hash(&self, partition: NaiveDate) -> RepurposeResult<String> {
        match self.primary.latest_hash(partition).await {
            Ok(hash) => Ok(hash),
            Err(e) if is_unavailable(&e) => self.fallback.latest_hash(partition).await,
            Err(e) => Err(e),
        }
    }

    async fn range(&self, partition: NaiveDate, from: u64, to: u64) -> RepurposeResult<Vec<AuditEvent>> {
        match self.primary.range(partition, from, to).await {
            Ok(events) => Ok(events),
            Err(e) if is_unavailable(&e) => self.fallback.range(partition, from, to).await,
            Err(e) => Err(e),
        }
    }

    async fn by_request(&self, request_id: &str) -> RepurposeResult<Vec<AuditEvent>> {
        match self.primary.by_request(request_id).await {
            Ok(events) => Ok(events),
            Err(e) if is_unavailable(&e) => self.fallback.by_request(request_id).await,
            Err(e) => Err(e),
        }
    }
}
