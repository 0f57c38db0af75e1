//! The audit store contract (§4.B, §4.C).

use async_trait::async_trait;
use chrono::NaiveDate;

use repurpose_domain::audit_event::AuditEvent;
use repurpose_domain::error::RepurposeResult;

/// Append-only, hash-chained audit trail, partitioned per UTC day.
///
/// Implementations must serialize `append()` per partition (§5: "serialized
/// *per partition* to avoid two appenders racing for the same prev_hash").
/// Has a file-backed fallback when the primary store is unavailable — that
/// fallback is itself an implementation of this trait, not a special case
/// the core branches on.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append one event, computing its hash chain linkage against the
    /// latest event in its partition. Returns the event as stored,
    /// including the computed `self_hash`/`prev_hash`.
    async fn append(&self, event: AuditEvent) -> RepurposeResult<AuditEvent>;

    /// The `self_hash` of the latest event in `partition`, or the
    /// partition's genesis hash if it has no events yet.
    async fn latest_hash(&self, partition: NaiveDate) -> RepurposeResult<String>;

    /// Events in `partition` with `event_id` in `[from, to)`, ascending.
    async fn range(&self, partition: NaiveDate, from: u64, to: u64) -> RepurposeResult<Vec<AuditEvent>>;

    /// All events recorded for a given request, across partitions, in
    /// append order.
    async fn by_request(&self, request_id: &str) -> RepurposeResult<Vec<AuditEvent>>;
}
