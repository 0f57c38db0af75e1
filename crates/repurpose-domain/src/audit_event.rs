//! Audit event types shared between the core and the audit store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coarse category of an audit event, used for read-back filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Auth,
    Query,
    Action,
    Error,
    Admin,
    Export,
}

/// One row of the append-only, hash-chained audit log (§3, §4.C).
///
/// `event_id` is monotonic *within its partition* (one UTC day), not
/// globally. `self_hash` commits to every other field; `prev_hash` links to
/// the previous event in the same partition, or to the partition's genesis
/// hash if this is the first event of the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: u64,
    pub partition_date: chrono::NaiveDate,
    pub event_type: EventType,
    pub user_id: String,
    pub request_id: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub details: Value,
    pub self_hash: String,
    pub prev_hash: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
