//! Hash-chain primitives (§4.C): hashing, genesis derivation, and partition
//! verification.
//!
//! An event's `self_hash = H(event_id | event_type | user_id | action |
//! prev_hash)`; the first event of a partition links to `H("GENESIS" |
//! partition_date)` instead of a predecessor. `H` is SHA-256, hex-encoded.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use repurpose_domain::audit_event::{AuditEvent, EventType};

fn event_type_str(event_type: EventType) -> &'static str {
    match event_type {
        EventType::Auth => "auth",
        EventType::Query => "query",
        EventType::Action => "action",
        EventType::Error => "error",
        EventType::Admin => "admin",
        EventType::Export => "export",
    }
}

/// Compute the genesis hash for a partition: `H("GENESIS|{date}")`. Bound to
/// the date so a chain cannot be spliced across days.
pub fn genesis_hash(partition_date: NaiveDate) -> String {
    let content = format!("GENESIS|{partition_date}");
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Compute the `self_hash` for one event, given the `prev_hash` it links to.
pub fn event_hash(
    event_id: u64,
    event_type: EventType,
    user_id: &str,
    action: &str,
    prev_hash: &str,
) -> String {
    let content = format!(
        "{event_id}|{}|{user_id}|{action}|{prev_hash}",
        event_type_str(event_type)
    );
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Why `verify_partition` rejected a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainFailure {
    /// The first event's `prev_hash` did not equal the partition's genesis hash.
    BadGenesis { event_id: u64 },
    /// A later event's `prev_hash` did not match the previous event's `self_hash`.
    BrokenLink { event_id: u64 },
    /// An event's `self_hash` did not recompute to the stored value.
    BadSelfHash { event_id: u64 },
}

/// Replay `events` (already ordered ascending by `event_id`, all from the
/// same partition) and confirm every hash and link recomputes correctly.
///
/// An empty slice is vacuously valid. Returns the first failure encountered,
/// identifying the offending `event_id`, per §8: "identifies the first event
/// whose recomputed self_hash no longer matches".
pub fn verify_partition(partition_date: NaiveDate, events: &[AuditEvent]) -> Result<(), ChainFailure> {
    let mut expected_prev = genesis_hash(partition_date);
    for (idx, event) in events.iter().enumerate() {
        if event.prev_hash != expected_prev {
            return Err(if idx == 0 {
                ChainFailure::BadGenesis { event_id: event.event_id }
            } else {
                ChainFailure::BrokenLink { event_id: event.event_id }
            });
        }
        let recomputed = event_hash(event.event_id, event.event_type, &event.user_id, &event.action, &event.prev_hash);
        if recomputed != event.self_hash {
            return Err(ChainFailure::BadSelfHash { event_id: event.event_id });
        }
        expected_prev = event.self_hash.clone();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn make_event(event_id: u64, action: &str, prev_hash: &str, date: NaiveDate) -> AuditEvent {
        let self_hash = event_hash(event_id, EventType::Query, "user-1", action, prev_hash);
        AuditEvent {
            event_id,
            partition_date: date,
            event_type: EventType::Query,
            user_id: "user-1".to_string(),
            request_id: "req-1".to_string(),
            action: action.to_string(),
            resource: None,
            details: json!({}),
            self_hash,
            prev_hash: prev_hash.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn verifies_a_clean_chain() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let e1 = make_event(1, "submit_query", &genesis_hash(date), date);
        let e2 = make_event(2, "workflow_complete", &e1.self_hash, date);
        assert!(verify_partition(date, &[e1, e2]).is_ok());
    }

    #[test]
    fn detects_tampered_action() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let e1 = make_event(1, "submit_query", &genesis_hash(date), date);
        let mut e2 = make_event(2, "workflow_complete", &e1.self_hash, date);
        let e3 = make_event(3, "read_back", &e2.self_hash, date);
        // Tamper the middle event's action without recomputing its hash.
        e2.action = "workflow_cancelled".to_string();
        let err = verify_partition(date, &[e1, e2, e3]).unwrap_err();
        assert_eq!(err, ChainFailure::BadSelfHash { event_id: 2 });
    }

    #[test]
    fn detects_bad_genesis() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let e1 = make_event(1, "submit_query", "not-the-genesis-hash", date);
        let err = verify_partition(date, &[e1]).unwrap_err();
        assert_eq!(err, ChainFailure::BadGenesis { event_id: 1 });
    }

    #[test]
    fn empty_partition_is_valid() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        assert!(verify_partition(date, &[]).is_ok());
    }
}
