//! In-memory, partition-locked implementation of `AuditStore` (§4.C).
//!
//! Each UTC-day partition gets its own `Mutex` so that two appenders writing
//! to different partitions never contend, while two appenders racing for
//! the same partition's `prev_hash` are serialized (§5: "Audit append is
//! serialized *per partition*").

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, RwLock};

use repurpose_domain::audit_event::AuditEvent;
use repurpose_domain::error::RepurposeResult;
use repurpose_repo::AuditStore;

use crate::chain::{event_hash, genesis_hash};

struct Partition {
    events: Vec<AuditEvent>,
    last_hash: String,
}

impl Partition {
    fn new(date: NaiveDate) -> Partition {
        Partition { events: Vec::new(), last_hash: genesis_hash(date) }
    }
}

/// The primary, in-process audit store. Production deployments back this
/// with a wide-column store; this implementation is the reference driver
/// used by tests, the demo CLI, and the target the file-backed fallback
/// steps in for when it is unavailable.
#[derive(Default)]
pub struct InMemoryAuditStore {
    partitions: RwLock<HashMap<NaiveDate, Arc<Mutex<Partition>>>>,
}

impl InMemoryAuditStore {
    pub fn new() -> InMemoryAuditStore {
        InMemoryAuditStore { partitions: RwLock::new(HashMap::new()) }
    }

    async fn partition_for(&self, date: NaiveDate) -> Arc<Mutex<Partition>> {
        if let Some(p) = self.partitions.read().await.get(&date) {
            return p.clone();
        }
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(date)
            .or_insert_with(|| Arc::new(Mutex::new(Partition::new(date))))
            .clone()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, mut event: AuditEvent) -> RepurposeResult<AuditEvent> {
        let partition = self.partition_for(event.partition_date).await;
        let mut guard = partition.lock().await;

        let event_id = guard.events.len() as u64 + 1;
        let prev_hash = guard.last_hash.clone();
        let self_hash = event_hash(event_id, event.event_type, &event.user_id, &event.action, &prev_hash);

        event.event_id = event_id;
        event.prev_hash = prev_hash;
        event.self_hash = self_hash.clone();
        if event.created_at.timestamp() == 0 {
            event.created_at = Utc::now();
        }

        guard.events.push(event.clone());
        guard.last_hash = self_hash;
        Ok(event)
    }

    async fn latest_hash(&self, partition: NaiveDate) -> RepurposeResult<String> {
        if let Some(p) = self.partitions.read().await.get(&partition) {
            Ok(p.lock().await.last_hash.clone())
        } else {
            Ok(genesis_hash(partition))
        }
    }

    async fn range(&self, partition: NaiveDate, from: u64, to: u64) -> RepurposeResult<Vec<AuditEvent>> {
        let partitions = self.partitions.read().await;
        let Some(p) = partitions.get(&partition) else {
            return Ok(Vec::new());
        };
        let guard = p.lock().await;
        Ok(guard
            .events
            .iter()
            .filter(|e| e.event_id >= from && e.event_id < to)
            .cloned()
            .collect())
    }

    async fn by_request(&self, request_id: &str) -> RepurposeResult<Vec<AuditEvent>> {
        let partitions = self.partitions.read().await;
        let mut matched = Vec::new();
        for p in partitions.values() {
            let guard = p.lock().await;
            matched.extend(guard.events.iter().filter(|e| e.request_id == request_id).cloned());
        }
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.event_id.cmp(&b.event_id)));
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repurpose_domain::audit_event::EventType;
    use serde_json::json;

    fn event(date: NaiveDate, request_id: &str, action: &str) -> AuditEvent {
        AuditEvent {
            event_id: 0,
            partition_date: date,
            event_type: EventType::Query,
            user_id: "user-1".to_string(),
            request_id: request_id.to_string(),
            action: action.to_string(),
            resource: None,
            details: json!({}),
            self_hash: String::new(),
            prev_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn first_event_chains_to_genesis() {
        let store = InMemoryAuditStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let stored = store.append(event(date, "req-1", "submit_query")).await.unwrap();
        assert_eq!(stored.event_id, 1);
        assert_eq!(stored.prev_hash, genesis_hash(date));
    }

    #[tokio::test]
    async fn successive_events_chain_correctly() {
        let store = InMemoryAuditStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let e1 = store.append(event(date, "req-1", "submit_query")).await.unwrap();
        let e2 = store.append(event(date, "req-1", "workflow_complete")).await.unwrap();
        assert_eq!(e2.prev_hash, e1.self_hash);
        assert_eq!(store.latest_hash(date).await.unwrap(), e2.self_hash);
    }

    #[tokio::test]
    async fn by_request_filters_across_partitions() {
        let store = InMemoryAuditStore::new();
        let d1 = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 7, 29).unwrap();
        store.append(event(d1, "req-1", "submit_query")).await.unwrap();
        store.append(event(d2, "req-1", "workflow_complete")).await.unwrap();
        store.append(event(d1, "req-2", "submit_query")).await.unwrap();
        let events = store.by_request("req-1").await.unwrap();
        assert_eq!(events.len(), 2);
    }
}
