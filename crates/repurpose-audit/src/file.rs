//! File-backed fallback audit store (§4.C, §6): one JSON line per event,
//! used when the primary wide-column store is unavailable.
//!
//! Partitions are one file per UTC day under a configured directory:
//! `{base_dir}/{partition_date}.jsonl`. Fallback entries carry the same
//! hash fields as primary entries and participate in the same chain
//! verification (§8).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, RwLock};

use repurpose_domain::audit_event::AuditEvent;
use repurpose_domain::error::{RepurposeError, RepurposeResult};
use repurpose_repo::AuditStore;

use crate::chain::{event_hash, genesis_hash};

struct FilePartition {
    last_hash: String,
    next_event_id: u64,
}

/// An append-only, newline-delimited-JSON audit store rooted at a directory
/// on disk. Every `FallbackAuditStore` wraps one of these as the store to
/// fall back onto when the primary is unavailable (§4.C).
pub struct FileAuditStore {
    base_dir: PathBuf,
    partitions: RwLock<HashMap<NaiveDate, Arc<Mutex<FilePartition>>>>,
}

impl FileAuditStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> FileAuditStore {
        FileAuditStore { base_dir: base_dir.into(), partitions: RwLock::new(HashMap::new()) }
    }

    fn partition_path(&self, date: NaiveDate) -> PathBuf {
        self.base_dir.join(format!("{date}.jsonl"))
    }

    /// Load (or lazily initialize) the cached chain-tip state for a partition
    /// by replaying its file, if one exists.
    async fn partition_for(&self, date: NaiveDate) -> RepurposeResult<Arc<Mutex<FilePartition>>> {
        if let Some(p) = self.partitions.read().await.get(&date) {
            return Ok(p.clone());
        }
        let events = self.read_partition_file(date).await?;
        let state = match events.last() {
            Some(last) => FilePartition { last_hash: last.self_hash.clone(), next_event_id: last.event_id + 1 },
            None => FilePartition { last_hash: genesis_hash(date), next_event_id: 1 },
        };
        let mut partitions = self.partitions.write().await;
        Ok(partitions
            .entry(date)
            .or_insert_with(|| Arc::new(Mutex::new(state)))
            .clone())
    }

    async fn read_partition_file(&self, date: NaiveDate) -> RepurposeResult<Vec<AuditEvent>> {
        let path = self.partition_path(date);
        let file = match fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(RepurposeError::RepositoryUnavailable {
                    repository: "audit_fallback_file".to_string(),
                    reason: format!("reading {}: {e}", path.display()),
                })
            }
        };
        let mut lines = BufReader::new(file).lines();
        let mut events = Vec::new();
        while let Some(line) = lines.next_line().await.map_err(|e| RepurposeError::RepositoryUnavailable {
            repository: "audit_fallback_file".to_string(),
            reason: e.to_string(),
        })? {
            if line.trim().is_empty() {
                continue;
            }
            let event: AuditEvent = serde_json::from_str(&line).map_err(|e| RepurposeError::RepositoryUnavailable {
                repository: "audit_fallback_file".to_string(),
                reason: format!("parsing {}: {e}", path.display()),
            })?;
            events.push(event);
        }
        Ok(events)
    }
}

#[async_trait]
impl AuditStore for FileAuditStore {
    async fn append(&self, mut event: AuditEvent) -> RepurposeResult<AuditEvent> {
        fs::create_dir_all(&self.base_dir).await.map_err(|e| RepurposeError::RepositoryUnavailable {
            repository: "audit_fallback_file".to_string(),
            reason: e.to_string(),
        })?;

        let partition = self.partition_for(event.partition_date).await?;
        let mut guard = partition.lock().await;

        let event_id = guard.next_event_id;
        let prev_hash = guard.last_hash.clone();
        let self_hash = event_hash(event_id, event.event_type, &event.user_id, &event.action, &prev_hash);

        event.event_id = event_id;
        event.prev_hash = prev_hash;
        event.self_hash = self_hash.clone();
        if event.created_at.timestamp() == 0 {
            event.created_at = Utc::now();
        }

        let line = serde_json::to_string(&event).map_err(|e| RepurposeError::RepositoryUnavailable {
            repository: "audit_fallback_file".to_string(),
            reason: e.to_string(),
        })?;

        let path = self.partition_path(event.partition_date);
        let mut file = OpenOptions::new().create(true).append(true).open(&path).await.map_err(|e| {
            RepurposeError::RepositoryUnavailable { repository: "audit_fallback_file".to_string(), reason: e.to_string() }
        })?;
        file.write_all(line.as_bytes()).await.map_err(|e| RepurposeError::RepositoryUnavailable {
            repository: "audit_fallback_file".to_string(),
            reason: e.to_string(),
        })?;
        file.write_all(b"\n").await.map_err(|e| RepurposeError::RepositoryUnavailable {
            repository: "audit_fallback_file".to_string(),
            reason: e.to_string(),
        })?;

        guard.next_event_id += 1;
        guard.last_hash = self_hash;
        Ok(event)
    }

    async fn latest_hash(&self, partition: NaiveDate) -> RepurposeResult<String> {
        let p = self.partition_for(partition).await?;
        Ok(p.lock().await.last_hash.clone())
    }

    async fn range(&self, partition: NaiveDate, from: u64, to: u64) -> RepurposeResult<Vec<AuditEvent>> {
        let events = self.read_partition_file(partition).await?;
        Ok(events.into_iter().filter(|e| e.event_id >= from && e.event_id < to).collect())
    }

    async fn by_request(&self, request_id: &str) -> RepurposeResult<Vec<AuditEvent>> {
        let mut matched = Vec::new();
        let mut entries = match fs::read_dir(&self.base_dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(RepurposeError::RepositoryUnavailable {
                    repository: "audit_fallback_file".to_string(),
                    reason: e.to_string(),
                })
            }
        };
        while let Some(entry) = entries.next_entry().await.map_err(|e| RepurposeError::RepositoryUnavailable {
            repository: "audit_fallback_file".to_string(),
            reason: e.to_string(),
        })? {
            if let Some(date) = partition_date_from_path(&entry.path()) {
                let events = self.read_partition_file(date).await?;
                matched.extend(events.into_iter().filter(|e| e.request_id == request_id));
            }
        }
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.event_id.cmp(&b.event_id)));
        Ok(matched)
    }
}

fn partition_date_from_path(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}
