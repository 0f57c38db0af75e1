//! # repurpose-audit
//!
//! Append-only, partition-per-day, SHA-256 hash-chained audit trail (§4.C)
//! with a file-backed fallback for when the primary wide-column store is
//! unavailable.
//!
//! [`memory::InMemoryAuditStore`] is the primary reference implementation;
//! [`file::FileAuditStore`] is the JSON-lines fallback; [`fallback::FallbackAuditStore`]
//! composes the two behind the single `AuditStore` contract so the core
//! never special-cases which one is actually serving a request.

pub mod chain;
pub mod fallback;
pub mod file;
pub mod memory;

pub use chain::{event_hash, genesis_hash, verify_partition, ChainFailure};
pub use fallback::FallbackAuditStore;
pub use file::FileAuditStore;
pub use memory::InMemoryAuditStore;
