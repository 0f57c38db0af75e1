//! # repurpose-repo
//!
//! Read/write contracts the workflow core depends on: the knowledge-graph
//! repository, the audit store, the literature client, the NER extractor,
//! the scoring model, and the synthesizer. Drivers and real network clients
//! live outside this crate and implement these traits; the core never names
//! a concrete backend.

pub mod audit_store;
pub mod extractor;
pub mod graph;
pub mod literature;
pub mod scorer;
pub mod synthesizer;

pub use audit_store::AuditStore;
pub use extractor::{ExtractedSpan, NerExtractor};
pub use graph::KnowledgeGraphRepository;
pub use literature::{Article, LiteratureClient};
pub use scorer::{RelationScore, Scorer};
pub use synthesizer::Synthesizer;
