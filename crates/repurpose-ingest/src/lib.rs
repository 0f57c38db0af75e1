//! # repurpose-ingest
//!
//! On-demand knowledge-graph ingestion (§4.E). Triggered by the orchestrator
//! when the preloaded graph context has strictly fewer than one pathway edge
//! for a (drug, disease) pair — never from inside a stage handler.

mod pipeline;

pub use pipeline::IngestionPipeline;
