//! # repurpose-graph
//!
//! An in-memory property-graph store implementing `KnowledgeGraphRepository`
//! (§4.B, §4.D). Entities are keyed by their derived or curated id; edges are
//! keyed by the (source, target, relation) identity triple and merged on
//! upsert rather than duplicated.
//!
//! This is the reference implementation used by the orchestrator's default
//! wiring and by tests; a production deployment would swap in a real graph
//! database behind the same trait.

pub mod store;

pub use store::InMemoryGraphStore;
