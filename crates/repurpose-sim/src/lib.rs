//! # repurpose-sim
//!
//! The pathway simulator (§4.F): builds a fresh in-memory directed graph from
//! a request's extracted entities, supporting evidence, and preloaded graph
//! context, then runs a bounded BFS from drug to disease with confidence
//! propagation. CPU-only — never suspends, never touches a repository.

mod graph;
mod simulate;

pub use simulate::simulate_pathways;
