//! Mechanistic paths produced by the pathway simulator.

use serde::{Deserialize, Serialize};

use crate::edge::RelationKind;

/// One hop of a simulated path: a directed, typed step between two entities
/// identified by their normalized names (not graph-store ids — the
/// simulator operates on an in-memory graph built fresh per run, §4.F).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathHop {
    pub source_entity: String,
    pub target_entity: String,
    pub relation: RelationKind,
    pub confidence: f64,
}

/// An accepted path from a drug to a disease through zero or more
/// intermediate entities. `edges` is never empty — a path has length ≥ 1.
///
/// The path's source is `edges[0].source_entity`; its target is
/// `edges.last().target_entity`. Every hop must chain: `edges[i].target_entity
/// == edges[i + 1].source_entity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathwayPath {
    pub id: String,
    pub edges: Vec<PathHop>,
    pub aggregated_confidence: f64,
    pub evidence_support: f64,
    pub rationale: String,
}

impl PathwayPath {
    pub fn source_entity(&self) -> Option<&str> {
        self.edges.first().map(|e| e.source_entity.as_str())
    }

    pub fn target_entity(&self) -> Option<&str> {
        self.edges.last().map(|e| e.target_entity.as_str())
    }

    /// True when every consecutive pair of hops chains correctly (§3
    /// invariant: "every path's edges form a chain").
    pub fn is_chained(&self) -> bool {
        self.edges
            .windows(2)
            .all(|pair| pair[0].target_entity == pair[1].source_entity)
    }
}

/// A path the simulator evaluated but rejected because its final confidence
/// fell below the acceptance threshold, or because the simulation could not
/// even start (no drug/disease entity present).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedPath {
    pub description: String,
    pub final_confidence: f64,
    pub reason: String,
}

/// The full output of one pathway-simulator run (§4.F): every path the BFS
/// accepted, every path it rejected, and the aggregate plausibility over the
/// top accepted paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub drug_name: Option<String>,
    pub disease_name: Option<String>,
    pub accepted_paths: Vec<PathwayPath>,
    pub rejected_paths: Vec<RejectedPath>,
    pub overall_plausibility: f64,
}

impl SimulationResult {
    pub fn has_valid_paths(&self) -> bool {
        !self.accepted_paths.is_empty()
    }
}
