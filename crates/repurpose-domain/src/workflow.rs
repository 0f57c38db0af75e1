//! The workflow state threaded through the six-stage pipeline.
//!
//! This replaces a loose mapping of optional keys with a single tagged
//! record: every stage's slot is an explicit `Option` field, and the stage
//! contracts (§4.G) declare exactly which fields they read and write.
//! Reading an absent required field is a programming error
//! (`RepurposeError::StageInputMissing`), never a silent `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::candidate::Candidate;
use crate::citation::Citation;
use crate::edge::Edge;
use crate::entity::Entity;
use crate::path::{PathwayPath, SimulationResult};
use crate::safety::SafetyVerdict;

/// The inbound query, validated and defaulted per §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: u32,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default)]
    pub include_experimental: bool,
}

fn default_max_candidates() -> u32 {
    10
}

fn default_min_confidence() -> f64 {
    0.5
}

impl QueryRequest {
    /// Validate the request body against the bounds declared in §6.
    /// Returns the offending field's name on failure.
    pub fn validate(&self) -> Result<(), String> {
        let len = self.query.chars().count();
        if !(3..=1000).contains(&len) {
            return Err("query".to_string());
        }
        if !(1..=50).contains(&self.max_candidates) {
            return Err("max_candidates".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err("min_confidence".to_string());
        }
        Ok(())
    }
}

/// Graph context preloaded by the orchestrator before the pipeline runs
/// (§4.H step 3). Empty when the hinted drug/disease pair is missing or the
/// store has nothing for it yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphContext {
    pub drug_targets: Vec<Edge>,
    pub disease_genes: Vec<Edge>,
    pub pathway_edges: Vec<Edge>,
    /// One-hop neighbor edges, keyed by the normalized entity name they
    /// were expanded from.
    pub neighbors: BTreeMap<String, Vec<Edge>>,
}

impl GraphContext {
    /// Number of pathway edges available for the hinted (drug, disease)
    /// pair — the quantity the orchestrator compares against the ingestion
    /// gap threshold (§4.E: "strictly fewer than 1 pathway edge").
    pub fn pathway_edge_count(&self) -> usize {
        self.pathway_edges.len()
    }
}

/// The name of one of the six pipeline stages, used in telemetry and
/// routing decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    EntityExtraction,
    Literature,
    PathwaySimulation,
    Reasoning,
    Ranking,
    Safety,
}

impl StageName {
    pub fn as_str(self) -> &'static str {
        match self {
            StageName::EntityExtraction => "entity_extraction",
            StageName::Literature => "literature",
            StageName::PathwaySimulation => "pathway_simulation",
            StageName::Reasoning => "reasoning",
            StageName::Ranking => "ranking",
            StageName::Safety => "safety",
        }
    }
}

/// Timing and identity record for one stage invocation, appended to
/// `stage_history` as the pipeline runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: StageName,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: i64,
}

/// The single mutable object threaded through the stage pipeline. Created
/// by the orchestrator, mutated exclusively by stage handlers, and treated
/// as immutable once the safety stage returns (§3 Lifecycles).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub query: QueryRequest,
    pub request_id: String,
    pub user_id: String,
    pub drug_hint: Option<String>,
    pub disease_hint: Option<String>,
    pub graph_context: GraphContext,

    pub extracted_entities: Option<Vec<Entity>>,
    pub literature_evidence: Option<Vec<crate::evidence::Evidence>>,
    pub literature_citations: Option<Vec<Citation>>,
    pub simulation_result: Option<SimulationResult>,
    pub mechanism_paths: Option<Vec<PathwayPath>>,
    pub drug_candidates: Option<Vec<Candidate>>,
    pub ranked_candidates: Option<Vec<Candidate>>,
    pub safety_result: Option<SafetyVerdict>,
    pub final_candidates: Option<Vec<Candidate>>,
    pub workflow_approved: Option<bool>,

    pub current_stage: Option<StageName>,
    pub stage_history: Vec<StageRecord>,
    pub errors: Vec<String>,
}

impl WorkflowState {
    pub fn new(query: QueryRequest, request_id: String, user_id: String) -> WorkflowState {
        WorkflowState {
            query,
            request_id,
            user_id,
            drug_hint: None,
            disease_hint: None,
            graph_context: GraphContext::default(),
            extracted_entities: None,
            literature_evidence: None,
            literature_citations: None,
            simulation_result: None,
            mechanism_paths: None,
            drug_candidates: None,
            ranked_candidates: None,
            safety_result: None,
            final_candidates: None,
            workflow_approved: None,
            current_stage: None,
            stage_history: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn stage_history_names(&self) -> Vec<&'static str> {
        self.stage_history.iter().map(|r| r.stage.as_str()).collect()
    }
}
