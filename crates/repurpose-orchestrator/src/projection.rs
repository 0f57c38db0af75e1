//! Response projections (§6): shaping a completed [`WorkflowState`] into the
//! read-back views external callers receive. The core owns the projection
//! logic; it does not own HTTP serialization or routing (§1 out of scope).

use serde::{Deserialize, Serialize};

use repurpose_domain::audit_event::AuditEvent;
use repurpose_domain::entity::{validate_name, DEFAULT_STOPWORDS};
use repurpose_domain::error::{RepurposeError, RepurposeResult};
use repurpose_domain::workflow::WorkflowState;

/// One projected entity, as surfaced in the submit-query response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityView {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub confidence: f64,
}

/// One projected evidence item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceView {
    pub id: String,
    pub description: String,
    pub kind: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One projected candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateView {
    pub id: String,
    pub drug: String,
    pub disease: String,
    pub hypothesis: String,
    pub mechanism_summary: String,
    pub overall_score: f64,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    pub evidence_count: usize,
    pub citations: Vec<String>,
}

/// The safety summary block of the submit-query response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyView {
    pub passed: bool,
    pub flags_count: usize,
    pub critical_count: usize,
    pub warnings: Vec<String>,
}

/// Status reported to the client. A cancelled or programming-error run
/// reaches this through [`QueryResponse::failed`]/`cancelled` rather than
/// `project`, since neither has a completed `WorkflowState` to project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Completed,
    Failed,
    Cancelled,
}

/// The full submit-query response shape (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query_id: String,
    pub status: QueryStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub entities: Vec<EntityView>,
    pub evidence_items: Vec<EvidenceView>,
    pub candidates: Vec<CandidateView>,
    pub safety: SafetyView,
    pub approved: bool,
    pub steps_completed: Vec<String>,
    pub errors: Vec<String>,
}

impl QueryResponse {
    /// Project a completed workflow state into the response the client sees
    /// (§2 control flow's final step, "response projection").
    pub fn project(state: &WorkflowState) -> QueryResponse {
        let entities = state
            .extracted_entities
            .as_ref()
            .map(|entities| {
                entities
                    .iter()
                    .map(|e| EntityView { id: e.id.clone(), name: e.canonical_name.clone(), kind: e.kind.as_str().to_string(), confidence: e.extraction_confidence })
                    .collect()
            })
            .unwrap_or_default();

        let evidence_items = state
            .literature_evidence
            .as_ref()
            .map(|items| {
                items
                    .iter()
                    .map(|ev| EvidenceView {
                        id: ev.id.clone(),
                        description: ev.description.clone(),
                        kind: ev.kind.as_str().to_string(),
                        confidence: ev.confidence,
                        source: ev.citation.as_ref().map(|c| c.source_id.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let candidate_source = state.final_candidates.as_ref().or(state.ranked_candidates.as_ref());
        let candidates = candidate_source
            .map(|cands| {
                cands
                    .iter()
                    .map(|c| CandidateView {
                        id: c.id.clone(),
                        drug: c.drug.canonical_name.clone(),
                        disease: c.disease.canonical_name.clone(),
                        hypothesis: c.hypothesis.clone(),
                        mechanism_summary: c.mechanism_summary.clone(),
                        overall_score: c.overall_score,
                        confidence: c.confidence,
                        rank: c.rank,
                        evidence_count: c.evidence_count(),
                        citations: c.citations.iter().map(|cit| cit.source_id.clone()).collect(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let safety = state
            .safety_result
            .as_ref()
            .map(|verdict| SafetyView {
                passed: verdict.passed,
                flags_count: verdict.flags.len(),
                critical_count: verdict.critical_count(),
                warnings: verdict.flags.iter().filter(|f| f.severity == repurpose_domain::safety::SafetySeverity::Warning).map(|f| f.message.clone()).collect(),
            })
            .unwrap_or(SafetyView { passed: false, flags_count: 0, critical_count: 0, warnings: Vec::new() });

        QueryResponse {
            query_id: state.request_id.clone(),
            status: QueryStatus::Completed,
            timestamp: chrono::Utc::now(),
            entities,
            evidence_items,
            candidates,
            safety,
            approved: state.workflow_approved.unwrap_or(false),
            steps_completed: state.stage_history_names().into_iter().map(|s| s.to_string()).collect(),
            errors: state.errors.clone(),
        }
    }

    /// A response for a request that never produced a `WorkflowState` —
    /// rejected at validation, or aborted with a programming error before
    /// the safety stage could run.
    pub fn failed(query_id: String, error: &RepurposeError) -> QueryResponse {
        QueryResponse {
            query_id,
            status: QueryStatus::Failed,
            timestamp: chrono::Utc::now(),
            entities: Vec::new(),
            evidence_items: Vec::new(),
            candidates: Vec::new(),
            safety: SafetyView { passed: false, flags_count: 0, critical_count: 0, warnings: Vec::new() },
            approved: false,
            steps_completed: Vec::new(),
            errors: vec![error.to_string()],
        }
    }

    /// A response for a request cancelled before or during the pipeline
    /// (§5: no partial result is committed to the read cache, but the
    /// client still needs a terminal status).
    pub fn cancelled(query_id: String, reason: &str) -> QueryResponse {
        QueryResponse {
            query_id,
            status: QueryStatus::Cancelled,
            timestamp: chrono::Utc::now(),
            entities: Vec::new(),
            evidence_items: Vec::new(),
            candidates: Vec::new(),
            safety: SafetyView { passed: false, flags_count: 0, critical_count: 0, warnings: Vec::new() },
            approved: false,
            steps_completed: Vec::new(),
            errors: vec![reason.to_string()],
        }
    }
}

/// One node in the read-back graph projection, keyed by normalized entity
/// name (not a store id — accepted paths carry display names, §4.F).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
}

/// One edge in the read-back graph projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdgeView {
    pub source: String,
    pub target: String,
    pub relation: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_id: Option<String>,
}

/// The `/reports/{id}/graph` projection: nodes and edges drawn exclusively
/// from the simulator's *accepted* paths (§6). Never includes rejected
/// paths, canonical preload edges outside an accepted path, or any label
/// that collides with a stopword or relation word.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphProjection {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdgeView>,
}

impl GraphProjection {
    /// Build the projection from a completed state's mechanism paths.
    ///
    /// §8 "Graph projection purity": every node label is checked against
    /// the same stopword/relation-word rule entity construction uses
    /// (§4.A); a label that fails is a contract violation this function
    /// refuses to project rather than silently drop, since an accepted
    /// path can only have gotten here through already-validated entities.
    pub fn build(state: &WorkflowState) -> RepurposeResult<GraphProjection> {
        let mut nodes = std::collections::BTreeMap::new();
        let mut edges = Vec::new();

        let paths = state.mechanism_paths.as_deref().unwrap_or(&[]);
        for path in paths {
            for hop in &path.edges {
                for label in [&hop.source_entity, &hop.target_entity] {
                    validate_name(label, DEFAULT_STOPWORDS).map_err(|_| RepurposeError::StageOutputMissing {
                        stage: "graph_projection".to_string(),
                        field: format!("node label '{label}' is a stopword or relation word"),
                    })?;
                    nodes.entry(label.clone()).or_insert_with(|| GraphNode { id: label.clone(), label: label.clone() });
                }
                // PathHop carries no citation id of its own (§3: citations
                // attach to the candidate/evidence level, not the hop).
                edges.push(GraphEdgeView {
                    source: hop.source_entity.clone(),
                    target: hop.target_entity.clone(),
                    relation: hop.relation.as_str().to_uppercase(),
                    confidence: hop.confidence,
                    citation_id: None,
                });
            }
        }

        Ok(GraphProjection { nodes: nodes.into_values().collect(), edges })
    }
}

/// The `/reports/{id}/citations` projection: every citation backing any
/// final candidate, deduped by identity.
pub fn project_citations(state: &WorkflowState) -> Vec<repurpose_domain::citation::Citation> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = Vec::new();
    let candidates = state.final_candidates.as_ref().or(state.ranked_candidates.as_ref());
    if let Some(candidates) = candidates {
        for candidate in candidates {
            for citation in &candidate.citations {
                let key = (citation.source_kind.clone(), citation.source_id.clone());
                if seen.insert(key) {
                    out.push(citation.clone());
                }
            }
        }
    }
    out
}

/// The `/reports/{id}/audit` projection: the request's audit trail, already
/// in append order (the store guarantees this, §4.C).
pub fn project_audit(events: Vec<AuditEvent>) -> Vec<AuditEvent> {
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use repurpose_domain::candidate::Candidate;
    use repurpose_domain::citation::Citation;
    use repurpose_domain::edge::RelationKind;
    use repurpose_domain::entity::{Entity, EntityKind, ExtractionMethod};
    use repurpose_domain::path::{PathHop, PathwayPath};
    use repurpose_domain::safety::{SafetyFlag, SafetySeverity, SafetyVerdict};
    use repurpose_domain::workflow::QueryRequest;

    fn base_state() -> WorkflowState {
        WorkflowState::new(
            QueryRequest { query: "Can metformin treat breast cancer?".to_string(), max_candidates: 10, min_confidence: 0.5, include_experimental: false },
            "req-1".to_string(),
            "user-1".to_string(),
        )
    }

    #[test]
    fn project_entities_and_safety_from_completed_state() {
        let mut state = base_state();
        let drug = Entity::new("metformin", EntityKind::Drug, ExtractionMethod::NerModel, 0.9, None, DEFAULT_STOPWORDS).unwrap();
        state.extracted_entities = Some(vec![drug.clone()]);
        state.safety_result = Some(SafetyVerdict {
            passed: true,
            requires_human_review: false,
            flags: vec![SafetyFlag { id: "f1".to_string(), kind: "no_literature_evidence".to_string(), severity: SafetySeverity::Info, message: "no evidence".to_string(), source_stage: None, affected_field: None }],
            min_confidence_seen: 0.8,
            total_citations: 0,
            schema_valid: true,
            content_safe: true,
            citations_verified: true,
        });
        state.workflow_approved = Some(true);
        state.stage_history = Vec::new();

        let response = QueryResponse::project(&state);
        assert_eq!(response.entities.len(), 1);
        assert_eq!(response.entities[0].name, "Metformin");
        assert!(response.approved);
        assert_eq!(response.safety.flags_count, 1);
        assert_eq!(response.safety.critical_count, 0);
    }

    #[test]
    fn graph_projection_dedupes_nodes_across_paths() {
        let mut state = base_state();
        let hop1 = PathHop { source_entity: "Metformin".to_string(), target_entity: "AMPK".to_string(), relation: RelationKind::Activates, confidence: 0.8 };
        let hop2 = PathHop { source_entity: "AMPK".to_string(), target_entity: "Breast Cancer".to_string(), relation: RelationKind::AssociatesWith, confidence: 0.6 };
        let path = PathwayPath { id: "p1".to_string(), edges: vec![hop1, hop2], aggregated_confidence: 0.5, evidence_support: 0.4, rationale: "r".to_string() };
        state.mechanism_paths = Some(vec![path]);

        let projection = GraphProjection::build(&state).unwrap();
        assert_eq!(projection.nodes.len(), 3);
        assert_eq!(projection.edges.len(), 2);
        assert_eq!(projection.edges[0].relation, "ACTIVATES");
    }

    #[test]
    fn graph_projection_rejects_stopword_labels() {
        let mut state = base_state();
        let hop = PathHop { source_entity: "With".to_string(), target_entity: "AMPK".to_string(), relation: RelationKind::Activates, confidence: 0.8 };
        let path = PathwayPath { id: "p1".to_string(), edges: vec![hop], aggregated_confidence: 0.5, evidence_support: 0.4, rationale: "r".to_string() };
        state.mechanism_paths = Some(vec![path]);

        assert!(GraphProjection::build(&state).is_err());
    }

    #[test]
    fn citations_projection_dedupes_by_identity() {
        let mut state = base_state();
        let drug = Entity::new("metformin", EntityKind::Drug, ExtractionMethod::NerModel, 0.9, None, DEFAULT_STOPWORDS).unwrap();
        let disease = Entity::new("breast cancer", EntityKind::Disease, ExtractionMethod::NerModel, 0.9, None, DEFAULT_STOPWORDS).unwrap();
        let citation = Citation { source_kind: "pubmed".to_string(), source_id: "30000001".to_string(), title: "t".to_string(), authors: vec![], year: None, url: None, excerpt: None, relevance: 0.8 };
        let candidate = Candidate {
            id: "c1".to_string(),
            drug,
            disease,
            hypothesis: "h".to_string(),
            mechanism_summary: "m".to_string(),
            overall_score: 0.7,
            confidence: 0.7,
            novelty: 0.5,
            mechanism_paths: vec![],
            evidence: vec![],
            citations: vec![citation.clone(), citation],
            rank: Some(1),
        };
        state.final_candidates = Some(vec![candidate]);

        let citations = project_citations(&state);
        assert_eq!(citations.len(), 1);
    }
}
