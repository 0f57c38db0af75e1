//! Stage 4: reasoning (§4.G item 4).
//!
//! Builds exactly one candidate for the first drug / first disease pair
//! found among the extracted entities. When the simulator produced valid
//! paths, the candidate carries them directly — `PathwayPath`/`PathHop`
//! already describe entity-level hops, so no intermediate node-graph
//! conversion is needed here. Otherwise a fallback candidate is built with a
//! fixed, conservative score and no mechanism paths.

use async_trait::async_trait;
use serde_json::Value;

use repurpose_domain::candidate::Candidate;
use repurpose_domain::cancellation::Cancellation;
use repurpose_domain::citation::Citation;
use repurpose_domain::entity::{Entity, EntityKind};
use repurpose_domain::error::{RepurposeError, RepurposeResult};
use repurpose_domain::evidence::Evidence;
use repurpose_domain::path::PathwayPath;
use repurpose_domain::verify::{OutputSchema, VerificationRule, VerificationRuleType};
use repurpose_domain::workflow::{StageName, WorkflowState};

use crate::context::{self, StageContext};
use crate::stage::Stage;

const MAX_MECHANISM_PATHS: usize = 3;
const MAX_EVIDENCE: usize = 5;
const MAX_CITATIONS: usize = 5;
const FALLBACK_SCORE: f64 = 0.3;
const FALLBACK_NOVELTY: f64 = 0.5;
const DEFAULT_NOVELTY: f64 = 0.6;
const EVIDENCE_SCORE_CAP: f64 = 0.4;
const EVIDENCE_SCORE_DIVISOR: f64 = 20.0;
const SIMULATION_WEIGHT: f64 = 0.6;

pub struct ReasoningStage;

#[async_trait]
impl Stage for ReasoningStage {
    fn name(&self) -> StageName {
        StageName::Reasoning
    }

    fn required_inputs(&self) -> &'static [&'static str] {
        &["extracted_entities"]
    }

    fn produced_outputs(&self) -> &'static [&'static str] {
        &["mechanism_paths", "drug_candidates"]
    }

    async fn run(&self, ctx: &StageContext, state: &mut WorkflowState, _cancel: &Cancellation) -> RepurposeResult<()> {
        let entities = state.extracted_entities.clone().ok_or_else(|| RepurposeError::StageInputMissing {
            stage: self.name().as_str().to_string(),
            field: "extracted_entities".to_string(),
        })?;

        let drug = entities.iter().find(|e| e.kind == EntityKind::Drug).cloned();
        let disease = entities.iter().find(|e| e.kind == EntityKind::Disease).cloned();

        let (drug, disease) = match (drug, disease) {
            (Some(d), Some(dis)) => (d, dis),
            _ => {
                state.mechanism_paths = Some(vec![]);
                state.drug_candidates = Some(vec![]);
                return Ok(());
            }
        };

        let evidence = state.literature_evidence.clone().unwrap_or_default();
        let citations = state.literature_citations.clone().unwrap_or_default();
        let simulation = state.simulation_result.clone();

        let candidate = if let Some(sim) = simulation.as_ref().filter(|s| s.has_valid_paths()) {
            candidate_from_simulation(ctx, state, &drug, &disease, sim.accepted_paths.clone(), &evidence, &citations).await
        } else {
            fallback_candidate(ctx, state, &drug, &disease, &evidence, &citations).await
        };

        state.mechanism_paths = Some(candidate.mechanism_paths.clone());
        state.drug_candidates = Some(vec![candidate]);
        Ok(())
    }
}

async fn candidate_from_simulation(
    ctx: &StageContext,
    state: &mut WorkflowState,
    drug: &Entity,
    disease: &Entity,
    mut paths: Vec<PathwayPath>,
    evidence: &[Evidence],
    citations: &[Citation],
) -> Candidate {
    paths.truncate(MAX_MECHANISM_PATHS);
    let sim = state.simulation_result.as_ref().map(|s| s.overall_plausibility).unwrap_or(0.0);
    let evidence_term = (evidence.len() as f64 / EVIDENCE_SCORE_DIVISOR).min(EVIDENCE_SCORE_CAP);
    let overall_score = (sim * SIMULATION_WEIGHT + evidence_term).min(1.0);

    let mut rationales: Vec<String> = paths.iter().take(3).map(|p| p.rationale.clone()).collect();
    let mut summaries: Vec<String> = evidence.iter().take(MAX_EVIDENCE).map(|e| Citation::truncate(&e.description, 200)).collect();
    summaries.append(&mut rationales);

    let (hypothesis, mechanism_summary, synth_confidence) = generate_hypothesis(ctx, state, &drug.canonical_name, &disease.canonical_name, &summaries).await;
    let confidence = synth_confidence.unwrap_or(sim).min(overall_score);

    Candidate {
        id: format!("cand:{}:{}", drug.id, disease.id),
        drug: drug.clone(),
        disease: disease.clone(),
        hypothesis,
        mechanism_summary,
        overall_score,
        confidence,
        novelty: DEFAULT_NOVELTY,
        mechanism_paths: paths,
        evidence: evidence.iter().take(MAX_EVIDENCE).cloned().collect(),
        citations: citations.iter().take(MAX_CITATIONS).cloned().collect(),
        rank: None,
    }
}

async fn fallback_candidate(
    ctx: &StageContext,
    state: &mut WorkflowState,
    drug: &Entity,
    disease: &Entity,
    evidence: &[Evidence],
    citations: &[Citation],
) -> Candidate {
    let summaries: Vec<String> = evidence.iter().take(MAX_EVIDENCE).map(|e| Citation::truncate(&e.description, 200)).collect();
    let (hypothesis, mechanism_summary, synth_confidence) = generate_hypothesis(ctx, state, &drug.canonical_name, &disease.canonical_name, &summaries).await;

    let hypothesis = if hypothesis.trim().is_empty() { format!("{} may have potential for {}.", drug.canonical_name, disease.canonical_name) } else { hypothesis };
    let mechanism_summary = if mechanism_summary.trim().is_empty() { "Mechanism requires further investigation.".to_string() } else { mechanism_summary };
    let confidence = synth_confidence.unwrap_or(FALLBACK_SCORE).min(FALLBACK_SCORE);

    Candidate {
        id: format!("cand:{}:{}", drug.id, disease.id),
        drug: drug.clone(),
        disease: disease.clone(),
        hypothesis,
        mechanism_summary,
        overall_score: FALLBACK_SCORE,
        confidence,
        novelty: FALLBACK_NOVELTY,
        mechanism_paths: vec![],
        evidence: evidence.iter().take(MAX_EVIDENCE).cloned().collect(),
        citations: citations.iter().take(MAX_CITATIONS).cloned().collect(),
        rank: None,
    }
}

async fn generate_hypothesis(ctx: &StageContext, state: &mut WorkflowState, drug: &str, disease: &str, evidence_summaries: &[String]) -> (String, String, Option<f64>) {
    match context::call_with_timeout("synthesizer", context::SYNTHESIZER_TIMEOUT, ctx.synthesizer.generate_hypothesis(drug, disease, evidence_summaries)).await {
        Ok(payload) => {
            let report = ctx.verifier.verify(&payload, &hypothesis_schema());
            if !report.passed {
                state.errors.push(format!("reasoning: synthesizer hypothesis payload failed verification: {:?}", report.failures));
                return (String::new(), String::new(), None);
            }
            let hypothesis = payload.get("hypothesis").and_then(|v| v.as_str()).unwrap_or("").to_string();
            let mechanism_summary = payload.get("mechanism_summary").and_then(|v| v.as_str()).unwrap_or("").to_string();
            let confidence = payload.get("confidence").and_then(|v| v.as_f64()).map(|c| c.clamp(0.0, 1.0));
            (hypothesis, mechanism_summary, confidence)
        }
        Err(e) => {
            state.errors.push(e.to_string());
            (String::new(), String::new(), None)
        }
    }
}

fn hypothesis_schema() -> OutputSchema {
    OutputSchema {
        schema_id: "synthesizer-generate-hypothesis-v1".to_string(),
        json_schema: Value::Null,
        rules: vec![VerificationRule {
            rule_id: "hypothesis-present".to_string(),
            description: "generate_hypothesis payload must carry a 'hypothesis' field".to_string(),
            rule_type: VerificationRuleType::RequiredField { field_path: "hypothesis".to_string() },
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repurpose_domain::entity::ExtractionMethod;
    use repurpose_domain::path::{PathHop, SimulationResult};
    use repurpose_domain::workflow::QueryRequest;
    use repurpose_repo::{Article, LiteratureClient, NerExtractor, RelationScore, Scorer, Synthesizer};
    use std::sync::Arc;

    struct NoopNer;
    #[async_trait]
    impl NerExtractor for NoopNer {
        async fn extract(&self, _text: &str) -> RepurposeResult<Vec<repurpose_repo::ExtractedSpan>> {
            Ok(vec![])
        }
    }
    struct NoopLiterature;
    #[async_trait]
    impl LiteratureClient for NoopLiterature {
        async fn search(&self, _q: &str, _m: usize) -> RepurposeResult<Vec<String>> {
            Ok(vec![])
        }
        async fn fetch(&self, _ids: &[String]) -> RepurposeResult<Vec<Article>> {
            Ok(vec![])
        }
    }
    struct NoopScorer;
    #[async_trait]
    impl Scorer for NoopScorer {
        async fn score_relation(&self, _d: &str, _t: &str, _dis: &str, _c: Option<&str>) -> RepurposeResult<RelationScore> {
            Ok(RelationScore { drug_target_score: 0.0, target_disease_score: 0.0, drug_disease_score: 0.0, aggregate: 0.0 })
        }
        async fn score_evidence(&self, _text: &str, _hypothesis: &str) -> RepurposeResult<f64> {
            Ok(0.0)
        }
    }
    struct FixedSynthesizer(Value);
    #[async_trait]
    impl Synthesizer for FixedSynthesizer {
        async fn extract_entities(&self, _text: &str) -> RepurposeResult<Value> {
            Ok(serde_json::json!({}))
        }
        async fn generate_hypothesis(&self, _drug: &str, _disease: &str, _evidence_summaries: &[String]) -> RepurposeResult<Value> {
            Ok(self.0.clone())
        }
        async fn explain_pathway(&self, _drug: &str, _disease: &str, _intermediate_nodes: &[String]) -> RepurposeResult<Value> {
            Ok(serde_json::json!({}))
        }
    }

    fn ctx_with(synthesizer: Arc<dyn Synthesizer>) -> StageContext {
        StageContext { extractor: Arc::new(NoopNer), literature: Arc::new(NoopLiterature), scorer: Arc::new(NoopScorer), synthesizer, verifier: repurpose_verify::SchemaVerifier::new() }
    }

    fn entity(name: &str, kind: EntityKind) -> Entity {
        Entity::new(name, kind, ExtractionMethod::NerModel, 0.9, None, &[]).unwrap()
    }

    fn state_with(entities: Vec<Entity>) -> WorkflowState {
        let mut state = WorkflowState::new(
            QueryRequest { query: "q".to_string(), max_candidates: 10, min_confidence: 0.5, include_experimental: false },
            "req-1".to_string(),
            "user-1".to_string(),
        );
        state.extracted_entities = Some(entities);
        state
    }

    /// With no disease entity present, no candidate is built at all.
    #[tokio::test]
    async fn missing_pair_produces_no_candidates() {
        let mut state = state_with(vec![entity("metformin", EntityKind::Drug)]);
        let ctx = ctx_with(Arc::new(FixedSynthesizer(serde_json::json!({"hypothesis": "x", "mechanism_summary": "y"}))));

        ReasoningStage.run(&ctx, &mut state, &Cancellation::new()).await.unwrap();

        assert!(state.drug_candidates.unwrap().is_empty());
    }

    /// A valid simulation produces a candidate whose mechanism paths are
    /// the simulator's accepted paths directly, with confidence clamped to
    /// overall_score.
    #[tokio::test]
    async fn valid_simulation_yields_candidate_with_clamped_confidence() {
        let mut state = state_with(vec![entity("metformin", EntityKind::Drug), entity("breast cancer", EntityKind::Disease)]);
        state.simulation_result = Some(SimulationResult {
            drug_name: Some("Metformin".to_string()),
            disease_name: Some("Breast Cancer".to_string()),
            accepted_paths: vec![PathwayPath {
                id: "p1".to_string(),
                edges: vec![PathHop {
                    source_entity: "Metformin".to_string(),
                    target_entity: "Breast Cancer".to_string(),
                    relation: repurpose_domain::edge::RelationKind::Treats,
                    confidence: 0.9,
                }],
                aggregated_confidence: 0.9,
                evidence_support: 0.0,
                rationale: "direct treats edge".to_string(),
            }],
            rejected_paths: vec![],
            overall_plausibility: 0.95,
        });
        let ctx = ctx_with(Arc::new(FixedSynthesizer(serde_json::json!({"hypothesis": "h", "mechanism_summary": "m", "confidence": 0.99}))));

        ReasoningStage.run(&ctx, &mut state, &Cancellation::new()).await.unwrap();

        let candidates = state.drug_candidates.unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].confidence_within_score());
        assert_eq!(state.mechanism_paths.unwrap().len(), 1);
    }

    /// Without valid simulation paths, a conservative fallback candidate is
    /// built with no mechanism paths.
    #[tokio::test]
    async fn no_valid_paths_yields_fallback_candidate() {
        let mut state = state_with(vec![entity("metformin", EntityKind::Drug), entity("breast cancer", EntityKind::Disease)]);
        let ctx = ctx_with(Arc::new(FixedSynthesizer(serde_json::json!({}))));

        ReasoningStage.run(&ctx, &mut state, &Cancellation::new()).await.unwrap();

        let candidates = state.drug_candidates.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].overall_score, FALLBACK_SCORE);
        assert!(candidates[0].mechanism_paths.is_empty());
        assert!(candidates[0].hypothesis.contains("may have potential for"));
    }
}
