//! Stage 6: safety (§4.G item 6). Always runs; never raises — it is the
//! single place that decides whether a request's result is surfaced as
//! `approved` (§7). Reads the full, unranked candidate set so a candidate
//! the ranking stage filtered out for confidence still gets evaluated
//! here: the flags in §8 scenario 2 fire on a candidate that ranking had
//! already dropped.

use async_trait::async_trait;

use repurpose_domain::candidate::Candidate;
use repurpose_domain::cancellation::Cancellation;
use repurpose_domain::error::RepurposeResult;
use repurpose_domain::safety::{SafetyFlag, SafetySeverity, SafetyVerdict};
use repurpose_domain::workflow::{StageName, WorkflowState};

use crate::context::StageContext;
use crate::stage::Stage;

const CRITICAL_CONFIDENCE_THRESHOLD: f64 = 0.3;
const WARNING_CONFIDENCE_THRESHOLD: f64 = 0.5;

pub struct SafetyStage;

#[async_trait]
impl Stage for SafetyStage {
    fn name(&self) -> StageName {
        StageName::Safety
    }

    fn required_inputs(&self) -> &'static [&'static str] {
        &["query"]
    }

    fn produced_outputs(&self) -> &'static [&'static str] {
        &["safety_result", "final_candidates", "workflow_approved"]
    }

    async fn run(&self, _ctx: &StageContext, state: &mut WorkflowState, _cancel: &Cancellation) -> RepurposeResult<()> {
        let candidates = state.drug_candidates.clone().unwrap_or_default();
        let entities = state.extracted_entities.clone().unwrap_or_default();
        let literature_evidence = state.literature_evidence.clone().unwrap_or_default();
        let min_confidence = state.query.min_confidence;

        let mut flags: Vec<SafetyFlag> = Vec::new();
        let mut passing: Vec<bool> = Vec::with_capacity(candidates.len());

        for candidate in &candidates {
            let (candidate_flags, candidate_passes) = evaluate_candidate(candidate, min_confidence);
            flags.extend(candidate_flags);
            passing.push(candidate_passes);
        }

        if candidates.is_empty() {
            flags.push(flag("no_candidates", SafetySeverity::Warning, "no repurposing candidates were produced", None));
        }
        if entities.is_empty() {
            flags.push(flag("no_entities", SafetySeverity::Info, "no entities were extracted from the query", None));
        }
        if literature_evidence.is_empty() {
            flags.push(flag("no_literature_evidence", SafetySeverity::Info, "no literature evidence was retrieved", None));
        }

        let final_candidates: Vec<Candidate> =
            candidates.iter().zip(passing.iter()).filter(|(_, &passes)| passes).map(|(c, _)| c.clone()).collect();

        let min_confidence_seen = candidates.iter().map(|c| c.confidence).fold(f64::INFINITY, f64::min);
        let min_confidence_seen = if min_confidence_seen.is_finite() { min_confidence_seen } else { 0.0 };
        let total_citations: usize = candidates.iter().map(|c| c.citations.len()).sum();
        let citations_verified = !candidates.is_empty() && candidates.iter().all(|c| !c.citations.is_empty());

        let has_critical = flags.iter().any(|f| f.severity == SafetySeverity::Critical);
        let passed = !has_critical;
        let workflow_approved = passed && !final_candidates.is_empty();

        let verdict = SafetyVerdict {
            passed,
            requires_human_review: !workflow_approved,
            flags,
            min_confidence_seen,
            total_citations,
            schema_valid: true,
            content_safe: true,
            citations_verified,
        };

        state.safety_result = Some(verdict);
        state.final_candidates = Some(final_candidates);
        state.workflow_approved = Some(workflow_approved);
        Ok(())
    }
}

/// Evaluate one candidate's flags and whether it passes candidate-level
/// validation: no critical flag on it, and confidence at or above the
/// query's `min_confidence` (§3 invariant: "at least one candidate passed
/// candidate-level validation").
fn evaluate_candidate(candidate: &Candidate, min_confidence: f64) -> (Vec<SafetyFlag>, bool) {
    let mut flags = Vec::new();
    let field = Some(format!("candidate:{}", candidate.id));

    let mut critical = false;

    if candidate.confidence < CRITICAL_CONFIDENCE_THRESHOLD {
        flags.push(flag("confidence_too_low", SafetySeverity::Critical, "candidate confidence is below the minimum viable threshold", field.clone()));
        critical = true;
    } else if candidate.confidence < WARNING_CONFIDENCE_THRESHOLD {
        flags.push(flag("low_confidence", SafetySeverity::Warning, "candidate confidence is low", field.clone()));
    }

    if candidate.citations.is_empty() {
        flags.push(flag("insufficient_citations", SafetySeverity::Warning, "candidate has no supporting citations", field.clone()));
    }

    if candidate.mechanism_paths.is_empty() {
        flags.push(flag("no_mechanism_paths", SafetySeverity::Warning, "candidate has no mechanism paths", field.clone()));
    }

    if candidate.hypothesis.trim().is_empty() {
        flags.push(flag("empty_hypothesis", SafetySeverity::Critical, "candidate hypothesis is empty", field.clone()));
        critical = true;
    }

    if candidate.mechanism_summary.trim().is_empty() {
        flags.push(flag("empty_mechanism_summary", SafetySeverity::Warning, "candidate mechanism summary is empty", field));
    }

    let passes = !critical && candidate.confidence >= min_confidence;
    (flags, passes)
}

fn flag(kind: &str, severity: SafetySeverity, message: &str, affected_field: Option<String>) -> SafetyFlag {
    SafetyFlag {
        id: format!("flag:{kind}:{}", uuid::Uuid::new_v4()),
        kind: kind.to_string(),
        severity,
        message: message.to_string(),
        source_stage: Some(StageName::Safety.as_str().to_string()),
        affected_field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use repurpose_domain::entity::{Entity, EntityKind, ExtractionMethod};
    use repurpose_domain::workflow::QueryRequest;
    use repurpose_repo::{Article, LiteratureClient, NerExtractor, RelationScore, Scorer, Synthesizer};
    use serde_json::Value;
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
    struct NoopSynthesizer;
    #[async_trait]
    impl Synthesizer for NoopSynthesizer {
        async fn extract_entities(&self, _text: &str) -> RepurposeResult<Value> {
            Ok(serde_json::json!({}))
        }
        async fn generate_hypothesis(&self, _drug: &str, _disease: &str, _evidence_summaries: &[String]) -> RepurposeResult<Value> {
            Ok(serde_json::json!({}))
        }
        async fn explain_pathway(&self, _drug: &str, _disease: &str, _intermediate_nodes: &[String]) -> RepurposeResult<Value> {
            Ok(serde_json::json!({}))
        }
    }

    fn ctx() -> StageContext {
        StageContext { extractor: Arc::new(NoopNer), literature: Arc::new(NoopLiterature), scorer: Arc::new(NoopScorer), synthesizer: Arc::new(NoopSynthesizer), verifier: repurpose_verify::SchemaVerifier::new() }
    }

    fn candidate(confidence: f64, citations: usize, mechanism_paths: usize, hypothesis: &str) -> Candidate {
        Candidate {
            id: "cand:1".to_string(),
            drug: Entity::new("Metformin", EntityKind::Drug, ExtractionMethod::NerModel, 0.9, None, &[]).unwrap(),
            disease: Entity::new("Breast Cancer", EntityKind::Disease, ExtractionMethod::NerModel, 0.9, None, &[]).unwrap(),
            hypothesis: hypothesis.to_string(),
            mechanism_summary: "mechanism".to_string(),
            overall_score: confidence,
            confidence,
            novelty: 0.5,
            mechanism_paths: (0..mechanism_paths)
                .map(|i| repurpose_domain::path::PathwayPath {
                    id: format!("p{i}"),
                    edges: vec![],
                    aggregated_confidence: 0.5,
                    evidence_support: 0.0,
                    rationale: "r".to_string(),
                })
                .collect(),
            evidence: vec![],
            citations: (0..citations)
                .map(|i| repurpose_domain::citation::Citation {
                    source_kind: "pubmed".to_string(),
                    source_id: format!("{i}"),
                    title: "t".to_string(),
                    authors: vec![],
                    year: None,
                    url: None,
                    excerpt: None,
                    relevance: 0.5,
                })
                .collect(),
            rank: None,
        }
    }

    fn state_with(candidates: Vec<Candidate>, min_confidence: f64) -> WorkflowState {
        let mut state = WorkflowState::new(
            QueryRequest { query: "q".to_string(), max_candidates: 10, min_confidence, include_experimental: false },
            "req-1".to_string(),
            "user-1".to_string(),
        );
        state.drug_candidates = Some(candidates);
        state
    }

    /// A fully healthy candidate passes, yields no critical flags, and the
    /// workflow is approved.
    #[tokio::test]
    async fn healthy_candidate_is_approved() {
        let mut state = state_with(vec![candidate(0.9, 2, 1, "metformin may treat breast cancer")], 0.5);
        SafetyStage.run(&ctx(), &mut state, &Cancellation::new()).await.unwrap();

        let verdict = state.safety_result.unwrap();
        assert!(verdict.passed);
        assert!(state.workflow_approved.unwrap());
        assert_eq!(state.final_candidates.unwrap().len(), 1);
    }

    /// Confidence below 0.3 is a critical flag: the candidate is excluded
    /// from `final_candidates` and the workflow is not approved (§8 scenario 5).
    #[tokio::test]
    async fn very_low_confidence_is_critical_and_excluded() {
        let mut state = state_with(vec![candidate(0.25, 0, 1, "h")], 0.5);
        SafetyStage.run(&ctx(), &mut state, &Cancellation::new()).await.unwrap();

        let verdict = state.safety_result.unwrap();
        assert!(!verdict.passed);
        assert!(verdict.flags.iter().any(|f| f.kind == "confidence_too_low" && f.severity == SafetySeverity::Critical));
        assert!(verdict.flags.iter().any(|f| f.kind == "insufficient_citations"));
        assert!(state.final_candidates.unwrap().is_empty());
        assert!(!state.workflow_approved.unwrap());
    }

    /// A candidate at exactly the fallback score (0.3) below the query's
    /// min_confidence (0.5 default) only earns a warning, but still fails
    /// candidate-level validation and so is not approved (§8 scenario 2).
    #[tokio::test]
    async fn below_min_confidence_warns_but_does_not_approve() {
        let mut state = state_with(vec![candidate(0.3, 1, 0, "h")], 0.5);
        SafetyStage.run(&ctx(), &mut state, &Cancellation::new()).await.unwrap();

        let verdict = state.safety_result.unwrap();
        assert!(verdict.passed);
        assert!(verdict.flags.iter().any(|f| f.kind == "low_confidence" && f.severity == SafetySeverity::Warning));
        assert!(state.final_candidates.unwrap().is_empty());
        assert!(!state.workflow_approved.unwrap());
    }

    /// No candidates at all still produces a verdict with a warning, never
    /// an error (§8: "no code path yields a response without a safety verdict").
    #[tokio::test]
    async fn no_candidates_still_produces_a_verdict() {
        let mut state = state_with(vec![], 0.5);
        SafetyStage.run(&ctx(), &mut state, &Cancellation::new()).await.unwrap();

        let verdict = state.safety_result.unwrap();
        assert!(verdict.flags.iter().any(|f| f.kind == "no_candidates"));
        assert!(!state.workflow_approved.unwrap());
    }

    /// An empty hypothesis is critical regardless of confidence.
    #[tokio::test]
    async fn empty_hypothesis_is_critical() {
        let mut state = state_with(vec![candidate(0.9, 1, 1, "")], 0.5);
        SafetyStage.run(&ctx(), &mut state, &Cancellation::new()).await.unwrap();

        let verdict = state.safety_result.unwrap();
        assert!(!verdict.passed);
        assert!(verdict.flags.iter().any(|f| f.kind == "empty_hypothesis" && f.severity == SafetySeverity::Critical));
    }
}
