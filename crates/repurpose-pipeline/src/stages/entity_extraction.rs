//! Stage 1: entity extraction (§4.G item 1).
//!
//! Runs the NER extractor first, then the synthesizer as a fallback for
//! types the NER missed, deduping by normalized name. Each repository call
//! degrades locally on failure rather than aborting the stage — an entity
//! extraction stage that found nothing still produces an (empty) output.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use repurpose_domain::cancellation::Cancellation;
use repurpose_domain::entity::{normalize_name, validate_name, Entity, EntityKind, ExtractionMethod, DEFAULT_STOPWORDS};
use repurpose_domain::error::RepurposeResult;
use repurpose_domain::verify::{OutputSchema, VerificationRule, VerificationRuleType};
use repurpose_domain::workflow::{StageName, WorkflowState};

use crate::context::{self, StageContext};
use crate::stage::Stage;

pub struct EntityExtractionStage;

#[async_trait]
impl Stage for EntityExtractionStage {
    fn name(&self) -> StageName {
        StageName::EntityExtraction
    }

    fn required_inputs(&self) -> &'static [&'static str] {
        &["query"]
    }

    fn produced_outputs(&self) -> &'static [&'static str] {
        &["extracted_entities"]
    }

    async fn run(&self, ctx: &StageContext, state: &mut WorkflowState, _cancel: &Cancellation) -> RepurposeResult<()> {
        let text = state.query.query.clone();
        let mut entities: Vec<Entity> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        match context::call_with_timeout("ner_extractor", context::NER_TIMEOUT, ctx.extractor.extract(&text)).await {
            Ok(spans) => {
                for span in spans {
                    let normalized = normalize_name(&span.text, span.kind);
                    if validate_name(&normalized, DEFAULT_STOPWORDS).is_err() {
                        continue;
                    }
                    if !seen.insert(normalized.to_lowercase()) {
                        continue;
                    }
                    if let Ok(entity) = Entity::new(&normalized, span.kind, ExtractionMethod::NerModel, span.confidence, None, DEFAULT_STOPWORDS) {
                        entities.push(entity);
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "entity_extraction: NER extractor unavailable, falling through to synthesizer");
                state.errors.push(e.to_string());
            }
        }

        match context::call_with_timeout("synthesizer", context::SYNTHESIZER_TIMEOUT, ctx.synthesizer.extract_entities(&text)).await {
            Ok(payload) => {
                let report = ctx.verifier.verify(&payload, &synthesizer_entities_schema());
                if !report.passed {
                    debug!(failures = ?report.failures, "entity_extraction: synthesizer payload failed verification");
                } else {
                    for (normalized, kind, confidence) in parse_synthesizer_entities(&payload) {
                        let key = normalized.to_lowercase();
                        if seen.contains(&key) {
                            continue;
                        }
                        if validate_name(&normalized, DEFAULT_STOPWORDS).is_err() {
                            continue;
                        }
                        if let Ok(entity) = Entity::new(&normalized, kind, ExtractionMethod::Synthesizer, confidence, None, DEFAULT_STOPWORDS) {
                            seen.insert(key);
                            entities.push(entity);
                        }
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, "entity_extraction: synthesizer fallback unavailable");
                state.errors.push(e.to_string());
            }
        }

        state.extracted_entities = Some(entities);
        Ok(())
    }
}

fn synthesizer_entities_schema() -> OutputSchema {
    OutputSchema {
        schema_id: "synthesizer-extract-entities-v1".to_string(),
        json_schema: Value::Null,
        rules: vec![VerificationRule {
            rule_id: "entities-present".to_string(),
            description: "extract_entities payload must carry an 'entities' field".to_string(),
            rule_type: VerificationRuleType::RequiredField { field_path: "entities".to_string() },
        }],
    }
}

fn parse_synthesizer_entities(payload: &Value) -> Vec<(String, EntityKind, f64)> {
    let mut out = Vec::new();
    let Some(items) = payload.get("entities").and_then(|v| v.as_array()) else {
        return out;
    };
    for item in items {
        let Some(text) = item.get("text").and_then(|v| v.as_str()) else { continue };
        let Some(kind_str) = item.get("kind").and_then(|v| v.as_str()) else { continue };
        let Some(kind) = EntityKind::from_str_loose(kind_str) else { continue };
        let confidence = item.get("confidence").and_then(|v| v.as_f64()).unwrap_or(0.5).clamp(0.0, 1.0);
        out.push((normalize_name(text, kind), kind, confidence));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use repurpose_domain::error::RepurposeError;
    use repurpose_repo::{ExtractedSpan, LiteratureClient, Scorer, Synthesizer};
    use repurpose_repo::{Article, RelationScore};
    use std::sync::Arc;

    struct FixedNer(Vec<ExtractedSpan>);

    #[async_trait]
    impl repurpose_repo::NerExtractor for FixedNer {
        async fn extract(&self, _text: &str) -> RepurposeResult<Vec<ExtractedSpan>> {
            Ok(self.0.clone())
        }
    }

    struct FailingNer;

    #[async_trait]
    impl repurpose_repo::NerExtractor for FailingNer {
        async fn extract(&self, _text: &str) -> RepurposeResult<Vec<ExtractedSpan>> {
            Err(RepurposeError::RepositoryUnavailable { repository: "ner".to_string(), reason: "down".to_string() })
        }
    }

    struct FixedSynthesizer(Value);

    #[async_trait]
    impl Synthesizer for FixedSynthesizer {
        async fn extract_entities(&self, _text: &str) -> RepurposeResult<Value> {
            Ok(self.0.clone())
        }
        async fn generate_hypothesis(&self, _drug: &str, _disease: &str, _evidence_summaries: &[String]) -> RepurposeResult<Value> {
            Ok(serde_json::json!({}))
        }
        async fn explain_pathway(&self, _drug: &str, _disease: &str, _intermediate_nodes: &[String]) -> RepurposeResult<Value> {
            Ok(serde_json::json!({}))
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

    fn ctx_with(extractor: Arc<dyn repurpose_repo::NerExtractor>, synthesizer: Arc<dyn Synthesizer>) -> StageContext {
        StageContext {
            extractor,
            literature: Arc::new(NoopLiterature),
            scorer: Arc::new(NoopScorer),
            synthesizer,
            verifier: repurpose_verify::SchemaVerifier::new(),
        }
    }

    fn state() -> WorkflowState {
        WorkflowState::new(
            repurpose_domain::workflow::QueryRequest { query: "Can metformin treat breast cancer?".to_string(), max_candidates: 10, min_confidence: 0.5, include_experimental: false },
            "req-1".to_string(),
            "user-1".to_string(),
        )
    }

    /// NER and synthesizer results are merged, deduped case-insensitively by
    /// normalized name.
    #[tokio::test]
    async fn dedupes_across_ner_and_synthesizer_by_normalized_name() {
        let ner = Arc::new(FixedNer(vec![ExtractedSpan { text: "metformin".to_string(), kind: EntityKind::Drug, confidence: 0.9 }]));
        let synthesizer = Arc::new(FixedSynthesizer(serde_json::json!({
            "entities": [
                {"text": "Metformin", "kind": "drug", "confidence": 0.5},
                {"text": "breast cancer", "kind": "disease", "confidence": 0.8}
            ]
        })));
        let ctx = ctx_with(ner, synthesizer);
        let mut state = state();

        EntityExtractionStage.run(&ctx, &mut state, &Cancellation::new()).await.unwrap();

        let entities = state.extracted_entities.unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities.iter().filter(|e| e.canonical_name == "Metformin").count(), 1);
    }

    /// A failing NER extractor degrades to synthesizer-only output instead
    /// of aborting the stage.
    #[tokio::test]
    async fn ner_failure_degrades_to_synthesizer_only() {
        let synthesizer = Arc::new(FixedSynthesizer(serde_json::json!({
            "entities": [{"text": "Metformin", "kind": "drug", "confidence": 0.7}]
        })));
        let ctx = ctx_with(Arc::new(FailingNer), synthesizer);
        let mut state = state();

        EntityExtractionStage.run(&ctx, &mut state, &Cancellation::new()).await.unwrap();

        assert_eq!(state.extracted_entities.unwrap().len(), 1);
        assert_eq!(state.errors.len(), 1);
    }

    /// A synthesizer payload missing the declared `entities` field fails
    /// verification and contributes nothing, without aborting the stage.
    #[tokio::test]
    async fn malformed_synthesizer_payload_is_ignored() {
        let ctx = ctx_with(Arc::new(FixedNer(vec![])), Arc::new(FixedSynthesizer(serde_json::json!({"oops": true}))));
        let mut state = state();

        EntityExtractionStage.run(&ctx, &mut state, &Cancellation::new()).await.unwrap();

        assert!(state.extracted_entities.unwrap().is_empty());
    }
}
