//! Stage 2: literature retrieval and evidence scoring (§4.G item 2).
//!
//! For every drug×disease pair, searches and fetches up to 5 articles; if no
//! pair produced evidence, falls back to the first 3 entities individually
//! with a cap of 3 articles each. Each evidence item's confidence blends a
//! deterministic keyword-match relevance (40%) with the scorer's semantic
//! relation score (60%) when the scorer is available.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use repurpose_domain::cancellation::Cancellation;
use repurpose_domain::citation::Citation;
use repurpose_domain::entity::EntityKind;
use repurpose_domain::error::{RepurposeError, RepurposeResult};
use repurpose_domain::evidence::{Evidence, EvidenceKind};
use repurpose_domain::workflow::{StageName, WorkflowState};

use crate::context::{self, StageContext};
use crate::stage::Stage;

const PAIR_MAX_RESULTS: usize = 5;
const FALLBACK_MAX_RESULTS: usize = 3;
const FALLBACK_ENTITY_CAP: usize = 3;
const SCORER_WEIGHT: f64 = 0.6;
const KEYWORD_WEIGHT: f64 = 0.4;

pub struct LiteratureStage;

#[async_trait]
impl Stage for LiteratureStage {
    fn name(&self) -> StageName {
        StageName::Literature
    }

    fn required_inputs(&self) -> &'static [&'static str] {
        &["query", "extracted_entities"]
    }

    fn produced_outputs(&self) -> &'static [&'static str] {
        &["literature_evidence", "literature_citations"]
    }

    async fn run(&self, ctx: &StageContext, state: &mut WorkflowState, cancel: &Cancellation) -> RepurposeResult<()> {
        let entities = state.extracted_entities.clone().ok_or_else(|| RepurposeError::StageInputMissing {
            stage: self.name().as_str().to_string(),
            field: "extracted_entities".to_string(),
        })?;

        let drugs: Vec<_> = entities.iter().filter(|e| e.kind == EntityKind::Drug).collect();
        let diseases: Vec<_> = entities.iter().filter(|e| e.kind == EntityKind::Disease).collect();

        let mut evidence: Vec<Evidence> = Vec::new();
        let mut citations: Vec<Citation> = Vec::new();

        'pairs: for drug in &drugs {
            for disease in &diseases {
                if cancel.is_cancelled() {
                    break 'pairs;
                }
                search_and_score(ctx, state, &mut evidence, &mut citations, &[&drug.canonical_name, &disease.canonical_name], PAIR_MAX_RESULTS).await;
            }
        }

        if evidence.is_empty() {
            for entity in entities.iter().take(FALLBACK_ENTITY_CAP) {
                if cancel.is_cancelled() {
                    break;
                }
                search_and_score(ctx, state, &mut evidence, &mut citations, &[&entity.canonical_name], FALLBACK_MAX_RESULTS).await;
            }
        }

        evidence.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());

        let mut seen_ids: HashSet<String> = HashSet::new();
        citations.retain(|c| seen_ids.insert(c.source_id.clone()));

        state.literature_evidence = Some(evidence);
        state.literature_citations = Some(citations);
        Ok(())
    }
}

async fn search_and_score(
    ctx: &StageContext,
    state: &mut WorkflowState,
    evidence: &mut Vec<Evidence>,
    citations: &mut Vec<Citation>,
    terms: &[&String],
    max_results: usize,
) {
    let query_terms = terms.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(" AND ");
    let ids = match context::call_with_timeout("literature", context::LITERATURE_TIMEOUT, ctx.literature.search(&query_terms, max_results)).await {
        Ok(ids) => ids,
        Err(e) => {
            debug!(error = %e, "literature: search failed");
            state.errors.push(e.to_string());
            return;
        }
    };
    if ids.is_empty() {
        return;
    }

    let articles = match context::call_with_timeout("literature", context::LITERATURE_TIMEOUT, ctx.literature.fetch(&ids)).await {
        Ok(articles) => articles,
        Err(e) => {
            debug!(error = %e, "literature: fetch failed");
            state.errors.push(e.to_string());
            return;
        }
    };

    for article in articles {
        let text = if article.abstract_text.is_empty() { article.title.clone() } else { article.abstract_text.clone() };
        if text.is_empty() {
            continue;
        }

        let relevance = keyword_relevance(&text, terms);
        let citation = Citation {
            source_kind: "pubmed".to_string(),
            source_id: article.source_id.clone(),
            title: article.title.clone(),
            authors: article.authors.clone(),
            year: article.year,
            url: article.url.clone().or_else(|| Some(format!("https://pubmed.ncbi.nlm.nih.gov/{}/", article.source_id))),
            excerpt: Some(Citation::truncate(&text, 300)),
            relevance,
        };

        let confidence = if terms.len() == 2 {
            let context_excerpt = Citation::truncate(&text, 512);
            match context::call_with_timeout(
                "scorer",
                context::SCORER_TIMEOUT,
                ctx.scorer.score_relation(terms[0], "", terms[1], Some(&context_excerpt)),
            )
            .await
            {
                Ok(score) => (relevance * KEYWORD_WEIGHT + score.aggregate * SCORER_WEIGHT).clamp(0.0, 1.0),
                Err(e) => {
                    state.errors.push(e.to_string());
                    relevance
                }
            }
        } else {
            relevance
        };

        evidence.push(Evidence {
            id: format!("lit:{}", citation.source_id),
            kind: EvidenceKind::Literature,
            description: Citation::truncate(&text, 500),
            confidence,
            citation: Some(citation.clone()),
            mechanism_path_id: None,
            entities_mentioned: terms.iter().map(|t| t.to_string()).collect(),
        });
        citations.push(citation);
    }
}

/// Fraction of `terms` that appear (case-insensitively) in `text`. Used as
/// the 40% keyword component of an evidence item's blended confidence, and
/// standalone as a citation's `relevance` when the scorer is unavailable.
fn keyword_relevance(text: &str, terms: &[&String]) -> f64 {
    if terms.is_empty() {
        return 0.5;
    }
    let lower = text.to_lowercase();
    let hits = terms.iter().filter(|t| lower.contains(&t.to_lowercase())).count();
    hits as f64 / terms.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use repurpose_domain::entity::{Entity, ExtractionMethod};
    use repurpose_domain::workflow::QueryRequest;
    use repurpose_repo::{Article, RelationScore, Synthesizer};
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedLiterature {
        ids: Vec<String>,
        articles: Vec<Article>,
        search_calls: AtomicUsize,
    }

    #[async_trait]
    impl repurpose_repo::LiteratureClient for FixedLiterature {
        async fn search(&self, _query_terms: &str, _max_results: usize) -> RepurposeResult<Vec<String>> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.ids.clone())
        }
        async fn fetch(&self, ids: &[String]) -> RepurposeResult<Vec<Article>> {
            Ok(self.articles.iter().filter(|a| ids.contains(&a.source_id)).cloned().collect())
        }
    }

    struct FixedScorer(f64);
    #[async_trait]
    impl repurpose_repo::Scorer for FixedScorer {
        async fn score_relation(&self, _drug: &str, _target: &str, _disease: &str, _context: Option<&str>) -> RepurposeResult<RelationScore> {
            Ok(RelationScore { drug_target_score: self.0, target_disease_score: self.0, drug_disease_score: self.0, aggregate: self.0 })
        }
        async fn score_evidence(&self, _text: &str, _hypothesis: &str) -> RepurposeResult<f64> {
            Ok(self.0)
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

    struct NoopNer;
    #[async_trait]
    impl repurpose_repo::NerExtractor for NoopNer {
        async fn extract(&self, _text: &str) -> RepurposeResult<Vec<repurpose_repo::ExtractedSpan>> {
            Ok(vec![])
        }
    }

    fn entity(name: &str, kind: EntityKind) -> Entity {
        Entity::new(name, kind, ExtractionMethod::NerModel, 0.9, None, &[]).unwrap()
    }

    fn article(id: &str, text: &str) -> Article {
        Article { source_id: id.to_string(), title: "title".to_string(), abstract_text: text.to_string(), authors: vec![], year: None, url: None }
    }

    fn state_with(entities: Vec<Entity>) -> WorkflowState {
        let mut state = WorkflowState::new(
            QueryRequest { query: "Can metformin treat breast cancer?".to_string(), max_candidates: 10, min_confidence: 0.5, include_experimental: false },
            "req-1".to_string(),
            "user-1".to_string(),
        );
        state.extracted_entities = Some(entities);
        state
    }

    /// Evidence is blended 60% scorer / 40% keyword relevance for a
    /// drug-disease pair search.
    #[tokio::test]
    async fn pair_search_blends_scorer_and_keyword_relevance() {
        let literature = Arc::new(FixedLiterature {
            ids: vec!["30000001".to_string()],
            articles: vec![article("30000001", "Metformin activates AMPK, relevant to breast cancer")],
            search_calls: AtomicUsize::new(0),
        });
        let ctx = StageContext {
            extractor: Arc::new(NoopNer),
            literature,
            scorer: Arc::new(FixedScorer(0.8)),
            synthesizer: Arc::new(NoopSynthesizer),
            verifier: repurpose_verify::SchemaVerifier::new(),
        };
        let mut state = state_with(vec![entity("Metformin", EntityKind::Drug), entity("Breast Cancer", EntityKind::Disease)]);

        LiteratureStage.run(&ctx, &mut state, &Cancellation::new()).await.unwrap();

        let evidence = state.literature_evidence.unwrap();
        assert_eq!(evidence.len(), 1);
        assert!((evidence[0].confidence - (1.0 * KEYWORD_WEIGHT + 0.8 * SCORER_WEIGHT)).abs() < 1e-9);
    }

    /// When no pair produces evidence, the stage falls back to searching
    /// individual entities.
    #[tokio::test]
    async fn falls_back_to_individual_entities_when_no_pair_evidence() {
        let literature = Arc::new(FixedLiterature { ids: vec![], articles: vec![], search_calls: AtomicUsize::new(0) });
        let ctx = StageContext {
            extractor: Arc::new(NoopNer),
            literature,
            scorer: Arc::new(FixedScorer(0.5)),
            synthesizer: Arc::new(NoopSynthesizer),
            verifier: repurpose_verify::SchemaVerifier::new(),
        };
        let mut state = state_with(vec![entity("Metformin", EntityKind::Drug), entity("Breast Cancer", EntityKind::Disease)]);

        LiteratureStage.run(&ctx, &mut state, &Cancellation::new()).await.unwrap();
        assert!(state.literature_evidence.unwrap().is_empty());
    }

    /// Citations are deduped by source id even when the same article
    /// surfaces from multiple searches.
    #[tokio::test]
    async fn citations_are_deduped_by_source_id() {
        let literature = Arc::new(FixedLiterature {
            ids: vec!["30000001".to_string()],
            articles: vec![article("30000001", "Metformin treats breast cancer directly")],
            search_calls: AtomicUsize::new(0),
        });
        let ctx = StageContext {
            extractor: Arc::new(NoopNer),
            literature,
            scorer: Arc::new(FixedScorer(0.9)),
            synthesizer: Arc::new(NoopSynthesizer),
            verifier: repurpose_verify::SchemaVerifier::new(),
        };
        let mut state = state_with(vec![entity("Metformin", EntityKind::Drug), entity("Breast Cancer", EntityKind::Disease)]);

        LiteratureStage.run(&ctx, &mut state, &Cancellation::new()).await.unwrap();
        assert_eq!(state.literature_citations.unwrap().len(), 1);
    }
}
