//! Stage 5: ranking (§4.G item 5). Skipped when `drug_candidates` is empty —
//! the executor routes straight to safety in that case.

use async_trait::async_trait;

use repurpose_domain::candidate::Candidate;
use repurpose_domain::cancellation::Cancellation;
use repurpose_domain::error::{RepurposeError, RepurposeResult};
use repurpose_domain::workflow::{StageName, WorkflowState};

use crate::context::StageContext;
use crate::stage::Stage;

const WEIGHT_SCORE: f64 = 0.35;
const WEIGHT_CONFIDENCE: f64 = 0.25;
const WEIGHT_EVIDENCE: f64 = 0.20;
const WEIGHT_PATHS: f64 = 0.15;
const WEIGHT_NOVELTY: f64 = 0.05;
const EVIDENCE_NORM: f64 = 20.0;
const PATHS_NORM: f64 = 5.0;

pub struct RankingStage;

#[async_trait]
impl Stage for RankingStage {
    fn name(&self) -> StageName {
        StageName::Ranking
    }

    fn required_inputs(&self) -> &'static [&'static str] {
        &["drug_candidates", "query"]
    }

    fn produced_outputs(&self) -> &'static [&'static str] {
        &["ranked_candidates"]
    }

    async fn run(&self, _ctx: &StageContext, state: &mut WorkflowState, _cancel: &Cancellation) -> RepurposeResult<()> {
        let mut candidates = state.drug_candidates.clone().ok_or_else(|| RepurposeError::StageInputMissing {
            stage: self.name().as_str().to_string(),
            field: "drug_candidates".to_string(),
        })?;

        candidates.sort_by(|a, b| {
            composite_score(b)
                .partial_cmp(&composite_score(a))
                .unwrap()
                .then(b.confidence.partial_cmp(&a.confidence).unwrap())
                .then(b.evidence_count().cmp(&a.evidence_count()))
        });

        let min_confidence = state.query.min_confidence;
        let max_candidates = state.query.max_candidates as usize;

        let mut ranked: Vec<Candidate> = Vec::new();
        for mut candidate in candidates {
            if candidate.confidence < min_confidence {
                continue;
            }
            candidate.rank = Some(ranked.len() as u32 + 1);
            ranked.push(candidate);
            if ranked.len() >= max_candidates {
                break;
            }
        }

        state.ranked_candidates = Some(ranked);
        Ok(())
    }
}

fn composite_score(c: &Candidate) -> f64 {
    let evidence_term = (c.evidence_count() as f64 / EVIDENCE_NORM).min(1.0);
    let paths_term = (c.mechanism_paths.len() as f64 / PATHS_NORM).min(1.0);
    WEIGHT_SCORE * c.overall_score + WEIGHT_CONFIDENCE * c.confidence + WEIGHT_EVIDENCE * evidence_term + WEIGHT_PATHS * paths_term + WEIGHT_NOVELTY * c.novelty
}
