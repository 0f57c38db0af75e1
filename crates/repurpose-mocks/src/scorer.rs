//! A heuristic stand-in for a semantic scoring model.

use async_trait::async_trait;
use std::collections::HashSet;

use repurpose_domain::error::RepurposeResult;
use repurpose_repo::{RelationScore, Scorer};

use crate::fixtures::scenario_for_pair;

const KNOWN_PAIR_SCORE: f64 = 0.85;
const CONTEXT_MENTIONS_GENE_BONUS: f64 = 0.1;
const UNKNOWN_PAIR_SCORE: f64 = 0.4;

/// Scores a drug/disease pair highly when it matches one of
/// [`crate::fixtures::SCENARIOS`], with a small bonus when the supplied
/// context excerpt mentions the scenario's gene; otherwise returns a flat,
/// unremarkable score. Evidence scoring falls back to word overlap between
/// the evidence text and the hypothesis.
pub struct HeuristicScorer;

#[async_trait]
impl Scorer for HeuristicScorer {
    async fn score_relation(&self, drug: &str, _target: &str, disease: &str, context: Option<&str>) -> RepurposeResult<RelationScore> {
        let base = match scenario_for_pair(drug, disease) {
            Some(scenario) => {
                let mentions_gene = context.map(|c| c.to_lowercase().contains(&scenario.gene.to_lowercase())).unwrap_or(false);
                (KNOWN_PAIR_SCORE + if mentions_gene { CONTEXT_MENTIONS_GENE_BONUS } else { 0.0 }).min(1.0)
            }
            None => UNKNOWN_PAIR_SCORE,
        };

        Ok(RelationScore { drug_target_score: base, target_disease_score: base, drug_disease_score: base, aggregate: base })
    }

    async fn score_evidence(&self, text: &str, hypothesis: &str) -> RepurposeResult<f64> {
        Ok(word_overlap(text, hypothesis))
    }
}

fn word_overlap(a: &str, b: &str) -> f64 {
    let words_a: HashSet<String> = a.to_lowercase().split_whitespace().map(str::to_string).collect();
    let words_b: HashSet<String> = b.to_lowercase().split_whitespace().map(str::to_string).collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count() as f64;
    let union = words_a.union(&words_b).count() as f64;
    (intersection / union).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_pair_scores_higher_than_unknown_pair() {
        let known = HeuristicScorer.score_relation("Metformin", "", "Breast Cancer", None).await.unwrap();
        let unknown = HeuristicScorer.score_relation("Ibuprofen", "", "Asthma", None).await.unwrap();
        assert!(known.aggregate > unknown.aggregate);
    }

    #[tokio::test]
    async fn context_mentioning_gene_adds_a_bonus() {
        let with_gene = HeuristicScorer.score_relation("Metformin", "", "Breast Cancer", Some("AMPK activation observed")).await.unwrap();
        let without_gene = HeuristicScorer.score_relation("Metformin", "", "Breast Cancer", None).await.unwrap();
        assert!(with_gene.aggregate > without_gene.aggregate);
    }

    #[tokio::test]
    async fn evidence_score_reflects_word_overlap() {
        let score = HeuristicScorer.score_evidence("metformin activates ampk", "metformin activates ampk signaling").await.unwrap();
        assert!(score > 0.5);
        let none = HeuristicScorer.score_evidence("completely unrelated text", "something else entirely").await.unwrap();
        assert_eq!(none, 0.0);
    }
}
