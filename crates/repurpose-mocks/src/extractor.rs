//! A deterministic keyword-matching stand-in for a real NER model.

use async_trait::async_trait;

use repurpose_domain::entity::EntityKind;
use repurpose_domain::error::RepurposeResult;
use repurpose_repo::{ExtractedSpan, NerExtractor};

use crate::fixtures::SCENARIOS;

/// Scans raw text for the drug, disease, and gene names from
/// [`crate::fixtures::SCENARIOS`]. Confidence is fixed per kind rather than
/// modeled, since the point is to exercise the pipeline downstream of
/// extraction, not to simulate a real model's calibration.
pub struct KeywordNerExtractor;

const DRUG_CONFIDENCE: f64 = 0.9;
const DISEASE_CONFIDENCE: f64 = 0.9;
const GENE_CONFIDENCE: f64 = 0.85;

#[async_trait]
impl NerExtractor for KeywordNerExtractor {
    async fn extract(&self, text: &str) -> RepurposeResult<Vec<ExtractedSpan>> {
        let lower = text.to_lowercase();
        let mut spans = Vec::new();

        for scenario in SCENARIOS {
            if lower.contains(&scenario.drug.to_lowercase()) {
                spans.push(ExtractedSpan { text: scenario.drug.to_string(), kind: EntityKind::Drug, confidence: DRUG_CONFIDENCE });
            }
            if lower.contains(&scenario.disease.to_lowercase()) {
                spans.push(ExtractedSpan { text: scenario.disease.to_string(), kind: EntityKind::Disease, confidence: DISEASE_CONFIDENCE });
            }
            if lower.contains(&scenario.gene.to_lowercase()) {
                spans.push(ExtractedSpan { text: scenario.gene.to_string(), kind: EntityKind::Gene, confidence: GENE_CONFIDENCE });
            }
        }

        spans.sort_by(|a, b| a.text.cmp(&b.text));
        spans.dedup_by(|a, b| a.text.eq_ignore_ascii_case(&b.text));
        Ok(spans)
    }
}
