//! The synthesizer contract (§4.B) — a black-box text-generation service.
//!
//! Every method returns raw JSON. The caller parses it against a declared
//! shape and treats a parse failure or schema mismatch as
//! `external_contract_violation`, degrading to the stage's deterministic
//! fallback rather than propagating (§7).

use async_trait::async_trait;
use serde_json::Value;

use repurpose_domain::error::RepurposeResult;

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Fallback entity extraction for types the NER extractor missed.
    /// Declared shape: `{"entities": [{"text": string, "kind": string, "confidence": number}]}`.
    async fn extract_entities(&self, text: &str) -> RepurposeResult<Value>;

    /// Generate a repurposing hypothesis from evidence summaries.
    /// Declared shape: `{"hypothesis": string, "mechanism_summary": string}`.
    async fn generate_hypothesis(
        &self,
        drug: &str,
        disease: &str,
        evidence_summaries: &[String],
    ) -> RepurposeResult<Value>;

    /// Explain a mechanistic pathway through a list of intermediate nodes.
    /// Declared shape: `{"explanation": string}`.
    async fn explain_pathway(
        &self,
        drug: &str,
        disease: &str,
        intermediate_nodes: &[String],
    ) -> RepurposeResult<Value>;
}
