//! Safety flags and the final safety verdict the pipeline always produces.

use serde::{Deserialize, Serialize};

/// How serious a safety flag is. Only `Critical` blocks approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetySeverity {
    Info,
    Warning,
    Critical,
}

/// One finding raised by the safety stage, either against a specific
/// candidate or against the workflow as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyFlag {
    pub id: String,
    pub kind: String,
    pub severity: SafetySeverity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_field: Option<String>,
}

/// The safety stage's final verdict. Always present on a completed run
/// (§8: "no code path yields a response without a safety verdict").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyVerdict {
    pub passed: bool,
    pub requires_human_review: bool,
    pub flags: Vec<SafetyFlag>,
    pub min_confidence_seen: f64,
    pub total_citations: usize,
    pub schema_valid: bool,
    pub content_safe: bool,
    pub citations_verified: bool,
}

impl SafetyVerdict {
    pub fn critical_count(&self) -> usize {
        self.flags
            .iter()
            .filter(|f| f.severity == SafetySeverity::Critical)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.flags
            .iter()
            .filter(|f| f.severity == SafetySeverity::Warning)
            .count()
    }
}
