//! Output verifier for external-service contracts (§4 cross-cutting).
//!
//! `SchemaVerifier` checks a raw JSON payload — a synthesizer hypothesis, a
//! scorer response, an NER extraction batch — in two phases:
//!
//! 1. **Structural** — the payload is validated against `OutputSchema::json_schema`
//!    using the `jsonschema` crate.
//! 2. **Semantic** — each `VerificationRule` in `OutputSchema::rules` is
//!    evaluated in order. All failures are collected before returning so
//!    callers see the full failure set in one pass.
//!
//! Custom rules delegate to named functions registered via `register_rule`.
//! Keeping stage-specific logic out of the verifier itself lets each stage
//! register only the rules it needs.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use repurpose_domain::verify::{OutputSchema, VerificationFailure, VerificationReport, VerificationRuleType};

/// A caller-supplied verification function.
///
/// Receives the full payload. Returns `Some(message)` when the check fails
/// with a human-readable explanation, or `None` on success.
pub type CustomVerifierFn = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Combines JSON Schema structural validation with a set of semantic rules.
///
/// Custom rules can be registered at startup by the orchestrator — this keeps
/// stage-specific knowledge out of the verifier itself.
pub struct SchemaVerifier {
    custom_rules: HashMap<String, CustomVerifierFn>,
}

impl SchemaVerifier {
    /// Create a verifier with no custom rules registered.
    pub fn new() -> Self {
        Self { custom_rules: HashMap::new() }
    }

    /// Register a custom verification function under `name`.
    ///
    /// The name must match the `function_name` field used in
    /// `VerificationRuleType::Custom` rules. Registering the same name twice
    /// replaces the previous function.
    pub fn register_rule(&mut self, name: impl Into<String>, f: CustomVerifierFn) {
        self.custom_rules.insert(name.into(), f);
    }

    /// Resolve a dot-notation field path (e.g. `"hypothesis.drug"`) against a
    /// JSON value. Returns `None` when any segment is missing or the value is
    /// JSON `null`.
    fn resolve_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
        let mut current = value;
        for segment in path.split('.') {
            match current.get(segment) {
                Some(v) if !v.is_null() => current = v,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Verify `payload` against `schema`.
    ///
    /// Runs structural JSON Schema validation first, then evaluates every
    /// semantic rule. All failures are accumulated — the caller receives the
    /// full picture in one report rather than only the first failure.
    pub fn verify(&self, payload: &Value, schema: &OutputSchema) -> VerificationReport {
        let mut failures: Vec<VerificationFailure> = Vec::new();

        // A null json_schema means "no structural constraint" — skip validation.
        if !schema.json_schema.is_null() {
            match jsonschema::validator_for(&schema.json_schema) {
                Ok(validator) => {
                    for error in validator.iter_errors(payload) {
                        let message = format!("JSON Schema violation at {}: {}", error.instance_path, error);
                        warn!(schema_id = %schema.schema_id, %message, "structural validation failure");
                        failures.push(VerificationFailure { rule_id: "json-schema".to_string(), message });
                    }
                }
                Err(e) => {
                    let message = format!("invalid JSON Schema document: {e}");
                    warn!(schema_id = %schema.schema_id, %message, "schema compilation failure");
                    failures.push(VerificationFailure { rule_id: "json-schema".to_string(), message });
                }
            }
        }

        for rule in &schema.rules {
            debug!(rule_id = %rule.rule_id, description = %rule.description, "evaluating verification rule");

            let failure_msg: Option<String> = match &rule.rule_type {
                VerificationRuleType::RequiredField { field_path } => {
                    if Self::resolve_path(payload, field_path).is_none() {
                        Some(format!("required field '{field_path}' is missing or null"))
                    } else {
                        None
                    }
                }

                VerificationRuleType::AllowedValues { field_path, allowed } => match Self::resolve_path(payload, field_path) {
                    None => Some(format!("field '{field_path}' is missing; cannot check allowed values")),
                    Some(actual) => {
                        if allowed.contains(actual) {
                            None
                        } else {
                            Some(format!("field '{field_path}' has value {actual} which is not in the allowed set"))
                        }
                    }
                },

                // Non-string fields pass silently — the rule is only meaningful
                // for string values.
                VerificationRuleType::ForbiddenPattern { field_path, pattern } => match Self::resolve_path(payload, field_path) {
                    None => None,
                    Some(v) => match v.as_str() {
                        Some(s) if s.contains(pattern.as_str()) => {
                            Some(format!("field '{field_path}' contains forbidden pattern '{pattern}'"))
                        }
                        _ => None,
                    },
                },

                VerificationRuleType::Custom { function_name } => match self.custom_rules.get(function_name.as_str()) {
                    Some(f) => f(payload),
                    None => Some(format!("no custom rule registered for function name '{function_name}'")),
                },
            };

            if let Some(message) = failure_msg {
                warn!(rule_id = %rule.rule_id, %message, "semantic rule failed");
                failures.push(VerificationFailure { rule_id: rule.rule_id.clone(), message });
            }
        }

        let passed = failures.is_empty();
        debug!(schema_id = %schema.schema_id, passed, failure_count = failures.len(), "verification complete");
        VerificationReport { passed, failures }
    }
}

impl Default for SchemaVerifier {
    fn default() -> Self {
        Self::new()
    }
}
