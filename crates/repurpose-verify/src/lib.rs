//! # repurpose-verify
//!
//! Output verification for external-service contracts (§4 cross-cutting):
//! synthesizer hypotheses, scorer responses, and NER extraction batches are
//! all run through [`engine::SchemaVerifier`] before a stage folds them into
//! the workflow state. It validates payloads in two phases:
//!
//! 1. **Structural** — JSON Schema validation via the `jsonschema` crate.
//! 2. **Semantic** — domain rules (`RequiredField`, `AllowedValues`,
//!    `ForbiddenPattern`, `Custom`) evaluated against the payload.
//!
//! A failing `VerificationReport` is what a stage turns into an
//! `external_contract_violation` error rather than trusting the output.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use repurpose_verify::engine::SchemaVerifier;
//!
//! let mut verifier = SchemaVerifier::new();
//! verifier.register_rule("non-empty-hypothesis", Box::new(|payload| {
//!     if payload.get("hypothesis").and_then(|v| v.as_str()).unwrap_or("").is_empty() {
//!         Some("hypothesis field must not be empty".to_string())
//!     } else {
//!         None
//!     }
//! }));
//! ```

pub mod engine;

pub use engine::SchemaVerifier;
