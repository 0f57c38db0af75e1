//! Error kinds for the drug-repurposing workflow core.
//!
//! All fallible operations in the core return `RepurposeResult<T>`. The
//! variants mirror the error taxonomy the stage pipeline distinguishes: a
//! `StageInputMissing`/`StageOutputMissing` pair is a programming error and
//! aborts the pipeline, while `RepositoryUnavailable` is caught locally by
//! the stage that triggered it and degrades to an empty/zero-confidence
//! output instead of propagating.

use thiserror::Error;

/// The unified error type for the workflow core.
#[derive(Debug, Error)]
pub enum RepurposeError {
    /// The submitted query failed schema validation at the boundary.
    #[error("input invalid: {reason}")]
    InputInvalid { reason: String },

    /// A stage's `required_inputs` key was absent from the workflow state.
    ///
    /// This is a programming error, not a data error — it means a stage ran
    /// out of order or an earlier stage failed to populate a contract it owns.
    #[error("stage '{stage}' missing required input '{field}'")]
    StageInputMissing { stage: String, field: String },

    /// A stage returned without populating one of its `produced_outputs` keys.
    #[error("stage '{stage}' failed to produce output '{field}'")]
    StageOutputMissing { stage: String, field: String },

    /// A repository (graph, audit, literature, scorer, synthesizer) was
    /// unavailable or exceeded its timeout budget.
    ///
    /// Stages catch this locally, record it in `state.errors`, and continue
    /// with degraded output. It is never allowed to unwind out of a stage.
    #[error("repository '{repository}' unavailable: {reason}")]
    RepositoryUnavailable { repository: String, reason: String },

    /// The synthesizer (or another black-box model) returned output that was
    /// not valid JSON or did not match its declared shape.
    ///
    /// Treated identically to `RepositoryUnavailable` by callers.
    #[error("external contract violated by '{source}': {reason}")]
    ExternalContractViolation { source: String, reason: String },

    /// A policy gate denied the request before it reached the core.
    ///
    /// The core never raises this itself — the variant exists so that
    /// boundary layers can carry a policy denial through the same error type
    /// used everywhere else.
    #[error("policy denied: {reason}")]
    PolicyDenied { reason: String },

    /// The request's cancellation signal fired. Terminal: no result is
    /// cached for a cancelled request.
    #[error("request cancelled: {reason}")]
    Cancelled { reason: String },

    /// Audit chain verification found a broken link.
    ///
    /// Surfaced only by verification tooling, never during request
    /// processing.
    #[error("tamper detected in audit partition '{partition}': {reason}")]
    TamperDetected { partition: String, reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A JSON Schema or semantic verification rule failed outside of a
    /// stage's normal degrade-and-continue path.
    #[error("schema validation error: {reason}")]
    SchemaValidation { reason: String },
}

/// Convenience alias used throughout the workspace.
pub type RepurposeResult<T> = Result<T, RepurposeError>;
