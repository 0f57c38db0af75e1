//! The pipeline driver (§4.G, §5): runs the six stages in strict order,
//! applies the post-reasoning routing rule, records per-stage telemetry,
//! and turns a programming-error abort into the mandatory critical safety
//! verdict every run — including a failed one — must carry (§8: "no code
//! path yields a response without a safety verdict").

use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};

use repurpose_domain::cancellation::Cancellation;
use repurpose_domain::error::{RepurposeError, RepurposeResult};
use repurpose_domain::safety::{SafetyFlag, SafetySeverity, SafetyVerdict};
use repurpose_domain::workflow::{StageName, StageRecord, WorkflowState};

use crate::context::{StageContext, STAGE_TIMEOUT};
use crate::stage::{field_present, Stage};
use crate::stages::{EntityExtractionStage, LiteratureStage, PathwaySimulationStage, RankingStage, ReasoningStage, SafetyStage};

/// Drives `WorkflowState` through the six named stages in the order fixed
/// by §5 "Ordering guarantees": entity_extraction → literature →
/// pathway_simulation → reasoning → (ranking?) → safety.
pub struct StageExecutor {
    entity_extraction: EntityExtractionStage,
    literature: LiteratureStage,
    pathway_simulation: PathwaySimulationStage,
    reasoning: ReasoningStage,
    ranking: RankingStage,
    safety: SafetyStage,
    stage_timeout: Duration,
}

impl StageExecutor {
    pub fn new() -> StageExecutor {
        StageExecutor {
            entity_extraction: EntityExtractionStage,
            literature: LiteratureStage,
            pathway_simulation: PathwaySimulationStage,
            reasoning: ReasoningStage,
            ranking: RankingStage,
            safety: SafetyStage,
            stage_timeout: STAGE_TIMEOUT,
        }
    }

    /// Override the per-stage wall-time budget (§5 "Timeouts"), e.g. from an
    /// operator-supplied `CoreConfig` instead of the spec's 120s default.
    pub fn with_stage_timeout(mut self, stage_timeout: Duration) -> StageExecutor {
        self.stage_timeout = stage_timeout;
        self
    }

    /// Run the full pipeline against `state`. On success, `state.stage_history`
    /// always ends with `safety` and every output slot the executed stages
    /// own is populated. On a programming-error abort
    /// (`StageInputMissing`/`StageOutputMissing`), the state is still left
    /// with a critical safety verdict and `workflow_approved = Some(false)`
    /// before the error is returned, so callers never have to synthesize one
    /// themselves.
    pub async fn run(&self, ctx: &StageContext, state: &mut WorkflowState, cancel: &Cancellation) -> RepurposeResult<()> {
        if let Err(e) = self.run_stage(&self.entity_extraction, ctx, state, cancel).await {
            return self.abort(state, &e);
        }
        if cancel.is_cancelled() {
            return self.abort(state, &RepurposeError::Cancelled { reason: "cancelled before literature stage".to_string() });
        }
        if let Err(e) = self.run_stage(&self.literature, ctx, state, cancel).await {
            return self.abort(state, &e);
        }
        if cancel.is_cancelled() {
            return self.abort(state, &RepurposeError::Cancelled { reason: "cancelled before pathway_simulation stage".to_string() });
        }
        if let Err(e) = self.run_stage(&self.pathway_simulation, ctx, state, cancel).await {
            return self.abort(state, &e);
        }
        if let Err(e) = self.run_stage(&self.reasoning, ctx, state, cancel).await {
            return self.abort(state, &e);
        }

        let has_candidates = state.drug_candidates.as_ref().map(|c| !c.is_empty()).unwrap_or(false);
        if has_candidates {
            if cancel.is_cancelled() {
                return self.abort(state, &RepurposeError::Cancelled { reason: "cancelled before ranking stage".to_string() });
            }
            if let Err(e) = self.run_stage(&self.ranking, ctx, state, cancel).await {
                return self.abort(state, &e);
            }
        }

        // Safety always runs, even for a cancellation observed up to this
        // point — but a cancellation that fires here is still terminal: the
        // caller must not cache the result (§5 "Cancellation").
        if let Err(e) = self.run_stage(&self.safety, ctx, state, cancel).await {
            return self.abort(state, &e);
        }

        if cancel.is_cancelled() {
            return Err(RepurposeError::Cancelled { reason: "cancelled after safety stage completed".to_string() });
        }

        Ok(())
    }

    async fn run_stage(&self, stage: &dyn Stage, ctx: &StageContext, state: &mut WorkflowState, cancel: &Cancellation) -> RepurposeResult<()> {
        for field in stage.required_inputs() {
            if !field_present(state, field) {
                return Err(RepurposeError::StageInputMissing { stage: stage.name().as_str().to_string(), field: field.to_string() });
            }
        }

        state.current_stage = Some(stage.name());
        let started_at = Utc::now();
        info!(stage = stage.name().as_str(), "stage starting");

        let result = tokio::time::timeout(self.stage_timeout, stage.run(ctx, state, cancel)).await;

        let ended_at = Utc::now();
        let duration_ms = (ended_at - started_at).num_milliseconds();
        state.stage_history.push(StageRecord { stage: stage.name(), started_at, ended_at, duration_ms });

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(RepurposeError::RepositoryUnavailable {
                    repository: stage.name().as_str().to_string(),
                    reason: format!("stage exceeded its {}s wall-time budget", self.stage_timeout.as_secs()),
                });
            }
        }

        for field in stage.produced_outputs() {
            if !field_present(state, field) {
                return Err(RepurposeError::StageOutputMissing { stage: stage.name().as_str().to_string(), field: field.to_string() });
            }
        }

        info!(stage = stage.name().as_str(), duration_ms, "stage complete");
        Ok(())
    }

    /// A stage-contract abort (`StageInputMissing`/`StageOutputMissing`) or a
    /// stage wall-time overrun leaves the workflow without the later stages'
    /// outputs. Build the critical safety verdict the spec requires every
    /// run to carry so the caller never has to special-case "the pipeline
    /// didn't reach safety" (§7, §8).
    fn abort(&self, state: &mut WorkflowState, cause: &RepurposeError) -> RepurposeResult<()> {
        error!(error = %cause, "pipeline aborted before reaching a terminal stage");
        state.errors.push(cause.to_string());

        if !matches!(cause, RepurposeError::Cancelled { .. }) {
            let flag = SafetyFlag {
                id: format!("flag:workflow_failed:{}", uuid::Uuid::new_v4()),
                kind: "workflow_failed".to_string(),
                severity: SafetySeverity::Critical,
                message: cause.to_string(),
                source_stage: state.current_stage.map(|s| s.as_str().to_string()),
                affected_field: None,
            };
            state.safety_result = Some(SafetyVerdict {
                passed: false,
                requires_human_review: true,
                flags: vec![flag],
                min_confidence_seen: 0.0,
                total_citations: 0,
                schema_valid: false,
                content_safe: false,
                citations_verified: false,
            });
            state.final_candidates = Some(Vec::new());
            state.workflow_approved = Some(false);
        }

        Err(clone_error(cause))
    }
}

impl Default for StageExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn clone_error(e: &RepurposeError) -> RepurposeError {
    match e {
        RepurposeError::InputInvalid { reason } => RepurposeError::InputInvalid { reason: reason.clone() },
        RepurposeError::StageInputMissing { stage, field } => RepurposeError::StageInputMissing { stage: stage.clone(), field: field.clone() },
        RepurposeError::StageOutputMissing { stage, field } => RepurposeError::StageOutputMissing { stage: stage.clone(), field: field.clone() },
        RepurposeError::RepositoryUnavailable { repository, reason } => {
            RepurposeError::RepositoryUnavailable { repository: repository.clone(), reason: reason.clone() }
        }
        RepurposeError::ExternalContractViolation { source, reason } => {
            RepurposeError::ExternalContractViolation { source: source.clone(), reason: reason.clone() }
        }
        RepurposeError::PolicyDenied { reason } => RepurposeError::PolicyDenied { reason: reason.clone() },
        RepurposeError::Cancelled { reason } => RepurposeError::Cancelled { reason: reason.clone() },
        RepurposeError::TamperDetected { partition, reason } => RepurposeError::TamperDetected { partition: partition.clone(), reason: reason.clone() },
        RepurposeError::ConfigError { reason } => RepurposeError::ConfigError { reason: reason.clone() },
        RepurposeError::SchemaValidation { reason } => RepurposeError::SchemaValidation { reason: reason.clone() },
    }
}

/// Unused in the hot path but kept available for callers that want a bare
/// per-stage timeout without going through the full executor (e.g. tooling).
#[allow(dead_code)]
pub const DEFAULT_STAGE_TIMEOUT: Duration = STAGE_TIMEOUT;
