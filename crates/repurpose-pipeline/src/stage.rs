//! The `Stage` trait: one impure `state -> state` transformation with a
//! declared input/output contract (§4.G).

use async_trait::async_trait;

use repurpose_domain::cancellation::Cancellation;
use repurpose_domain::error::RepurposeResult;
use repurpose_domain::workflow::{StageName, WorkflowState};

use crate::context::StageContext;

#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> StageName;

    /// State keys this stage reads. The executor checks these are present
    /// before calling `run`; absence is `StageInputMissing`, a programming
    /// error, never a silent default.
    fn required_inputs(&self) -> &'static [&'static str];

    /// State keys this stage must populate. The executor checks these are
    /// present after `run` returns; absence is `StageOutputMissing`.
    fn produced_outputs(&self) -> &'static [&'static str];

    async fn run(&self, ctx: &StageContext, state: &mut WorkflowState, cancel: &Cancellation) -> RepurposeResult<()>;
}

/// Read one of `WorkflowState`'s optional slots by its stage-contract key
/// name. Lets the executor check `required_inputs`/`produced_outputs`
/// generically instead of every stage re-deriving its own presence checks.
/// `"query"` is always present once a `WorkflowState` exists, so it reads
/// as unconditionally satisfied.
pub fn field_present(state: &WorkflowState, field: &str) -> bool {
    match field {
        "query" => true,
        "extracted_entities" => state.extracted_entities.is_some(),
        "literature_evidence" => state.literature_evidence.is_some(),
        "literature_citations" => state.literature_citations.is_some(),
        "simulation_result" => state.simulation_result.is_some(),
        "mechanism_paths" => state.mechanism_paths.is_some(),
        "drug_candidates" => state.drug_candidates.is_some(),
        "ranked_candidates" => state.ranked_candidates.is_some(),
        "safety_result" => state.safety_result.is_some(),
        "final_candidates" => state.final_candidates.is_some(),
        "workflow_approved" => state.workflow_approved.is_some(),
        _ => false,
    }
}
