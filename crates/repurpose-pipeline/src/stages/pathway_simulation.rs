//! Stage 3: pathway simulation (§4.G item 3).
//!
//! A thin, pure wrapper: all traversal and scoring logic lives in
//! `repurpose-sim`, already built against entities/evidence/graph context.
//! This stage only assembles the call and records the result.

use async_trait::async_trait;

use repurpose_domain::cancellation::Cancellation;
use repurpose_domain::error::{RepurposeError, RepurposeResult};
use repurpose_domain::workflow::{StageName, WorkflowState};

use crate::context::StageContext;
use crate::stage::Stage;

pub struct PathwaySimulationStage;

#[async_trait]
impl Stage for PathwaySimulationStage {
    fn name(&self) -> StageName {
        StageName::PathwaySimulation
    }

    fn required_inputs(&self) -> &'static [&'static str] {
        &["extracted_entities"]
    }

    fn produced_outputs(&self) -> &'static [&'static str] {
        &["simulation_result"]
    }

    async fn run(&self, _ctx: &StageContext, state: &mut WorkflowState, _cancel: &Cancellation) -> RepurposeResult<()> {
        let entities = state.extracted_entities.clone().ok_or_else(|| RepurposeError::StageInputMissing {
            stage: self.name().as_str().to_string(),
            field: "extracted_entities".to_string(),
        })?;
        let evidence = state.literature_evidence.clone().unwrap_or_default();

        let result = repurpose_sim::simulate_pathways(&entities, &evidence, &state.graph_context);
        state.simulation_result = Some(result);
        Ok(())
    }
}
