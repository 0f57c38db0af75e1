//! # repurpose-orchestrator
//!
//! The public entry point (§4.H): resolves drug/disease hints from the raw
//! query, triggers on-demand ingestion when the graph has a gap, preloads
//! graph context, drives the stage pipeline, persists the audit trail, and
//! caches the final state for the read-back endpoints (§6).
//!
//! Every collaborator — the knowledge-graph repository, the audit store,
//! the literature client, the NER extractor, the scorer, the synthesizer —
//! is constructed once at process startup and handed to
//! [`Orchestrator::new`] by explicit dependency injection (§9: no lazy
//! singleton model loaders, no global clients).

pub mod cache;
pub mod config;
pub mod projection;
pub mod query_parse;

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use repurpose_domain::audit_event::{AuditEvent, EventType};
use repurpose_domain::cancellation::Cancellation;
use repurpose_domain::error::{RepurposeError, RepurposeResult};
use repurpose_domain::workflow::{GraphContext, QueryRequest, WorkflowState};
use repurpose_ingest::IngestionPipeline;
use repurpose_pipeline::{StageContext, StageExecutor};
use repurpose_repo::{AuditStore, KnowledgeGraphRepository, LiteratureClient, NerExtractor, Scorer, Synthesizer};
use repurpose_verify::SchemaVerifier;

use cache::ResultCache;
use query_parse::extract_hints;

/// §4.D "at most N rows ... default 20 or 50" — the orchestrator's own
/// preload queries use the higher end of that range since they seed the
/// whole request's graph context, not a single targeted lookup.
const PRELOAD_LIMIT: usize = 50;
const NEIGHBOR_DEPTH: u8 = 1;
const NEIGHBOR_LIMIT: usize = 20;

pub struct Orchestrator {
    graph: Arc<dyn KnowledgeGraphRepository>,
    audit: Arc<dyn AuditStore>,
    ingestion: IngestionPipeline,
    stage_ctx: StageContext,
    executor: StageExecutor,
    cache: ResultCache,
    request_timeout: std::time::Duration,
}

impl Orchestrator {
    pub fn new(
        graph: Arc<dyn KnowledgeGraphRepository>,
        audit: Arc<dyn AuditStore>,
        literature: Arc<dyn LiteratureClient>,
        extractor: Arc<dyn NerExtractor>,
        scorer: Arc<dyn Scorer>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Orchestrator {
        Self::with_config(graph, audit, literature, extractor, scorer, synthesizer, config::CoreConfig::defaults())
    }

    /// Like [`Orchestrator::new`], but with an operator-supplied
    /// [`config::CoreConfig`] driving the per-request and per-stage wall-time
    /// budgets (§5 "Timeouts") instead of the spec's hardcoded defaults.
    pub fn with_config(
        graph: Arc<dyn KnowledgeGraphRepository>,
        audit: Arc<dyn AuditStore>,
        literature: Arc<dyn LiteratureClient>,
        extractor: Arc<dyn NerExtractor>,
        scorer: Arc<dyn Scorer>,
        synthesizer: Arc<dyn Synthesizer>,
        config: config::CoreConfig,
    ) -> Orchestrator {
        let ingestion = IngestionPipeline::new(literature.clone(), extractor.clone(), graph.clone());
        let stage_ctx = StageContext { extractor, literature, scorer, synthesizer, verifier: SchemaVerifier::new() };
        let executor = StageExecutor::new().with_stage_timeout(config.stage_timeout);
        Orchestrator { graph, audit, ingestion, stage_ctx, executor, cache: ResultCache::new(), request_timeout: config.request_timeout }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// The audit store backing this orchestrator, for read-back tooling
    /// (`/reports/{id}/audit`, chain verification) that sits outside the
    /// request path (§6, §8).
    pub fn audit_store(&self) -> &Arc<dyn AuditStore> {
        &self.audit
    }

    /// `/reports/{id}/graph` (§6): the accepted-path graph projection for a
    /// cached request, or `None` if `request_id` is unknown to the cache.
    pub async fn graph_view(&self, request_id: &str) -> Option<RepurposeResult<projection::GraphProjection>> {
        let state = self.cache.get(request_id).await?;
        Some(projection::GraphProjection::build(&state))
    }

    /// `/reports/{id}/citations` (§6): citations backing the final
    /// candidates of a cached request.
    pub async fn citations_view(&self, request_id: &str) -> Option<Vec<repurpose_domain::citation::Citation>> {
        let state = self.cache.get(request_id).await?;
        Some(projection::project_citations(&state))
    }

    /// `/reports/{id}/audit` (§6): this request's audit trail in append
    /// order, read directly from the audit store (not the result cache —
    /// a failed or cancelled request still has an audit trail worth
    /// reading back even though nothing was cached, §4.H step 6).
    pub async fn audit_view(&self, request_id: &str) -> RepurposeResult<Vec<repurpose_domain::audit_event::AuditEvent>> {
        let events = self.audit.by_request(request_id).await?;
        Ok(projection::project_audit(events))
    }

    /// Run one request to completion with an internal, uncancellable
    /// signal. Callers that need external cancellation should use
    /// [`Orchestrator::run_cancellable`] instead.
    pub async fn run(&self, query: QueryRequest, user_id: String, request_id: String) -> RepurposeResult<WorkflowState> {
        self.run_cancellable(query, user_id, request_id, Cancellation::new()).await
    }

    /// Run one request to completion (§4.H), honoring `cancel` as the
    /// cooperative cancellation signal threaded through every stage and
    /// through ingestion (§5).
    pub async fn run_cancellable(
        &self,
        query: QueryRequest,
        user_id: String,
        request_id: String,
        cancel: Cancellation,
    ) -> RepurposeResult<WorkflowState> {
        if let Err(field) = query.validate() {
            return Err(RepurposeError::InputInvalid { reason: field });
        }

        let budget = tokio::time::timeout(self.request_timeout, self.run_inner(query, user_id.clone(), request_id.clone(), cancel.clone())).await;

        match budget {
            Ok(result) => result,
            Err(_) => {
                let secs = self.request_timeout.as_secs();
                warn!(request_id, "request exceeded its {secs}s wall-time budget");
                cancel.cancel();
                self.emit_terminal_event(&user_id, &request_id, "workflow_timeout", json!({"reason": format!("request exceeded {secs}s budget")})).await;
                Err(RepurposeError::Cancelled { reason: format!("request exceeded {secs}s wall-time budget") })
            }
        }
    }

    async fn run_inner(
        &self,
        query: QueryRequest,
        user_id: String,
        request_id: String,
        cancel: Cancellation,
    ) -> RepurposeResult<WorkflowState> {
        self.emit_event(&user_id, &request_id, EventType::Query, "submit_query", None, json!({"query": query.query})).await;

        let hints = extract_hints(&query.query);

        if let (Some(drug), Some(disease)) = (&hints.drug, &hints.disease) {
            // §4.E: ingestion triggers only when the pair's preloaded context
            // has "strictly fewer than 1 pathway edge" — read that gap
            // directly rather than ingesting unconditionally (§2 "ingestion
            // (only if gap)").
            let gap_context = GraphContext {
                pathway_edges: self.graph.get_pathway_edges(drug, Some(disease), PRELOAD_LIMIT).await.unwrap_or_default(),
                ..GraphContext::default()
            };
            if gap_context.pathway_edge_count() < 1 {
                if let Err(e) = self.ingestion.ingest(drug, disease, &cancel).await {
                    warn!(request_id, error = %e, "ingestion cycle failed, proceeding with existing graph context");
                }
            }
        }

        let graph_context = self.preload_graph_context(&hints).await;

        let mut state = WorkflowState::new(query, request_id.clone(), user_id.clone());
        state.drug_hint = hints.drug;
        state.disease_hint = hints.disease;
        state.graph_context = graph_context;

        let outcome = self.executor.run(&self.stage_ctx, &mut state, &cancel).await;

        match outcome {
            Ok(()) => {
                let candidate_count = state.final_candidates.as_ref().map(|c| c.len()).unwrap_or(0);
                let approved = state.workflow_approved.unwrap_or(false);
                self.emit_terminal_event(
                    &user_id,
                    &request_id,
                    "workflow_complete",
                    json!({
                        "approved": approved,
                        "stage_history": state.stage_history_names(),
                        "candidate_count": candidate_count,
                    }),
                )
                .await;
                self.cache.insert(request_id, state.clone()).await;
                Ok(state)
            }
            Err(RepurposeError::Cancelled { reason }) => {
                self.emit_terminal_event(&user_id, &request_id, "workflow_cancelled", json!({"reason": reason})).await;
                Err(RepurposeError::Cancelled { reason })
            }
            Err(e) => {
                self.emit_terminal_event(
                    &user_id,
                    &request_id,
                    "workflow_failed",
                    json!({
                        "error": e.to_string(),
                        "stage_history": state.stage_history_names(),
                    }),
                )
                .await;
                self.cache.insert(request_id, state.clone()).await;
                Err(e)
            }
        }
    }

    async fn preload_graph_context(&self, hints: &query_parse::QueryHints) -> GraphContext {
        let mut context = GraphContext::default();

        if let Some(drug) = &hints.drug {
            context.drug_targets = self.graph.get_drug_targets(drug, PRELOAD_LIMIT).await.unwrap_or_default();
            context.neighbors.insert(drug.clone(), self.graph.get_entity_neighbors(drug, NEIGHBOR_DEPTH, NEIGHBOR_LIMIT).await.unwrap_or_default());
        }
        if let Some(disease) = &hints.disease {
            context.disease_genes = self.graph.get_disease_genes(disease, PRELOAD_LIMIT).await.unwrap_or_default();
            context
                .neighbors
                .insert(disease.clone(), self.graph.get_entity_neighbors(disease, NEIGHBOR_DEPTH, NEIGHBOR_LIMIT).await.unwrap_or_default());
        }
        if let (Some(drug), Some(disease)) = (&hints.drug, &hints.disease) {
            context.pathway_edges = self.graph.get_pathway_edges(drug, Some(disease), PRELOAD_LIMIT).await.unwrap_or_default();
        }

        context
    }

    async fn emit_event(&self, user_id: &str, request_id: &str, event_type: EventType, action: &str, resource: Option<String>, details: serde_json::Value) {
        let today = Utc::now().date_naive();
        let event = AuditEvent {
            event_id: 0,
            partition_date: today,
            event_type,
            user_id: user_id.to_string(),
            request_id: request_id.to_string(),
            action: action.to_string(),
            resource,
            details,
            self_hash: String::new(),
            prev_hash: String::new(),
            created_at: Utc::now(),
        };
        // §4.H step 6, §7: audit append failures do not fail the request.
        if let Err(e) = self.audit.append(event).await {
            warn!(request_id, action, error = %e, "audit append failed, continuing without a recorded event");
        } else {
            info!(request_id, action, "audit event recorded");
        }
    }

    async fn emit_terminal_event(&self, user_id: &str, request_id: &str, action: &str, details: serde_json::Value) {
        self.emit_event(user_id, request_id, EventType::Action, action, None, details).await;
    }
}
