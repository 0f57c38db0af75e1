//! The read-back result cache (§4.H step 7, §5 "Shared state"): a
//! single-writer/multiple-reader map from `request_id` to the final
//! `WorkflowState`, backing the audit/graph/citations/pdf read-back
//! endpoints (§6). A cancelled request is never inserted here.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use repurpose_domain::workflow::WorkflowState;

#[derive(Default)]
pub struct ResultCache {
    states: RwLock<HashMap<String, Arc<WorkflowState>>>,
}

impl ResultCache {
    pub fn new() -> ResultCache {
        ResultCache { states: RwLock::new(HashMap::new()) }
    }

    pub async fn insert(&self, request_id: String, state: WorkflowState) {
        self.states.write().await.insert(request_id, Arc::new(state));
    }

    pub async fn get(&self, request_id: &str) -> Option<Arc<WorkflowState>> {
        self.states.read().await.get(request_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repurpose_domain::workflow::QueryRequest;

    fn state(request_id: &str) -> WorkflowState {
        WorkflowState::new(
            QueryRequest { query: "q".to_string(), max_candidates: 10, min_confidence: 0.5, include_experimental: false },
            request_id.to_string(),
            "user-1".to_string(),
        )
    }

    #[tokio::test]
    async fn stores_and_reads_back_by_request_id() {
        let cache = ResultCache::new();
        cache.insert("req-1".to_string(), state("req-1")).await;
        assert!(cache.get("req-1").await.is_some());
        assert!(cache.get("req-2").await.is_none());
    }
}
