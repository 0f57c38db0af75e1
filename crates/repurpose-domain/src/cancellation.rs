//! A cooperative cancellation signal threaded through the pipeline (§5).
//!
//! Stages and the ingestion pipeline check this between external calls —
//! CPU-only stages never poll it, since they run to completion once
//! scheduled (§5: "non-suspending"). Cloning shares the same underlying
//! flag, so one signal can be handed to every task working on a request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Cancellation {
        Cancellation(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
