//! # repurpose-pipeline
//!
//! The deterministic six-stage drug-repurposing workflow pipeline (§4.G):
//! entity extraction, literature retrieval, pathway simulation, reasoning,
//! ranking, and safety. [`stage::Stage`] is the shared per-stage contract;
//! [`executor::StageExecutor`] drives the six stages in the order §5 fixes,
//! applies the post-reasoning routing rule, and guarantees that even an
//! aborted run carries a critical safety verdict.

pub mod context;
pub mod executor;
pub mod stage;
pub mod stages;

pub use context::StageContext;
pub use executor::StageExecutor;
pub use stage::Stage;
