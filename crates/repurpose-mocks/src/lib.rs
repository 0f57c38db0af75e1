//! # repurpose-mocks
//!
//! Fixture-backed mock implementations of the four model-facing
//! `repurpose-repo` contracts — [`NerExtractor`](repurpose_repo::NerExtractor),
//! [`LiteratureClient`](repurpose_repo::LiteratureClient),
//! [`Scorer`](repurpose_repo::Scorer), and
//! [`Synthesizer`](repurpose_repo::Synthesizer) — used by integration tests
//! and the demo CLI in place of a real NER model, PubMed client, semantic
//! scorer, or LLM.
//!
//! Three hardcoded drug-repurposing scenarios back every mock:
//!
//! - Metformin / AMPK / breast cancer
//! - Aspirin / COX-2 / colorectal cancer
//! - Thalidomide / TNF-alpha / multiple myeloma
//!
//! All data is fictional abstract text built to exercise the pipeline, not
//! real literature. No network calls are made.

pub mod extractor;
pub mod fixtures;
pub mod literature;
pub mod scorer;
pub mod synthesizer;

pub use extractor::KeywordNerExtractor;
pub use literature::FixtureLiteratureClient;
pub use scorer::HeuristicScorer;
pub use synthesizer::TemplateSynthesizer;
