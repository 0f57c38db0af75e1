//! The knowledge-graph repository contract (§4.B, §4.D).
//!
//! The core never talks to a graph driver directly. Every query goes
//! through this trait, which is responsible for whitelisting entity kinds
//! and relation names before any query string is built — the defined-set
//! check in `Edge`/`Entity` is the boundary, not a suggestion.

use async_trait::async_trait;

use repurpose_domain::edge::{Edge, RelationKind};
use repurpose_domain::entity::{Entity, EntityKind, ExtractionMethod};
use repurpose_domain::error::RepurposeResult;

/// Read/write contract for the property-graph store backing drug, disease,
/// gene, protein, pathway, and phenotype entities and their relations.
///
/// All methods are idempotent. Read methods never mutate and return at most
/// `limit` rows (defaulting per query, §4.D).
#[async_trait]
pub trait KnowledgeGraphRepository: Send + Sync {
    /// Targets (genes/proteins) a named drug is known to act on.
    async fn get_drug_targets(&self, drug_name: &str, limit: usize) -> RepurposeResult<Vec<Edge>>;

    /// Genes/proteins associated with a named disease.
    async fn get_disease_genes(&self, disease_name: &str, limit: usize) -> RepurposeResult<Vec<Edge>>;

    /// Pathway edges between a source entity and, optionally, a specific
    /// target entity. With no target, returns every outgoing pathway edge
    /// from the source.
    async fn get_pathway_edges(
        &self,
        source_name: &str,
        target_name: Option<&str>,
        limit: usize,
    ) -> RepurposeResult<Vec<Edge>>;

    /// One- to three-hop neighbor edges of a named entity.
    async fn get_entity_neighbors(
        &self,
        entity_name: &str,
        depth: u8,
        limit: usize,
    ) -> RepurposeResult<Vec<Edge>>;

    /// Free-text search over entity names, e.g. for the orchestrator's
    /// drug/disease hint resolution.
    async fn search(&self, text: &str, limit: usize) -> RepurposeResult<Vec<Entity>>;

    /// Idempotent entity upsert. Sets the normalized name and kind; if an
    /// existing node under this id has a *different* kind, the write fails
    /// with `RepurposeError::RepositoryUnavailable` carrying `"conflict"`
    /// rather than clobbering the stored kind (§4.D).
    async fn upsert_entity(
        &self,
        kind: EntityKind,
        normalized_name: &str,
        extraction_method: ExtractionMethod,
        extraction_confidence: f64,
    ) -> RepurposeResult<Entity>;

    /// Idempotent relation upsert, merged by (source, target, relation):
    /// confidence takes the max, citation ids union, and
    /// `extraction_method` upgrades monotonically (§4.D).
    #[allow(clippy::too_many_arguments)]
    async fn upsert_relation(
        &self,
        source_name: &str,
        source_kind: EntityKind,
        relation: RelationKind,
        target_name: &str,
        target_kind: EntityKind,
        confidence: f64,
        citation_id: Option<String>,
        extraction_method: ExtractionMethod,
    ) -> RepurposeResult<Edge>;
}
