//! The in-memory graph data structure and its `KnowledgeGraphRepository` impl.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use repurpose_domain::edge::{Edge, RelationKind};
use repurpose_domain::entity::{derive_id, Entity, EntityKind, ExtractionMethod, DEFAULT_STOPWORDS};
use repurpose_domain::error::{RepurposeError, RepurposeResult};
use repurpose_repo::KnowledgeGraphRepository;

type EdgeKey = (String, String, RelationKind);

#[derive(Default)]
struct GraphData {
    entities: HashMap<String, Entity>,
    edges: HashMap<EdgeKey, Edge>,
}

/// An in-memory, thread-safe property graph keyed by entity id and edge
/// identity triple.
pub struct InMemoryGraphStore {
    data: RwLock<GraphData>,
}

impl InMemoryGraphStore {
    pub fn new() -> InMemoryGraphStore {
        InMemoryGraphStore { data: RwLock::new(GraphData::default()) }
    }

    fn find_by_name(data: &GraphData, name: &str) -> Option<Entity> {
        let lower = name.to_lowercase();
        data.entities
            .values()
            .find(|e| e.canonical_name.to_lowercase() == lower || e.aliases.iter().any(|a| a.to_lowercase() == lower))
            .cloned()
    }
}

impl Default for InMemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeGraphRepository for InMemoryGraphStore {
    async fn get_drug_targets(&self, drug_name: &str, limit: usize) -> RepurposeResult<Vec<Edge>> {
        let data = self.data.read().await;
        let Some(drug) = Self::find_by_name(&data, drug_name) else {
            return Ok(Vec::new());
        };
        let mut edges: Vec<Edge> = data
            .edges
            .values()
            .filter(|e| {
                e.source_id == drug.id
                    && data
                        .entities
                        .get(&e.target_id)
                        .map(|t| matches!(t.kind, EntityKind::Gene | EntityKind::Protein))
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        edges.sort_by(|a, b| a.target_id.cmp(&b.target_id).then(a.relation.cmp(&b.relation)));
        edges.truncate(limit);
        Ok(edges)
    }

    async fn get_disease_genes(&self, disease_name: &str, limit: usize) -> RepurposeResult<Vec<Edge>> {
        let data = self.data.read().await;
        let Some(disease) = Self::find_by_name(&data, disease_name) else {
            return Ok(Vec::new());
        };
        let mut edges: Vec<Edge> = data
            .edges
            .values()
            .filter(|e| {
                e.target_id == disease.id
                    && data
                        .entities
                        .get(&e.source_id)
                        .map(|s| matches!(s.kind, EntityKind::Gene | EntityKind::Protein))
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        edges.sort_by(|a, b| a.source_id.cmp(&b.source_id).then(a.relation.cmp(&b.relation)));
        edges.truncate(limit);
        Ok(edges)
    }

    async fn get_pathway_edges(
        &self,
        source_name: &str,
        target_name: Option<&str>,
        limit: usize,
    ) -> RepurposeResult<Vec<Edge>> {
        let data = self.data.read().await;
        let Some(source) = Self::find_by_name(&data, source_name) else {
            return Ok(Vec::new());
        };
        let target_id = match target_name {
            Some(name) => match Self::find_by_name(&data, name) {
                Some(e) => Some(e.id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };
        let mut edges: Vec<Edge> = data
            .edges
            .values()
            .filter(|e| e.source_id == source.id && target_id.as_deref().map(|t| t == e.target_id).unwrap_or(true))
            .cloned()
            .collect();
        edges.sort_by(|a, b| a.target_id.cmp(&b.target_id).then(a.relation.cmp(&b.relation)));
        edges.truncate(limit);
        Ok(edges)
    }

    async fn get_entity_neighbors(&self, entity_name: &str, depth: u8, limit: usize) -> RepurposeResult<Vec<Edge>> {
        let data = self.data.read().await;
        let Some(root) = Self::find_by_name(&data, entity_name) else {
            return Ok(Vec::new());
        };

        let mut visited = std::collections::HashSet::new();
        let mut frontier = vec![root.id.clone()];
        visited.insert(root.id.clone());
        let mut collected: Vec<Edge> = Vec::new();

        for _ in 0..depth.max(1) {
            let mut next_frontier = Vec::new();
            for node in &frontier {
                let mut touching: Vec<&Edge> =
                    data.edges.values().filter(|e| &e.source_id == node || &e.target_id == node).collect();
                touching.sort_by(|a, b| a.source_id.cmp(&b.source_id).then(a.target_id.cmp(&b.target_id)).then(a.relation.cmp(&b.relation)));
                for edge in touching {
                    collected.push(edge.clone());
                    let other = if &edge.source_id == node { &edge.target_id } else { &edge.source_id };
                    if visited.insert(other.clone()) {
                        next_frontier.push(other.clone());
                    }
                }
            }
            frontier = next_frontier;
            if frontier.is_empty() {
                break;
            }
        }

        collected.sort_by(|a, b| a.source_id.cmp(&b.source_id).then(a.target_id.cmp(&b.target_id)).then(a.relation.cmp(&b.relation)));
        collected.dedup_by(|a, b| a.identity() == b.identity());
        collected.truncate(limit);
        Ok(collected)
    }

    async fn search(&self, text: &str, limit: usize) -> RepurposeResult<Vec<Entity>> {
        let data = self.data.read().await;
        let lower = text.to_lowercase();
        let mut matches: Vec<Entity> = data
            .entities
            .values()
            .filter(|e| e.canonical_name.to_lowercase().contains(&lower) || e.aliases.iter().any(|a| a.to_lowercase().contains(&lower)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn upsert_entity(
        &self,
        kind: EntityKind,
        normalized_name: &str,
        extraction_method: ExtractionMethod,
        extraction_confidence: f64,
    ) -> RepurposeResult<Entity> {
        let id = derive_id(kind, normalized_name);
        let mut data = self.data.write().await;

        if let Some(existing) = data.entities.get(&id) {
            if existing.kind != kind {
                return Err(RepurposeError::RepositoryUnavailable {
                    repository: "graph".to_string(),
                    reason: "conflict".to_string(),
                });
            }
            let mut updated = existing.clone();
            updated.extraction_method = updated.extraction_method.max(extraction_method);
            updated.extraction_confidence = updated.extraction_confidence.max(extraction_confidence).clamp(0.0, 1.0);
            data.entities.insert(id, updated.clone());
            return Ok(updated);
        }

        let entity = Entity::new(normalized_name, kind, extraction_method, extraction_confidence, None, DEFAULT_STOPWORDS)?;
        data.entities.insert(entity.id.clone(), entity.clone());
        Ok(entity)
    }

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
    ) -> RepurposeResult<Edge> {
        self.upsert_entity(source_kind, source_name, extraction_method, confidence).await?;
        self.upsert_entity(target_kind, target_name, extraction_method, confidence).await?;

        let source_id = derive_id(source_kind, source_name);
        let target_id = derive_id(target_kind, target_name);
        let key: EdgeKey = (source_id.clone(), target_id.clone(), relation);

        let mut data = self.data.write().await;
        let confidence = confidence.clamp(0.0, 1.0);
        let edge = match data.edges.get(&key) {
            Some(existing) => {
                let mut merged = existing.clone();
                merged.confidence = merged.confidence.max(confidence);
                merged.evidence_count += 1;
                if let Some(cid) = citation_id {
                    if !merged.supporting_citation_ids.contains(&cid) {
                        merged.supporting_citation_ids.push(cid);
                    }
                }
                merged
            }
            None => Edge {
                source_id,
                target_id,
                relation,
                confidence,
                evidence_count: 1,
                supporting_citation_ids: citation_id.into_iter().collect(),
            },
        };
        data.edges.insert(key, edge.clone());
        Ok(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_entity_is_idempotent() {
        let store = InMemoryGraphStore::new();
        let e1 = store.upsert_entity(EntityKind::Drug, "Metformin", ExtractionMethod::Pattern, 0.6).await.unwrap();
        let e2 = store.upsert_entity(EntityKind::Drug, "Metformin", ExtractionMethod::NerModel, 0.9).await.unwrap();
        assert_eq!(e1.id, e2.id);
        assert_eq!(e2.extraction_method, ExtractionMethod::NerModel);
        assert_eq!(e2.extraction_confidence, 0.9);
    }

    #[tokio::test]
    async fn upsert_entity_detects_kind_conflict() {
        let store = InMemoryGraphStore::new();
        store.upsert_entity(EntityKind::Drug, "Metformin", ExtractionMethod::Pattern, 0.6).await.unwrap();
        let err = store.upsert_entity(EntityKind::Disease, "Metformin", ExtractionMethod::Pattern, 0.6).await.unwrap_err();
        assert!(matches!(err, RepurposeError::RepositoryUnavailable { reason, .. } if reason == "conflict"));
    }

    #[tokio::test]
    async fn upsert_relation_merges_by_identity() {
        let store = InMemoryGraphStore::new();
        let e1 = store
            .upsert_relation(
                "Metformin",
                EntityKind::Drug,
                RelationKind::Activates,
                "AMPK",
                EntityKind::Gene,
                0.6,
                Some("30000001".to_string()),
                ExtractionMethod::Pattern,
            )
            .await
            .unwrap();
        assert_eq!(e1.evidence_count, 1);

        let e2 = store
            .upsert_relation(
                "Metformin",
                EntityKind::Drug,
                RelationKind::Activates,
                "AMPK",
                EntityKind::Gene,
                0.8,
                Some("30000002".to_string()),
                ExtractionMethod::NerModel,
            )
            .await
            .unwrap();
        assert_eq!(e2.evidence_count, 2);
        assert_eq!(e2.confidence, 0.8);
        assert_eq!(e2.supporting_citation_ids.len(), 2);
    }

    #[tokio::test]
    async fn get_drug_targets_filters_by_gene_protein_kind() {
        let store = InMemoryGraphStore::new();
        store
            .upsert_relation(
                "Metformin",
                EntityKind::Drug,
                RelationKind::Activates,
                "AMPK",
                EntityKind::Gene,
                0.7,
                None,
                ExtractionMethod::Pattern,
            )
            .await
            .unwrap();
        store
            .upsert_relation(
                "Metformin",
                EntityKind::Drug,
                RelationKind::Treats,
                "Type 2 Diabetes",
                EntityKind::Disease,
                0.9,
                None,
                ExtractionMethod::Curated,
            )
            .await
            .unwrap();

        let targets = store.get_drug_targets("Metformin", 10).await.unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].relation, RelationKind::Activates);
    }

    #[tokio::test]
    async fn search_matches_substring_case_insensitively() {
        let store = InMemoryGraphStore::new();
        store.upsert_entity(EntityKind::Drug, "Metformin", ExtractionMethod::Curated, 1.0).await.unwrap();
        let results = store.search("metfor", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].canonical_name, "Metformin");
    }

    #[tokio::test]
    async fn get_entity_neighbors_respects_depth() {
        let store = InMemoryGraphStore::new();
        store
            .upsert_relation("Metformin", EntityKind::Drug, RelationKind::Activates, "AMPK", EntityKind::Gene, 0.7, None, ExtractionMethod::Pattern)
            .await
            .unwrap();
        store
            .upsert_relation("AMPK", EntityKind::Gene, RelationKind::AssociatesWith, "Breast Cancer", EntityKind::Disease, 0.5, None, ExtractionMethod::Pattern)
            .await
            .unwrap();

        let one_hop = store.get_entity_neighbors("Metformin", 1, 10).await.unwrap();
        assert_eq!(one_hop.len(), 1);

        let two_hop = store.get_entity_neighbors("Metformin", 2, 10).await.unwrap();
        assert_eq!(two_hop.len(), 2);
    }
}
