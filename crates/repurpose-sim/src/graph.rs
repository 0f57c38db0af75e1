//! The in-memory directed graph the simulator builds fresh per run (§4.F
//! "Graph construction").

use std::collections::{BTreeMap, HashMap};

use repurpose_domain::edge::RelationKind;
use repurpose_domain::entity::{display_name_from_id, Entity, EntityKind};
use repurpose_domain::evidence::Evidence;
use repurpose_domain::relation_patterns::{detect_relation, relation_modifier};
use repurpose_domain::workflow::GraphContext;

const CANONICAL_DRUG_GENE_CONFIDENCE: f64 = 0.6;
const CANONICAL_GENE_DISEASE_CONFIDENCE: f64 = 0.5;
const CANONICAL_DRUG_DISEASE_CONFIDENCE: f64 = 0.4;

#[derive(Debug, Clone)]
pub struct SimEdge {
    pub target: String,
    pub relation: RelationKind,
    pub confidence: f64,
}

/// Adjacency list keyed by normalized source name. Every entity is present
/// as a key even when it has no outgoing edges.
#[derive(Debug, Default)]
pub struct SimGraph {
    adjacency: BTreeMap<String, Vec<SimEdge>>,
}

impl SimGraph {
    pub fn neighbors(&self, node: &str) -> &[SimEdge] {
        self.adjacency.get(node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn contains_node(&self, node: &str) -> bool {
        self.adjacency.contains_key(node)
    }

    fn node_mut(&mut self, name: &str) -> &mut Vec<SimEdge> {
        self.adjacency.entry(name.to_string()).or_default()
    }

    fn add_edge(&mut self, source: &str, target: &str, relation: RelationKind, confidence: f64) {
        self.node_mut(target);
        let edges = self.node_mut(source);
        if let Some(existing) = edges.iter_mut().find(|e| e.target == target && e.relation == relation) {
            existing.confidence = existing.confidence.max(confidence);
        } else {
            edges.push(SimEdge { target: target.to_string(), relation, confidence });
        }
    }

    fn add_canonical_edge_if_absent(&mut self, source: &str, target: &str, relation: RelationKind, confidence: f64) {
        self.node_mut(target);
        let has_any_edge_to_target = self.node_mut(source).iter().any(|e| e.target == target);
        if !has_any_edge_to_target {
            self.add_edge(source, target, relation, confidence);
        }
    }

    fn sort_adjacency(&mut self) {
        for edges in self.adjacency.values_mut() {
            edges.sort_by(|a, b| a.target.cmp(&b.target).then(a.relation.cmp(&b.relation)));
        }
    }
}

fn role_rank(kind: EntityKind) -> u8 {
    match kind {
        EntityKind::Drug => 0,
        EntityKind::Gene | EntityKind::Protein | EntityKind::Pathway | EntityKind::Phenotype => 1,
        EntityKind::Disease => 2,
    }
}

/// Direction follows the role ordering drug -> other -> disease (§4.F step
/// 2); a tie between two intermediate kinds breaks alphabetically for
/// determinism.
fn ordered_pair<'a>(name_a: &'a str, kind_a: EntityKind, name_b: &'a str, kind_b: EntityKind) -> (&'a str, &'a str) {
    let rank_a = role_rank(kind_a);
    let rank_b = role_rank(kind_b);
    match rank_a.cmp(&rank_b) {
        std::cmp::Ordering::Less => (name_a, name_b),
        std::cmp::Ordering::Greater => (name_b, name_a),
        std::cmp::Ordering::Equal => {
            if name_a <= name_b {
                (name_a, name_b)
            } else {
                (name_b, name_a)
            }
        }
    }
}

/// Build the simulation graph from the request's entities, evidence, and
/// preloaded graph context.
///
/// The three canonical edges in §4.F step 3 are derived from the preloaded
/// graph context rather than materialized unconditionally: an empty
/// context (no prior graph data at all) yields no canonical edges, so a
/// drug/disease pair backed by neither fresh evidence nor prior graph data
/// produces zero reachable paths. Materializing them unconditionally would
/// hand every pair a free `treats` edge at confidence 0.4, which
/// contradicts the "plausibility 0.0 on empty literature with no
/// preloaded graph" scenario — the canonical edges exist to keep a
/// *previously evidenced* pair reachable when this round's literature
/// fetch comes back empty, not to fabricate connectivity from nothing.
pub fn build_graph(entities: &[Entity], evidence: &[Evidence], graph_context: &GraphContext) -> SimGraph {
    let mut graph = SimGraph::default();
    let mut name_lookup: HashMap<String, (String, EntityKind)> = HashMap::new();
    for entity in entities {
        graph.node_mut(&entity.canonical_name);
        name_lookup.insert(entity.canonical_name.to_lowercase(), (entity.canonical_name.clone(), entity.kind));
    }

    for item in evidence {
        let Some(relation) = detect_relation(&item.description) else { continue };
        let modifier = relation_modifier(relation);

        let mut mentioned: Vec<(String, EntityKind)> = item
            .entities_mentioned
            .iter()
            .filter_map(|name| name_lookup.get(&name.to_lowercase()).cloned())
            .collect();
        mentioned.sort_by(|a, b| a.0.cmp(&b.0));
        mentioned.dedup_by(|a, b| a.0 == b.0);

        for i in 0..mentioned.len() {
            for j in (i + 1)..mentioned.len() {
                let (name_a, kind_a) = &mentioned[i];
                let (name_b, kind_b) = &mentioned[j];
                if kind_a == kind_b {
                    continue;
                }
                let (source, target) = ordered_pair(name_a, *kind_a, name_b, *kind_b);
                let confidence = (item.confidence * modifier).clamp(0.0, 1.0);
                graph.add_edge(source, target, relation, confidence);
            }
        }
    }

    for edge in &graph_context.drug_targets {
        if let (Some((_, source)), Some((target_kind, target))) =
            (display_name_from_id(&edge.source_id), display_name_from_id(&edge.target_id))
        {
            if matches!(target_kind, EntityKind::Gene | EntityKind::Protein) {
                graph.add_canonical_edge_if_absent(&source, &target, RelationKind::Modulates, CANONICAL_DRUG_GENE_CONFIDENCE);
            }
        }
    }
    for edge in &graph_context.disease_genes {
        if let (Some((source_kind, source)), Some((_, target))) =
            (display_name_from_id(&edge.source_id), display_name_from_id(&edge.target_id))
        {
            if matches!(source_kind, EntityKind::Gene | EntityKind::Protein) {
                graph.add_canonical_edge_if_absent(&source, &target, RelationKind::AssociatesWith, CANONICAL_GENE_DISEASE_CONFIDENCE);
            }
        }
    }
    for edge in &graph_context.pathway_edges {
        if let (Some((_, source)), Some((_, target))) =
            (display_name_from_id(&edge.source_id), display_name_from_id(&edge.target_id))
        {
            graph.add_canonical_edge_if_absent(&source, &target, RelationKind::Treats, CANONICAL_DRUG_DISEASE_CONFIDENCE);
        }
    }

    graph.sort_adjacency();
    graph
}
