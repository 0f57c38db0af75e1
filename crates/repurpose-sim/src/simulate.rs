//! BFS traversal, path scoring, and aggregation (§4.F "Traversal",
//! "Path scoring", "Aggregation").

use std::collections::{HashSet, VecDeque};

use repurpose_domain::entity::{Entity, EntityKind};
use repurpose_domain::evidence::Evidence;
use repurpose_domain::path::{PathHop, PathwayPath, RejectedPath, SimulationResult};
use repurpose_domain::workflow::GraphContext;

use crate::graph::{build_graph, SimGraph};

const MAX_PATH_LENGTH: usize = 5;
const LENGTH_PENALTY_BASE: f64 = 0.85;
const ACCEPT_THRESHOLD: f64 = 0.15;
const TOP_N_FOR_PLAUSIBILITY: usize = 3;

struct QueueItem {
    node: String,
    path: Vec<PathHop>,
    visited: HashSet<String>,
}

/// Run the pathway simulator over `entities`, `evidence`, and the preloaded
/// `graph_context`. Always produces a `SimulationResult`, even when no
/// drug or disease entity is present.
pub fn simulate_pathways(entities: &[Entity], evidence: &[Evidence], graph_context: &GraphContext) -> SimulationResult {
    let drug = entities.iter().find(|e| e.kind == EntityKind::Drug);
    let disease = entities.iter().find(|e| e.kind == EntityKind::Disease);

    let (drug, disease) = match (drug, disease) {
        (None, _) => {
            return SimulationResult {
                drug_name: None,
                disease_name: disease.map(|d| d.canonical_name.clone()),
                accepted_paths: vec![],
                rejected_paths: vec![RejectedPath {
                    description: "no pathway simulated".to_string(),
                    final_confidence: 0.0,
                    reason: "need at least one drug entity to begin simulation".to_string(),
                }],
                overall_plausibility: 0.0,
            };
        }
        (Some(_), None) => {
            return SimulationResult {
                drug_name: drug.map(|d| d.canonical_name.clone()),
                disease_name: None,
                accepted_paths: vec![],
                rejected_paths: vec![RejectedPath {
                    description: "no pathway simulated".to_string(),
                    final_confidence: 0.0,
                    reason: "need at least one disease entity as a simulation target".to_string(),
                }],
                overall_plausibility: 0.0,
            };
        }
        (Some(d), Some(dis)) => (d, dis),
    };

    let graph = build_graph(entities, evidence, graph_context);
    let (mut accepted, mut rejected) = run_bfs(&graph, &drug.canonical_name, &disease.canonical_name, evidence);

    if accepted.is_empty() && rejected.is_empty() {
        rejected.push(RejectedPath {
            description: format!("{} -> ... -> {}", drug.canonical_name, disease.canonical_name),
            final_confidence: 0.0,
            reason: "no path found within 5 edges".to_string(),
        });
    }

    accepted.sort_by(|a: &PathwayPath, b: &PathwayPath| {
        b.aggregated_confidence
            .partial_cmp(&a.aggregated_confidence)
            .unwrap()
            .then(a.edges.len().cmp(&b.edges.len()))
            .then(a.rationale.cmp(&b.rationale))
    });
    for (idx, path) in accepted.iter_mut().enumerate() {
        path.id = format!("path:{}:{}:{}", drug.canonical_name, disease.canonical_name, idx + 1);
    }

    let overall_plausibility = if accepted.is_empty() {
        0.0
    } else {
        let top: Vec<f64> = accepted.iter().take(TOP_N_FOR_PLAUSIBILITY).map(|p| p.aggregated_confidence).collect();
        top.iter().sum::<f64>() / top.len() as f64
    };

    SimulationResult {
        drug_name: Some(drug.canonical_name.clone()),
        disease_name: Some(disease.canonical_name.clone()),
        accepted_paths: accepted,
        rejected_paths: rejected,
        overall_plausibility,
    }
}

fn run_bfs(graph: &SimGraph, drug: &str, disease: &str, evidence: &[Evidence]) -> (Vec<PathwayPath>, Vec<RejectedPath>) {
    let disease_lower = disease.to_lowercase();
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    let mut queue: VecDeque<QueueItem> = VecDeque::new();
    queue.push_back(QueueItem { node: drug.to_string(), path: vec![], visited: [drug.to_string()].into_iter().collect() });

    while let Some(item) = queue.pop_front() {
        if item.path.len() >= MAX_PATH_LENGTH {
            continue;
        }
        for edge in graph.neighbors(&item.node) {
            if item.visited.contains(&edge.target) {
                continue;
            }
            let mut new_path = item.path.clone();
            new_path.push(PathHop {
                source_entity: item.node.clone(),
                target_entity: edge.target.clone(),
                relation: edge.relation,
                confidence: edge.confidence,
            });

            if edge.target.to_lowercase().contains(&disease_lower) {
                let (final_confidence, evidence_support) = score_path(&new_path, evidence);
                let rationale = describe_path(&new_path);
                if final_confidence >= ACCEPT_THRESHOLD {
                    accepted.push(PathwayPath {
                        id: String::new(),
                        edges: new_path,
                        aggregated_confidence: final_confidence,
                        evidence_support,
                        rationale,
                    });
                } else {
                    rejected.push(RejectedPath {
                        description: rationale,
                        final_confidence,
                        reason: format!("confidence {final_confidence:.3} below acceptance threshold {ACCEPT_THRESHOLD}"),
                    });
                }
                continue;
            }

            if new_path.len() < MAX_PATH_LENGTH {
                let mut new_visited = item.visited.clone();
                new_visited.insert(edge.target.clone());
                queue.push_back(QueueItem { node: edge.target.clone(), path: new_path, visited: new_visited });
            }
        }
    }

    (accepted, rejected)
}

fn score_path(path: &[PathHop], evidence: &[Evidence]) -> (f64, f64) {
    let base_conf: f64 = path.iter().map(|h| h.confidence).product();
    let length_penalty = LENGTH_PENALTY_BASE.powi((path.len() as i32) - 1);

    let mut path_entities: HashSet<String> = HashSet::new();
    for hop in path {
        path_entities.insert(hop.source_entity.to_lowercase());
        path_entities.insert(hop.target_entity.to_lowercase());
    }

    let contributions: Vec<f64> = evidence
        .iter()
        .filter_map(|e| {
            let overlap = e.entities_mentioned.iter().filter(|name| path_entities.contains(&name.to_lowercase())).count();
            if overlap == 0 {
                None
            } else {
                Some(e.confidence * (overlap as f64 / path_entities.len() as f64))
            }
        })
        .collect();
    let evidence_support = if contributions.is_empty() { 0.0 } else { contributions.iter().sum::<f64>() / contributions.len() as f64 };

    let final_conf = (base_conf * length_penalty * (1.0 + 0.3 * evidence_support)).min(1.0);
    (final_conf, evidence_support)
}

fn describe_path(path: &[PathHop]) -> String {
    let mut parts = Vec::with_capacity(path.len() + 1);
    if let Some(first) = path.first() {
        parts.push(first.source_entity.clone());
    }
    for hop in path {
        parts.push(format!("--[{}]--> {}", hop.relation.as_str(), hop.target_entity));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use repurpose_domain::entity::ExtractionMethod;
    use repurpose_domain::evidence::EvidenceKind;

    fn entity(name: &str, kind: EntityKind) -> Entity {
        Entity::new(name, kind, ExtractionMethod::NerModel, 0.9, None, &[]).unwrap()
    }

    #[test]
    fn missing_drug_yields_rejected_path_with_drug_reason() {
        let entities = vec![entity("Breast Cancer", EntityKind::Disease)];
        let result = simulate_pathways(&entities, &[], &GraphContext::default());
        assert!(result.accepted_paths.is_empty());
        assert_eq!(result.overall_plausibility, 0.0);
        assert!(result.rejected_paths[0].reason.contains("need at least one drug"));
    }

    #[test]
    fn missing_disease_yields_rejected_path_with_disease_reason() {
        let entities = vec![entity("Metformin", EntityKind::Drug)];
        let result = simulate_pathways(&entities, &[], &GraphContext::default());
        assert!(result.rejected_paths[0].reason.contains("need at least one disease"));
    }

    #[test]
    fn two_hop_path_through_evidence_is_accepted() {
        let entities =
            vec![entity("Metformin", EntityKind::Drug), entity("AMPK", EntityKind::Gene), entity("Breast Cancer", EntityKind::Disease)];
        let evidence = vec![
            Evidence {
                id: "e1".into(),
                kind: EvidenceKind::Literature,
                description: "Metformin activates AMPK".into(),
                confidence: 0.9,
                citation: None,
                mechanism_path_id: None,
                entities_mentioned: vec!["Metformin".into(), "AMPK".into()],
            },
            Evidence {
                id: "e2".into(),
                kind: EvidenceKind::Literature,
                description: "AMPK is associated with breast cancer growth suppression".into(),
                confidence: 0.8,
                citation: None,
                mechanism_path_id: None,
                entities_mentioned: vec!["AMPK".into(), "Breast Cancer".into()],
            },
        ];
        let result = simulate_pathways(&entities, &evidence, &GraphContext::default());
        assert!(result.has_valid_paths(), "expected at least one accepted path, rejected={:?}", result.rejected_paths);
        assert!(result.accepted_paths[0].aggregated_confidence >= ACCEPT_THRESHOLD);
        assert_eq!(result.accepted_paths[0].edges[0].source_entity, "Metformin");
        assert_eq!(result.accepted_paths[0].edges.last().unwrap().target_entity, "Breast Cancer");
    }

    #[test]
    fn empty_evidence_and_context_yields_zero_plausibility() {
        let entities = vec![entity("Metformin", EntityKind::Drug), entity("Breast Cancer", EntityKind::Disease)];
        let result = simulate_pathways(&entities, &[], &GraphContext::default());
        assert_eq!(result.overall_plausibility, 0.0);
        assert!(!result.rejected_paths.is_empty());
    }

    #[test]
    fn no_cycles_within_a_single_path() {
        let entities = vec![entity("Metformin", EntityKind::Drug), entity("AMPK", EntityKind::Gene), entity("Breast Cancer", EntityKind::Disease)];
        let evidence = vec![Evidence {
            id: "e1".into(),
            kind: EvidenceKind::Literature,
            description: "Metformin activates AMPK which activates Metformin".into(),
            confidence: 0.9,
            citation: None,
            mechanism_path_id: None,
            entities_mentioned: vec!["Metformin".into(), "AMPK".into()],
        }];
        let result = simulate_pathways(&entities, &evidence, &GraphContext::default());
        for path in &result.accepted_paths {
            let mut seen = HashSet::new();
            seen.insert(path.edges[0].source_entity.clone());
            for hop in &path.edges {
                assert!(seen.insert(hop.target_entity.clone()), "path revisits a node: {path:?}");
            }
        }
    }
}
