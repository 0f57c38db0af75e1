//! The keyword/regex relation table shared by the ingestion pipeline (§4.E)
//! and the pathway simulator (§4.F) — both detect a relation type from the
//! same pattern set, described in the spec as "the same keyword table".
//!
//! Ingestion applies this to sentences pulled from fetched abstracts;
//! the simulator applies it to evidence descriptions when building its
//! in-memory graph. Patterns are tried in table order and the first match
//! wins, which is what makes detection deterministic.

use std::sync::OnceLock;

use regex::Regex;

use crate::edge::RelationKind;

/// One relation's ordered list of regex patterns, matched case-insensitively.
struct RelationPattern {
    relation: RelationKind,
    patterns: &'static [&'static str],
}

/// Table order is significant: `detect_relation` returns the first relation
/// whose pattern matches, so more specific relations are listed before more
/// general ones that might also match the same sentence.
const RELATION_PATTERNS: &[RelationPattern] = &[
    RelationPattern { relation: RelationKind::Inhibits, patterns: &["inhibits?", "blocks?", "suppresses?", "antagoni(?:st|zes)", "downregulates?"] },
    RelationPattern { relation: RelationKind::Activates, patterns: &["activates?", "stimulates?", "induces?", "promotes?", "agoni(?:st|zes)", "upregulates?"] },
    RelationPattern { relation: RelationKind::Binds, patterns: &["binds?", "interacts? with", "affinity for", "ligand"] },
    RelationPattern { relation: RelationKind::Modulates, patterns: &["modulates?", "regulates?"] },
    RelationPattern { relation: RelationKind::Prevents, patterns: &["prevents?", "protects? against"] },
    RelationPattern { relation: RelationKind::Treats, patterns: &["treats?", "therapy for", "effective against", "used for", "repurpos(?:ed|ing) for"] },
    RelationPattern { relation: RelationKind::Causes, patterns: &["causes?", "leads to", "associated with"] },
];

struct CompiledTable {
    entries: Vec<(RelationKind, Vec<Regex>)>,
}

fn compiled_table() -> &'static CompiledTable {
    static TABLE: OnceLock<CompiledTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let entries = RELATION_PATTERNS
            .iter()
            .map(|p| {
                let regexes = p
                    .patterns
                    .iter()
                    .map(|pat| {
                        Regex::new(&format!("(?i){pat}")).expect("relation pattern must compile")
                    })
                    .collect();
                (p.relation, regexes)
            })
            .collect();
        CompiledTable { entries }
    })
}

/// Apply the relation keyword table to `text`, returning the first relation
/// whose pattern set matches. `None` when nothing in the table matches,
/// which means the pair is dropped by the caller (§4.E step 4b).
pub fn detect_relation(text: &str) -> Option<RelationKind> {
    let table = compiled_table();
    for (relation, regexes) in &table.entries {
        if regexes.iter().any(|re| re.is_match(text)) {
            return Some(*relation);
        }
    }
    None
}

/// The per-relation confidence modifier the pathway simulator applies when
/// converting an evidence item into a graph edge (§4.F step 2): `confidence
/// = evidence_confidence * relation_modifier(relation)`. Constants range
/// 0.40 - 1.00, with `treats` carrying the highest weight as the most direct
/// possible relation and `causes` the lowest since a causal mention is the
/// weakest indicator of a useful repurposing mechanism.
pub fn relation_modifier(relation: RelationKind) -> f64 {
    match relation {
        RelationKind::Treats => 1.00,
        RelationKind::Prevents => 0.90,
        RelationKind::Activates => 0.80,
        RelationKind::Inhibits => 0.75,
        RelationKind::Binds => 0.70,
        RelationKind::Modulates => 0.65,
        RelationKind::Upregulates => 0.60,
        RelationKind::Downregulates => 0.60,
        RelationKind::Phosphorylates => 0.55,
        RelationKind::Catalyzes => 0.55,
        RelationKind::Regulates => 0.55,
        RelationKind::Transports => 0.50,
        RelationKind::AssociatesWith => 0.45,
        RelationKind::Causes => 0.40,
        RelationKind::Unknown => 0.40,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_inhibits_before_activates() {
        assert_eq!(
            detect_relation("Metformin inhibits complex I of the mitochondrial chain"),
            Some(RelationKind::Inhibits)
        );
    }

    #[test]
    fn detects_treats_relation() {
        assert_eq!(
            detect_relation("Metformin is used for type 2 diabetes"),
            Some(RelationKind::Treats)
        );
    }

    #[test]
    fn returns_none_when_no_pattern_matches() {
        assert_eq!(detect_relation("The patient reported mild nausea"), None);
    }

    #[test]
    fn modifiers_are_within_spec_range() {
        for relation in RelationKind::DEFINED.iter().copied() {
            let m = relation_modifier(relation);
            assert!((0.40..=1.00).contains(&m), "{relation:?} modifier {m} out of range");
        }
    }
}
