//! Typed relations between entities in the knowledge graph.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The relation a directed edge carries between two entities.
///
/// `Unknown` is the landing zone for relation names read back from the
/// store that fall outside this set (§4.D: "relation names outside the
/// defined set are mapped to `unknown` on read").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Inhibits,
    Activates,
    Binds,
    Modulates,
    Upregulates,
    Downregulates,
    Phosphorylates,
    Catalyzes,
    Transports,
    Regulates,
    AssociatesWith,
    Treats,
    Causes,
    Prevents,
    Unknown,
}

impl RelationKind {
    /// All defined relation kinds, in a fixed order used for deterministic
    /// pattern-table iteration and stopword construction. `Unknown` is the
    /// read-back fallback and is deliberately excluded: nothing should ever
    /// try to extract or match on the literal word "unknown".
    pub const DEFINED: &'static [RelationKind] = &[
        RelationKind::Inhibits,
        RelationKind::Activates,
        RelationKind::Binds,
        RelationKind::Modulates,
        RelationKind::Upregulates,
        RelationKind::Downregulates,
        RelationKind::Phosphorylates,
        RelationKind::Catalyzes,
        RelationKind::Transports,
        RelationKind::Regulates,
        RelationKind::AssociatesWith,
        RelationKind::Treats,
        RelationKind::Causes,
        RelationKind::Prevents,
    ];

    /// Canonical lowercase wire name, used in query whitelists and display.
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Inhibits => "inhibits",
            RelationKind::Activates => "activates",
            RelationKind::Binds => "binds",
            RelationKind::Modulates => "modulates",
            RelationKind::Upregulates => "upregulates",
            RelationKind::Downregulates => "downregulates",
            RelationKind::Phosphorylates => "phosphorylates",
            RelationKind::Catalyzes => "catalyzes",
            RelationKind::Transports => "transports",
            RelationKind::Regulates => "regulates",
            RelationKind::AssociatesWith => "associates_with",
            RelationKind::Treats => "treats",
            RelationKind::Causes => "causes",
            RelationKind::Prevents => "prevents",
            RelationKind::Unknown => "unknown",
        }
    }

    /// Parse a relation name from the store, mapping anything unrecognized
    /// to `Unknown` rather than failing the read.
    pub fn from_store_str(value: &str) -> RelationKind {
        RelationKind::DEFINED
            .iter()
            .copied()
            .find(|k| k.as_str() == value)
            .unwrap_or(RelationKind::Unknown)
    }

    /// Single bare word used when checking whether a candidate entity name
    /// collides with a relation word (§4.A). `associates_with` contributes
    /// both "associates" and "with" is intentionally not added — only the
    /// relation's own single-word forms are reserved.
    fn bare_words(self) -> &'static [&'static str] {
        match self {
            RelationKind::AssociatesWith => &["associates_with", "associates"],
            other => {
                // SAFETY-free: every other variant's as_str() is already one word.
                match other {
                    RelationKind::Inhibits => &["inhibits"],
                    RelationKind::Activates => &["activates"],
                    RelationKind::Binds => &["binds"],
                    RelationKind::Modulates => &["modulates"],
                    RelationKind::Upregulates => &["upregulates"],
                    RelationKind::Downregulates => &["downregulates"],
                    RelationKind::Phosphorylates => &["phosphorylates"],
                    RelationKind::Catalyzes => &["catalyzes"],
                    RelationKind::Transports => &["transports"],
                    RelationKind::Regulates => &["regulates"],
                    RelationKind::Treats => &["treats"],
                    RelationKind::Causes => &["causes"],
                    RelationKind::Prevents => &["prevents"],
                    _ => &[],
                }
            }
        }
    }

    /// The set of words reserved across all defined relations, lowercased.
    /// Used by entity validation to reject a name equal to a relation word.
    pub fn reserved_words() -> BTreeSet<&'static str> {
        RelationKind::DEFINED
            .iter()
            .flat_map(|k| k.bare_words().iter().copied())
            .collect()
    }
}

/// A directed, typed relation between two entities, identified by the triple
/// (source_id, target_id, relation). Two edges with the same identity are
/// merged rather than duplicated (§4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    pub relation: RelationKind,
    pub confidence: f64,
    pub evidence_count: u32,
    pub supporting_citation_ids: Vec<String>,
}

impl Edge {
    /// The identity triple used for upsert merging and equality.
    pub fn identity(&self) -> (&str, &str, RelationKind) {
        (self.source_id.as_str(), self.target_id.as_str(), self.relation)
    }
}
