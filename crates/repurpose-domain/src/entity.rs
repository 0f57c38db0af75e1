//! Biomedical entities: the immutable nodes of the knowledge graph.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::edge::RelationKind;
use crate::error::{RepurposeError, RepurposeResult};

/// The six kinds of biomedical concept the core reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Drug,
    Disease,
    Gene,
    Protein,
    Pathway,
    Phenotype,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Drug => "drug",
            EntityKind::Disease => "disease",
            EntityKind::Gene => "gene",
            EntityKind::Protein => "protein",
            EntityKind::Pathway => "pathway",
            EntityKind::Phenotype => "phenotype",
        }
    }

    pub fn from_str_loose(value: &str) -> Option<EntityKind> {
        match value.to_ascii_lowercase().as_str() {
            "drug" | "chemical" | "compound" => Some(EntityKind::Drug),
            "disease" | "condition" | "disorder" => Some(EntityKind::Disease),
            "gene" => Some(EntityKind::Gene),
            "protein" => Some(EntityKind::Protein),
            "pathway" => Some(EntityKind::Pathway),
            "phenotype" => Some(EntityKind::Phenotype),
            _ => None,
        }
    }
}

/// Provenance of an entity or edge, in ascending order of authority.
///
/// `upsert_relation` upgrades `extraction_method` monotonically along this
/// order (§4.D) — a later write with a weaker method never downgrades the
/// stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Pattern,
    NerModel,
    ScorerModel,
    Synthesizer,
    Curated,
}

impl ExtractionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionMethod::Pattern => "pattern",
            ExtractionMethod::NerModel => "ner_model",
            ExtractionMethod::ScorerModel => "scorer_model",
            ExtractionMethod::Synthesizer => "synthesizer",
            ExtractionMethod::Curated => "curated",
        }
    }
}

/// A canonical biomedical concept. Immutable once constructed — callers
/// that need a changed name or kind must construct a new `Entity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub canonical_name: String,
    pub kind: EntityKind,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub extraction_method: ExtractionMethod,
    pub extraction_confidence: f64,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Default configured stopwords rejected as entity names (§4.A). Plain
/// English function words that NER/pattern extraction sometimes mistakes
/// for a biomedical span.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "in", "on", "for", "to", "with",
    "is", "are", "was", "were", "this", "that", "these", "those", "it",
    "as", "by", "be", "been", "being", "at", "from", "into", "via",
];

/// Normalize a raw entity name per the kind-specific rule (§4.A): drugs and
/// diseases become title case, genes and proteins become upper case;
/// whitespace is trimmed and internal runs of spaces collapse to one.
pub fn normalize_name(raw: &str, kind: EntityKind) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    match kind {
        EntityKind::Gene | EntityKind::Protein => collapsed.to_uppercase(),
        _ => title_case(&collapsed),
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validate a normalized entity name against the rejection rules in §4.A.
/// Returns `Ok(())` when the name is acceptable; otherwise the offending
/// field is named in the returned error so the caller can surface it as
/// `schema_invalid`.
pub fn validate_name(normalized: &str, stopwords: &[&str]) -> RepurposeResult<()> {
    if normalized.chars().count() < 2 {
        return Err(RepurposeError::InputInvalid {
            reason: format!("entity name '{normalized}' is shorter than 2 characters"),
        });
    }
    if !normalized.is_empty() && normalized.chars().all(|c| c.is_ascii_digit()) {
        return Err(RepurposeError::InputInvalid {
            reason: format!("entity name '{normalized}' contains only digits"),
        });
    }
    let lower = normalized.to_lowercase();
    if RelationKind::reserved_words().contains(lower.as_str()) {
        return Err(RepurposeError::InputInvalid {
            reason: format!("entity name '{normalized}' collides with a relation word"),
        });
    }
    if stopwords.contains(&lower.as_str()) {
        return Err(RepurposeError::InputInvalid {
            reason: format!("entity name '{normalized}' is a stopword"),
        });
    }
    Ok(())
}

/// Build the canonical id for an entity that has no curated external
/// identifier: `{kind}:{lower(name).snake_case}`.
pub fn derive_id(kind: EntityKind, normalized_name: &str) -> String {
    let snake = normalized_name
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!("{}:{}", kind.as_str(), snake)
}

/// Invert `derive_id`: recover a normalized display name and kind from an
/// id of the form `{kind}:{snake_name}`. Used by the pathway simulator to
/// label canonical edges derived from preloaded graph edges, which carry
/// ids rather than display names.
pub fn display_name_from_id(id: &str) -> Option<(EntityKind, String)> {
    let (kind_str, slug) = id.split_once(':')?;
    let kind = EntityKind::from_str_loose(kind_str)?;
    let raw = slug.replace('_', " ");
    Some((kind, normalize_name(&raw, kind)))
}

impl Entity {
    /// Construct and validate an entity, normalizing its name and deriving
    /// an id when `curated_id` is absent. Mirrors the domain model's
    /// "construct-and-validate" operation (§4.A) — there is no path to an
    /// `Entity` value that skips validation.
    pub fn new(
        raw_name: &str,
        kind: EntityKind,
        extraction_method: ExtractionMethod,
        extraction_confidence: f64,
        curated_id: Option<String>,
        stopwords: &[&str],
    ) -> RepurposeResult<Entity> {
        let canonical_name = normalize_name(raw_name, kind);
        validate_name(&canonical_name, stopwords)?;
        let id = curated_id.unwrap_or_else(|| derive_id(kind, &canonical_name));
        Ok(Entity {
            id,
            canonical_name,
            kind,
            aliases: Vec::new(),
            extraction_method,
            extraction_confidence: extraction_confidence.clamp(0.0, 1.0),
            metadata: BTreeMap::new(),
        })
    }

    /// Identity comparison per §3: entities compare by `id`, not by name or
    /// metadata.
    pub fn same_identity(&self, other: &Entity) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_drug_to_title_case() {
        assert_eq!(normalize_name("  metformin  hcl ", EntityKind::Drug), "Metformin Hcl");
    }

    #[test]
    fn normalizes_gene_to_upper_case() {
        assert_eq!(normalize_name("ampk", EntityKind::Gene), "AMPK");
    }

    #[test]
    fn rejects_short_names() {
        assert!(validate_name("A", DEFAULT_STOPWORDS).is_err());
    }

    #[test]
    fn rejects_all_digit_names() {
        assert!(validate_name("12345", DEFAULT_STOPWORDS).is_err());
    }

    #[test]
    fn rejects_relation_words() {
        assert!(validate_name("Inhibits", DEFAULT_STOPWORDS).is_err());
        assert!(validate_name("associates_with", DEFAULT_STOPWORDS).is_err());
    }

    #[test]
    fn rejects_stopwords() {
        assert!(validate_name("With", DEFAULT_STOPWORDS).is_err());
    }

    #[test]
    fn accepts_valid_name() {
        assert!(validate_name("Metformin", DEFAULT_STOPWORDS).is_ok());
    }

    #[test]
    fn derives_id_from_kind_and_name() {
        assert_eq!(derive_id(EntityKind::Drug, "Breast Cancer"), "drug:breast_cancer");
    }

    #[test]
    fn display_name_from_id_round_trips_derive_id() {
        let id = derive_id(EntityKind::Gene, "AMPK");
        assert_eq!(display_name_from_id(&id), Some((EntityKind::Gene, "AMPK".to_string())));
    }

    #[test]
    fn display_name_from_id_rejects_unknown_kind() {
        assert_eq!(display_name_from_id("widget:foo"), None);
    }

    #[test]
    fn entity_new_validates_and_normalizes() {
        let entity = Entity::new(
            "  breast   cancer ",
            EntityKind::Disease,
            ExtractionMethod::NerModel,
            0.9,
            None,
            DEFAULT_STOPWORDS,
        )
        .unwrap();
        assert_eq!(entity.canonical_name, "Breast Cancer");
        assert_eq!(entity.id, "disease:breast_cancer");
    }

    #[test]
    fn entity_new_rejects_invalid_name() {
        let result = Entity::new(
            "42",
            EntityKind::Drug,
            ExtractionMethod::Pattern,
            0.5,
            None,
            DEFAULT_STOPWORDS,
        );
        assert!(result.is_err());
    }
}
