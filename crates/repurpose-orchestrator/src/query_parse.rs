//! Drug/disease hint extraction from the raw query text (§4.H step 1).
//!
//! Structured fields aren't part of the inbound `QueryRequest` (§6 only
//! defines free text plus ranking knobs), so every request resolves its
//! hints by scanning the raw query against two curated name lists and a
//! suffix heuristic for drug-shaped words the lists miss. These hints only
//! drive ingestion (§4.E) — the `entity_extraction` stage's own output is
//! authoritative for everything downstream (§9 Open Questions).

/// ~50 known drug names, lowercase, checked as whole-word substrings of the
/// query. Not exhaustive — a miss here just means ingestion doesn't
/// pre-fetch literature; the NER/synthesizer path in `entity_extraction`
/// still finds the entity from the text itself.
const KNOWN_DRUGS: &[&str] = &[
    "metformin", "aspirin", "ibuprofen", "simvastatin", "atorvastatin", "rosuvastatin",
    "lisinopril", "losartan", "amlodipine", "metoprolol", "omeprazole", "pantoprazole",
    "levothyroxine", "albuterol", "prednisone", "dexamethasone", "warfarin", "clopidogrel",
    "rivaroxaban", "apixaban", "insulin", "sitagliptin", "empagliflozin", "pioglitazone",
    "thalidomide", "sildenafil", "tadalafil", "minoxidil", "finasteride", "naltrexone",
    "chlorpromazine", "haloperidol", "lithium", "valproate", "gabapentin", "pregabalin",
    "methotrexate", "hydroxychloroquine", "sulfasalazine", "azathioprine", "cyclosporine",
    "tacrolimus", "sirolimus", "rapamycin", "doxycycline", "azithromycin", "ciprofloxacin",
    "rifampin", "isoniazid", "fluoxetine", "sertraline", "propranolol", "disulfiram",
];

/// ~40 known disease/condition names, lowercase, matched the same way.
const KNOWN_DISEASES: &[&str] = &[
    "breast cancer", "lung cancer", "colorectal cancer", "prostate cancer", "pancreatic cancer",
    "melanoma", "leukemia", "lymphoma", "glioblastoma", "ovarian cancer",
    "type 2 diabetes", "type 1 diabetes", "hypertension", "atherosclerosis", "heart failure",
    "atrial fibrillation", "stroke", "alzheimer's disease", "parkinson's disease",
    "multiple sclerosis", "amyotrophic lateral sclerosis", "epilepsy", "depression",
    "schizophrenia", "bipolar disorder", "rheumatoid arthritis", "osteoarthritis", "psoriasis",
    "lupus", "crohn's disease", "ulcerative colitis", "asthma",
    "chronic obstructive pulmonary disease", "cystic fibrosis", "tuberculosis", "hiv",
    "hepatitis c", "covid-19", "obesity", "osteoporosis", "chronic kidney disease",
];

/// Suffixes common to drug names (INN stems) not already covered by the
/// curated list. A word-shaped token ending in one of these, long enough to
/// not be a false positive on common English words, is treated as a drug hint.
const DRUG_SUFFIXES: &[&str] = &[
    "mab", "nib", "pril", "sartan", "statin", "olol", "azole", "cillin", "mycin", "parin", "gliptin", "gliflozin", "tinib",
];

/// A resolved (drug, disease) hint pair, either half of which may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryHints {
    pub drug: Option<String>,
    pub disease: Option<String>,
}

/// Scan `query` for a drug hint and a disease hint, preferring the curated
/// lists (longest match first, so "type 2 diabetes" wins over a shorter
/// false positive) and falling back to the drug-suffix heuristic.
pub fn extract_hints(query: &str) -> QueryHints {
    let lower = query.to_lowercase();

    let disease = find_longest_match(&lower, KNOWN_DISEASES);
    let drug = find_longest_match(&lower, KNOWN_DRUGS).or_else(|| find_suffix_drug(&lower));

    QueryHints { drug, disease }
}

fn find_longest_match(lower_query: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .filter(|name| contains_word(lower_query, name))
        .max_by_key(|name| name.len())
        .map(|name| title_case(name))
}

/// Substring containment that tolerates the candidate being multi-word
/// (e.g. "type 2 diabetes") — a plain `contains` is sufficient since these
/// lists are curated lowercase phrases, not single tokens that could
/// collide with a larger unrelated word.
fn contains_word(lower_query: &str, candidate: &str) -> bool {
    lower_query.contains(candidate)
}

/// Tokenize on non-alphanumeric boundaries and look for a word at least 6
/// characters long ending in a known drug suffix.
fn find_suffix_drug(lower_query: &str) -> Option<String> {
    lower_query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 6)
        .find(|w| DRUG_SUFFIXES.iter().any(|suffix| w.ends_with(suffix)))
        .map(title_case)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_drug_and_disease() {
        let hints = extract_hints("Could metformin be repurposed for breast cancer?");
        assert_eq!(hints.drug, Some("Metformin".to_string()));
        assert_eq!(hints.disease, Some("Breast Cancer".to_string()));
    }

    #[test]
    fn prefers_longer_disease_match() {
        let hints = extract_hints("Does this help with type 2 diabetes management?");
        assert_eq!(hints.disease, Some("Type 2 Diabetes".to_string()));
    }

    #[test]
    fn falls_back_to_drug_suffix_heuristic() {
        let hints = extract_hints("Is pembrolizumab effective here?");
        assert_eq!(hints.drug, Some("Pembrolizumab".to_string()));
    }

    #[test]
    fn disease_only_query_has_no_drug_hint() {
        let hints = extract_hints("What causes breast cancer to metastasize?");
        assert!(hints.drug.is_none());
        assert_eq!(hints.disease, Some("Breast Cancer".to_string()));
    }
}
