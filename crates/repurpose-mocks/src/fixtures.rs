//! Hardcoded drug-repurposing scenarios shared by every mock in this crate.
//!
//! Each scenario names a drug, a disease, and a gene the literature connects
//! them through, plus a small set of fictional abstracts mentioning all
//! three. Real pharmacology inspired the shape of each scenario (metformin's
//! AMPK activation, aspirin's COX-2 inhibition, thalidomide's anti-TNF-alpha
//! activity), but the abstract text itself is invented for testing.

use repurpose_repo::Article;

pub struct Scenario {
    pub drug: &'static str,
    pub disease: &'static str,
    pub gene: &'static str,
    pub mechanism: &'static str,
    pub articles: &'static [(&'static str, &'static str, &'static str)],
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        drug: "Metformin",
        disease: "Breast Cancer",
        gene: "AMPK",
        mechanism: "AMPK-mediated suppression of mTOR signaling slows proliferation in hormone-receptor-positive tumor cells.",
        articles: &[
            (
                "40000001",
                "Metformin activates AMPK and suppresses breast cancer cell proliferation",
                "Metformin activates AMPK, which in turn suppresses mTOR signaling. In models of breast cancer, \
                 this pathway reduces proliferation of hormone-receptor-positive tumor cells.",
            ),
            (
                "40000002",
                "Observational cohort: metformin use and breast cancer recurrence",
                "A retrospective cohort of diabetic patients found that metformin use was associated with a \
                 reduced rate of breast cancer recurrence relative to other antidiabetic agents.",
            ),
            (
                "40000003",
                "AMPK activation as a therapeutic strategy in oncology",
                "AMPK activation has been proposed as a therapeutic strategy across multiple cancer types. \
                 Metformin remains the most extensively studied AMPK activator in repurposing contexts.",
            ),
        ],
    },
    Scenario {
        drug: "Aspirin",
        disease: "Colorectal Cancer",
        gene: "COX-2",
        mechanism: "COX-2 inhibition reduces prostaglandin E2 synthesis, a driver of colorectal adenoma growth.",
        articles: &[
            (
                "40000011",
                "Aspirin inhibits COX-2 and reduces colorectal adenoma growth",
                "Aspirin inhibits COX-2, lowering prostaglandin E2 synthesis. Long-term aspirin use is \
                 associated with reduced colorectal adenoma incidence in at-risk populations.",
            ),
            (
                "40000012",
                "Meta-analysis of aspirin chemoprevention in colorectal cancer",
                "Pooled trial data show regular aspirin use reduces colorectal cancer incidence, with the \
                 effect attributed largely to COX-2 inhibition in colonic mucosa.",
            ),
        ],
    },
    Scenario {
        drug: "Thalidomide",
        disease: "Multiple Myeloma",
        gene: "TNF-alpha",
        mechanism: "TNF-alpha suppression and anti-angiogenic activity reduce myeloma cell survival in the bone marrow niche.",
        articles: &[
            (
                "40000021",
                "Thalidomide suppresses TNF-alpha in multiple myeloma bone marrow",
                "Thalidomide suppresses TNF-alpha production and exerts anti-angiogenic effects within the \
                 bone marrow microenvironment, reducing multiple myeloma cell survival.",
            ),
            (
                "40000022",
                "Clinical response to thalidomide in relapsed multiple myeloma",
                "In a cohort of relapsed multiple myeloma patients, thalidomide produced a measurable \
                 response rate, consistent with its known anti-TNF-alpha mechanism.",
            ),
        ],
    },
];

/// All articles across every scenario whose drug and disease both appear
/// (case-insensitively) in `terms`.
pub fn articles_for_pair(drug: &str, disease: &str) -> Vec<Article> {
    SCENARIOS
        .iter()
        .find(|s| s.drug.eq_ignore_ascii_case(drug) && s.disease.eq_ignore_ascii_case(disease))
        .map(|s| s.articles.iter().map(|a| to_article(a)).collect())
        .unwrap_or_default()
}

/// Articles from any scenario mentioning `name` as its drug, disease, or gene.
pub fn articles_for_entity(name: &str) -> Vec<Article> {
    SCENARIOS
        .iter()
        .find(|s| s.drug.eq_ignore_ascii_case(name) || s.disease.eq_ignore_ascii_case(name) || s.gene.eq_ignore_ascii_case(name))
        .map(|s| s.articles.iter().map(|a| to_article(a)).collect())
        .unwrap_or_default()
}

/// Look up a single article by its fictional PMID, across every scenario.
pub fn article_by_id(id: &str) -> Option<Article> {
    SCENARIOS.iter().flat_map(|s| s.articles.iter()).find(|(pmid, _, _)| *pmid == id).map(to_article)
}

/// The scenario, if any, whose drug and disease both match `drug`/`disease`.
pub fn scenario_for_pair(drug: &str, disease: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.drug.eq_ignore_ascii_case(drug) && s.disease.eq_ignore_ascii_case(disease))
}

fn to_article(entry: &(&'static str, &'static str, &'static str)) -> Article {
    let (pmid, title, abstract_text) = *entry;
    Article { source_id: pmid.to_string(), title: title.to_string(), abstract_text: abstract_text.to_string(), authors: vec![], year: Some(2024), url: None }
}
