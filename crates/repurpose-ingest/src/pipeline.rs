//! The ingestion algorithm itself (§4.E "Algorithm").

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use repurpose_domain::cancellation::Cancellation;
use repurpose_domain::entity::{normalize_name, validate_name, EntityKind, ExtractionMethod, DEFAULT_STOPWORDS};
use repurpose_domain::error::RepurposeResult;
use repurpose_domain::relation_patterns::detect_relation;
use repurpose_repo::{Article, KnowledgeGraphRepository, LiteratureClient, NerExtractor};

/// Capped at 10 PMIDs per ingestion cycle (§4.E step 1).
const MAX_ARTICLES: usize = 10;
/// Minimum confidence for a regex-detected relation to be persisted (§4.E step 4c).
const RELATION_ACCEPT_THRESHOLD: f64 = 0.5;
/// Fixed penalty for regex-level relation extraction (§4.E step 4c).
const REGEX_PENALTY: f64 = 0.8;

/// On-demand materialization of a drug/disease subgraph from literature.
///
/// Holds a process-wide set of already-ingested article ids (§5: "guarded to
/// allow concurrent ingestion without duplicating writes") so two concurrent
/// requests for the same pair never run NER over the same abstract twice.
pub struct IngestionPipeline {
    literature: Arc<dyn LiteratureClient>,
    extractor: Arc<dyn NerExtractor>,
    graph: Arc<dyn KnowledgeGraphRepository>,
    seen_ids: Arc<RwLock<HashSet<String>>>,
}

impl IngestionPipeline {
    pub fn new(
        literature: Arc<dyn LiteratureClient>,
        extractor: Arc<dyn NerExtractor>,
        graph: Arc<dyn KnowledgeGraphRepository>,
    ) -> IngestionPipeline {
        IngestionPipeline { literature, extractor, graph, seen_ids: Arc::new(RwLock::new(HashSet::new())) }
    }

    /// Run one ingestion cycle for `(drug, disease)`. A no-op if the
    /// literature search returns nothing, or every candidate id was already
    /// claimed by a concurrent ingestion run.
    pub async fn ingest(&self, drug: &str, disease: &str, cancel: &Cancellation) -> RepurposeResult<()> {
        let query_terms = format!("{drug}[title/abstract] AND {disease}[title/abstract]");
        let pmids = self.literature.search(&query_terms, MAX_ARTICLES).await?;
        if pmids.is_empty() {
            debug!(drug, disease, "ingestion: literature search returned nothing");
            return Ok(());
        }

        let claimed: Vec<String> = {
            let mut seen = self.seen_ids.write().await;
            pmids.into_iter().filter(|id| seen.insert(id.clone())).collect()
        };
        if claimed.is_empty() {
            debug!(drug, disease, "ingestion: every candidate id already claimed by a concurrent run");
            return Ok(());
        }

        let articles = self.literature.fetch(&claimed).await?;
        info!(drug, disease, article_count = articles.len(), "ingestion: analyzing fetched abstracts");

        let mut persisted = 0usize;
        for article in &articles {
            if cancel.is_cancelled() {
                warn!(drug, disease, "ingestion: cancellation observed, stopping after current article's writes");
                break;
            }
            persisted += self.ingest_article(article).await?;
        }
        info!(drug, disease, persisted, "ingestion cycle complete");
        Ok(())
    }

    async fn ingest_article(&self, article: &Article) -> RepurposeResult<usize> {
        let text = if article.abstract_text.is_empty() { article.title.clone() } else { article.abstract_text.clone() };
        let spans = self.extractor.extract(&text).await?;

        let mut candidates: Vec<(String, EntityKind, f64)> = Vec::new();
        for span in spans {
            let normalized = normalize_name(&span.text, span.kind);
            if validate_name(&normalized, DEFAULT_STOPWORDS).is_err() {
                continue;
            }
            candidates.push((normalized, span.kind, span.confidence));
        }
        candidates.sort_by(|a, b| a.0.cmp(&b.0).then(b.2.partial_cmp(&a.2).unwrap()));
        candidates.dedup_by(|a, b| a.0 == b.0);

        let sentences: Vec<&str> = text.split(|c: char| c == '.' || c == '!' || c == '?').collect();

        let mut persisted = 0usize;
        for sentence in sentences {
            let lower = sentence.to_lowercase();
            let present: Vec<(String, EntityKind, f64)> =
                candidates.iter().filter(|(name, _, _)| lower.contains(&name.to_lowercase())).cloned().collect();
            if present.len() < 2 {
                continue;
            }

            for i in 0..present.len() {
                for j in (i + 1)..present.len() {
                    let (name_a, kind_a, conf_a) = &present[i];
                    let (name_b, kind_b, conf_b) = &present[j];
                    if name_a.eq_ignore_ascii_case(name_b) {
                        continue;
                    }
                    let Some(relation) = detect_relation(sentence) else { continue };
                    let confidence = conf_a.min(*conf_b) * REGEX_PENALTY;
                    if confidence < RELATION_ACCEPT_THRESHOLD {
                        continue;
                    }

                    self.graph.upsert_entity(*kind_a, name_a, ExtractionMethod::NerModel, *conf_a).await?;
                    self.graph.upsert_entity(*kind_b, name_b, ExtractionMethod::NerModel, *conf_b).await?;
                    self.graph
                        .upsert_relation(
                            name_a,
                            *kind_a,
                            relation,
                            name_b,
                            *kind_b,
                            confidence,
                            Some(article.source_id.clone()),
                            ExtractionMethod::Pattern,
                        )
                        .await?;
                    persisted += 1;
                }
            }
        }
        Ok(persisted)
    }
}
