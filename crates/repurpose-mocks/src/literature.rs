//! A fixture-backed stand-in for a rate-limited PubMed-style client.

use async_trait::async_trait;

use repurpose_domain::error::RepurposeResult;
use repurpose_repo::{Article, LiteratureClient};

use crate::fixtures::{article_by_id, articles_for_entity, articles_for_pair};

/// Looks up canned articles by the search terms the literature stage sends:
/// either `"drug AND disease"` for a pair search or a single entity name for
/// the per-entity fallback search (§4.G item 2).
pub struct FixtureLiteratureClient;

#[async_trait]
impl LiteratureClient for FixtureLiteratureClient {
    async fn search(&self, query_terms: &str, max_results: usize) -> RepurposeResult<Vec<String>> {
        let parts: Vec<&str> = query_terms.split(" AND ").map(str::trim).collect();
        let articles = match parts.as_slice() {
            [a, b] => articles_for_pair(a, b),
            [a] => articles_for_entity(a),
            _ => Vec::new(),
        };
        Ok(articles.into_iter().map(|a| a.source_id).take(max_results).collect())
    }

    async fn fetch(&self, ids: &[String]) -> RepurposeResult<Vec<Article>> {
        Ok(ids.iter().filter_map(|id| article_by_id(id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pair_search_finds_the_metformin_breast_cancer_scenario() {
        let ids = FixtureLiteratureClient.search("Metformin AND Breast Cancer", 10).await.unwrap();
        assert_eq!(ids.len(), 3);
        let articles = FixtureLiteratureClient.fetch(&ids).await.unwrap();
        assert_eq!(articles.len(), 3);
    }

    #[tokio::test]
    async fn single_entity_search_finds_its_scenario() {
        let ids = FixtureLiteratureClient.search("Thalidomide", 10).await.unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn unknown_pair_returns_nothing() {
        let ids = FixtureLiteratureClient.search("Ibuprofen AND Asthma", 10).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn max_results_caps_the_returned_ids() {
        let ids = FixtureLiteratureClient.search("Metformin AND Breast Cancer", 2).await.unwrap();
        assert_eq!(ids.len(), 2);
    }
}
