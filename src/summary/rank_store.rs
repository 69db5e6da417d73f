use crate::app::ports::StorePort;
use crate::constants::{ACTIVITIES_SUFFIX, BOUNDARY_SUFFIX};
use crate::error::Result;
use crate::summary::normalize::normalize;
use std::sync::Arc;
use tracing::debug;

/// Ranking namespaces kept per dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Activities,
    Boundary,
}

impl Category {
    pub fn key_suffix(&self) -> &'static str {
        match self {
            Category::Activities => ACTIVITIES_SUFFIX,
            Category::Boundary => BOUNDARY_SUFFIX,
        }
    }

    /// Sorted-set key for this category within a dataset
    pub fn store_key(&self, dataset_id: &str) -> String {
        format!("{}/{}", dataset_id, self.key_suffix())
    }
}

/// Frequency ranking of normalized names for one dataset and category.
///
/// Ties in score are ordered by ascending name.
#[derive(Clone)]
pub struct RankStore {
    store: Arc<dyn StorePort>,
    key: String,
}

impl RankStore {
    pub fn new(store: Arc<dyn StorePort>, dataset_id: &str, category: Category) -> Self {
        Self {
            store,
            key: category.store_key(dataset_id),
        }
    }

    /// Adds one occurrence of `name`; blank names are ignored
    pub async fn increment(&self, name: &str) -> Result<()> {
        let normalized = normalize(name);
        if normalized.is_empty() {
            debug!("Ignoring blank name for {}", self.key);
            return Ok(());
        }
        let score = self.store.zset_incr(&self.key, &normalized, 1.0).await?;
        debug!("{} -> '{}' now at {}", self.key, normalized, score);
        Ok(())
    }

    pub async fn score(&self, name: &str) -> Result<Option<f64>> {
        self.store.zset_score(&self.key, &normalize(name)).await
    }

    pub async fn scores(&self) -> Result<Vec<(String, f64)>> {
        self.store.zset_scores(&self.key).await
    }

    pub async fn ranked(&self, limit: Option<usize>) -> Result<Vec<String>> {
        self.store.zset_range_desc(&self.key, limit).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.zset_clear(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory_store::InMemoryStore;

    fn activities() -> RankStore {
        RankStore::new(Arc::new(InMemoryStore::new()), "org/dataset", Category::Activities)
    }

    #[test]
    fn test_store_keys() {
        assert_eq!(Category::Activities.store_key("org/ds"), "org/ds/activities");
        assert_eq!(Category::Boundary.store_key("org/ds"), "org/ds/boundary");
    }

    #[tokio::test]
    async fn test_increment_counts_occurrences() {
        let rank = activities();
        for _ in 0..7 {
            rank.increment("Yoga").await.unwrap();
        }
        assert_eq!(rank.score("yoga").await.unwrap(), Some(7.0));
        assert_eq!(rank.score("Zumba").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_increment_merges_case_and_whitespace_variants() {
        let rank = activities();
        rank.increment("Body Attack").await.unwrap();
        rank.increment(" body attack").await.unwrap();
        rank.increment("BODY ATTACK ").await.unwrap();

        assert_eq!(
            rank.scores().await.unwrap(),
            vec![("body attack".to_string(), 3.0)]
        );
    }

    #[tokio::test]
    async fn test_blank_names_are_ignored() {
        let rank = activities();
        rank.increment("   ").await.unwrap();
        assert!(rank.scores().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ranked_orders_by_score_then_name() {
        let rank = activities();
        for name in ["C", "A", "B", "A", "B", "A", "A"] {
            rank.increment(name).await.unwrap();
        }

        assert_eq!(rank.ranked(None).await.unwrap(), vec!["a", "b", "c"]);
        assert_eq!(rank.ranked(Some(2)).await.unwrap(), vec!["a", "b"]);
        assert_eq!(rank.ranked(Some(10)).await.unwrap(), vec!["a", "b", "c"]);
        assert!(rank.ranked(Some(0)).await.unwrap().is_empty());

        for name in ["Zumba", "Boxing"] {
            rank.increment(name).await.unwrap();
        }
        assert_eq!(
            rank.ranked(None).await.unwrap(),
            vec!["a", "b", "boxing", "c", "zumba"]
        );
    }

    #[tokio::test]
    async fn test_clear_is_idempotent_and_scoped() {
        let store: Arc<dyn StorePort> = Arc::new(InMemoryStore::new());
        let acts = RankStore::new(store.clone(), "org/dataset", Category::Activities);
        let bounds = RankStore::new(store.clone(), "org/dataset", Category::Boundary);
        acts.increment("Yoga").await.unwrap();
        bounds.increment("Hackney").await.unwrap();

        acts.clear().await.unwrap();
        acts.clear().await.unwrap();

        assert!(acts.ranked(None).await.unwrap().is_empty());
        assert_eq!(bounds.ranked(None).await.unwrap(), vec!["hackney"]);
    }
}
