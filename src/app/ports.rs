use crate::error::Result;
use crate::types::{DatasetInfo, Page};
use async_trait::async_trait;

/// Fetches one page of a paginated feed
#[async_trait]
pub trait FeedPort: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Page>;
}

/// Maps a coordinate pair to the name of the boundary containing it
#[async_trait]
pub trait GeocoderPort: Send + Sync {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Option<String>>;
}

/// Resolves a dataset id to its feed location
#[async_trait]
pub trait RegistryPort: Send + Sync {
    async fn lookup(&self, dataset_id: &str) -> Result<DatasetInfo>;
}

/// Shared key-value store offering hashes and sorted sets.
///
/// Increment operations must be atomic on the store side and return the
/// value after the increment.
#[async_trait]
pub trait StorePort: Send + Sync {
    // Hash operations
    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>>;
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<()>;
    async fn hash_delete(&self, key: &str, field: &str) -> Result<()>;
    async fn hash_incr(&self, key: &str, field: &str, by: i64) -> Result<i64>;

    // Sorted-set operations
    async fn zset_incr(&self, key: &str, member: &str, by: f64) -> Result<f64>;
    async fn zset_score(&self, key: &str, member: &str) -> Result<Option<f64>>;
    /// Every member with its score, highest score first, ties by ascending member
    async fn zset_scores(&self, key: &str) -> Result<Vec<(String, f64)>>;
    /// Members ordered like `zset_scores`, truncated to `limit` when given
    async fn zset_range_desc(&self, key: &str, limit: Option<usize>) -> Result<Vec<String>>;
    async fn zset_clear(&self, key: &str) -> Result<()>;
}
