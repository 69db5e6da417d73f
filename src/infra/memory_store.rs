use crate::app::ports::StorePort;
use crate::error::{Result, SummaryError};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Ordering key of a sorted-set member: highest score first, then by name
#[derive(Debug, Clone)]
struct RankKey {
    score: f64,
    member: String,
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.member.cmp(&other.member))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankKey {}

#[derive(Debug, Default)]
struct SortedSet {
    scores: HashMap<String, f64>,
    ranking: BTreeSet<RankKey>,
}

impl SortedSet {
    fn incr(&mut self, member: &str, by: f64) -> f64 {
        let previous = self.scores.get(member).copied();
        if let Some(score) = previous {
            self.ranking.remove(&RankKey {
                score,
                member: member.to_string(),
            });
        }
        let score = previous.unwrap_or(0.0) + by;
        self.scores.insert(member.to_string(), score);
        self.ranking.insert(RankKey {
            score,
            member: member.to_string(),
        });
        score
    }
}

/// In-memory store implementation for development/testing
#[derive(Default)]
pub struct InMemoryStore {
    hashes: Arc<Mutex<HashMap<String, HashMap<String, String>>>>,
    sorted_sets: Arc<Mutex<HashMap<String, SortedSet>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| SummaryError::Store("in-memory store lock poisoned".to_string()))
}

#[async_trait]
impl StorePort for InMemoryStore {
    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>> {
        let hashes = lock(&self.hashes)?;
        Ok(hashes.get(key).and_then(|h| h.get(field)).cloned())
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let mut hashes = lock(&self.hashes)?;
        hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_delete(&self, key: &str, field: &str) -> Result<()> {
        let mut hashes = lock(&self.hashes)?;
        if let Some(hash) = hashes.get_mut(key) {
            hash.remove(field);
            if hash.is_empty() {
                hashes.remove(key);
            }
        }
        Ok(())
    }

    async fn hash_incr(&self, key: &str, field: &str, by: i64) -> Result<i64> {
        let mut hashes = lock(&self.hashes)?;
        let hash = hashes.entry(key.to_string()).or_default();
        let current = match hash.get(field) {
            None => 0,
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                SummaryError::Store(format!("{}:{} is not an integer: '{}'", key, field, raw))
            })?,
        };
        let next = current + by;
        hash.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    async fn zset_incr(&self, key: &str, member: &str, by: f64) -> Result<f64> {
        let mut sets = lock(&self.sorted_sets)?;
        Ok(sets.entry(key.to_string()).or_default().incr(member, by))
    }

    async fn zset_score(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let sets = lock(&self.sorted_sets)?;
        Ok(sets.get(key).and_then(|s| s.scores.get(member)).copied())
    }

    async fn zset_scores(&self, key: &str) -> Result<Vec<(String, f64)>> {
        let sets = lock(&self.sorted_sets)?;
        Ok(sets
            .get(key)
            .map(|s| {
                s.ranking
                    .iter()
                    .map(|k| (k.member.clone(), k.score))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn zset_range_desc(&self, key: &str, limit: Option<usize>) -> Result<Vec<String>> {
        let sets = lock(&self.sorted_sets)?;
        Ok(sets
            .get(key)
            .map(|s| {
                s.ranking
                    .iter()
                    .take(limit.unwrap_or(usize::MAX))
                    .map(|k| k.member.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn zset_clear(&self, key: &str) -> Result<()> {
        let mut sets = lock(&self.sorted_sets)?;
        sets.remove(key);
        Ok(())
    }
}
