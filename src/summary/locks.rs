use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

static DATASET_LOCKS: Lazy<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Process-wide lock serializing harvests and resets of one dataset.
///
/// Every caller asking for the same dataset id receives the same mutex.
pub fn dataset_lock(dataset_id: &str) -> Arc<AsyncMutex<()>> {
    let mut locks = DATASET_LOCKS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    locks
        .entry(dataset_id.to_string())
        .or_insert_with(|| Arc::new(AsyncMutex::new(())))
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_dataset_shares_lock() {
        let a = dataset_lock("locks-test/a");
        let again = dataset_lock("locks-test/a");
        let b = dataset_lock("locks-test/b");

        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_lock_excludes_second_holder() {
        let lock = dataset_lock("locks-test/exclusive");
        let _held = lock.lock().await;
        assert!(dataset_lock("locks-test/exclusive").try_lock().is_err());
    }
}
