use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CachedEntry<V> {
    value: V,
    fetched_at: Instant,
}

impl<V> CachedEntry<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// In-memory map of fetched values with a fixed time-to-live.
///
/// Nothing older than `ttl` is ever returned. Expired entries are dropped
/// when they are looked up and swept out on every insert, so the map only
/// holds keys fetched within the last window.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CachedEntry<V>>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Value for `key` if it was fetched less than `ttl` ago.
    pub async fn get_fresh(&self, key: &str) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_fresh(self.ttl) => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    return None;
                }
            }
        }

        // Expired: evict unless a refresh landed in between
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_fresh(self.ttl) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: String, value: V) {
        let ttl = self.ttl;
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_fresh(ttl));
        entries.insert(key, CachedEntry {
            value,
            fetched_at: Instant::now(),
        });
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("IBM".to_string(), 187.42).await;

        assert_eq!(cache.get_fresh("IBM").await, Some(187.42));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get_fresh("IBM").await, Some(187.42));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get_fresh("IBM").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_refreshes_timestamp() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.insert("AAPL".to_string(), 1.0).await;

        tokio::time::advance(Duration::from_secs(15)).await;
        cache.insert("AAPL".to_string(), 2.0).await;

        assert_eq!(cache.get_fresh("AAPL").await, Some(2.0));
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get_fresh("MSFT").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_sweeps_expired_keys() {
        let cache = TtlCache::new(Duration::from_secs(30));
        for topic in ["earnings", "ipo", "mergers"] {
            cache.insert(topic.to_string(), vec![topic.to_string()]).await;
        }
        assert_eq!(cache.len().await, 3);

        tokio::time::advance(Duration::from_secs(20)).await;
        cache.insert("technology".to_string(), vec![]).await;
        assert_eq!(cache.len().await, 4);

        tokio::time::advance(Duration::from_secs(15)).await;
        cache.insert("economy".to_string(), vec![]).await;

        // Only the two keys written within the last 30s remain
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get_fresh("earnings").await, None);
        assert_eq!(cache.get_fresh("technology").await, Some(vec![]));
    }
}
