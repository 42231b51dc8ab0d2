use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// TTL cache with passive expiry: freshness is checked on read, and stale
/// entries are only ever removed by being overwritten. There is no sweep and
/// no size cap, so memory grows with the set of keys touched during the
/// process lifetime.
#[derive(Debug)]
pub struct PassiveCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> PassiveCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached value only while its age is below the TTL. An
    /// expired entry reads as a miss; the caller repopulates via `insert`.
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.inserted_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, stale ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_fresh_value() {
        let cache: PassiveCache<String, u32> = PassiveCache::new(Duration::from_secs(60));
        cache.insert("key".to_string(), 7).await;
        assert_eq!(cache.get("key").await, Some(7));
    }

    #[tokio::test]
    async fn test_missing_key_is_a_miss() {
        let cache: PassiveCache<String, u32> = PassiveCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("absent").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_reads_as_miss_but_stays_stored() {
        let cache: PassiveCache<String, u32> = PassiveCache::new(Duration::from_secs(60));
        cache.insert("key".to_string(), 7).await;

        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(cache.get("key").await, None);
        // Passive expiry never removes the entry
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_refreshes_entry() {
        let cache: PassiveCache<String, u32> = PassiveCache::new(Duration::from_secs(60));
        cache.insert("key".to_string(), 7).await;

        tokio::time::advance(Duration::from_secs(61)).await;
        cache.insert("key".to_string(), 8).await;

        assert_eq!(cache.get("key").await, Some(8));
        assert_eq!(cache.len().await, 1);
    }
}
