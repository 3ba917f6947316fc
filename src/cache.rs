//! Fingerprint-keyed query cache, disabled by default. Kept independent of
//! `services::record_store`: the cache holds complete, ready-to-serve query
//! outcomes with a TTL, while the record store holds the append-only
//! execution trace regardless of caching.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// One cached outcome: the synthesized response, its citations, and
/// whatever artifact accompanied it, ready to be replayed verbatim.
#[derive(Debug, Clone)]
pub struct CachedOutcome {
    pub response: String,
    pub citations: Vec<crate::model::Citation>,
    pub artifact: Option<crate::model::Artifact>,
}

struct Entry {
    outcome: CachedOutcome,
    inserted_at: Instant,
}

/// TTL-based cache keyed by query fingerprint. `get` treats an expired
/// entry as absent but does not evict it eagerly — eviction happens lazily
/// on the next `put` for the same key, or never, which is fine for a
/// process-lifetime cache.
pub struct FingerprintCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl FingerprintCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: RwLock::new(HashMap::new()) }
    }

    pub async fn get(&self, fingerprint: &str) -> Option<CachedOutcome> {
        let entries = self.entries.read().await;
        let entry = entries.get(fingerprint)?;
        if entry.inserted_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.outcome.clone())
    }

    pub async fn put(&self, fingerprint: String, outcome: CachedOutcome) {
        self.entries.write().await.insert(fingerprint, Entry { outcome, inserted_at: Instant::now() });
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Citation;

    fn sample_outcome() -> CachedOutcome {
        CachedOutcome {
            response: "answer".into(),
            citations: vec![Citation::new("https://a.com", "A", "s", 0.5)],
            artifact: None,
        }
    }

    #[tokio::test]
    async fn fresh_entry_is_retrievable() {
        let cache = FingerprintCache::new(Duration::from_secs(60));
        cache.put("fp1".into(), sample_outcome()).await;
        let hit = cache.get("fp1").await;
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().response, "answer");
    }

    #[tokio::test]
    async fn expired_entry_is_treated_as_miss() {
        let cache = FingerprintCache::new(Duration::from_millis(10));
        cache.put("fp1".into(), sample_outcome()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("fp1").await.is_none());
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let cache = FingerprintCache::new(Duration::from_secs(60));
        assert!(cache.get("nope").await.is_none());
    }
}
