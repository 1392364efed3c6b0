// In-memory TTL cache for layered analyses
//
// Entries are keyed by request parameters, stamped with a content hash of
// the serialized result, and expire after a configurable max age. The clock
// is injectable so expiry is deterministic under test.

use crate::analysis::{Analysis, Layer};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Time source for cache stamping and expiry
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall-clock time
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Fixed time source for deterministic tests
#[derive(Debug)]
pub struct FixedClock(pub Mutex<u64>);

impl FixedClock {
    pub fn new(millis: u64) -> Self {
        Self(Mutex::new(millis))
    }

    pub fn advance(&self, millis: u64) {
        *self.0.lock().expect("clock poisoned") += millis;
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        *self.0.lock().expect("clock poisoned")
    }
}

/// One stored analysis
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Arc<Analysis>,
    pub timestamp_ms: u64,
    /// SHA-256 of the serialized analysis, for external change detection;
    /// staleness is decided by the timestamp alone
    pub hash: String,
}

/// Memoizes analyses keyed by request parameters
pub struct LayeredCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    max_age: Duration,
    clock: Arc<dyn Clock>,
}

impl LayeredCache {
    /// Create a cache with the given entry lifetime
    pub fn new(max_age: Duration) -> Self {
        Self::with_clock(max_age, Arc::new(SystemClock))
    }

    /// Create a cache with an injected time source
    pub fn with_clock(max_age: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_age,
            clock,
        }
    }

    /// Derive the cache key for a request; a pure function of its inputs
    pub fn key(layer: Layer, focus_path: Option<&str>) -> String {
        format!("{}-{}", layer, focus_path.unwrap_or("all"))
    }

    /// Fetch a fresh entry. An expired entry is deleted and reported as a
    /// miss.
    pub fn get(&self, key: &str) -> Option<Arc<Analysis>> {
        let mut entries = self.entries.lock().expect("cache poisoned");
        let entry = entries.get(key)?;

        let age = self.clock.now_millis().saturating_sub(entry.timestamp_ms);
        if age > self.max_age.as_millis() as u64 {
            entries.remove(key);
            return None;
        }

        Some(Arc::clone(&entry.data))
    }

    /// Store an analysis under a key
    pub fn set(&self, key: impl Into<String>, data: Arc<Analysis>) {
        let entry = CacheEntry {
            hash: compute_hash(&data),
            timestamp_ms: self.clock.now_millis(),
            data,
        };
        self.entries
            .lock()
            .expect("cache poisoned")
            .insert(key.into(), entry);
    }

    /// Drop a single entry
    pub fn invalidate(&self, key: &str) {
        self.entries.lock().expect("cache poisoned").remove(key);
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.entries.lock().expect("cache poisoned").clear();
    }

    /// Content hash of a stored entry, if present and regardless of age
    pub fn entry_hash(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("cache poisoned")
            .get(key)
            .map(|e| e.hash.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute the SHA-256 hash of a serialized analysis
pub fn compute_hash(analysis: &Analysis) -> String {
    let serialized = serde_json::to_string(analysis).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Metrics;
    use std::collections::BTreeMap;

    fn analysis(layer: Layer) -> Arc<Analysis> {
        Arc::new(Analysis {
            layer,
            components: vec![],
            relations: vec![],
            metrics: Metrics::default(),
            parse_errors: BTreeMap::new(),
            warnings: vec![],
            timestamp_ms: 0,
            version: crate::analysis::SCHEMA_VERSION.to_string(),
        })
    }

    fn cache_with_clock(max_age_ms: u64) -> (LayeredCache, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(1_000));
        let cache = LayeredCache::with_clock(
            Duration::from_millis(max_age_ms),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        (cache, clock)
    }

    #[test]
    fn test_key_is_pure() {
        assert_eq!(LayeredCache::key(Layer::Top, None), "top-all");
        assert_eq!(
            LayeredCache::key(Layer::Detail, Some("src/api")),
            "detail-src/api"
        );
        assert_eq!(
            LayeredCache::key(Layer::Top, None),
            LayeredCache::key(Layer::Top, None)
        );
    }

    #[test]
    fn test_miss_on_empty() {
        let (cache, _) = cache_with_clock(1_000);
        assert!(cache.get("top-all").is_none());
    }

    #[test]
    fn test_hit_while_fresh() {
        let (cache, clock) = cache_with_clock(1_000);
        cache.set("top-all", analysis(Layer::Top));

        clock.advance(999);
        let hit = cache.get("top-all").expect("entry should be fresh");
        assert_eq!(hit.layer, Layer::Top);
    }

    #[test]
    fn test_expired_entry_is_deleted_and_missed() {
        let (cache, clock) = cache_with_clock(1_000);
        cache.set("top-all", analysis(Layer::Top));

        clock.advance(1_001);
        assert!(cache.get("top-all").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate() {
        let (cache, _) = cache_with_clock(1_000);
        cache.set("top-all", analysis(Layer::Top));
        cache.invalidate("top-all");
        assert!(cache.get("top-all").is_none());
    }

    #[test]
    fn test_clear() {
        let (cache, _) = cache_with_clock(1_000);
        cache.set("top-all", analysis(Layer::Top));
        cache.set("middle-all", analysis(Layer::Middle));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = analysis(Layer::Top);
        assert_eq!(compute_hash(&a), compute_hash(&a));
        let b = analysis(Layer::Detail);
        assert_ne!(compute_hash(&a), compute_hash(&b));
    }

    #[test]
    fn test_entry_hash_survives_expiry_check() {
        let (cache, _) = cache_with_clock(1_000);
        cache.set("top-all", analysis(Layer::Top));
        let hash = cache.entry_hash("top-all").unwrap();
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_served_entry_is_same_allocation() {
        let (cache, _) = cache_with_clock(1_000);
        let stored = analysis(Layer::Top);
        cache.set("top-all", Arc::clone(&stored));

        let served = cache.get("top-all").unwrap();
        assert!(Arc::ptr_eq(&stored, &served));
    }
}
