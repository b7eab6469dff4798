//! In-memory cache for compiled bundles
//!
//! Bounded key→value store with TTL expiry and least-recently-used
//! eviction. Keys are content hashes binding a compiled bundle to the
//! asset path and the session secret it was built for, so no entry is
//! ever served across sessions.
//!
//! Entries expire a fixed interval after insertion; reads refresh the
//! recency used for eviction but never the TTL. Nothing persists across
//! restarts: compiled output is a pure function of its inputs, so a cold
//! cache only costs a rebuild.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Compute the cache key for a build request.
///
/// SHA-256 over `(asset path, NUL, client secret)`. Two requests share a
/// key exactly when both inputs match, which keeps every cached bundle
/// bound to a single session secret.
pub fn bundle_key(asset_path: &str, client_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(asset_path.as_bytes());
    hasher.update([0u8]);
    hasher.update(client_secret.as_bytes());
    hex::encode(hasher.finalize())
}

struct Entry {
    value: String,
    inserted_at: Instant,
    last_used: u64,
}

struct Inner {
    entries: HashMap<String, Entry>,
    // Monotonic use counter; higher means more recently touched.
    clock: u64,
}

/// Bounded, time-expiring store for compiled bundles.
///
/// Constructed once at startup and shared by handle. Every operation is
/// a single locked map step, so concurrent request tasks never observe a
/// half-applied mutation.
pub struct CacheStore {
    inner: Mutex<Inner>,
    capacity: usize,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                clock: 0,
            }),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Look up a compiled bundle. Expired entries are removed and read as
    /// absent; a hit refreshes eviction recency but not the TTL.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let expired = match inner.entries.get(key) {
            None => return None,
            Some(entry) => entry.inserted_at.elapsed() >= self.ttl,
        };
        if expired {
            inner.entries.remove(key);
            return None;
        }

        inner.clock += 1;
        let clock = inner.clock;
        inner.entries.get_mut(key).map(|entry| {
            entry.last_used = clock;
            entry.value.clone()
        })
    }

    /// Insert a compiled bundle, evicting the least-recently-used entry
    /// if the store is at capacity.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone())
            {
                inner.entries.remove(&oldest);
            }
        }

        inner.clock += 1;
        let clock = inner.clock;
        inner.entries.insert(
            key,
            Entry {
                value: value.into(),
                inserted_at: Instant::now(),
                last_used: clock,
            },
        );
    }

    /// Number of live entries (expired-but-unswept entries included).
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn store(capacity: usize, ttl_ms: u64) -> CacheStore {
        CacheStore::new(capacity, Duration::from_millis(ttl_ms))
    }

    #[test]
    fn get_returns_inserted_value() {
        let cache = store(10, 1000);
        cache.set("k", "compiled");
        assert_eq!(cache.get("k").as_deref(), Some("compiled"));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = store(10, 20);
        cache.set("k", "v");
        sleep(Duration::from_millis(40));
        assert_eq!(cache.get("k"), None);
        // Expired entry was swept on read
        assert!(cache.is_empty());
    }

    #[test]
    fn read_does_not_refresh_ttl() {
        let cache = store(10, 50);
        cache.set("k", "v");
        sleep(Duration::from_millis(30));
        // Still alive, and this read must not extend the deadline
        assert!(cache.get("k").is_some());
        sleep(Duration::from_millis(30));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let cache = store(2, 10_000);
        cache.set("a", "1");
        cache.set("b", "2");
        // Touch "a" so "b" becomes the LRU entry
        assert!(cache.get("a").is_some());
        cache.set("c", "3");

        assert!(cache.get("a").is_some());
        assert_eq!(cache.get("b"), None);
        assert!(cache.get("c").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn overwriting_existing_key_does_not_evict() {
        let cache = store(2, 10_000);
        cache.set("a", "1");
        cache.set("b", "2");
        cache.set("a", "updated");
        assert_eq!(cache.get("a").as_deref(), Some("updated"));
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn bundle_key_binds_path_and_secret() {
        let k1 = bundle_key("app.js", "secret-a");
        let k2 = bundle_key("app.js", "secret-b");
        let k3 = bundle_key("other.js", "secret-a");
        assert_ne!(k1, k2);
        assert_ne!(k1, k3);
        assert_eq!(k1, bundle_key("app.js", "secret-a"));
    }

    #[test]
    fn bundle_key_fields_do_not_bleed() {
        // The separator keeps (ab, c) distinct from (a, bc)
        assert_ne!(bundle_key("ab", "c"), bundle_key("a", "bc"));
    }
}
