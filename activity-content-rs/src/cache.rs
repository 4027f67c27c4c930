//! Time-bounded cache of generated activity content
//!
//! Entries are keyed by activity type, learner age and a fingerprint of the
//! source text. Expired entries are evicted lazily on read; when the cache is
//! full, expired entries are purged and then the oldest fraction of the
//! remainder is dropped. The cache is advisory: a miss only forces
//! regeneration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::content::{ActivityContent, ActivityType};
use crate::util::lock;

/// Ages swept by [`ContentCache::invalidate`] when removing one source text
pub const INVALIDATION_AGES: std::ops::RangeInclusive<u8> = 3..=18;

const FINGERPRINT_HEX_LEN: usize = 16;

/// Cache configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Entry lifetime
    pub ttl: Duration,

    /// Capacity before eviction kicks in
    pub max_entries: usize,

    /// Share of remaining entries dropped, oldest first, when full
    pub eviction_fraction: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            max_entries: 500,
            eviction_fraction: 0.2,
        }
    }
}

/// Stable fingerprint of a source text
pub fn fingerprint(source_text: &str) -> String {
    let digest = Sha256::digest(source_text.as_bytes());
    let mut hex = String::with_capacity(FINGERPRINT_HEX_LEN);
    for byte in digest.iter().take(FINGERPRINT_HEX_LEN / 2) {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Cache key for one activity of one source text at one age
pub fn cache_key(activity_type: ActivityType, age_years: u8, source_text: &str) -> String {
    key_for_fingerprint(activity_type, age_years, &fingerprint(source_text))
}

fn key_for_fingerprint(activity_type: ActivityType, age_years: u8, print: &str) -> String {
    format!("{}:{}:{}", activity_type, age_years, print)
}

/// A cached content payload
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub content: ActivityContent,
    pub inserted_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() > ttl
    }

    fn approx_size(&self) -> usize {
        self.key.len() + self.content.serialized_len()
    }
}

/// Operational view of the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub approx_size_bytes: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe content cache shared by every request of a pipeline
pub struct ContentCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ContentCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a live entry, evicting it if it has expired
    pub fn get(&self, key: &str) -> Option<ActivityContent> {
        let mut entries = lock(&self.entries);

        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(self.config.ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.content.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            log::debug!("Evicting expired cache entry {}", key);
            entries.remove(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Insert or replace an entry, making room first when full
    pub fn set(&self, key: impl Into<String>, content: ActivityContent) {
        let key = key.into();
        let mut entries = lock(&self.entries);

        if !entries.contains_key(&key) && entries.len() >= self.config.max_entries {
            self.make_room(&mut entries);
        }

        entries.insert(
            key.clone(),
            CacheEntry {
                key,
                content,
                inserted_at: Instant::now(),
            },
        );
    }

    fn make_room(&self, entries: &mut HashMap<String, CacheEntry>) {
        let ttl = self.config.ttl;
        entries.retain(|_, entry| !entry.is_expired(ttl));
        if entries.len() < self.config.max_entries {
            return;
        }

        let fraction = self.config.eviction_fraction.clamp(0.0, 1.0);
        let count = ((entries.len() as f64 * fraction).ceil() as usize).max(1);

        let mut by_age: Vec<(Instant, String)> = entries
            .values()
            .map(|entry| (entry.inserted_at, entry.key.clone()))
            .collect();
        by_age.sort();

        for (_, key) in by_age.into_iter().take(count) {
            entries.remove(&key);
        }
        log::debug!("Evicted {} oldest cache entries", count);
    }

    /// Remove cached content for a source text, or everything when `None`
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&self, source_text: Option<&str>) -> usize {
        let mut entries = lock(&self.entries);

        match source_text {
            None => {
                let removed = entries.len();
                entries.clear();
                removed
            }
            Some(text) => {
                let print = fingerprint(text);
                let mut removed = 0;
                for activity_type in ActivityType::ALL {
                    for age in INVALIDATION_AGES {
                        let key = key_for_fingerprint(activity_type, age, &print);
                        if entries.remove(&key).is_some() {
                            removed += 1;
                        }
                    }
                }
                removed
            }
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let ttl = self.config.ttl;
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(ttl));
        before - entries.len()
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let entries = lock(&self.entries);
        let ttl = self.config.ttl;

        CacheStats {
            total_entries: entries.len(),
            expired_entries: entries.values().filter(|e| e.is_expired(ttl)).count(),
            approx_size_bytes: entries.values().map(CacheEntry::approx_size).sum(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Character, CharacterSet};

    fn content(name: &str) -> ActivityContent {
        ActivityContent::Characters(CharacterSet {
            real: vec![Character {
                name: name.to_string(),
                description: "A curious child who explores the woods.".to_string(),
            }],
            decoys: vec![],
        })
    }

    #[test]
    fn test_key_is_stable_and_distinguishes_inputs() {
        let a = cache_key(ActivityType::Who, 8, "Once upon a time");
        assert_eq!(a, cache_key(ActivityType::Who, 8, "Once upon a time"));
        assert!(a.starts_with("who:8:"));
        assert_ne!(a, cache_key(ActivityType::Who, 9, "Once upon a time"));
        assert_ne!(a, cache_key(ActivityType::Where, 8, "Once upon a time"));
        assert_ne!(a, cache_key(ActivityType::Who, 8, "Once upon a time."));
    }

    #[test]
    fn test_get_and_set() {
        let cache = ContentCache::default();
        assert!(cache.get("k").is_none());

        cache.set("k", content("Maya"));
        assert_eq!(cache.get("k"), Some(content("Maya")));

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!(stats.approx_size_bytes > 0);
    }

    #[test]
    fn test_expired_entries_are_absent_and_evicted() {
        let cache = ContentCache::new(CacheConfig {
            ttl: Duration::from_millis(20),
            ..CacheConfig::default()
        });
        cache.set("k", content("Maya"));
        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.stats().expired_entries, 1);
        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_eviction_drops_oldest_fraction() {
        let cache = ContentCache::new(CacheConfig {
            max_entries: 10,
            eviction_fraction: 0.2,
            ..CacheConfig::default()
        });

        for i in 0..10 {
            cache.set(format!("k{}", i), content("Maya"));
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(cache.len(), 10);

        cache.set("k10", content("Leo"));
        assert_eq!(cache.len(), 9);
        assert!(cache.get("k0").is_none());
        assert!(cache.get("k1").is_none());
        assert!(cache.get("k2").is_some());
        assert!(cache.get("k10").is_some());
    }

    #[test]
    fn test_eviction_prefers_expired_entries() {
        let cache = ContentCache::new(CacheConfig {
            ttl: Duration::from_millis(30),
            max_entries: 3,
            eviction_fraction: 0.2,
        });
        cache.set("old", content("Maya"));
        std::thread::sleep(Duration::from_millis(50));
        cache.set("a", content("Maya"));
        cache.set("b", content("Maya"));

        cache.set("c", content("Maya"));
        assert_eq!(cache.len(), 3);
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_invalidate_by_source_text() {
        let cache = ContentCache::default();
        let story = "The fox ran into the forest.";
        cache.set(cache_key(ActivityType::Who, 7, story), content("Fox"));
        cache.set(cache_key(ActivityType::Sequence, 12, story), content("Fox"));
        cache.set(cache_key(ActivityType::Who, 7, "Another story."), content("Owl"));

        assert_eq!(cache.invalidate(Some(story)), 2);
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.invalidate(None), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_removes_every_generated_key() {
        let cache = ContentCache::new(CacheConfig {
            max_entries: 1000,
            ..CacheConfig::default()
        });
        let story = "A lantern glowed in the lighthouse window.";
        for activity_type in ActivityType::ALL {
            for age in [3, 10, 18] {
                cache.set(cache_key(activity_type, age, story), content("Keeper"));
            }
        }
        let expected = ActivityType::ALL.len() * 3;
        assert_eq!(cache.len(), expected);

        assert_eq!(cache.invalidate(Some(story)), expected);
        assert!(cache.is_empty());
    }
}
