//! Bounded cache of join-quality scores shared by all miner workers.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

const UNIT_SEPARATOR: char = '\u{1f}';
const RECORD_SEPARATOR: char = '\u{1e}';

#[derive(Debug, Default)]
struct CacheInner {
    scores: HashMap<String, f64>,
    /// Insertion order, oldest first
    order: VecDeque<String>,
}

/// Caches join scores keyed by attribute-pair identity.
///
/// When full, the oldest entry is evicted. The cache is owned by the caller
/// and handed to the miner, so its lifetime is explicit.
#[derive(Debug)]
pub struct JoinScoreCache {
    inner: Mutex<CacheInner>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Statistics about the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached scores
    pub entries: usize,
    /// Maximum number of entries
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

impl JoinScoreCache {
    /// Creates a cache holding at most `max_entries` scores.
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            max_entries: max_entries.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Builds the order-stable key for an attribute pair.
    ///
    /// Schema and attribute names are joined with ASCII control separators,
    /// which never appear in telemetry names, so dotted attribute names such
    /// as `request.uri` cannot make two different pairs share a key.
    pub fn key(
        source_schema: &str,
        source_attr: &str,
        target_schema: &str,
        target_attr: &str,
    ) -> String {
        let (left, right) = if (source_schema, source_attr) <= (target_schema, target_attr) {
            ((source_schema, source_attr), (target_schema, target_attr))
        } else {
            ((target_schema, target_attr), (source_schema, source_attr))
        };
        format!(
            "{}{UNIT_SEPARATOR}{}{RECORD_SEPARATOR}{}{UNIT_SEPARATOR}{}",
            left.0, left.1, right.0, right.1
        )
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // Entries are plain scores, so a poisoned guard is still consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Gets a score from the cache.
    pub fn get(&self, key: &str) -> Option<f64> {
        let score = self.lock().scores.get(key).copied();
        match score {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        score
    }

    /// Stores a score, evicting the oldest entries when at capacity.
    pub fn insert(&self, key: String, score: f64) {
        let mut inner = self.lock();
        if inner.scores.contains_key(&key) {
            inner.scores.insert(key, score);
            return;
        }

        while inner.scores.len() >= self.max_entries {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.scores.remove(&oldest);
                }
                None => break,
            }
        }

        inner.order.push_back(key.clone());
        inner.scores.insert(key, score);
    }

    /// Returns the cached score or computes and stores it.
    pub fn get_or_insert_with(&self, key: String, compute: impl FnOnce() -> f64) -> f64 {
        if let Some(score) = self.get(&key) {
            return score;
        }
        let score = compute();
        self.insert(key, score);
        score
    }

    pub fn len(&self) -> usize {
        self.lock().scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all entries and counters.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.scores.clear();
        inner.order.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Gets cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.max_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for JoinScoreCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}
