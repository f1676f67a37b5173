//! Bounded FIFO cache with optional time-to-live.
//!
//! Used for per-file symbol sets and optimizer scan results. Eviction order
//! is insertion order, not access order: a hit does not refresh an entry.
//! Re-inserting a key counts as a fresh insertion.
//!
//! # Thread Safety
//!
//! **This cache is NOT thread-safe.** All mutating methods take `&mut self`;
//! callers that share one across threads wrap it in a `Mutex`.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Cache statistics for monitoring effectiveness
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub size: usize,
    /// Entries removed to respect capacity
    pub evictions: usize,
    /// Entries dropped because their TTL elapsed
    pub expirations: usize,
}

impl CacheStats {
    /// Cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
    seq: u64,
}

/// FIFO cache: HashMap for lookups, VecDeque for insertion order.
///
/// Order entries carry the sequence number of the insertion that created
/// them; an entry whose sequence no longer matches the map is stale and
/// skipped during eviction.
pub struct BoundedCache<K, V> {
    capacity: usize,
    ttl: Option<Duration>,
    map: HashMap<K, Entry<V>>,
    order: VecDeque<(K, u64)>,
    next_seq: u64,
    hits: usize,
    misses: usize,
    evictions: usize,
    expirations: usize,
}

impl<K: Hash + Eq + Clone, V> BoundedCache<K, V> {
    /// Cache without expiry.
    pub fn new(capacity: usize) -> Self {
        Self::with_ttl(capacity, None)
    }

    pub fn with_ttl(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            ttl,
            map: HashMap::new(),
            order: VecDeque::new(),
            next_seq: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.get_at(key, Instant::now())
    }

    /// Lookup as of `now`; an expired entry is removed and counted a miss.
    pub fn get_at(&mut self, key: &K, now: Instant) -> Option<&V> {
        let expired = match self.map.get(key) {
            None => {
                self.misses += 1;
                return None;
            }
            Some(entry) => self.is_expired(entry, now),
        };

        if expired {
            self.map.remove(key);
            self.expirations += 1;
            self.misses += 1;
            tracing::trace!("cache entry expired");
            return None;
        }

        self.hits += 1;
        self.map.get(key).map(|entry| &entry.value)
    }

    pub fn put(&mut self, key: K, value: V) {
        self.put_at(key, value, Instant::now())
    }

    /// Insert as of `now`, evicting the oldest insertion when full.
    pub fn put_at(&mut self, key: K, value: V, now: Instant) {
        if !self.map.contains_key(&key) {
            while self.map.len() >= self.capacity {
                if !self.evict_oldest() {
                    break;
                }
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.push_back((key.clone(), seq));
        self.map.insert(
            key,
            Entry {
                value,
                inserted_at: now,
                seq,
            },
        );

        if self.order.len() > self.capacity.saturating_mul(2) {
            self.compact();
        }
    }

    /// Remove a specific entry.
    pub fn invalidate(&mut self, key: &K) {
        self.map.remove(key);
    }

    /// Clear all entries and statistics.
    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
        self.expirations = 0;
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.map.len(),
            evictions: self.evictions,
            expirations: self.expirations,
        }
    }

    fn is_expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(entry.inserted_at) >= ttl,
            None => false,
        }
    }

    /// Pop order entries until a live one is evicted. Returns false when empty.
    fn evict_oldest(&mut self) -> bool {
        while let Some((key, seq)) = self.order.pop_front() {
            let live = self.map.get(&key).map(|e| e.seq == seq).unwrap_or(false);
            if live {
                self.map.remove(&key);
                self.evictions += 1;
                tracing::trace!(capacity = self.capacity, "cache entry evicted");
                return true;
            }
        }
        false
    }

    /// Drop stale order entries left by re-insertions and invalidations.
    fn compact(&mut self) {
        let map = &self.map;
        self.order
            .retain(|(key, seq)| map.get(key).map(|e| e.seq == *seq).unwrap_or(false));
    }
}

impl<K, V> std::fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("len", &self.map.len())
            .finish()
    }
}
