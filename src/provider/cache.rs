//! In-process TTL caches backing the place provider (spec.md §4.2, §6.4).
//!
//! Shape grounded on the teacher's `DashMap`-backed process state
//! (`dedup`, `clusters`, `known_keys`) plus its periodic `eviction()` sweep.

use crate::model::request::Coordinate;
use crate::model::place::Place;
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Entry<T> {
    value: T,
    inserted_at: Instant,
}

/// `geocode:{cityText}|{region}` -> `{lat,lng}`, TTL ~3600s (spec.md §6.4).
pub struct GeocodeCache {
    ttl: Duration,
    entries: DashMap<String, Entry<Coordinate>>,
}

impl GeocodeCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: DashMap::new() }
    }

    pub fn get(&self, key: &str) -> Option<Coordinate> {
        let entry = self.entries.get(key)?;
        if entry.inserted_at.elapsed() < self.ttl {
            Some(entry.value)
        } else {
            drop(entry);
            self.entries.remove(key);
            None
        }
    }

    pub fn put(&self, key: String, value: Coordinate) {
        self.entries.insert(key, Entry { value, inserted_at: Instant::now() });
    }

    /// Periodic sweep, mirroring the teacher's `eviction()` task.
    pub fn evict_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| e.inserted_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Short-lived text-search result cache, keyed by `TextSearchRequest::cache_key`.
/// Kept small and short-TTL since place freshness matters more than geocode.
pub struct TextSearchCache {
    ttl: Duration,
    entries: DashMap<String, Entry<Vec<Place>>>,
}

impl TextSearchCache {
    pub fn new() -> Self {
        Self { ttl: Duration::from_secs(30), entries: DashMap::new() }
    }

    pub fn get(&self, key: &str) -> Option<Vec<Place>> {
        let entry = self.entries.get(key)?;
        if entry.inserted_at.elapsed() < self.ttl {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.entries.remove(key);
            None
        }
    }

    pub fn put(&self, key: String, value: Vec<Place>) {
        self.entries.insert(key, Entry { value, inserted_at: Instant::now() });
    }
}
