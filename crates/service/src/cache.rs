//! Explicit query cache.
//!
//! Keyed by (collection, query). `invalidate` marks an entry stale in
//! place; nothing is recomputed until the next read misses and the caller
//! refetches. The key space is tiny and bounded, so there is no TTL and no
//! eviction.

use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: &'static str,
    query: &'static str,
}

impl CacheKey {
    pub fn list(kind: &'static str) -> Self {
        Self { kind, query: "list" }
    }

    pub fn statistics(kind: &'static str) -> Self {
        Self { kind, query: "statistics" }
    }
}

struct Slot {
    value: Value,
    stale: bool,
}

#[derive(Default)]
pub struct QueryCache {
    slots: DashMap<CacheKey, Slot>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded copy of a fresh entry; stale or missing entries yield `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let slot = self.slots.get(key)?;
        if slot.stale {
            return None;
        }
        serde_json::from_value(slot.value.clone()).ok()
    }

    pub fn put<T: Serialize>(&self, key: CacheKey, value: &T) {
        if let Ok(value) = serde_json::to_value(value) {
            self.slots.insert(key, Slot { value, stale: false });
        }
    }

    /// Mark an entry stale. A subsequent `put` under the same key makes the
    /// entry fresh again.
    pub fn invalidate(&self, key: &CacheKey) {
        if let Some(mut slot) = self.slots.get_mut(key) {
            slot.stale = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_fresh_entries_only() {
        let cache = QueryCache::new();
        let key = CacheKey::list("empleados");

        assert_eq!(cache.get::<Vec<String>>(&key), None);

        cache.put(key.clone(), &vec!["ana".to_string()]);
        assert_eq!(cache.get::<Vec<String>>(&key), Some(vec!["ana".to_string()]));

        cache.invalidate(&key);
        assert_eq!(cache.get::<Vec<String>>(&key), None);
    }

    #[test]
    fn put_after_invalidate_is_fresh_again() {
        let cache = QueryCache::new();
        let key = CacheKey::statistics("docentes");

        cache.put(key.clone(), &1u64);
        cache.invalidate(&key);
        cache.put(key.clone(), &2u64);
        assert_eq!(cache.get::<u64>(&key), Some(2));
    }

    #[test]
    fn keys_do_not_collide_across_kinds_or_queries() {
        let cache = QueryCache::new();
        cache.put(CacheKey::list("empleados"), &1u64);
        assert_eq!(cache.get::<u64>(&CacheKey::list("docentes")), None);
        assert_eq!(cache.get::<u64>(&CacheKey::statistics("empleados")), None);
    }

    #[test]
    fn invalidating_a_missing_key_is_a_no_op() {
        let cache = QueryCache::new();
        cache.invalidate(&CacheKey::list("empleados"));
        assert_eq!(cache.get::<u64>(&CacheKey::list("empleados")), None);
    }
}
