//! Keyed object store
//!
//! Entries are ordered by key so iteration, and therefore sweeping, is
//! deterministic. Each entry carries an estimated byte footprint which is
//! charged against the configured limit.

use crate::contract::error::VmError;
use crate::contract::value::Value;
use std::collections::BTreeMap;

/// Bookkeeping overhead charged per heap entry
pub const ENTRY_OVERHEAD: usize = 16;

/// Default heap size limit (1 MiB)
pub const DEFAULT_HEAP_LIMIT: usize = 1024 * 1024;

/// Estimated footprint of one entry
pub fn entry_size(key: &str, value: &Value) -> usize {
    ENTRY_OVERHEAD + key.len() + value.estimated_size()
}

#[derive(Debug, Clone)]
pub struct Heap {
    entries: BTreeMap<String, Value>,
    bytes: usize,
    limit: usize,
    /// Largest footprint seen since the last reset
    high_water: usize,
}

impl Heap {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            bytes: 0,
            limit,
            high_water: 0,
        }
    }

    /// Insert or replace an entry, failing if the heap would exceed its limit.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<(), VmError> {
        let key = key.into();
        let new_size = entry_size(&key, &value);
        let old_size = self
            .entries
            .get(&key)
            .map(|old| entry_size(&key, old))
            .unwrap_or(0);

        let projected = self.bytes - old_size + new_size;
        if projected > self.limit {
            return Err(VmError::HeapLimitExceeded {
                size: projected,
                limit: self.limit,
            });
        }

        self.entries.insert(key, value);
        self.bytes = projected;
        self.high_water = self.high_water.max(projected);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&Value, VmError> {
        self.entries
            .get(key)
            .ok_or_else(|| VmError::HeapKeyNotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove an entry, returning the bytes released
    pub fn remove(&mut self, key: &str) -> Option<usize> {
        let value = self.entries.remove(key)?;
        let size = entry_size(key, &value);
        self.bytes -= size;
        Some(size)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current estimated footprint in bytes
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Fraction of the limit in use
    pub fn occupancy(&self) -> f64 {
        if self.limit == 0 {
            return 1.0;
        }
        self.bytes as f64 / self.limit as f64
    }

    /// Share of the peak footprint that is no longer live
    pub fn fragmentation(&self) -> f64 {
        if self.high_water == 0 {
            return 0.0;
        }
        1.0 - self.bytes as f64 / self.high_water as f64
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.bytes = 0;
        self.high_water = 0;
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(DEFAULT_HEAP_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut heap = Heap::default();
        heap.insert("x", Value::Int(3)).unwrap();
        assert_eq!(heap.get("x").unwrap(), &Value::Int(3));
        assert_eq!(heap.bytes(), entry_size("x", &Value::Int(3)));
        assert!(matches!(heap.get("y"), Err(VmError::HeapKeyNotFound(_))));
    }

    #[test]
    fn test_replace_accounts_delta() {
        let mut heap = Heap::default();
        heap.insert("blob", Value::Bytes(vec![0; 100])).unwrap();
        heap.insert("blob", Value::Bytes(vec![0; 10])).unwrap();
        assert_eq!(heap.len(), 1);
        assert_eq!(heap.bytes(), entry_size("blob", &Value::Bytes(vec![0; 10])));
    }

    #[test]
    fn test_limit_enforced() {
        let mut heap = Heap::new(64);
        let err = heap.insert("big", Value::Bytes(vec![0; 100])).unwrap_err();
        assert!(matches!(err, VmError::HeapLimitExceeded { limit: 64, .. }));
        assert!(heap.is_empty());
        assert_eq!(heap.bytes(), 0);
    }

    #[test]
    fn test_remove_and_fragmentation() {
        let mut heap = Heap::default();
        heap.insert("a", Value::Int(1)).unwrap();
        heap.insert("b", Value::Int(2)).unwrap();
        assert_eq!(heap.fragmentation(), 0.0);

        let freed = heap.remove("a").unwrap();
        assert_eq!(freed, entry_size("a", &Value::Int(1)));
        assert!((heap.fragmentation() - 0.5).abs() < 1e-9);
        assert!(heap.remove("a").is_none());
    }
}
