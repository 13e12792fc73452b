//! Secondary index: non-unique key to bucket-of-records mapping.

use crate::index::primary::matcher_bounds;
use crate::query::matcher::Matcher;
use crate::value::Value;
use std::collections::{BTreeMap, HashSet};

/// Ordered mapping from an indexed field's value to the primary keys of the
/// records carrying that value.
///
/// Buckets hold primary keys rather than record copies: membership is by
/// record identity, so two value-equal records with different primary keys
/// occupy distinct bucket entries, and removal takes out exactly the entry
/// for the given key. Removing an absent entry is a no-op.
#[derive(Debug)]
pub struct SecondaryIndex {
    field: String,
    buckets: BTreeMap<Value, HashSet<Value>>,
    total: usize,
}

impl SecondaryIndex {
    /// Creates an empty index on `field`.
    pub fn new(field: String) -> Self {
        Self {
            field,
            buckets: BTreeMap::new(),
            total: 0,
        }
    }

    /// The indexed field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Adds `primary_key` to the bucket for `key`.
    pub(crate) fn insert(&mut self, key: Value, primary_key: Value) {
        if self.buckets.entry(key).or_default().insert(primary_key) {
            self.total += 1;
        }
    }

    /// Removes `primary_key` from the bucket for `key`.
    ///
    /// Returns whether an entry was removed; an absent entry leaves the
    /// index untouched. Emptied buckets are dropped so that `len` counts
    /// live keys only.
    pub(crate) fn remove(&mut self, key: &Value, primary_key: &Value) -> bool {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return false;
        };
        if !bucket.remove(primary_key) {
            return false;
        }
        self.total -= 1;
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        true
    }

    /// Returns the bucket for `key`.
    pub fn bucket(&self, key: &Value) -> Option<&HashSet<Value>> {
        self.buckets.get(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns true if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of entries across all buckets.
    pub fn total_entries(&self) -> usize {
        self.total
    }

    /// Average bucket size, `total_entries / len`. Zero for an empty index.
    pub fn fan_out(&self) -> f64 {
        if self.buckets.is_empty() {
            0.0
        } else {
            self.total as f64 / self.buckets.len() as f64
        }
    }

    /// Drops all entries.
    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
        self.total = 0;
    }

    /// Selects the primary keys of candidate records for `matcher`.
    pub fn select(&self, matcher: &Matcher) -> Vec<Value> {
        match matcher {
            Matcher::Eq(key) => self
                .buckets
                .get(key)
                .map(|bucket| bucket.iter().cloned().collect())
                .unwrap_or_default(),
            _ => self
                .buckets
                .range(matcher_bounds(matcher))
                .flat_map(|(_, bucket)| bucket.iter().cloned())
                .collect(),
        }
    }

    /// Estimates the number of *keys* `matcher` would touch: 1 for a point
    /// lookup, the key count on the matching side for a bound. The analyzer
    /// scales this by [`fan_out`](Self::fan_out) to approximate record
    /// counts.
    pub fn estimate(&self, matcher: &Matcher) -> u64 {
        match matcher {
            Matcher::Eq(_) => 1,
            _ => self.buckets.range(matcher_bounds(matcher)).count() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::matcher::{eq, gte, lt};

    fn populated() -> SecondaryIndex {
        let mut index = SecondaryIndex::new("age".to_string());
        index.insert(Value::Int(23), Value::Int(1));
        index.insert(Value::Int(45), Value::Int(2));
        index.insert(Value::Int(34), Value::Int(3));
        index.insert(Value::Int(23), Value::Int(4));
        index
    }

    #[test]
    fn buckets_group_by_key() {
        let index = populated();
        assert_eq!(index.len(), 3);
        assert_eq!(index.total_entries(), 4);
        assert_eq!(index.bucket(&Value::Int(23)).unwrap().len(), 2);
    }

    #[test]
    fn identity_removal_takes_one_entry() {
        let mut index = populated();
        assert!(index.remove(&Value::Int(23), &Value::Int(1)));
        let bucket = index.bucket(&Value::Int(23)).unwrap();
        assert!(bucket.contains(&Value::Int(4)));
        assert!(!bucket.contains(&Value::Int(1)));
    }

    #[test]
    fn removing_absent_entry_is_noop() {
        let mut index = populated();
        assert!(!index.remove(&Value::Int(23), &Value::Int(99)));
        assert!(!index.remove(&Value::Int(99), &Value::Int(1)));
        assert_eq!(index.total_entries(), 4);
    }

    #[test]
    fn emptied_bucket_is_dropped() {
        let mut index = populated();
        index.remove(&Value::Int(45), &Value::Int(2));
        assert!(index.bucket(&Value::Int(45)).is_none());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn duplicate_insert_is_ignored() {
        let mut index = populated();
        index.insert(Value::Int(23), Value::Int(1));
        assert_eq!(index.total_entries(), 4);
    }

    #[test]
    fn fan_out() {
        let index = populated();
        assert!((index.fan_out() - 4.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(SecondaryIndex::new("x".into()).fan_out(), 0.0);
    }

    #[test]
    fn select_by_matcher() {
        let index = populated();

        let mut eq_keys = index.select(&eq(23));
        eq_keys.sort();
        assert_eq!(eq_keys, vec![Value::Int(1), Value::Int(4)]);

        assert_eq!(index.select(&gte(34)).len(), 2);
        assert_eq!(index.select(&lt(23)).len(), 0);
    }

    #[test]
    fn estimate_counts_keys_not_entries() {
        let index = populated();
        // Two records under age 23, but one key.
        assert_eq!(index.estimate(&lt(30)), 1);
        assert_eq!(index.estimate(&gte(23)), 3);
    }
}
