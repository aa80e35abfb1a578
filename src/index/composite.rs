//! # Composite Index
//!
//! An ordered map keyed by the concatenation of several column values,
//! separated by the unit-separator byte `0x1F`. The separator keeps
//! typical textual values collision-free; values that themselves contain
//! `0x1F` would produce ambiguous keys and are rejected (the row is
//! simply not indexed).
//!
//! Range queries use the same closed-interval lexicographic semantics as
//! the primary index, so callers can probe with keys like `"1\x1F10"`.

use std::collections::BTreeMap;
use std::ops::Bound;

use smallvec::SmallVec;

/// Separator byte between key components (ASCII Unit Separator).
pub const KEY_SEPARATOR: char = '\u{1F}';

/// Ordered multi-column index over concatenated key strings.
#[derive(Debug)]
pub struct CompositeIndex {
    columns: SmallVec<[usize; 4]>,
    entries: BTreeMap<String, Vec<String>>,
}

impl CompositeIndex {
    pub fn new(columns: &[usize]) -> Self {
        Self {
            columns: SmallVec::from_slice(columns),
            entries: BTreeMap::new(),
        }
    }

    /// Zero-based column positions making up the key, in key order.
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds the composite key for a row. Returns `None` when a key
    /// column is out of range, a value contains the separator, or the
    /// resulting key would be empty.
    pub fn build_key(&self, values: &[String]) -> Option<String> {
        let mut key = String::new();
        for (i, &col) in self.columns.iter().enumerate() {
            let val = values.get(col)?;
            if val.contains(KEY_SEPARATOR) {
                return None;
            }
            if i > 0 {
                key.push(KEY_SEPARATOR);
            }
            key.push_str(val);
        }
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    /// Upserts an entry.
    pub fn insert(&mut self, key: String, values: Vec<String>) {
        self.entries.insert(key, values);
    }

    /// Point lookup by composite key.
    pub fn get(&self, key: &str) -> Option<&Vec<String>> {
        self.entries.get(key)
    }

    /// Closed-interval range `[min, max]`, lexicographic key order.
    pub fn range(&self, min: &str, max: &str) -> Vec<Vec<String>> {
        if min > max {
            return Vec::new();
        }
        self.entries
            .range::<str, _>((Bound::Included(min), Bound::Included(max)))
            .map(|(_, values)| values.clone())
            .collect()
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// All entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vals: &[&str]) -> Vec<String> {
        vals.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn build_key_joins_with_unit_separator() {
        let idx = CompositeIndex::new(&[0, 1]);
        let key = idx.build_key(&row(&["1", "10", "x"])).unwrap();
        assert_eq!(key, "1\u{1F}10");
    }

    #[test]
    fn build_key_rejects_out_of_range_column() {
        let idx = CompositeIndex::new(&[0, 5]);
        assert_eq!(idx.build_key(&row(&["1", "10"])), None);
    }

    #[test]
    fn build_key_rejects_separator_in_value() {
        let idx = CompositeIndex::new(&[0]);
        assert_eq!(idx.build_key(&row(&["a\u{1F}b"])), None);
    }

    #[test]
    fn build_key_rejects_empty_key() {
        let idx = CompositeIndex::new(&[0]);
        assert_eq!(idx.build_key(&row(&[""])), None);
    }

    #[test]
    fn range_returns_closed_interval_in_key_order() {
        let mut idx = CompositeIndex::new(&[0, 1]);
        for vals in [["1", "10", "x"], ["1", "20", "y"], ["2", "10", "z"]] {
            let values = row(&vals);
            let key = idx.build_key(&values).unwrap();
            idx.insert(key, values);
        }

        let hits = idx.range("1\u{1F}10", "1\u{1F}20");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0], row(&["1", "10", "x"]));
        assert_eq!(hits[1], row(&["1", "20", "y"]));

        assert!(idx.range("9", "1").is_empty());
    }

    #[test]
    fn insert_is_upsert_and_remove_erases() {
        let mut idx = CompositeIndex::new(&[0]);
        idx.insert("k".to_string(), row(&["k", "old"]));
        idx.insert("k".to_string(), row(&["k", "new"]));
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.get("k").unwrap()[1], "new");

        assert!(idx.remove("k"));
        assert!(!idx.remove("k"));
        assert!(idx.is_empty());
    }
}
