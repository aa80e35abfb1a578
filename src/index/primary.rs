//! In-memory primary-key index: an ordered map from the primary-key text
//! to the full row values. Keys compare lexicographically, not numerically.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::schema::TableSchema;

/// Ordered map over a table's primary-key column.
#[derive(Debug, Default)]
pub struct PrimaryIndex {
    enabled: bool,
    pk_index: usize,
    entries: BTreeMap<String, Vec<String>>,
}

impl PrimaryIndex {
    /// Builds an (initially empty) index for the schema. Disabled when the
    /// schema has no primary-key column.
    pub fn for_schema(schema: &TableSchema) -> Self {
        match schema.primary_key_index() {
            Some(pk_index) => Self {
                enabled: true,
                pk_index,
                entries: BTreeMap::new(),
            },
            None => Self::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn pk_index(&self) -> usize {
        self.pk_index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Upserts the row under its primary-key value. Returns `false` when
    /// the index is disabled or the key column is out of range.
    pub fn insert(&mut self, values: &[String]) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(key) = values.get(self.pk_index) else {
            return false;
        };
        self.entries.insert(key.clone(), values.to_vec());
        true
    }

    /// Point lookup by primary-key value.
    pub fn get(&self, key: &str) -> Option<&Vec<String>> {
        if !self.enabled {
            return None;
        }
        self.entries.get(key)
    }

    /// Closed-interval range `[min, max]`, lexicographic key order.
    pub fn range(&self, min: &str, max: &str) -> Vec<Vec<String>> {
        if !self.enabled || min > max {
            return Vec::new();
        }
        self.entries
            .range::<str, _>((Bound::Included(min), Bound::Included(max)))
            .map(|(_, values)| values.clone())
            .collect()
    }

    /// Removes the entry for the row's primary-key value.
    pub fn remove_row(&mut self, values: &[String]) -> bool {
        if !self.enabled {
            return false;
        }
        values
            .get(self.pk_index)
            .map(|key| self.entries.remove(key).is_some())
            .unwrap_or(false)
    }

    /// All entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.entries.iter()
    }
}
