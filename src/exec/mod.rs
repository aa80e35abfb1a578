//! # Execution Engine
//!
//! The operator family over the storage engine: DDL (create/drop table),
//! DML (insert, delete, update), scans (sequential, filtered, index,
//! range), projection, joins, ordering, and grouped aggregation.
//!
//! Operators return plain values (booleans, counts, row lists) and
//! never panic or surface errors across the boundary: a missing table or
//! column, an arity mismatch, or an I/O failure shows up as `false`,
//! `0`, or an empty result. Internal storage errors travel as
//! `eyre::Result` below this layer and are translated here.
//!
//! Row order out of a scan is deterministic: ascending page id, then
//! physical order within each page. Inserts fill the first page with
//! room scanning from the highest page id downward, so updated rows may
//! re-appear later in scan order than the rows they replaced.

mod aggregate;
mod join;
mod predicate;
mod sort;

pub use aggregate::{AggFunc, GroupRow};
pub use predicate::{compare_values, CompareOp, Condition};
pub use sort::SortOrder;

use tracing::warn;

use crate::records::Row;
use crate::schema::TableSchema;
use crate::storage::StorageEngine;
use crate::types::Column;

/// Executes operators against a storage engine it owns.
#[derive(Debug)]
pub struct ExecutionEngine {
    storage: StorageEngine,
}

impl ExecutionEngine {
    pub fn new(storage: StorageEngine) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &StorageEngine {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut StorageEngine {
        &mut self.storage
    }

    // ---- ddl -------------------------------------------------------------

    /// Registers a new table and initializes its primary index. Rejects
    /// empty names, empty column lists, and duplicate tables.
    pub fn create_table(&mut self, table: &str, columns: Vec<Column>) -> bool {
        if table.is_empty() || columns.is_empty() {
            return false;
        }
        let schema = TableSchema::new(table, columns);
        if self.storage.catalog_mut().register_table(schema.clone()).is_err() {
            return false;
        }
        self.storage.init_primary_index(&schema);
        true
    }

    /// Unregisters the table and deletes its page and index files.
    /// Refuses empty or unknown names.
    pub fn drop_table(&mut self, table: &str) -> bool {
        if table.is_empty() || self.storage.catalog().get_table_schema(table).is_none() {
            return false;
        }
        if self.storage.catalog_mut().unregister_table(table).is_err() {
            return false;
        }
        if !self.storage.drop_table_data(table) {
            warn!(table, "table data cleanup incomplete after catalog removal");
        }
        let _ = self.storage.drop_composite_index(table);
        true
    }

    // ---- dml -------------------------------------------------------------

    /// Inserts one row. Scans pages from the highest id downward for the
    /// first with room, creating a new page when none fits; flushes the
    /// touched page and maintains the indexes.
    pub fn insert(&mut self, table: &str, values: Vec<String>) -> bool {
        let Some(schema) = self.storage.catalog().get_table_schema(table) else {
            return false;
        };
        if values.len() != schema.column_count() {
            return false;
        }

        let row = Row::new(values);
        let max_id = self.storage.get_table_max_page_id(table);
        for page_id in (1..=max_id).rev() {
            let inserted = self
                .storage
                .get_page(table, page_id)
                .map_or(false, |page| page.insert_row(&row));
            if inserted {
                self.finish_insert(table, page_id, &row);
                return true;
            }
        }

        let page_id = self.storage.create_new_page(table);
        let inserted = self
            .storage
            .get_page(table, page_id)
            .map_or(false, |page| page.insert_row(&row));
        if inserted {
            self.finish_insert(table, page_id, &row);
            true
        } else {
            // The row does not fit even in an empty page.
            false
        }
    }

    fn finish_insert(&mut self, table: &str, page_id: u64, row: &Row) {
        if let Err(err) = self.storage.write_page(table, page_id) {
            warn!(table, page_id, %err, "failed to flush page after insert");
        }
        self.storage.insert_index_row(table, row.values());
    }

    /// Inserts a batch of rows, returning how many succeeded.
    pub fn insert_many(&mut self, table: &str, rows: Vec<Vec<String>>) -> usize {
        rows.into_iter()
            .filter(|values| self.insert(table, values.clone()))
            .count()
    }

    /// Tombstones every live row matching the predicate, erases its index
    /// entries, and flushes the touched pages. Returns the count.
    pub fn delete_rows<F>(&mut self, table: &str, predicate: F) -> usize
    where
        F: Fn(&[String]) -> bool,
    {
        if self.storage.catalog().get_table_schema(table).is_none() {
            return 0;
        }

        let mut deleted = 0;
        let max_id = self.storage.get_table_max_page_id(table);
        for page_id in 1..=max_id {
            let mut victims: Vec<(usize, Vec<String>)> = Vec::new();
            if let Some(page) = self.storage.get_page(table, page_id) {
                for (offset, row) in page.records() {
                    if !row.is_deleted() && predicate(row.values()) {
                        victims.push((offset, row.into_values()));
                    }
                }
                for (offset, _) in &victims {
                    page.mark_deleted(*offset);
                }
            }
            for (_, values) in &victims {
                self.storage.remove_index_entries(table, values);
            }
            deleted += victims.len();
            if let Err(err) = self.storage.write_page(table, page_id) {
                warn!(table, page_id, %err, "failed to flush page after delete");
            }
        }
        deleted
    }

    /// Updates every live row matching the predicate: tombstones the old
    /// record and re-inserts the substituted row through the normal insert
    /// path, so the replacement may land on any page. SET clauses naming
    /// unknown columns are skipped; a row counts only when its replacement
    /// insert succeeds.
    pub fn update_rows<F>(
        &mut self,
        table: &str,
        set_clauses: &[(String, String)],
        predicate: F,
    ) -> usize
    where
        F: Fn(&[String]) -> bool,
    {
        let Some(schema) = self.storage.catalog().get_table_schema(table) else {
            return 0;
        };
        let sets: Vec<(usize, String)> = set_clauses
            .iter()
            .filter_map(|(name, value)| {
                schema.column_index(name).map(|idx| (idx, value.clone()))
            })
            .collect();
        if sets.is_empty() {
            return 0;
        }

        let mut replacements: Vec<Vec<String>> = Vec::new();
        let max_id = self.storage.get_table_max_page_id(table);
        for page_id in 1..=max_id {
            let mut victims: Vec<(usize, Vec<String>, Vec<String>)> = Vec::new();
            if let Some(page) = self.storage.get_page(table, page_id) {
                for (offset, row) in page.records() {
                    if row.is_deleted() || !predicate(row.values()) {
                        continue;
                    }
                    let old_values = row.values().to_vec();
                    let mut new_values = row.into_values();
                    for (idx, value) in &sets {
                        if let Some(slot) = new_values.get_mut(*idx) {
                            *slot = value.clone();
                        }
                    }
                    victims.push((offset, old_values, new_values));
                }
                for (offset, _, _) in &victims {
                    page.mark_deleted(*offset);
                }
            }
            for (_, old_values, _) in &victims {
                self.storage.remove_index_entries(table, old_values);
            }
            if let Err(err) = self.storage.write_page(table, page_id) {
                warn!(table, page_id, %err, "failed to flush page after update");
            }
            replacements.extend(victims.into_iter().map(|(_, _, new_values)| new_values));
        }

        replacements
            .into_iter()
            .filter(|values| self.insert(table, values.clone()))
            .count()
    }

    // ---- scans -----------------------------------------------------------

    /// Reads every live row of the table: pages `1..=max_page_id` in
    /// ascending order, physical order within each page.
    pub fn seq_scan(&mut self, table: &str) -> Vec<Row> {
        if self.storage.catalog().get_table_schema(table).is_none() {
            return Vec::new();
        }
        let max_id = self.storage.get_table_max_page_id(table);
        let mut rows = Vec::new();
        for page_id in 1..=max_id {
            if let Some(page) = self.storage.get_page(table, page_id) {
                rows.extend(page.rows());
            }
        }
        rows
    }

    /// Sequential scan filtered by a caller-supplied per-row predicate.
    pub fn filter<F>(&mut self, table: &str, predicate: F) -> Vec<Row>
    where
        F: Fn(&[String]) -> bool,
    {
        self.seq_scan(table)
            .into_iter()
            .filter(|row| predicate(row.values()))
            .collect()
    }

    /// Sequential scan filtered by an AND of pushdown conditions. An
    /// empty condition list returns the full scan.
    pub fn filter_conditions(&mut self, table: &str, conditions: &[Condition]) -> Vec<Row> {
        let rows = self.seq_scan(table);
        if conditions.is_empty() {
            return rows;
        }
        rows.into_iter()
            .filter(|row| conditions.iter().all(|cond| cond.matches(row.values())))
            .collect()
    }

    /// Extracts the named columns, in the requested order, from rows of
    /// the table. Any unknown column name yields an empty result.
    pub fn project(
        &self,
        table: &str,
        rows: &[Row],
        target_columns: &[String],
    ) -> Vec<Vec<String>> {
        let mut indices = Vec::with_capacity(target_columns.len());
        for name in target_columns {
            match self.storage.catalog().get_column_index(table, name) {
                Some(idx) => indices.push(idx),
                None => return Vec::new(),
            }
        }
        rows.iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&idx| row.values().get(idx).cloned().unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    // ---- index scans -----------------------------------------------------

    /// Primary-index point lookup.
    pub fn index_scan(&self, table: &str, pk: &str) -> Option<Row> {
        self.storage.index_get_row_values(table, pk).map(Row::new)
    }

    /// Primary-index range lookup, closed interval `[min, max]` in
    /// lexicographic key order.
    pub fn index_range_scan(&self, table: &str, min_pk: &str, max_pk: &str) -> Vec<Row> {
        self.storage
            .index_range_row_values(table, min_pk, max_pk)
            .into_iter()
            .map(Row::new)
            .collect()
    }

    /// Composite-index range lookup, closed interval over the separator-
    /// joined keys.
    pub fn composite_index_range_scan(&self, table: &str, min: &str, max: &str) -> Vec<Row> {
        self.storage
            .composite_index_range_row_values(table, min, max)
            .into_iter()
            .map(Row::new)
            .collect()
    }
}
