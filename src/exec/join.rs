//! Inner joins over two tables: a hash join building a multimap over the
//! right side, and a sort-merge join for the same equi-join. Both emit
//! the left row's columns followed by the right row's columns, and both
//! produce the cartesian product of equal-key runs, so their outputs
//! agree as multisets.
//!
//! Join keys compare as plain strings; the merge join's sort is the same
//! lexicographic order the ordered indexes use.

use std::cmp::Ordering;

use hashbrown::HashMap;

use crate::records::Row;

use super::ExecutionEngine;

impl ExecutionEngine {
    /// Hash inner join: builds a multimap over `right_col`, streams the
    /// left table, and emits left‖right per match. Unknown tables or
    /// columns yield an empty result.
    pub fn inner_join(
        &mut self,
        left_table: &str,
        right_table: &str,
        left_col: &str,
        right_col: &str,
    ) -> Vec<Vec<String>> {
        let Some((left_idx, right_idx)) =
            self.join_column_indices(left_table, right_table, left_col, right_col)
        else {
            return Vec::new();
        };

        let mut right_map: HashMap<String, Vec<Vec<String>>> = HashMap::new();
        for row in self.seq_scan(right_table) {
            let values = row.into_values();
            if let Some(key) = values.get(right_idx) {
                right_map.entry(key.clone()).or_default().push(values);
            }
        }

        let mut out = Vec::new();
        for row in self.seq_scan(left_table) {
            let left_values = row.into_values();
            let Some(key) = left_values.get(left_idx) else {
                continue;
            };
            if let Some(matches) = right_map.get(key) {
                for right_values in matches {
                    out.push(concat_rows(&left_values, right_values));
                }
            }
        }
        out
    }

    /// Sort-merge inner join: sorts both sides by their key column
    /// (lexicographic string order), then merges, emitting the cartesian
    /// product of equal-key runs.
    pub fn merge_join(
        &mut self,
        left_table: &str,
        right_table: &str,
        left_col: &str,
        right_col: &str,
    ) -> Vec<Vec<String>> {
        let Some((left_idx, right_idx)) =
            self.join_column_indices(left_table, right_table, left_col, right_col)
        else {
            return Vec::new();
        };

        let mut left_rows: Vec<Vec<String>> = self
            .seq_scan(left_table)
            .into_iter()
            .map(Row::into_values)
            .collect();
        let mut right_rows: Vec<Vec<String>> = self
            .seq_scan(right_table)
            .into_iter()
            .map(Row::into_values)
            .collect();
        left_rows.sort_by(|a, b| key_at(a, left_idx).cmp(key_at(b, left_idx)));
        right_rows.sort_by(|a, b| key_at(a, right_idx).cmp(key_at(b, right_idx)));

        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < left_rows.len() && j < right_rows.len() {
            let left_key = key_at(&left_rows[i], left_idx);
            let right_key = key_at(&right_rows[j], right_idx);
            match left_key.cmp(right_key) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    let i_end = run_end(&left_rows, i, left_idx);
                    let j_end = run_end(&right_rows, j, right_idx);
                    for a in i..i_end {
                        for b in j..j_end {
                            out.push(concat_rows(&left_rows[a], &right_rows[b]));
                        }
                    }
                    i = i_end;
                    j = j_end;
                }
            }
        }
        out
    }

    fn join_column_indices(
        &self,
        left_table: &str,
        right_table: &str,
        left_col: &str,
        right_col: &str,
    ) -> Option<(usize, usize)> {
        let catalog = self.storage().catalog();
        let left_idx = catalog.get_column_index(left_table, left_col)?;
        let right_idx = catalog.get_column_index(right_table, right_col)?;
        Some((left_idx, right_idx))
    }
}

fn key_at(values: &[String], idx: usize) -> &str {
    values.get(idx).map(String::as_str).unwrap_or("")
}

/// First index past the run of rows sharing `rows[start]`'s key.
fn run_end(rows: &[Vec<String>], start: usize, idx: usize) -> usize {
    let key = key_at(&rows[start], idx);
    let mut end = start + 1;
    while end < rows.len() && key_at(&rows[end], idx) == key {
        end += 1;
    }
    end
}

fn concat_rows(left: &[String], right: &[String]) -> Vec<String> {
    let mut joined = Vec::with_capacity(left.len() + right.len());
    joined.extend_from_slice(left);
    joined.extend_from_slice(right);
    joined
}
