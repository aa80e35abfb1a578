//! Multi-key ordering over scan output. Sorting is stable, so rows equal
//! under every key keep their physical scan order.

use std::cmp::Ordering;

use crate::records::Row;

use super::predicate::compare_values;
use super::ExecutionEngine;

/// Sort direction of one ORDER BY key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl ExecutionEngine {
    /// Scans the table and stably sorts the rows by the given
    /// `(column name, direction)` keys. Unknown column names are skipped;
    /// per key the comparison is numeric iff both sides parse as `f64`.
    pub fn order_by(&mut self, table: &str, clauses: &[(String, SortOrder)]) -> Vec<Row> {
        let mut rows = self.seq_scan(table);
        if clauses.is_empty() {
            return rows;
        }

        let keys: Vec<(usize, SortOrder)> = clauses
            .iter()
            .filter_map(|(name, order)| {
                self.storage()
                    .catalog()
                    .get_column_index(table, name)
                    .map(|idx| (idx, *order))
            })
            .collect();
        if keys.is_empty() {
            return rows;
        }

        rows.sort_by(|a, b| compare_rows(a.values(), b.values(), &keys));
        rows
    }
}

fn compare_rows(a: &[String], b: &[String], keys: &[(usize, SortOrder)]) -> Ordering {
    for &(col, order) in keys {
        let (Some(va), Some(vb)) = (a.get(col), b.get(col)) else {
            continue;
        };
        let ord = compare_values(va, vb);
        if ord != Ordering::Equal {
            return match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vals: &[&str]) -> Vec<String> {
        vals.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn numeric_keys_compare_numerically() {
        let keys = [(0, SortOrder::Asc)];
        assert_eq!(
            compare_rows(&row(&["9"]), &row(&["10"]), &keys),
            Ordering::Less
        );
    }

    #[test]
    fn desc_reverses_the_order() {
        let keys = [(0, SortOrder::Desc)];
        assert_eq!(
            compare_rows(&row(&["9"]), &row(&["10"]), &keys),
            Ordering::Greater
        );
    }

    #[test]
    fn later_keys_break_ties() {
        let keys = [(0, SortOrder::Asc), (1, SortOrder::Desc)];
        assert_eq!(
            compare_rows(&row(&["1", "a"]), &row(&["1", "b"]), &keys),
            Ordering::Greater
        );
        assert_eq!(
            compare_rows(&row(&["1", "a"]), &row(&["1", "a"]), &keys),
            Ordering::Equal
        );
    }
}
