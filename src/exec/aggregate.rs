//! Grouped aggregation. Rows group by the concatenation of their
//! group-column values joined with `|`; each group computes COUNT over
//! its row count and SUM/AVG/MAX/MIN over the values of the aggregate
//! column that parse as `f64` (unparsable values are skipped).

use std::collections::BTreeMap;

use crate::records::Row;

use super::ExecutionEngine;

/// Aggregate function of a GROUP BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggFunc {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggFunc::Count => "COUNT",
            AggFunc::Sum => "SUM",
            AggFunc::Avg => "AVG",
            AggFunc::Max => "MAX",
            AggFunc::Min => "MIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "COUNT" => Some(AggFunc::Count),
            "SUM" => Some(AggFunc::Sum),
            "AVG" => Some(AggFunc::Avg),
            "MAX" => Some(AggFunc::Max),
            "MIN" => Some(AggFunc::Min),
            _ => None,
        }
    }
}

/// One group of the GROUP BY output: the grouping key fragments plus the
/// computed aggregates keyed by function name.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    keys: Vec<String>,
    aggregates: BTreeMap<String, f64>,
}

impl GroupRow {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn aggregates(&self) -> &BTreeMap<String, f64> {
        &self.aggregates
    }

    pub fn aggregate(&self, func: AggFunc) -> Option<f64> {
        self.aggregates.get(func.as_str()).copied()
    }
}

impl ExecutionEngine {
    /// Groups the table's rows by `group_columns` and computes the given
    /// `(column name, function)` aggregates per group. Unknown column
    /// names are skipped. Groups come back in key order.
    pub fn group_by(
        &mut self,
        table: &str,
        group_columns: &[String],
        aggregates: &[(String, AggFunc)],
    ) -> Vec<GroupRow> {
        let rows = self.seq_scan(table);
        if rows.is_empty() {
            return Vec::new();
        }

        let catalog = self.storage().catalog();
        let group_indices: Vec<usize> = group_columns
            .iter()
            .filter_map(|name| catalog.get_column_index(table, name))
            .collect();
        let agg_indices: Vec<(usize, AggFunc)> = aggregates
            .iter()
            .filter_map(|(name, func)| {
                catalog
                    .get_column_index(table, name)
                    .map(|idx| (idx, *func))
            })
            .collect();

        let mut groups: BTreeMap<String, Vec<&Row>> = BTreeMap::new();
        for row in &rows {
            let key = group_indices
                .iter()
                .map(|&idx| row.values().get(idx).map(String::as_str).unwrap_or(""))
                .collect::<Vec<_>>()
                .join("|");
            groups.entry(key).or_default().push(row);
        }

        let mut out = Vec::with_capacity(groups.len());
        for (key, members) in &groups {
            let keys: Vec<String> = if group_columns.is_empty() {
                Vec::new()
            } else {
                key.split('|')
                    .take(group_columns.len())
                    .map(str::to_string)
                    .collect()
            };

            let mut computed = BTreeMap::new();
            for &(col, func) in &agg_indices {
                if func == AggFunc::Count {
                    computed.insert(func.as_str().to_string(), members.len() as f64);
                    continue;
                }
                let nums: Vec<f64> = members
                    .iter()
                    .filter_map(|row| row.values().get(col))
                    .filter_map(|value| value.parse::<f64>().ok())
                    .collect();
                if nums.is_empty() {
                    continue;
                }
                let value = match func {
                    AggFunc::Sum => nums.iter().sum(),
                    AggFunc::Avg => nums.iter().sum::<f64>() / nums.len() as f64,
                    AggFunc::Max => nums.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    AggFunc::Min => nums.iter().copied().fold(f64::INFINITY, f64::min),
                    AggFunc::Count => unreachable!(),
                };
                computed.insert(func.as_str().to_string(), value);
            }

            out.push(GroupRow {
                keys,
                aggregates: computed,
            });
        }
        out
    }
}
