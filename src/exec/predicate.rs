//! Pushdown filter conditions: `(column, operator, value)` tuples
//! evaluated inside the engine without a per-row caller callback.
//!
//! Comparison first tries to parse both sides as `f64`; only when both
//! parse is the comparison numeric, otherwise it falls back to plain
//! string ordering. This keeps results stable across mixed-type columns.

use std::cmp::Ordering;

/// Comparison operator of a pushdown condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    Ne,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Ne => "!=",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "=" => Some(CompareOp::Eq),
            ">" => Some(CompareOp::Gt),
            "<" => Some(CompareOp::Lt),
            ">=" => Some(CompareOp::Ge),
            "<=" => Some(CompareOp::Le),
            "!=" => Some(CompareOp::Ne),
            _ => None,
        }
    }

    fn eval(&self, ord: Ordering) -> bool {
        match self {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Ge => ord != Ordering::Less,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Ne => ord != Ordering::Equal,
        }
    }
}

/// Compares two text values, numerically when both parse as `f64`.
pub fn compare_values(lhs: &str, rhs: &str) -> Ordering {
    match (lhs.parse::<f64>(), rhs.parse::<f64>()) {
        (Ok(l), Ok(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        _ => lhs.cmp(rhs),
    }
}

/// One conjunct of a pushdown filter.
#[derive(Debug, Clone)]
pub struct Condition {
    column: usize,
    op: CompareOp,
    value: String,
}

impl Condition {
    pub fn new(column: usize, op: CompareOp, value: impl Into<String>) -> Self {
        Self {
            column,
            op,
            value: value.into(),
        }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Evaluates this condition against a row. A column position outside
    /// the row rejects the row.
    pub fn matches(&self, values: &[String]) -> bool {
        match values.get(self.column) {
            Some(lhs) => self.op.eval(compare_values(lhs, &self.value)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vals: &[&str]) -> Vec<String> {
        vals.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn numeric_comparison_when_both_sides_parse() {
        // "10" > "9" numerically even though "10" < "9" as strings.
        assert!(Condition::new(0, CompareOp::Gt, "9").matches(&row(&["10"])));
        assert!(!Condition::new(0, CompareOp::Lt, "9").matches(&row(&["10"])));
        assert!(Condition::new(0, CompareOp::Eq, "2.0").matches(&row(&["2"])));
    }

    #[test]
    fn string_comparison_when_either_side_is_text() {
        assert!(Condition::new(0, CompareOp::Lt, "b").matches(&row(&["a"])));
        // Mixed: "10" vs "x" falls back to string order.
        assert!(Condition::new(0, CompareOp::Lt, "x").matches(&row(&["10"])));
        assert!(Condition::new(0, CompareOp::Ne, "Alice").matches(&row(&["Bob"])));
    }

    #[test]
    fn all_operators_evaluate() {
        let values = row(&["5"]);
        assert!(Condition::new(0, CompareOp::Eq, "5").matches(&values));
        assert!(Condition::new(0, CompareOp::Ge, "5").matches(&values));
        assert!(Condition::new(0, CompareOp::Le, "5").matches(&values));
        assert!(Condition::new(0, CompareOp::Gt, "4").matches(&values));
        assert!(Condition::new(0, CompareOp::Lt, "6").matches(&values));
        assert!(Condition::new(0, CompareOp::Ne, "4").matches(&values));
    }

    #[test]
    fn missing_column_rejects_the_row() {
        assert!(!Condition::new(3, CompareOp::Eq, "x").matches(&row(&["x"])));
    }

    #[test]
    fn op_spelling_roundtrip() {
        for op in [
            CompareOp::Eq,
            CompareOp::Gt,
            CompareOp::Lt,
            CompareOp::Ge,
            CompareOp::Le,
            CompareOp::Ne,
        ] {
            assert_eq!(CompareOp::parse(op.as_str()), Some(op));
        }
        assert_eq!(CompareOp::parse("=="), None);
    }
}
