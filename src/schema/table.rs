//! Table schema definitions. A schema is immutable once registered with
//! the catalog; row identity is positional, following column order.

use crate::types::Column;

/// Named, ordered collection of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    columns: Vec<Column>,
    column_count: usize,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        let column_count = columns.len();
        Self {
            name: name.into(),
            columns,
            column_count,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Position of the primary-key column, if the table has one.
    pub fn primary_key_index(&self) -> Option<usize> {
        self.columns.iter().position(Column::is_primary_key)
    }

    /// Position of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn schema() -> TableSchema {
        TableSchema::new(
            "users",
            vec![
                Column::new("id", DataType::Int).primary_key(),
                Column::new("name", DataType::String),
                Column::new("score", DataType::Double),
            ],
        )
    }

    #[test]
    fn column_count_tracks_columns() {
        assert_eq!(schema().column_count(), 3);
    }

    #[test]
    fn primary_key_index_finds_the_key() {
        assert_eq!(schema().primary_key_index(), Some(0));

        let no_pk = TableSchema::new("t", vec![Column::new("a", DataType::Int)]);
        assert_eq!(no_pk.primary_key_index(), None);
    }

    #[test]
    fn column_index_resolves_by_name() {
        let s = schema();
        assert_eq!(s.column_index("score"), Some(2));
        assert_eq!(s.column_index("missing"), None);
    }
}
