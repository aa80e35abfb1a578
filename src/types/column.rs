//! Column definitions pairing a name with a `DataType` and the primary-key
//! marker. At most one column per table may be marked as the primary key.

use super::DataType;

/// A single column of a table schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    data_type: DataType,
    is_primary_key: bool,
}

impl Column {
    /// Creates a plain (non-key) column.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            is_primary_key: false,
        }
    }

    /// Marks this column as the table's primary key.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.is_primary_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_new_is_not_a_key() {
        let col = Column::new("name", DataType::String);
        assert_eq!(col.name(), "name");
        assert_eq!(col.data_type(), DataType::String);
        assert!(!col.is_primary_key());
    }

    #[test]
    fn primary_key_builder_sets_flag() {
        let col = Column::new("id", DataType::Int).primary_key();
        assert!(col.is_primary_key());
    }
}
