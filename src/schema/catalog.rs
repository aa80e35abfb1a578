//! # System Catalog
//!
//! The catalog maps table names to their schemas and persists itself to a
//! dedicated catalog page, `sys_catalog_page_0.bin` (page id 0).
//!
//! Each table is one catalog row whose values are:
//!
//! ```text
//! [ table_name, column_count,
//!   "<col0_name>:<TYPE>:<0|1>",
//!   "<col1_name>:<TYPE>:<0|1>", ... ]
//! ```
//!
//! with `TYPE` one of `INT`, `STRING`, `DOUBLE` and `1` marking the
//! primary-key column. Registration appends a row to page 0 and flushes;
//! unregistration rebuilds page 0 from the surviving entries.

use std::collections::BTreeMap;
use std::path::PathBuf;

use eyre::{ensure, Result};
use tracing::debug;

use crate::records::Row;
use crate::storage::files::{CATALOG_PAGE_ID, CATALOG_TABLE};
use crate::storage::Page;
use crate::types::{Column, DataType};

use super::TableSchema;

/// In-memory table-name → schema map backed by the catalog page.
#[derive(Debug)]
pub struct SystemCatalog {
    base_dir: PathBuf,
    schemas: BTreeMap<String, TableSchema>,
    catalog_page: Page,
}

impl SystemCatalog {
    /// Loads the catalog from `sys_catalog_page_0.bin` under `base_dir`.
    /// A missing file yields an empty catalog.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        let mut catalog_page = Page::new(CATALOG_PAGE_ID);
        let _ = catalog_page.load_from_disk(&base_dir, CATALOG_TABLE);

        let mut schemas = BTreeMap::new();
        for row in catalog_page.rows() {
            if let Some(schema) = decode_catalog_row(row.values()) {
                schemas.insert(schema.name().to_string(), schema);
            }
        }

        Ok(Self {
            base_dir,
            schemas,
            catalog_page,
        })
    }

    /// Registers a new table: caches the schema, appends its catalog row
    /// to page 0 and flushes. Fails when the name is already taken or the
    /// catalog page has no room left.
    pub fn register_table(&mut self, schema: TableSchema) -> Result<()> {
        ensure!(
            !self.schemas.contains_key(schema.name()),
            "table '{}' already exists",
            schema.name()
        );

        let row = Row::new(encode_catalog_row(&schema));
        ensure!(
            self.catalog_page.insert_row(&row),
            "catalog page is full, cannot register table '{}'",
            schema.name()
        );
        self.catalog_page.write_to_disk(&self.base_dir, CATALOG_TABLE)?;

        debug!(table = schema.name(), "registered table");
        self.schemas.insert(schema.name().to_string(), schema);
        Ok(())
    }

    /// Removes a table and rebuilds page 0 from the remaining entries.
    /// The in-memory removal stands even if the rebuild fails.
    pub fn unregister_table(&mut self, name: &str) -> Result<()> {
        ensure!(
            self.schemas.remove(name).is_some(),
            "table '{}' not found",
            name
        );

        let mut page = Page::new(CATALOG_PAGE_ID);
        for schema in self.schemas.values() {
            let row = Row::new(encode_catalog_row(schema));
            ensure!(
                page.insert_row(&row),
                "catalog page overflow while rebuilding after dropping '{}'",
                name
            );
        }
        page.set_dirty(true);
        page.write_to_disk(&self.base_dir, CATALOG_TABLE)?;
        self.catalog_page = page;

        debug!(table = name, "unregistered table");
        Ok(())
    }

    pub fn get_table_schema(&self, name: &str) -> Option<&TableSchema> {
        self.schemas.get(name)
    }

    pub fn column_exists(&self, table: &str, column: &str) -> bool {
        self.get_column_index(table, column).is_some()
    }

    pub fn get_column_index(&self, table: &str, column: &str) -> Option<usize> {
        self.schemas.get(table)?.column_index(column)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.schemas.keys().cloned().collect()
    }
}

fn encode_catalog_row(schema: &TableSchema) -> Vec<String> {
    let mut vals = Vec::with_capacity(2 + schema.column_count());
    vals.push(schema.name().to_string());
    vals.push(schema.column_count().to_string());
    for col in schema.columns() {
        vals.push(format!(
            "{}:{}:{}",
            col.name(),
            col.data_type().as_str(),
            col.is_primary_key() as u8
        ));
    }
    vals
}

/// Decodes one catalog row back into a schema. Malformed rows are skipped
/// wholesale rather than producing a partial schema.
fn decode_catalog_row(vals: &[String]) -> Option<TableSchema> {
    if vals.len() < 3 {
        return None;
    }
    let name = vals[0].as_str();
    let column_count: usize = vals[1].parse().ok()?;

    let mut columns = Vec::with_capacity(column_count);
    for info in vals.get(2..2 + column_count)? {
        let mut parts = info.splitn(3, ':');
        let col_name = parts.next()?;
        let type_tag = parts.next()?;
        let is_pk = parts.next()? == "1";

        let data_type = DataType::parse(type_tag).unwrap_or(DataType::Int);
        let mut column = Column::new(col_name, data_type);
        if is_pk {
            column = column.primary_key();
        }
        columns.push(column);
    }
    Some(TableSchema::new(name, columns))
}
