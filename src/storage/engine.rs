//! # Storage Engine
//!
//! Single owner of everything below the execution operators: the system
//! catalog, the page cache, per-table max page ids, primary and composite
//! indexes, and the MVCC version store. All mutation funnels through this
//! type; page handles are `&mut` borrows out of the cache, valid for the
//! duration of a single operation.
//!
//! Opening an engine replays persistent state in order: catalog page,
//! page-file probe for max page ids, primary index rebuild from live page
//! rows, then composite index load (meta, snapshot, WAL replay).

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use hashbrown::HashMap;
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

use crate::index::{persistence, CompositeIndex, PrimaryIndex};
use crate::mvcc::VersionStore;
use crate::records::Row;
use crate::schema::{SystemCatalog, TableSchema};

use super::files;
use super::page::Page;

/// Owner of the catalog, page cache, indexes, and version store.
#[derive(Debug)]
pub struct StorageEngine {
    base_dir: PathBuf,
    catalog: SystemCatalog,
    page_cache: HashMap<String, BTreeMap<u64, Page>>,
    max_page_ids: HashMap<String, u64>,
    primary_indexes: HashMap<String, PrimaryIndex>,
    composite_indexes: HashMap<String, CompositeIndex>,
    versions: VersionStore,
}

impl StorageEngine {
    /// Opens an engine over the process working directory.
    pub fn new() -> Result<Self> {
        Self::open(".")
    }

    /// Opens an engine over `base_dir`, loading the catalog and rebuilding
    /// index state from disk.
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).wrap_err_with(|| {
            format!(
                "failed to create database directory '{}'",
                base_dir.display()
            )
        })?;
        let catalog = SystemCatalog::open(&base_dir)?;

        let mut engine = Self {
            base_dir,
            catalog,
            page_cache: HashMap::new(),
            max_page_ids: HashMap::new(),
            primary_indexes: HashMap::new(),
            composite_indexes: HashMap::new(),
            versions: VersionStore::default(),
        };

        let tables = engine.catalog.table_names();
        for table in &tables {
            let max_id = engine.probe_max_page_id(table);
            engine.max_page_ids.insert(table.clone(), max_id);
        }
        for table in &tables {
            engine.rebuild_primary_index(table);
            if let Err(err) = engine.load_composite_index_if_exists(table) {
                warn!(table = table.as_str(), %err, "skipping unreadable composite index");
            }
        }

        debug!(tables = tables.len(), "storage engine opened");
        Ok(engine)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn catalog(&self) -> &SystemCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut SystemCatalog {
        &mut self.catalog
    }

    // ---- pages -----------------------------------------------------------

    /// Returns the cached page, loading it from disk on a miss. Never
    /// creates pages; a missing file yields `None`.
    pub fn get_page(&mut self, table: &str, page_id: u64) -> Option<&mut Page> {
        let pages = self.page_cache.entry(table.to_string()).or_default();
        if !pages.contains_key(&page_id) {
            let mut page = Page::new(page_id);
            if page.load_from_disk(&self.base_dir, table).is_err() {
                return None;
            }
            trace!(table, page_id, "loaded page from disk");
            pages.insert(page_id, page);
        }
        pages.get_mut(&page_id)
    }

    /// Allocates the next page id for the table and inserts a fresh
    /// zero-filled page into the cache.
    pub fn create_new_page(&mut self, table: &str) -> u64 {
        let page_id = self.get_table_max_page_id(table) + 1;
        self.max_page_ids.insert(table.to_string(), page_id);
        self.page_cache
            .entry(table.to_string())
            .or_default()
            .insert(page_id, Page::new(page_id));
        trace!(table, page_id, "created new page");
        page_id
    }

    /// Flushes the cached page when dirty.
    pub fn write_page(&mut self, table: &str, page_id: u64) -> Result<()> {
        if let Some(pages) = self.page_cache.get_mut(table) {
            if let Some(page) = pages.get_mut(&page_id) {
                page.write_to_disk(&self.base_dir, table)?;
            }
        }
        Ok(())
    }

    /// Flushes every dirty page across tables. The shutdown hook.
    pub fn flush_all_dirty_pages(&mut self) -> Result<()> {
        for (table, pages) in self.page_cache.iter_mut() {
            for page in pages.values_mut() {
                page.write_to_disk(&self.base_dir, table)?;
            }
        }
        Ok(())
    }

    /// Highest existing page id for the table, probing the filesystem for
    /// tables this engine has not yet touched.
    pub fn get_table_max_page_id(&mut self, table: &str) -> u64 {
        if let Some(&id) = self.max_page_ids.get(table) {
            return id;
        }
        let id = self.probe_max_page_id(table);
        self.max_page_ids.insert(table.to_string(), id);
        id
    }

    fn probe_max_page_id(&self, table: &str) -> u64 {
        let mut max_id = 0;
        while files::page_file_path(&self.base_dir, table, max_id + 1).exists() {
            max_id += 1;
        }
        max_id
    }

    /// Live row values of every page of the table, in page order.
    fn scan_row_values(&mut self, table: &str) -> Vec<Vec<String>> {
        let max_id = self.get_table_max_page_id(table);
        let mut out = Vec::new();
        for page_id in 1..=max_id {
            if let Some(page) = self.get_page(table, page_id) {
                out.extend(page.rows().into_iter().map(Row::into_values));
            }
        }
        out
    }

    // ---- primary index ---------------------------------------------------

    /// Installs a fresh (empty) primary index for the schema and forgets
    /// any composite index registered under the same name.
    pub fn init_primary_index(&mut self, schema: &TableSchema) {
        let index = PrimaryIndex::for_schema(schema);
        debug!(
            table = schema.name(),
            enabled = index.is_enabled(),
            "initialized primary index"
        );
        self.primary_indexes
            .insert(schema.name().to_string(), index);
        self.composite_indexes.remove(schema.name());
    }

    /// Seeds the table's primary index from its live page rows.
    fn rebuild_primary_index(&mut self, table: &str) {
        let Some(schema) = self.catalog.get_table_schema(table) else {
            return;
        };
        let mut index = PrimaryIndex::for_schema(schema);
        if index.is_enabled() {
            for values in self.scan_row_values(table) {
                index.insert(&values);
            }
            debug!(table, entries = index.len(), "rebuilt primary index");
        }
        self.primary_indexes.insert(table.to_string(), index);
    }

    /// Upserts the row into the primary index and, when a composite index
    /// is enabled, into the composite map plus its WAL.
    pub fn insert_index_row(&mut self, table: &str, values: &[String]) {
        if let Some(index) = self.primary_indexes.get_mut(table) {
            index.insert(values);
        }
        if let Some(cidx) = self.composite_indexes.get_mut(table) {
            if let Some(key) = cidx.build_key(values) {
                cidx.insert(key.clone(), values.to_vec());
                let wal_path = files::cidx_wal_path(&self.base_dir, table);
                if let Err(err) = persistence::append_wal(&wal_path, &key, values) {
                    warn!(table, %err, "failed to append composite index WAL record");
                }
            }
        }
    }

    /// Erases the row's keys from every enabled index.
    pub fn remove_index_entries(&mut self, table: &str, values: &[String]) {
        if let Some(index) = self.primary_indexes.get_mut(table) {
            index.remove_row(values);
        }
        if let Some(cidx) = self.composite_indexes.get_mut(table) {
            if let Some(key) = cidx.build_key(values) {
                cidx.remove(&key);
            }
        }
    }

    /// Whether the table's schema carries a primary-key column.
    pub fn has_index(&self, table: &str) -> bool {
        self.catalog
            .get_table_schema(table)
            .and_then(TableSchema::primary_key_index)
            .is_some()
    }

    pub fn get_table_columns(&self, table: &str) -> Vec<String> {
        self.catalog
            .get_table_schema(table)
            .map(|schema| {
                schema
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of entries in the table's primary index.
    pub fn get_index_size(&self, table: &str) -> usize {
        self.primary_indexes
            .get(table)
            .filter(|index| index.is_enabled())
            .map_or(0, PrimaryIndex::len)
    }

    /// Primary-index point lookup.
    pub fn index_get_row_values(&self, table: &str, key: &str) -> Option<Vec<String>> {
        self.primary_indexes.get(table)?.get(key).cloned()
    }

    /// Primary-index closed-interval range lookup.
    pub fn index_range_row_values(&self, table: &str, min: &str, max: &str) -> Vec<Vec<String>> {
        self.primary_indexes
            .get(table)
            .map(|index| index.range(min, max))
            .unwrap_or_default()
    }

    // ---- composite index -------------------------------------------------

    /// Builds a composite index over the given column positions, seeds it
    /// from existing rows, persists the snapshot and meta file, and clears
    /// any stale WAL. Returns `false` on empty columns or I/O failure.
    pub fn enable_composite_index(&mut self, table: &str, columns: &[usize]) -> bool {
        if columns.is_empty() {
            return false;
        }

        let mut cidx = CompositeIndex::new(columns);
        let seed_rows: Option<Vec<Vec<String>>> = self
            .primary_indexes
            .get(table)
            .filter(|index| index.is_enabled())
            .map(|index| index.entries().map(|(_, values)| values.clone()).collect());
        let seed_rows = match seed_rows {
            Some(rows) => rows,
            None => self.scan_row_values(table),
        };
        for values in seed_rows {
            if let Some(key) = cidx.build_key(&values) {
                cidx.insert(key, values);
            }
        }

        let snapshot_path = files::cidx_snapshot_path(&self.base_dir, table);
        if let Err(err) = persistence::write_snapshot(&snapshot_path, cidx.entries()) {
            warn!(table, %err, "failed to write composite index snapshot");
            return false;
        }
        let _ = fs::remove_file(files::cidx_wal_path(&self.base_dir, table));
        let meta_path = files::cidx_meta_path(&self.base_dir, table);
        if let Err(err) = persistence::write_meta(&meta_path, columns) {
            warn!(table, %err, "failed to write composite index meta");
            return false;
        }

        debug!(
            table,
            columns = columns.len(),
            entries = cidx.len(),
            "enabled composite index"
        );
        self.composite_indexes.insert(table.to_string(), cidx);
        true
    }

    /// Restores a composite index from meta + snapshot + WAL, when a meta
    /// file exists for the table.
    fn load_composite_index_if_exists(&mut self, table: &str) -> Result<()> {
        let meta_path = files::cidx_meta_path(&self.base_dir, table);
        if !meta_path.exists() {
            return Ok(());
        }

        let columns = persistence::read_meta(&meta_path)?;
        let mut cidx = CompositeIndex::new(&columns);

        let snapshot_path = files::cidx_snapshot_path(&self.base_dir, table);
        if snapshot_path.exists() {
            for (key, values) in persistence::read_entries(&snapshot_path)? {
                cidx.insert(key, values);
            }
        }
        let wal_path = files::cidx_wal_path(&self.base_dir, table);
        if wal_path.exists() {
            for (key, values) in persistence::read_entries(&wal_path)? {
                cidx.insert(key, values);
            }
        }

        debug!(table, entries = cidx.len(), "loaded composite index");
        self.composite_indexes.insert(table.to_string(), cidx);
        Ok(())
    }

    /// Forgets the composite index and deletes its meta, snapshot, and WAL
    /// files. Returns `false` when no composite index exists.
    pub fn drop_composite_index(&mut self, table: &str) -> bool {
        if self.composite_indexes.remove(table).is_none() {
            return false;
        }
        for path in [
            files::cidx_meta_path(&self.base_dir, table),
            files::cidx_snapshot_path(&self.base_dir, table),
            files::cidx_wal_path(&self.base_dir, table),
        ] {
            let _ = fs::remove_file(path);
        }
        debug!(table, "dropped composite index");
        true
    }

    pub fn get_composite_index_columns(&self, table: &str) -> Vec<usize> {
        self.composite_indexes
            .get(table)
            .map(|cidx| cidx.columns().to_vec())
            .unwrap_or_default()
    }

    /// Composite-index closed-interval range lookup.
    pub fn composite_index_range_row_values(
        &self,
        table: &str,
        min: &str,
        max: &str,
    ) -> Vec<Vec<String>> {
        self.composite_indexes
            .get(table)
            .map(|cidx| cidx.range(min, max))
            .unwrap_or_default()
    }

    // ---- table teardown --------------------------------------------------

    /// Evicts the table's pages (flushing dirty ones first), deletes its
    /// page files, and clears its max-page-id, primary index, and version
    /// chains. Returns `false` when a page file could not be deleted.
    pub fn drop_table_data(&mut self, table: &str) -> bool {
        if let Some(mut pages) = self.page_cache.remove(table) {
            for page in pages.values_mut() {
                if let Err(err) = page.write_to_disk(&self.base_dir, table) {
                    warn!(table, %err, "failed to flush page while dropping table");
                }
            }
        }

        let max_id = self.get_table_max_page_id(table);
        let mut success = true;
        for page_id in 1..=max_id {
            let path = files::page_file_path(&self.base_dir, table, page_id);
            if let Err(err) = fs::remove_file(&path) {
                warn!(table, page_id, %err, "failed to delete page file");
                success = false;
            }
        }

        self.max_page_ids.remove(table);
        self.primary_indexes.remove(table);
        self.versions.clear_table(table);
        debug!(table, "dropped table data");
        success
    }

    // ---- mvcc ------------------------------------------------------------

    /// Pushes an uncommitted row version for `txid`.
    pub fn mvcc_insert_uncommitted(
        &mut self,
        table: &str,
        values: Vec<String>,
        txid: &str,
        pk_index: usize,
    ) -> bool {
        self.versions
            .insert_uncommitted(table, values, txid, pk_index)
    }

    /// Commits `txid`'s own uncommitted head version.
    pub fn mvcc_commit_insert(&mut self, table: &str, pk: &str, txid: &str) -> bool {
        self.versions.commit_insert(table, pk, txid)
    }

    /// Pops `txid`'s own uncommitted head version.
    pub fn mvcc_rollback_insert(&mut self, table: &str, pk: &str, txid: &str) -> bool {
        self.versions.rollback_insert(table, pk, txid)
    }

    /// Stamps the first committed, undeleted version with `xmax = txid`.
    pub fn mvcc_mark_delete_commit(&mut self, table: &str, pk: &str, txid: &str) -> bool {
        self.versions.mark_delete_commit(table, pk, txid)
    }

    /// Returns the first version visible to `reader` under the given
    /// active set, per the visibility rule in the `mvcc` module docs.
    pub fn mvcc_lookup_visible(
        &self,
        table: &str,
        pk: &str,
        reader: &str,
        active: &[String],
    ) -> Option<Vec<String>> {
        self.versions
            .lookup_visible(table, pk, reader, active)
            .map(<[String]>::to_vec)
    }
}

impl Drop for StorageEngine {
    fn drop(&mut self) {
        if let Err(err) = self.flush_all_dirty_pages() {
            warn!(%err, "failed to flush dirty pages on shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, DataType};
    use tempfile::tempdir;

    fn users_schema() -> TableSchema {
        TableSchema::new(
            "users",
            vec![
                Column::new("id", DataType::Int).primary_key(),
                Column::new("name", DataType::String),
            ],
        )
    }

    fn row(vals: &[&str]) -> Row {
        Row::new(vals.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn get_page_never_creates() {
        let dir = tempdir().unwrap();
        let mut engine = StorageEngine::open(dir.path()).unwrap();
        assert!(engine.get_page("users", 1).is_none());
    }

    #[test]
    fn create_new_page_advances_max_page_id() {
        let dir = tempdir().unwrap();
        let mut engine = StorageEngine::open(dir.path()).unwrap();

        assert_eq!(engine.get_table_max_page_id("users"), 0);
        assert_eq!(engine.create_new_page("users"), 1);
        assert_eq!(engine.create_new_page("users"), 2);
        assert_eq!(engine.get_table_max_page_id("users"), 2);
        assert!(engine.get_page("users", 2).is_some());
    }

    #[test]
    fn max_page_id_probes_existing_files() {
        let dir = tempdir().unwrap();
        {
            let mut engine = StorageEngine::open(dir.path()).unwrap();
            let id = engine.create_new_page("users");
            let page = engine.get_page("users", id).unwrap();
            page.insert_row(&row(&["1", "Alice"]));
            engine.write_page("users", id).unwrap();
            let id = engine.create_new_page("users");
            let page = engine.get_page("users", id).unwrap();
            page.insert_row(&row(&["2", "Bob"]));
            engine.write_page("users", id).unwrap();
        }

        let mut engine = StorageEngine::open(dir.path()).unwrap();
        assert_eq!(engine.get_table_max_page_id("users"), 2);
    }

    #[test]
    fn primary_index_rebuilds_from_pages_on_open() {
        let dir = tempdir().unwrap();
        {
            let mut engine = StorageEngine::open(dir.path()).unwrap();
            engine.catalog_mut().register_table(users_schema()).unwrap();
            engine.init_primary_index(&users_schema());

            let id = engine.create_new_page("users");
            let page = engine.get_page("users", id).unwrap();
            page.insert_row(&row(&["1", "Alice"]));
            page.insert_row(&row(&["2", "Bob"]));
            engine.write_page("users", id).unwrap();
        }

        let engine = StorageEngine::open(dir.path()).unwrap();
        assert_eq!(engine.get_index_size("users"), 2);
        assert_eq!(
            engine.index_get_row_values("users", "2"),
            Some(vec!["2".to_string(), "Bob".to_string()])
        );
    }

    #[test]
    fn insert_index_row_upserts() {
        let dir = tempdir().unwrap();
        let mut engine = StorageEngine::open(dir.path()).unwrap();
        engine.catalog_mut().register_table(users_schema()).unwrap();
        engine.init_primary_index(&users_schema());

        engine.insert_index_row("users", &["1".to_string(), "Alice".to_string()]);
        engine.insert_index_row("users", &["1".to_string(), "Alicia".to_string()]);
        assert_eq!(engine.get_index_size("users"), 1);
        assert_eq!(
            engine.index_get_row_values("users", "1").unwrap()[1],
            "Alicia"
        );
    }

    #[test]
    fn remove_index_entries_erases_keys() {
        let dir = tempdir().unwrap();
        let mut engine = StorageEngine::open(dir.path()).unwrap();
        engine.catalog_mut().register_table(users_schema()).unwrap();
        engine.init_primary_index(&users_schema());

        let values = vec!["1".to_string(), "Alice".to_string()];
        engine.insert_index_row("users", &values);
        engine.remove_index_entries("users", &values);
        assert_eq!(engine.get_index_size("users"), 0);
        assert!(engine.index_get_row_values("users", "1").is_none());
    }

    #[test]
    fn has_index_follows_schema() {
        let dir = tempdir().unwrap();
        let mut engine = StorageEngine::open(dir.path()).unwrap();
        engine.catalog_mut().register_table(users_schema()).unwrap();
        engine
            .catalog_mut()
            .register_table(TableSchema::new(
                "logs",
                vec![Column::new("line", DataType::String)],
            ))
            .unwrap();

        assert!(engine.has_index("users"));
        assert!(!engine.has_index("logs"));
        assert!(!engine.has_index("missing"));
    }

    #[test]
    fn drop_table_data_removes_files_and_state() {
        let dir = tempdir().unwrap();
        let mut engine = StorageEngine::open(dir.path()).unwrap();
        engine.catalog_mut().register_table(users_schema()).unwrap();
        engine.init_primary_index(&users_schema());

        let id = engine.create_new_page("users");
        let page = engine.get_page("users", id).unwrap();
        page.insert_row(&row(&["1", "Alice"]));
        engine.write_page("users", id).unwrap();
        engine.insert_index_row("users", &["1".to_string(), "Alice".to_string()]);

        assert!(engine.drop_table_data("users"));
        assert!(!files::page_file_path(dir.path(), "users", 1).exists());
        assert_eq!(engine.get_index_size("users"), 0);
        assert_eq!(engine.get_table_max_page_id("users"), 0);
    }
}
