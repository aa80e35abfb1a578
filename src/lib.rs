//! # shaledb - Embedded Page-Based Row Store
//!
//! shaledb is the storage and execution core of a small relational
//! database: a page-based on-disk row store, an in-memory catalog,
//! primary-key and composite secondary indexes with snapshot + WAL
//! durability, a family of execution operators, and a minimal
//! multi-version concurrency layer for uncommitted writes.
//!
//! ## Quick Start
//!
//! ```ignore
//! use shaledb::{Column, DataType, ExecutionEngine, StorageEngine};
//!
//! let storage = StorageEngine::open("./mydb")?;
//! let mut exec = ExecutionEngine::new(storage);
//!
//! exec.create_table(
//!     "users",
//!     vec![
//!         Column::new("id", DataType::Int).primary_key(),
//!         Column::new("name", DataType::String),
//!     ],
//! );
//! exec.insert("users", vec!["1".into(), "Alice".into()]);
//!
//! for row in exec.seq_scan("users") {
//!     println!("{:?}", row.values());
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │      Execution Engine (operators)       │
//! ├─────────────────────────────────────────┤
//! │ Catalog │ Primary/Composite Idx │ MVCC  │
//! ├─────────────────────────────────────────┤
//! │       Storage Engine (page cache)       │
//! ├─────────────────────────────────────────┤
//! │   Row Records on 4 KiB Pages + Files    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! An upstream caller (parser, planner, REPL, all out of scope) invokes
//! execution operators; each operator consults the catalog, walks page
//! ids through the page cache, and reads or mutates rows. Index
//! maintenance happens inline on insert. Row durability is per-page
//! flush on write; composite index durability is WAL-on-write plus a
//! full snapshot on rebuild.
//!
//! ## File Layout
//!
//! All files live flat in the engine's base directory:
//!
//! ```text
//! base_dir/
//! ├── sys_catalog_page_0.bin   # catalog page
//! ├── <table>_page_<n>.bin     # 4096-byte data pages, n >= 1
//! ├── <table>_cidx.meta        # composite index column list
//! ├── <table>_cidx.bin         # composite index snapshot
//! └── <table>_cidx.wal         # composite index write-ahead log
//! ```
//!
//! ## Concurrency Model
//!
//! Strictly single-threaded and synchronous: one in-process owner drives
//! all operations serially, and the engine takes no internal locks.
//! The MVCC layer provides visibility rules over caller-managed
//! transaction ids, not scheduling.
//!
//! ## Module Overview
//!
//! - [`storage`]: 4 KiB pages, file conventions, the storage engine
//! - [`records`]: row record serialization with tombstone flags
//! - [`schema`]: table schemas and the page-backed system catalog
//! - [`index`]: ordered primary and composite indexes, snapshot + WAL
//! - [`mvcc`]: per-row version chains and visibility
//! - [`exec`]: the execution operators
//! - [`types`]: column metadata and data type tags

pub mod exec;
pub mod index;
pub mod mvcc;
pub mod records;
pub mod schema;
pub mod storage;
pub mod types;

pub use exec::{AggFunc, CompareOp, Condition, ExecutionEngine, GroupRow, SortOrder};
pub use records::Row;
pub use schema::{SystemCatalog, TableSchema};
pub use storage::{Page, StorageEngine, PAGE_SIZE};
pub use types::{Column, DataType};
