//! # Storage Module
//!
//! The foundational storage layer: fixed-size data pages, their on-disk
//! file conventions, and the storage engine that owns the page cache,
//! catalog, indexes, and MVCC version store.
//!
//! ## File-Per-Page Architecture
//!
//! Every page lives in its own file inside the engine's base directory:
//!
//! ```text
//! base_dir/
//! ├── sys_catalog_page_0.bin   # catalog page (page id 0)
//! ├── users_page_1.bin         # data pages (page ids 1..=max)
//! ├── users_page_2.bin
//! ├── users_cidx.meta          # composite index column list
//! ├── users_cidx.bin           # composite index snapshot
//! └── users_cidx.wal           # composite index write-ahead log
//! ```
//!
//! For any table the set of existing page files is contiguous
//! `1..=max_page_id`; the engine discovers `max_page_id` by probing for
//! files starting at 1 until the first gap.
//!
//! ## Concurrency
//!
//! The storage layer is strictly single-threaded: one owner drives all
//! operations serially and suspension happens only at synchronous disk
//! I/O boundaries. There are no internal locks; page handles are plain
//! `&mut` borrows out of the cache.

mod engine;
pub(crate) mod files;
mod page;

pub use engine::StorageEngine;
pub use page::{Page, PAGE_SIZE};
