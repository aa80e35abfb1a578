//! # In-Memory Indexes
//!
//! Ordered indexes over row values:
//!
//! - [`PrimaryIndex`]: one entry per live row of a table whose schema has
//!   a primary-key column; rebuilt from page contents when the engine
//!   opens.
//! - [`CompositeIndex`]: keyed by several columns joined with the `0x1F`
//!   separator; durable through a snapshot plus write-ahead log (see
//!   [`persistence`]).
//!
//! Both indexes expose closed-interval range queries in lexicographic
//! key order. Insertions are upserts; deleting a row erases its entry.

mod composite;
pub mod persistence;
mod primary;

pub use composite::{CompositeIndex, KEY_SEPARATOR};
pub use primary::PrimaryIndex;
