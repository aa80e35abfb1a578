//! # Multi-Version Concurrency Control
//!
//! A minimal MVCC layer for uncommitted writes: each `(table, primary
//! key)` pair owns a singly linked chain of row versions, newest at the
//! head. Versions carry the writing transaction (`xmin`), an optional
//! deleting transaction (`xmax`), and a `committed` flag.
//!
//! ## Visibility
//!
//! A reader `R` with caller-supplied active set `A` walks the chain from
//! the head and takes the first version `n` where either
//!
//! - `n` is uncommitted and `n.xmin == R` (a transaction sees its own
//!   writes), or
//! - `n` is committed, has no `xmax`, and `n.xmin ∉ A` (snapshot
//!   isolation against in-flight writers).
//!
//! ```text
//! head                                   tail
//! ┌────────────────┐    ┌────────────────┐
//! │ xmin: T2       │    │ xmin: T1       │
//! │ committed: no  ├───►│ committed: yes │───► ∅
//! │ ["1", "new"]   │    │ ["1", "old"]   │
//! └────────────────┘    └────────────────┘
//! ```
//!
//! Chains are never reordered. Commit flips the flag in place; rollback
//! removes the head only when it is the transaction's own uncommitted
//! version. Version chains are independent of on-page storage: committing
//! a version does not materialize it on a data page.

mod chain;

pub use chain::{VersionChain, VersionNode, VersionStore};
