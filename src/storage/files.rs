//! On-disk file naming conventions for pages and composite index files.

use std::path::{Path, PathBuf};

/// Pseudo-table owning the catalog page file (`sys_catalog_page_0.bin`).
pub const CATALOG_TABLE: &str = "sys_catalog";

/// Fixed page id of the catalog page. Data pages start at 1.
pub const CATALOG_PAGE_ID: u64 = 0;

pub fn page_file_path(base: &Path, table: &str, page_id: u64) -> PathBuf {
    base.join(format!("{table}_page_{page_id}.bin"))
}

pub fn cidx_meta_path(base: &Path, table: &str) -> PathBuf {
    base.join(format!("{table}_cidx.meta"))
}

pub fn cidx_snapshot_path(base: &Path, table: &str) -> PathBuf {
    base.join(format!("{table}_cidx.bin"))
}

pub fn cidx_wal_path(base: &Path, table: &str) -> PathBuf {
    base.join(format!("{table}_cidx.wal"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_conventions() {
        let base = Path::new("/data");
        assert_eq!(
            page_file_path(base, "users", 3),
            Path::new("/data/users_page_3.bin")
        );
        assert_eq!(
            page_file_path(base, CATALOG_TABLE, CATALOG_PAGE_ID),
            Path::new("/data/sys_catalog_page_0.bin")
        );
        assert_eq!(
            cidx_meta_path(base, "users"),
            Path::new("/data/users_cidx.meta")
        );
        assert_eq!(
            cidx_snapshot_path(base, "users"),
            Path::new("/data/users_cidx.bin")
        );
        assert_eq!(
            cidx_wal_path(base, "users"),
            Path::new("/data/users_cidx.wal")
        );
    }
}
