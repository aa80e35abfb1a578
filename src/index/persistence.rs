//! # Composite Index Persistence
//!
//! Snapshot and write-ahead-log encoding for the composite index. Three
//! files per table:
//!
//! - `<table>_cidx.meta`: one ASCII line of comma-separated zero-based
//!   column indices in key order;
//! - `<table>_cidx.bin`: full snapshot of the index map;
//! - `<table>_cidx.wal`: append-only log, one record per index insert.
//!
//! ## Record Format (snapshot and WAL, little-endian)
//!
//! ```text
//! u32   key_len
//! bytes key
//! u32   value_count
//! repeated value_count times:
//!   u32   field_len
//!   bytes field
//! ```
//!
//! Replay is last-write-wins: records upsert into the map in file order,
//! so a WAL entry written after the snapshot supersedes it. A truncated
//! tail (torn final write) ends the replay cleanly; complete records read
//! so far are kept.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use eyre::{Result, WrapErr};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, IntoBytes};

const WORD: usize = size_of::<u32>();

/// Writes the meta file: comma-separated column indices, single line.
pub fn write_meta(path: &Path, columns: &[usize]) -> Result<()> {
    let line = columns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    fs::write(path, line)
        .wrap_err_with(|| format!("failed to write index meta '{}'", path.display()))
}

/// Reads the meta file back into column indices.
pub fn read_meta(path: &Path) -> Result<Vec<usize>> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read index meta '{}'", path.display()))?;
    let line = text.lines().next().unwrap_or("");

    let mut columns = Vec::new();
    for token in line.split(',') {
        if token.is_empty() {
            continue;
        }
        let col = token
            .parse::<usize>()
            .wrap_err_with(|| format!("bad column index '{token}' in '{}'", path.display()))?;
        columns.push(col);
    }
    Ok(columns)
}

fn encode_record(buf: &mut Vec<u8>, key: &str, values: &[String]) {
    buf.extend_from_slice(U32::new(key.len() as u32).as_bytes());
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(U32::new(values.len() as u32).as_bytes());
    for value in values {
        buf.extend_from_slice(U32::new(value.len() as u32).as_bytes());
        buf.extend_from_slice(value.as_bytes());
    }
}

/// Truncate-writes a full snapshot of the index entries.
pub fn write_snapshot<'a>(
    path: &Path,
    entries: impl Iterator<Item = (&'a String, &'a Vec<String>)>,
) -> Result<()> {
    let mut buf = Vec::new();
    for (key, values) in entries {
        encode_record(&mut buf, key, values);
    }
    fs::write(path, buf)
        .wrap_err_with(|| format!("failed to write index snapshot '{}'", path.display()))
}

/// Appends one record to the WAL and syncs it, matching the synchronous
/// durability of regular page writes.
pub fn append_wal(path: &Path, key: &str, values: &[String]) -> Result<()> {
    let mut buf = Vec::new();
    encode_record(&mut buf, key, values);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("failed to open index WAL '{}'", path.display()))?;
    file.write_all(&buf)
        .wrap_err_with(|| format!("failed to append to index WAL '{}'", path.display()))?;
    file.sync_data()
        .wrap_err_with(|| format!("failed to sync index WAL '{}'", path.display()))?;
    Ok(())
}

/// Reads every complete record from a snapshot or WAL file, in file
/// order. Stops at a truncated tail; records with zero values are
/// dropped.
pub fn read_entries(path: &Path) -> Result<Vec<(String, Vec<String>)>> {
    let data = fs::read(path)
        .wrap_err_with(|| format!("failed to read index file '{}'", path.display()))?;

    let mut out = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let Some(key) = read_chunk(&data, &mut pos) else {
            break;
        };
        let Some(count) = read_word(&data, &mut pos) else {
            break;
        };

        let mut values = Vec::with_capacity(count.min(1024) as usize);
        let mut complete = true;
        for _ in 0..count {
            match read_chunk(&data, &mut pos) {
                Some(value) => values.push(value),
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if !complete {
            break;
        }
        if !values.is_empty() {
            out.push((key, values));
        }
    }
    Ok(out)
}

fn read_word(data: &[u8], pos: &mut usize) -> Option<u32> {
    let end = pos.checked_add(WORD)?;
    if end > data.len() {
        return None;
    }
    let word = U32::read_from_bytes(&data[*pos..end]).ok()?;
    *pos = end;
    Some(word.get())
}

fn read_chunk(data: &[u8], pos: &mut usize) -> Option<String> {
    let len = read_word(data, pos)? as usize;
    let end = pos.checked_add(len)?;
    if end > data.len() {
        return None;
    }
    let text = String::from_utf8(data[*pos..end].to_vec()).ok()?;
    *pos = end;
    Some(text)
}
