//! # Row Records
//!
//! Serialization of a single table row to the variable-length byte record
//! stored inside data pages.
//!
//! ## Record Binary Layout
//!
//! ```text
//! Offset  Size      Field        Description
//! ------  --------  -----------  ----------------------------------------
//! 0       1         deleted      Tombstone flag (0 = live, 1 = deleted)
//! 1       8         field_count  Number of fields (u64 little-endian)
//! 9       8         field_len    Length of field 0 (u64 little-endian)
//! 17      var       field_bytes  UTF-8 text, no terminator
//! ...                            Repeated for each remaining field
//! ```
//!
//! All row values are stored as UTF-8 text regardless of the declared
//! column type. Length prefixes are fixed 64-bit little-endian words so
//! that page files written on one machine decode identically on another.
//!
//! ## Tombstones
//!
//! Deletion is logical: the flag byte flips to 1 and the record bytes stay
//! on their page until the page is rewritten. The flag is monotone, there
//! is no path that resets it.
//!
//! ## Failure Mode
//!
//! Decoding fails when any length prefix overruns the remaining buffer.
//! Callers scanning a page stop at the first record that fails to decode.

use eyre::{ensure, Result, WrapErr};
use zerocopy::little_endian::U64;
use zerocopy::{FromBytes, IntoBytes};

/// Width of every length prefix in the record format.
pub const LEN_PREFIX_SIZE: usize = size_of::<u64>();

/// A single table row: ordered text field values plus a tombstone flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    values: Vec<String>,
    is_deleted: bool,
}

impl Row {
    pub fn new(values: Vec<String>) -> Self {
        Self {
            values,
            is_deleted: false,
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn into_values(self) -> Vec<String> {
        self.values
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }

    /// Encodes this row into the record format described in the module docs.
    pub fn serialize(&self) -> Vec<u8> {
        let payload: usize = self
            .values
            .iter()
            .map(|v| LEN_PREFIX_SIZE + v.len())
            .sum();
        let mut out = Vec::with_capacity(1 + LEN_PREFIX_SIZE + payload);

        out.push(self.is_deleted as u8);
        out.extend_from_slice(U64::new(self.values.len() as u64).as_bytes());
        for val in &self.values {
            out.extend_from_slice(U64::new(val.len() as u64).as_bytes());
            out.extend_from_slice(val.as_bytes());
        }
        out
    }

    /// Decodes a record produced by [`Row::serialize`].
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        ensure!(!data.is_empty(), "row record is empty");
        let is_deleted = data[0] == 1;
        let mut pos = 1;

        let field_count = read_word(data, &mut pos)? as usize;
        ensure!(
            field_count <= (data.len() - pos) / LEN_PREFIX_SIZE,
            "field count {} exceeds record capacity ({} bytes left)",
            field_count,
            data.len() - pos
        );

        let mut values = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            let len = read_word(data, &mut pos)? as usize;
            ensure!(
                len <= data.len() - pos,
                "field length {} overruns record ({} bytes left)",
                len,
                data.len() - pos
            );
            let text = String::from_utf8(data[pos..pos + len].to_vec())
                .wrap_err("row field is not valid UTF-8")?;
            values.push(text);
            pos += len;
        }

        Ok(Self { values, is_deleted })
    }
}

fn read_word(data: &[u8], pos: &mut usize) -> Result<u64> {
    ensure!(
        *pos + LEN_PREFIX_SIZE <= data.len(),
        "length prefix overruns record buffer at offset {}",
        *pos
    );
    let word = U64::read_from_bytes(&data[*pos..*pos + LEN_PREFIX_SIZE])
        .map_err(|e| eyre::eyre!("failed to read length prefix: {:?}", e))?;
    *pos += LEN_PREFIX_SIZE;
    Ok(word.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(values: Vec<&str>) {
        let row = Row::new(values.iter().map(|v| v.to_string()).collect());
        let decoded = Row::deserialize(&row.serialize()).unwrap();
        assert_eq!(decoded.values(), row.values());
        assert!(!decoded.is_deleted());
    }

    #[test]
    fn serialize_deserialize_roundtrip() {
        roundtrip(vec!["1", "Alice", "20.5"]);
        roundtrip(vec![]);
        roundtrip(vec![""]);
        roundtrip(vec!["", "x", ""]);
        roundtrip(vec!["héllo wörld", "\u{1F980}"]);
    }

    #[test]
    fn tombstone_survives_roundtrip() {
        let mut row = Row::new(vec!["1".to_string(), "Bob".to_string()]);
        row.mark_deleted();
        let decoded = Row::deserialize(&row.serialize()).unwrap();
        assert!(decoded.is_deleted());
        assert_eq!(decoded.values(), row.values());
    }

    #[test]
    fn layout_is_little_endian_64_bit() {
        let row = Row::new(vec!["ab".to_string()]);
        let bin = row.serialize();
        assert_eq!(bin[0], 0);
        assert_eq!(&bin[1..9], &1u64.to_le_bytes());
        assert_eq!(&bin[9..17], &2u64.to_le_bytes());
        assert_eq!(&bin[17..], b"ab");
    }

    #[test]
    fn deserialize_rejects_truncated_prefix() {
        let row = Row::new(vec!["hello".to_string()]);
        let bin = row.serialize();
        assert!(Row::deserialize(&bin[..5]).is_err());
    }

    #[test]
    fn deserialize_rejects_overrunning_field_length() {
        let row = Row::new(vec!["hello".to_string()]);
        let mut bin = row.serialize();
        // Inflate the field length beyond the buffer.
        bin[9..17].copy_from_slice(&1000u64.to_le_bytes());
        assert!(Row::deserialize(&bin).is_err());
    }

    #[test]
    fn deserialize_rejects_empty_buffer() {
        assert!(Row::deserialize(&[]).is_err());
    }

    #[test]
    fn deserialize_rejects_absurd_field_count() {
        let mut bin = vec![0u8];
        bin.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(Row::deserialize(&bin).is_err());
    }
}
