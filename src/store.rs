//! Owned storage and the container file format.
//!
//! A file is a typed header followed by two byte segments:
//!
//! ```text
//! ORDERED_TRIE_<format id>\n | endianness | major minor patch |
//! score segment (offset, length) | trie segment (offset, length) |
//! score table bytes | trie bytes
//! ```
//!
//! Version numbers and segment descriptors are native-endian; the
//! endianness byte gates loading on a foreign platform.

use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::{Result, TrieError};

/// Release triple embedded in every file; loading requires a matching major.
const RELEASE: (u32, u32, u32) = (1, 0, 0);

const MAGIC: &[u8] = b"ORDERED_TRIE_";

const LITTLE_ENDIAN: u8 = 1;
const BIG_ENDIAN: u8 = 2;

fn host_endianness() -> u8 {
    if cfg!(target_endian = "little") {
        LITTLE_ENDIAN
    } else {
        BIG_ENDIAN
    }
}

/// Owns the two byte segments of a serialized trie: the packed node stream
/// and the (possibly empty) score table.
///
/// A store is immutable for its entire lifetime. Trie instances share it by
/// reference counting, so cursors and iterators borrowed from one holder
/// stay valid as long as any holder lives.
pub(crate) struct Store {
    trie: Vec<u8>,
    scores: Vec<u8>,
}

impl Store {
    pub(crate) fn from_parts(trie: Vec<u8>, scores: Vec<u8>) -> Self {
        Store { trie, scores }
    }

    #[inline]
    pub(crate) fn trie_bytes(&self) -> &[u8] {
        &self.trie
    }

    #[inline]
    pub(crate) fn score_bytes(&self) -> &[u8] {
        &self.scores
    }

    /// Writes the header and both segments to `path`.
    ///
    /// `format_id` is the score codec's identifier; it becomes part of the
    /// magic so a file cannot be loaded under a different score type.
    pub(crate) fn write(&self, path: &Path, format_id: &str) -> Result<()> {
        let mut header = Vec::new();
        header.extend_from_slice(MAGIC);
        header.extend_from_slice(format_id.as_bytes());
        header.push(b'\n');
        header.push(host_endianness());
        for part in [RELEASE.0, RELEASE.1, RELEASE.2] {
            header.extend_from_slice(&part.to_ne_bytes());
        }

        // Both segment descriptors follow the fields above.
        let header_len = header.len() as u64 + 32;
        let (score_offset, score_len) = if self.scores.is_empty() {
            (0, 0)
        } else {
            (header_len, self.scores.len() as u64)
        };
        let trie_offset = header_len + self.scores.len() as u64;
        for value in [score_offset, score_len, trie_offset, self.trie.len() as u64] {
            header.extend_from_slice(&value.to_ne_bytes());
        }

        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(&header)?;
        out.write_all(&self.scores)?;
        out.write_all(&self.trie)?;
        out.flush()?;
        Ok(())
    }

    /// Loads and validates a store previously produced by [`Store::write`]
    /// with the same `format_id`.
    pub(crate) fn read(path: &Path, format_id: &str) -> Result<Self> {
        let mut file = File::open(path)?;

        let mut expected = Vec::with_capacity(MAGIC.len() + format_id.len() + 1);
        expected.extend_from_slice(MAGIC);
        expected.extend_from_slice(format_id.as_bytes());
        expected.push(b'\n');

        let mut magic = vec![0u8; expected.len()];
        read_exact(&mut file, &mut magic)?;
        if magic != expected {
            return Err(TrieError::InvalidMagic);
        }

        let mut endianness = [0u8; 1];
        read_exact(&mut file, &mut endianness)?;
        if endianness[0] != host_endianness() {
            return Err(TrieError::EndianMismatch);
        }

        let major = read_u32(&mut file)?;
        let _minor = read_u32(&mut file)?;
        let _patch = read_u32(&mut file)?;
        if major != RELEASE.0 {
            return Err(TrieError::InvalidVersion(major));
        }

        let score_offset = read_u64(&mut file)?;
        let score_len = read_u64(&mut file)?;
        let trie_offset = read_u64(&mut file)?;
        let trie_len = read_u64(&mut file)?;
        if trie_len == 0 {
            return Err(TrieError::TruncatedData);
        }

        let file_len = file.metadata()?.len();
        let scores = if score_offset != 0 {
            if score_len == 0 {
                return Err(TrieError::TruncatedData);
            }
            read_segment(&mut file, score_offset, score_len, file_len)?
        } else {
            Vec::new()
        };
        let trie = read_segment(&mut file, trie_offset, trie_len, file_len)?;

        Ok(Store { trie, scores })
    }
}

fn read_segment(file: &mut File, offset: u64, len: u64, file_len: u64) -> Result<Vec<u8>> {
    if offset.checked_add(len).map_or(true, |end| end > file_len) {
        return Err(TrieError::TruncatedData);
    }
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len as usize];
    read_exact(file, &mut buf)?;
    Ok(buf)
}

fn read_exact(file: &mut File, buf: &mut [u8]) -> Result<()> {
    file.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            TrieError::TruncatedData
        } else {
            TrieError::Io(e)
        }
    })
}

fn read_u32(file: &mut File) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(file, &mut buf)?;
    Ok(u32::from_ne_bytes(buf))
}

fn read_u64(file: &mut File) -> Result<u64> {
    let mut buf = [0u8; 8];
    read_exact(file, &mut buf)?;
    Ok(u64::from_ne_bytes(buf))
}
