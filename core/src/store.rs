//! Single-file index persistence.
//!
//! Layout, all integers little-endian:
//!
//! | bytes | field                         |
//! |-------|-------------------------------|
//! | 4     | magic `BQIX`                  |
//! | 4     | format version                |
//! | 4     | CRC-32 of the payload         |
//! | 8     | payload length                |
//! | n     | bincode payload               |
//!
//! The payload holds an [`IndexHeader`], the documents table and the postings
//! table. Every load re-validates the index invariants.

use crate::error::{Result, SearchError};
use crate::index::{DocId, Document, InvertedIndex};
use crate::tokenizer::TokenizerConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const MAGIC: [u8; 4] = *b"BQIX";
pub const FORMAT_VERSION: u32 = 1;
const PREAMBLE_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexHeader {
    pub doc_count: u32,
    pub created_at: String,
    pub tokenizer: TokenizerConfig,
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    header: IndexHeader,
    documents: &'a BTreeMap<DocId, Document>,
    postings: &'a BTreeMap<String, Vec<DocId>>,
}

#[derive(Deserialize)]
struct Payload {
    header: IndexHeader,
    documents: BTreeMap<DocId, Document>,
    postings: BTreeMap<String, Vec<DocId>>,
}

/// Serialize `index` into the framed byte layout described above.
pub fn encode(index: &InvertedIndex) -> bincode::Result<Vec<u8>> {
    let header = IndexHeader {
        doc_count: index.doc_count(),
        created_at: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        tokenizer: index.tokenizer_config().clone(),
    };
    let payload = bincode::serialize(&PayloadRef {
        header,
        documents: index.documents(),
        postings: index.postings_table(),
    })?;
    Ok(frame(FORMAT_VERSION, &payload))
}

fn frame(version: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(PREAMBLE_LEN + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
    out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(buf)
}

/// Parse and validate a framed index.
pub fn decode(bytes: &[u8]) -> Result<(IndexHeader, InvertedIndex)> {
    if bytes.len() < PREAMBLE_LEN {
        return Err(SearchError::corrupt(format!("file is {} bytes, shorter than the preamble", bytes.len())));
    }
    if bytes[..4] != MAGIC {
        return Err(SearchError::corrupt("not an index file (bad magic)"));
    }
    let version = read_u32(bytes, 4);
    if version != FORMAT_VERSION {
        return Err(SearchError::corrupt(format!(
            "unsupported format version {version}, expected {FORMAT_VERSION}"
        )));
    }
    let checksum = read_u32(bytes, 8);
    let declared_len = read_u64(bytes, 12);
    let payload = &bytes[PREAMBLE_LEN..];
    if declared_len != payload.len() as u64 {
        return Err(SearchError::corrupt(format!(
            "payload is {} bytes but the header declares {declared_len}",
            payload.len()
        )));
    }
    if crc32fast::hash(payload) != checksum {
        return Err(SearchError::corrupt("payload checksum mismatch"));
    }
    let payload: Payload = bincode::deserialize(payload)
        .map_err(|e| SearchError::corrupt(format!("undecodable payload: {e}")))?;
    let index = InvertedIndex::from_parts(
        payload.header.tokenizer.clone(),
        payload.documents,
        payload.postings,
        payload.header.doc_count,
    )?;
    Ok((payload.header, index))
}

/// Write `index` to `destination`. The file appears only once fully written.
pub fn save(index: &InvertedIndex, destination: impl AsRef<Path>) -> Result<()> {
    let dest = destination.as_ref();
    let write_err = |source: io::Error| SearchError::IoWrite { path: dest.to_path_buf(), source };

    let bytes = encode(index).map_err(|e| write_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    let dir = match dest.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };

    // Each call gets its own temp file next to `dest`; dropping it on error removes it.
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(dest).map_err(|e| write_err(e.error))?;

    tracing::info!(path = %dest.display(), bytes = bytes.len(), num_docs = index.doc_count(), "index saved");
    Ok(())
}

pub fn load(source: impl AsRef<Path>) -> Result<InvertedIndex> {
    load_with_header(source).map(|(_, index)| index)
}

pub fn load_with_header(source: impl AsRef<Path>) -> Result<(IndexHeader, InvertedIndex)> {
    let path = source.as_ref();
    let bytes = fs::read(path).map_err(|source| SearchError::IoRead { path: path.to_path_buf(), source })?;
    let (header, index) = decode(&bytes)?;
    tracing::info!(path = %path.display(), num_docs = header.doc_count, created_at = %header.created_at, "index loaded");
    Ok((header, index))
}
