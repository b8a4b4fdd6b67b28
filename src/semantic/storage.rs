//! Binary cache of dense note embeddings.
//!
//! File format: embeddings.bin
//!
//! Header (47 bytes):
//! - version: u8 (1)
//! - model_id: [u8; 32] (SHA256 hash of model name)
//! - dimensions: u16 (little-endian)
//! - entry_count: u64 (little-endian)
//! - checksum: u32 (CRC32 of header fields before checksum)
//!
//! Entries (repeated):
//! - id_len: u16 (little-endian)
//! - note_id: [u8; id_len] (UTF-8)
//! - content_hash: u64 (little-endian)
//! - embedding: [f32; dimensions] (little-endian)
//!
//! Random-Indexing state is never written here; it is rebuilt from notes.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const FORMAT_VERSION: u8 = 1;

/// version(1) + model_id(32) + dimensions(2) + entry_count(8) + checksum(4)
const HEADER_SIZE: usize = 47;

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Version mismatch: file version {0}, supported version {1}")]
    VersionMismatch(u8, u8),

    #[error("Model mismatch: file uses different model")]
    ModelMismatch,

    #[error("Checksum mismatch: file may be corrupted")]
    ChecksumMismatch,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// A cached embedding and the hash of the text it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEmbedding {
    pub content_hash: u64,
    pub embedding: Vec<f32>,
}

/// Note id -> cached embedding, ordered for stable file output.
pub type EmbeddingMap = BTreeMap<String, CachedEmbedding>;

pub struct EmbeddingStore {
    path: PathBuf,
}

impl EmbeddingStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load all cached embeddings.
    ///
    /// Fails with `ModelMismatch` / `DimensionMismatch` when the cache was
    /// written by a different model; callers then start an empty cache.
    pub fn load(
        &self,
        expected_model_id: &[u8; 32],
        expected_dimensions: usize,
    ) -> Result<EmbeddingMap, EmbeddingStoreError> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);

        let header = read_header(&mut reader)?;
        if header.model_id != *expected_model_id {
            return Err(EmbeddingStoreError::ModelMismatch);
        }
        if header.dimensions as usize != expected_dimensions {
            return Err(EmbeddingStoreError::DimensionMismatch {
                expected: expected_dimensions,
                got: header.dimensions as usize,
            });
        }

        let mut entries = EmbeddingMap::new();
        for _ in 0..header.entry_count {
            let (note_id, cached) = read_entry(&mut reader, expected_dimensions)?;
            entries.insert(note_id, cached);
        }

        Ok(entries)
    }

    /// Write all entries atomically (temp file in the same directory, then rename).
    pub fn save(
        &self,
        entries: &EmbeddingMap,
        model_id: &[u8; 32],
        dimensions: usize,
    ) -> Result<(), EmbeddingStoreError> {
        let dimensions_u16 = u16::try_from(dimensions).map_err(|_| {
            EmbeddingStoreError::InvalidFormat(format!("dimensions {} exceed u16", dimensions))
        })?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let temp = tempfile::NamedTempFile::new_in(&parent)?;

        {
            let mut writer = BufWriter::new(temp.as_file());
            write_header(&mut writer, model_id, dimensions_u16, entries.len() as u64)?;

            for (note_id, cached) in entries {
                if cached.embedding.len() != dimensions {
                    return Err(EmbeddingStoreError::DimensionMismatch {
                        expected: dimensions,
                        got: cached.embedding.len(),
                    });
                }
                write_entry(&mut writer, note_id, cached)?;
            }
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        Ok(())
    }
}

#[derive(Debug)]
struct Header {
    model_id: [u8; 32],
    dimensions: u16,
    entry_count: u64,
}

fn read_header<R: Read>(reader: &mut R) -> Result<Header, EmbeddingStoreError> {
    let mut bytes = [0u8; HEADER_SIZE];
    reader.read_exact(&mut bytes)?;

    let version = bytes[0];
    if version > FORMAT_VERSION {
        return Err(EmbeddingStoreError::VersionMismatch(version, FORMAT_VERSION));
    }

    let stored_checksum = u32::from_le_bytes([bytes[43], bytes[44], bytes[45], bytes[46]]);
    if stored_checksum != crc32fast::hash(&bytes[0..43]) {
        return Err(EmbeddingStoreError::ChecksumMismatch);
    }

    let mut model_id = [0u8; 32];
    model_id.copy_from_slice(&bytes[1..33]);

    let dimensions = u16::from_le_bytes([bytes[33], bytes[34]]);
    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&bytes[35..43]);

    Ok(Header {
        model_id,
        dimensions,
        entry_count: u64::from_le_bytes(count_bytes),
    })
}

fn write_header<W: Write>(
    writer: &mut W,
    model_id: &[u8; 32],
    dimensions: u16,
    entry_count: u64,
) -> Result<(), EmbeddingStoreError> {
    let mut bytes = [0u8; HEADER_SIZE];
    bytes[0] = FORMAT_VERSION;
    bytes[1..33].copy_from_slice(model_id);
    bytes[33..35].copy_from_slice(&dimensions.to_le_bytes());
    bytes[35..43].copy_from_slice(&entry_count.to_le_bytes());

    let checksum = crc32fast::hash(&bytes[0..43]);
    bytes[43..47].copy_from_slice(&checksum.to_le_bytes());

    writer.write_all(&bytes)?;
    Ok(())
}

fn read_entry<R: Read>(
    reader: &mut R,
    dimensions: usize,
) -> Result<(String, CachedEmbedding), EmbeddingStoreError> {
    let mut len_bytes = [0u8; 2];
    reader.read_exact(&mut len_bytes)?;
    let id_len = u16::from_le_bytes(len_bytes) as usize;

    let mut id_bytes = vec![0u8; id_len];
    reader.read_exact(&mut id_bytes)?;
    let note_id = String::from_utf8(id_bytes)
        .map_err(|e| EmbeddingStoreError::InvalidFormat(format!("note id is not UTF-8: {}", e)))?;

    let mut hash_bytes = [0u8; 8];
    reader.read_exact(&mut hash_bytes)?;
    let content_hash = u64::from_le_bytes(hash_bytes);

    let mut embedding = Vec::with_capacity(dimensions);
    for _ in 0..dimensions {
        let mut float_bytes = [0u8; 4];
        reader.read_exact(&mut float_bytes)?;
        embedding.push(f32::from_le_bytes(float_bytes));
    }

    Ok((
        note_id,
        CachedEmbedding {
            content_hash,
            embedding,
        },
    ))
}

fn write_entry<W: Write>(
    writer: &mut W,
    note_id: &str,
    cached: &CachedEmbedding,
) -> Result<(), EmbeddingStoreError> {
    let id_len = u16::try_from(note_id.len()).map_err(|_| {
        EmbeddingStoreError::InvalidFormat(format!("note id too long: {} bytes", note_id.len()))
    })?;

    writer.write_all(&id_len.to_le_bytes())?;
    writer.write_all(note_id.as_bytes())?;
    writer.write_all(&cached.content_hash.to_le_bytes())?;
    for value in &cached.embedding {
        writer.write_all(&value.to_le_bytes())?;
    }

    Ok(())
}
