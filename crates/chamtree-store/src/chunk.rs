//! Content-addressed chunk storage: the contract a P2P transport or local
//! blob store fulfills, plus an in-memory reference implementation.

use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use chamtree_core::{sha256, to_hex, Hash};

/// Chunk store error type
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing chunk {0}")]
    MissingChunk(String),
    #[error("store error: {0}")]
    Other(String),
}

/// Content-addressed chunk store interface. How chunks travel (DHT, local
/// disk, anything else) is the implementation's business.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Store chunk bytes under their leaf hash.
    /// Returns true if newly stored, false if already present.
    async fn put(&self, hash: Hash, data: Vec<u8>) -> Result<bool, StoreError>;

    /// Retrieve chunk bytes, or None if unknown.
    async fn get(&self, hash: &Hash) -> Result<Option<Vec<u8>>, StoreError>;

    /// Check if a chunk is present.
    async fn has(&self, hash: &Hash) -> Result<bool, StoreError>;

    /// Delete a chunk. Returns true if it existed.
    async fn delete(&self, hash: &Hash) -> Result<bool, StoreError>;
}

/// In-memory chunk store keyed by hash hex
#[derive(Debug, Clone, Default)]
pub struct MemoryChunkStore {
    inner: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored chunks
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ChunkStore for MemoryChunkStore {
    async fn put(&self, hash: Hash, data: Vec<u8>) -> Result<bool, StoreError> {
        let key = to_hex(&hash);
        let mut inner = self.inner.write().unwrap();
        if inner.contains_key(&key) {
            return Ok(false);
        }
        inner.insert(key, data);
        Ok(true)
    }

    async fn get(&self, hash: &Hash) -> Result<Option<Vec<u8>>, StoreError> {
        let key = to_hex(hash);
        Ok(self.inner.read().unwrap().get(&key).cloned())
    }

    async fn has(&self, hash: &Hash) -> Result<bool, StoreError> {
        let key = to_hex(hash);
        Ok(self.inner.read().unwrap().contains_key(&key))
    }

    async fn delete(&self, hash: &Hash) -> Result<bool, StoreError> {
        let key = to_hex(hash);
        Ok(self.inner.write().unwrap().remove(&key).is_some())
    }
}

/// Split a stream into blocks, store each under its SHA256 and return the
/// leaf hashes in stream order. The hashes line up with the `leaves` of a
/// summary built from the same stream and block size.
pub async fn store_blocks<S, R>(
    store: &S,
    reader: &mut R,
    block_size: usize,
) -> Result<Vec<Hash>, StoreError>
where
    S: ChunkStore + ?Sized,
    R: Read + Send,
{
    let mut hashes = Vec::new();
    let mut buffer = vec![0u8; block_size];
    loop {
        let filled = read_block(reader, &mut buffer)?;
        if filled == 0 {
            break;
        }
        let chunk = buffer[..filled].to_vec();
        let hash = sha256(&chunk);
        store.put(hash, chunk).await?;
        hashes.push(hash);
        if filled < block_size {
            break;
        }
    }
    Ok(hashes)
}

fn read_block<R: Read>(reader: &mut R, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        let n = reader.read(&mut buffer[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Fetch leaves in summary order and concatenate them back into the
/// original byte stream.
pub async fn assemble<S>(store: &S, leaves: &[Hash]) -> Result<Vec<u8>, StoreError>
where
    S: ChunkStore + ?Sized,
{
    let mut out = Vec::new();
    for leaf in leaves {
        let chunk = store
            .get(leaf)
            .await?
            .ok_or_else(|| StoreError::MissingChunk(to_hex(leaf)))?;
        out.extend_from_slice(&chunk);
    }
    Ok(out)
}
