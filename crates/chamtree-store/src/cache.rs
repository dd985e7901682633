//! Local metadata cache: a key→blob store keyed by root hash hex.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

/// Metadata cache error type
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache error: {0}")]
    Other(String),
}

/// Root-keyed blob cache for serialized summaries. Durability is the
/// implementation's business.
#[async_trait]
pub trait MetaCache: Send + Sync {
    /// Store a serialized summary under its root hash hex.
    /// An existing entry for the same root is replaced — updates publish
    /// new metadata under an unchanged root.
    async fn put(&self, root_hex: &str, metadata: Vec<u8>) -> Result<(), CacheError>;

    /// Fetch the cached summary for a root, or None.
    async fn get(&self, root_hex: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Drop an entry. Returns true if it existed.
    async fn delete(&self, root_hex: &str) -> Result<bool, CacheError>;
}

/// In-memory metadata cache
#[derive(Debug, Clone, Default)]
pub struct MemoryMetaCache {
    inner: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryMetaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MetaCache for MemoryMetaCache {
    async fn put(&self, root_hex: &str, metadata: Vec<u8>) -> Result<(), CacheError> {
        self.inner
            .write()
            .unwrap()
            .insert(root_hex.to_string(), metadata);
        Ok(())
    }

    async fn get(&self, root_hex: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.inner.read().unwrap().get(root_hex).cloned())
    }

    async fn delete(&self, root_hex: &str) -> Result<bool, CacheError> {
        Ok(self.inner.write().unwrap().remove(root_hex).is_some())
    }
}
