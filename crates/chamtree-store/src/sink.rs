//! Metadata publish sink: the opaque "send to chain" contract.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

/// Sink error type
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("publish failed: {0}")]
    Publish(String),
}

/// Accepts `(root hex, serialized summary)` pairs for publication. What
/// happens downstream — an RPC call, a transaction, a queue — is opaque
/// to the caller.
#[async_trait]
pub trait MetaSink: Send + Sync {
    async fn publish(&self, root_hex: &str, metadata: &[u8]) -> Result<(), SinkError>;
}

/// Recording sink: keeps every published pair in memory. Test double for
/// the real chain client.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<RwLock<Vec<(String, Vec<u8>)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in order.
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.entries.read().unwrap().clone()
    }
}

#[async_trait]
impl MetaSink for MemorySink {
    async fn publish(&self, root_hex: &str, metadata: &[u8]) -> Result<(), SinkError> {
        tracing::debug!("publishing metadata for root {}", root_hex);
        self.entries
            .write()
            .unwrap()
            .push((root_hex.to_string(), metadata.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_in_order() {
        let sink = MemorySink::new();
        sink.publish("aa", b"first").await.unwrap();
        sink.publish("bb", b"second").await.unwrap();

        let published = sink.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0], ("aa".to_string(), b"first".to_vec()));
        assert_eq!(published[1], ("bb".to_string(), b"second".to_vec()));
    }
}
