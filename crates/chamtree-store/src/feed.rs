//! Chain feed ingest: envelopes that carry a tree summary as a JSON
//! string inside a JSON object, decoded in two steps.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use chamtree_core::{meta, to_hex, MetaData, MetaError};

use crate::cache::{CacheError, MetaCache};

/// Feed decode error type
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("envelope JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Meta(#[from] MetaError),
}

#[derive(Deserialize)]
struct Envelope {
    params: EnvelopeParams,
}

#[derive(Deserialize)]
struct EnvelopeParams {
    value: String,
}

/// Decode the outer envelope, then parse the summary JSON held in its
/// `params.value` string. Extra envelope fields are ignored.
pub fn decode_envelope(bytes: &[u8]) -> Result<MetaData, FeedError> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;
    Ok(meta::parse(envelope.params.value.as_bytes())?)
}

/// Ingest error type
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Pulls summaries off the feed, verifies them, and retains the good ones
/// in a cache keyed by root hash hex.
pub struct Ingestor<C> {
    cache: Arc<C>,
}

impl<C: MetaCache> Ingestor<C> {
    pub fn new(cache: Arc<C>) -> Self {
        Self { cache }
    }

    /// Decode, verify and cache one envelope. Summaries that fail root
    /// verification are rejected and never cached.
    /// Returns the root hex the summary was cached under.
    pub async fn ingest(&self, envelope: &[u8]) -> Result<String, IngestError> {
        let summary = decode_envelope(envelope)?;
        meta::rebuild_and_verify(&summary).map_err(FeedError::Meta)?;

        let root_hex = to_hex(&summary.root_hash);
        let bytes = meta::serialize(&summary).map_err(FeedError::Meta)?;
        self.cache.put(&root_hex, bytes).await?;
        tracing::info!("ingested metadata for root {}", root_hex);
        Ok(root_hex)
    }
}
