//! chamtree-store - collaborator contracts around the chameleon merkle core
//!
//! The core (see `chamtree-core`) builds and verifies trees; everything
//! around it is expressed here as narrow contracts:
//!
//! - [`ChunkStore`]: content-addressed chunk storage (the P2P transport's
//!   job), with block fan-out and reassembly helpers
//! - [`MetaCache`]: a local key→blob cache for summaries, keyed by root hex
//! - [`MetaSink`]: the opaque "publish summary" sink
//! - [`feed`]: the chain-feed envelope decoder and the verify-then-cache
//!   [`Ingestor`]
//!
//! Each contract ships an in-memory reference implementation used by tests
//! and as a template for real backends.

pub mod cache;
pub mod chunk;
pub mod feed;
pub mod sink;

pub use cache::{CacheError, MemoryMetaCache, MetaCache};
pub use chunk::{assemble, store_blocks, ChunkStore, MemoryChunkStore, StoreError};
pub use feed::{decode_envelope, FeedError, IngestError, Ingestor};
pub use sink::{MemorySink, MetaSink, SinkError};
