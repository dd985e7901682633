//! chamtree-core - chameleon-hash merkle trees
//!
//! Files are split into fixed-size blocks, hashed into a binary merkle
//! tree, and the root is replaced by a chameleon hash of the top combined
//! digest. The root hash then serves as a stable name: the holder of the
//! trapdoor can publish new content under the same root by finding a hash
//! collision, while anyone else can still verify integrity.
//!
//! # Overview
//!
//! - [`chameleon`]: P-256 trapdoor commitments — key generation, hashing,
//!   verification, collision finding
//! - [`merkle`]: block hashing, tree construction, inclusion proofs
//! - [`tree`]: authenticated roots — build and collision-based update
//! - [`meta`]: the published hex-JSON summary and verified rebuild
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use tokio_util::sync::CancellationToken;
//! use chamtree_core::{generate_keypair, meta, tree, MerkleConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (_secret, public) = generate_keypair();
//!     let config = MerkleConfig::new().with_block_size(4096);
//!     let cancel = CancellationToken::new();
//!
//!     // Publish
//!     let built = tree::build(&mut Cursor::new(b"hello world".to_vec()), &config, &public, &cancel)?;
//!     let summary = meta::serialize(&meta::MetaData::from_tree(&built, &public))?;
//!
//!     // Verify elsewhere
//!     let verified = meta::rebuild_and_verify(&meta::parse(&summary)?)?;
//!     assert_eq!(verified.root.hash, built.root.hash);
//!     Ok(())
//! }
//! ```

pub mod chameleon;
pub mod curve;
pub mod merkle;
pub mod meta;
pub mod tree;
pub mod types;

// Re-exports for convenience
pub use chameleon::{
    generate_keypair, ChameleonError, PublicKey, Randomness, SecretKey, MIN_RANDOMNESS_LEN,
    PUBLIC_KEY_LEN,
};
pub use merkle::{
    leaf_hashes, levels, prove, verify_proof, MerkleConfig, MerkleError, MerkleNode,
    MerkleSkeleton, DEFAULT_BLOCK_SIZE,
};
pub use meta::{MetaData, MetaError, VerifiedTree};
pub use tree::{AuthTree, TreeError};
pub use types::{from_hex, sha256, to_hex, Hash};
