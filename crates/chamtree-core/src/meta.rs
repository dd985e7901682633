//! Published tree summaries: hex-JSON wire codec and verified rebuild.
//!
//! The summary is everything a verifier needs to reconstruct the skeleton
//! and check the root: the root hash, the commitment opening, the public
//! key and the leaf hashes in stream order. All byte fields travel as
//! lowercase unprefixed hex.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chameleon::{self, PublicKey, Randomness, MIN_RANDOMNESS_LEN, PUBLIC_KEY_LEN};
use crate::merkle::{self, MerkleNode};
use crate::tree::AuthTree;
use crate::types::{to_hex, Hash};

/// Metadata codec error type
#[derive(Debug, Error)]
pub enum MetaError {
    #[error("metadata JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("metadata field {0} is not valid hex")]
    Hex(&'static str),
    #[error("metadata field {field} has invalid length {len}")]
    FieldLength { field: &'static str, len: usize },
    #[error("metadata has no leaves")]
    NoLeaves,
    #[error("root verification failed")]
    RootVerificationFailed,
}

/// Decoded published summary of one tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaData {
    pub root_hash: Hash,
    /// Serialized commitment opening: `rX(32) ‖ rY(32) ‖ s(var)`.
    pub random_num: Vec<u8>,
    /// Serialized public key: `pubX(32) ‖ pubY(32)`.
    pub public_key: Vec<u8>,
    /// Leaf hashes in stream order.
    pub leaves: Vec<Hash>,
}

impl MetaData {
    /// Summarize a freshly built or updated tree for publication.
    pub fn from_tree(tree: &AuthTree, public_key: &PublicKey) -> Self {
        Self {
            root_hash: tree.root.hash,
            random_num: tree.randomness.serialize(),
            public_key: public_key.serialize().to_vec(),
            leaves: merkle::leaf_hashes(&tree.root),
        }
    }
}

/// Wire form: every byte field as a lowercase hex string.
#[derive(Serialize, Deserialize)]
struct WireMetaData {
    #[serde(rename = "rootHash")]
    root_hash: String,
    #[serde(rename = "randomNum")]
    random_num: String,
    #[serde(rename = "publicKey")]
    public_key: String,
    leaves: Vec<String>,
}

/// Encode a summary as JSON.
pub fn serialize(meta: &MetaData) -> Result<Vec<u8>, MetaError> {
    let wire = WireMetaData {
        root_hash: to_hex(&meta.root_hash),
        random_num: hex::encode(&meta.random_num),
        public_key: hex::encode(&meta.public_key),
        leaves: meta.leaves.iter().map(to_hex).collect(),
    };
    Ok(serde_json::to_vec(&wire)?)
}

/// Decode and validate a JSON summary. Field lengths are enforced here;
/// `randomNum` only has a lower bound because `s` is variable-length.
pub fn parse(bytes: &[u8]) -> Result<MetaData, MetaError> {
    let wire: WireMetaData = serde_json::from_slice(bytes)?;

    let root_bytes = hex::decode(&wire.root_hash).map_err(|_| MetaError::Hex("rootHash"))?;
    let root_hash: Hash =
        root_bytes
            .as_slice()
            .try_into()
            .map_err(|_| MetaError::FieldLength {
                field: "rootHash",
                len: root_bytes.len(),
            })?;

    let random_num = hex::decode(&wire.random_num).map_err(|_| MetaError::Hex("randomNum"))?;
    if random_num.len() < MIN_RANDOMNESS_LEN {
        return Err(MetaError::FieldLength {
            field: "randomNum",
            len: random_num.len(),
        });
    }

    let public_key = hex::decode(&wire.public_key).map_err(|_| MetaError::Hex("publicKey"))?;
    if public_key.len() != PUBLIC_KEY_LEN {
        return Err(MetaError::FieldLength {
            field: "publicKey",
            len: public_key.len(),
        });
    }

    if wire.leaves.is_empty() {
        return Err(MetaError::NoLeaves);
    }
    let mut leaves = Vec::with_capacity(wire.leaves.len());
    for leaf_hex in &wire.leaves {
        let leaf_bytes = hex::decode(leaf_hex).map_err(|_| MetaError::Hex("leaves"))?;
        let leaf: Hash =
            leaf_bytes
                .as_slice()
                .try_into()
                .map_err(|_| MetaError::FieldLength {
                    field: "leaves",
                    len: leaf_bytes.len(),
                })?;
        leaves.push(leaf);
    }

    Ok(MetaData {
        root_hash,
        random_num,
        public_key,
        leaves,
    })
}

/// A summary that passed root verification, rebuilt into a tree.
#[derive(Debug, Clone)]
pub struct VerifiedTree {
    pub root: MerkleNode,
    pub randomness: Randomness,
    pub public_key: PublicKey,
    /// Bytes the root hash commits to; an updater needs these to open the
    /// commitment for the next version.
    pub top_digest: Vec<u8>,
}

/// Rebuild the skeleton from the leaves and check the root commitment.
///
/// The root node keeps the published root hash verbatim — it is never
/// recomputed from the children. Fails with
/// [`MetaError::RootVerificationFailed`] when the commitment does not
/// open; the leaves must not be trusted in that case.
pub fn rebuild_and_verify(meta: &MetaData) -> Result<VerifiedTree, MetaError> {
    let leaves = meta.leaves.iter().map(|h| MerkleNode::leaf(*h)).collect();
    let skeleton = merkle::skeleton_from_leaves(leaves).map_err(|_| MetaError::NoLeaves)?;
    let top_digest = skeleton.top_digest.clone();

    let randomness =
        Randomness::from_bytes(&meta.random_num).map_err(|_| MetaError::FieldLength {
            field: "randomNum",
            len: meta.random_num.len(),
        })?;
    let public_key =
        PublicKey::from_bytes(&meta.public_key).map_err(|_| MetaError::FieldLength {
            field: "publicKey",
            len: meta.public_key.len(),
        })?;

    if !chameleon::verify(&top_digest, &meta.root_hash, &public_key, &randomness) {
        return Err(MetaError::RootVerificationFailed);
    }

    Ok(VerifiedTree {
        root: skeleton.into_root(meta.root_hash),
        randomness,
        public_key,
        top_digest,
    })
}
