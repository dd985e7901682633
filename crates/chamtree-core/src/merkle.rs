//! Binary merkle trees over fixed-size blocks of a byte stream.
//!
//! Leaves are SHA256 digests of consecutive blocks. Levels are built by
//! pairing adjacent nodes left to right; an odd trailing node is promoted
//! unchanged. The reduction stops at one or two nodes: those become the
//! children of the root, whose own hash is *not* the SHA256 of its
//! children — it is assigned by the authenticated-root layer (see
//! [`crate::tree`]) and verified through the chameleon hash.

use std::collections::VecDeque;
use std::io::Read;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::chameleon::{self, PublicKey, Randomness};
use crate::types::{sha256, Hash};

/// Default block size: 4 MiB. A policy default, not a protocol constant.
pub const DEFAULT_BLOCK_SIZE: usize = 4 * 1024 * 1024;

/// Tree build configuration
#[derive(Debug, Clone)]
pub struct MerkleConfig {
    pub block_size: usize,
}

impl MerkleConfig {
    pub fn new() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }
}

impl Default for MerkleConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Merkle build error type
#[derive(Debug, Error)]
pub enum MerkleError {
    #[error("stream produced no blocks")]
    EmptyStream,
    #[error("stream read failed: {0}")]
    Read(#[from] std::io::Error),
    #[error("build cancelled")]
    Cancelled,
}

/// A node owned by its parent. Leaves have no children; every internal
/// node except the root hashes to `SHA256(left ‖ right)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleNode {
    pub hash: Hash,
    pub left: Option<Box<MerkleNode>>,
    pub right: Option<Box<MerkleNode>>,
}

impl MerkleNode {
    pub fn leaf(hash: Hash) -> Self {
        Self {
            hash,
            left: None,
            right: None,
        }
    }

    fn parent(left: MerkleNode, right: MerkleNode) -> Self {
        let mut combined = Vec::with_capacity(64);
        combined.extend_from_slice(&left.hash);
        combined.extend_from_slice(&right.hash);
        Self {
            hash: sha256(&combined),
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Everything below the root, plus the bytes the root commits to.
///
/// `top_digest` is the single remaining hash, or the concatenation of the
/// two remaining hashes in order.
#[derive(Debug, Clone)]
pub struct MerkleSkeleton {
    pub top_digest: Vec<u8>,
    pub left: MerkleNode,
    pub right: Option<MerkleNode>,
}

impl MerkleSkeleton {
    /// Attach the root hash computed for `top_digest`. A single top node
    /// becomes the root's left child with no right sibling.
    pub fn into_root(self, root_hash: Hash) -> MerkleNode {
        MerkleNode {
            hash: root_hash,
            left: Some(Box::new(self.left)),
            right: self.right.map(Box::new),
        }
    }
}

/// Hash a stream into leaf nodes, one per block. The final block may be
/// short. Cancellation is checked between block reads.
pub fn leaves_from_stream<R: Read>(
    reader: &mut R,
    config: &MerkleConfig,
    cancel: &CancellationToken,
) -> Result<Vec<MerkleNode>, MerkleError> {
    let mut leaves = Vec::new();
    let mut buffer = vec![0u8; config.block_size];
    loop {
        if cancel.is_cancelled() {
            return Err(MerkleError::Cancelled);
        }
        let filled = read_block(reader, &mut buffer)?;
        if filled == 0 {
            break;
        }
        leaves.push(MerkleNode::leaf(sha256(&buffer[..filled])));
        if filled < config.block_size {
            break;
        }
    }
    Ok(leaves)
}

/// Fill `buffer` from short reads until full or EOF.
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

/// Pair adjacent nodes left to right; an odd trailing node carries over.
fn reduce_once(nodes: Vec<MerkleNode>) -> Vec<MerkleNode> {
    let mut level = Vec::with_capacity(nodes.len() / 2 + 1);
    let mut iter = nodes.into_iter();
    while let Some(left) = iter.next() {
        match iter.next() {
            Some(right) => level.push(MerkleNode::parent(left, right)),
            None => level.push(left),
        }
    }
    level
}

/// Reduce leaves to the top one or two nodes.
pub fn skeleton_from_leaves(leaves: Vec<MerkleNode>) -> Result<MerkleSkeleton, MerkleError> {
    if leaves.is_empty() {
        return Err(MerkleError::EmptyStream);
    }
    let mut nodes = leaves;
    while nodes.len() > 2 {
        nodes = reduce_once(nodes);
    }

    let mut iter = nodes.into_iter();
    let Some(left) = iter.next() else {
        return Err(MerkleError::EmptyStream);
    };
    let right = iter.next();
    let top_digest = match &right {
        Some(right) => {
            let mut digest = left.hash.to_vec();
            digest.extend_from_slice(&right.hash);
            digest
        }
        None => left.hash.to_vec(),
    };

    Ok(MerkleSkeleton {
        top_digest,
        left,
        right,
    })
}

/// Read a stream and build the tree skeleton in one pass.
pub fn build<R: Read>(
    reader: &mut R,
    config: &MerkleConfig,
    cancel: &CancellationToken,
) -> Result<MerkleSkeleton, MerkleError> {
    let leaves = leaves_from_stream(reader, config, cancel)?;
    skeleton_from_leaves(leaves)
}

/// Leaf hashes in stream order (left-to-right walk).
pub fn leaf_hashes(root: &MerkleNode) -> Vec<Hash> {
    let mut out = Vec::new();
    collect_leaves(root, &mut out);
    out
}

fn collect_leaves(node: &MerkleNode, out: &mut Vec<Hash>) {
    if node.is_leaf() {
        out.push(node.hash);
        return;
    }
    if let Some(left) = node.left.as_deref() {
        collect_leaves(left, out);
    }
    if let Some(right) = node.right.as_deref() {
        collect_leaves(right, out);
    }
}

/// Node hashes level by level, top down. Useful for inspecting tree shape.
pub fn levels(root: &MerkleNode) -> Vec<Vec<Hash>> {
    let mut out = Vec::new();
    let mut queue = VecDeque::from([root]);
    while !queue.is_empty() {
        let width = queue.len();
        let mut level = Vec::with_capacity(width);
        for _ in 0..width {
            if let Some(node) = queue.pop_front() {
                level.push(node.hash);
                if let Some(left) = node.left.as_deref() {
                    queue.push_back(left);
                }
                if let Some(right) = node.right.as_deref() {
                    queue.push_back(right);
                }
            }
        }
        out.push(level);
    }
    out
}

/// Inclusion proof for `target`: for each step on the root-to-leaf path,
/// a `(left, right)` sibling pair where the slot the path occupies is the
/// empty byte string, as is a slot with no sibling. Flattened root first:
/// `[L0, R0, L1, R1, …]`. Returns `None` when `target` is not in the tree.
pub fn prove(root: &MerkleNode, target: &Hash) -> Option<Vec<Vec<u8>>> {
    let mut path: Vec<&MerkleNode> = Vec::new();
    if !find_path(root, target, &mut path) {
        return None;
    }

    let mut proof = Vec::with_capacity(2 * path.len().saturating_sub(1));
    for pair in path.windows(2) {
        let (parent, child) = (pair[0], pair[1]);
        let mut left = Vec::new();
        let mut right = Vec::new();
        if let Some(node) = parent.left.as_deref() {
            if !std::ptr::eq(node, child) {
                left = node.hash.to_vec();
            }
        }
        if let Some(node) = parent.right.as_deref() {
            if !std::ptr::eq(node, child) {
                right = node.hash.to_vec();
            }
        }
        // a root with a single child contributes no pair: the target is
        // the whole top digest and the proof stays empty
        if left.is_empty() && right.is_empty() {
            continue;
        }
        proof.push(left);
        proof.push(right);
    }
    Some(proof)
}

fn find_path<'a>(node: &'a MerkleNode, target: &Hash, path: &mut Vec<&'a MerkleNode>) -> bool {
    path.push(node);
    if node.hash == *target {
        return true;
    }
    if let Some(left) = node.left.as_deref() {
        if find_path(left, target, path) {
            return true;
        }
    }
    if let Some(right) = node.right.as_deref() {
        if find_path(right, target, path) {
            return true;
        }
    }
    path.pop();
    false
}

/// Check an inclusion proof against a published root.
///
/// Recomputes hashes leaf-upward through the sibling pairs, reconstructs
/// the top digest at the final pair, and defers the root itself to
/// [`chameleon::verify`] — the root hash is a commitment, never a SHA256
/// of its children. An empty proof is the single-leaf case where the
/// target *is* the top digest.
pub fn verify_proof(
    root_hash: &[u8],
    target: &Hash,
    proof: &[Vec<u8>],
    public_key: &PublicKey,
    randomness: &Randomness,
) -> bool {
    if proof.len() % 2 != 0 {
        return false;
    }

    let mut current: Hash = *target;
    let pairs: Vec<&[Vec<u8>]> = proof.chunks(2).collect();
    for pair in pairs.iter().skip(1).rev() {
        let (left, right) = (&pair[0], &pair[1]);
        let mut combined = Vec::with_capacity(64);
        if left.is_empty() {
            combined.extend_from_slice(&current);
            combined.extend_from_slice(right);
        } else {
            combined.extend_from_slice(left);
            combined.extend_from_slice(&current);
        }
        current = sha256(&combined);
    }

    let top_digest = match pairs.first() {
        None => current.to_vec(),
        Some(pair) => {
            let (left, right) = (&pair[0], &pair[1]);
            if left.is_empty() && right.is_empty() {
                current.to_vec()
            } else if !left.is_empty() {
                let mut digest = left.clone();
                digest.extend_from_slice(&current);
                digest
            } else {
                let mut digest = current.to_vec();
                digest.extend_from_slice(right);
                digest
            }
        }
    };

    chameleon::verify(&top_digest, root_hash, public_key, randomness)
}
