//! Authenticated trees: merkle skeletons whose root is a chameleon hash.
//!
//! The root hash commits to the top digest through the owner's public key.
//! Because the commitment has a trapdoor, the owner can later publish a
//! different stream under the *same* root hash by finding a collision,
//! while everyone else still gets tamper evidence.

use std::io::Read;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::chameleon::{self, ChameleonError, PublicKey, Randomness, SecretKey};
use crate::merkle::{self, MerkleConfig, MerkleError, MerkleNode};
use crate::types::Hash;

/// Authenticated tree error type
#[derive(Debug, Error)]
pub enum TreeError {
    #[error(transparent)]
    Merkle(#[from] MerkleError),
    #[error(transparent)]
    Chameleon(#[from] ChameleonError),
}

/// A built tree plus the commitment opening for its root.
#[derive(Debug, Clone)]
pub struct AuthTree {
    pub root: MerkleNode,
    pub randomness: Randomness,
    pub top_digest: Vec<u8>,
}

/// Build a tree from a stream and seal its root with a fresh commitment.
///
/// Fails with [`MerkleError::EmptyStream`] when the stream yields no
/// blocks.
pub fn build<R: Read>(
    reader: &mut R,
    config: &MerkleConfig,
    public_key: &PublicKey,
    cancel: &CancellationToken,
) -> Result<AuthTree, TreeError> {
    let skeleton = merkle::build(reader, config, cancel)?;
    let top_digest = skeleton.top_digest.clone();
    let (randomness, root_hash) = chameleon::hash(&top_digest, public_key)?;
    Ok(AuthTree {
        root: skeleton.into_root(root_hash),
        randomness,
        top_digest,
    })
}

/// Rebuild the tree from a new stream while keeping the previous root
/// hash, by opening the old commitment for the new top digest.
///
/// The caller supplies the opening of the *previous* publication
/// (`prev_top_digest`, `prev_randomness`, `prev_root_hash`) and the
/// trapdoor. The result carries the unchanged root hash and fresh
/// randomness. Fails with [`ChameleonError::InvalidTrapdoor`] when the
/// secret key does not match the public key the tree was published under.
#[allow(clippy::too_many_arguments)]
pub fn update<R: Read>(
    reader: &mut R,
    config: &MerkleConfig,
    public_key: &PublicKey,
    secret_key: &SecretKey,
    prev_root_hash: &Hash,
    prev_top_digest: &[u8],
    prev_randomness: &Randomness,
    cancel: &CancellationToken,
) -> Result<AuthTree, TreeError> {
    let skeleton = merkle::build(reader, config, cancel)?;
    let top_digest = skeleton.top_digest.clone();

    let randomness = chameleon::find_collision(
        prev_top_digest,
        prev_randomness,
        prev_root_hash,
        &top_digest,
        secret_key,
    )?;

    // the collision was found against the key pair derived from the
    // trapdoor; make sure it also opens under the caller's public key
    if !chameleon::verify(&top_digest, prev_root_hash, public_key, &randomness) {
        return Err(ChameleonError::InvalidTrapdoor.into());
    }

    Ok(AuthTree {
        root: skeleton.into_root(*prev_root_hash),
        randomness,
        top_digest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chameleon::generate_keypair;
    use std::io::Cursor;

    fn config() -> MerkleConfig {
        MerkleConfig::new().with_block_size(64)
    }

    #[test]
    fn test_build_root_verifies() {
        let (_, public) = generate_keypair();
        let data = vec![5u8; 200];
        let cancel = CancellationToken::new();
        let tree = build(&mut Cursor::new(&data), &config(), &public, &cancel).unwrap();

        assert!(chameleon::verify(
            &tree.top_digest,
            &tree.root.hash,
            &public,
            &tree.randomness
        ));
    }

    #[test]
    fn test_build_empty_stream() {
        let (_, public) = generate_keypair();
        let cancel = CancellationToken::new();
        let result = build(&mut Cursor::new(&[]), &config(), &public, &cancel);
        assert!(matches!(
            result,
            Err(TreeError::Merkle(MerkleError::EmptyStream))
        ));
    }

    #[test]
    fn test_update_keeps_root_hash() {
        let (secret, public) = generate_keypair();
        let cancel = CancellationToken::new();
        let old = build(&mut Cursor::new(vec![1u8; 300]), &config(), &public, &cancel).unwrap();

        let new_data = vec![2u8; 500];
        let updated = update(
            &mut Cursor::new(&new_data),
            &config(),
            &public,
            &secret,
            &old.root.hash,
            &old.top_digest,
            &old.randomness,
            &cancel,
        )
        .unwrap();

        assert_eq!(updated.root.hash, old.root.hash);
        assert_ne!(updated.top_digest, old.top_digest);
        assert!(chameleon::verify(
            &updated.top_digest,
            &old.root.hash,
            &public,
            &updated.randomness
        ));
    }

    #[test]
    fn test_update_rejects_wrong_trapdoor() {
        let (_, public) = generate_keypair();
        let (wrong_secret, _) = generate_keypair();
        let cancel = CancellationToken::new();
        let old = build(&mut Cursor::new(vec![1u8; 300]), &config(), &public, &cancel).unwrap();

        let result = update(
            &mut Cursor::new(vec![2u8; 300]),
            &config(),
            &public,
            &wrong_secret,
            &old.root.hash,
            &old.top_digest,
            &old.randomness,
            &cancel,
        );
        assert!(matches!(
            result,
            Err(TreeError::Chameleon(ChameleonError::InvalidTrapdoor))
        ));
    }

    #[test]
    fn test_update_cancelled() {
        let (secret, public) = generate_keypair();
        let cancel = CancellationToken::new();
        let old = build(&mut Cursor::new(vec![1u8; 300]), &config(), &public, &cancel).unwrap();

        cancel.cancel();
        let result = update(
            &mut Cursor::new(vec![2u8; 300]),
            &config(),
            &public,
            &secret,
            &old.root.hash,
            &old.top_digest,
            &old.randomness,
            &cancel,
        );
        assert!(matches!(
            result,
            Err(TreeError::Merkle(MerkleError::Cancelled))
        ));
    }
}
