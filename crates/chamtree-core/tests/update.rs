//! Owner-side updates: new content, same root.

use std::io::Cursor;

use chamtree_core::{
    chameleon, generate_keypair, meta, tree, ChameleonError, MerkleConfig, PublicKey, SecretKey,
    TreeError,
};
use tokio_util::sync::CancellationToken;

fn keys_and_tree(data: &[u8], block_size: usize) -> (SecretKey, PublicKey, chamtree_core::AuthTree) {
    let (secret, public) = generate_keypair();
    let config = MerkleConfig::new().with_block_size(block_size);
    let cancel = CancellationToken::new();
    let built = tree::build(&mut Cursor::new(data.to_vec()), &config, &public, &cancel).unwrap();
    (secret, public, built)
}

#[test]
fn test_update_preserves_root_across_content_change() {
    // three-block file, then a completely different three-block file
    let old_data: Vec<u8> = (0..3 * 4096).map(|i| (i % 256) as u8).collect();
    let (secret, public, old) = keys_and_tree(&old_data, 4096);

    let new_data = vec![0x5au8; 3 * 4096];
    let config = MerkleConfig::new().with_block_size(4096);
    let cancel = CancellationToken::new();
    let updated = tree::update(
        &mut Cursor::new(new_data),
        &config,
        &public,
        &secret,
        &old.root.hash,
        &old.top_digest,
        &old.randomness,
        &cancel,
    )
    .unwrap();

    assert_eq!(updated.root.hash, old.root.hash);
    assert!(chameleon::verify(
        &updated.top_digest,
        &updated.root.hash,
        &public,
        &updated.randomness
    ));

    // the new summary publishes and verifies under the old name
    let summary = meta::MetaData::from_tree(&updated, &public);
    assert_eq!(summary.root_hash, old.root.hash);
    let bytes = meta::serialize(&summary).unwrap();
    let verified = meta::rebuild_and_verify(&meta::parse(&bytes).unwrap()).unwrap();
    assert_eq!(verified.root.hash, old.root.hash);
}

#[test]
fn test_update_changes_leaf_count() {
    let (secret, public, old) = keys_and_tree(&vec![1u8; 2 * 64], 64);

    let config = MerkleConfig::new().with_block_size(64);
    let cancel = CancellationToken::new();
    let updated = tree::update(
        &mut Cursor::new(vec![2u8; 5 * 64 + 7]),
        &config,
        &public,
        &secret,
        &old.root.hash,
        &old.top_digest,
        &old.randomness,
        &cancel,
    )
    .unwrap();

    assert_eq!(updated.root.hash, old.root.hash);
    let summary = meta::MetaData::from_tree(&updated, &public);
    assert_eq!(summary.leaves.len(), 6);
    assert!(meta::rebuild_and_verify(&summary).is_ok());
}

#[test]
fn test_update_keeps_r_and_moves_s() {
    let (secret, public, old) = keys_and_tree(b"original", 4);

    let config = MerkleConfig::new().with_block_size(4);
    let cancel = CancellationToken::new();
    let updated = tree::update(
        &mut Cursor::new(b"replaced".to_vec()),
        &config,
        &public,
        &secret,
        &old.root.hash,
        &old.top_digest,
        &old.randomness,
        &cancel,
    )
    .unwrap();

    // rX ‖ rY prefix of the serialized opening is unchanged, only the
    // variable-length s tail moves
    let old_bytes = old.randomness.serialize();
    let new_bytes = updated.randomness.serialize();
    assert_eq!(old_bytes[..64], new_bytes[..64]);
    assert_ne!(old_bytes[64..], new_bytes[64..]);
}

#[test]
fn test_both_openings_stay_valid() {
    // an update does not revoke the old publication: both summaries open
    // the same root for their respective contents
    let (secret, public, old) = keys_and_tree(b"version one", 4);

    let config = MerkleConfig::new().with_block_size(4);
    let cancel = CancellationToken::new();
    let updated = tree::update(
        &mut Cursor::new(b"version two!".to_vec()),
        &config,
        &public,
        &secret,
        &old.root.hash,
        &old.top_digest,
        &old.randomness,
        &cancel,
    )
    .unwrap();

    assert!(chameleon::verify(&old.top_digest, &old.root.hash, &public, &old.randomness));
    assert!(chameleon::verify(
        &updated.top_digest,
        &old.root.hash,
        &public,
        &updated.randomness
    ));
}

#[test]
fn test_chained_updates() {
    let (secret, public, first) = keys_and_tree(b"gen 1 data", 4);
    let config = MerkleConfig::new().with_block_size(4);
    let cancel = CancellationToken::new();

    let second = tree::update(
        &mut Cursor::new(b"gen 2 data x".to_vec()),
        &config,
        &public,
        &secret,
        &first.root.hash,
        &first.top_digest,
        &first.randomness,
        &cancel,
    )
    .unwrap();

    let third = tree::update(
        &mut Cursor::new(b"gen 3".to_vec()),
        &config,
        &public,
        &secret,
        &second.root.hash,
        &second.top_digest,
        &second.randomness,
        &cancel,
    )
    .unwrap();

    assert_eq!(third.root.hash, first.root.hash);
    assert!(chameleon::verify(
        &third.top_digest,
        &first.root.hash,
        &public,
        &third.randomness
    ));
}

#[test]
fn test_update_from_rebuilt_metadata() {
    // a verifier-side rebuild carries everything an owner needs to update
    let (secret, public, old) = keys_and_tree(b"published data", 4);
    let summary_bytes = meta::serialize(&meta::MetaData::from_tree(&old, &public)).unwrap();
    let verified = meta::rebuild_and_verify(&meta::parse(&summary_bytes).unwrap()).unwrap();

    let config = MerkleConfig::new().with_block_size(4);
    let cancel = CancellationToken::new();
    let updated = tree::update(
        &mut Cursor::new(b"successor data".to_vec()),
        &config,
        &verified.public_key,
        &secret,
        &verified.root.hash,
        &verified.top_digest,
        &verified.randomness,
        &cancel,
    )
    .unwrap();

    assert_eq!(updated.root.hash, old.root.hash);
}

#[test]
fn test_update_wrong_trapdoor_is_rejected() {
    let (_, public, old) = keys_and_tree(b"owner content", 4);
    let (stranger, _) = generate_keypair();

    let config = MerkleConfig::new().with_block_size(4);
    let cancel = CancellationToken::new();
    let result = tree::update(
        &mut Cursor::new(b"stranger content".to_vec()),
        &config,
        &public,
        &stranger,
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
