//! End-to-end distribution flow: publish, ingest, fetch, verify.

use std::io::Cursor;
use std::sync::Arc;

use chamtree_core::{
    generate_keypair, leaf_hashes, meta, prove, sha256, tree, verify_proof, MerkleConfig,
};
use chamtree_store::{
    assemble, decode_envelope, store_blocks, Ingestor, MemoryChunkStore, MemoryMetaCache,
    MemorySink, MetaCache, MetaSink,
};
use tokio_util::sync::CancellationToken;

const BLOCK_SIZE: usize = 64;

fn envelope_for(summary_json: &[u8]) -> Vec<u8> {
    let inner = String::from_utf8(summary_json.to_vec()).unwrap();
    serde_json::to_vec(&serde_json::json!({
        "type": "tx",
        "height": "42",
        "params": { "key": "v", "value": inner }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_publish_ingest_fetch_roundtrip() {
    let file: Vec<u8> = (0..BLOCK_SIZE * 5 + 13).map(|i| (i % 241) as u8).collect();

    // -- publisher side --
    let (_, public) = generate_keypair();
    let config = MerkleConfig::new().with_block_size(BLOCK_SIZE);
    let cancel = CancellationToken::new();
    let built = tree::build(&mut Cursor::new(file.clone()), &config, &public, &cancel).unwrap();
    let summary = meta::MetaData::from_tree(&built, &public);
    let summary_json = meta::serialize(&summary).unwrap();

    let chunks = Arc::new(MemoryChunkStore::new());
    let stored = store_blocks(chunks.as_ref(), &mut Cursor::new(file.clone()), BLOCK_SIZE)
        .await
        .unwrap();
    // chunk hashes and summary leaves describe the same blocks
    assert_eq!(stored, summary.leaves);

    let sink = MemorySink::new();
    let root_hex = chamtree_core::to_hex(&summary.root_hash);
    sink.publish(&root_hex, &summary_json).await.unwrap();

    // -- chain feed to subscriber --
    let (published_root, published_json) = sink.published().pop().unwrap();
    let envelope = envelope_for(&published_json);
    assert_eq!(decode_envelope(&envelope).unwrap(), summary);

    let cache = Arc::new(MemoryMetaCache::new());
    let ingestor = Ingestor::new(cache.clone());
    let cached_root = ingestor.ingest(&envelope).await.unwrap();
    assert_eq!(cached_root, published_root);

    // -- fetcher side --
    let cached_json = cache.get(&cached_root).await.unwrap().unwrap();
    let verified = meta::rebuild_and_verify(&meta::parse(&cached_json).unwrap()).unwrap();

    let fetched = assemble(chunks.as_ref(), &leaf_hashes(&verified.root))
        .await
        .unwrap();
    assert_eq!(fetched, file);

    // spot-check one fetched block against the verified tree
    let block = &fetched[2 * BLOCK_SIZE..3 * BLOCK_SIZE];
    let leaf = sha256(block);
    let proof = prove(&verified.root, &leaf).unwrap();
    assert!(verify_proof(
        &verified.root.hash,
        &leaf,
        &proof,
        &verified.public_key,
        &verified.randomness
    ));
}

#[tokio::test]
async fn test_update_flows_through_same_root() {
    let (secret, public) = generate_keypair();
    let config = MerkleConfig::new().with_block_size(BLOCK_SIZE);
    let cancel = CancellationToken::new();

    let v1: Vec<u8> = vec![1u8; BLOCK_SIZE * 3];
    let built = tree::build(&mut Cursor::new(v1), &config, &public, &cancel).unwrap();
    let v1_summary = meta::MetaData::from_tree(&built, &public);

    let v2: Vec<u8> = vec![2u8; BLOCK_SIZE * 4 + 9];
    let updated = tree::update(
        &mut Cursor::new(v2.clone()),
        &config,
        &public,
        &secret,
        &built.root.hash,
        &built.top_digest,
        &built.randomness,
        &cancel,
    )
    .unwrap();
    let v2_summary = meta::MetaData::from_tree(&updated, &public);

    let cache = Arc::new(MemoryMetaCache::new());
    let ingestor = Ingestor::new(cache.clone());
    let key1 = ingestor
        .ingest(&envelope_for(&meta::serialize(&v1_summary).unwrap()))
        .await
        .unwrap();
    let key2 = ingestor
        .ingest(&envelope_for(&meta::serialize(&v2_summary).unwrap()))
        .await
        .unwrap();

    // the root hex is the stable name across versions
    assert_eq!(key1, key2);

    // fetching by the stable name now yields version two
    let chunks = Arc::new(MemoryChunkStore::new());
    store_blocks(chunks.as_ref(), &mut Cursor::new(v2.clone()), BLOCK_SIZE)
        .await
        .unwrap();
    let cached = cache.get(&key2).await.unwrap().unwrap();
    let verified = meta::rebuild_and_verify(&meta::parse(&cached).unwrap()).unwrap();
    let fetched = assemble(chunks.as_ref(), &leaf_hashes(&verified.root))
        .await
        .unwrap();
    assert_eq!(fetched, v2);
}
