//! Shared hash type and byte helpers.

use sha2::{Digest, Sha256};

/// 32-byte SHA256 digest. Leaf hashes, internal node hashes and the
/// chameleon root hash all use this width.
pub type Hash = [u8; 32];

/// Compute SHA256 of data
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Convert hash to lowercase hex
pub fn to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Convert hex string to hash
pub fn from_hex(hex_str: &str) -> Result<Hash, hex::FromHexError> {
    let bytes = hex::decode(hex_str)?;
    if bytes.len() != 32 {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    Ok(hash)
}

/// Drop leading zero bytes. An all-zero input collapses to the empty slice,
/// mirroring arbitrary-precision integer serialization.
pub(crate) fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
