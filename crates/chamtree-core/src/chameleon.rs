//! Double-trapdoor chameleon hash over P-256.
//!
//! A commitment to message `m` is `(R, s)` with `R = k·G`. The hash output
//! is the x-coordinate of `Q = s·G + e·P` where `e = SHA256(m ‖ R.x) mod n`
//! and `P` is the public key. Anyone can verify; only the holder of the
//! secret scalar `x` (with `P = x·G`) can open the same output for a
//! different message by solving `s' = s + (e - e')·x mod n`.

use p256::elliptic_curve::Field;
use p256::Scalar;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::curve;
use crate::types::{strip_leading_zeros, Hash};

/// Serialized public key width: two padded 32-byte coordinates.
pub const PUBLIC_KEY_LEN: usize = 64;

/// Minimum serialized randomness width: `rX(32) ‖ rY(32)` plus a
/// variable-length `s`.
pub const MIN_RANDOMNESS_LEN: usize = 64;

/// Chameleon hash error type
#[derive(Debug, Error)]
pub enum ChameleonError {
    #[error("secret key is not the trapdoor for this commitment")]
    InvalidTrapdoor,
    #[error("malformed key material")]
    MalformedKey,
    #[error("randomness must be at least 64 bytes")]
    MalformedRandomness,
}

/// Trapdoor scalar `x` with `P = x·G`.
#[derive(Clone)]
pub struct SecretKey(Scalar);

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretKey").field(&"<redacted>").finish()
    }
}

impl SecretKey {
    /// Fixed 32-byte big-endian encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        curve::scalar_to_bytes(&self.0)
    }

    /// Decode big-endian scalar bytes. Zero and out-of-range values are
    /// rejected; leading zeros are insignificant.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChameleonError> {
        let scalar = curve::scalar_from_be_bytes(bytes).ok_or(ChameleonError::MalformedKey)?;
        if bool::from(scalar.is_zero()) {
            return Err(ChameleonError::MalformedKey);
        }
        Ok(Self(scalar))
    }

    /// Derive `P = x·G`.
    pub fn public_key(&self) -> PublicKey {
        // x is nonzero, so x·G is never the identity
        let (x, y) = curve::coordinates(&curve::mul_base(&self.0))
            .expect("nonzero scalar times generator");
        PublicKey { x, y }
    }
}

/// Public curve point `P = x·G`, held as padded affine coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    x: [u8; 32],
    y: [u8; 32],
}

impl PublicKey {
    /// `pubX(32) ‖ pubY(32)`, both padded.
    pub fn serialize(&self) -> [u8; PUBLIC_KEY_LEN] {
        let mut out = [0u8; PUBLIC_KEY_LEN];
        out[..32].copy_from_slice(&self.x);
        out[32..].copy_from_slice(&self.y);
        out
    }

    /// Inverse of [`serialize`](Self::serialize). Length is checked here;
    /// whether the coordinates lie on the curve is only decided when the
    /// key is used, where a bad point makes verification return false.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChameleonError> {
        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(ChameleonError::MalformedKey);
        }
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(&bytes[..32]);
        y.copy_from_slice(&bytes[32..]);
        Ok(Self { x, y })
    }

    pub(crate) fn point(&self) -> Option<p256::ProjectivePoint> {
        curve::point_from_coordinates(&self.x, &self.y)
    }
}

/// Commitment opening `(R, s)`: the point `R` as padded coordinates plus
/// the scalar `s` in minimal big-endian form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Randomness {
    r_x: [u8; 32],
    r_y: [u8; 32],
    s: Vec<u8>,
}

impl Randomness {
    /// `rX(32) ‖ rY(32) ‖ s(var)`.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MIN_RANDOMNESS_LEN + self.s.len());
        out.extend_from_slice(&self.r_x);
        out.extend_from_slice(&self.r_y);
        out.extend_from_slice(&self.s);
        out
    }

    /// Inverse of [`serialize`](Self::serialize): first 64 bytes are the
    /// point, the rest is `s`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChameleonError> {
        if bytes.len() < MIN_RANDOMNESS_LEN {
            return Err(ChameleonError::MalformedRandomness);
        }
        let mut r_x = [0u8; 32];
        let mut r_y = [0u8; 32];
        r_x.copy_from_slice(&bytes[..32]);
        r_y.copy_from_slice(&bytes[32..64]);
        Ok(Self {
            r_x,
            r_y,
            s: bytes[64..].to_vec(),
        })
    }

    pub fn r_x(&self) -> &[u8; 32] {
        &self.r_x
    }

    pub fn r_y(&self) -> &[u8; 32] {
        &self.r_y
    }

    pub fn s(&self) -> &[u8] {
        &self.s
    }
}

/// Generate a fresh trapdoor key pair.
pub fn generate_keypair() -> (SecretKey, PublicKey) {
    let secret = SecretKey(curve::random_scalar(&mut OsRng));
    let public = secret.public_key();
    (secret, public)
}

/// `e = SHA256(message ‖ rX) mod n`. Binding in `rX` separates commitments
/// made under different `R`.
fn challenge(message: &[u8], r_x: &[u8; 32]) -> Scalar {
    let mut hasher = Sha256::new();
    hasher.update(message);
    hasher.update(r_x);
    let digest: [u8; 32] = hasher.finalize().into();
    curve::scalar_from_digest(&digest)
}

/// Commit to `message` under `public_key`.
///
/// Returns the opening `(R, s)` and the hash output: the padded big-endian
/// x-coordinate of `Q = s·G + e·P`.
pub fn hash(message: &[u8], public_key: &PublicKey) -> Result<(Randomness, Hash), ChameleonError> {
    let pub_point = public_key.point().ok_or(ChameleonError::MalformedKey)?;

    let (r_x, r_y) = loop {
        let k = curve::random_scalar(&mut OsRng);
        if let Some(coords) = curve::coordinates(&curve::mul_base(&k)) {
            break coords;
        }
    };
    let e = challenge(message, &r_x);

    loop {
        let s = curve::random_scalar(&mut OsRng);
        let q = curve::mul_base(&s) + pub_point * e;
        if let Some((h_x, _)) = curve::coordinates(&q) {
            let randomness = Randomness {
                r_x,
                r_y,
                s: curve::scalar_to_var_bytes(&s),
            };
            return Ok((randomness, h_x));
        }
    }
}

/// Check that `(R, s)` opens `root_hash` for `message` under `public_key`.
///
/// Never errors: malformed points or scalars simply fail the check.
/// `root_hash` is compared by integer value, so leading zeros are
/// insignificant on either side.
pub fn verify(
    message: &[u8],
    root_hash: &[u8],
    public_key: &PublicKey,
    randomness: &Randomness,
) -> bool {
    let Some(pub_point) = public_key.point() else {
        return false;
    };
    if curve::point_from_coordinates(&randomness.r_x, &randomness.r_y).is_none() {
        return false;
    }
    let Some(s) = curve::scalar_from_be_bytes(&randomness.s) else {
        return false;
    };

    let e = challenge(message, &randomness.r_x);
    let q = curve::mul_base(&s) + pub_point * e;
    match curve::coordinates(&q) {
        Some((q_x, _)) => strip_leading_zeros(&q_x) == strip_leading_zeros(root_hash),
        None => false,
    }
}

/// Open `root_hash` for `new_message`, given a valid opening for `message`
/// and the trapdoor.
///
/// `R` is kept; only `s` changes: `s' = s + (e - e')·x mod n`. Fails with
/// [`ChameleonError::InvalidTrapdoor`] when the secret key does not open
/// the supplied commitment (wrong key, or garbage randomness).
pub fn find_collision(
    message: &[u8],
    randomness: &Randomness,
    root_hash: &[u8],
    new_message: &[u8],
    secret_key: &SecretKey,
) -> Result<Randomness, ChameleonError> {
    let derived = secret_key.public_key();
    if !verify(message, root_hash, &derived, randomness) {
        return Err(ChameleonError::InvalidTrapdoor);
    }

    let s = curve::scalar_from_be_bytes(&randomness.s).ok_or(ChameleonError::InvalidTrapdoor)?;
    let e = challenge(message, &randomness.r_x);
    let e_new = challenge(new_message, &randomness.r_x);
    let s_new = s + (e - e_new) * secret_key.0;

    Ok(Randomness {
        r_x: randomness.r_x,
        r_y: randomness.r_y,
        s: curve::scalar_to_var_bytes(&s_new),
    })
}
