//! Thin wrappers around the P-256 group for the chameleon hash.
//!
//! Scalars cross the module boundary as big-endian bytes with
//! arbitrary-precision semantics: leading zeros are insignificant on decode
//! and stripped by the variable-length encoder. Points cross as fixed
//! 32-byte affine coordinate pairs.

use p256::elliptic_curve::ops::Reduce;
use p256::elliptic_curve::rand_core::CryptoRngCore;
use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::elliptic_curve::PrimeField;
use p256::{AffinePoint, EncodedPoint, FieldBytes, NonZeroScalar, ProjectivePoint, Scalar, U256};

use crate::types::strip_leading_zeros;

/// Byte width of one affine coordinate.
pub const COORDINATE_LEN: usize = 32;

/// Sample a uniform scalar in `[1, n-1]`.
pub fn random_scalar(rng: &mut impl CryptoRngCore) -> Scalar {
    *NonZeroScalar::random(rng)
}

/// `k * G` for the curve generator `G`.
pub fn mul_base(k: &Scalar) -> ProjectivePoint {
    ProjectivePoint::GENERATOR * k
}

/// Affine `(x, y)` of a point as fixed 32-byte big-endian coordinates.
/// Returns `None` for the point at infinity.
pub fn coordinates(point: &ProjectivePoint) -> Option<([u8; 32], [u8; 32])> {
    let encoded = point.to_affine().to_encoded_point(false);
    let x: [u8; 32] = encoded.x()?.as_slice().try_into().ok()?;
    let y: [u8; 32] = encoded.y()?.as_slice().try_into().ok()?;
    Some((x, y))
}

/// Rebuild a point from fixed 32-byte coordinates.
/// Returns `None` when `(x, y)` does not lie on the curve.
pub fn point_from_coordinates(x: &[u8; 32], y: &[u8; 32]) -> Option<ProjectivePoint> {
    let encoded = EncodedPoint::from_affine_coordinates(
        FieldBytes::from_slice(x),
        FieldBytes::from_slice(y),
        false,
    );
    Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .map(ProjectivePoint::from)
}

/// Reduce a 32-byte digest into a scalar mod the group order.
pub fn scalar_from_digest(digest: &[u8; 32]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce(U256::from_be_slice(digest))
}

/// Decode big-endian bytes into a scalar. Leading zeros are ignored;
/// values `>= n` (after trimming, more than 32 significant bytes or out of
/// field range) decode to `None`.
pub fn scalar_from_be_bytes(bytes: &[u8]) -> Option<Scalar> {
    let trimmed = strip_leading_zeros(bytes);
    if trimmed.len() > COORDINATE_LEN {
        return None;
    }
    let mut buf = [0u8; 32];
    buf[32 - trimmed.len()..].copy_from_slice(trimmed);
    Option::<Scalar>::from(Scalar::from_repr(buf.into()))
}

/// Fixed 32-byte big-endian encoding.
pub fn scalar_to_bytes(scalar: &Scalar) -> [u8; 32] {
    scalar.to_repr().into()
}

/// Minimal big-endian encoding, leading zeros stripped.
pub fn scalar_to_var_bytes(scalar: &Scalar) -> Vec<u8> {
    strip_leading_zeros(&scalar.to_repr()).to_vec()
}
