use core::ops::{Add, Mul, Sub};
use std::sync::OnceLock;

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::traits::{Identity, IsIdentity, VartimeMultiscalarMul};
use sha2::Sha512;

use crate::error::CoreError;
use crate::scalar::Scalar;

/// An element of the prime-order Ristretto255 group.
///
/// Ristretto's compressed encoding is canonical by construction: a
/// non-canonical 32-byte string simply fails to decompress, which is how
/// `from_bytes` rejects malformed points without any extra bookkeeping. The
/// group has prime order, so "small-subgroup" rejection (required in
/// general Edwards-curve settings) is automatically subsumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point(pub(crate) RistrettoPoint);

static H_GENERATOR: OnceLock<Point> = OnceLock::new();

impl Point {
    pub fn identity() -> Self {
        Point(RistrettoPoint::identity())
    }

    /// The curve's conventional base generator `G0`.
    pub fn basepoint() -> Self {
        Point(RISTRETTO_BASEPOINT_POINT)
    }

    /// The Twisted-ElGamal second generator `H`, defined once as
    /// `hashToPoint("TwistedElGamalH", G0_bytes)` and cached process-wide.
    pub fn h_generator() -> Self {
        *H_GENERATOR.get_or_init(|| Self::hash_to_point(b"TwistedElGamalH", &[&Self::basepoint().to_bytes()]))
    }

    pub fn is_identity(&self) -> bool {
        self.0.is_identity()
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.compress().to_bytes()
    }

    /// Decodes a canonical compressed point, rejecting the identity when
    /// `allow_identity` is false (e.g. encryption keys must never be the
    /// identity point).
    pub fn from_bytes(bytes: &[u8; 32], allow_identity: bool) -> Result<Self, CoreError> {
        let point = CompressedRistretto(*bytes)
            .decompress()
            .ok_or(CoreError::InvalidEncoding)?;
        if !allow_identity && point.is_identity() {
            return Err(CoreError::InvalidEncoding);
        }
        Ok(Point(point))
    }

    /// Hashes `label` and the absorbed byte strings to a group element via
    /// the Ristretto hash-to-group construction (uniform, not a
    /// discrete-log-known point).
    pub fn hash_to_point(label: &[u8], parts: &[&[u8]]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha512::new();
        hasher.update(label);
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        Point(RistrettoPoint::from_hash(hasher))
    }

    /// `Sum(scalars[i] * points[i])`, computed in variable time.
    ///
    /// For *public* statement verification only — never call this with a
    /// secret scalar, since `VartimeMultiscalarMul` is not access-pattern
    /// independent of its scalar inputs.
    pub fn multiscalar_mul(scalars: &[Scalar], points: &[Point]) -> Self {
        let s = scalars.iter().map(Scalar::inner);
        let p = points.iter().map(|p| p.0);
        Point(RistrettoPoint::vartime_multiscalar_mul(s, p))
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Self) -> Point {
        Point(self.0 + rhs.0)
    }
}
impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Self) -> Point {
        Point(self.0 - rhs.0)
    }
}
impl Mul<Scalar> for Point {
    type Output = Point;
    /// Scalar-point multiplication. `curve25519-dalek`'s `Scalar * Point`
    /// implementation is constant-time, which is what secret-key-bearing
    /// call sites (e.g. `d * D` during decryption) rely on.
    fn mul(self, rhs: Scalar) -> Point {
        Point(rhs.0 * self.0)
    }
}
impl Mul<Point> for Scalar {
    type Output = Point;
    fn mul(self, rhs: Point) -> Point {
        Point(self.0 * rhs.0)
    }
}
