use core::ops::{Add, Mul, Neg, Sub};

use curve25519_dalek::scalar::Scalar as DalekScalar;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::CoreError;

/// An element of the curve's prime-order scalar field `ell`.
///
/// Wraps `curve25519_dalek::scalar::Scalar` so that every other crate in the
/// workspace goes through one canonical encode/decode path rather than
/// reaching into `curve25519-dalek` directly.
#[derive(Clone, Copy, Debug, Default, Zeroize)]
pub struct Scalar(pub(crate) DalekScalar);

impl Scalar {
    pub const ZERO: Scalar = Scalar(DalekScalar::ZERO);
    pub const ONE: Scalar = Scalar(DalekScalar::ONE);

    /// Draws a scalar with full 256-bit entropy from a CSPRNG.
    ///
    /// `Scalar::from(rng.next_u64())` would only carry 64 bits of entropy;
    /// proof blinding factors and ElGamal randomness need the full field.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 64];
        rng.fill_bytes(&mut bytes);
        Scalar(DalekScalar::from_bytes_mod_order_wide(&bytes))
    }

    pub fn from_u64(v: u64) -> Self {
        Scalar(DalekScalar::from(v))
    }

    pub fn from_u128(v: u128) -> Self {
        Scalar(DalekScalar::from(v))
    }

    pub fn invert(&self) -> Self {
        Scalar(self.0.invert())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == DalekScalar::ZERO
    }

    /// Canonical 32-byte little-endian encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Decodes 32 little-endian bytes, rejecting any encoding `>= ell`.
    pub fn from_canonical_bytes(bytes: &[u8; 32]) -> Result<Self, CoreError> {
        Option::from(DalekScalar::from_canonical_bytes(*bytes))
            .map(Scalar)
            .ok_or(CoreError::InvalidEncoding)
    }

    /// Hashes `label` and the absorbed byte strings to a scalar via wide
    /// reduction of a SHA-512 digest, the same reduction the prover side
    /// uses for its own ElGamal/Sigma randomness.
    pub fn hash_to_scalar(label: &[u8], parts: &[&[u8]]) -> Self {
        let mut hasher = Sha512::new();
        hasher.update(label);
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        let digest = hasher.finalize();
        let mut wide = [0u8; 64];
        wide.copy_from_slice(&digest);
        Scalar(DalekScalar::from_bytes_mod_order_wide(&wide))
    }

    pub(crate) fn inner(&self) -> &DalekScalar {
        &self.0
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}
impl Eq for Scalar {}

impl From<DalekScalar> for Scalar {
    fn from(s: DalekScalar) -> Self {
        Scalar(s)
    }
}

impl Add for Scalar {
    type Output = Scalar;
    fn add(self, rhs: Self) -> Scalar {
        Scalar(self.0 + rhs.0)
    }
}
impl Sub for Scalar {
    type Output = Scalar;
    fn sub(self, rhs: Self) -> Scalar {
        Scalar(self.0 - rhs.0)
    }
}
impl Mul for Scalar {
    type Output = Scalar;
    fn mul(self, rhs: Self) -> Scalar {
        Scalar(self.0 * rhs.0)
    }
}
impl Neg for Scalar {
    type Output = Scalar;
    fn neg(self) -> Scalar {
        Scalar(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_canonical() {
        let s = Scalar::from_u64(42);
        let bytes = s.to_bytes();
        assert_eq!(Scalar::from_canonical_bytes(&bytes).unwrap(), s);
    }

    #[test]
    fn rejects_non_canonical() {
        // ell's little-endian bytes minus one bit flipped into overflow territory:
        // 2^255 - 19 + ... ; easiest is 0xff..ff which is far above ell.
        let bytes = [0xffu8; 32];
        assert!(Scalar::from_canonical_bytes(&bytes).is_err());
    }

    #[test]
    fn invert_round_trip() {
        let s = Scalar::from_u64(7);
        let inv = s.invert();
        assert_eq!(s * inv, Scalar::ONE);
    }

    #[test]
    fn hash_to_scalar_is_deterministic() {
        let a = Scalar::hash_to_scalar(b"label", &[b"one", b"two"]);
        let b = Scalar::hash_to_scalar(b"label", &[b"one", b"two"]);
        assert_eq!(a, b);
        let c = Scalar::hash_to_scalar(b"label", &[b"one", b"three"]);
        assert_ne!(a, c);
    }
}
