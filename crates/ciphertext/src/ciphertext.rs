use confidential_core::{Point, Scalar};
use rand::{CryptoRng, RngCore};

use crate::dlog::discrete_log_search;
use crate::error::CipherError;
use crate::key::{DecryptionKey, EncryptionKey};

/// A Twisted-ElGamal ciphertext `(C, D)` over a single 16-bit (or, for
/// debug tooling, 32-bit) amount chunk.
///
/// `C = m * G0 + r * H` is a Pedersen commitment to the plaintext `m`; `D =
/// r * P` is the decryption handle under encryption key `P`. Homomorphic
/// addition/subtraction works component-wise because both `C` and `D` are
/// linear in `(m, r)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ciphertext {
    pub(crate) commitment: Point,
    pub(crate) handle: Point,
}

impl Ciphertext {
    /// The additive identity: encrypts `0` under any key with `r = 0`.
    pub fn zero() -> Self {
        Ciphertext {
            commitment: Point::identity(),
            handle: Point::identity(),
        }
    }

    pub fn encrypt<R: RngCore + CryptoRng>(amount: u64, key: &EncryptionKey, rng: &mut R) -> Self {
        let r = Scalar::random(rng);
        Self::encrypt_with_randomness(amount, key, r)
    }

    /// Encrypts with caller-supplied randomness. Used by chunked encryption
    /// (which must bind one `r` per chunk deterministically when a test
    /// vector pins it) and by normalization, which re-encrypts a known
    /// amount with fresh randomness drawn up front.
    pub fn encrypt_with_randomness(amount: u64, key: &EncryptionKey, r: Scalar) -> Self {
        let commitment = Point::basepoint() * Scalar::from_u64(amount) + Point::h_generator() * r;
        let handle = key.point() * r;
        Ciphertext { commitment, handle }
    }

    pub fn add(&self, other: &Ciphertext) -> Ciphertext {
        Ciphertext {
            commitment: self.commitment + other.commitment,
            handle: self.handle + other.handle,
        }
    }

    pub fn sub(&self, other: &Ciphertext) -> Ciphertext {
        Ciphertext {
            commitment: self.commitment - other.commitment,
            handle: self.handle - other.handle,
        }
    }

    pub fn commitment(&self) -> Point {
        self.commitment
    }

    pub fn handle(&self) -> Point {
        self.handle
    }

    /// Recovers `m * G0` without solving the discrete log, for callers that
    /// only need to check equality against a known candidate plaintext
    /// (proof verification does this; it never needs the scalar itself).
    pub fn decrypt_point(&self, key: &DecryptionKey) -> Point {
        self.commitment - key.scalar() * self.handle
    }

    /// Fully decrypts the plaintext by discrete-log search over `maxBits`
    /// (16 for a single balance chunk, 32 for the debug-only widened table).
    pub fn decrypt_value(&self, key: &DecryptionKey, max_bits: u8) -> Result<u64, CipherError> {
        discrete_log_search(self.decrypt_point(key), max_bits)
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.commitment.to_bytes());
        out[32..].copy_from_slice(&self.handle.to_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; 64]) -> Result<Self, CipherError> {
        let mut c = [0u8; 32];
        let mut d = [0u8; 32];
        c.copy_from_slice(&bytes[..32]);
        d.copy_from_slice(&bytes[32..]);
        Ok(Ciphertext {
            commitment: Point::from_bytes(&c, true)?,
            handle: Point::from_bytes(&d, true)?,
        })
    }
}
