use confidential_core::{labels, Point, Scalar};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::error::CipherError;

/// The public encryption key `P = d^-1 * H` derived from a [`DecryptionKey`].
///
/// Safe to share and to embed in wire messages; carries no secret state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncryptionKey(pub(crate) Point);

impl EncryptionKey {
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CipherError> {
        Ok(EncryptionKey(Point::from_bytes(bytes, false)?))
    }

    pub(crate) fn point(&self) -> Point {
        self.0
    }
}

/// The secret scalar `d` behind a Twisted-ElGamal key pair.
///
/// Wrapped in `Zeroizing` so the scalar's bytes are wiped the moment the key
/// goes out of scope, including on early returns from proof-building code
/// that borrows [`DecryptionKey::scalar`].
pub struct DecryptionKey(Zeroizing<Scalar>);

impl DecryptionKey {
    /// Draws a fresh key from a CSPRNG. `d == 0` has probability `2^-252` and
    /// is not special-cased; if it ever happened `invert()` would panic,
    /// which is the correct failure mode for an astronomically unlikely
    /// degenerate key.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        DecryptionKey(Zeroizing::new(Scalar::random(rng)))
    }

    /// Derives a key deterministically from an externally supplied
    /// signature, by hashing it under the fixed
    /// `CONFIDENTIAL_ASSET__TWISTED_ED25519_PRIVATE_KEY_CLAIM` domain tag.
    ///
    /// Rejects signatures shorter than 32 bytes: anything shorter does not
    /// carry enough entropy to seed a field element safely.
    pub fn from_signature(signature: &[u8]) -> Result<Self, CipherError> {
        if signature.len() < 32 {
            return Err(CipherError::InvalidEncoding);
        }
        let scalar = Scalar::hash_to_scalar(labels::DECRYPTION_KEY_CLAIM, &[signature]);
        Ok(DecryptionKey(Zeroizing::new(scalar)))
    }

    pub fn encryption_key(&self) -> EncryptionKey {
        EncryptionKey(self.0.invert() * Point::h_generator())
    }

    /// Exposes the raw witness scalar for Sigma-proof construction.
    pub fn scalar(&self) -> Scalar {
        *self.0
    }
}
