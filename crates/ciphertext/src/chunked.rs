use confidential_core::Scalar;
use rand::{CryptoRng, RngCore};

use crate::ciphertext::Ciphertext;
use crate::error::CipherError;
use crate::key::{DecryptionKey, EncryptionKey};

/// Number of 16-bit chunks covering a 128-bit balance.
pub const CHUNK_COUNT: usize = 8;
const CHUNK_BITS: u8 = 16;

/// A balance represented as `CHUNK_COUNT` independently encrypted 16-bit
/// little-endian chunks, each under the same key.
///
/// Chunking keeps every discrete-log search bounded to a 16-bit table
/// (`dlog::discrete_log_search`) no matter how large the total balance
/// grows, at the cost of needing periodic normalization once homomorphic
/// additions push a chunk's plaintext magnitude above `2^16 - 1` (see
/// `is_normalized`/the `NormalizationProof` consumer in `confidential-proofs`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkedCiphertext {
    chunks: [Ciphertext; CHUNK_COUNT],
}

impl ChunkedCiphertext {
    pub fn zero() -> Self {
        ChunkedCiphertext {
            chunks: [Ciphertext::zero(); CHUNK_COUNT],
        }
    }

    pub fn chunks(&self) -> &[Ciphertext; CHUNK_COUNT] {
        &self.chunks
    }

    pub fn from_chunks(chunks: [Ciphertext; CHUNK_COUNT]) -> Self {
        ChunkedCiphertext { chunks }
    }

    /// Splits `amount` into little-endian 16-bit limbs and encrypts each
    /// independently with fresh randomness.
    pub fn encrypt<R: RngCore + CryptoRng>(amount: u128, key: &EncryptionKey, rng: &mut R) -> Self {
        let limbs = split_into_chunks(amount);
        let mut chunks = [Ciphertext::zero(); CHUNK_COUNT];
        for (i, limb) in limbs.into_iter().enumerate() {
            chunks[i] = Ciphertext::encrypt(limb as u64, key, rng);
        }
        ChunkedCiphertext { chunks }
    }

    /// Deterministic variant for golden test vectors: caller supplies one
    /// randomness scalar per chunk.
    pub fn encrypt_with_randomness(amount: u128, key: &EncryptionKey, randomness: &[Scalar; CHUNK_COUNT]) -> Self {
        let limbs = split_into_chunks(amount);
        let mut chunks = [Ciphertext::zero(); CHUNK_COUNT];
        for i in 0..CHUNK_COUNT {
            chunks[i] = Ciphertext::encrypt_with_randomness(limbs[i] as u64, key, randomness[i]);
        }
        ChunkedCiphertext { chunks }
    }

    pub fn add(&self, other: &Self) -> Self {
        let mut chunks = [Ciphertext::zero(); CHUNK_COUNT];
        for i in 0..CHUNK_COUNT {
            chunks[i] = self.chunks[i].add(&other.chunks[i]);
        }
        ChunkedCiphertext { chunks }
    }

    pub fn sub(&self, other: &Self) -> Self {
        let mut chunks = [Ciphertext::zero(); CHUNK_COUNT];
        for i in 0..CHUNK_COUNT {
            chunks[i] = self.chunks[i].sub(&other.chunks[i]);
        }
        ChunkedCiphertext { chunks }
    }

    /// Decrypts every chunk and reassembles the full amount. Fails with the
    /// index of the first chunk whose discrete log could not be found
    /// (typically because accumulated additions have pushed it above the
    /// 16-bit table, i.e. the balance is due for normalization).
    pub fn decrypt(&self, key: &DecryptionKey) -> Result<u128, CipherError> {
        let mut total: u128 = 0;
        for (i, chunk) in self.chunks.iter().enumerate() {
            let limb = chunk
                .decrypt_value(key, CHUNK_BITS)
                .map_err(|_| CipherError::ChunkDecryptFailed(i as u8))?;
            total += (limb as u128) << (16 * i as u32);
        }
        Ok(total)
    }
}

fn split_into_chunks(amount: u128) -> [u16; CHUNK_COUNT] {
    let mut limbs = [0u16; CHUNK_COUNT];
    for (i, limb) in limbs.iter_mut().enumerate() {
        *limb = ((amount >> (16 * i as u32)) & 0xffff) as u16;
    }
    limbs
}
