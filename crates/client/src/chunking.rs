use confidential_ciphertext::CHUNK_COUNT;
use confidential_core::Scalar;
use rand::{CryptoRng, RngCore};

/// Splits `amount` into little-endian 16-bit limbs, each paired with a
/// freshly drawn blinding scalar, in the `[(u64, Scalar); CHUNK_COUNT]`
/// shape every proof-builder in `confidential-proofs` takes for a new
/// ciphertext it is about to open.
pub fn fresh_chunks<R: RngCore + CryptoRng>(amount: u128, rng: &mut R) -> [(u64, Scalar); CHUNK_COUNT] {
    std::array::from_fn(|i| {
        let limb = ((amount >> (16 * i as u32)) & 0xffff) as u64;
        (limb, Scalar::random(rng))
    })
}
