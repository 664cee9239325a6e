use confidential_core::{Point, Scalar};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// `2^(16*i)`, the weight of chunk `i` in a little-endian 16-bit chunked value.
pub(crate) fn chunk_weight(i: usize) -> Scalar {
    Scalar::from_u128(1u128 << (16 * i as u32))
}

/// Recomposes a little-endian 16-bit chunk array into a plain `u128` amount.
pub(crate) fn chunks_to_amount(chunks: &[(u64, Scalar); confidential_ciphertext::CHUNK_COUNT]) -> u128 {
    chunks.iter().enumerate().fold(0u128, |acc, (i, (v, _))| acc + ((*v as u128) << (16 * i)))
}

/// Blinding for one "chunk opening" equation: knowledge of `(value, rand)`
/// such that `commitment = value*G0 + rand*H` and `handle = rand*key`.
///
/// Every Sigma proof in this crate is built from one or more of these,
/// composed by sharing the Fiat-Shamir challenge and, where a relation ties
/// two equations together (e.g. the same transferred value committed to a
/// recipient and to an auditor), sharing the underlying blind itself.
#[derive(Clone, Copy)]
pub(crate) struct ChunkBlind {
    pub k_value: Scalar,
    pub k_rand: Scalar,
}

impl Zeroize for ChunkBlind {
    fn zeroize(&mut self) {
        self.k_value.zeroize();
        self.k_rand.zeroize();
    }
}

impl ChunkBlind {
    pub(crate) fn sample<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        ChunkBlind {
            k_value: Scalar::random(rng),
            k_rand: Scalar::random(rng),
        }
    }

    /// `(A_commitment, A_handle)`, absorbed into the transcript before the
    /// challenge is drawn.
    pub(crate) fn commitments(&self, key: Point) -> (Point, Point) {
        let a_commitment = Point::basepoint() * self.k_value + Point::h_generator() * self.k_rand;
        let a_handle = key * self.k_rand;
        (a_commitment, a_handle)
    }

    pub(crate) fn respond(&self, challenge: Scalar, value: Scalar, rand: Scalar) -> (Scalar, Scalar) {
        (
            self.k_value + challenge * value,
            self.k_rand + challenge * rand,
        )
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn verify_chunk_opening(
    challenge: Scalar,
    key: Point,
    commitment: Point,
    handle: Point,
    a_commitment: Point,
    a_handle: Point,
    z_value: Scalar,
    z_rand: Scalar,
) -> bool {
    let lhs_commitment = Point::basepoint() * z_value + Point::h_generator() * z_rand;
    let rhs_commitment = a_commitment + commitment * challenge;
    let lhs_handle = key * z_rand;
    let rhs_handle = a_handle + handle * challenge;
    lhs_commitment == rhs_commitment && lhs_handle == rhs_handle
}

/// Blinding for a Schnorr proof of knowledge of a scalar `secret` with
/// `target = secret * base` (used to show the prover holds a decryption key
/// matching the account's published encryption key).
pub(crate) struct KeyBlind(pub(crate) Scalar);

impl Zeroize for KeyBlind {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl KeyBlind {
    pub(crate) fn sample<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        KeyBlind(Scalar::random(rng))
    }

    pub(crate) fn commitment(&self, base: Point) -> Point {
        base * self.0
    }

    pub(crate) fn respond(&self, challenge: Scalar, secret: Scalar) -> Scalar {
        self.0 + challenge * secret
    }
}

pub(crate) fn verify_key_knowledge(challenge: Scalar, base: Point, target: Point, a: Point, z: Scalar) -> bool {
    base * z == a + target * challenge
}

#[cfg(test)]
mod tests {
    use super::*;
    use confidential_ciphertext::DecryptionKey;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn chunk_opening_round_trips() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let dk = DecryptionKey::generate(&mut rng);
        let key = dk.encryption_key();
        let value = Scalar::from_u64(42);
        let rand = Scalar::random(&mut rng);
        let commitment = Point::basepoint() * value + Point::h_generator() * rand;
        let handle = key.to_bytes();
        let handle_point = Point::from_bytes(&handle, false).unwrap() * rand;

        let blind = ChunkBlind::sample(&mut rng);
        let (a_c, a_h) = blind.commitments(Point::from_bytes(&handle, false).unwrap());
        let challenge = Scalar::random(&mut rng);
        let (z_v, z_r) = blind.respond(challenge, value, rand);

        assert!(verify_chunk_opening(
            challenge,
            Point::from_bytes(&handle, false).unwrap(),
            commitment,
            handle_point,
            a_c,
            a_h,
            z_v,
            z_r
        ));
    }

    #[test]
    fn key_knowledge_round_trips() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let dk = DecryptionKey::generate(&mut rng);
        let base = dk.encryption_key();
        let base_point = Point::from_bytes(&base.to_bytes(), false).unwrap();
        let target = Point::h_generator();
        let secret = dk.scalar();

        let blind = KeyBlind::sample(&mut rng);
        let a = blind.commitment(base_point);
        let challenge = Scalar::random(&mut rng);
        let z = blind.respond(challenge, secret);
        assert!(verify_key_knowledge(challenge, base_point, target, a, z));
    }
}
