use confidential_ciphertext::{ChunkedCiphertext, DecryptionKey, EncryptionKey, CHUNK_COUNT};
use confidential_core::{labels, Point, ProofTranscript, Scalar};
use rand::{CryptoRng, RngCore};

use crate::error::ProofError;
use crate::range::RangeProofBundle;
use crate::sigma::{chunk_weight, chunks_to_amount, verify_chunk_opening, verify_key_knowledge, ChunkBlind, KeyBlind};
use crate::withdraw::aggregate;

pub const NORMALIZATION_PROOF_VERSION: u16 = 1;

/// Proves `C_new` encrypts the same chunked value as `C_old` under the same
/// key, and that every new chunk fits `[0, 2^16)` (`spec.md` §4.4.3).
///
/// Structurally identical to [`crate::withdraw::WithdrawalProof`] with the
/// public withdrawal amount fixed at zero: the owner re-chunks their own
/// `available` balance, which they can always decrypt with their own `d`,
/// without needing to have tracked the combined randomness of every
/// ciphertext chunk that was ever homomorphically added into it.
#[derive(Clone)]
pub struct NormalizationProof {
    pub version: u16,
    pub key_commitment: Point,
    pub key_response: Scalar,
    pub chunk_commitments: [(Point, Point); CHUNK_COUNT],
    pub chunk_responses: [(Scalar, Scalar); CHUNK_COUNT],
    pub closing_commitment: Point,
    pub range_proofs: RangeProofBundle,
}

pub fn prove<R: RngCore + CryptoRng>(
    account: &[u8],
    token: &[u8],
    key: &EncryptionKey,
    decryption_key: &DecryptionKey,
    old_ciphertext: &ChunkedCiphertext,
    new_chunks: &[(u64, Scalar); CHUNK_COUNT],
    rng: &mut R,
) -> Result<(NormalizationProof, ChunkedCiphertext), ProofError> {
    let randomness: [Scalar; CHUNK_COUNT] = std::array::from_fn(|i| new_chunks[i].1);
    let new_ciphertext = ChunkedCiphertext::encrypt_with_randomness(chunks_to_amount(new_chunks), key, &randomness);

    let key_point = Point::from_bytes(&key.to_bytes(), false)?;
    let key_blind = KeyBlind::sample(rng);
    let key_commitment = key_blind.commitment(key_point);

    let chunk_blinds: [ChunkBlind; CHUNK_COUNT] = std::array::from_fn(|_| ChunkBlind::sample(rng));
    let chunk_commitments: [(Point, Point); CHUNK_COUNT] =
        std::array::from_fn(|i| chunk_blinds[i].commitments(key_point));

    let (_, old_handle) = aggregate(old_ciphertext);

    let mut transcript = ProofTranscript::new(labels::SIGMA_NORM_V1);
    transcript.append_message(b"account", account);
    transcript.append_message(b"token", token);
    transcript.append_point(b"encryption_key", &key_point);
    for chunk in old_ciphertext.chunks() {
        transcript.append_point(b"old_commitment", &chunk.commitment());
        transcript.append_point(b"old_handle", &chunk.handle());
    }
    for chunk in new_ciphertext.chunks() {
        transcript.append_point(b"new_commitment", &chunk.commitment());
        transcript.append_point(b"new_handle", &chunk.handle());
    }
    transcript.append_point(b"key_commitment", &key_commitment);
    for (a_c, a_h) in &chunk_commitments {
        transcript.append_point(b"chunk_a_commitment", a_c);
        transcript.append_point(b"chunk_a_handle", a_h);
    }
    let k_rand_weighted_sum = chunk_blinds
        .iter()
        .enumerate()
        .fold(Scalar::ZERO, |acc, (i, b)| acc + chunk_weight(i) * b.k_rand);
    let closing_commitment = old_handle * key_blind.0 - Point::h_generator() * k_rand_weighted_sum;
    transcript.append_point(b"closing_commitment", &closing_commitment);

    let challenge = transcript.challenge_scalar(b"challenge");

    let key_response = key_blind.respond(challenge, decryption_key.scalar());
    let chunk_responses: [(Scalar, Scalar); CHUNK_COUNT] = std::array::from_fn(|i| {
        let (value, rand) = new_chunks[i];
        chunk_blinds[i].respond(challenge, Scalar::from_u64(value), rand)
    });

    let values: Vec<u64> = new_chunks.iter().map(|(v, _)| *v).collect();
    let blindings: Vec<Scalar> = new_chunks.iter().map(|(_, r)| *r).collect();
    let range_proofs = RangeProofBundle::prove(labels::SIGMA_NORM_V1, account, &values, &blindings)?;

    Ok((
        NormalizationProof {
            version: NORMALIZATION_PROOF_VERSION,
            key_commitment,
            key_response,
            chunk_commitments,
            chunk_responses,
            closing_commitment,
            range_proofs,
        },
        new_ciphertext,
    ))
}

pub fn verify(
    account: &[u8],
    token: &[u8],
    key: &EncryptionKey,
    old_ciphertext: &ChunkedCiphertext,
    new_ciphertext: &ChunkedCiphertext,
    proof: &NormalizationProof,
) -> Result<(), ProofError> {
    if proof.version != NORMALIZATION_PROOF_VERSION {
        return Err(ProofError::InvalidEncoding);
    }
    let key_point = Point::from_bytes(&key.to_bytes(), false)?;

    let mut transcript = ProofTranscript::new(labels::SIGMA_NORM_V1);
    transcript.append_message(b"account", account);
    transcript.append_message(b"token", token);
    transcript.append_point(b"encryption_key", &key_point);
    for chunk in old_ciphertext.chunks() {
        transcript.append_point(b"old_commitment", &chunk.commitment());
        transcript.append_point(b"old_handle", &chunk.handle());
    }
    for chunk in new_ciphertext.chunks() {
        transcript.append_point(b"new_commitment", &chunk.commitment());
        transcript.append_point(b"new_handle", &chunk.handle());
    }
    transcript.append_point(b"key_commitment", &proof.key_commitment);
    for (a_c, a_h) in &proof.chunk_commitments {
        transcript.append_point(b"chunk_a_commitment", a_c);
        transcript.append_point(b"chunk_a_handle", a_h);
    }
    transcript.append_point(b"closing_commitment", &proof.closing_commitment);
    let challenge = transcript.challenge_scalar(b"challenge");

    if !verify_key_knowledge(challenge, key_point, Point::h_generator(), proof.key_commitment, proof.key_response) {
        return Err(ProofError::SigmaVerificationFailed);
    }
    for (i, chunk) in new_ciphertext.chunks().iter().enumerate() {
        let (a_c, a_h) = proof.chunk_commitments[i];
        let (z_v, z_r) = proof.chunk_responses[i];
        if !verify_chunk_opening(challenge, key_point, chunk.commitment(), chunk.handle(), a_c, a_h, z_v, z_r) {
            return Err(ProofError::SigmaVerificationFailed);
        }
    }

    let (old_commitment, old_handle) = aggregate(old_ciphertext);
    let (new_commitment, _) = aggregate(new_ciphertext);
    let closing_target = old_commitment - new_commitment;

    let z_rand_weighted_sum = proof
        .chunk_responses
        .iter()
        .enumerate()
        .fold(Scalar::ZERO, |acc, (i, (_, z_r))| acc + chunk_weight(i) * *z_r);

    let lhs = old_handle * proof.key_response - Point::h_generator() * z_rand_weighted_sum;
    let rhs = proof.closing_commitment + closing_target * challenge;
    if lhs != rhs {
        return Err(ProofError::SigmaVerificationFailed);
    }

    let commitments: Vec<Point> = new_ciphertext.chunks().iter().map(|c| c.commitment()).collect();
    proof.range_proofs.verify(labels::SIGMA_NORM_V1, account, &commitments)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn proves_and_verifies_a_normalization() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let dk = DecryptionKey::generate(&mut rng);
        let key = dk.encryption_key();
        let old = ChunkedCiphertext::encrypt(3 * (1u128 << 40), &key, &mut rng);
        let new_chunks: [(u64, Scalar); CHUNK_COUNT] =
            std::array::from_fn(|i| ((((3u128 << 40) >> (16 * i)) & 0xffff) as u64, Scalar::random(&mut rng)));
        let (proof, new_ciphertext) = prove(b"acct", b"token", &key, &dk, &old, &new_chunks, &mut rng).unwrap();
        verify(b"acct", b"token", &key, &old, &new_ciphertext, &proof).unwrap();
    }
}
