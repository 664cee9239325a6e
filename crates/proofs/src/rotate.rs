use confidential_ciphertext::{ChunkedCiphertext, DecryptionKey, EncryptionKey, CHUNK_COUNT};
use confidential_core::{labels, Point, ProofTranscript, Scalar};
use rand::{CryptoRng, RngCore};

use crate::error::ProofError;
use crate::range::RangeProofBundle;
use crate::sigma::{chunk_weight, chunks_to_amount, verify_chunk_opening, verify_key_knowledge, ChunkBlind, KeyBlind};
use crate::withdraw::aggregate;

pub const ROTATION_PROOF_VERSION: u16 = 1;

/// Proves the prover holds both `d_old` (matching `P_old`) and `d_new`
/// (matching `P_new`), and that the claimed new ciphertext under `P_new`
/// encrypts the same chunked value as the current available ciphertext
/// under `P_old` (`spec.md` §4.4.4).
#[derive(Clone)]
pub struct RotationProof {
    pub version: u16,
    pub old_key_commitment: Point,
    pub old_key_response: Scalar,
    pub new_key_commitment: Point,
    pub new_key_response: Scalar,
    pub chunk_commitments: [(Point, Point); CHUNK_COUNT],
    pub chunk_responses: [(Scalar, Scalar); CHUNK_COUNT],
    /// Binds `d_old` and the new ciphertext's combined randomness to the
    /// public difference `C_old_agg - C_new_agg`.
    pub closing_commitment: Point,
    pub range_proofs: RangeProofBundle,
}

#[allow(clippy::too_many_arguments)]
pub fn prove<R: RngCore + CryptoRng>(
    account: &[u8],
    token: &[u8],
    old_key: &EncryptionKey,
    old_decryption_key: &DecryptionKey,
    new_key: &EncryptionKey,
    new_decryption_key: &DecryptionKey,
    old_ciphertext: &ChunkedCiphertext,
    new_chunks: &[(u64, Scalar); CHUNK_COUNT],
    rng: &mut R,
) -> Result<(RotationProof, ChunkedCiphertext), ProofError> {
    let randomness: [Scalar; CHUNK_COUNT] = std::array::from_fn(|i| new_chunks[i].1);
    let new_ciphertext =
        ChunkedCiphertext::encrypt_with_randomness(chunks_to_amount(new_chunks), new_key, &randomness);

    let old_key_point = Point::from_bytes(&old_key.to_bytes(), false)?;
    let new_key_point = Point::from_bytes(&new_key.to_bytes(), false)?;

    let old_key_blind = KeyBlind::sample(rng);
    let old_key_commitment = old_key_blind.commitment(old_key_point);
    let new_key_blind = KeyBlind::sample(rng);
    let new_key_commitment = new_key_blind.commitment(new_key_point);

    let chunk_blinds: [ChunkBlind; CHUNK_COUNT] = std::array::from_fn(|_| ChunkBlind::sample(rng));
    let chunk_commitments: [(Point, Point); CHUNK_COUNT] =
        std::array::from_fn(|i| chunk_blinds[i].commitments(new_key_point));

    let (_, old_handle) = aggregate(old_ciphertext);

    let mut transcript = ProofTranscript::new(labels::SIGMA_ROTATE_V1);
    transcript.append_message(b"account", account);
    transcript.append_message(b"token", token);
    transcript.append_point(b"old_encryption_key", &old_key_point);
    transcript.append_point(b"new_encryption_key", &new_key_point);
    for chunk in old_ciphertext.chunks() {
        transcript.append_point(b"old_commitment", &chunk.commitment());
        transcript.append_point(b"old_handle", &chunk.handle());
    }
    for chunk in new_ciphertext.chunks() {
        transcript.append_point(b"new_commitment", &chunk.commitment());
        transcript.append_point(b"new_handle", &chunk.handle());
    }
    transcript.append_point(b"old_key_commitment", &old_key_commitment);
    transcript.append_point(b"new_key_commitment", &new_key_commitment);
    for (a_c, a_h) in &chunk_commitments {
        transcript.append_point(b"chunk_a_commitment", a_c);
        transcript.append_point(b"chunk_a_handle", a_h);
    }
    let k_rand_weighted_sum = chunk_blinds
        .iter()
        .enumerate()
        .fold(Scalar::ZERO, |acc, (i, b)| acc + chunk_weight(i) * b.k_rand);
    let closing_commitment = old_handle * old_key_blind.0 - Point::h_generator() * k_rand_weighted_sum;
    transcript.append_point(b"closing_commitment", &closing_commitment);

    let challenge = transcript.challenge_scalar(b"challenge");

    let old_key_response = old_key_blind.respond(challenge, old_decryption_key.scalar());
    let new_key_response = new_key_blind.respond(challenge, new_decryption_key.scalar());
    let chunk_responses: [(Scalar, Scalar); CHUNK_COUNT] = std::array::from_fn(|i| {
        let (value, rand) = new_chunks[i];
        chunk_blinds[i].respond(challenge, Scalar::from_u64(value), rand)
    });

    let values: Vec<u64> = new_chunks.iter().map(|(v, _)| *v).collect();
    let blindings: Vec<Scalar> = new_chunks.iter().map(|(_, r)| *r).collect();
    let range_proofs = RangeProofBundle::prove(labels::SIGMA_ROTATE_V1, account, &values, &blindings)?;

    Ok((
        RotationProof {
            version: ROTATION_PROOF_VERSION,
            old_key_commitment,
            old_key_response,
            new_key_commitment,
            new_key_response,
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
    old_key: &EncryptionKey,
    new_key: &EncryptionKey,
    old_ciphertext: &ChunkedCiphertext,
    new_ciphertext: &ChunkedCiphertext,
    proof: &RotationProof,
) -> Result<(), ProofError> {
    if proof.version != ROTATION_PROOF_VERSION {
        return Err(ProofError::InvalidEncoding);
    }
    let old_key_point = Point::from_bytes(&old_key.to_bytes(), false)?;
    let new_key_point = Point::from_bytes(&new_key.to_bytes(), false)?;

    let mut transcript = ProofTranscript::new(labels::SIGMA_ROTATE_V1);
    transcript.append_message(b"account", account);
    transcript.append_message(b"token", token);
    transcript.append_point(b"old_encryption_key", &old_key_point);
    transcript.append_point(b"new_encryption_key", &new_key_point);
    for chunk in old_ciphertext.chunks() {
        transcript.append_point(b"old_commitment", &chunk.commitment());
        transcript.append_point(b"old_handle", &chunk.handle());
    }
    for chunk in new_ciphertext.chunks() {
        transcript.append_point(b"new_commitment", &chunk.commitment());
        transcript.append_point(b"new_handle", &chunk.handle());
    }
    transcript.append_point(b"old_key_commitment", &proof.old_key_commitment);
    transcript.append_point(b"new_key_commitment", &proof.new_key_commitment);
    for (a_c, a_h) in &proof.chunk_commitments {
        transcript.append_point(b"chunk_a_commitment", a_c);
        transcript.append_point(b"chunk_a_handle", a_h);
    }
    transcript.append_point(b"closing_commitment", &proof.closing_commitment);
    let challenge = transcript.challenge_scalar(b"challenge");

    if !verify_key_knowledge(
        challenge,
        old_key_point,
        Point::h_generator(),
        proof.old_key_commitment,
        proof.old_key_response,
    ) {
        return Err(ProofError::SigmaVerificationFailed);
    }
    if !verify_key_knowledge(
        challenge,
        new_key_point,
        Point::h_generator(),
        proof.new_key_commitment,
        proof.new_key_response,
    ) {
        return Err(ProofError::SigmaVerificationFailed);
    }
    for (i, chunk) in new_ciphertext.chunks().iter().enumerate() {
        let (a_c, a_h) = proof.chunk_commitments[i];
        let (z_v, z_r) = proof.chunk_responses[i];
        if !verify_chunk_opening(challenge, new_key_point, chunk.commitment(), chunk.handle(), a_c, a_h, z_v, z_r) {
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

    let lhs = old_handle * proof.old_key_response - Point::h_generator() * z_rand_weighted_sum;
    let rhs = proof.closing_commitment + closing_target * challenge;
    if lhs != rhs {
        return Err(ProofError::SigmaVerificationFailed);
    }

    let commitments: Vec<Point> = new_ciphertext.chunks().iter().map(|c| c.commitment()).collect();
    proof.range_proofs.verify(labels::SIGMA_ROTATE_V1, account, &commitments)?;
    Ok(())
}
