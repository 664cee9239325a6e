use confidential_ciphertext::{ChunkedCiphertext, DecryptionKey, EncryptionKey, CHUNK_COUNT};
use confidential_core::{labels, Point, ProofTranscript, Scalar};
use rand::{CryptoRng, RngCore};

use crate::error::ProofError;
use crate::range::RangeProofBundle;
use crate::sigma::{chunk_weight, chunks_to_amount, verify_chunk_opening, verify_key_knowledge, ChunkBlind, KeyBlind};

/// Current on-wire version of [`WithdrawalProof`].
pub const WITHDRAWAL_PROOF_VERSION: u16 = 1;

/// Proves: the prover holds `d` for the account's published key, the claimed
/// new available ciphertext opens to `{m_i}` under that key, and `Σ
/// m_i*2^16i == m_old - w` where `m_old` is the value `C_old` decrypts to
/// under `d` (`spec.md` §4.4.1).
///
/// The decryption-consistency equation never needs the old ciphertext's
/// randomness (which the prover may not know, e.g. for chunks credited by a
/// rollover): it is expressed purely via `d` and the new ciphertext's own
/// (freshly drawn) randomness, folded into the same closing equation the
/// per-chunk Schnorr blinds already commit to.
#[derive(Clone)]
pub struct WithdrawalProof {
    pub version: u16,
    /// `A_d = k_d * P`, the Schnorr commitment proving knowledge of `d`.
    pub key_commitment: Point,
    pub key_response: Scalar,
    /// Per-chunk `(A_commitment, A_handle)` for the new ciphertext's opening.
    pub chunk_commitments: [(Point, Point); CHUNK_COUNT],
    pub chunk_responses: [(Scalar, Scalar); CHUNK_COUNT],
    /// `A_U = k_d * D_old_agg - (Σ 2^16i * k_ri) * H`, binding `d` and the
    /// new ciphertext's combined randomness to the public difference
    /// `C_old_agg - w*G0 - C_new_agg`.
    pub closing_commitment: Point,
    pub range_proofs: RangeProofBundle,
}

pub(crate) fn aggregate(ciphertext: &ChunkedCiphertext) -> (Point, Point) {
    let mut commitment = Point::identity();
    let mut handle = Point::identity();
    for (i, chunk) in ciphertext.chunks().iter().enumerate() {
        let w = chunk_weight(i);
        commitment = commitment + chunk.commitment() * w;
        handle = handle + chunk.handle() * w;
    }
    (commitment, handle)
}

pub fn prove<R: RngCore + CryptoRng>(
    account: &[u8],
    token: &[u8],
    key: &EncryptionKey,
    decryption_key: &DecryptionKey,
    old_ciphertext: &ChunkedCiphertext,
    amount: u64,
    new_chunks: &[(u64, Scalar); CHUNK_COUNT],
    rng: &mut R,
) -> Result<(WithdrawalProof, ChunkedCiphertext), ProofError> {
    let randomness: [Scalar; CHUNK_COUNT] = std::array::from_fn(|i| new_chunks[i].1);
    let new_ciphertext = ChunkedCiphertext::encrypt_with_randomness(chunks_to_amount(new_chunks), key, &randomness);

    let key_point = Point::from_bytes(&key.to_bytes(), false)?;
    let key_blind = KeyBlind::sample(rng);
    let key_commitment = key_blind.commitment(key_point);

    let chunk_blinds: [ChunkBlind; CHUNK_COUNT] = std::array::from_fn(|_| ChunkBlind::sample(rng));
    let chunk_commitments: [(Point, Point); CHUNK_COUNT] =
        std::array::from_fn(|i| chunk_blinds[i].commitments(key_point));

    let (old_commitment, old_handle) = aggregate(old_ciphertext);
    let (new_commitment, _) = aggregate(&new_ciphertext);
    let closing_target = old_commitment - Point::basepoint() * Scalar::from_u64(amount) - new_commitment;

    let mut transcript = ProofTranscript::new(labels::SIGMA_WITHDRAW_V1);
    transcript.append_message(b"account", account);
    transcript.append_message(b"token", token);
    transcript.append_point(b"encryption_key", &key_point);
    transcript.append_u64(b"amount", amount);
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
    let _ = closing_target; // recomputed identically by the verifier

    let challenge = transcript.challenge_scalar(b"challenge");

    let key_response = key_blind.respond(challenge, decryption_key.scalar());
    let chunk_responses: [(Scalar, Scalar); CHUNK_COUNT] = std::array::from_fn(|i| {
        let (value, rand) = new_chunks[i];
        chunk_blinds[i].respond(challenge, Scalar::from_u64(value), rand)
    });

    let values: Vec<u64> = new_chunks.iter().map(|(v, _)| *v).collect();
    let blindings: Vec<Scalar> = new_chunks.iter().map(|(_, r)| *r).collect();
    let range_proofs = RangeProofBundle::prove(labels::SIGMA_WITHDRAW_V1, account, &values, &blindings)?;

    Ok((
        WithdrawalProof {
            version: WITHDRAWAL_PROOF_VERSION,
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
    amount: u64,
    new_ciphertext: &ChunkedCiphertext,
    proof: &WithdrawalProof,
) -> Result<(), ProofError> {
    if proof.version != WITHDRAWAL_PROOF_VERSION {
        return Err(ProofError::InvalidEncoding);
    }
    let key_point = Point::from_bytes(&key.to_bytes(), false)?;

    let mut transcript = ProofTranscript::new(labels::SIGMA_WITHDRAW_V1);
    transcript.append_message(b"account", account);
    transcript.append_message(b"token", token);
    transcript.append_point(b"encryption_key", &key_point);
    transcript.append_u64(b"amount", amount);
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
    let closing_target = old_commitment - Point::basepoint() * Scalar::from_u64(amount) - new_commitment;

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
    proof.range_proofs.verify(labels::SIGMA_WITHDRAW_V1, account, &commitments)?;
    Ok(())
}
