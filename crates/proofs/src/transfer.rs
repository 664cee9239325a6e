use confidential_ciphertext::{ChunkedCiphertext, DecryptionKey, EncryptionKey, CHUNK_COUNT};
use confidential_core::{labels, Point, ProofTranscript, Scalar};
use rand::{CryptoRng, RngCore};

use crate::error::ProofError;
use crate::range::RangeProofBundle;
use crate::sigma::{chunk_weight, chunks_to_amount, verify_chunk_opening, verify_key_knowledge, ChunkBlind, KeyBlind};
use crate::withdraw::aggregate;

pub const TRANSFER_PROOF_VERSION: u16 = 1;

/// Proves: the sender holds `d_s` for `P_s`; the recipient ciphertext and
/// every auditor ciphertext encrypt the *same* chunked value `{v_i}` (each
/// under its own key and randomness); the sender's new ciphertext encrypts
/// `{m_i'}` under `P_s`; and `Σ m_i'*2^16i = m_old - Σ v_i*2^16i`
/// (`spec.md` §4.4.2).
///
/// Auditor ciphertexts share the recipient's value witnesses `{v_i}` (the
/// same per-chunk value Schnorr blind/response is reused across the
/// recipient opening, every auditor opening, and the closing equation), so
/// they need no range proofs of their own: the recipient's range proofs
/// already bind `{v_i}` in range, and the shared `z_value` response ties
/// every auditor ciphertext to those same chunks.
#[derive(Clone)]
pub struct TransferProof {
    pub version: u16,
    pub key_commitment: Point,
    pub key_response: Scalar,
    /// Shared per-chunk value response `z_v_i`, reused by the recipient
    /// opening, every auditor opening, and the closing equation.
    pub value_responses: [Scalar; CHUNK_COUNT],
    pub recipient_commitments: [(Point, Point); CHUNK_COUNT],
    pub recipient_rand_responses: [Scalar; CHUNK_COUNT],
    pub auditor_commitments: Vec<[(Point, Point); CHUNK_COUNT]>,
    pub auditor_rand_responses: Vec<[Scalar; CHUNK_COUNT]>,
    pub sender_commitments: [(Point, Point); CHUNK_COUNT],
    pub sender_responses: [(Scalar, Scalar); CHUNK_COUNT],
    pub closing_commitment: Point,
    pub range_proofs: RangeProofBundle,
}

#[allow(clippy::too_many_arguments)]
pub fn prove<R: RngCore + CryptoRng>(
    account: &[u8],
    token: &[u8],
    sender_key: &EncryptionKey,
    sender_decryption_key: &DecryptionKey,
    recipient_key: &EncryptionKey,
    auditor_keys: &[EncryptionKey],
    old_ciphertext: &ChunkedCiphertext,
    value_chunks: &[u64; CHUNK_COUNT],
    recipient_randomness: &[Scalar; CHUNK_COUNT],
    auditor_randomness: &[[Scalar; CHUNK_COUNT]],
    sender_new_chunks: &[(u64, Scalar); CHUNK_COUNT],
    rng: &mut R,
) -> Result<(TransferProof, ChunkedCiphertext, ChunkedCiphertext, Vec<ChunkedCiphertext>), ProofError> {
    debug_assert_eq!(auditor_keys.len(), auditor_randomness.len());

    let value: u128 = value_chunks.iter().enumerate().fold(0u128, |acc, (i, v)| acc + ((*v as u128) << (16 * i)));
    let recipient_ciphertext = ChunkedCiphertext::encrypt_with_randomness(value, recipient_key, recipient_randomness);
    let auditor_ciphertexts: Vec<ChunkedCiphertext> = auditor_keys
        .iter()
        .zip(auditor_randomness.iter())
        .map(|(key, r)| ChunkedCiphertext::encrypt_with_randomness(value, key, r))
        .collect();

    let sender_randomness: [Scalar; CHUNK_COUNT] = std::array::from_fn(|i| sender_new_chunks[i].1);
    let sender_new_ciphertext =
        ChunkedCiphertext::encrypt_with_randomness(chunks_to_amount(sender_new_chunks), sender_key, &sender_randomness);

    let sender_key_point = Point::from_bytes(&sender_key.to_bytes(), false)?;
    let recipient_key_point = Point::from_bytes(&recipient_key.to_bytes(), false)?;
    let auditor_key_points: Vec<Point> =
        auditor_keys.iter().map(|k| Point::from_bytes(&k.to_bytes(), false)).collect::<Result<_, _>>()?;

    // Shared value blinds, one per chunk, reused across every destination.
    let value_blinds: [Scalar; CHUNK_COUNT] = std::array::from_fn(|_| Scalar::random(rng));
    let recipient_rand_blinds: [Scalar; CHUNK_COUNT] = std::array::from_fn(|_| Scalar::random(rng));
    let recipient_commitments: [(Point, Point); CHUNK_COUNT] = std::array::from_fn(|i| {
        (
            Point::basepoint() * value_blinds[i] + Point::h_generator() * recipient_rand_blinds[i],
            recipient_key_point * recipient_rand_blinds[i],
        )
    });

    let auditor_rand_blinds: Vec<[Scalar; CHUNK_COUNT]> =
        auditor_keys.iter().map(|_| std::array::from_fn(|_| Scalar::random(rng))).collect();
    let auditor_commitments: Vec<[(Point, Point); CHUNK_COUNT]> = auditor_key_points
        .iter()
        .zip(auditor_rand_blinds.iter())
        .map(|(key, rand_blinds)| {
            std::array::from_fn(|i| (Point::basepoint() * value_blinds[i] + Point::h_generator() * rand_blinds[i], *key * rand_blinds[i]))
        })
        .collect();

    let sender_blinds: [ChunkBlind; CHUNK_COUNT] = std::array::from_fn(|_| ChunkBlind::sample(rng));
    let sender_commitments: [(Point, Point); CHUNK_COUNT] =
        std::array::from_fn(|i| sender_blinds[i].commitments(sender_key_point));

    let key_blind = KeyBlind::sample(rng);
    let key_commitment = key_blind.commitment(sender_key_point);

    let (_, old_handle) = aggregate(old_ciphertext);

    let mut transcript = ProofTranscript::new(labels::SIGMA_TRANSFER_V1);
    transcript.append_message(b"account", account);
    transcript.append_message(b"token", token);
    transcript.append_point(b"sender_key", &sender_key_point);
    transcript.append_point(b"recipient_key", &recipient_key_point);
    for key in &auditor_key_points {
        transcript.append_point(b"auditor_key", key);
    }
    for chunk in old_ciphertext.chunks() {
        transcript.append_point(b"old_commitment", &chunk.commitment());
        transcript.append_point(b"old_handle", &chunk.handle());
    }
    for chunk in sender_new_ciphertext.chunks() {
        transcript.append_point(b"sender_new_commitment", &chunk.commitment());
        transcript.append_point(b"sender_new_handle", &chunk.handle());
    }
    for chunk in recipient_ciphertext.chunks() {
        transcript.append_point(b"recipient_commitment", &chunk.commitment());
        transcript.append_point(b"recipient_handle", &chunk.handle());
    }
    for ciphertext in &auditor_ciphertexts {
        for chunk in ciphertext.chunks() {
            transcript.append_point(b"auditor_commitment", &chunk.commitment());
            transcript.append_point(b"auditor_handle", &chunk.handle());
        }
    }
    transcript.append_point(b"key_commitment", &key_commitment);
    for (a_c, a_h) in &recipient_commitments {
        transcript.append_point(b"recipient_a_commitment", a_c);
        transcript.append_point(b"recipient_a_handle", a_h);
    }
    for commitments in &auditor_commitments {
        for (a_c, a_h) in commitments {
            transcript.append_point(b"auditor_a_commitment", a_c);
            transcript.append_point(b"auditor_a_handle", a_h);
        }
    }
    for (a_c, a_h) in &sender_commitments {
        transcript.append_point(b"sender_a_commitment", a_c);
        transcript.append_point(b"sender_a_handle", a_h);
    }

    let weighted_value_blinds =
        value_blinds.iter().enumerate().fold(Scalar::ZERO, |acc, (i, k)| acc + chunk_weight(i) * *k);
    let weighted_sender_rand_blinds =
        sender_blinds.iter().enumerate().fold(Scalar::ZERO, |acc, (i, b)| acc + chunk_weight(i) * b.k_rand);
    let closing_commitment =
        Point::basepoint() * weighted_value_blinds + old_handle * key_blind.0 - Point::h_generator() * weighted_sender_rand_blinds;
    transcript.append_point(b"closing_commitment", &closing_commitment);

    let challenge = transcript.challenge_scalar(b"challenge");

    let key_response = key_blind.respond(challenge, sender_decryption_key.scalar());
    let value_responses: [Scalar; CHUNK_COUNT] =
        std::array::from_fn(|i| value_blinds[i] + challenge * Scalar::from_u64(value_chunks[i]));
    let recipient_rand_responses: [Scalar; CHUNK_COUNT] =
        std::array::from_fn(|i| recipient_rand_blinds[i] + challenge * recipient_randomness[i]);
    let auditor_rand_responses: Vec<[Scalar; CHUNK_COUNT]> = auditor_rand_blinds
        .iter()
        .zip(auditor_randomness.iter())
        .map(|(blinds, rand)| std::array::from_fn(|i| blinds[i] + challenge * rand[i]))
        .collect();
    let sender_responses: [(Scalar, Scalar); CHUNK_COUNT] = std::array::from_fn(|i| {
        let (value, rand) = sender_new_chunks[i];
        sender_blinds[i].respond(challenge, Scalar::from_u64(value), rand)
    });

    let mut range_values: Vec<u64> = value_chunks.to_vec();
    range_values.extend(sender_new_chunks.iter().map(|(v, _)| *v));
    let mut range_blindings: Vec<Scalar> = recipient_randomness.to_vec();
    range_blindings.extend(sender_new_chunks.iter().map(|(_, r)| *r));
    let range_proofs = RangeProofBundle::prove(labels::SIGMA_TRANSFER_V1, account, &range_values, &range_blindings)?;

    Ok((
        TransferProof {
            version: TRANSFER_PROOF_VERSION,
            key_commitment,
            key_response,
            value_responses,
            recipient_commitments,
            recipient_rand_responses,
            auditor_commitments,
            auditor_rand_responses,
            sender_commitments,
            sender_responses,
            closing_commitment,
            range_proofs,
        },
        sender_new_ciphertext,
        recipient_ciphertext,
        auditor_ciphertexts,
    ))
}

#[allow(clippy::too_many_arguments)]
pub fn verify(
    account: &[u8],
    token: &[u8],
    sender_key: &EncryptionKey,
    recipient_key: &EncryptionKey,
    auditor_keys: &[EncryptionKey],
    old_ciphertext: &ChunkedCiphertext,
    sender_new_ciphertext: &ChunkedCiphertext,
    recipient_ciphertext: &ChunkedCiphertext,
    auditor_ciphertexts: &[ChunkedCiphertext],
    proof: &TransferProof,
) -> Result<(), ProofError> {
    if proof.version != TRANSFER_PROOF_VERSION {
        return Err(ProofError::InvalidEncoding);
    }
    if auditor_keys.len() != auditor_ciphertexts.len()
        || auditor_keys.len() != proof.auditor_commitments.len()
        || auditor_keys.len() != proof.auditor_rand_responses.len()
    {
        return Err(ProofError::InvalidEncoding);
    }

    let sender_key_point = Point::from_bytes(&sender_key.to_bytes(), false)?;
    let recipient_key_point = Point::from_bytes(&recipient_key.to_bytes(), false)?;
    let auditor_key_points: Vec<Point> =
        auditor_keys.iter().map(|k| Point::from_bytes(&k.to_bytes(), false)).collect::<Result<_, _>>()?;

    let mut transcript = ProofTranscript::new(labels::SIGMA_TRANSFER_V1);
    transcript.append_message(b"account", account);
    transcript.append_message(b"token", token);
    transcript.append_point(b"sender_key", &sender_key_point);
    transcript.append_point(b"recipient_key", &recipient_key_point);
    for key in &auditor_key_points {
        transcript.append_point(b"auditor_key", key);
    }
    for chunk in old_ciphertext.chunks() {
        transcript.append_point(b"old_commitment", &chunk.commitment());
        transcript.append_point(b"old_handle", &chunk.handle());
    }
    for chunk in sender_new_ciphertext.chunks() {
        transcript.append_point(b"sender_new_commitment", &chunk.commitment());
        transcript.append_point(b"sender_new_handle", &chunk.handle());
    }
    for chunk in recipient_ciphertext.chunks() {
        transcript.append_point(b"recipient_commitment", &chunk.commitment());
        transcript.append_point(b"recipient_handle", &chunk.handle());
    }
    for ciphertext in auditor_ciphertexts {
        for chunk in ciphertext.chunks() {
            transcript.append_point(b"auditor_commitment", &chunk.commitment());
            transcript.append_point(b"auditor_handle", &chunk.handle());
        }
    }
    transcript.append_point(b"key_commitment", &proof.key_commitment);
    for (a_c, a_h) in &proof.recipient_commitments {
        transcript.append_point(b"recipient_a_commitment", a_c);
        transcript.append_point(b"recipient_a_handle", a_h);
    }
    for commitments in &proof.auditor_commitments {
        for (a_c, a_h) in commitments {
            transcript.append_point(b"auditor_a_commitment", a_c);
            transcript.append_point(b"auditor_a_handle", a_h);
        }
    }
    for (a_c, a_h) in &proof.sender_commitments {
        transcript.append_point(b"sender_a_commitment", a_c);
        transcript.append_point(b"sender_a_handle", a_h);
    }
    transcript.append_point(b"closing_commitment", &proof.closing_commitment);
    let challenge = transcript.challenge_scalar(b"challenge");

    if !verify_key_knowledge(challenge, sender_key_point, Point::h_generator(), proof.key_commitment, proof.key_response)
    {
        return Err(ProofError::SigmaVerificationFailed);
    }

    for (i, chunk) in recipient_ciphertext.chunks().iter().enumerate() {
        let (a_c, a_h) = proof.recipient_commitments[i];
        if !verify_chunk_opening(
            challenge,
            recipient_key_point,
            chunk.commitment(),
            chunk.handle(),
            a_c,
            a_h,
            proof.value_responses[i],
            proof.recipient_rand_responses[i],
        ) {
            return Err(ProofError::SigmaVerificationFailed);
        }
    }

    for (j, ciphertext) in auditor_ciphertexts.iter().enumerate() {
        for (i, chunk) in ciphertext.chunks().iter().enumerate() {
            let (a_c, a_h) = proof.auditor_commitments[j][i];
            if !verify_chunk_opening(
                challenge,
                auditor_key_points[j],
                chunk.commitment(),
                chunk.handle(),
                a_c,
                a_h,
                proof.value_responses[i],
                proof.auditor_rand_responses[j][i],
            ) {
                return Err(ProofError::SigmaVerificationFailed);
            }
        }
    }

    for (i, chunk) in sender_new_ciphertext.chunks().iter().enumerate() {
        let (a_c, a_h) = proof.sender_commitments[i];
        let (z_m, z_r) = proof.sender_responses[i];
        if !verify_chunk_opening(challenge, sender_key_point, chunk.commitment(), chunk.handle(), a_c, a_h, z_m, z_r) {
            return Err(ProofError::SigmaVerificationFailed);
        }
    }

    let (old_commitment, old_handle) = aggregate(old_ciphertext);
    let (sender_new_commitment, _) = aggregate(sender_new_ciphertext);
    let closing_target = old_commitment - sender_new_commitment;

    let weighted_value_responses =
        proof.value_responses.iter().enumerate().fold(Scalar::ZERO, |acc, (i, z)| acc + chunk_weight(i) * *z);
    let weighted_sender_rand_responses =
        proof.sender_responses.iter().enumerate().fold(Scalar::ZERO, |acc, (i, (_, z_r))| acc + chunk_weight(i) * *z_r);

    let lhs = Point::basepoint() * weighted_value_responses + old_handle * proof.key_response
        - Point::h_generator() * weighted_sender_rand_responses;
    let rhs = proof.closing_commitment + closing_target * challenge;
    if lhs != rhs {
        return Err(ProofError::SigmaVerificationFailed);
    }

    let mut commitments: Vec<Point> = recipient_ciphertext.chunks().iter().map(|c| c.commitment()).collect();
    commitments.extend(sender_new_ciphertext.chunks().iter().map(|c| c.commitment()));
    proof.range_proofs.verify(labels::SIGMA_TRANSFER_V1, account, &commitments)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn chunks_for(amount: u128, rng: &mut ChaCha20Rng) -> [(u64, Scalar); CHUNK_COUNT] {
        std::array::from_fn(|i| (((amount >> (16 * i)) & 0xffff) as u64, Scalar::random(rng)))
    }

    #[test]
    fn proves_and_verifies_a_transfer_without_auditors() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let sender_dk = DecryptionKey::generate(&mut rng);
        let sender_key = sender_dk.encryption_key();
        let recipient_dk = DecryptionKey::generate(&mut rng);
        let recipient_key = recipient_dk.encryption_key();

        let old = ChunkedCiphertext::encrypt(1_000_000, &sender_key, &mut rng);
        let value_chunks: [u64; CHUNK_COUNT] =
            std::array::from_fn(|i| (((300_000u128) >> (16 * i)) & 0xffff) as u64);
        let recipient_randomness: [Scalar; CHUNK_COUNT] = std::array::from_fn(|_| Scalar::random(&mut rng));
        let sender_new_chunks = chunks_for(1_000_000 - 300_000, &mut rng);

        let (proof, sender_new_ciphertext, recipient_ciphertext, auditor_ciphertexts) = prove(
            b"acct",
            b"token",
            &sender_key,
            &sender_dk,
            &recipient_key,
            &[],
            &old,
            &value_chunks,
            &recipient_randomness,
            &[],
            &sender_new_chunks,
            &mut rng,
        )
        .unwrap();

        verify(
            b"acct",
            b"token",
            &sender_key,
            &recipient_key,
            &[],
            &old,
            &sender_new_ciphertext,
            &recipient_ciphertext,
            &auditor_ciphertexts,
            &proof,
        )
        .unwrap();
        assert_eq!(recipient_ciphertext.decrypt(&recipient_dk).unwrap(), 300_000);
        assert_eq!(sender_new_ciphertext.decrypt(&sender_dk).unwrap(), 700_000);
    }

    #[test]
    fn proves_and_verifies_a_transfer_with_two_auditors() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let sender_dk = DecryptionKey::generate(&mut rng);
        let sender_key = sender_dk.encryption_key();
        let recipient_dk = DecryptionKey::generate(&mut rng);
        let recipient_key = recipient_dk.encryption_key();
        let auditor1_dk = DecryptionKey::generate(&mut rng);
        let auditor1_key = auditor1_dk.encryption_key();
        let auditor2_dk = DecryptionKey::generate(&mut rng);
        let auditor2_key = auditor2_dk.encryption_key();
        let auditor_keys = [auditor1_key, auditor2_key];

        let old = ChunkedCiphertext::encrypt(5_000_000, &sender_key, &mut rng);
        let value_chunks: [u64; CHUNK_COUNT] =
            std::array::from_fn(|i| (((1_500_000u128) >> (16 * i)) & 0xffff) as u64);
        let recipient_randomness: [Scalar; CHUNK_COUNT] = std::array::from_fn(|_| Scalar::random(&mut rng));
        let auditor_randomness: [[Scalar; CHUNK_COUNT]; 2] =
            std::array::from_fn(|_| std::array::from_fn(|_| Scalar::random(&mut rng)));
        let sender_new_chunks = chunks_for(5_000_000 - 1_500_000, &mut rng);

        let (proof, sender_new_ciphertext, recipient_ciphertext, auditor_ciphertexts) = prove(
            b"acct",
            b"token",
            &sender_key,
            &sender_dk,
            &recipient_key,
            &auditor_keys,
            &old,
            &value_chunks,
            &recipient_randomness,
            &auditor_randomness,
            &sender_new_chunks,
            &mut rng,
        )
        .unwrap();

        verify(
            b"acct",
            b"token",
            &sender_key,
            &recipient_key,
            &auditor_keys,
            &old,
            &sender_new_ciphertext,
            &recipient_ciphertext,
            &auditor_ciphertexts,
            &proof,
        )
        .unwrap();
        assert_eq!(auditor_ciphertexts[0].decrypt(&auditor1_dk).unwrap(), 1_500_000);
        assert_eq!(auditor_ciphertexts[1].decrypt(&auditor2_dk).unwrap(), 1_500_000);
    }

    #[test]
    fn rejects_mismatched_auditor_count() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let sender_dk = DecryptionKey::generate(&mut rng);
        let sender_key = sender_dk.encryption_key();
        let recipient_dk = DecryptionKey::generate(&mut rng);
        let recipient_key = recipient_dk.encryption_key();

        let old = ChunkedCiphertext::encrypt(10_000, &sender_key, &mut rng);
        let value_chunks: [u64; CHUNK_COUNT] = std::array::from_fn(|i| (((1_000u128) >> (16 * i)) & 0xffff) as u64);
        let recipient_randomness: [Scalar; CHUNK_COUNT] = std::array::from_fn(|_| Scalar::random(&mut rng));
        let sender_new_chunks = chunks_for(9_000, &mut rng);

        let (proof, sender_new_ciphertext, recipient_ciphertext, auditor_ciphertexts) = prove(
            b"acct",
            b"token",
            &sender_key,
            &sender_dk,
            &recipient_key,
            &[],
            &old,
            &value_chunks,
            &recipient_randomness,
            &[],
            &sender_new_chunks,
            &mut rng,
        )
        .unwrap();

        let extra_auditor = [DecryptionKey::generate(&mut rng).encryption_key()];
        let result = verify(
            b"acct",
            b"token",
            &sender_key,
            &recipient_key,
            &extra_auditor,
            &old,
            &sender_new_ciphertext,
            &recipient_ciphertext,
            &auditor_ciphertexts,
            &proof,
        );
        assert!(result.is_err());
    }
}
