//! Deterministic (`ChaCha20Rng`-seeded) golden proofs, generated once here
//! and consumed both as regression fixtures and as the base for the
//! version-rejection scenario (`spec.md` §8, S6): flip a pinned proof's
//! 2-byte version prefix and confirm `confidential-codec` rejects it.
//!
//! Every vector is built fresh at call time rather than checked in as raw
//! constants — deterministic seeding makes the two equivalent, and this
//! way a vector always reflects the current wire format instead of a
//! byte blob frozen at generation time.

use confidential_ciphertext::{ChunkedCiphertext, DecryptionKey, EncryptionKey, CHUNK_COUNT};
use confidential_codec::WireEncode;
use confidential_core::Scalar;
use confidential_proofs::{NormalizationProof, RotationProof, TransferProof, WithdrawalProof};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

pub const ACCOUNT: [u8; 32] = [0x11; 32];
pub const TOKEN: [u8; 32] = [0x22; 32];

fn fresh_chunks(amount: u128, rng: &mut ChaCha20Rng) -> [(u64, Scalar); CHUNK_COUNT] {
    std::array::from_fn(|i| (((amount >> (16 * i as u32)) & 0xffff) as u64, Scalar::random(rng)))
}

pub struct WithdrawalVector {
    pub key: EncryptionKey,
    pub old_ciphertext: ChunkedCiphertext,
    pub amount: u64,
    pub new_ciphertext: ChunkedCiphertext,
    pub proof: WithdrawalProof,
    pub proof_bytes: Vec<u8>,
}

/// Sender holds 10_000 available, withdraws 2_500.
pub fn withdrawal_vector() -> WithdrawalVector {
    let mut rng = ChaCha20Rng::seed_from_u64(1001);
    let decryption_key = DecryptionKey::generate(&mut rng);
    let key = decryption_key.encryption_key();
    let old_chunks = fresh_chunks(10_000, &mut rng);
    let old_randomness: [Scalar; CHUNK_COUNT] = std::array::from_fn(|i| old_chunks[i].1);
    let old_ciphertext = ChunkedCiphertext::encrypt_with_randomness(10_000, &key, &old_randomness);

    let amount = 2_500u64;
    let new_chunks = fresh_chunks(10_000 - amount as u128, &mut rng);
    let (proof, new_ciphertext) = confidential_proofs::prove_withdrawal(
        &ACCOUNT,
        &TOKEN,
        &key,
        &decryption_key,
        &old_ciphertext,
        amount,
        &new_chunks,
        &mut rng,
    )
    .expect("deterministic vector must prove");

    let mut proof_bytes = Vec::new();
    proof.encode(&mut proof_bytes);

    WithdrawalVector { key, old_ciphertext, amount, new_ciphertext, proof, proof_bytes }
}

pub struct NormalizationVector {
    pub key: EncryptionKey,
    pub old_ciphertext: ChunkedCiphertext,
    pub new_ciphertext: ChunkedCiphertext,
    pub proof: NormalizationProof,
    pub proof_bytes: Vec<u8>,
}

/// An overflowed chunk (two additions of `u16::MAX`) re-chunked back into range.
pub fn normalization_vector() -> NormalizationVector {
    let mut rng = ChaCha20Rng::seed_from_u64(1002);
    let decryption_key = DecryptionKey::generate(&mut rng);
    let key = decryption_key.encryption_key();
    let a = ChunkedCiphertext::encrypt(u16::MAX as u128, &key, &mut rng);
    let b = ChunkedCiphertext::encrypt(u16::MAX as u128, &key, &mut rng);
    let old_ciphertext = a.add(&b);

    let new_chunks = fresh_chunks(2 * u16::MAX as u128, &mut rng);
    let (proof, new_ciphertext) = confidential_proofs::prove_normalization(
        &ACCOUNT,
        &TOKEN,
        &key,
        &decryption_key,
        &old_ciphertext,
        &new_chunks,
        &mut rng,
    )
    .expect("deterministic vector must prove");

    let mut proof_bytes = Vec::new();
    proof.encode(&mut proof_bytes);

    NormalizationVector { key, old_ciphertext, new_ciphertext, proof, proof_bytes }
}

pub struct RotationVector {
    pub old_key: EncryptionKey,
    pub new_key: EncryptionKey,
    pub old_ciphertext: ChunkedCiphertext,
    pub new_ciphertext: ChunkedCiphertext,
    pub proof: RotationProof,
    pub proof_bytes: Vec<u8>,
}

pub fn rotation_vector() -> RotationVector {
    let mut rng = ChaCha20Rng::seed_from_u64(1003);
    let old_decryption_key = DecryptionKey::generate(&mut rng);
    let old_key = old_decryption_key.encryption_key();
    let new_decryption_key = DecryptionKey::generate(&mut rng);
    let new_key = new_decryption_key.encryption_key();

    let old_chunks = fresh_chunks(4_200, &mut rng);
    let old_randomness: [Scalar; CHUNK_COUNT] = std::array::from_fn(|i| old_chunks[i].1);
    let old_ciphertext = ChunkedCiphertext::encrypt_with_randomness(4_200, &old_key, &old_randomness);

    let new_chunks = fresh_chunks(4_200, &mut rng);
    let (proof, new_ciphertext) = confidential_proofs::prove_rotation(
        &ACCOUNT,
        &TOKEN,
        &old_key,
        &old_decryption_key,
        &new_key,
        &new_decryption_key,
        &old_ciphertext,
        &new_chunks,
        &mut rng,
    )
    .expect("deterministic vector must prove");

    let mut proof_bytes = Vec::new();
    proof.encode(&mut proof_bytes);

    RotationVector { old_key, new_key, old_ciphertext, new_ciphertext, proof, proof_bytes }
}

pub struct TransferVector {
    pub sender_key: EncryptionKey,
    pub recipient_key: EncryptionKey,
    pub auditor_keys: Vec<EncryptionKey>,
    pub old_ciphertext: ChunkedCiphertext,
    pub sender_new_ciphertext: ChunkedCiphertext,
    pub recipient_ciphertext: ChunkedCiphertext,
    pub auditor_ciphertexts: Vec<ChunkedCiphertext>,
    pub proof: TransferProof,
    pub proof_bytes: Vec<u8>,
}

/// Sender holds 5_000 available, sends 1_200 to a recipient, audited by two
/// independent auditor keys.
pub fn transfer_vector_two_auditors() -> TransferVector {
    let mut rng = ChaCha20Rng::seed_from_u64(1004);
    let sender_decryption_key = DecryptionKey::generate(&mut rng);
    let sender_key = sender_decryption_key.encryption_key();
    let recipient_key = DecryptionKey::generate(&mut rng).encryption_key();
    let auditor_keys = vec![
        DecryptionKey::generate(&mut rng).encryption_key(),
        DecryptionKey::generate(&mut rng).encryption_key(),
    ];

    let old_chunks = fresh_chunks(5_000, &mut rng);
    let old_randomness: [Scalar; CHUNK_COUNT] = std::array::from_fn(|i| old_chunks[i].1);
    let old_ciphertext = ChunkedCiphertext::encrypt_with_randomness(5_000, &sender_key, &old_randomness);

    let transfer_amount = 1_200u64;
    let value_chunks = fresh_chunks(transfer_amount as u128, &mut rng);
    let value_amounts: [u64; CHUNK_COUNT] = std::array::from_fn(|i| value_chunks[i].0);
    let recipient_randomness: [Scalar; CHUNK_COUNT] = std::array::from_fn(|i| value_chunks[i].1);
    let auditor_randomness: Vec<[Scalar; CHUNK_COUNT]> = auditor_keys
        .iter()
        .map(|_| std::array::from_fn(|_| Scalar::random(&mut rng)))
        .collect();
    let sender_new_chunks = fresh_chunks(5_000 - transfer_amount as u128, &mut rng);

    let (proof, sender_new_ciphertext, recipient_ciphertext, auditor_ciphertexts) = confidential_proofs::prove_transfer(
        &ACCOUNT,
        &TOKEN,
        &sender_key,
        &sender_decryption_key,
        &recipient_key,
        &auditor_keys,
        &old_ciphertext,
        &value_amounts,
        &recipient_randomness,
        &auditor_randomness,
        &sender_new_chunks,
        &mut rng,
    )
    .expect("deterministic vector must prove");

    let mut proof_bytes = Vec::new();
    proof.encode(&mut proof_bytes);

    TransferVector {
        sender_key,
        recipient_key,
        auditor_keys,
        old_ciphertext,
        sender_new_ciphertext,
        recipient_ciphertext,
        auditor_ciphertexts,
        proof,
        proof_bytes,
    }
}
