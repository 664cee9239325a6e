use confidential_ciphertext::CHUNK_COUNT;
use confidential_core::{Point, Scalar};
use confidential_proofs::{
    NormalizationProof, RangeProofBundle, RotationProof, TransferProof, WithdrawalProof,
    NORMALIZATION_PROOF_VERSION, ROTATION_PROOF_VERSION, TRANSFER_PROOF_VERSION, WITHDRAWAL_PROOF_VERSION,
};

use crate::{read_u16, read_u32, CodecError, WireDecode, WireEncode};

fn encode_point_pairs(out: &mut Vec<u8>, pairs: &[(Point, Point); CHUNK_COUNT]) {
    for (a, b) in pairs {
        a.encode(out);
        b.encode(out);
    }
}

fn decode_point_pairs(buf: &[u8]) -> Result<([(Point, Point); CHUNK_COUNT], usize), CodecError> {
    let mut out = [(Point::identity(), Point::identity()); CHUNK_COUNT];
    let mut offset = 0;
    for slot in out.iter_mut() {
        let (a, n) = Point::decode(&buf[offset..])?;
        offset += n;
        let (b, n) = Point::decode(&buf[offset..])?;
        offset += n;
        *slot = (a, b);
    }
    Ok((out, offset))
}

fn encode_scalar_pairs(out: &mut Vec<u8>, pairs: &[(Scalar, Scalar); CHUNK_COUNT]) {
    for (a, b) in pairs {
        a.encode(out);
        b.encode(out);
    }
}

fn decode_scalar_pairs(buf: &[u8]) -> Result<([(Scalar, Scalar); CHUNK_COUNT], usize), CodecError> {
    let mut out = [(Scalar::ZERO, Scalar::ZERO); CHUNK_COUNT];
    let mut offset = 0;
    for slot in out.iter_mut() {
        let (a, n) = Scalar::decode(&buf[offset..])?;
        offset += n;
        let (b, n) = Scalar::decode(&buf[offset..])?;
        offset += n;
        *slot = (a, b);
    }
    Ok((out, offset))
}

fn encode_scalars(out: &mut Vec<u8>, values: &[Scalar; CHUNK_COUNT]) {
    for v in values {
        v.encode(out);
    }
}

fn decode_scalars(buf: &[u8]) -> Result<([Scalar; CHUNK_COUNT], usize), CodecError> {
    let mut out = [Scalar::ZERO; CHUNK_COUNT];
    let mut offset = 0;
    for slot in out.iter_mut() {
        let (v, n) = Scalar::decode(&buf[offset..])?;
        offset += n;
        *slot = v;
    }
    Ok((out, offset))
}

fn encode_range_proofs(out: &mut Vec<u8>, bundle: &RangeProofBundle) {
    let groups = bundle.to_group_bytes();
    out.extend_from_slice(&(groups.len() as u16).to_le_bytes());
    for group in groups {
        out.extend_from_slice(&(group.len() as u32).to_le_bytes());
        out.extend_from_slice(&group);
    }
}

fn decode_range_proofs(buf: &[u8]) -> Result<(RangeProofBundle, usize), CodecError> {
    let (count, mut offset) = read_u16(buf)?;
    let mut groups = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (len, n) = read_u32(&buf[offset..])?;
        offset += n;
        let bytes = buf.get(offset..offset + len as usize).ok_or(CodecError::UnexpectedEof)?;
        groups.push(bytes.to_vec());
        offset += len as usize;
    }
    Ok((RangeProofBundle::from_group_bytes(groups)?, offset))
}

impl WireEncode for WithdrawalProof {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.version.to_le_bytes());
        self.key_commitment.encode(out);
        self.key_response.encode(out);
        encode_point_pairs(out, &self.chunk_commitments);
        encode_scalar_pairs(out, &self.chunk_responses);
        self.closing_commitment.encode(out);
        encode_range_proofs(out, &self.range_proofs);
    }
}

impl WireDecode for WithdrawalProof {
    fn decode(buf: &[u8]) -> Result<(Self, usize), CodecError> {
        let (version, mut offset) = read_u16(buf)?;
        if version != WITHDRAWAL_PROOF_VERSION {
            return Err(CodecError::UnsupportedVersion);
        }
        let (key_commitment, n) = Point::decode(&buf[offset..])?;
        offset += n;
        let (key_response, n) = Scalar::decode(&buf[offset..])?;
        offset += n;
        let (chunk_commitments, n) = decode_point_pairs(&buf[offset..])?;
        offset += n;
        let (chunk_responses, n) = decode_scalar_pairs(&buf[offset..])?;
        offset += n;
        let (closing_commitment, n) = Point::decode(&buf[offset..])?;
        offset += n;
        let (range_proofs, n) = decode_range_proofs(&buf[offset..])?;
        offset += n;
        Ok((
            WithdrawalProof {
                version,
                key_commitment,
                key_response,
                chunk_commitments,
                chunk_responses,
                closing_commitment,
                range_proofs,
            },
            offset,
        ))
    }
}

impl WireEncode for NormalizationProof {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.version.to_le_bytes());
        self.key_commitment.encode(out);
        self.key_response.encode(out);
        encode_point_pairs(out, &self.chunk_commitments);
        encode_scalar_pairs(out, &self.chunk_responses);
        self.closing_commitment.encode(out);
        encode_range_proofs(out, &self.range_proofs);
    }
}

impl WireDecode for NormalizationProof {
    fn decode(buf: &[u8]) -> Result<(Self, usize), CodecError> {
        let (version, mut offset) = read_u16(buf)?;
        if version != NORMALIZATION_PROOF_VERSION {
            return Err(CodecError::UnsupportedVersion);
        }
        let (key_commitment, n) = Point::decode(&buf[offset..])?;
        offset += n;
        let (key_response, n) = Scalar::decode(&buf[offset..])?;
        offset += n;
        let (chunk_commitments, n) = decode_point_pairs(&buf[offset..])?;
        offset += n;
        let (chunk_responses, n) = decode_scalar_pairs(&buf[offset..])?;
        offset += n;
        let (closing_commitment, n) = Point::decode(&buf[offset..])?;
        offset += n;
        let (range_proofs, n) = decode_range_proofs(&buf[offset..])?;
        offset += n;
        Ok((
            NormalizationProof {
                version,
                key_commitment,
                key_response,
                chunk_commitments,
                chunk_responses,
                closing_commitment,
                range_proofs,
            },
            offset,
        ))
    }
}

impl WireEncode for RotationProof {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.version.to_le_bytes());
        self.old_key_commitment.encode(out);
        self.old_key_response.encode(out);
        self.new_key_commitment.encode(out);
        self.new_key_response.encode(out);
        encode_point_pairs(out, &self.chunk_commitments);
        encode_scalar_pairs(out, &self.chunk_responses);
        self.closing_commitment.encode(out);
        encode_range_proofs(out, &self.range_proofs);
    }
}

impl WireDecode for RotationProof {
    fn decode(buf: &[u8]) -> Result<(Self, usize), CodecError> {
        let (version, mut offset) = read_u16(buf)?;
        if version != ROTATION_PROOF_VERSION {
            return Err(CodecError::UnsupportedVersion);
        }
        let (old_key_commitment, n) = Point::decode(&buf[offset..])?;
        offset += n;
        let (old_key_response, n) = Scalar::decode(&buf[offset..])?;
        offset += n;
        let (new_key_commitment, n) = Point::decode(&buf[offset..])?;
        offset += n;
        let (new_key_response, n) = Scalar::decode(&buf[offset..])?;
        offset += n;
        let (chunk_commitments, n) = decode_point_pairs(&buf[offset..])?;
        offset += n;
        let (chunk_responses, n) = decode_scalar_pairs(&buf[offset..])?;
        offset += n;
        let (closing_commitment, n) = Point::decode(&buf[offset..])?;
        offset += n;
        let (range_proofs, n) = decode_range_proofs(&buf[offset..])?;
        offset += n;
        Ok((
            RotationProof {
                version,
                old_key_commitment,
                old_key_response,
                new_key_commitment,
                new_key_response,
                chunk_commitments,
                chunk_responses,
                closing_commitment,
                range_proofs,
            },
            offset,
        ))
    }
}

impl WireEncode for TransferProof {
    /// Auditor count is absent-as-zero: no auditors encodes a bare 1-byte
    /// `0` with no further auditor bytes (`spec.md` §9, first open
    /// question — the "absent vs present-but-length-zero" ambiguity is
    /// resolved here in favor of a single canonical zero-count form).
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.version.to_le_bytes());
        self.key_commitment.encode(out);
        self.key_response.encode(out);
        encode_scalars(out, &self.value_responses);
        encode_point_pairs(out, &self.recipient_commitments);
        encode_scalars(out, &self.recipient_rand_responses);
        out.push(self.auditor_commitments.len() as u8);
        for (commitments, responses) in self.auditor_commitments.iter().zip(self.auditor_rand_responses.iter()) {
            encode_point_pairs(out, commitments);
            encode_scalars(out, responses);
        }
        encode_point_pairs(out, &self.sender_commitments);
        encode_scalar_pairs(out, &self.sender_responses);
        self.closing_commitment.encode(out);
        encode_range_proofs(out, &self.range_proofs);
    }
}

impl WireDecode for TransferProof {
    fn decode(buf: &[u8]) -> Result<(Self, usize), CodecError> {
        let (version, mut offset) = read_u16(buf)?;
        if version != TRANSFER_PROOF_VERSION {
            return Err(CodecError::UnsupportedVersion);
        }
        let (key_commitment, n) = Point::decode(&buf[offset..])?;
        offset += n;
        let (key_response, n) = Scalar::decode(&buf[offset..])?;
        offset += n;
        let (value_responses, n) = decode_scalars(&buf[offset..])?;
        offset += n;
        let (recipient_commitments, n) = decode_point_pairs(&buf[offset..])?;
        offset += n;
        let (recipient_rand_responses, n) = decode_scalars(&buf[offset..])?;
        offset += n;
        let auditor_count = *buf.get(offset).ok_or(CodecError::UnexpectedEof)?;
        offset += 1;
        let mut auditor_commitments = Vec::with_capacity(auditor_count as usize);
        let mut auditor_rand_responses = Vec::with_capacity(auditor_count as usize);
        for _ in 0..auditor_count {
            let (commitments, n) = decode_point_pairs(&buf[offset..])?;
            offset += n;
            let (responses, n) = decode_scalars(&buf[offset..])?;
            offset += n;
            auditor_commitments.push(commitments);
            auditor_rand_responses.push(responses);
        }
        let (sender_commitments, n) = decode_point_pairs(&buf[offset..])?;
        offset += n;
        let (sender_responses, n) = decode_scalar_pairs(&buf[offset..])?;
        offset += n;
        let (closing_commitment, n) = Point::decode(&buf[offset..])?;
        offset += n;
        let (range_proofs, n) = decode_range_proofs(&buf[offset..])?;
        offset += n;
        Ok((
            TransferProof {
                version,
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
            offset,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confidential_ciphertext::{ChunkedCiphertext, DecryptionKey};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn withdrawal_proof_round_trips() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let dk = DecryptionKey::generate(&mut rng);
        let key = dk.encryption_key();
        let old = ChunkedCiphertext::encrypt(1_000, &key, &mut rng);
        let new_chunks: [(u64, Scalar); CHUNK_COUNT] =
            std::array::from_fn(|i| ((((500u128) >> (16 * i)) & 0xffff) as u64, Scalar::random(&mut rng)));
        let (proof, _new_ct) =
            confidential_proofs::prove_withdrawal(b"a", b"t", &key, &dk, &old, 500, &new_chunks, &mut rng).unwrap();

        let mut bytes = Vec::new();
        proof.encode(&mut bytes);
        let (decoded, n) = WithdrawalProof::decode(&bytes).unwrap();
        assert_eq!(n, bytes.len());
        assert_eq!(decoded.version, proof.version);
        assert_eq!(decoded.key_commitment, proof.key_commitment);
    }

    #[test]
    fn rejects_unsupported_version_on_decode() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let dk = DecryptionKey::generate(&mut rng);
        let key = dk.encryption_key();
        let old = ChunkedCiphertext::encrypt(10, &key, &mut rng);
        let new_chunks: [(u64, Scalar); CHUNK_COUNT] = std::array::from_fn(|_| (0, Scalar::random(&mut rng)));
        let (proof, _) =
            confidential_proofs::prove_withdrawal(b"a", b"t", &key, &dk, &old, 10, &new_chunks, &mut rng).unwrap();
        let mut bytes = Vec::new();
        proof.encode(&mut bytes);
        bytes[0] = 0xff;
        bytes[1] = 0xff;
        assert!(matches!(WithdrawalProof::decode(&bytes), Err(CodecError::UnsupportedVersion)));
    }

    #[test]
    fn transfer_proof_round_trips_with_auditors() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let sender_dk = DecryptionKey::generate(&mut rng);
        let sender_key = sender_dk.encryption_key();
        let recipient_key = DecryptionKey::generate(&mut rng).encryption_key();
        let auditor_keys = [DecryptionKey::generate(&mut rng).encryption_key()];

        let old = ChunkedCiphertext::encrypt(10_000, &sender_key, &mut rng);
        let value_chunks: [u64; CHUNK_COUNT] = std::array::from_fn(|i| (((2_000u128) >> (16 * i)) & 0xffff) as u64);
        let recipient_randomness: [Scalar; CHUNK_COUNT] = std::array::from_fn(|_| Scalar::random(&mut rng));
        let auditor_randomness = [std::array::from_fn(|_| Scalar::random(&mut rng))];
        let sender_new_chunks: [(u64, Scalar); CHUNK_COUNT] =
            std::array::from_fn(|i| ((((8_000u128) >> (16 * i)) & 0xffff) as u64, Scalar::random(&mut rng)));

        let (proof, ..) = confidential_proofs::prove_transfer(
            b"a",
            b"t",
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

        let mut bytes = Vec::new();
        proof.encode(&mut bytes);
        let (decoded, n) = TransferProof::decode(&bytes).unwrap();
        assert_eq!(n, bytes.len());
        assert_eq!(decoded.auditor_commitments.len(), 1);
    }
}
