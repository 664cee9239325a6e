use std::sync::OnceLock;

use bulletproofs::{BulletproofGens, PedersenGens, RangeProof};
use confidential_core::{Point, Scalar};
use curve25519_dalek_ng as dalek_ng;
use merlin::Transcript as MerlinTranscript;

use crate::error::ProofError;

/// Bit length every chunk in this workspace is range-proved against.
pub const CHUNK_BITS: usize = 16;

/// Maximum number of chunk commitments aggregated into a single Bulletproofs
/// instance. `spec.md` §4.5 expects batches up to 16 during transfers.
const MAX_AGGREGATION: usize = 16;

static GENS: OnceLock<BulletproofGens> = OnceLock::new();

fn bulletproof_gens() -> &'static BulletproofGens {
    GENS.get_or_init(|| BulletproofGens::new(CHUNK_BITS, MAX_AGGREGATION))
}

/// Converts our `Point` (compressed-Ristretto round trip) into the
/// `curve25519-dalek-ng` type `bulletproofs` 4.x is built against.
fn to_ng_point(p: Point) -> dalek_ng::ristretto::RistrettoPoint {
    dalek_ng::ristretto::CompressedRistretto(p.to_bytes())
        .decompress()
        .expect("Point invariants already guarantee a canonical, decompressible encoding")
}

fn to_ng_compressed(p: &Point) -> dalek_ng::ristretto::CompressedRistretto {
    dalek_ng::ristretto::CompressedRistretto(p.to_bytes())
}

fn to_ng_scalar(s: Scalar) -> dalek_ng::scalar::Scalar {
    dalek_ng::scalar::Scalar::from_bytes_mod_order(s.to_bytes())
}

/// Pedersen generators shared with the ciphertext commitment scheme: `B =
/// G0`, `B_blinding = H`. A chunk's own ciphertext commitment `C_i = m_i*G0 +
/// r_i*H` is therefore exactly the Pedersen commitment the range proof
/// verifies against — no separate commitment needs to be carried.
fn pedersen_gens_ng() -> PedersenGens {
    PedersenGens {
        B: to_ng_point(Point::basepoint()),
        B_blinding: to_ng_point(Point::h_generator()),
    }
}

/// Splits `count` commitments into Bulletproofs aggregation groups: greedily
/// the largest power of two not exceeding `MAX_AGGREGATION`, repeated until
/// exhausted (e.g. 17 -> `[16, 1]`, 9 -> `[8, 1]`).
fn group_sizes(mut count: usize) -> Vec<usize> {
    let mut groups = Vec::new();
    while count > 0 {
        let mut size = 1usize;
        while size * 2 <= count.min(MAX_AGGREGATION) {
            size *= 2;
        }
        groups.push(size);
        count -= size;
    }
    groups
}

fn transcript_for(label: &'static [u8], context: &[u8], group_size: usize) -> MerlinTranscript {
    let mut t = MerlinTranscript::new(b"CA-RANGE-v1");
    t.append_message(b"label", label);
    t.append_message(b"ctx", context);
    t.append_message(b"group_size", &(group_size as u64).to_le_bytes());
    t
}

/// One or more Bulletproofs range proofs covering a list of chunk
/// commitments, grouped per [`group_sizes`].
#[derive(Clone)]
pub struct RangeProofBundle {
    proofs: Vec<RangeProof>,
}

impl RangeProofBundle {
    /// Proves every `(value, blinding)` pair lies in `[0, 2^CHUNK_BITS)`.
    /// `label`/`context` bind the proof to its call site (withdrawal,
    /// transfer, etc.) the same way the teacher's `prove_range_u64` folds a
    /// call-site label into its transcript.
    pub fn prove(
        label: &'static [u8],
        context: &[u8],
        values: &[u64],
        blindings: &[Scalar],
    ) -> Result<Self, ProofError> {
        debug_assert_eq!(values.len(), blindings.len());
        let gens = bulletproof_gens();
        let pg = pedersen_gens_ng();
        let mut proofs = Vec::new();
        let mut offset = 0;
        for size in group_sizes(values.len()) {
            let mut t = transcript_for(label, context, size);
            let group_values = &values[offset..offset + size];
            let group_blinds: Vec<dalek_ng::scalar::Scalar> =
                blindings[offset..offset + size].iter().copied().map(to_ng_scalar).collect();
            let proof = if size == 1 {
                RangeProof::prove_single(gens, &pg, &mut t, group_values[0], &group_blinds[0], CHUNK_BITS)
                    .map_err(|_| ProofError::RangeProofFailed)?
                    .0
            } else {
                RangeProof::prove_multiple(gens, &pg, &mut t, group_values, &group_blinds, CHUNK_BITS)
                    .map_err(|_| ProofError::RangeProofFailed)?
                    .0
            };
            proofs.push(proof);
            offset += size;
        }
        Ok(RangeProofBundle { proofs })
    }

    /// Verifies every commitment's claimed chunk fits `[0, 2^CHUNK_BITS)`.
    pub fn verify(&self, label: &'static [u8], context: &[u8], commitments: &[Point]) -> Result<(), ProofError> {
        let groups = group_sizes(commitments.len());
        if groups.len() != self.proofs.len() {
            return Err(ProofError::RangeProofFailed);
        }
        let gens = bulletproof_gens();
        let pg = pedersen_gens_ng();
        let mut offset = 0;
        for (size, proof) in groups.into_iter().zip(self.proofs.iter()) {
            let mut t = transcript_for(label, context, size);
            let group_commitments: Vec<_> = commitments[offset..offset + size].iter().map(to_ng_compressed).collect();
            if size == 1 {
                proof
                    .verify_single(gens, &pg, &mut t, &group_commitments[0], CHUNK_BITS)
                    .map_err(|_| ProofError::RangeProofFailed)?;
            } else {
                proof
                    .verify_multiple(gens, &pg, &mut t, &group_commitments, CHUNK_BITS)
                    .map_err(|_| ProofError::RangeProofFailed)?;
            }
            offset += size;
        }
        Ok(())
    }

    /// Serializes each group's proof bytes, in group order. The wire codec
    /// length-prefixes each entry individually (`spec.md` §6.1).
    pub fn to_group_bytes(&self) -> Vec<Vec<u8>> {
        self.proofs.iter().map(|p| p.to_bytes()).collect()
    }

    pub fn from_group_bytes(group_bytes: Vec<Vec<u8>>) -> Result<Self, ProofError> {
        let proofs = group_bytes
            .iter()
            .map(|bytes| RangeProof::from_bytes(bytes).map_err(|_| ProofError::InvalidEncoding))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RangeProofBundle { proofs })
    }

    /// Number of range-proof groups a batch of `count` commitments splits
    /// into; callers decoding from the wire use this to know how many
    /// length-prefixed segments to read.
    pub fn group_count(count: usize) -> usize {
        group_sizes(count).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confidential_core::Scalar;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn proves_and_verifies_a_single_chunk() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let blinding = Scalar::random(&mut rng);
        let commitment = Point::basepoint() * Scalar::from_u64(7) + Point::h_generator() * blinding;
        let bundle = RangeProofBundle::prove(b"test", b"ctx", &[7], &[blinding]).unwrap();
        bundle.verify(b"test", b"ctx", &[commitment]).unwrap();
    }

    #[test]
    fn proves_and_verifies_an_aggregated_batch() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let values = [1u64, 2, 3, 4, 5, 6, 7, 8];
        let blindings: Vec<Scalar> = (0..8).map(|_| Scalar::random(&mut rng)).collect();
        let commitments: Vec<Point> = values
            .iter()
            .zip(blindings.iter())
            .map(|(v, b)| Point::basepoint() * Scalar::from_u64(*v) + Point::h_generator() * *b)
            .collect();
        let bundle = RangeProofBundle::prove(b"test", b"ctx", &values, &blindings).unwrap();
        bundle.verify(b"test", b"ctx", &commitments).unwrap();
    }

    #[test]
    fn rejects_a_value_out_of_range() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let blinding = Scalar::random(&mut rng);
        // 2^16 does not fit in 16 bits.
        let bad_commitment = Point::basepoint() * Scalar::from_u64(1 << 16) + Point::h_generator() * blinding;
        let result = RangeProofBundle::prove(b"test", b"ctx", &[1u64 << 16], &[blinding]);
        match result {
            Err(_) => {}
            Ok(bundle) => assert!(bundle.verify(b"test", b"ctx", &[bad_commitment]).is_err()),
        }
    }

    #[test]
    fn wire_round_trip() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let blinding = Scalar::random(&mut rng);
        let bundle = RangeProofBundle::prove(b"test", b"ctx", &[99], &[blinding]).unwrap();
        let bytes = bundle.to_group_bytes();
        let restored = RangeProofBundle::from_group_bytes(bytes).unwrap();
        let commitment = Point::basepoint() * Scalar::from_u64(99) + Point::h_generator() * blinding;
        restored.verify(b"test", b"ctx", &[commitment]).unwrap();
    }
}
