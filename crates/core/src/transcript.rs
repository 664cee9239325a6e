use curve25519_dalek::scalar::Scalar as DalekScalar;
use merlin::Transcript as MerlinTranscript;

use crate::point::Point;
use crate::scalar::Scalar;

/// The Fiat-Shamir transcript shared by every Sigma protocol in this
/// workspace.
///
/// Wraps `merlin::Transcript` (the same STROBE-based transcript the
/// Bulletproofs range-proof adapter uses) so that every proof module
/// absorbs labeled domain tags, public inputs, and prover commitments the
/// same way, and so the challenge is always derived by
/// `hashToScalar`-equivalent wide reduction rather than a raw 32-byte
/// squeeze.
#[derive(Clone)]
pub struct ProofTranscript(MerlinTranscript);

impl ProofTranscript {
    /// Starts a transcript under one of the fixed domain tags in
    /// `spec.md` §4.4.5 (`"CA-SIGMA-WITHDRAW-v1"` etc).
    pub fn new(domain_tag: &'static [u8]) -> Self {
        ProofTranscript(MerlinTranscript::new(domain_tag))
    }

    pub fn append_message(&mut self, label: &'static [u8], bytes: &[u8]) {
        self.0.append_message(label, bytes);
    }

    pub fn append_point(&mut self, label: &'static [u8], point: &Point) {
        self.0.append_message(label, &point.to_bytes());
    }

    pub fn append_points(&mut self, label: &'static [u8], points: &[Point]) {
        for p in points {
            self.append_point(label, p);
        }
    }

    pub fn append_u64(&mut self, label: &'static [u8], value: u64) {
        self.0.append_message(label, &value.to_le_bytes());
    }

    pub fn append_bytes32(&mut self, label: &'static [u8], bytes: &[u8; 32]) {
        self.0.append_message(label, bytes);
    }

    /// Derives the Fiat-Shamir challenge scalar, squeezing 64 bytes and
    /// reducing modulo `ell` for full-entropy coverage of the scalar field.
    pub fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar {
        let mut wide = [0u8; 64];
        self.0.challenge_bytes(label, &mut wide);
        Scalar::from(DalekScalar::from_bytes_mod_order_wide(&wide))
    }

    /// Squeezes 32 raw bytes, used to derive an external context binding
    /// (e.g. the bytes a range proof folds into its own transcript) without
    /// advancing the caller's transcript past that point twice.
    pub fn challenge_bytes32(&mut self, label: &'static [u8]) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.0.challenge_bytes(label, &mut out);
        out
    }

    /// Raw access for the range-proof adapter, which needs to hand a
    /// `merlin::Transcript` straight to `bulletproofs::RangeProof`.
    pub fn as_merlin_mut(&mut self) -> &mut MerlinTranscript {
        &mut self.0
    }
}
