//! Sigma-proof engine and Bulletproofs range-proof adapter for confidential
//! asset operations.
//!
//! Every proof in this crate composes the same small set of primitives in
//! `sigma`: a Schnorr proof of key knowledge, a Schnorr proof that a
//! ciphertext chunk opens to a claimed `(value, randomness)` pair, and a
//! "closing" linear equation that ties a prover's claimed new ciphertext
//! back to an old ciphertext whose randomness the prover may never have
//! held (chunks can arrive homomorphically via deposits or rollovers).

mod error;
mod normalize;
mod range;
mod rotate;
mod sigma;
mod transfer;
mod withdraw;

pub use error::ProofError;
pub use normalize::{prove as prove_normalization, verify as verify_normalization};
pub use normalize::{NormalizationProof, NORMALIZATION_PROOF_VERSION};
pub use range::{RangeProofBundle, CHUNK_BITS};
pub use rotate::{prove as prove_rotation, verify as verify_rotation};
pub use rotate::{RotationProof, ROTATION_PROOF_VERSION};
pub use transfer::{prove as prove_transfer, verify as verify_transfer};
pub use transfer::{TransferProof, TRANSFER_PROOF_VERSION};
pub use withdraw::{prove as prove_withdrawal, verify as verify_withdrawal};
pub use withdraw::{WithdrawalProof, WITHDRAWAL_PROOF_VERSION};
