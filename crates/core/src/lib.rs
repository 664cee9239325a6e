//! Group arithmetic adapter for the confidential asset cryptographic core.
//!
//! Wraps `curve25519-dalek`'s Ristretto255 group and scalar field behind
//! [`Scalar`] and [`Point`] newtypes, plus the shared Fiat-Shamir
//! [`ProofTranscript`] every Sigma protocol in `confidential-proofs` builds
//! on. Nothing above this crate should reach into `curve25519-dalek`
//! directly.

mod error;
mod point;
mod scalar;
mod transcript;

pub use error::CoreError;
pub use point::Point;
pub use scalar::Scalar;
pub use transcript::ProofTranscript;

/// Domain tags shared by every Sigma protocol (`spec.md` §4.4.5).
pub mod labels {
    pub const SIGMA_WITHDRAW_V1: &[u8] = b"CA-SIGMA-WITHDRAW-v1";
    pub const SIGMA_TRANSFER_V1: &[u8] = b"CA-SIGMA-TRANSFER-v1";
    pub const SIGMA_NORM_V1: &[u8] = b"CA-SIGMA-NORM-v1";
    pub const SIGMA_ROTATE_V1: &[u8] = b"CA-SIGMA-ROTATE-v1";

    /// Domain-separation string hashed to derive the decryption key from an
    /// externally supplied signature (`spec.md` §3).
    pub const DECRYPTION_KEY_CLAIM: &[u8] =
        b"CONFIDENTIAL_ASSET__TWISTED_ED25519_PRIVATE_KEY_CLAIM";
}
