use thiserror::Error;

/// Errors raised by the group arithmetic adapter.
///
/// This is the narrowest error type in the workspace: every higher-level
/// crate (`confidential-ciphertext`, `confidential-proofs`,
/// `confidential-codec`, `confidential-client`) wraps it rather than
/// redefining "bad bytes" on its own.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// Bytes did not decode to a canonical scalar (`s >= ell`) or point
    /// (non-canonical compressed encoding, or identity where forbidden).
    #[error("invalid encoding")]
    InvalidEncoding,
}
