use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProofError {
    #[error("invalid encoding")]
    InvalidEncoding,

    #[error("amount out of range")]
    AmountOutOfRange,

    /// A range-proof batch failed to generate or to verify.
    #[error("range proof failed")]
    RangeProofFailed,

    /// A Sigma equation's response check failed.
    #[error("sigma proof verification failed")]
    SigmaVerificationFailed,
}

impl From<confidential_core::CoreError> for ProofError {
    fn from(_: confidential_core::CoreError) -> Self {
        ProofError::InvalidEncoding
    }
}

impl From<confidential_ciphertext::CipherError> for ProofError {
    fn from(e: confidential_ciphertext::CipherError) -> Self {
        match e {
            confidential_ciphertext::CipherError::AmountOutOfRange => ProofError::AmountOutOfRange,
            _ => ProofError::InvalidEncoding,
        }
    }
}
