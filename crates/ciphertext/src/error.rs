use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid encoding")]
    InvalidEncoding,

    /// The decrypted plaintext does not fit the claimed bit range.
    #[error("amount out of range")]
    AmountOutOfRange,

    /// The discrete-log search found no match for chunk `0`.
    #[error("chunk decrypt failed at index {0}")]
    ChunkDecryptFailed(u8),
}

impl From<confidential_core::CoreError> for CipherError {
    fn from(_: confidential_core::CoreError) -> Self {
        CipherError::InvalidEncoding
    }
}
