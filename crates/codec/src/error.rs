use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid encoding")]
    InvalidEncoding,
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("buffer too short")]
    UnexpectedEof,
}

impl From<confidential_core::CoreError> for CodecError {
    fn from(_: confidential_core::CoreError) -> Self {
        CodecError::InvalidEncoding
    }
}
impl From<confidential_ciphertext::CipherError> for CodecError {
    fn from(_: confidential_ciphertext::CipherError) -> Self {
        CodecError::InvalidEncoding
    }
}
impl From<confidential_proofs::ProofError> for CodecError {
    fn from(_: confidential_proofs::ProofError) -> Self {
        CodecError::InvalidEncoding
    }
}
