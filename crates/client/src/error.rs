use thiserror::Error;

/// The exhaustive client-facing error taxonomy (`spec.md` §7).
///
/// Every orchestrator entrypoint returns `Result<_, ClientError>` directly
/// rather than a class hierarchy: callers match on the variant, not on a
/// `downcast` chain.
#[derive(Debug, Error, Clone)]
pub enum ClientError {
    #[error("invalid encoding")]
    InvalidEncoding,
    #[error("unsupported proof version")]
    UnsupportedVersion,
    #[error("amount out of range")]
    AmountOutOfRange,
    #[error("chunk decrypt failed at index {0}")]
    ChunkDecryptFailed(u8),
    #[error("insufficient balance")]
    InsufficientBalance,
    /// Chain state changed between fetch and submit, or (by extension) the
    /// expected on-chain record does not exist yet for an operation other
    /// than `register` — `spec.md` §7's taxonomy has no dedicated
    /// "not registered" kind, so an unregistered pair is treated as a
    /// staleness condition against the caller's assumed state.
    #[error("chain state changed since last fetch")]
    StaleState,
    #[error("account is frozen for key rotation")]
    FrozenAccount,
    #[error("balance must be normalized before this operation")]
    Unnormalized,
    #[error("locally built proof failed its own verification")]
    ProofFailed,
    #[error("rpc error: {0}")]
    RpcError(#[from] RpcError),
    #[error("sequence number conflict on submit")]
    DuplicateSubmission,
    #[error("operation cancelled")]
    Cancelled,
}

impl From<confidential_core::CoreError> for ClientError {
    fn from(_: confidential_core::CoreError) -> Self {
        ClientError::InvalidEncoding
    }
}

impl From<confidential_ciphertext::CipherError> for ClientError {
    fn from(e: confidential_ciphertext::CipherError) -> Self {
        match e {
            confidential_ciphertext::CipherError::AmountOutOfRange => ClientError::AmountOutOfRange,
            confidential_ciphertext::CipherError::ChunkDecryptFailed(i) => ClientError::ChunkDecryptFailed(i),
            confidential_ciphertext::CipherError::InvalidEncoding => ClientError::InvalidEncoding,
        }
    }
}

impl From<confidential_proofs::ProofError> for ClientError {
    fn from(_: confidential_proofs::ProofError) -> Self {
        ClientError::ProofFailed
    }
}

impl From<confidential_codec::CodecError> for ClientError {
    fn from(e: confidential_codec::CodecError) -> Self {
        match e {
            confidential_codec::CodecError::UnsupportedVersion => ClientError::UnsupportedVersion,
            _ => ClientError::InvalidEncoding,
        }
    }
}

/// Transport-layer failure from the `AccountRpc`/`Submitter` collaborators.
/// Retried automatically by the orchestrator; see `retry`.
#[derive(Debug, Error, Clone)]
pub enum RpcError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("sequence number conflict")]
    SequenceConflict,
}
