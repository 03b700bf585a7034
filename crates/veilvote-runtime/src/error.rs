//! Error taxonomy for VeilVote operations

use thiserror::Error;

/// Result type alias for VeilVote operations
pub type Result<T> = std::result::Result<T, VoteError>;

/// Main error type for the registry and its client protocol.
///
/// Every failure names the precondition or verification that failed, so the
/// presentation layer can decide whether to retry, re-encode, or prompt the
/// owner again. Only the transport-level variants are sensible to retry
/// blindly; see [`VoteError::is_retriable`].
#[derive(Debug, Error)]
pub enum VoteError {
    /// Plaintext does not fit in the declared bit width
    #[error("Value {value} does not fit in {bits}-bit encrypted integer")]
    EncodingRange { value: u64, bits: u32 },

    /// Input proof failed verification against (handle, submitter, registry)
    #[error("Invalid input proof: {0}")]
    InvalidProof(String),

    /// Decryption authorization past its validity window
    #[error("Decryption authorization expired at {expired_at}")]
    AuthorizationExpired { expired_at: u64 },

    /// Owner abandoned the authorization signature
    #[error("Decryption authorization declined by owner")]
    AuthorizationDeclined,

    /// Requested handle not covered by the presented authorization
    #[error("Handle not covered by authorization: {0}")]
    HandleNotAuthorized(String),

    /// Cryptographic backend refused to reveal the plaintext
    #[error("Decryption rejected by backend: {0}")]
    DecryptionRejected(String),

    /// Transport-level backend failure, retriable
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Another flow is already in flight for this client session
    #[error("Session busy: another request is already in flight")]
    SessionBusy,

    /// Ledger/storage collaborator failure
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Other errors not covered by specific variants
    #[error("{0}")]
    Other(String),
}

impl VoteError {
    pub fn invalid_proof(msg: impl Into<String>) -> Self {
        Self::InvalidProof(msg.into())
    }

    pub fn handle_not_authorized(msg: impl Into<String>) -> Self {
        Self::HandleNotAuthorized(msg.into())
    }

    pub fn decryption_rejected(msg: impl Into<String>) -> Self {
        Self::DecryptionRejected(msg.into())
    }

    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    pub fn ledger(msg: impl Into<String>) -> Self {
        Self::Ledger(msg.into())
    }

    pub fn serialization_error(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// True for transport-level failures that may be retried as-is. Semantic
    /// rejections (bad proof, expired authorization, unauthorized handle)
    /// require the caller to rebuild its input first.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::IoError(_))
    }
}
