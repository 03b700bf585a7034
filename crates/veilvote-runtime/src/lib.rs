//! VeilVote Runtime
//!
//! Shared core types for the VeilVote encrypted-vote registry. This crate
//! defines the opaque identifiers exchanged between the registry, the
//! encryption request builder and the decryption authorization protocol,
//! together with the error taxonomy used across all VeilVote components.

pub mod error;
pub mod types;

// Re-export core types for convenience
pub use error::{Result, VoteError};
pub use types::{
    CiphertextHandle, EncryptedInput, FheUintWidth, InputProof, OwnerAddress, RegistryId,
};
