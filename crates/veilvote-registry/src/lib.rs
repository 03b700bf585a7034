//! VeilVote Registry
//!
//! The per-owner encrypted-vote registry: a durable mapping from owner
//! identity to that owner's current ciphertext handle, writable only through
//! a proof gate. The registry never sees plaintext; it stores opaque handles
//! and delegates proof verification to the cryptographic backend.

pub mod registry;
pub mod store;

pub use registry::{ProofVerifier, VoteRegistry};
pub use store::{HandleStore, InMemoryHandleStore};
