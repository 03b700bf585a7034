//! VeilVote Client
//!
//! Off-chain side of the encrypted-vote protocol: the encryption request
//! builder that turns a plaintext choice into an admissible (handle, proof)
//! pair, and the decryption authorization protocol that lets an owner, and
//! only that owner, recover the plaintext behind their stored handle.

pub mod decrypt;
pub mod encrypt;
pub mod session;

pub use decrypt::{authorize, decrypt, AuthorizationStore, DecryptedCache};
pub use encrypt::{build_encrypted_input, EncryptionRequestBuilder};
pub use session::{VoterSession, DEFAULT_AUTH_TTL_SECS};
