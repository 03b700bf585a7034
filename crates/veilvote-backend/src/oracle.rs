//! Oracle traits at the cryptographic-backend boundary
//!
//! The registry core treats the homomorphic cryptosystem as an oracle: it
//! encrypts, verifies input proofs and re-encrypts toward an owner, and the
//! core only knows the binding semantics of the values it passes through.
//! Transport failures must surface as `VoteError::BackendUnavailable` so
//! callers can distinguish them from semantic rejections.

use std::time::{SystemTime, UNIX_EPOCH};

use veilvote_runtime::{
    CiphertextHandle, EncryptedInput, FheUintWidth, InputProof, OwnerAddress, RegistryId, Result,
};

use crate::auth::DecryptionAuthorization;

/// The three primitives the core consumes from the cryptographic backend.
pub trait FheOracle {
    /// Encrypts `value` at the declared width, binding the resulting handle
    /// and proof to `(registry, owner)`. Expensive; callers must not hold any
    /// shared-state lock across this call.
    fn encrypt(
        &self,
        registry: RegistryId,
        owner: OwnerAddress,
        value: u64,
        width: FheUintWidth,
    ) -> Result<EncryptedInput>;

    /// Checks that `proof` binds `handle` to exactly `(submitter, registry)`.
    /// A structurally valid proof for a different owner or registry instance
    /// yields `Ok(false)`.
    fn verify_proof(
        &self,
        handle: &CiphertextHandle,
        proof: &InputProof,
        submitter: OwnerAddress,
        registry: RegistryId,
    ) -> Result<bool>;

    /// Reveals the plaintext behind `handle` to the owner named in
    /// `authorization`, or fails with `VoteError::DecryptionRejected`.
    fn reencrypt_for_owner(
        &self,
        handle: &CiphertextHandle,
        authorization: &DecryptionAuthorization,
    ) -> Result<u64>;
}

/// Capability to sign decryption-authorization payloads with the owner's own
/// key. Supplied by the identity/session collaborator; the core never
/// fabricates an identity.
pub trait AuthorizationSigner {
    fn owner(&self) -> OwnerAddress;

    /// Signs an authorization payload, or fails with
    /// `VoteError::AuthorizationDeclined` if the owner abandons the prompt.
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>>;
}

/// Time source for authorization validity windows, in unix seconds.
pub trait Clock {
    fn now_unix(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Fixed time source for tests; expiry is exercised by advancing it
/// explicitly instead of sleeping.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_unix(&self) -> u64 {
        self.0
    }
}

impl<T: FheOracle + ?Sized> FheOracle for &T {
    fn encrypt(
        &self,
        registry: RegistryId,
        owner: OwnerAddress,
        value: u64,
        width: FheUintWidth,
    ) -> Result<EncryptedInput> {
        (**self).encrypt(registry, owner, value, width)
    }

    fn verify_proof(
        &self,
        handle: &CiphertextHandle,
        proof: &InputProof,
        submitter: OwnerAddress,
        registry: RegistryId,
    ) -> Result<bool> {
        (**self).verify_proof(handle, proof, submitter, registry)
    }

    fn reencrypt_for_owner(
        &self,
        handle: &CiphertextHandle,
        authorization: &DecryptionAuthorization,
    ) -> Result<u64> {
        (**self).reencrypt_for_owner(handle, authorization)
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_unix(&self) -> u64 {
        (**self).now_unix()
    }
}
