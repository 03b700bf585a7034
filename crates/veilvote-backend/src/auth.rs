//! Decryption authorization artifact
//!
//! An owner-signed, time-bounded credential permitting the backend to reveal
//! the plaintext behind specific handles to that owner. The signature covers
//! a canonical payload over (owner, registry instance, sorted handle set,
//! expiry); the artifact is reusable for any covered handle until it expires
//! and is never silently extended.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use veilvote_runtime::{CiphertextHandle, OwnerAddress, RegistryId};

/// Domain separation tag for authorization payloads.
const AUTH_DOMAIN: &[u8] = b"veilvote/decrypt-auth/v1";

/// Owner-signed credential authorizing decryption of a bound handle set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecryptionAuthorization {
    owner: OwnerAddress,
    registry: RegistryId,
    handles: BTreeSet<CiphertextHandle>,
    expires_at: u64,
    signature: Vec<u8>,
}

impl DecryptionAuthorization {
    pub fn new(
        owner: OwnerAddress,
        registry: RegistryId,
        handles: BTreeSet<CiphertextHandle>,
        expires_at: u64,
        signature: Vec<u8>,
    ) -> Self {
        Self { owner, registry, handles, expires_at, signature }
    }

    pub fn owner(&self) -> OwnerAddress {
        self.owner
    }

    pub fn registry(&self) -> RegistryId {
        self.registry
    }

    pub fn handles(&self) -> &BTreeSet<CiphertextHandle> {
        &self.handles
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// True when `handle` is a member of the bound set.
    pub fn covers(&self, handle: &CiphertextHandle) -> bool {
        self.handles.contains(handle)
    }

    pub fn is_expired(&self, now_unix: u64) -> bool {
        now_unix >= self.expires_at
    }

    /// Canonical byte payload the owner signs. Handle order is fixed by the
    /// sorted set, so signer and verifier always reconstruct identical bytes.
    pub fn payload_for(
        owner: OwnerAddress,
        registry: RegistryId,
        handles: &BTreeSet<CiphertextHandle>,
        expires_at: u64,
    ) -> Vec<u8> {
        let mut payload =
            Vec::with_capacity(AUTH_DOMAIN.len() + 20 + 20 + 8 + handles.len() * 32);
        payload.extend_from_slice(AUTH_DOMAIN);
        payload.extend_from_slice(owner.as_bytes());
        payload.extend_from_slice(registry.as_bytes());
        payload.extend_from_slice(&expires_at.to_be_bytes());
        for handle in handles {
            payload.extend_from_slice(handle.as_bytes());
        }
        payload
    }

    /// The payload this authorization's signature must verify against.
    pub fn signing_payload(&self) -> Vec<u8> {
        Self::payload_for(self.owner, self.registry, &self.handles, self.expires_at)
    }
}
