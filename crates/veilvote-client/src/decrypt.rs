//! Decryption authorization protocol
//!
//! Lets an owner recover the plaintext behind their own stored handle, and
//! only their own. The sole gate is the owner's signature over the
//! authorization payload; the registry performs no additional check, trusting
//! the backend to enforce that only the owner's key unlocks the owner's
//! ciphertext.

use std::collections::{BTreeSet, HashMap};

use veilvote_backend::{AuthorizationSigner, Clock, DecryptionAuthorization, FheOracle};
use veilvote_runtime::{CiphertextHandle, OwnerAddress, RegistryId, Result, VoteError};

/// Produces a signed authorization over `(owner, registry, handles, window)`.
///
/// A declined signature surfaces as `VoteError::AuthorizationDeclined` and
/// leaves no residual state; nothing is cached until a decryption succeeds.
pub fn authorize(
    signer: &impl AuthorizationSigner,
    clock: &impl Clock,
    registry: RegistryId,
    handles: impl IntoIterator<Item = CiphertextHandle>,
    ttl_secs: u64,
) -> Result<DecryptionAuthorization> {
    let owner = signer.owner();
    let handles: BTreeSet<CiphertextHandle> = handles.into_iter().collect();
    let expires_at = clock.now_unix().saturating_add(ttl_secs);

    let payload = DecryptionAuthorization::payload_for(owner, registry, &handles, expires_at);
    let signature = signer.sign(&payload)?;
    Ok(DecryptionAuthorization::new(owner, registry, handles, expires_at, signature))
}

/// Owner-scoped plaintext cache, populated only by successful authorized
/// decryptions. Never shared across owners.
#[derive(Debug, Clone)]
pub struct DecryptedCache {
    owner: OwnerAddress,
    values: HashMap<CiphertextHandle, u64>,
}

impl DecryptedCache {
    pub fn new(owner: OwnerAddress) -> Self {
        Self { owner, values: HashMap::new() }
    }

    pub fn owner(&self) -> OwnerAddress {
        self.owner
    }

    pub fn get(&self, handle: &CiphertextHandle) -> Option<u64> {
        self.values.get(handle).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    fn insert(&mut self, handle: CiphertextHandle, value: u64) {
        self.values.insert(handle, value);
    }
}

/// Decrypts `handle` under `authorization`, through `cache`.
///
/// - The sentinel handle short-circuits to `Ok(None)` without contacting the
///   backend.
/// - An expired authorization fails with `AuthorizationExpired`; it is never
///   silently extended.
/// - A handle outside the authorization's bound set fails with
///   `HandleNotAuthorized`.
/// - A repeat decryption of a cached `(owner, handle)` is served locally.
///
/// Decrypting the same handle twice under one valid authorization yields the
/// same plaintext: the underlying ciphertext only changes through a new
/// write, and a new write produces a new handle.
pub fn decrypt(
    oracle: &impl FheOracle,
    clock: &impl Clock,
    cache: &mut DecryptedCache,
    handle: CiphertextHandle,
    authorization: &DecryptionAuthorization,
) -> Result<Option<u64>> {
    if handle.is_empty() {
        return Ok(None);
    }
    if cache.owner() != authorization.owner() {
        return Err(VoteError::other("decrypted cache is scoped to a different owner"));
    }
    if authorization.is_expired(clock.now_unix()) {
        return Err(VoteError::AuthorizationExpired { expired_at: authorization.expires_at() });
    }
    if !authorization.covers(&handle) {
        return Err(VoteError::handle_not_authorized(handle.to_string()));
    }
    if let Some(value) = cache.get(&handle) {
        return Ok(Some(value));
    }

    let value = oracle.reencrypt_for_owner(&handle, authorization)?;
    // Sole mutation of the flow: one atomic cache insert after success.
    cache.insert(handle, value);
    Ok(Some(value))
}

/// Cache of live authorizations, one per `(owner, registry)`. The client
/// keeps reusing a signed authorization within its validity window instead of
/// prompting the owner for every read.
///
/// Policy is fail-fast: an expired entry is dropped on lookup, and callers
/// discard an entry on the first backend rejection rather than retrying it.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationStore {
    entries: HashMap<(OwnerAddress, RegistryId), DecryptionAuthorization>,
}

impl AuthorizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored authorization if it is still within its window;
    /// an expired one is evicted, not returned.
    pub fn take_valid(
        &mut self,
        owner: OwnerAddress,
        registry: RegistryId,
        now_unix: u64,
    ) -> Option<DecryptionAuthorization> {
        let key = (owner, registry);
        match self.entries.get(&key) {
            Some(auth) if !auth.is_expired(now_unix) => self.entries.remove(&key),
            Some(_) => {
                self.entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn put(&mut self, authorization: DecryptionAuthorization) {
        self.entries
            .insert((authorization.owner(), authorization.registry()), authorization);
    }

    pub fn discard(&mut self, owner: OwnerAddress, registry: RegistryId) {
        self.entries.remove(&(owner, registry));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
