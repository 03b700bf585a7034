//! Voter session
//!
//! Drives the two long-latency flows (encrypt-and-cast, authorize-and-
//! decrypt) for one owner against one registry. Cloning a session yields
//! another handle onto the same session state, so a UI thread can watch
//! `is_busy` while a flow runs elsewhere; the busy flag is shared by all
//! handles and rejects overlapping flows with `VoteError::SessionBusy`.
//! The flag is an atomic outside the state lock, so the overlap check and
//! `is_busy` never block on a flow in flight. A flow's only registry
//! mutation is its final commit (the registry's `set`, or a cache insert),
//! so an abandoned flow leaves the ledger consistent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use veilvote_backend::{AuthorizationSigner, Clock, FheOracle};
use veilvote_registry::{HandleStore, ProofVerifier, VoteRegistry};
use veilvote_runtime::{CiphertextHandle, Result, VoteError};

use crate::decrypt::{authorize, decrypt, AuthorizationStore, DecryptedCache};
use crate::encrypt::EncryptionRequestBuilder;

/// Default validity window for decryption authorizations, in seconds.
pub const DEFAULT_AUTH_TTL_SECS: u64 = 3600;

#[derive(Debug)]
struct SessionState {
    status: String,
    authorizations: AuthorizationStore,
    cache: DecryptedCache,
}

/// Clears the shared busy flag when the flow ends, even on early return.
struct FlowGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for FlowGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Client-side session for one owner.
#[derive(Debug, Clone)]
pub struct VoterSession<O, G, C> {
    oracle: O,
    signer: G,
    clock: C,
    auth_ttl_secs: u64,
    busy: Arc<AtomicBool>,
    state: Arc<Mutex<SessionState>>,
}

impl<O, G, C> VoterSession<O, G, C>
where
    O: FheOracle,
    G: AuthorizationSigner,
    C: Clock,
{
    pub fn new(oracle: O, signer: G, clock: C) -> Self {
        let owner = signer.owner();
        Self {
            oracle,
            signer,
            clock,
            auth_ttl_secs: DEFAULT_AUTH_TTL_SECS,
            busy: Arc::new(AtomicBool::new(false)),
            state: Arc::new(Mutex::new(SessionState {
                status: String::new(),
                authorizations: AuthorizationStore::new(),
                cache: DecryptedCache::new(owner),
            })),
        }
    }

    pub fn with_auth_ttl(mut self, ttl_secs: u64) -> Self {
        self.auth_ttl_secs = ttl_secs;
        self
    }

    pub fn owner(&self) -> veilvote_runtime::OwnerAddress {
        self.signer.owner()
    }

    /// True while a flow is in flight on any handle of this session.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Last human-readable status message, in the style of a wallet UI.
    pub fn status(&self) -> String {
        self.lock_state().status.clone()
    }

    /// Encrypts `eye_id` and casts it as this owner's vote, replacing any
    /// prior vote. Returns the committed handle.
    pub fn cast_vote<S: HandleStore, V: ProofVerifier>(
        &self,
        registry: &VoteRegistry<S, V>,
        eye_id: u32,
    ) -> Result<CiphertextHandle> {
        let _flow = self.enter_busy()?;
        let mut state = self.lock_state();
        self.cast_vote_inner(&mut state, registry, eye_id)
    }

    fn cast_vote_inner<S: HandleStore, V: ProofVerifier>(
        &self,
        state: &mut SessionState,
        registry: &VoteRegistry<S, V>,
        eye_id: u32,
    ) -> Result<CiphertextHandle> {
        state.status = format!("Encrypting and voting for eye ID {eye_id}...");
        let input = EncryptionRequestBuilder::new(&self.oracle, registry.id(), self.signer.owner())
            .build_u32(eye_id)
            .map_err(|e| Self::fail(state, e))?;

        let (handle, proof) = input.into_parts();
        registry
            .cast_vote(self.signer.owner(), handle, &proof)
            .map_err(|e| Self::fail(state, e))?;

        state.status = format!("Successfully voted for eye ID {eye_id}");
        Ok(handle)
    }

    /// Reads this owner's stored handle and decrypts it, reusing a cached
    /// authorization while it is valid and re-prompting the owner otherwise.
    /// Returns `Ok(None)` when the owner has never voted.
    pub fn reveal_vote<S: HandleStore, V: ProofVerifier>(
        &self,
        registry: &VoteRegistry<S, V>,
    ) -> Result<Option<u64>> {
        let _flow = self.enter_busy()?;
        let mut state = self.lock_state();
        self.reveal_vote_inner(&mut state, registry)
    }

    fn reveal_vote_inner<S: HandleStore, V: ProofVerifier>(
        &self,
        state: &mut SessionState,
        registry: &VoteRegistry<S, V>,
    ) -> Result<Option<u64>> {
        let owner = self.signer.owner();
        let handle = registry.get_encrypted_vote(owner)?;
        if handle.is_empty() {
            state.status = "No vote stored".to_string();
            return Ok(None);
        }

        let now = self.clock.now_unix();
        let auth = match state.authorizations.take_valid(owner, registry.id(), now) {
            Some(auth) if auth.covers(&handle) => auth,
            // Stored authorization is gone, stale, or bound to an older
            // handle: sign a fresh one over the current handle.
            _ => {
                state.status = "Waiting for decryption signature...".to_string();
                authorize(&self.signer, &self.clock, registry.id(), [handle], self.auth_ttl_secs)
                    .map_err(|e| Self::fail(state, e))?
            }
        };

        match decrypt(&self.oracle, &self.clock, &mut state.cache, handle, &auth) {
            Ok(value) => {
                state.status = "Vote decrypted".to_string();
                // Keep the authorization for reuse within its window.
                state.authorizations.put(auth);
                Ok(value)
            }
            Err(err) => {
                // Fail-fast: a rejected or expired authorization is dropped,
                // never silently retried.
                state.authorizations.discard(owner, registry.id());
                Err(Self::fail(state, err))
            }
        }
    }

    /// Plaintext cached for `handle` in this session, if any.
    pub fn cached_plaintext(&self, handle: &CiphertextHandle) -> Option<u64> {
        self.lock_state().cache.get(handle)
    }

    fn enter_busy(&self) -> Result<FlowGuard> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(VoteError::SessionBusy);
        }
        Ok(FlowGuard { flag: Arc::clone(&self.busy) })
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fail(state: &mut SessionState, err: VoteError) -> VoteError {
        state.status = format!("Request failed: {err}");
        err
    }
}
