//! Proof-gated write path
//!
//! [`VoteRegistry`] admits a write only when the input proof binds the
//! submitted handle to exactly (submitter, this registry instance). On
//! success the owner's slot is replaced atomically; on any failure the store
//! is left untouched. Re-voting is always legal and always replaces the
//! prior handle.

use std::sync::atomic::{AtomicU64, Ordering};

use veilvote_backend::FheOracle;
use veilvote_runtime::{CiphertextHandle, InputProof, OwnerAddress, RegistryId, Result, VoteError};

use crate::store::HandleStore;

/// Verification oracle the write path consults before committing. Any
/// [`FheOracle`] is usable as one.
pub trait ProofVerifier {
    fn verify_proof(
        &self,
        handle: &CiphertextHandle,
        proof: &InputProof,
        submitter: OwnerAddress,
        registry: RegistryId,
    ) -> Result<bool>;
}

impl<T: FheOracle> ProofVerifier for T {
    fn verify_proof(
        &self,
        handle: &CiphertextHandle,
        proof: &InputProof,
        submitter: OwnerAddress,
        registry: RegistryId,
    ) -> Result<bool> {
        FheOracle::verify_proof(self, handle, proof, submitter, registry)
    }
}

/// One registry instance: a ledger of per-owner ciphertext handles behind a
/// proof gate.
///
/// The caller's identity is authenticated by the surrounding protocol layer;
/// the registry trusts the `submitter` it is handed and enforces only that
/// the proof binds to that identity and to this instance.
#[derive(Debug)]
pub struct VoteRegistry<S, V> {
    id: RegistryId,
    store: S,
    verifier: V,
    accepted_writes: AtomicU64,
}

impl<S: HandleStore, V: ProofVerifier> VoteRegistry<S, V> {
    pub fn new(id: RegistryId, store: S, verifier: V) -> Self {
        Self { id, store, verifier, accepted_writes: AtomicU64::new(0) }
    }

    pub fn id(&self) -> RegistryId {
        self.id
    }

    /// Commits `handle` as `submitter`'s current vote.
    ///
    /// The proof must bind `(handle, submitter, this registry)` exactly; a
    /// valid proof for another owner or another instance is rejected. The
    /// store mutation is a single atomic replace, never a partial update.
    pub fn cast_vote(
        &self,
        submitter: OwnerAddress,
        handle: CiphertextHandle,
        proof: &InputProof,
    ) -> Result<()> {
        if handle.is_empty() {
            return Err(VoteError::invalid_proof(
                "sentinel handle is not a valid ciphertext reference",
            ));
        }
        if !self.verifier.verify_proof(&handle, proof, submitter, self.id)? {
            return Err(VoteError::invalid_proof(format!(
                "proof does not bind {handle} to {submitter} on registry {}",
                self.id
            )));
        }
        self.store.set(submitter, handle)?;
        self.accepted_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Current handle for `owner`, or the sentinel if they never voted.
    /// Callable by anyone; a handle reveals nothing.
    pub fn get_encrypted_vote(&self, owner: OwnerAddress) -> Result<CiphertextHandle> {
        self.store.get(owner)
    }

    /// Whether `owner` has a live vote record.
    pub fn has_voted(&self, owner: OwnerAddress) -> Result<bool> {
        Ok(!self.store.get(owner)?.is_empty())
    }

    /// Count of accepted writes since construction; observability only.
    pub fn accepted_writes(&self) -> u64 {
        self.accepted_writes.load(Ordering::Relaxed)
    }
}
