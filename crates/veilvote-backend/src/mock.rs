//! Deterministic mock backend
//!
//! Stands in for the FHE coprocessor so the registry and client protocol can
//! be exercised end to end without real ciphertext math. Handles are derived
//! by keyed hashing over (registry, owner, value, fresh nonce) and proofs are
//! keyed MACs over (handle, owner, registry), so binding failures reproduce
//! exactly: a proof replayed for another owner or registry instance does not
//! verify, and a stale authorization is refused against the backend's own
//! clock even when presented directly. The whole backend state is
//! serializable, which lets the CLI persist a mock deployment as JSON.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use blake2::{Blake2s256, Digest};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use veilvote_runtime::{
    CiphertextHandle, EncryptedInput, FheUintWidth, InputProof, OwnerAddress, RegistryId, Result,
    VoteError,
};

use crate::auth::DecryptionAuthorization;
use crate::oracle::{AuthorizationSigner, Clock, FheOracle, SystemClock};

const HANDLE_TAG: &[u8] = b"veilvote/mock/handle";
const PROOF_TAG: &[u8] = b"veilvote/mock/proof";
const OWNER_KEY_TAG: &[u8] = b"veilvote/mock/owner-key";
const LABEL_TAG: &[u8] = b"veilvote/mock/label";

fn mac(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2s256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// One stored ciphertext: who encrypted what, for which registry instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct CiphertextEntry {
    owner: OwnerAddress,
    registry: RegistryId,
    value: u64,
    width: FheUintWidth,
}

#[derive(Debug, Serialize, Deserialize)]
struct MockBackendState {
    master_seed: [u8; 32],
    nonce: u64,
    #[serde(default)]
    offline: bool,
    ciphertexts: BTreeMap<CiphertextHandle, CiphertextEntry>,
}

/// In-memory FHE backend double. Cloning shares the underlying state, so one
/// deployment can serve several sessions concurrently. Reads wall-clock time
/// by default; tests inject a fixed clock to drive authorization expiry.
#[derive(Debug, Clone)]
pub struct MockFheBackend<C = SystemClock> {
    state: Arc<RwLock<MockBackendState>>,
    clock: C,
}

impl MockFheBackend<SystemClock> {
    /// Creates a backend with a fresh random master seed.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Creates a backend with a fixed master seed; same seed, same keys.
    pub fn with_seed(master_seed: [u8; 32]) -> Self {
        Self::with_seed_and_clock(master_seed, SystemClock)
    }
}

impl<C> MockFheBackend<C> {
    /// Creates a backend reading time from `clock`. Authorization expiry is
    /// enforced at the oracle itself, not only by the client-side gate.
    pub fn with_seed_and_clock(master_seed: [u8; 32], clock: C) -> Self {
        Self {
            state: Arc::new(RwLock::new(MockBackendState {
                master_seed,
                nonce: 0,
                offline: false,
                ciphertexts: BTreeMap::new(),
            })),
            clock,
        }
    }

    /// Simulates a transport outage: every oracle call fails retriably until
    /// switched back on.
    pub fn set_offline(&self, offline: bool) {
        self.write().offline = offline;
    }

    /// Number of ciphertexts the backend currently holds.
    pub fn ciphertext_count(&self) -> usize {
        self.read().ciphertexts.len()
    }

    /// Builds a signer whose key matches what this backend derives for
    /// `owner`, i.e. the owner's own wallet.
    pub fn signer_for(&self, owner: OwnerAddress) -> MockSigner {
        let seed = self.read().master_seed;
        MockSigner { owner, key: owner_key(&seed, owner), decline: false }
    }

    fn read(&self) -> RwLockReadGuard<'_, MockBackendState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MockBackendState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(state: &MockBackendState) -> Result<()> {
        if state.offline {
            Err(VoteError::backend_unavailable("mock backend is offline"))
        } else {
            Ok(())
        }
    }
}

impl Default for MockFheBackend<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

fn owner_key(master_seed: &[u8; 32], owner: OwnerAddress) -> [u8; 32] {
    mac(&[OWNER_KEY_TAG, master_seed, owner.as_bytes()])
}

fn proof_bytes(
    master_seed: &[u8; 32],
    handle: &CiphertextHandle,
    owner: OwnerAddress,
    registry: RegistryId,
) -> [u8; 32] {
    mac(&[PROOF_TAG, master_seed, handle.as_bytes(), owner.as_bytes(), registry.as_bytes()])
}

impl<C: Clock> FheOracle for MockFheBackend<C> {
    fn encrypt(
        &self,
        registry: RegistryId,
        owner: OwnerAddress,
        value: u64,
        width: FheUintWidth,
    ) -> Result<EncryptedInput> {
        let mut state = self.write();
        Self::ensure_online(&state)?;

        // Fresh nonce per encryption: encrypting the same value twice yields
        // distinct handles, and the sentinel can never come out of here.
        let handle = loop {
            state.nonce += 1;
            let digest = mac(&[
                HANDLE_TAG,
                &state.master_seed,
                registry.as_bytes(),
                owner.as_bytes(),
                &value.to_be_bytes(),
                &width.bits().to_be_bytes(),
                &state.nonce.to_be_bytes(),
            ]);
            let candidate = CiphertextHandle::new(digest);
            if !candidate.is_empty() {
                break candidate;
            }
        };

        state
            .ciphertexts
            .insert(handle, CiphertextEntry { owner, registry, value, width });

        let proof = proof_bytes(&state.master_seed, &handle, owner, registry);
        Ok(EncryptedInput::new(handle, InputProof::new(proof.to_vec())))
    }

    fn verify_proof(
        &self,
        handle: &CiphertextHandle,
        proof: &InputProof,
        submitter: OwnerAddress,
        registry: RegistryId,
    ) -> Result<bool> {
        let state = self.read();
        Self::ensure_online(&state)?;

        let entry = match state.ciphertexts.get(handle) {
            Some(entry) => entry,
            None => return Ok(false),
        };
        if entry.owner != submitter || entry.registry != registry {
            return Ok(false);
        }
        let expected = proof_bytes(&state.master_seed, handle, submitter, registry);
        Ok(proof.as_bytes() == expected.as_slice())
    }

    fn reencrypt_for_owner(
        &self,
        handle: &CiphertextHandle,
        authorization: &DecryptionAuthorization,
    ) -> Result<u64> {
        let state = self.read();
        Self::ensure_online(&state)?;

        let entry = state
            .ciphertexts
            .get(handle)
            .ok_or_else(|| VoteError::decryption_rejected("unknown ciphertext handle"))?;

        if entry.owner != authorization.owner() || entry.registry != authorization.registry() {
            return Err(VoteError::decryption_rejected(
                "ciphertext is not owned by the authorization's owner",
            ));
        }
        if !authorization.covers(handle) {
            return Err(VoteError::decryption_rejected(
                "handle not in the authorization's bound set",
            ));
        }
        if authorization.is_expired(self.clock.now_unix()) {
            return Err(VoteError::decryption_rejected("authorization expired"));
        }

        let key = owner_key(&state.master_seed, authorization.owner());
        let expected = mac(&[&key, &authorization.signing_payload()]);
        if authorization.signature() != expected.as_slice() {
            return Err(VoteError::decryption_rejected("authorization signature mismatch"));
        }

        Ok(entry.value)
    }
}

impl<C> Serialize for MockFheBackend<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.read().serialize(serializer)
    }
}

impl<'de, C: Default> Deserialize<'de> for MockFheBackend<C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let state = MockBackendState::deserialize(deserializer)?;
        Ok(Self { state: Arc::new(RwLock::new(state)), clock: C::default() })
    }
}

/// Signer double for an owner's wallet. Signs authorization payloads with the
/// key the mock backend derives for that owner, or declines every prompt.
#[derive(Debug, Clone)]
pub struct MockSigner {
    owner: OwnerAddress,
    key: [u8; 32],
    decline: bool,
}

impl MockSigner {
    /// A signer whose owner dismisses every signature prompt.
    pub fn declining(owner: OwnerAddress) -> Self {
        Self { owner, key: [0u8; 32], decline: true }
    }
}

impl AuthorizationSigner for MockSigner {
    fn owner(&self) -> OwnerAddress {
        self.owner
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if self.decline {
            return Err(VoteError::AuthorizationDeclined);
        }
        Ok(mac(&[&self.key, payload]).to_vec())
    }
}

/// Deterministic owner address for a human-readable label; test and demo
/// convenience, not an identity mechanism.
pub fn owner_from_label(label: &str) -> OwnerAddress {
    let digest = mac(&[LABEL_TAG, b"owner", label.as_bytes()]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[..20]);
    OwnerAddress::new(bytes)
}

/// Deterministic registry-instance id for a human-readable label.
pub fn registry_from_label(label: &str) -> RegistryId {
    let digest = mac(&[LABEL_TAG, b"registry", label.as_bytes()]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[..20]);
    RegistryId::new(bytes)
}
