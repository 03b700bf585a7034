//! Ciphertext handle store
//!
//! Durable mapping from owner identity to that owner's current ciphertext
//! handle. The ledger itself is injected through [`HandleStore`]; the
//! in-memory implementation here carries the reference semantics every
//! persistence choice must honor: reads never mutate, writes replace the
//! whole slot, and each owner's slot is an independent unit of mutation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use veilvote_runtime::{CiphertextHandle, OwnerAddress, Result};

/// Ledger access pattern for the per-owner handle slots.
pub trait HandleStore {
    /// Returns the sentinel empty handle for owners that never wrote,
    /// otherwise the most recently committed handle. No side effects.
    fn get(&self, owner: OwnerAddress) -> Result<CiphertextHandle>;

    /// Total replacement of the prior value for `owner`. Only the write path
    /// calls this; it is never reachable from untrusted input directly.
    fn set(&self, owner: OwnerAddress, handle: CiphertextHandle) -> Result<()>;
}

impl<T: HandleStore + ?Sized> HandleStore for &T {
    fn get(&self, owner: OwnerAddress) -> Result<CiphertextHandle> {
        (**self).get(owner)
    }

    fn set(&self, owner: OwnerAddress, handle: CiphertextHandle) -> Result<()> {
        (**self).set(owner, handle)
    }
}

/// In-memory handle store. Cloning shares the underlying slots, so the same
/// ledger can back a registry and be inspected by tests or persisted by the
/// CLI at the same time.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHandleStore {
    slots: Arc<RwLock<HashMap<OwnerAddress, CiphertextHandle>>>,
}

impl InMemoryHandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of owners that have a live (non-sentinel) record.
    pub fn voted_count(&self) -> usize {
        self.read().values().filter(|h| !h.is_empty()).count()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<OwnerAddress, CiphertextHandle>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HandleStore for InMemoryHandleStore {
    fn get(&self, owner: OwnerAddress) -> Result<CiphertextHandle> {
        Ok(self.read().get(&owner).copied().unwrap_or(CiphertextHandle::EMPTY))
    }

    fn set(&self, owner: OwnerAddress, handle: CiphertextHandle) -> Result<()> {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(owner, handle);
        Ok(())
    }
}

impl Serialize for InMemoryHandleStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        // Owner addresses serialize as hex strings, so the map is a plain
        // JSON object. Sort for stable output.
        let slots = self.read();
        let ordered: std::collections::BTreeMap<_, _> = slots.iter().collect();
        ordered.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InMemoryHandleStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let slots = HashMap::<OwnerAddress, CiphertextHandle>::deserialize(deserializer)?;
        Ok(Self { slots: Arc::new(RwLock::new(slots)) })
    }
}
