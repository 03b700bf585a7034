//! VeilVote Backend Boundary
//!
//! The registry core treats the homomorphic cryptosystem as an oracle. This
//! crate defines that boundary: the [`FheOracle`], [`AuthorizationSigner`]
//! and [`Clock`] traits plus the [`DecryptionAuthorization`] artifact. It
//! also ships a deterministic in-memory mock so the whole protocol can run
//! and be tested without a real coprocessor.

pub mod auth;
pub mod mock;
pub mod oracle;

pub use auth::DecryptionAuthorization;
pub use mock::{owner_from_label, registry_from_label, MockFheBackend, MockSigner};
pub use oracle::{AuthorizationSigner, Clock, FheOracle, FixedClock, SystemClock};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use veilvote_runtime::{CiphertextHandle, FheUintWidth};

    #[test]
    fn test_label_helpers_are_deterministic() {
        assert_eq!(owner_from_label("itachi"), owner_from_label("itachi"));
        assert_ne!(owner_from_label("itachi"), owner_from_label("sasuke"));
        assert_ne!(registry_from_label("dao"), registry_from_label("dao2"));
    }

    #[test]
    fn test_authorization_covers_bound_set_only() {
        let owner = owner_from_label("itachi");
        let registry = registry_from_label("dao");
        let bound = CiphertextHandle::new([1; 32]);
        let other = CiphertextHandle::new([2; 32]);

        let auth = DecryptionAuthorization::new(
            owner,
            registry,
            BTreeSet::from([bound]),
            100,
            vec![],
        );
        assert!(auth.covers(&bound));
        assert!(!auth.covers(&other));
        assert!(!auth.is_expired(99));
        assert!(auth.is_expired(100));
    }

    #[test]
    fn test_encrypt_never_returns_sentinel() {
        let backend = MockFheBackend::with_seed([3; 32]);
        let input = backend
            .encrypt(registry_from_label("dao"), owner_from_label("itachi"), 0, FheUintWidth::U32)
            .unwrap();
        assert!(!input.handle().is_empty());
    }
}
