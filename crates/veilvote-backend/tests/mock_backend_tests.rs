//! Integration tests for the deterministic mock backend

use std::collections::BTreeSet;

use veilvote_backend::{
    owner_from_label, registry_from_label, AuthorizationSigner, DecryptionAuthorization,
    FheOracle, FixedClock, MockFheBackend, MockSigner,
};
use veilvote_runtime::{CiphertextHandle, FheUintWidth, InputProof, VoteError};

fn authorize_for<C>(
    backend: &MockFheBackend<C>,
    owner_label: &str,
    registry: veilvote_runtime::RegistryId,
    handles: BTreeSet<CiphertextHandle>,
    expires_at: u64,
) -> DecryptionAuthorization {
    let signer = backend.signer_for(owner_from_label(owner_label));
    let payload =
        DecryptionAuthorization::payload_for(signer.owner(), registry, &handles, expires_at);
    let signature = signer.sign(&payload).unwrap();
    DecryptionAuthorization::new(signer.owner(), registry, handles, expires_at, signature)
}

#[test]
fn test_encrypt_produces_distinct_handles_for_same_value() {
    let backend = MockFheBackend::with_seed([1; 32]);
    let registry = registry_from_label("dao");
    let owner = owner_from_label("itachi");

    let a = backend.encrypt(registry, owner, 6, FheUintWidth::U32).unwrap();
    let b = backend.encrypt(registry, owner, 6, FheUintWidth::U32).unwrap();

    assert_ne!(a.handle(), b.handle());
    assert!(!a.handle().is_empty());
    assert_eq!(backend.ciphertext_count(), 2);
}

#[test]
fn test_valid_proof_verifies() {
    let backend = MockFheBackend::with_seed([2; 32]);
    let registry = registry_from_label("dao");
    let owner = owner_from_label("itachi");

    let input = backend.encrypt(registry, owner, 3, FheUintWidth::U32).unwrap();
    assert!(backend.verify_proof(&input.handle(), input.proof(), owner, registry).unwrap());
}

#[test]
fn test_proof_bound_to_other_owner_fails() {
    let backend = MockFheBackend::with_seed([2; 32]);
    let registry = registry_from_label("dao");

    let input = backend
        .encrypt(registry, owner_from_label("itachi"), 3, FheUintWidth::U32)
        .unwrap();
    let verified = backend
        .verify_proof(&input.handle(), input.proof(), owner_from_label("sasuke"), registry)
        .unwrap();
    assert!(!verified);
}

#[test]
fn test_proof_bound_to_other_registry_fails() {
    let backend = MockFheBackend::with_seed([2; 32]);
    let owner = owner_from_label("itachi");

    let input = backend
        .encrypt(registry_from_label("dao"), owner, 3, FheUintWidth::U32)
        .unwrap();
    let verified = backend
        .verify_proof(&input.handle(), input.proof(), owner, registry_from_label("other-dao"))
        .unwrap();
    assert!(!verified);
}

#[test]
fn test_unknown_handle_does_not_verify() {
    let backend = MockFheBackend::with_seed([2; 32]);
    let verified = backend
        .verify_proof(
            &CiphertextHandle::new([9; 32]),
            &InputProof::new(vec![0; 32]),
            owner_from_label("itachi"),
            registry_from_label("dao"),
        )
        .unwrap();
    assert!(!verified);
}

#[test]
fn test_reencrypt_returns_plaintext_for_owner() {
    let backend = MockFheBackend::with_seed_and_clock([4; 32], FixedClock(100));
    let registry = registry_from_label("dao");
    let owner = owner_from_label("itachi");

    let input = backend.encrypt(registry, owner, 8, FheUintWidth::U32).unwrap();
    let auth =
        authorize_for(&backend, "itachi", registry, BTreeSet::from([input.handle()]), 1000);

    assert_eq!(backend.reencrypt_for_owner(&input.handle(), &auth).unwrap(), 8);
}

#[test]
fn test_reencrypt_rejects_foreign_owner() {
    let backend = MockFheBackend::with_seed_and_clock([4; 32], FixedClock(100));
    let registry = registry_from_label("dao");

    let input = backend
        .encrypt(registry, owner_from_label("itachi"), 8, FheUintWidth::U32)
        .unwrap();
    // Sasuke signs a perfectly valid authorization, but for a ciphertext
    // that is not his.
    let auth =
        authorize_for(&backend, "sasuke", registry, BTreeSet::from([input.handle()]), 1000);

    let err = backend.reencrypt_for_owner(&input.handle(), &auth).unwrap_err();
    assert!(matches!(err, VoteError::DecryptionRejected(_)));
}

#[test]
fn test_reencrypt_rejects_tampered_signature() {
    let backend = MockFheBackend::with_seed_and_clock([4; 32], FixedClock(100));
    let registry = registry_from_label("dao");
    let owner = owner_from_label("itachi");

    let input = backend.encrypt(registry, owner, 8, FheUintWidth::U32).unwrap();
    let auth = DecryptionAuthorization::new(
        owner,
        registry,
        BTreeSet::from([input.handle()]),
        1000,
        vec![0xff; 32],
    );

    let err = backend.reencrypt_for_owner(&input.handle(), &auth).unwrap_err();
    assert!(matches!(err, VoteError::DecryptionRejected(_)));
}

#[test]
fn test_reencrypt_rejects_handle_outside_bound_set() {
    let backend = MockFheBackend::with_seed_and_clock([4; 32], FixedClock(100));
    let registry = registry_from_label("dao");
    let owner = owner_from_label("itachi");

    let first = backend.encrypt(registry, owner, 8, FheUintWidth::U32).unwrap();
    let second = backend.encrypt(registry, owner, 9, FheUintWidth::U32).unwrap();
    let auth =
        authorize_for(&backend, "itachi", registry, BTreeSet::from([first.handle()]), 1000);

    let err = backend.reencrypt_for_owner(&second.handle(), &auth).unwrap_err();
    assert!(matches!(err, VoteError::DecryptionRejected(_)));
}

#[test]
fn test_reencrypt_rejects_expired_authorization() {
    let backend = MockFheBackend::with_seed_and_clock([4; 32], FixedClock(500));
    let registry = registry_from_label("dao");
    let owner = owner_from_label("itachi");

    let input = backend.encrypt(registry, owner, 8, FheUintWidth::U32).unwrap();
    // Properly signed by the owner, but its window closed at t=1.
    let stale =
        authorize_for(&backend, "itachi", registry, BTreeSet::from([input.handle()]), 1);
    let err = backend.reencrypt_for_owner(&input.handle(), &stale).unwrap_err();
    assert!(matches!(err, VoteError::DecryptionRejected(_)));

    // The same handle decrypts under a credential whose window is open.
    let live =
        authorize_for(&backend, "itachi", registry, BTreeSet::from([input.handle()]), 1000);
    assert_eq!(backend.reencrypt_for_owner(&input.handle(), &live).unwrap(), 8);
}

#[test]
fn test_offline_backend_fails_retriably() {
    let backend = MockFheBackend::with_seed([5; 32]);
    let registry = registry_from_label("dao");
    let owner = owner_from_label("itachi");

    backend.set_offline(true);
    let err = backend.encrypt(registry, owner, 1, FheUintWidth::U32).unwrap_err();
    assert!(err.is_retriable());

    backend.set_offline(false);
    assert!(backend.encrypt(registry, owner, 1, FheUintWidth::U32).is_ok());
}

#[test]
fn test_declining_signer() {
    let owner = owner_from_label("kakashi");
    let signer = MockSigner::declining(owner);
    assert_eq!(signer.owner(), owner);
    assert!(matches!(signer.sign(b"payload").unwrap_err(), VoteError::AuthorizationDeclined));
}

#[test]
fn test_backend_state_json_roundtrip() {
    let backend = MockFheBackend::with_seed([6; 32]);
    let registry = registry_from_label("dao");
    let owner = owner_from_label("itachi");

    let input = backend.encrypt(registry, owner, 42, FheUintWidth::U32).unwrap();

    let json = serde_json::to_string(&backend).expect("Failed to serialize backend");
    let restored: MockFheBackend =
        serde_json::from_str(&json).expect("Failed to deserialize backend");

    // The restored deployment still verifies old proofs and decrypts old
    // ciphertexts with a freshly signed authorization. The restored backend
    // reads wall-clock time, so the window is left wide open.
    assert!(restored.verify_proof(&input.handle(), input.proof(), owner, registry).unwrap());
    let auth = authorize_for(
        &restored,
        "itachi",
        registry,
        BTreeSet::from([input.handle()]),
        u64::MAX,
    );
    assert_eq!(restored.reencrypt_for_owner(&input.handle(), &auth).unwrap(), 42);
}

#[test]
fn test_clones_share_state() {
    let backend = MockFheBackend::with_seed([7; 32]);
    let clone = backend.clone();

    clone
        .encrypt(registry_from_label("dao"), owner_from_label("itachi"), 1, FheUintWidth::U32)
        .unwrap();
    assert_eq!(backend.ciphertext_count(), 1);
}
