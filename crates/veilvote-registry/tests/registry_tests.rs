//! Integration tests for the proof-gated write path and handle store

use veilvote_backend::{owner_from_label, registry_from_label, FheOracle, MockFheBackend};
use veilvote_registry::{HandleStore, InMemoryHandleStore, VoteRegistry};
use veilvote_runtime::{CiphertextHandle, FheUintWidth, InputProof, VoteError};

fn deployment() -> (MockFheBackend, VoteRegistry<InMemoryHandleStore, MockFheBackend>) {
    let backend = MockFheBackend::with_seed([11; 32]);
    let registry = VoteRegistry::new(
        registry_from_label("veilvote-dao"),
        InMemoryHandleStore::new(),
        backend.clone(),
    );
    (backend, registry)
}

#[test]
fn test_unvoted_owner_reads_sentinel() {
    let (_, registry) = deployment();
    for label in ["itachi", "sasuke", "kakashi", "naruto"] {
        let owner = owner_from_label(label);
        assert_eq!(registry.get_encrypted_vote(owner).unwrap(), CiphertextHandle::EMPTY);
        assert!(!registry.has_voted(owner).unwrap());
    }
}

#[test]
fn test_cast_vote_then_get_returns_handle() {
    let (backend, registry) = deployment();
    let owner = owner_from_label("itachi");

    let input = backend.encrypt(registry.id(), owner, 3, FheUintWidth::U32).unwrap();
    registry.cast_vote(owner, input.handle(), input.proof()).unwrap();

    assert_eq!(registry.get_encrypted_vote(owner).unwrap(), input.handle());
    assert!(registry.has_voted(owner).unwrap());
    assert_eq!(registry.accepted_writes(), 1);
}

#[test]
fn test_revote_always_replaces_prior_handle() {
    let (backend, registry) = deployment();
    let owner = owner_from_label("sasuke");

    let mut last = CiphertextHandle::EMPTY;
    for value in [1u64, 4, 7, 10] {
        let input = backend.encrypt(registry.id(), owner, value, FheUintWidth::U32).unwrap();
        registry.cast_vote(owner, input.handle(), input.proof()).unwrap();
        last = input.handle();
    }

    assert_eq!(registry.get_encrypted_vote(owner).unwrap(), last);
    assert_eq!(registry.accepted_writes(), 4);
}

#[test]
fn test_writes_are_isolated_per_owner() {
    let (backend, registry) = deployment();
    let itachi = owner_from_label("itachi");
    let kakashi = owner_from_label("kakashi");

    let first = backend.encrypt(registry.id(), itachi, 1, FheUintWidth::U32).unwrap();
    registry.cast_vote(itachi, first.handle(), first.proof()).unwrap();

    let second = backend.encrypt(registry.id(), kakashi, 5, FheUintWidth::U32).unwrap();
    registry.cast_vote(kakashi, second.handle(), second.proof()).unwrap();

    assert_eq!(registry.get_encrypted_vote(itachi).unwrap(), first.handle());
    assert_eq!(registry.get_encrypted_vote(kakashi).unwrap(), second.handle());
}

#[test]
fn test_proof_for_other_owner_is_rejected_and_store_unchanged() {
    let (backend, registry) = deployment();
    let itachi = owner_from_label("itachi");
    let sasuke = owner_from_label("sasuke");

    // Sasuke tries to replay Itachi's well-formed (handle, proof) pair.
    let input = backend.encrypt(registry.id(), itachi, 6, FheUintWidth::U32).unwrap();
    let err = registry.cast_vote(sasuke, input.handle(), input.proof()).unwrap_err();

    assert!(matches!(err, VoteError::InvalidProof(_)));
    assert_eq!(registry.get_encrypted_vote(sasuke).unwrap(), CiphertextHandle::EMPTY);
    assert_eq!(registry.accepted_writes(), 0);
}

#[test]
fn test_proof_for_other_registry_instance_is_rejected() {
    let backend = MockFheBackend::with_seed([12; 32]);
    let registry_a = VoteRegistry::new(
        registry_from_label("dao-a"),
        InMemoryHandleStore::new(),
        backend.clone(),
    );
    let registry_b = VoteRegistry::new(
        registry_from_label("dao-b"),
        InMemoryHandleStore::new(),
        backend.clone(),
    );
    let owner = owner_from_label("itachi");

    let input = backend.encrypt(registry_a.id(), owner, 2, FheUintWidth::U32).unwrap();
    registry_a.cast_vote(owner, input.handle(), input.proof()).unwrap();

    let err = registry_b.cast_vote(owner, input.handle(), input.proof()).unwrap_err();
    assert!(matches!(err, VoteError::InvalidProof(_)));
    assert!(!registry_b.has_voted(owner).unwrap());
}

#[test]
fn test_garbage_proof_is_rejected() {
    let (backend, registry) = deployment();
    let owner = owner_from_label("itachi");

    let input = backend.encrypt(registry.id(), owner, 2, FheUintWidth::U32).unwrap();
    let err = registry
        .cast_vote(owner, input.handle(), &InputProof::new(vec![0u8; 32]))
        .unwrap_err();
    assert!(matches!(err, VoteError::InvalidProof(_)));
}

#[test]
fn test_sentinel_handle_cannot_be_cast() {
    let (_, registry) = deployment();
    let owner = owner_from_label("itachi");

    let err = registry
        .cast_vote(owner, CiphertextHandle::EMPTY, &InputProof::new(vec![]))
        .unwrap_err();
    assert!(matches!(err, VoteError::InvalidProof(_)));
}

#[test]
fn test_backend_outage_surfaces_retriably_and_commits_nothing() {
    let (backend, registry) = deployment();
    let owner = owner_from_label("itachi");

    let input = backend.encrypt(registry.id(), owner, 2, FheUintWidth::U32).unwrap();
    backend.set_offline(true);

    let err = registry.cast_vote(owner, input.handle(), input.proof()).unwrap_err();
    assert!(err.is_retriable());
    assert!(!registry.has_voted(owner).unwrap());
}

#[test]
fn test_concurrent_writers_for_distinct_owners_do_not_interfere() {
    use std::sync::Arc;
    use std::thread;

    let backend = MockFheBackend::with_seed([13; 32]);
    let registry = Arc::new(VoteRegistry::new(
        registry_from_label("veilvote-dao"),
        InMemoryHandleStore::new(),
        backend.clone(),
    ));

    let mut handles = Vec::new();
    for i in 0..8u8 {
        let registry = Arc::clone(&registry);
        let backend = backend.clone();
        handles.push(thread::spawn(move || {
            let owner = owner_from_label(&format!("voter-{i}"));
            let mut last = CiphertextHandle::EMPTY;
            for round in 0..10u64 {
                let input = backend
                    .encrypt(registry.id(), owner, round, FheUintWidth::U32)
                    .unwrap();
                registry.cast_vote(owner, input.handle(), input.proof()).unwrap();
                last = input.handle();
            }
            (owner, last)
        }));
    }

    for handle in handles {
        let (owner, last) = handle.join().unwrap();
        assert_eq!(registry.get_encrypted_vote(owner).unwrap(), last);
    }
    assert_eq!(registry.accepted_writes(), 80);
}

#[test]
fn test_store_json_roundtrip() {
    let store = InMemoryHandleStore::new();
    let owner = owner_from_label("itachi");
    store.set(owner, CiphertextHandle::new([3; 32])).unwrap();

    let json = serde_json::to_string(&store).expect("Failed to serialize store");
    let restored: InMemoryHandleStore =
        serde_json::from_str(&json).expect("Failed to deserialize store");

    assert_eq!(restored.get(owner).unwrap(), CiphertextHandle::new([3; 32]));
    assert_eq!(restored.voted_count(), 1);
}
