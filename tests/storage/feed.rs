//! Integration tests for the change feed

use quadrille_foundation::{Node, Quad};
use quadrille_storage::{Change, MemoryStore, QuadStore};

fn quad(s: &str) -> Quad {
    Quad::new(Node::iri("urn:g"), Node::iri(s), Node::iri("urn:p"), Node::iri("urn:o"))
}

#[test]
fn changes_are_recorded_in_order() {
    let mut store = MemoryStore::new();
    let id = store.subscribe();
    store.insert(quad("urn:a")).unwrap();
    store.insert(quad("urn:b")).unwrap();
    store.remove(&quad("urn:a")).unwrap();

    assert_eq!(
        store.drain_changes(id),
        vec![
            Change::Added(quad("urn:a")),
            Change::Added(quad("urn:b")),
            Change::Removed(quad("urn:a")),
        ]
    );
    assert!(store.drain_changes(id).is_empty());
}

#[test]
fn no_op_mutations_are_not_recorded() {
    let mut store = MemoryStore::new();
    store.insert(quad("urn:a")).unwrap();
    let id = store.subscribe();
    store.insert(quad("urn:a")).unwrap();
    store.remove(&quad("urn:zzz")).unwrap();
    assert_eq!(store.pending(id), 0);
}

#[test]
fn subscribers_have_independent_buffers() {
    let mut store = MemoryStore::new();
    let first = store.subscribe();
    store.insert(quad("urn:a")).unwrap();
    let second = store.subscribe();
    store.insert(quad("urn:b")).unwrap();

    assert_eq!(store.drain_changes(first).len(), 2);
    assert_eq!(store.drain_changes(second), vec![Change::Added(quad("urn:b"))]);
}

#[test]
fn unsubscribed_buffer_is_gone() {
    let mut store = MemoryStore::new();
    let id = store.subscribe();
    store.insert(quad("urn:a")).unwrap();
    assert!(store.unsubscribe(id));
    assert!(!store.unsubscribe(id));
    assert!(store.drain_changes(id).is_empty());
}
