//! Integration tests for batched changes

use quadrille_foundation::{Node, NodeFactory, Quad};
use quadrille_storage::{ApplyReport, Changeset, MemoryStore, QuadStore};

fn quad(s: &str) -> Quad {
    Quad::new(Node::iri("urn:g"), Node::iri(s), Node::iri("urn:p"), Node::iri("urn:o"))
}

#[test]
fn removals_apply_before_additions() {
    let mut store = MemoryStore::new();
    store.insert(quad("urn:a")).unwrap();

    let changeset = Changeset::new()
        .add(quad("urn:a"))
        .remove(quad("urn:a"))
        .add(quad("urn:b"));
    let report = store.apply(&changeset).unwrap();

    assert_eq!(report, ApplyReport { added: 2, removed: 1 });
    assert!(store.contains(&quad("urn:a")));
    assert!(store.contains(&quad("urn:b")));
}

#[test]
fn invalid_addition_rejects_whole_batch() {
    let mut factory = NodeFactory::new();
    let mut store = MemoryStore::new();
    store.insert(quad("urn:a")).unwrap();

    let bad = Quad::new(
        factory.iri("urn:g"),
        factory.string("literal"),
        factory.iri("urn:p"),
        factory.iri("urn:o"),
    );
    let changeset = Changeset::new().remove(quad("urn:a")).add(bad);
    assert!(store.apply(&changeset).is_err());
    assert!(store.contains(&quad("urn:a")));
}

#[test]
fn empty_changeset() {
    let mut store = MemoryStore::new();
    assert!(Changeset::new().is_empty());
    assert_eq!(store.apply(&Changeset::new()).unwrap(), ApplyReport::default());
}
