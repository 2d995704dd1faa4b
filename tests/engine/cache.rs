//! Integration tests for the result cache

use std::rc::Rc;

use quadrille_engine::ResultCache;

fn order(cache: &ResultCache<String, usize>) -> Vec<usize> {
    cache.entries().map(|entry| *entry.value()).collect()
}

#[test]
fn overflow_evicts_least_hit_entry() {
    let keys: Vec<Rc<String>> = (0..4).map(|i| Rc::new(format!("q{i}"))).collect();
    let mut cache = ResultCache::new(3);
    for (i, key) in keys.iter().take(3).enumerate() {
        assert!(cache.insert(Rc::clone(key), i).is_none());
    }

    // Keep the first two warm.
    for _ in 0..3 {
        cache.probe(&keys[0]);
        cache.probe(&keys[1]);
    }
    let (evicted, value) = cache.insert(Rc::clone(&keys[3]), 3).unwrap();
    assert!(Rc::ptr_eq(&evicted, &keys[2]));
    assert_eq!(value, 2);
    assert_eq!(cache.len(), 3);
    assert!(cache.probe(&keys[2]).is_none());
}

#[test]
fn reprobing_moves_entry_forward() {
    let keys: Vec<Rc<String>> = (0..4).map(|i| Rc::new(format!("q{i}"))).collect();
    let mut cache = ResultCache::new(4);
    for (i, key) in keys.iter().enumerate() {
        cache.insert(Rc::clone(key), i);
    }
    assert_eq!(order(&cache), vec![0, 1, 2, 3]);

    cache.probe(&keys[3]);
    assert_eq!(order(&cache), vec![0, 1, 3, 2]);
    cache.probe(&keys[3]);
    assert_eq!(order(&cache), vec![0, 3, 1, 2]);
    cache.probe(&keys[3]);
    assert_eq!(order(&cache), vec![3, 0, 1, 2]);
}

#[test]
fn equal_values_are_different_keys() {
    let mut cache = ResultCache::new(2);
    let a = Rc::new("same".to_string());
    let b = Rc::new("same".to_string());
    cache.insert(Rc::clone(&a), 1);
    assert!(cache.probe(&b).is_none());
    cache.insert(Rc::clone(&b), 2);
    assert_eq!(cache.probe(&a).copied(), Some(1));
    assert_eq!(cache.probe(&b).copied(), Some(2));
}

#[test]
fn probing_can_update_value() {
    let mut cache = ResultCache::new(1);
    let key = Rc::new("k".to_string());
    cache.insert(Rc::clone(&key), 1);
    if let Some(value) = cache.probe(&key) {
        *value += 10;
    }
    assert_eq!(cache.remove(&key), Some(11));
}
