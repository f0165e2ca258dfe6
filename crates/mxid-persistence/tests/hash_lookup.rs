mod test_support;

use mxid_domain::ThreePidMapping;
use mxid_persistence::store::HASH_QUERY_CHUNK;
use mxid_persistence::HashStore;
use test_support::sqlite_storage;

fn mapping(medium: &str, address: &str, mxid: &str) -> ThreePidMapping {
    ThreePidMapping { medium: medium.into(), address: address.into(), mxid: mxid.into() }
}

#[test]
fn find_returns_only_existing_hashes_correlated() {
    let store = sqlite_storage();
    store.add_hash("@a:example.org", "email", "a@example.org", "h1").unwrap();
    store.add_hash("@c:example.org", "msisdn", "15550000003", "h3").unwrap();
    store.add_hash("@z:example.org", "email", "z@example.org", "unrelated").unwrap();

    let mut found = store.find_hashes(&["h1".into(), "h2".into(), "h3".into()]).unwrap();
    found.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(found,
               vec![("h1".to_string(), mapping("email", "a@example.org", "@a:example.org")),
                    ("h3".to_string(), mapping("msisdn", "15550000003", "@c:example.org"))]);
}

#[test]
fn repeated_input_hashes_do_not_duplicate_results() {
    let store = sqlite_storage();
    store.add_hash("@a:example.org", "email", "a@example.org", "h1").unwrap();
    let found = store.find_hashes(&["h1".into(), "h1".into()]).unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
fn empty_query_returns_empty() {
    let store = sqlite_storage();
    store.add_hash("@a:example.org", "email", "a@example.org", "h1").unwrap();
    assert!(store.find_hashes(&[]).unwrap().is_empty());
}

#[test]
fn clear_empties_the_index() {
    let store = sqlite_storage();
    store.add_hash("@a:example.org", "email", "a@example.org", "h1").unwrap();
    store.add_hash("@b:example.org", "email", "b@example.org", "h2").unwrap();
    store.clear_hashes().unwrap();
    assert!(store.find_hashes(&["h1".into(), "h2".into()]).unwrap().is_empty());
    // limpiar una tabla vacía también es válido
    store.clear_hashes().unwrap();
}

#[test]
fn duplicate_identity_triple_is_rejected() {
    let store = sqlite_storage();
    store.add_hash("@a:example.org", "email", "a@example.org", "h1").unwrap();
    let err = store.add_hash("@a:example.org", "email", "a@example.org", "h1-rotated").unwrap_err();
    assert!(err.is_duplicate_key(), "got {err:?}");
    // otro mxid con el mismo 3PID sí es válido
    store.add_hash("@a2:example.org", "email", "a@example.org", "h1").unwrap();
    assert_eq!(store.find_hashes(&["h1".into()]).unwrap().len(), 2);
}

#[test]
fn recompute_cycle_replaces_contents() {
    let store = sqlite_storage();
    store.add_hash("@a:example.org", "email", "a@example.org", "old-pepper-hash").unwrap();
    store.clear_hashes().unwrap();
    store.add_hash("@a:example.org", "email", "a@example.org", "new-pepper-hash").unwrap();
    assert!(store.find_hashes(&["old-pepper-hash".into()]).unwrap().is_empty());
    assert_eq!(store.find_hashes(&["new-pepper-hash".into()]).unwrap().len(), 1);
}

#[test]
fn query_larger_than_one_chunk() {
    let store = sqlite_storage();
    store.add_hash("@first:example.org", "email", "first@example.org", "hash-0").unwrap();
    let last = format!("hash-{}", HASH_QUERY_CHUNK + 10);
    store.add_hash("@last:example.org", "email", "last@example.org", &last).unwrap();
    let wanted: Vec<String> = (0..HASH_QUERY_CHUNK + 20).map(|i| format!("hash-{i}")).collect();
    let found = store.find_hashes(&wanted).unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().any(|(h, m)| h == &last && m.mxid == "@last:example.org"));
}
