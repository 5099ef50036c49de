// tests/session/upload_store_test.rs
use std::fs;

use csvpivot::source::{resolve_relation, TabularSource, UploadKey, UploadStore};

const SALES: &[u8] = b"region,qty\neast,5\nwest,3\neast,2\n";

#[test]
fn test_same_content_is_written_once() {
    let store = UploadStore::new().unwrap();
    let first = store.ensure_materialized("sales.csv", SALES).unwrap();
    let second = store.ensure_materialized("sales.csv", SALES).unwrap();

    assert_eq!(first, second);
    assert_eq!(store.len(), 1);
    assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 1);
}

#[test]
fn test_new_bytes_under_same_name_get_new_file() {
    let store = UploadStore::new().unwrap();
    let old = store.ensure_materialized("sales.csv", SALES).unwrap();
    let new = store
        .ensure_materialized("sales.csv", b"region,qty\nnorth,1\n")
        .unwrap();

    assert_ne!(old, new);
    assert_eq!(fs::read(&old).unwrap(), SALES);
    assert_eq!(fs::read(&new).unwrap(), b"region,qty\nnorth,1\n");
}

#[test]
fn test_same_bytes_under_different_names_are_separate() {
    let store = UploadStore::new().unwrap();
    let a = store.ensure_materialized("a.csv", SALES).unwrap();
    let b = store.ensure_materialized("b.csv", SALES).unwrap();
    assert_ne!(a, b);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_vanished_file_is_rewritten() {
    let store = UploadStore::new().unwrap();
    let path = store.ensure_materialized("sales.csv", SALES).unwrap();
    fs::remove_file(&path).unwrap();

    let rewritten = store.ensure_materialized("sales.csv", SALES).unwrap();

    assert!(rewritten.exists());
    assert_eq!(fs::read(&rewritten).unwrap(), SALES);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_evict_and_clear() {
    let store = UploadStore::new().unwrap();
    let path = store.ensure_materialized("sales.csv", SALES).unwrap();
    let key = UploadKey::for_content("sales.csv", SALES);
    assert_eq!(store.get(&key), Some(path.clone()));

    assert!(store.evict(&key).unwrap());
    assert!(!path.exists());
    assert!(!store.evict(&key).unwrap());

    store.ensure_materialized("a.csv", b"x\n").unwrap();
    store.ensure_materialized("b.csv", b"y\n").unwrap();
    store.clear().unwrap();
    assert!(store.is_empty());
    assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 0);
}

#[test]
fn test_store_in_custom_parent() {
    let parent = tempfile::tempdir().unwrap();
    let store = UploadStore::new_in(parent.path()).unwrap();
    let path = store.ensure_materialized("sales.csv", SALES).unwrap();
    assert!(path.starts_with(parent.path()));
}

#[test]
fn test_relation_is_stable_for_an_upload() {
    let store = UploadStore::new().unwrap();
    let source = TabularSource::upload("sales.csv", SALES.to_vec());
    assert_eq!(
        resolve_relation(&source, &store).unwrap(),
        resolve_relation(&source, &store).unwrap()
    );
    assert_eq!(source.display_name(), "sales.csv");
}
