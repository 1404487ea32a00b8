//! The behavior every blob store backend must show.
//!
//! Each check takes a fresh, empty store of [`Deployment`] records and
//! panics with a description when the backend misbehaves.

use crate::fixtures::{deployment, redis_on_gcp, Deployment};
use blobstore_codec::MAX_PROPERTY_BYTES;
use blobstore_storage::BlobStore;

/// A single contract check.
pub type ContractCheck = fn(&dyn BlobStore<Deployment>);

/// Every contract check with its name.
pub const CONTRACT_CHECKS: &[(&str, ContractCheck)] = &[
    ("round_trip", check_round_trip),
    ("overwrite", check_overwrite),
    ("missing_key", check_missing_key),
    ("delete", check_delete),
    ("load_all", check_load_all),
    ("large_values", check_large_values),
    ("empty_fields", check_empty_fields),
];

/// Runs every contract check.
///
/// `with_fresh_store` must run the given check against a new, empty store.
///
/// # Example
///
/// ```rust
/// use blobstore_testkit::{run_contract, with_file_store};
///
/// run_contract(|check| with_file_store(|store| check(store)));
/// ```
pub fn run_contract<F>(mut with_fresh_store: F)
where
    F: FnMut(ContractCheck),
{
    for (name, check) in CONTRACT_CHECKS {
        eprintln!("contract check: {name}");
        with_fresh_store(*check);
    }
}

/// Store followed by load returns an equal record.
pub fn check_round_trip(store: &dyn BlobStore<Deployment>) {
    let redis = redis_on_gcp();
    store.store("redis", &redis).expect("store failed");
    assert_eq!(store.load("redis").expect("load failed"), redis);
}

/// A second store under the same key replaces the record.
pub fn check_overwrite(store: &dyn BlobStore<Deployment>) {
    store
        .store("redis", &deployment("redis-with-a-longer-name", "GCP"))
        .expect("first store failed");
    store
        .store("redis", &deployment("redis", "AWS"))
        .expect("second store failed");

    assert_eq!(store.load("redis").expect("load failed"), deployment("redis", "AWS"));
    assert_eq!(store.load_all().expect("load_all failed").len(), 1);
}

/// Loading a key that was never stored is `NotFound`.
pub fn check_missing_key(store: &dyn BlobStore<Deployment>) {
    let err = store.load("never-stored").expect_err("load of a missing key succeeded");
    assert!(err.is_not_found(), "expected NotFound, got {err}");
}

/// A deleted key is no longer found, and other keys survive.
pub fn check_delete(store: &dyn BlobStore<Deployment>) {
    store.store("redis", &redis_on_gcp()).expect("store failed");
    store
        .store("postgres", &deployment("postgres", "AWS"))
        .expect("store failed");

    store.delete("redis").expect("delete failed");

    let err = store.load("redis").expect_err("deleted key still loads");
    assert!(err.is_not_found(), "expected NotFound, got {err}");
    assert_eq!(
        store.load("postgres").expect("load failed"),
        deployment("postgres", "AWS")
    );
}

/// `load_all` returns each stored record once; an empty store yields none.
pub fn check_load_all(store: &dyn BlobStore<Deployment>) {
    assert!(store.load_all().expect("load_all failed").is_empty());

    let expected: Vec<_> = ["alpha", "bravo", "charlie", "delta"]
        .iter()
        .map(|name| deployment(name, "GCP"))
        .collect();
    for record in &expected {
        store.store(&record.name, record).expect("store failed");
    }

    let mut loaded = store.load_all().expect("load_all failed");
    loaded.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(loaded, expected);
}

/// Values longer than the Datastore property limit round-trip intact.
pub fn check_large_values(store: &dyn BlobStore<Deployment>) {
    let lengths = [
        MAX_PROPERTY_BYTES - 1,
        MAX_PROPERTY_BYTES,
        MAX_PROPERTY_BYTES + 1,
        MAX_PROPERTY_BYTES * 2,
        MAX_PROPERTY_BYTES * 2 + 1,
        MAX_PROPERTY_BYTES * 11 + 7,
    ];

    for (i, len) in lengths.into_iter().enumerate() {
        let key = format!("large-{i}");
        let record = Deployment {
            name: key.clone(),
            kind: "GCP".into(),
            notes: Some((0..len).map(|j| char::from(b'a' + (j % 26) as u8)).collect()),
        };
        store.store(&key, &record).expect("store failed");
        assert_eq!(
            store.load(&key).expect("load failed"),
            record,
            "value of {len} bytes did not round-trip"
        );
    }

    let multibyte = Deployment {
        name: "multibyte".into(),
        kind: "GCP".into(),
        notes: Some("日本語テキスト".repeat(200)),
    };
    store.store("multibyte", &multibyte).expect("store failed");
    assert_eq!(store.load("multibyte").expect("load failed"), multibyte);
}

/// Empty strings and absent optional values come back unchanged.
pub fn check_empty_fields(store: &dyn BlobStore<Deployment>) {
    let empty = Deployment::default();
    store.store("empty", &empty).expect("store failed");
    assert_eq!(store.load("empty").expect("load failed"), empty);
}
