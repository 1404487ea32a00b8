//! Test fixtures and store helpers.
//!
//! Provides a sample record type and temporary stores for both backends
//! that clean up after themselves.

use blobstore_codec::{CodecResult, FieldReader, FieldWriter, Record};
use blobstore_storage::datastore::{DatastoreStore, InMemoryDatastore};
use blobstore_storage::{BlobStore, FileStore, WriteMode};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Project id used by emulated Datastore stores.
pub const TEST_PROJECT: &str = "test-179902";

/// Domain postfix used by emulated Datastore stores.
pub const TEST_DOMAIN_POSTFIX: &str = "Test";

/// Store name used by the `with_*` helpers.
pub const TEST_STORE: &str = "testStore";

/// A sample record: a named deployment on some platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Deployment name.
    #[serde(rename = "Name")]
    pub name: String,
    /// Platform, e.g. `GCP`.
    #[serde(rename = "Type")]
    pub kind: String,
    /// Free-form notes; may be long.
    #[serde(rename = "Notes")]
    pub notes: Option<String>,
}

impl Record for Deployment {
    fn write_fields(&self, fields: &mut FieldWriter) {
        fields
            .field("Name", &self.name)
            .field("Type", &self.kind)
            .field("Notes", &self.notes);
    }

    fn read_fields(fields: &FieldReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            name: fields.get("Name")?,
            kind: fields.get("Type")?,
            notes: fields.get("Notes")?,
        })
    }
}

/// Creates a deployment without notes.
pub fn deployment(name: &str, kind: &str) -> Deployment {
    Deployment {
        name: name.to_string(),
        kind: kind.to_string(),
        notes: None,
    }
}

/// The `redis` on `GCP` deployment used throughout the tests.
pub fn redis_on_gcp() -> Deployment {
    deployment("redis", "GCP")
}

/// A file store in a temporary directory, removed on drop.
pub struct TestFileStore<R> {
    /// The store.
    pub store: FileStore<R>,
    /// Kept alive to prevent cleanup.
    temp_dir: TempDir,
}

impl<R> TestFileStore<R> {
    /// Opens the store called `name` in a fresh temporary directory.
    pub fn new(name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::open(name, temp_dir.path()).expect("Failed to open file store");
        Self { store, temp_dir }
    }

    /// Returns the root directory (the configured files path).
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl<R> Deref for TestFileStore<R> {
    type Target = FileStore<R>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// A Datastore store backed by the in-memory emulator.
pub struct TestDatastore<R> {
    /// The store.
    pub store: DatastoreStore<R, Arc<InMemoryDatastore>>,
    /// The emulator, for inspecting entities and call counts.
    pub emulator: Arc<InMemoryDatastore>,
}

impl<R> TestDatastore<R> {
    /// Opens the store called `name` on a fresh emulator.
    pub fn new(name: &str) -> Self {
        Self::with_emulator(name, InMemoryDatastore::new())
    }

    /// Opens the store called `name` on an emulator that pages query
    /// results.
    pub fn paged(name: &str, page_size: usize) -> Self {
        Self::with_emulator(name, InMemoryDatastore::with_page_size(page_size))
    }

    /// Opens the store called `name` on `emulator`.
    pub fn with_emulator(name: &str, emulator: InMemoryDatastore) -> Self {
        let emulator = Arc::new(emulator);
        let store = DatastoreStore::with_client(
            name,
            format!("{name}{TEST_DOMAIN_POSTFIX}"),
            TEST_PROJECT,
            Arc::clone(&emulator),
        );
        Self { store, emulator }
    }

    /// Switches the store's write mode.
    #[must_use]
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.store = self.store.with_write_mode(mode);
        self
    }
}

impl<R> Deref for TestDatastore<R> {
    type Target = DatastoreStore<R, Arc<InMemoryDatastore>>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary file store of deployments.
///
/// # Example
///
/// ```rust
/// use blobstore_testkit::{redis_on_gcp, with_file_store};
///
/// with_file_store(|store| {
///     store.store("redis", &redis_on_gcp()).unwrap();
///     assert_eq!(store.load("redis").unwrap(), redis_on_gcp());
/// });
/// ```
pub fn with_file_store<F, T>(f: F) -> T
where
    F: FnOnce(&dyn BlobStore<Deployment>) -> T,
{
    let test_store = TestFileStore::new(TEST_STORE);
    f(&test_store.store)
}

/// Runs a test with an emulated Datastore store of deployments.
pub fn with_emulated_store<F, T>(f: F) -> T
where
    F: FnOnce(&dyn BlobStore<Deployment>) -> T,
{
    let test_store = TestDatastore::new(TEST_STORE);
    f(&test_store.store)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Stores `count` deployments under keys `deployment-0`, `deployment-1`,
    /// ... and returns the keys.
    pub fn populate(store: &dyn BlobStore<Deployment>, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                let key = format!("deployment-{i}");
                store
                    .store(&key, &deployment(&key, "GCP"))
                    .expect("Failed to store deployment");
                key
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_lives_in_temp_dir() {
        let store: TestFileStore<Deployment> = TestFileStore::new("fixtures");
        assert_eq!(store.path(), store.root().join("fixtures"));
        assert!(store.path().is_dir());
    }

    #[test]
    fn test_datastore_uses_postfixed_kind() {
        let store: TestDatastore<Deployment> = TestDatastore::new("fixtures");
        assert_eq!(store.domain(), "fixturesTest");
        assert_eq!(store.project_id(), TEST_PROJECT);
    }

    #[test]
    fn test_populate_scenario() {
        with_emulated_store(|store| {
            let keys = scenarios::populate(store, 5);
            assert_eq!(keys.len(), 5);
            assert_eq!(store.load_all().unwrap().len(), 5);
        });
    }
}
