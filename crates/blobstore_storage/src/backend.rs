//! Blob store trait definition.

use crate::error::StoreResult;

/// A key-value store of typed records.
///
/// Each backend keeps the records of one domain. Records are written,
/// read and removed wholesale; there are no partial updates.
///
/// # Invariants
///
/// - `store` followed by `load` of the same key returns an equal record
/// - `load` of a key that is not stored returns [`StoreError::NotFound`]
/// - `load_all` returns every stored record exactly once; an empty store
///   yields an empty `Vec`
/// - Backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::FileStore`] - one JSON file per key
/// - [`super::DatastoreStore`] - one Datastore entity per key
///
/// [`StoreError::NotFound`]: crate::StoreError::NotFound
pub trait BlobStore<R>: Send + Sync {
    /// Returns the store name this backend was opened with.
    fn name(&self) -> &str;

    /// Writes `record` under `key`, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    fn store(&self, key: &str, record: &R) -> StoreResult<()>;

    /// Reads the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`](crate::StoreError::NotFound) if no
    /// record is stored under `key`, or another error if the read fails.
    fn load(&self, key: &str) -> StoreResult<R>;

    /// Reads every record in the domain.
    ///
    /// # Errors
    ///
    /// Returns an error if any record cannot be read or decoded.
    fn load_all(&self) -> StoreResult<Vec<R>>;

    /// Removes the record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal fails.
    fn delete(&self, key: &str) -> StoreResult<()>;
}
