//! Google Cloud Datastore backend.
//!
//! Each store maps to one Datastore kind (the store's domain name) and each
//! record to one entity whose key name is the record key. Record fields are
//! stored as string properties; values longer than
//! [`MAX_PROPERTY_BYTES`](blobstore_codec::MAX_PROPERTY_BYTES) are split
//! across numbered properties by the codec.

mod client;
mod memory;
pub mod types;

pub use client::{DatastoreClient, HttpDatastoreClient};
pub use memory::InMemoryDatastore;

use crate::backend::BlobStore;
use crate::config::{StoreSettings, WriteMode};
use crate::credentials::ServiceAccount;
use crate::error::{StoreError, StoreResult};
use blobstore_codec::Record;
use std::marker::PhantomData;
use tracing::{debug, info, warn};
use types::{
    CommitRequest, Entity, Filter, Key, MoreResults, Mutation, PartitionId, Query,
    RunQueryRequest,
};

/// A [`BlobStore`] backed by Google Cloud Datastore.
///
/// Writes use [`WriteMode::CheckThenWrite`] unless configured otherwise:
/// a point query for the key decides between an `insert` and an `update`
/// mutation, committed non-transactionally.
pub struct DatastoreStore<R, C = HttpDatastoreClient> {
    name: String,
    domain: String,
    project_id: String,
    write_mode: WriteMode,
    client: C,
    _record: PhantomData<fn() -> R>,
}

impl<R> DatastoreStore<R, HttpDatastoreClient> {
    /// Opens the store called `name` over HTTP.
    ///
    /// The project id is read from the service account file named by the
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns an error if no service account file is configured, it cannot
    /// be read, or the HTTP client cannot be built.
    pub fn open(name: &str, settings: &StoreSettings) -> StoreResult<Self> {
        let credentials_path = settings.credentials_path.as_deref().ok_or_else(|| {
            StoreError::Config("no service account file configured for the Datastore backend".into())
        })?;
        let account = ServiceAccount::load(credentials_path)?;
        let client = HttpDatastoreClient::from_settings(settings)?;
        let domain = settings.domain_name(name);

        info!(
            store = name,
            domain = %domain,
            project_id = %account.project_id,
            account = account.client_email.as_deref().unwrap_or("unknown"),
            "opened Datastore store"
        );

        Ok(Self::with_client(name, domain, account.project_id, client)
            .with_write_mode(settings.write_mode))
    }
}

impl<R, C: DatastoreClient> DatastoreStore<R, C> {
    /// Creates a store that talks through `client`.
    pub fn with_client(
        name: impl Into<String>,
        domain: impl Into<String>,
        project_id: impl Into<String>,
        client: C,
    ) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
            project_id: project_id.into(),
            write_mode: WriteMode::default(),
            client,
            _record: PhantomData,
        }
    }

    /// Sets the write mode.
    #[must_use]
    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    /// Returns the Datastore kind records are stored under.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the project id.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Returns the write mode.
    #[must_use]
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    /// Returns the client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    fn partition(&self) -> PartitionId {
        PartitionId {
            project_id: self.project_id.clone(),
            namespace_id: None,
        }
    }

    fn entity_key(&self, key: &str) -> StoreResult<Key> {
        validate_key(key)?;
        Ok(Key::named(&self.project_id, &self.domain, key))
    }

    fn find(&self, key: &Key) -> StoreResult<Option<Entity>> {
        let request = RunQueryRequest {
            partition_id: self.partition(),
            query: Query::kind(&self.domain).filter(Filter::key_equals(key.clone())),
        };
        let response = self.client.run_query(&self.project_id, &request)?;
        Ok(response
            .batch
            .entity_results
            .into_iter()
            .next()
            .map(|result| result.entity))
    }
}

impl<R, C> BlobStore<R> for DatastoreStore<R, C>
where
    R: Record,
    C: DatastoreClient,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn store(&self, key: &str, record: &R) -> StoreResult<()> {
        let entity_key = self.entity_key(key)?;
        let properties = blobstore_codec::to_properties(record)?;
        let entity = Entity::from_properties(entity_key.clone(), properties);

        let mutation = match self.write_mode {
            WriteMode::Upsert => Mutation::upsert(entity),
            WriteMode::CheckThenWrite => {
                if self.find(&entity_key)?.is_some() {
                    Mutation::update(entity)
                } else {
                    Mutation::insert(entity)
                }
            }
        };

        debug!(domain = %self.domain, key, "committing {}", mutation_kind(&mutation));
        self.client
            .commit(&self.project_id, &CommitRequest::single(mutation))?;
        Ok(())
    }

    fn load(&self, key: &str) -> StoreResult<R> {
        let entity_key = self.entity_key(key)?;
        let Some(entity) = self.find(&entity_key)? else {
            warn!(domain = %self.domain, key, "record not found");
            return Err(StoreError::NotFound {
                domain: self.domain.clone(),
                key: key.to_string(),
            });
        };
        debug!(domain = %self.domain, key, "loaded record");
        Ok(blobstore_codec::from_properties(&entity.to_properties())?)
    }

    fn load_all(&self) -> StoreResult<Vec<R>> {
        let mut records = Vec::new();
        let mut cursor = None;

        loop {
            let request = RunQueryRequest {
                partition_id: self.partition(),
                query: Query::kind(&self.domain).start_cursor(cursor.take()),
            };
            let batch = self.client.run_query(&self.project_id, &request)?.batch;
            let page_len = batch.entity_results.len();

            for result in batch.entity_results {
                records.push(blobstore_codec::from_properties(
                    &result.entity.to_properties(),
                )?);
            }

            match (batch.more_results, batch.end_cursor) {
                (MoreResults::NotFinished, Some(end)) if page_len > 0 => cursor = Some(end),
                _ => break,
            }
        }

        debug!(domain = %self.domain, count = records.len(), "loaded all records");
        Ok(records)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let entity_key = self.entity_key(key)?;
        self.client
            .commit(&self.project_id, &CommitRequest::single(Mutation::delete(entity_key)))?;
        debug!(domain = %self.domain, key, "deleted record");
        Ok(())
    }
}

impl<R, C> std::fmt::Debug for DatastoreStore<R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatastoreStore")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .field("project_id", &self.project_id)
            .field("write_mode", &self.write_mode)
            .finish_non_exhaustive()
    }
}

/// Datastore rejects empty key names and reserves names of the form `__*__`.
fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key is empty",
        });
    }
    if key.len() >= 4 && key.starts_with("__") && key.ends_with("__") {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "names of the form __*__ are reserved",
        });
    }
    Ok(())
}

fn mutation_kind(mutation: &Mutation) -> &'static str {
    if mutation.insert.is_some() {
        "insert"
    } else if mutation.update.is_some() {
        "update"
    } else if mutation.upsert.is_some() {
        "upsert"
    } else {
        "delete"
    }
}
