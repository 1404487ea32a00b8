//! In-memory Datastore emulator.

use super::client::DatastoreClient;
use super::types::{
    CommitRequest, CommitResponse, Entity, EntityResult, Filter, Key, MoreResults, Mutation,
    MutationResult, QueryResultBatch, RunQueryRequest, RunQueryResponse, KEY_PROPERTY,
};
use crate::error::{StoreError, StoreResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

type Partition = (String, String);

/// A [`DatastoreClient`] that keeps entities in memory.
///
/// It follows the Datastore rules the store depends on: `insert` fails if
/// the entity exists, `update` fails if it does not, `upsert` always writes
/// and `delete` succeeds whether or not the entity exists. Results come back
/// ordered by key name.
///
/// Suitable for unit tests and for running the Datastore backend without a
/// network.
///
/// # Example
///
/// ```rust
/// use blobstore_storage::datastore::types::{CommitRequest, Entity, Key, Mutation};
/// use blobstore_storage::datastore::{DatastoreClient, InMemoryDatastore};
///
/// let emulator = InMemoryDatastore::new();
/// let key = Key::named("demo", "notes", "a");
/// let entity = Entity::from_properties(key.clone(), Default::default());
///
/// emulator.commit("demo", &CommitRequest::single(Mutation::insert(entity))).unwrap();
/// assert!(emulator.entity(&key).is_some());
///
/// let again = Entity::from_properties(key, Default::default());
/// assert!(emulator.commit("demo", &CommitRequest::single(Mutation::insert(again))).is_err());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryDatastore {
    kinds: RwLock<BTreeMap<Partition, BTreeMap<String, Entity>>>,
    page_size: Option<usize>,
    offline: AtomicBool,
    queries: AtomicUsize,
    commits: AtomicUsize,
    version: AtomicU64,
}

impl InMemoryDatastore {
    /// Creates an empty emulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an emulator that returns at most `page_size` results per
    /// query batch.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: Some(page_size.max(1)),
            ..Self::default()
        }
    }

    /// Makes every following call fail (or succeed again) as if the service
    /// were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns the number of `runQuery` calls served.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Returns the number of `commit` calls served.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Returns a copy of the stored entity with `key`.
    #[must_use]
    pub fn entity(&self, key: &Key) -> Option<Entity> {
        let partition = partition_of(key)?;
        let name = key.name()?;
        self.kinds.read().get(&partition)?.get(name).cloned()
    }

    /// Returns the number of entities of `kind` in `project_id`.
    #[must_use]
    pub fn len(&self, project_id: &str, kind: &str) -> usize {
        self.kinds
            .read()
            .get(&(project_id.to_string(), kind.to_string()))
            .map_or(0, BTreeMap::len)
    }

    /// Returns true if no entity of `kind` is stored in `project_id`.
    #[must_use]
    pub fn is_empty(&self, project_id: &str, kind: &str) -> bool {
        self.len(project_id, kind) == 0
    }

    /// Stores an entity directly, bypassing the commit rules.
    pub fn put_entity(&self, entity: Entity) {
        if let (Some(partition), Some(name)) = (partition_of(&entity.key), entity.key.name()) {
            let name = name.to_string();
            self.kinds.write().entry(partition).or_default().insert(name, entity);
        }
    }

    fn check_online(&self, operation: &'static str) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::remote(operation, "UNAVAILABLE: emulator is offline"));
        }
        Ok(())
    }

    fn apply(
        &self,
        kinds: &mut BTreeMap<Partition, BTreeMap<String, Entity>>,
        project_id: &str,
        mutation: &Mutation,
    ) -> StoreResult<MutationResult> {
        let (entity, key) = match mutation {
            Mutation { insert: Some(e), .. }
            | Mutation { update: Some(e), .. }
            | Mutation { upsert: Some(e), .. } => (Some(e), &e.key),
            Mutation { delete: Some(k), .. } => (None, k),
            _ => return Err(invalid("mutation has no operation")),
        };

        if key.partition_id.project_id != project_id {
            return Err(invalid("key project does not match request project"));
        }
        let partition = partition_of(key).ok_or_else(|| invalid("key has no kind"))?;
        let name = key.name().ok_or_else(|| invalid("key has no name"))?.to_string();
        let entities = kinds.entry(partition).or_default();

        let Some(entity) = entity else {
            entities.remove(&name);
            return Ok(self.result());
        };

        let exists = entities.contains_key(&name);
        if mutation.insert.is_some() && exists {
            return Err(StoreError::remote("commit", "ALREADY_EXISTS: entity already exists"));
        }
        if mutation.update.is_some() && !exists {
            return Err(StoreError::remote("commit", "NOT_FOUND: no entity to update"));
        }

        entities.insert(name, entity.clone());
        Ok(self.result())
    }

    fn result(&self) -> MutationResult {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        MutationResult {
            key: None,
            version: Some(version.to_string()),
        }
    }
}

impl DatastoreClient for InMemoryDatastore {
    fn run_query(
        &self,
        project_id: &str,
        request: &RunQueryRequest,
    ) -> StoreResult<RunQueryResponse> {
        self.check_online("run query")?;
        self.queries.fetch_add(1, Ordering::SeqCst);

        if request.partition_id.project_id != project_id {
            return Err(query_invalid("partition project does not match request project"));
        }
        let [kind] = request.query.kind.as_slice() else {
            return Err(query_invalid("exactly one kind is required"));
        };

        let kinds = self.kinds.read();
        let matching: Vec<&Entity> = kinds
            .get(&(project_id.to_string(), kind.name.clone()))
            .map(|entities| {
                entities
                    .values()
                    .filter(|e| matches_filter(e, request.query.filter.as_ref()))
                    .collect()
            })
            .unwrap_or_default();

        let start = match &request.query.start_cursor {
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| query_invalid("malformed cursor"))?,
            None => 0,
        };
        let start = start.min(matching.len());
        let end = self
            .page_size
            .map_or(matching.len(), |size| (start + size).min(matching.len()));

        let entity_results = matching[start..end]
            .iter()
            .enumerate()
            .map(|(i, entity)| EntityResult {
                entity: (*entity).clone(),
                cursor: Some((start + i + 1).to_string()),
            })
            .collect();

        let more_results = if end < matching.len() {
            MoreResults::NotFinished
        } else {
            MoreResults::NoMoreResults
        };

        Ok(RunQueryResponse {
            batch: QueryResultBatch {
                entity_results,
                more_results,
                end_cursor: Some(end.to_string()),
            },
        })
    }

    fn commit(&self, project_id: &str, request: &CommitRequest) -> StoreResult<CommitResponse> {
        self.check_online("commit")?;
        self.commits.fetch_add(1, Ordering::SeqCst);

        // Work on a copy so a rejected mutation leaves nothing behind.
        let mut kinds = self.kinds.write();
        let mut staged = kinds.clone();
        let mutation_results = request
            .mutations
            .iter()
            .map(|m| self.apply(&mut staged, project_id, m))
            .collect::<StoreResult<Vec<_>>>()?;
        *kinds = staged;

        Ok(CommitResponse {
            index_updates: i32::try_from(mutation_results.len()).unwrap_or(i32::MAX),
            mutation_results,
        })
    }
}

fn partition_of(key: &Key) -> Option<Partition> {
    Some((key.partition_id.project_id.clone(), key.kind()?.to_string()))
}

fn matches_filter(entity: &Entity, filter: Option<&Filter>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    let filter = &filter.property_filter;

    if filter.property.name == KEY_PROPERTY {
        return filter.value.key_value.as_ref() == Some(&entity.key);
    }
    entity
        .properties
        .get(&filter.property.name)
        .is_some_and(|value| value.as_str().is_some() && value.as_str() == filter.value.as_str())
}

fn invalid(message: &str) -> StoreError {
    StoreError::remote("commit", format!("INVALID_ARGUMENT: {message}"))
}

fn query_invalid(message: &str) -> StoreError {
    StoreError::remote("run query", format!("INVALID_ARGUMENT: {message}"))
}
