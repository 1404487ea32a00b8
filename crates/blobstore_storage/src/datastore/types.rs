//! Datastore v1 REST message types.
//!
//! Only the parts of the API the store uses are modeled. Unknown response
//! fields are ignored, and values of types other than string, null and key
//! read back as null.

use blobstore_codec::PropertyMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the special key property used in key filters.
pub const KEY_PROPERTY: &str = "__key__";

/// Identifies the project (and optional namespace) an entity lives in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionId {
    /// Project id.
    pub project_id: String,
    /// Namespace id; the default namespace when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<String>,
}

/// One element of a key path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathElement {
    /// Entity kind.
    pub kind: String,
    /// Key name, for named keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Numeric id (int64 encoded as a string), for allocated keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A Datastore entity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    /// Partition of the entity.
    #[serde(default)]
    pub partition_id: PartitionId,
    /// Ancestor path; the last element identifies the entity.
    pub path: Vec<PathElement>,
}

impl Key {
    /// Creates a single-element key with a name.
    pub fn named(
        project_id: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            partition_id: PartitionId {
                project_id: project_id.into(),
                namespace_id: None,
            },
            path: vec![PathElement {
                kind: kind.into(),
                name: Some(name.into()),
                id: None,
            }],
        }
    }

    /// Returns the kind of the entity.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.path.last().map(|e| e.kind.as_str())
    }

    /// Returns the name of the entity, if it has a named key.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.path.last().and_then(|e| e.name.as_deref())
    }
}

/// The single value of `nullValue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullValue {
    /// Null.
    #[serde(rename = "NULL_VALUE")]
    NullValue,
}

/// A property value. Exactly one of the value fields is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    /// A UTF-8 string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    /// Explicit null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_value: Option<NullValue>,
    /// A key reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_value: Option<Key>,
    /// Whether the value is left out of indexes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_from_indexes: Option<bool>,
}

impl Value {
    /// A string value.
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            string_value: Some(value.into()),
            ..Self::default()
        }
    }

    /// A null value.
    #[must_use]
    pub fn null() -> Self {
        Self {
            null_value: Some(NullValue::NullValue),
            ..Self::default()
        }
    }

    /// A key value.
    #[must_use]
    pub fn key(key: Key) -> Self {
        Self {
            key_value: Some(key),
            ..Self::default()
        }
    }

    /// Returns the string payload, if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.string_value.as_deref()
    }
}

/// A stored entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Entity key.
    pub key: Key,
    /// Property values by name.
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl Entity {
    /// Builds an entity from record properties.
    #[must_use]
    pub fn from_properties(key: Key, properties: PropertyMap) -> Self {
        let properties = properties
            .into_iter()
            .map(|(name, value)| (name, value.map_or_else(Value::null, Value::string)))
            .collect();
        Self { key, properties }
    }

    /// Returns the record properties of the entity.
    #[must_use]
    pub fn to_properties(&self) -> PropertyMap {
        self.properties
            .iter()
            .map(|(name, value)| (name.clone(), value.string_value.clone()))
            .collect()
    }
}

/// A kind to query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindExpression {
    /// Kind name.
    pub name: String,
}

/// A reference to a property by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyReference {
    /// Property name.
    pub name: String,
}

/// Comparison operator of a property filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyOperator {
    /// Equality.
    Equal,
}

/// A filter on a single property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyFilter {
    /// The property to compare.
    pub property: PropertyReference,
    /// The operator.
    pub op: PropertyOperator,
    /// The value to compare against.
    pub value: Value,
}

/// A query filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// A single-property filter.
    pub property_filter: PropertyFilter,
}

impl Filter {
    /// Filter matching exactly one key.
    #[must_use]
    pub fn key_equals(key: Key) -> Self {
        Self {
            property_filter: PropertyFilter {
                property: PropertyReference {
                    name: KEY_PROPERTY.to_string(),
                },
                op: PropertyOperator::Equal,
                value: Value::key(key),
            },
        }
    }
}

/// A structured query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Kinds to query; Datastore accepts at most one.
    pub kind: Vec<KindExpression>,
    /// Optional filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    /// Cursor to resume from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

impl Query {
    /// A query over every entity of `kind`.
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: vec![KindExpression { name: kind.into() }],
            filter: None,
            start_cursor: None,
        }
    }

    /// Adds a filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Resumes from a cursor.
    #[must_use]
    pub fn start_cursor(mut self, cursor: Option<String>) -> Self {
        self.start_cursor = cursor;
        self
    }
}

/// Body of `projects/{projectId}:runQuery`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    /// Partition to query.
    pub partition_id: PartitionId,
    /// The query.
    pub query: Query,
}

/// Whether more results exist after a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoreResults {
    /// Unspecified.
    #[default]
    #[serde(rename = "MORE_RESULTS_TYPE_UNSPECIFIED")]
    Unspecified,
    /// More results may follow; resume from the end cursor.
    NotFinished,
    /// The query limit was reached.
    MoreResultsAfterLimit,
    /// The query end cursor was reached.
    MoreResultsAfterCursor,
    /// The query is complete.
    NoMoreResults,
}

/// One entity of a query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResult {
    /// The entity.
    pub entity: Entity,
    /// Cursor pointing after this result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// A batch of query results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResultBatch {
    /// Results, in query order.
    #[serde(default)]
    pub entity_results: Vec<EntityResult>,
    /// Whether more results follow.
    #[serde(default)]
    pub more_results: MoreResults,
    /// Cursor pointing after the last result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_cursor: Option<String>,
}

/// Response of `runQuery`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponse {
    /// The result batch.
    #[serde(default)]
    pub batch: QueryResultBatch,
}

/// Commit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitMode {
    /// Mutations are applied without a transaction.
    NonTransactional,
    /// Mutations are applied in a transaction.
    Transactional,
}

/// One write. Exactly one of the fields is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutation {
    /// Insert; fails if the entity exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert: Option<Entity>,
    /// Update; fails if the entity does not exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<Entity>,
    /// Insert or replace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upsert: Option<Entity>,
    /// Delete; succeeds if the entity does not exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Key>,
}

impl Mutation {
    /// An insert mutation.
    #[must_use]
    pub fn insert(entity: Entity) -> Self {
        Self {
            insert: Some(entity),
            ..Self::default()
        }
    }

    /// An update mutation.
    #[must_use]
    pub fn update(entity: Entity) -> Self {
        Self {
            update: Some(entity),
            ..Self::default()
        }
    }

    /// An upsert mutation.
    #[must_use]
    pub fn upsert(entity: Entity) -> Self {
        Self {
            upsert: Some(entity),
            ..Self::default()
        }
    }

    /// A delete mutation.
    #[must_use]
    pub fn delete(key: Key) -> Self {
        Self {
            delete: Some(key),
            ..Self::default()
        }
    }
}

/// Body of `projects/{projectId}:commit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    /// Commit mode.
    pub mode: CommitMode,
    /// Mutations, applied in order.
    pub mutations: Vec<Mutation>,
}

impl CommitRequest {
    /// A non-transactional commit of one mutation.
    #[must_use]
    pub fn single(mutation: Mutation) -> Self {
        Self {
            mode: CommitMode::NonTransactional,
            mutations: vec![mutation],
        }
    }
}

/// Result of one mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResult {
    /// Allocated key, for inserts of incomplete keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    /// Entity version after the mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Response of `commit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    /// One result per mutation.
    #[serde(default)]
    pub mutation_results: Vec<MutationResult>,
    /// Number of index writes.
    #[serde(default)]
    pub index_updates: i32,
}
