//! # Blobstore Storage
//!
//! A small key-value store for typed records with two interchangeable
//! backends.
//!
//! Each store has a name and keeps records under string keys. Records are
//! written, read and removed wholesale through the [`BlobStore`] trait.
//!
//! ## Available Backends
//!
//! - [`FileStore`] - one JSON file per key in a local directory
//! - [`DatastoreStore`] - one Google Cloud Datastore entity per key, with
//!   long string values split across numbered properties
//!
//! [`open_store`] picks a backend from [`StoreSettings`], which can be read
//! from any [`ConfigSource`] such as a [`JsonConfig`] file.
//!
//! ## Example
//!
//! ```rust
//! use blobstore_storage::{BlobStore, CodecResult, FieldReader, FieldWriter, Record};
//! use blobstore_storage::datastore::{DatastoreStore, InMemoryDatastore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Deployment {
//!     name: String,
//!     kind: String,
//! }
//!
//! impl Record for Deployment {
//!     fn write_fields(&self, fields: &mut FieldWriter) {
//!         fields.field("Name", &self.name).field("Type", &self.kind);
//!     }
//!
//!     fn read_fields(fields: &FieldReader<'_>) -> CodecResult<Self> {
//!         Ok(Self { name: fields.get("Name")?, kind: fields.get("Type")? })
//!     }
//! }
//!
//! let store: DatastoreStore<Deployment, _> =
//!     DatastoreStore::with_client("deployments", "deployments", "demo", InMemoryDatastore::new());
//!
//! let redis = Deployment { name: "redis".into(), kind: "GCP".into() };
//! store.store("redis", &redis).unwrap();
//! assert_eq!(store.load("redis").unwrap(), redis);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod credentials;
pub mod datastore;
mod error;
mod factory;
mod file;

pub use backend::BlobStore;
pub use config::{
    keys, ConfigSource, JsonConfig, StoreSettings, StoreType, WriteMode,
    DEFAULT_DATASTORE_ENDPOINT,
};
pub use credentials::ServiceAccount;
pub use datastore::DatastoreStore;
pub use error::{StoreError, StoreResult};
pub use factory::{open_store, open_store_from_config};
pub use file::FileStore;

pub use blobstore_codec::{CodecError, CodecResult, FieldReader, FieldValue, FieldWriter, Record};
