//! Backend selection from configuration.

use crate::backend::BlobStore;
use crate::config::{ConfigSource, StoreSettings, StoreType};
use crate::datastore::DatastoreStore;
use crate::error::StoreResult;
use crate::file::FileStore;
use blobstore_codec::Record;

/// Opens the store called `name` with the backend the settings select.
///
/// # Errors
///
/// Returns an error if the selected backend cannot be opened.
///
/// # Example
///
/// ```no_run
/// use blobstore_storage::{open_store, StoreSettings};
///
/// # #[derive(serde::Serialize, serde::Deserialize)]
/// # struct Note { text: String }
/// # impl blobstore_storage::Record for Note {
/// #     fn write_fields(&self, f: &mut blobstore_storage::FieldWriter) { f.field("Text", &self.text); }
/// #     fn read_fields(f: &blobstore_storage::FieldReader<'_>) -> blobstore_storage::CodecResult<Self> {
/// #         Ok(Self { text: f.get("Text")? })
/// #     }
/// # }
/// let store = open_store::<Note>("notes", &StoreSettings::file("data")).unwrap();
/// store.store("first", &Note { text: "hello".into() }).unwrap();
/// ```
pub fn open_store<R>(name: &str, settings: &StoreSettings) -> StoreResult<Box<dyn BlobStore<R>>>
where
    R: Record + 'static,
{
    let store: Box<dyn BlobStore<R>> = match settings.store_type {
        StoreType::File => Box::new(FileStore::<R>::from_settings(name, settings)?),
        StoreType::Datastore => Box::new(DatastoreStore::<R>::open(name, settings)?),
    };
    Ok(store)
}

/// Reads settings from `source` and opens the store called `name`.
///
/// # Errors
///
/// Returns [`StoreError::UnsupportedStoreType`](crate::StoreError::UnsupportedStoreType)
/// if `store.type` names no known backend, a configuration error if the
/// settings are incomplete, or any error from opening the backend.
pub fn open_store_from_config<R>(
    name: &str,
    source: &dyn ConfigSource,
) -> StoreResult<Box<dyn BlobStore<R>>>
where
    R: Record + 'static,
{
    open_store(name, &StoreSettings::from_source(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use blobstore_codec::{CodecResult, FieldReader, FieldWriter};
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Deployment {
        name: String,
        kind: String,
    }

    impl Record for Deployment {
        fn write_fields(&self, fields: &mut FieldWriter) {
            fields.field("Name", &self.name).field("Type", &self.kind);
        }

        fn read_fields(fields: &FieldReader<'_>) -> CodecResult<Self> {
            Ok(Self {
                name: fields.get("Name")?,
                kind: fields.get("Type")?,
            })
        }
    }

    fn config(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn opens_file_store_case_insensitively() {
        let dir = tempdir().unwrap();
        let files_path = dir.path().to_string_lossy().into_owned();

        for store_type in ["file", "FILE", "File"] {
            let store = open_store_from_config::<Deployment>(
                "testStore",
                &config(&[("store.type", store_type), ("filesPath", files_path.as_str())]),
            )
            .unwrap();
            assert_eq!(store.name(), "testStore");
        }
        assert!(dir.path().join("testStore").is_dir());
    }

    #[test]
    fn file_store_round_trip_through_factory() {
        let dir = tempdir().unwrap();
        let store = open_store::<Deployment>("testStore", &StoreSettings::file(dir.path())).unwrap();

        let redis = Deployment {
            name: "redis".into(),
            kind: "GCP".into(),
        };
        store.store("redis", &redis).unwrap();
        assert_eq!(store.load("redis").unwrap(), redis);
    }

    #[test]
    fn opens_datastore_store() {
        let dir = tempdir().unwrap();
        let credentials = dir.path().join("sa.json");
        std::fs::write(&credentials, r#"{"project_id":"test-179902"}"#).unwrap();
        let credentials = credentials.to_string_lossy().into_owned();

        let store = open_store_from_config::<Deployment>(
            "testStore",
            &config(&[
                ("store.type", "Datastore"),
                ("gcpServiceAccountJSONFile", credentials.as_str()),
                ("store.datastoreEndpoint", "http://127.0.0.1:9/v1"),
            ]),
        )
        .unwrap();
        assert_eq!(store.name(), "testStore");
    }

    #[test]
    fn unsupported_type_fails() {
        let result = open_store_from_config::<Deployment>(
            "testStore",
            &config(&[("store.type", "simpledb"), ("filesPath", "/tmp")]),
        );
        match result {
            Err(StoreError::UnsupportedStoreType(t)) => assert_eq!(t, "simpledb"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("simpledb should not open"),
        }
    }
}
