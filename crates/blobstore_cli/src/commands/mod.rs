//! CLI command implementations.
//!
//! Each command takes an opened store and writes JSON to the given output.

pub mod delete;
pub mod get;
pub mod list;
pub mod put;

use crate::document::Document;
use blobstore_storage::{open_store, BlobStore, JsonConfig, StoreSettings};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Result type shared by the commands.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Root directory used when no configuration file is given.
pub const DEFAULT_FILES_PATH: &str = "data";

/// Opens the document store called `name`.
///
/// Settings come from the JSON file at `config`, or a file store under
/// [`DEFAULT_FILES_PATH`] when no file is given.
pub fn open_documents(
    name: &str,
    config: Option<&Path>,
) -> Result<Box<dyn BlobStore<Document>>, Box<dyn std::error::Error>> {
    let settings = match config {
        Some(path) => {
            debug!("Reading configuration from {:?}", path);
            StoreSettings::from_source(&JsonConfig::load(path)?)?
        }
        None => StoreSettings::file(DEFAULT_FILES_PATH),
    };
    Ok(open_store(name, &settings)?)
}

fn write_json<T: serde::Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> CommandResult {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobstore_storage::StoreError;
    use tempfile::tempdir;

    #[test]
    fn opens_store_from_config_file() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("config.json");
        let body = serde_json::json!({
            "store": {"type": "file"},
            "filesPath": dir.path().join("blobs"),
        });
        std::fs::write(&config, body.to_string()).unwrap();

        let store = open_documents("deployments", Some(&config)).unwrap();
        assert_eq!(store.name(), "deployments");
        assert!(dir.path().join("blobs").join("deployments").is_dir());
    }

    #[test]
    fn unknown_store_type_is_reported() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(&config, r#"{"store": {"type": "simpledb"}}"#).unwrap();

        let Err(err) = open_documents("deployments", Some(&config)) else {
            panic!("simpledb should not open");
        };
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::UnsupportedStoreType(_))
        ));
    }
}
