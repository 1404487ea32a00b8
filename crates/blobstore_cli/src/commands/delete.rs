//! Delete command implementation.

use super::{write_json, CommandResult};
use crate::document::Document;
use blobstore_storage::BlobStore;
use serde::Serialize;
use std::io::Write;
use tracing::info;

#[derive(Debug, Serialize)]
struct Deleted<'a> {
    deleted: &'a str,
}

/// Removes the document stored under `key`.
pub fn run(store: &dyn BlobStore<Document>, key: &str, out: &mut dyn Write) -> CommandResult {
    store.delete(key)?;
    info!("Deleted {} from {}", key, store.name());
    write_json(out, &Deleted { deleted: key })
}
