//! Put command implementation.

use super::{write_json, CommandResult};
use crate::document::Document;
use blobstore_storage::BlobStore;
use std::io::Write;
use tracing::info;

/// Stores a document built from `fields` under `key` and echoes it.
pub fn run(
    store: &dyn BlobStore<Document>,
    key: &str,
    fields: Vec<(String, String)>,
    out: &mut dyn Write,
) -> CommandResult {
    let document = Document::from_pairs(fields);
    store.store(key, &document)?;
    info!("Stored {} in {}", key, store.name());
    write_json(out, &document)
}
