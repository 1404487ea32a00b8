//! List command implementation.

use super::{write_json, CommandResult};
use crate::document::Document;
use blobstore_storage::BlobStore;
use std::io::Write;
use tracing::info;

/// Prints every document of the store as a JSON array.
pub fn run(store: &dyn BlobStore<Document>, out: &mut dyn Write) -> CommandResult {
    let documents = store.load_all()?;
    info!("Listing {} documents from {}", documents.len(), store.name());
    write_json(out, &documents)
}
