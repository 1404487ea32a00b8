//! Get command implementation.

use super::{write_json, CommandResult};
use crate::document::Document;
use blobstore_storage::BlobStore;
use std::io::Write;

/// Prints the document stored under `key`.
pub fn run(store: &dyn BlobStore<Document>, key: &str, out: &mut dyn Write) -> CommandResult {
    let document = store.load(key)?;
    write_json(out, &document)
}
