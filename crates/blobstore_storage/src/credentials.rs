//! Google service account file parsing.

use crate::error::{StoreError, StoreResult};
use serde::Deserialize;
use std::path::Path;

/// The parts of a service account JSON file the Datastore backend uses.
///
/// Token exchange is not done here; only the project id is needed to
/// address entities.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceAccount {
    /// Google Cloud project that owns the Datastore.
    pub project_id: String,

    /// Service account email, used in log output.
    #[serde(default)]
    pub client_email: Option<String>,
}

impl ServiceAccount {
    /// Reads a service account JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Credentials`] if the file cannot be read, is not
    /// valid JSON, or has an empty `project_id`.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let credentials_error = |message: String| StoreError::Credentials {
            path: path.to_path_buf(),
            message,
        };

        let bytes = std::fs::read(path).map_err(|e| credentials_error(e.to_string()))?;
        let account: Self =
            serde_json::from_slice(&bytes).map_err(|e| credentials_error(e.to_string()))?;

        if account.project_id.trim().is_empty() {
            return Err(credentials_error("project_id is empty".into()));
        }

        Ok(account)
    }
}
