//! Store configuration.
//!
//! Settings are read from any [`ConfigSource`] (a plain map, or a JSON file
//! through [`JsonConfig`]) and validated into a typed [`StoreSettings`].

use crate::error::{StoreError, StoreResult};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Configuration key names.
pub mod keys {
    /// Backend selector: `file` or `datastore`.
    pub const STORE_TYPE: &str = "store.type";
    /// Suffix appended to the store name to form the Datastore kind.
    pub const DOMAIN_POSTFIX: &str = "store.domainPostfix";
    /// Root directory of the file backend.
    pub const FILES_PATH: &str = "filesPath";
    /// Path of the Google service account JSON file.
    pub const SERVICE_ACCOUNT_FILE: &str = "gcpServiceAccountJSONFile";
    /// Datastore REST endpoint override.
    pub const DATASTORE_ENDPOINT: &str = "store.datastoreEndpoint";
    /// Bearer token sent with Datastore requests.
    pub const ACCESS_TOKEN: &str = "store.accessToken";
    /// `check-then-write` or `upsert`.
    pub const WRITE_MODE: &str = "store.writeMode";
    /// Datastore request timeout in seconds.
    pub const REQUEST_TIMEOUT_SECS: &str = "store.requestTimeoutSecs";
}

/// Default Datastore v1 REST endpoint.
pub const DEFAULT_DATASTORE_ENDPOINT: &str = "https://datastore.googleapis.com/v1";

/// A source of string configuration values.
pub trait ConfigSource {
    /// Returns the value stored under `name`, if any.
    fn get_string(&self, name: &str) -> Option<String>;
}

impl<S: BuildHasher> ConfigSource for HashMap<String, String, S> {
    fn get_string(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl ConfigSource for BTreeMap<String, String> {
    fn get_string(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Configuration read from a JSON document.
///
/// Dotted names walk nested objects, so `store.type` matches
/// `{"store": {"type": "file"}}`. A literal `"store.type"` key at the top
/// level is used when the nested lookup finds nothing.
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    root: serde_json::Value,
}

impl JsonConfig {
    /// Wraps an already parsed JSON value.
    #[must_use]
    pub fn from_value(root: serde_json::Value) -> Self {
        Self { root }
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not valid JSON.
    pub fn parse(text: &str) -> StoreResult<Self> {
        let root = serde_json::from_str(text)
            .map_err(|e| StoreError::Config(format!("invalid JSON configuration: {e}")))?;
        Ok(Self { root })
    }

    /// Loads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StoreError::io(format!("unable to read config file {}", path.display()), e)
        })?;
        Self::parse(&text)
    }

    fn lookup(&self, name: &str) -> Option<&serde_json::Value> {
        name.split('.')
            .try_fold(&self.root, |value, segment| value.get(segment))
            .or_else(|| self.root.get(name))
    }
}

impl ConfigSource for JsonConfig {
    fn get_string(&self, name: &str) -> Option<String> {
        match self.lookup(name)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// The backend selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreType {
    /// One JSON file per key in a local directory.
    #[default]
    File,
    /// One entity per key in Google Cloud Datastore.
    Datastore,
}

impl FromStr for StoreType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "file" => Ok(Self::File),
            "datastore" => Ok(Self::Datastore),
            _ => Err(StoreError::UnsupportedStoreType(normalized)),
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Datastore => f.write_str("datastore"),
        }
    }
}

/// How the Datastore backend writes a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Query for the key, then insert or update.
    ///
    /// The query and the commit are separate requests, so two writers of the
    /// same new key can both choose insert and one of them will fail.
    #[default]
    CheckThenWrite,
    /// Commit a single upsert mutation without querying first.
    Upsert,
}

impl FromStr for WriteMode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "check-then-write" => Ok(Self::CheckThenWrite),
            "upsert" => Ok(Self::Upsert),
            other => Err(StoreError::Config(format!("unknown write mode: {other}"))),
        }
    }
}

/// Settings for opening a store.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Which backend to open.
    pub store_type: StoreType,

    /// Suffix appended to the store name to form the Datastore kind.
    pub domain_postfix: String,

    /// Root directory of the file backend. Each store gets a subdirectory.
    pub files_path: PathBuf,

    /// Path of the service account JSON file (Datastore backend).
    pub credentials_path: Option<PathBuf>,

    /// Datastore REST endpoint.
    pub datastore_endpoint: String,

    /// Bearer token sent with Datastore requests.
    pub access_token: Option<String>,

    /// Insert/update strategy of the Datastore backend.
    pub write_mode: WriteMode,

    /// Timeout of a single Datastore request.
    pub request_timeout: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_type: StoreType::File,
            domain_postfix: String::new(),
            files_path: PathBuf::from("."),
            credentials_path: None,
            datastore_endpoint: DEFAULT_DATASTORE_ENDPOINT.to_string(),
            access_token: None,
            write_mode: WriteMode::CheckThenWrite,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl StoreSettings {
    /// Creates settings for a file store rooted at `files_path`.
    #[must_use]
    pub fn file(files_path: impl Into<PathBuf>) -> Self {
        Self {
            store_type: StoreType::File,
            files_path: files_path.into(),
            ..Self::default()
        }
    }

    /// Creates settings for a Datastore store using a service account file.
    #[must_use]
    pub fn datastore(credentials_path: impl Into<PathBuf>) -> Self {
        Self {
            store_type: StoreType::Datastore,
            credentials_path: Some(credentials_path.into()),
            ..Self::default()
        }
    }

    /// Reads and validates settings from a configuration source.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedStoreType`] for an unknown or
    /// missing `store.type`, and [`StoreError::Config`] when a value the
    /// selected backend needs is missing or malformed.
    pub fn from_source(source: &dyn ConfigSource) -> StoreResult<Self> {
        let store_type: StoreType = source
            .get_string(keys::STORE_TYPE)
            .unwrap_or_default()
            .parse()?;

        let mut settings = Self {
            store_type,
            ..Self::default()
        };

        if let Some(postfix) = source.get_string(keys::DOMAIN_POSTFIX) {
            settings.domain_postfix = postfix;
        }
        if let Some(endpoint) = non_empty(source.get_string(keys::DATASTORE_ENDPOINT)) {
            settings.datastore_endpoint = endpoint;
        }
        settings.access_token = non_empty(source.get_string(keys::ACCESS_TOKEN));
        settings.credentials_path =
            non_empty(source.get_string(keys::SERVICE_ACCOUNT_FILE)).map(PathBuf::from);
        if let Some(mode) = non_empty(source.get_string(keys::WRITE_MODE)) {
            settings.write_mode = mode.parse()?;
        }
        if let Some(secs) = non_empty(source.get_string(keys::REQUEST_TIMEOUT_SECS)) {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                StoreError::Config(format!("{} must be a number of seconds: {e}", keys::REQUEST_TIMEOUT_SECS))
            })?;
            settings.request_timeout = Duration::from_secs(secs);
        }

        match store_type {
            StoreType::File => {
                let path = non_empty(source.get_string(keys::FILES_PATH))
                    .ok_or_else(|| StoreError::Config(format!("{} is not set", keys::FILES_PATH)))?;
                settings.files_path = PathBuf::from(path);
            }
            StoreType::Datastore => {
                if settings.credentials_path.is_none() {
                    return Err(StoreError::Config(format!(
                        "{} is not set",
                        keys::SERVICE_ACCOUNT_FILE
                    )));
                }
            }
        }

        Ok(settings)
    }

    /// Sets the domain postfix.
    #[must_use]
    pub fn domain_postfix(mut self, postfix: impl Into<String>) -> Self {
        self.domain_postfix = postfix.into();
        self
    }

    /// Sets the Datastore endpoint.
    #[must_use]
    pub fn datastore_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.datastore_endpoint = endpoint.into();
        self
    }

    /// Sets the bearer token for Datastore requests.
    #[must_use]
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Sets the Datastore write mode.
    #[must_use]
    pub const fn write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Sets the Datastore request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the domain (Datastore kind) of the store called `name`.
    #[must_use]
    pub fn domain_name(&self, name: &str) -> String {
        format!("{name}{}", self.domain_postfix)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn store_type_is_case_insensitive() {
        assert_eq!("FILE".parse::<StoreType>().unwrap(), StoreType::File);
        assert_eq!("DataStore".parse::<StoreType>().unwrap(), StoreType::Datastore);
    }

    #[test]
    fn unknown_store_type_fails() {
        let err = "simpledb".parse::<StoreType>().unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedStoreType(ref t) if t == "simpledb"));
        assert_eq!(err.to_string(), "unsupported store type: simpledb");
    }

    #[test]
    fn file_settings_from_map() {
        let settings = StoreSettings::from_source(&source(&[
            ("store.type", "file"),
            ("filesPath", "/var/lib/blobs"),
            ("store.domainPostfix", "-dev"),
        ]))
        .unwrap();

        assert_eq!(settings.store_type, StoreType::File);
        assert_eq!(settings.files_path, PathBuf::from("/var/lib/blobs"));
        assert_eq!(settings.domain_name("deployments"), "deployments-dev");
        assert_eq!(settings.write_mode, WriteMode::CheckThenWrite);
    }

    #[test]
    fn file_settings_require_path() {
        let err = StoreSettings::from_source(&source(&[("store.type", "file")])).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn datastore_settings_require_credentials() {
        let err =
            StoreSettings::from_source(&source(&[("store.type", "datastore")])).unwrap_err();
        assert!(err.to_string().contains("gcpServiceAccountJSONFile"));

        let settings = StoreSettings::from_source(&source(&[
            ("store.type", "datastore"),
            ("gcpServiceAccountJSONFile", "/etc/sa.json"),
            ("store.writeMode", "Upsert"),
            ("store.requestTimeoutSecs", "5"),
        ]))
        .unwrap();
        assert_eq!(settings.credentials_path, Some(PathBuf::from("/etc/sa.json")));
        assert_eq!(settings.write_mode, WriteMode::Upsert);
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.datastore_endpoint, DEFAULT_DATASTORE_ENDPOINT);
    }

    #[test]
    fn missing_store_type_is_unsupported() {
        let err = StoreSettings::from_source(&source(&[])).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedStoreType(ref t) if t.is_empty()));
    }

    #[test]
    fn json_config_dotted_lookup() {
        let config = JsonConfig::parse(
            r#"{
                "store": {"type": "File", "domainPostfix": "_prod", "requestTimeoutSecs": 10},
                "filesPath": "/data",
                "store.accessToken": "token"
            }"#,
        )
        .unwrap();

        assert_eq!(config.get_string("store.type").as_deref(), Some("File"));
        assert_eq!(config.get_string("store.requestTimeoutSecs").as_deref(), Some("10"));
        assert_eq!(config.get_string("store.accessToken").as_deref(), Some("token"));
        assert_eq!(config.get_string("store"), None);
        assert_eq!(config.get_string("missing.key"), None);

        let settings = StoreSettings::from_source(&config).unwrap();
        assert_eq!(settings.files_path, PathBuf::from("/data"));
        assert_eq!(settings.domain_postfix, "_prod");
        assert_eq!(settings.access_token.as_deref(), Some("token"));
    }

    #[test]
    fn json_config_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"store":{"type":"file"},"filesPath":"blobs"}"#).unwrap();

        let config = JsonConfig::load(&path).unwrap();
        assert_eq!(config.get_string("filesPath").as_deref(), Some("blobs"));

        let err = JsonConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn builder_pattern() {
        let settings = StoreSettings::datastore("/etc/sa.json")
            .domain_postfix("Test")
            .datastore_endpoint("http://localhost:8081/v1")
            .write_mode(WriteMode::Upsert)
            .request_timeout(Duration::from_secs(2));

        assert_eq!(settings.store_type, StoreType::Datastore);
        assert_eq!(settings.domain_name("store"), "storeTest");
        assert_eq!(settings.datastore_endpoint, "http://localhost:8081/v1");
        assert_eq!(settings.request_timeout, Duration::from_secs(2));
    }
}
