//! File-based blob store for local use.

use crate::backend::BlobStore;
use crate::config::StoreSettings;
use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A blob store that keeps each record as a JSON file.
///
/// Records of the store called `name` live in `<files_path>/<name>/`, one
/// file per key with the key as the file name.
///
/// # Thread Safety
///
/// Every operation holds one lock for its whole duration, I/O included, so
/// operations on the same instance never interleave. Nothing guards against
/// other processes writing the same directory.
///
/// # Example
///
/// ```no_run
/// use blobstore_storage::{BlobStore, FileStore};
/// use std::collections::BTreeMap;
/// use std::path::Path;
///
/// let store: FileStore<BTreeMap<String, String>> =
///     FileStore::open("notes", Path::new("data")).unwrap();
/// store.store("first", &BTreeMap::from([("Text".into(), "hi".into())])).unwrap();
/// ```
pub struct FileStore<R> {
    name: String,
    path: PathBuf,
    lock: Mutex<()>,
    _record: PhantomData<fn() -> R>,
}

impl<R> FileStore<R> {
    /// Opens the store called `name` under `files_path`, creating its
    /// directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a usable directory name or the
    /// directory cannot be created.
    pub fn open(name: &str, files_path: &Path) -> StoreResult<Self> {
        validate_key(name)?;
        let path = files_path.join(name);
        fs::create_dir_all(&path).map_err(|e| {
            StoreError::io(format!("unable to create directory {}", path.display()), e)
        })?;

        info!(store = name, path = %path.display(), "opened file store");

        Ok(Self {
            name: name.to_string(),
            path,
            lock: Mutex::new(()),
            _record: PhantomData,
        })
    }

    /// Opens the store called `name` under the configured files path.
    ///
    /// # Errors
    ///
    /// Same as [`FileStore::open`].
    pub fn from_settings(name: &str, settings: &StoreSettings) -> StoreResult<Self> {
        Self::open(name, &settings.files_path)
    }

    /// Returns the directory holding this store's files.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_path(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.path.join(key))
    }

    fn not_found(&self, key: &str) -> StoreError {
        warn!(domain = %self.name, key, "record not found");
        StoreError::NotFound {
            domain: self.name.clone(),
            key: key.to_string(),
        }
    }
}

fn read_record<R: DeserializeOwned>(path: &Path) -> StoreResult<R> {
    let bytes = fs::read(path)
        .map_err(|e| StoreError::io(format!("unable to load file {}", path.display()), e))?;
    Ok(blobstore_codec::from_json(&bytes)?)
}

impl<R> BlobStore<R> for FileStore<R>
where
    R: Serialize + DeserializeOwned,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn store(&self, key: &str, record: &R) -> StoreResult<()> {
        let path = self.file_path(key)?;
        let bytes = blobstore_codec::to_json(record)?;

        let _guard = self.lock.lock();
        let write = || -> io::Result<()> {
            let mut file = File::create(&path)?;
            file.write_all(&bytes)?;
            file.sync_all()
        };
        write().map_err(|e| StoreError::io(format!("unable to store file {}", path.display()), e))?;

        debug!(domain = %self.name, key, bytes = bytes.len(), "stored record");
        Ok(())
    }

    fn load(&self, key: &str) -> StoreResult<R> {
        let path = self.file_path(key)?;

        let _guard = self.lock.lock();
        if !path.is_file() {
            return Err(self.not_found(key));
        }
        let record = read_record(&path)?;

        debug!(domain = %self.name, key, "loaded record");
        Ok(record)
    }

    fn load_all(&self) -> StoreResult<Vec<R>> {
        let _guard = self.lock.lock();

        let read_dir_error = |e: io::Error| {
            StoreError::io(format!("unable to read directory {}", self.path.display()), e)
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path).map_err(read_dir_error)? {
            let entry = entry.map_err(read_dir_error)?;
            if entry.file_type().map_err(read_dir_error)?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();

        let records = files
            .iter()
            .map(|path| read_record(path))
            .collect::<StoreResult<Vec<R>>>()?;

        debug!(domain = %self.name, count = records.len(), "loaded all records");
        Ok(records)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let path = self.file_path(key)?;

        let _guard = self.lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(domain = %self.name, key, "deleted record");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(self.not_found(key)),
            Err(e) => Err(StoreError::io(
                format!("unable to delete file {}", path.display()),
                e,
            )),
        }
    }
}

impl<R> std::fmt::Debug for FileStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Keys are used as file names, so they must be a single path component.
fn validate_key(key: &str) -> StoreResult<()> {
    let reason = if key.is_empty() {
        "key is empty"
    } else if key == "." || key == ".." {
        "key is a relative directory name"
    } else if key.contains(['/', '\\']) {
        "key contains a path separator"
    } else if key.contains('\0') {
        "key contains a NUL byte"
    } else {
        return Ok(());
    };

    Err(StoreError::InvalidKey {
        key: key.to_string(),
        reason,
    })
}
