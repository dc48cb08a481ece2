// # File Record Cache
//
// File-based implementation of RecordCache.
//
// ## Purpose
//
// Persists the last known provider state across runs so that an unchanged
// address costs no API call. The updater is started by a periodic scheduler
// and a previous run may still be active, so writes must be safe against
// overlap and crashes.
//
// ## Write Protocol
//
// 1. Take an exclusive OS lock on `<cache>.lock`
// 2. Re-read the current file (another run may have stored other entries)
// 3. Replace the entry for the record's key
// 4. Write a temporary file, fsync it, rename it over the cache file
// 5. Release the lock
//
// Readers never lock: the rename guarantees they see either the old or the
// new file, never a partial one. The lock is held for one read-modify-write
// cycle only and never across a provider call.
//
// ## Corruption
//
// A file that fails to parse is a cache miss (logged), not an error. The next
// successful store replaces it with a valid file.
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "records": [
//     {
//       "name": "home",
//       "type": "AAAA",
//       "value": "2001:db8::1",
//       "id": "4711",
//       "zone_id": "123456",
//       "updated_at": "2025-01-09T12:00:00Z"
//     }
//   ]
// }
// ```

use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::Error;
use crate::record::{Record, RecordKey};
use crate::traits::record_cache::RecordCache;

/// Cache file format version
/// Used for future migration if format changes
const CACHE_FILE_VERSION: &str = "1.0";

/// Serializable cache file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct CacheFileFormat {
    version: String,
    #[serde(default)]
    records: Vec<Record>,
}

/// File-based record cache with locked atomic writes
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::cache::FileRecordCache;
/// use ddns_core::traits::RecordCache;
/// use ddns_core::{Record, RecordKey, RecordType};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let cache = FileRecordCache::new("/var/lib/ddns/records.json");
///
///     let record = Record::new("123456", "home", RecordType::A, "1.2.3.4").with_id("4711");
///     cache.store(&record).await?;
///
///     let cached = cache.load(&RecordKey::new("home", RecordType::A)).await;
///     assert_eq!(cached, Some(record));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileRecordCache {
    path: PathBuf,
}

impl FileRecordCache {
    /// Create a cache backed by `path`
    ///
    /// Nothing is read or created until the first `load` / `store`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all entries, distinguishing absence from corruption
    ///
    /// - missing file → `Ok(vec![])`
    /// - unparsable content → `Err(Error::CacheCorruption)`
    pub async fn entries(&self) -> Result<Vec<Record>, Error> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => parse_entries(&self.path, &content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Cache file does not exist: {}", self.path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(Error::cache_corruption(format!(
                "Failed to read cache file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Get path to the lock file (`records.json.lock`)
    fn lock_path(path: &Path) -> PathBuf {
        Self::sibling_path(path, ".lock")
    }

    /// Get path to temporary file for atomic writes (`records.json.tmp`)
    fn temp_path(path: &Path) -> PathBuf {
        Self::sibling_path(path, ".tmp")
    }

    /// `path` with `suffix` appended to the full file name
    fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// One locked read-modify-write cycle (blocking I/O)
    fn store_blocking(path: &Path, record: &Record) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::cache(format!(
                        "Failed to create cache directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let lock_path = Self::lock_path(path);
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| {
                Error::cache(format!(
                    "Failed to open lock file {}: {}",
                    lock_path.display(),
                    e
                ))
            })?;

        lock_file.lock().map_err(|e| {
            Error::cache(format!(
                "Failed to lock {}: {}",
                lock_path.display(),
                e
            ))
        })?;
        tracing::trace!("Acquired cache lock {}", lock_path.display());

        let result = Self::replace_entry(path, record);

        if let Err(e) = lock_file.unlock() {
            tracing::warn!("Failed to release cache lock {}: {}", lock_path.display(), e);
        }
        result
    }

    /// Replace the entry for `record` while the lock is held
    fn replace_entry(path: &Path, record: &Record) -> Result<(), Error> {
        let mut records = match std::fs::read_to_string(path) {
            Ok(content) => match parse_entries(path, &content) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!("{}. Rewriting cache from scratch.", e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    "Failed to read cache file {}: {}. Rewriting cache from scratch.",
                    path.display(),
                    e
                );
                Vec::new()
            }
        };

        let key = record.key();
        records.retain(|existing| existing.key() != key);
        records.push(record.clone());
        records.sort_by_key(Record::key);

        let cache_file = CacheFileFormat {
            version: CACHE_FILE_VERSION.to_string(),
            records,
        };
        let json = serde_json::to_string_pretty(&cache_file)
            .map_err(|e| Error::cache(format!("Failed to serialize cache: {}", e)))?;

        // Write to temporary file first
        let temp_path = Self::temp_path(path);
        {
            let mut file = File::create(&temp_path).map_err(|e| {
                Error::cache(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).map_err(|e| {
                Error::cache(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().map_err(|e| {
                Error::cache(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Atomic rename (temp -> actual)
        std::fs::rename(&temp_path, path).map_err(|e| {
            Error::cache(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::trace!("Cache written to file: {}", path.display());
        Ok(())
    }
}

fn parse_entries(path: &Path, content: &str) -> Result<Vec<Record>, Error> {
    let cache_file: CacheFileFormat = serde_json::from_str(content).map_err(|e| {
        Error::cache_corruption(format!(
            "Failed to parse cache file {}: {}",
            path.display(),
            e
        ))
    })?;

    if cache_file.version != CACHE_FILE_VERSION {
        tracing::warn!(
            "Cache file version mismatch: expected {}, got {}. \
            Attempting to load anyway.",
            CACHE_FILE_VERSION,
            cache_file.version
        );
    }

    Ok(cache_file.records)
}

#[async_trait]
impl RecordCache for FileRecordCache {
    async fn load(&self, key: &RecordKey) -> Option<Record> {
        match self.entries().await {
            Ok(records) => records.into_iter().find(|record| record.key() == *key),
            Err(e) => {
                tracing::warn!("{}. Treating as cache miss.", e);
                None
            }
        }
    }

    async fn store(&self, record: &Record) -> Result<(), Error> {
        let path = self.path.clone();
        let record = record.clone();

        tokio::task::spawn_blocking(move || Self::store_blocking(&path, &record))
            .await
            .map_err(|e| Error::cache(format!("Cache write task failed: {}", e)))?
    }
}
