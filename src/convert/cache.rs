//! Content-addressed conversion cache.
//!
//! Entries are keyed by `<source sha256>:<mapping identity>:<direction>` and
//! point at a copy of the produced output kept inside the cache directory.
//! The index lives in `index.json` next to those copies.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use super::{ConversionDirection, ConvertError};

const INDEX_FILE: &str = "index.json";
const OBJECTS_DIR: &str = "objects";

/// One cached conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// SHA-256 of the source content
    pub hash: String,
    /// Cached copy of the produced output
    pub output_path: PathBuf,
    /// Source the entry was produced from (informational)
    pub source_path: PathBuf,
    /// When the entry was written (RFC 3339)
    pub timestamp: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheIndex {
    #[serde(default)]
    entries: HashMap<String, CacheEntry>,
}

/// Size summary of the cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    /// Number of files under the cache directory
    pub file_count: usize,
    /// Total bytes of those files
    pub total_size: u64,
    /// Cache directory
    pub cache_dir: String,
    /// False when part of the directory could not be read
    pub complete: bool,
}

/// Cache shared by every worker of a batch.
#[derive(Debug)]
pub struct ConversionCache {
    dir: PathBuf,
    index: Mutex<CacheIndex>,
}

impl ConversionCache {
    /// Opens (or prepares) the cache at `dir`. A missing or unreadable index
    /// starts empty.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let index_path = dir.join(INDEX_FILE);
        let index = match fs::read_to_string(&index_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring corrupt cache index {}: {}", index_path.display(), e);
                CacheIndex::default()
            }),
            Err(_) => CacheIndex::default(),
        };
        Self {
            dir,
            index: Mutex::new(index),
        }
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Builds the cache key for one conversion.
    pub fn key(source_hash: &str, mapping_identity: &str, direction: ConversionDirection) -> String {
        format!("{source_hash}:{mapping_identity}:{direction}")
    }

    /// Number of index entries.
    pub fn len(&self) -> usize {
        self.index.lock().unwrap().entries.len()
    }

    /// True when the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serves a hit into `requested`.
    ///
    /// Returns `Ok(true)` when an entry exists and its cached output is still
    /// on disk; the output is copied to `requested` unless it already is that
    /// file.
    pub fn fetch(&self, key: &str, requested: &Path) -> Result<bool, ConvertError> {
        let cached = {
            let index = self.index.lock().unwrap();
            match index.entries.get(key) {
                Some(entry) if entry.output_path.exists() => entry.output_path.clone(),
                _ => return Ok(false),
            }
        };

        if cached != requested {
            fs::copy(&cached, requested).map_err(|e| {
                ConvertError::io(format!("Failed to copy cached {}", cached.display()), e)
            })?;
        }
        debug!("Cache hit {} -> {}", key, requested.display());
        Ok(true)
    }

    /// Records a fresh conversion, keeping a copy of `output` in the cache.
    pub fn store(
        &self,
        key: &str,
        source_hash: &str,
        source: &Path,
        output: &Path,
        direction: ConversionDirection,
    ) -> Result<(), ConvertError> {
        let objects = self.dir.join(OBJECTS_DIR);
        fs::create_dir_all(&objects)
            .map_err(|e| ConvertError::io("Failed to create cache directory", e))?;

        let key_digest = format!("{:x}", Sha256::digest(key.as_bytes()));
        let cached = objects.join(format!("{}.{}", &key_digest[..16], direction.output_extension()));
        fs::copy(output, &cached)
            .map_err(|e| ConvertError::io("Failed to copy output into cache", e))?;

        self.index.lock().unwrap().entries.insert(
            key.to_string(),
            CacheEntry {
                hash: source_hash.to_string(),
                output_path: cached,
                source_path: source.to_path_buf(),
                timestamp: Utc::now().to_rfc3339(),
            },
        );
        Ok(())
    }

    /// Persists the index atomically.
    pub fn flush(&self) -> Result<(), ConvertError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| ConvertError::io("Failed to create cache directory", e))?;
        let content = {
            let index = self.index.lock().unwrap();
            serde_json::to_string_pretty(&*index)
                .map_err(|e| ConvertError::Codec(format!("Failed to serialize cache index: {e}")))?
        };

        let index_path = self.dir.join(INDEX_FILE);
        let temp_path = index_path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .map_err(|e| ConvertError::io("Failed to write cache index", e))?;
        fs::rename(&temp_path, &index_path)
            .map_err(|e| ConvertError::io("Failed to replace cache index", e))
    }

    /// Counts files and bytes under the cache directory.
    pub fn info(&self) -> CacheInfo {
        fn visit(dir: &Path, count: &mut usize, size: &mut u64) -> std::io::Result<()> {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    visit(&path, count, size)?;
                } else {
                    *count += 1;
                    *size += fs::metadata(&path)?.len();
                }
            }
            Ok(())
        }

        let mut file_count = 0;
        let mut total_size = 0;
        let mut complete = true;
        if self.dir.exists() {
            if let Err(e) = visit(&self.dir, &mut file_count, &mut total_size) {
                warn!("Failed to scan cache directory {}: {}", self.dir.display(), e);
                complete = false;
            }
        }
        CacheInfo {
            file_count,
            total_size,
            cache_dir: self.dir.display().to_string(),
            complete,
        }
    }

    /// Deletes every cached file and empties the index.
    pub fn clear(&self) -> Result<(), ConvertError> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)
                .map_err(|e| ConvertError::io("Failed to remove cache directory", e))?;
        }
        self.index.lock().unwrap().entries.clear();
        Ok(())
    }
}

/// Calculates the SHA-256 of a file.
pub fn hash_file(path: &Path) -> Result<String, std::io::Error> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
