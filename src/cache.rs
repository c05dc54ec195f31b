//! TTL key-value store for aggregate sentiment values.
//!
//! The engine only needs `get`/`put` with a per-entry time-to-live; expired
//! entries are treated as absent. [`FileCache`] persists entries as JSON
//! files so cached scores survive process restarts; [`MemoryCache`] backs
//! tests and embedded use.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Default time-to-live for cached aggregate scores.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Key-value store with per-entry expiry.
///
/// `put` with `ttl_secs == 0` produces an entry that is already expired and
/// must be treated as absent on the next `get`.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<f64>;
    fn put(&self, key: &str, value: f64, ttl_secs: u64);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    key: String,
    value: f64,
    /// Unix seconds after which the entry is invalid.
    expires_at: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
}

// ------------------------------------------------------------
// File-backed cache
// ------------------------------------------------------------

/// Directory of JSON entry files, one per key.
///
/// File names are sha256-derived so arbitrary query strings never escape the
/// cache directory. Writes go through a `.tmp` file and an atomic rename.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let _ = fs::create_dir_all(&dir); // best-effort
        Self { dir }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let digest = hasher.finalize();
        let mut name = String::with_capacity(32);
        for b in digest.iter().take(16) {
            use std::fmt::Write as _;
            let _ = write!(&mut name, "{:02x}", b);
        }
        self.dir.join(format!("{name}.json"))
    }

    fn read_entry(&self, key: &str) -> Option<CacheEntry> {
        let raw = fs::read_to_string(self.entry_path(key)).ok()?;
        let entry: CacheEntry = serde_json::from_str(&raw).ok()?;
        // Guard against hash collisions / stale files from other runs.
        if entry.key != key {
            return None;
        }
        Some(entry)
    }

    fn write_entry(&self, entry: &CacheEntry) -> io::Result<()> {
        let path = self.entry_path(&entry.key);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(entry).unwrap_or_else(|_| "{}".to_string());
        let mut f = fs::File::create(&tmp)?;
        f.write_all(json.as_bytes())?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    fn remove_entry(&self, key: &str) {
        let _ = fs::remove_file(self.entry_path(key));
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &str) -> Option<f64> {
        let entry = self.read_entry(key)?;
        if entry.is_expired(now_unix()) {
            self.remove_entry(key);
            return None;
        }
        Some(entry.value)
    }

    fn put(&self, key: &str, value: f64, ttl_secs: u64) {
        let entry = CacheEntry {
            key: key.to_string(),
            value,
            expires_at: now_unix().saturating_add(ttl_secs),
        };
        if let Err(e) = self.write_entry(&entry) {
            tracing::warn!(error = ?e, key, "failed to persist cache entry");
        }
    }
}

// ------------------------------------------------------------
// In-memory cache
// ------------------------------------------------------------

/// `Mutex<HashMap>` cache with the same expiry semantics as [`FileCache`].
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<f64> {
        let now = now_unix();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: &str, value: f64, ttl_secs: u64) {
        let entry = CacheEntry {
            key: key.to_string(),
            value,
            expires_at: now_unix().saturating_add(ttl_secs),
        };
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(key.to_string(), entry);
    }
}
