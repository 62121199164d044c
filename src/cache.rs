use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Transcripts refresh hourly; summaries are expensive to regenerate and keep
/// for a day.
pub const TRANSCRIPT_TTL: Duration = Duration::from_secs(60 * 60);
pub const SUMMARY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    created_at: u64,
    ttl_secs: u64,
    value: serde_json::Value,
}

impl CacheEntry {
    fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.created_at) >= self.ttl_secs
    }
}

/// Key-value store with per-entry TTL, backed by JSON files.
///
/// Constructed once at process start and injected into the orchestrator. Every
/// operation is best-effort: when the backing directory is absent or a read or
/// write fails, the store behaves as a cache miss / no-op instead of failing
/// the pipeline.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: Option<PathBuf>,
}

impl CacheStore {
    pub fn new(dir: PathBuf) -> Self {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("Cache directory unavailable ({e}), caching disabled: {}", dir.display());
            return Self::disabled();
        }
        Self { dir: Some(dir) }
    }

    /// A store with no backing directory. Gets always miss, sets are dropped.
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    /// Default on-disk location: ~/.cache/ytsum
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache")).join("ytsum")
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.entry_path(key)?;
        let data = std::fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Dropping unreadable cache entry {}: {e}", path.display());
                let _ = std::fs::remove_file(&path);
                return None;
            }
        };

        if entry.is_expired(unix_now()) {
            debug!("Cache expired: {key}");
            let _ = std::fs::remove_file(&path);
            return None;
        }

        match serde_json::from_value(entry.value) {
            Ok(value) => {
                debug!("Cache hit: {key}");
                Some(value)
            }
            Err(e) => {
                warn!("Dropping cache entry with stale shape {key}: {e}");
                let _ = std::fs::remove_file(&path);
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let Some(path) = self.entry_path(key) else {
            return;
        };
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to serialize cache entry {key}: {e}");
                return;
            }
        };
        let entry = CacheEntry {
            created_at: unix_now(),
            ttl_secs: ttl.as_secs(),
            value,
        };
        match serde_json::to_string_pretty(&entry) {
            Ok(data) => {
                if let Err(e) = std::fs::write(&path, data) {
                    warn!("Failed to write cache entry {key}: {e}");
                } else {
                    debug!("Cached {key} with TTL {}s", ttl.as_secs());
                }
            }
            Err(e) => warn!("Failed to serialize cache entry {key}: {e}"),
        }
    }

    pub fn invalidate(&self, key: &str) {
        if let Some(path) = self.entry_path(key) {
            if std::fs::remove_file(&path).is_ok() {
                debug!("Invalidated cache entry: {key}");
            }
        }
    }

    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        // Keys are namespaced with ':' which is not filename-safe everywhere.
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
            .collect();
        Some(self.dir.as_ref()?.join(format!("{file_name}.json")))
    }
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, CacheStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    #[test]
    fn test_set_then_get() {
        let (_dir, store) = store();
        store.set("transcript:abc123def45", &"hello".to_string(), Duration::from_secs(60));
        let value: Option<String> = store.get("transcript:abc123def45");
        assert_eq!(value.as_deref(), Some("hello"));
    }

    #[test]
    fn test_miss_for_unknown_key() {
        let (_dir, store) = store();
        let value: Option<String> = store.get("transcript:missing12345");
        assert_eq!(value, None);
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let (_dir, store) = store();
        store.set("summary:abc123def45:quick:v1", &42u32, Duration::from_secs(0));
        let value: Option<u32> = store.get("summary:abc123def45:quick:v1");
        assert_eq!(value, None);
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let (_dir, store) = store();
        store.set("transcript:abc123def45", &1u32, Duration::from_secs(60));
        store.invalidate("transcript:abc123def45");
        let value: Option<u32> = store.get("transcript:abc123def45");
        assert_eq!(value, None);
    }

    #[test]
    fn test_disabled_store_is_noop() {
        let store = CacheStore::disabled();
        store.set("transcript:abc123def45", &1u32, Duration::from_secs(60));
        let value: Option<u32> = store.get("transcript:abc123def45");
        assert_eq!(value, None);
        store.invalidate("transcript:abc123def45");
        assert!(!store.is_enabled());
    }

    #[test]
    fn test_overwrite_is_idempotent() {
        let (_dir, store) = store();
        store.set("transcript:abc123def45", &"a".to_string(), Duration::from_secs(60));
        store.set("transcript:abc123def45", &"a".to_string(), Duration::from_secs(60));
        let value: Option<String> = store.get("transcript:abc123def45");
        assert_eq!(value.as_deref(), Some("a"));
    }

    #[test]
    fn test_corrupt_entry_reads_as_miss() {
        let (dir, store) = store();
        store.set("transcript:abc123def45", &1u32, Duration::from_secs(60));
        let path = dir.path().join("transcript-abc123def45.json");
        std::fs::write(&path, "not json").unwrap();
        let value: Option<u32> = store.get("transcript:abc123def45");
        assert_eq!(value, None);
    }
}
