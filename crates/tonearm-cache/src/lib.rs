//! # tonearm-cache
//!
//! Audio artifact cache for tonearm.
//!
//! Two backings behind one type:
//! - **Memory**: an LRU of complete payloads, for short sessions.
//! - **Disk**: filesystem artifacts indexed in `SQLite`, for repeated plays
//!   across sessions. The playback driver redirects to the cached artifact
//!   after a write-through when the backing is disk.
//!
//! A store may be shared by several sessions; the index lock also serializes
//! artifact reads and writes, so concurrent access to the same track id is
//! safe.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use directories::ProjectDirs;
use lru::LruCache;
use parking_lot::Mutex;
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tonearm_core::{AudioSource, Error, Result, Track};
use tracing::{debug, info, warn};

/// Default capacity of the memory backing.
const DEFAULT_MEMORY_ENTRIES: usize = 50;

/// Whether a store keeps artifacts in memory or on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBacking {
    Memory,
    Disk,
}

/// Audio artifact cache.
pub struct CacheStore {
    backing: CacheBacking,
    /// Artifact index; `None` for the memory backing.
    db: Option<Mutex<Connection>>,
    cache_dir: PathBuf,
    memory: Arc<Mutex<LruCache<String, AudioSource>>>,
}

impl CacheStore {
    /// Memory-backed store with the given entry capacity.
    pub fn memory(entries: usize) -> Self {
        let entries = NonZeroUsize::new(entries)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_MEMORY_ENTRIES).unwrap_or(NonZeroUsize::MIN));
        Self {
            backing: CacheBacking::Memory,
            db: None,
            cache_dir: PathBuf::new(),
            memory: Arc::new(Mutex::new(LruCache::new(entries))),
        }
    }

    /// Disk-backed store at the platform cache directory.
    pub fn disk() -> Result<Self> {
        let project_dirs = ProjectDirs::from("com", "tonearm", "tonearm")
            .ok_or_else(|| Error::Cache("failed to determine cache directory".to_string()))?;
        Self::disk_at(project_dirs.cache_dir().join("audio"))
    }

    /// Disk-backed store at a custom path.
    pub fn disk_at(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)
            .map_err(|e| Error::Cache(format!("failed to create cache directory: {e}")))?;

        let db_path = cache_dir.join("index.db");
        let db = Connection::open(&db_path)
            .map_err(|e| Error::Cache(format!("failed to open index: {e}")))?;

        db.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS audio_cache (
                track_id TEXT PRIMARY KEY,
                file_path TEXT NOT NULL,
                mime TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                cached_at TEXT NOT NULL
            );
            ",
        )
        .map_err(|e| Error::Cache(format!("failed to initialize index: {e}")))?;

        info!("audio cache initialized at {}", cache_dir.display());

        Ok(Self {
            backing: CacheBacking::Disk,
            db: Some(Mutex::new(db)),
            cache_dir,
            memory: Arc::new(Mutex::new(LruCache::unbounded())),
        })
    }

    /// Which backing this store uses.
    pub const fn backing(&self) -> CacheBacking {
        self.backing
    }

    /// Whether an artifact exists for a track id.
    pub fn has(&self, track_id: &str) -> bool {
        match (&self.db, self.backing) {
            (Some(db), CacheBacking::Disk) => {
                let db = db.lock();
                db.query_row(
                    "SELECT 1 FROM audio_cache WHERE track_id = ? LIMIT 1",
                    [track_id],
                    |_| Ok(()),
                )
                .is_ok()
            }
            _ => self.memory.lock().contains(track_id),
        }
    }

    /// Fetch the cached artifact for a track id.
    pub fn get(&self, track_id: &str) -> Result<AudioSource> {
        match (&self.db, self.backing) {
            (Some(db), CacheBacking::Disk) => {
                let db = db.lock();
                let (path, mime): (String, String) = db
                    .query_row(
                        "SELECT file_path, mime FROM audio_cache WHERE track_id = ?",
                        [track_id],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .map_err(|_| Error::Cache(format!("no cached artifact for '{track_id}'")))?;

                let data = std::fs::read(&path)
                    .map_err(|e| Error::Cache(format!("failed to read artifact: {e}")))?;
                if data.is_empty() {
                    // A zero-length artifact is a truncated write; evict it.
                    drop(db);
                    self.delete(track_id);
                    return Err(Error::Cache(format!("empty artifact for '{track_id}'")));
                }
                Ok(AudioSource::encoded_with_mime(data, mime))
            }
            _ => self
                .memory
                .lock()
                .get(track_id)
                .cloned()
                .ok_or_else(|| Error::Cache(format!("no cached artifact for '{track_id}'"))),
        }
    }

    /// Write a track's payload through the cache.
    pub fn write(&self, track: &Track, source: &AudioSource) -> Result<()> {
        match (&self.db, self.backing) {
            (Some(db), CacheBacking::Disk) => {
                let db = db.lock();
                let path = self.artifact_path(&track.id);
                std::fs::write(&path, &source.data)
                    .map_err(|e| Error::Cache(format!("failed to write artifact: {e}")))?;

                let path_str = path.to_string_lossy().into_owned();
                db.execute(
                    "INSERT OR REPLACE INTO audio_cache
                     (track_id, file_path, mime, size_bytes, cached_at)
                     VALUES (?, ?, ?, ?, ?)",
                    rusqlite::params![
                        track.id,
                        path_str,
                        source.mime,
                        source.data.len() as i64,
                        Utc::now().to_rfc3339(),
                    ],
                )
                .map_err(|e| Error::Cache(format!("failed to index artifact: {e}")))?;

                debug!("cached {} bytes for {}", source.data.len(), track.id);
                Ok(())
            }
            _ => {
                self.memory.lock().put(track.id.clone(), source.clone());
                Ok(())
            }
        }
    }

    /// Drop the artifact for a track id, if any.
    pub fn delete(&self, track_id: &str) {
        match (&self.db, self.backing) {
            (Some(db), CacheBacking::Disk) => {
                let db = db.lock();
                let path: Option<String> = db
                    .query_row(
                        "SELECT file_path FROM audio_cache WHERE track_id = ?",
                        [track_id],
                        |row| row.get(0),
                    )
                    .ok();
                if let Err(e) = db.execute(
                    "DELETE FROM audio_cache WHERE track_id = ?",
                    [track_id],
                ) {
                    warn!("failed to unindex '{track_id}': {e}");
                }
                if let Some(path) = path {
                    if let Err(e) = std::fs::remove_file(&path) {
                        warn!("failed to remove artifact '{path}': {e}");
                    }
                }
            }
            _ => {
                self.memory.lock().pop(track_id);
            }
        }
    }

    /// Drop every cached artifact.
    pub fn clear(&self) {
        if let (Some(db), CacheBacking::Disk) = (&self.db, self.backing) {
            let db = db.lock();
            let paths: Vec<String> = db
                .prepare("SELECT file_path FROM audio_cache")
                .and_then(|mut stmt| {
                    stmt.query_map([], |row| row.get(0))
                        .map(|rows| rows.filter_map(std::result::Result::ok).collect())
                })
                .unwrap_or_default();
            if let Err(e) = db.execute_batch("DELETE FROM audio_cache;") {
                warn!("failed to clear index: {e}");
            }
            for path in paths {
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!("failed to remove artifact '{path}': {e}");
                }
            }
        }
        self.memory.lock().clear();
        info!("audio cache cleared");
    }

    /// Number of cached artifacts.
    pub fn len(&self) -> usize {
        match (&self.db, self.backing) {
            (Some(db), CacheBacking::Disk) => {
                let db = db.lock();
                db.query_row("SELECT COUNT(*) FROM audio_cache", [], |row| {
                    row.get::<_, i64>(0)
                })
                .map(|n| usize::try_from(n).unwrap_or(0))
                .unwrap_or(0)
            }
            _ => self.memory.lock().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn artifact_path(&self, track_id: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(track_id.as_bytes());
        let name = hex::encode(hasher.finalize());
        self.cache_dir.join(format!("{name}.audio"))
    }
}
