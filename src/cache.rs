//! File-backed key-value stores for the schedule index and runtime cache.
//!
//! Both stores are lenient on read (a missing or malformed backing file is an
//! empty map) and atomic on write (temp file + rename), so a crash mid-write
//! never leaves a half-written document behind. There is no TTL and no
//! eviction; entries live until [`clear_cache_files`] removes the files.

use std::collections::HashMap;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{KboError, Result};
use crate::model::{CacheFileInfo, CacheStatus, Fixture};

pub const SCHEDULE_CACHE_FILE: &str = "schedule_index.json";
pub const RUNTIME_CACHE_FILE: &str = "runtime_cache.json";

/// A JSON document holding a string-keyed map, persisted as one file.
#[derive(Debug)]
pub struct JsonStore<V> {
    path: PathBuf,
    _value: PhantomData<V>,
}

impl<V: Serialize + DeserializeOwned> JsonStore<V> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _value: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document. Absence or corruption degrades to an empty map.
    pub fn load(&self) -> HashMap<String, V> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return HashMap::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed cache file, treating as empty");
                HashMap::new()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.load().remove(key)
    }

    /// Merge one entry into the document and atomically replace the file.
    pub fn insert(&self, key: &str, value: V) -> Result<()> {
        let mut map = self.load();
        map.insert(key.to_string(), value);
        self.write_atomic(&map)
    }

    fn write_atomic(&self, map: &HashMap<String, V>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| KboError::CacheIo {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let body = serde_json::to_vec_pretty(map).map_err(|e| KboError::CacheEncode {
            path: self.path.clone(),
            source: e,
        })?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, body).map_err(|e| KboError::CacheIo {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| KboError::CacheIo {
            path: self.path.clone(),
            source: e,
        })?;
        debug!(path = %self.path.display(), entries = map.len(), "cache file written");
        Ok(())
    }
}

/// Schedule index: `YYYYMMDD` date -> fixtures played that date.
///
/// An empty fixture list is a meaningful entry ("no games that date") and is
/// returned on hit like any other.
#[derive(Debug)]
pub struct ScheduleCache {
    store: JsonStore<Vec<Fixture>>,
}

impl ScheduleCache {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            store: JsonStore::new(cache_dir.join(SCHEDULE_CACHE_FILE)),
        }
    }

    pub fn get(&self, date: &str) -> Option<Vec<Fixture>> {
        self.store.get(date)
    }

    pub fn insert(&self, date: &str, fixtures: Vec<Fixture>) -> Result<()> {
        self.store.insert(date, fixtures)
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }
}

/// One runtime cache entry, keyed by [`runtime_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeEntry {
    pub runtime_min: u32,
}

/// Runtime cache: `"{game_id}_{game_date}"` -> recorded duration in minutes.
#[derive(Debug)]
pub struct RuntimeCache {
    store: JsonStore<RuntimeEntry>,
}

impl RuntimeCache {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            store: JsonStore::new(cache_dir.join(RUNTIME_CACHE_FILE)),
        }
    }

    pub fn get(&self, game_id: &str, game_date: &str) -> Option<u32> {
        self.store
            .get(&runtime_key(game_id, game_date))
            .map(|e| e.runtime_min)
    }

    pub fn insert(&self, game_id: &str, game_date: &str, runtime_min: u32) -> Result<()> {
        self.store
            .insert(&runtime_key(game_id, game_date), RuntimeEntry { runtime_min })
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }
}

pub fn runtime_key(game_id: &str, game_date: &str) -> String {
    format!("{game_id}_{game_date}")
}

/// Stat one cache backing file.
pub fn file_info(path: &Path) -> CacheFileInfo {
    match fs::metadata(path) {
        Ok(meta) => {
            let mtime = meta
                .modified()
                .ok()
                .map(chrono::DateTime::<chrono::Local>::from)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string());
            CacheFileInfo {
                exists: true,
                size_bytes: Some(meta.len()),
                mtime,
                path: path.display().to_string(),
            }
        }
        Err(_) => CacheFileInfo {
            exists: false,
            size_bytes: None,
            mtime: None,
            path: path.display().to_string(),
        },
    }
}

/// Snapshot both cache files under `cache_dir`.
pub fn cache_status(cache_dir: &Path) -> CacheStatus {
    CacheStatus {
        cache_dir: cache_dir.display().to_string(),
        schedule_cache: file_info(&cache_dir.join(SCHEDULE_CACHE_FILE)),
        runtime_cache: file_info(&cache_dir.join(RUNTIME_CACHE_FILE)),
    }
}

/// Delete both cache files if present; returns the names of the files removed.
pub fn clear_cache_files(cache_dir: &Path) -> Result<Vec<String>> {
    let mut deleted = Vec::new();
    for name in [RUNTIME_CACHE_FILE, SCHEDULE_CACHE_FILE] {
        let path = cache_dir.join(name);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| KboError::CacheIo {
                path: path.clone(),
                source: e,
            })?;
            deleted.push(name.to_string());
        }
    }
    Ok(deleted)
}
