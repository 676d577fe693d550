use serde::Serialize;

/// Stat-level view of one cache backing file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheFileInfo {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Last modification time, `YYYY-MM-DD HH:MM:SS` local time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtime: Option<String>,
    pub path: String,
}

/// Snapshot of both persistent caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    pub cache_dir: String,
    pub schedule_cache: CacheFileInfo,
    pub runtime_cache: CacheFileInfo,
}
