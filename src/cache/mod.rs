//! Content-hash cache of per-file results for incremental checks
//!
//! CDD Principle: Infrastructure Layer - the cache speeds up reruns without affecting results
//! - Entries are keyed by file path and validated by content hash and configuration fingerprint
//! - A hit replays the stored violations and diagnostics verbatim
//! - Lookups are read-only so parallel workers can share the cache; updates happen after the run

use crate::domain::violations::{FileReport, LintError, LintResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Bumped whenever the entry layout changes
const CURRENT_VERSION: u32 = 2;

/// Cache file used when none is configured
pub const DEFAULT_CACHE_FILE: &str = ".lintcs/cache.json";

/// SHA-256 of a file's decoded content, hex encoded
pub fn content_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// Cache for storing file analysis results
#[derive(Debug)]
pub struct FileCache {
    cache_path: PathBuf,
    data: CacheData,
    /// Whether the cache has been modified since loading
    dirty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheData {
    version: u32,
    files: BTreeMap<PathBuf, FileEntry>,
    metadata: CacheMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheMetadata {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    hits: u64,
    misses: u64,
}

/// Cached results for a single file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub content_hash: String,
    pub config_fingerprint: String,
    pub analyzed_at: DateTime<Utc>,
    pub results: FileReport,
}

impl Default for CacheData {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            version: CURRENT_VERSION,
            files: BTreeMap::new(),
            metadata: CacheMetadata {
                created_at: now,
                updated_at: now,
                hits: 0,
                misses: 0,
            },
        }
    }
}

impl FileCache {
    /// Create a new, empty file cache backed by `cache_path`
    pub fn new<P: AsRef<Path>>(cache_path: P) -> Self {
        Self {
            cache_path: cache_path.as_ref().to_path_buf(),
            data: CacheData::default(),
            dirty: false,
        }
    }

    /// Open the cache at `cache_path`, starting empty if the file does not exist
    pub fn open<P: AsRef<Path>>(cache_path: P) -> LintResult<Self> {
        let mut cache = Self::new(cache_path);
        cache.load()?;
        Ok(cache)
    }

    pub fn path(&self) -> &Path {
        &self.cache_path
    }

    /// Load cache from disk
    pub fn load(&mut self) -> LintResult<()> {
        if !self.cache_path.exists() {
            self.data = CacheData::default();
            self.dirty = true;
            return Ok(());
        }

        let content = fs::read_to_string(&self.cache_path)
            .map_err(|e| LintError::cache(format!("Failed to read cache file: {e}")))?;
        self.data = serde_json::from_str(&content)
            .map_err(|e| LintError::cache(format!("Failed to parse cache file: {e}")))?;
        self.migrate_if_needed();
        Ok(())
    }

    /// Save cache to disk if it has been modified
    pub fn save(&mut self) -> LintResult<()> {
        if !self.dirty {
            return Ok(());
        }
        self.data.metadata.updated_at = Utc::now();

        if let Some(parent) = self.cache_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| LintError::cache(format!("Failed to create cache directory: {e}")))?;
        }

        let content = serde_json::to_string_pretty(&self.data)
            .map_err(|e| LintError::cache(format!("Failed to serialize cache: {e}")))?;
        fs::write(&self.cache_path, content)
            .map_err(|e| LintError::cache(format!("Failed to write cache file: {e}")))?;

        self.dirty = false;
        Ok(())
    }

    /// Stored results for `file_path` if its content and the configuration are unchanged
    pub fn lookup(&self, file_path: &Path, content_hash: &str, config_fingerprint: &str) -> Option<FileReport> {
        self.data
            .files
            .get(file_path)
            .filter(|entry| entry.content_hash == content_hash && entry.config_fingerprint == config_fingerprint)
            .map(|entry| entry.results.clone())
    }

    pub fn record_hit(&mut self) {
        self.data.metadata.hits += 1;
        self.dirty = true;
    }

    /// Store fresh results for a file; counts as a miss
    pub fn store(
        &mut self,
        file_path: &Path,
        content_hash: String,
        config_fingerprint: &str,
        results: FileReport,
    ) {
        self.data.metadata.misses += 1;
        self.data.files.insert(
            file_path.to_path_buf(),
            FileEntry {
                content_hash,
                config_fingerprint: config_fingerprint.to_string(),
                analyzed_at: Utc::now(),
                results,
            },
        );
        self.dirty = true;
    }

    /// Get cache statistics
    pub fn statistics(&self) -> CacheStatistics {
        let metadata = &self.data.metadata;
        let lookups = metadata.hits + metadata.misses;
        CacheStatistics {
            total_files: self.data.files.len(),
            cache_hits: metadata.hits,
            cache_misses: metadata.misses,
            hit_rate: if lookups > 0 {
                metadata.hits as f64 / lookups as f64
            } else {
                0.0
            },
            created_at: metadata.created_at,
            updated_at: metadata.updated_at,
        }
    }

    /// Clear the entire cache and remove its file
    pub fn clear(&mut self) -> LintResult<()> {
        self.data = CacheData::default();
        self.dirty = true;

        if self.cache_path.exists() {
            fs::remove_file(&self.cache_path)
                .map_err(|e| LintError::cache(format!("Failed to remove cache file: {e}")))?;
        }
        Ok(())
    }

    /// Remove entries for files that no longer exist
    pub fn cleanup(&mut self) -> usize {
        let before = self.data.files.len();
        self.data.files.retain(|path, _| path.exists());
        let removed = before - self.data.files.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Older layouts did not store results, so their entries are useless
    fn migrate_if_needed(&mut self) {
        if self.data.version != CURRENT_VERSION {
            tracing::info!(
                "Discarding cache version {} (current is {})",
                self.data.version,
                CURRENT_VERSION
            );
            self.data = CacheData::default();
            self.dirty = true;
        }
    }
}

/// Cache performance statistics
#[derive(Debug, Clone)]
pub struct CacheStatistics {
    pub total_files: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub hit_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CacheStatistics {
    /// Format statistics for display
    pub fn format_display(&self) -> String {
        format!(
            "Cache: {} files, {:.1}% hit rate ({} hits, {} misses)",
            self.total_files,
            self.hit_rate * 100.0,
            self.cache_hits,
            self.cache_misses
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::violations::{Severity, Violation};
    use tempfile::TempDir;

    fn results(file: &Path) -> FileReport {
        FileReport {
            violations: vec![Violation::new(
                "PascalCaseType",
                Severity::Warning,
                file,
                1,
                14,
                "type 'dataService' should be PascalCase",
            )],
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_new_cache_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache = FileCache::open(temp_dir.path().join("cache.json")).unwrap();
        assert_eq!(cache.statistics().total_files, 0);
        assert_eq!(cache.data.version, CURRENT_VERSION);
    }

    #[test]
    fn test_lookup_requires_same_content_and_config() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("Service.cs");
        let mut cache = FileCache::open(temp_dir.path().join("cache.json")).unwrap();
        let hash = content_hash("public class dataService {}");

        assert!(cache.lookup(&file, &hash, "config123").is_none());
        cache.store(&file, hash.clone(), "config123", results(&file));

        assert_eq!(cache.lookup(&file, &hash, "config123"), Some(results(&file)));
        assert!(cache.lookup(&file, &hash, "config456").is_none());
        assert!(cache.lookup(&file, &content_hash("public class DataService {}"), "config123").is_none());
    }

    #[test]
    fn test_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join("nested/cache.json");
        let file = temp_dir.path().join("Service.cs");
        let hash = content_hash("class A {}");

        {
            let mut cache = FileCache::open(&cache_path).unwrap();
            cache.store(&file, hash.clone(), "fp", results(&file));
            cache.save().unwrap();
        }

        let cache = FileCache::open(&cache_path).unwrap();
        assert_eq!(cache.lookup(&file, &hash, "fp"), Some(results(&file)));
        assert_eq!(cache.statistics().cache_misses, 1);
    }

    #[test]
    fn test_outdated_versions_are_discarded() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join("cache.json");
        let file = temp_dir.path().join("A.cs");
        let mut cache = FileCache::open(&cache_path).unwrap();
        cache.store(&file, content_hash(""), "fp", FileReport::default());
        cache.data.version = 1;
        cache.save().unwrap();

        let reloaded = FileCache::open(&cache_path).unwrap();
        assert_eq!(reloaded.statistics().total_files, 0);
    }

    #[test]
    fn test_cleanup_and_clear() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join("cache.json");
        let kept = temp_dir.path().join("Kept.cs");
        let removed = temp_dir.path().join("Removed.cs");
        fs::write(&kept, "class Kept {}").unwrap();

        let mut cache = FileCache::open(&cache_path).unwrap();
        cache.store(&kept, content_hash("class Kept {}"), "fp", FileReport::default());
        cache.store(&removed, content_hash("class Removed {}"), "fp", FileReport::default());
        assert_eq!(cache.cleanup(), 1);
        assert_eq!(cache.statistics().total_files, 1);

        cache.save().unwrap();
        assert!(cache_path.exists());
        cache.clear().unwrap();
        assert!(!cache_path.exists());
        assert_eq!(cache.statistics().total_files, 0);
    }

    #[test]
    fn test_statistics() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = FileCache::open(temp_dir.path().join("cache.json")).unwrap();
        cache.data.metadata.hits = 10;
        cache.data.metadata.misses = 5;

        let stats = cache.statistics();
        assert_eq!(stats.hit_rate, 10.0 / 15.0);
        assert!(stats.format_display().contains("66.7% hit rate"));
    }
}
