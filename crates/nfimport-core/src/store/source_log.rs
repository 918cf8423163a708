//! Durable set of source URLs that were imported successfully.
//!
//! The log only saves redundant scraping during bulk restore; it is not a
//! deduplication guarantee. That belongs to the document store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::LogError;

use super::write_atomic;

/// Set of processed source URLs, in first-seen order.
pub trait SourceLog {
    fn contains(&self, url: &str) -> bool;

    /// Record `url`. Adding a URL already present is a no-op.
    fn add(&mut self, url: &str) -> Result<(), LogError>;

    fn urls(&self) -> Vec<String>;
}

/// In-memory log.
#[derive(Debug, Default, Clone)]
pub struct MemorySourceLog {
    urls: Vec<String>,
    seen: HashSet<String>,
}

impl MemorySourceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Record `url`, returning whether it was new.
    fn insert(&mut self, url: &str) -> bool {
        if !self.seen.insert(url.to_string()) {
            return false;
        }
        self.urls.push(url.to_string());
        true
    }

    /// Undo the most recent [`insert`](Self::insert) of `url`.
    fn remove_last(&mut self, url: &str) {
        if self.urls.last().is_some_and(|last| last == url) {
            self.urls.pop();
            self.seen.remove(url);
        }
    }
}

impl FromIterator<String> for MemorySourceLog {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut log = Self::new();
        for url in iter {
            log.insert(&url);
        }
        log
    }
}

impl SourceLog for MemorySourceLog {
    fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    fn add(&mut self, url: &str) -> Result<(), LogError> {
        self.insert(url);
        Ok(())
    }

    fn urls(&self) -> Vec<String> {
        self.urls.clone()
    }
}

/// Log backed by a JSON array of URL strings, rewritten whole and
/// atomically on every new URL.
#[derive(Debug)]
pub struct JsonSourceLog {
    path: PathBuf,
    entries: MemorySourceLog,
}

impl JsonSourceLog {
    /// Load the log at `path`. A missing file is an empty log; an unreadable
    /// or malformed one is reported and treated as empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read(&path) {
            Ok(urls) => urls.into_iter().collect(),
            Err(err) => {
                warn!("Ignoring unreadable source log {}: {}", path.display(), err);
                MemorySourceLog::new()
            }
        };
        debug!("Loaded {} processed URLs from {}", entries.len(), path.display());
        Self { path, entries }
    }

    /// Load the log at `path`, failing on unreadable or malformed files.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        let entries = Self::read(&path)?.into_iter().collect();
        Ok(Self { path, entries })
    }

    fn read(path: &Path) -> Result<Vec<String>, LogError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn flush(&self) -> Result<(), LogError> {
        let content = serde_json::to_vec_pretty(&self.entries.urls)?;
        write_atomic(&self.path, &content)?;
        Ok(())
    }
}

impl SourceLog for JsonSourceLog {
    fn contains(&self, url: &str) -> bool {
        self.entries.contains(url)
    }

    fn add(&mut self, url: &str) -> Result<(), LogError> {
        if !self.entries.insert(url) {
            return Ok(());
        }
        if let Err(err) = self.flush() {
            self.entries.remove_last(url);
            return Err(err);
        }
        debug!("Recorded {} in {}", url, self.path.display());
        Ok(())
    }

    fn urls(&self) -> Vec<String> {
        self.entries.urls()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_log_keeps_first_seen_order() {
        let mut log = MemorySourceLog::new();
        log.add("https://b").unwrap();
        log.add("https://a").unwrap();
        log.add("https://b").unwrap();

        assert_eq!(log.urls(), ["https://b", "https://a"]);
        assert!(log.contains("https://a"));
        assert!(!log.contains("https://c"));
    }

    #[test]
    fn test_json_log_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("processed_urls_backup.json");

        let mut log = JsonSourceLog::load(&path);
        assert!(log.is_empty());
        log.add("https://one").unwrap();
        log.add("https://two").unwrap();

        let reloaded = JsonSourceLog::open(&path).unwrap();
        assert_eq!(reloaded.urls(), ["https://one", "https://two"]);

        let on_disk: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);
    }

    #[test]
    fn test_malformed_log_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(JsonSourceLog::load(&path).is_empty());
        assert!(matches!(JsonSourceLog::open(&path), Err(LogError::Format(_))));
    }

    #[test]
    fn test_failed_write_leaves_url_unrecorded() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, "not a directory").unwrap();
        let path = blocker.join("log.json");

        let mut log = JsonSourceLog::load(&path);
        assert!(log.add("https://a").is_err());
        assert!(!log.contains("https://a"));
        assert!(log.is_empty());

        std::fs::remove_file(&blocker).unwrap();
        log.add("https://a").unwrap();

        assert_eq!(JsonSourceLog::open(&path).unwrap().urls(), ["https://a"]);
    }
}
