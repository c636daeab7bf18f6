//! Mock implementation of ArchiveBackend for testing

use crate::archive::{fingerprint_of, ArchiveBackend, ArchiveError, ExtractedEntry, RawEntry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use log::info;

struct MockArchive {
    /// Entries in raw order; `None` marks an archive that fails to open
    entries: Option<Vec<(String, Vec<u8>)>>,
    diagnostic: String,
    revision: u64,
}

/// In-memory archives keyed by their full path
pub struct MockArchiveBackend {
    archives: Arc<Mutex<HashMap<PathBuf, MockArchive>>>,
    list_calls: Arc<Mutex<usize>>,
}

impl MockArchiveBackend {
    pub fn new() -> Self {
        Self {
            archives: Arc::new(Mutex::new(HashMap::new())),
            list_calls: Arc::new(Mutex::new(0)),
        }
    }

    fn archives(&self) -> MutexGuard<'_, HashMap<PathBuf, MockArchive>> {
        self.archives.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add or replace an archive; replacing bumps its revision
    pub fn insert_archive(&self, path: impl Into<PathBuf>, entries: &[(&str, &[u8])]) {
        let path = path.into();
        let entries = entries.iter().map(|(name, data)| (name.to_string(), data.to_vec())).collect();
        self.replace(path, Some(entries), String::new());
    }

    /// Add an archive that fails every listing with the given diagnostic
    pub fn insert_corrupt(&self, path: impl Into<PathBuf>, diagnostic: &str) {
        self.replace(path.into(), None, diagnostic.to_string());
    }

    fn replace(&self, path: PathBuf, entries: Option<Vec<(String, Vec<u8>)>>, diagnostic: String) {
        let mut archives = self.archives();
        let revision = archives.get(&path).map(|a| a.revision + 1).unwrap_or(0);
        info!("Mock archive {} at revision {}", path.display(), revision);
        archives.insert(path, MockArchive { entries, diagnostic, revision });
    }

    pub fn remove_archive(&self, path: &Path) {
        self.archives().remove(path);
    }

    /// Number of `list_entries` calls served so far
    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockArchiveBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArchiveBackend for MockArchiveBackend {
    async fn list_entries(&self, archive: &Path) -> Result<Vec<RawEntry>, ArchiveError> {
        *self.list_calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) += 1;
        let archives = self.archives();
        let mock = archives
            .get(archive)
            .ok_or_else(|| ArchiveError::NotFound(archive.display().to_string()))?;
        match &mock.entries {
            Some(entries) => Ok(entries
                .iter()
                .map(|(name, data)| RawEntry::new(name.clone(), data.len() as u64))
                .collect()),
            None => Err(ArchiveError::Unreadable(mock.diagnostic.clone())),
        }
    }

    async fn extract_entry(&self, archive: &Path, filename: &str) -> Result<ExtractedEntry, ArchiveError> {
        let archives = self.archives();
        let mock = archives
            .get(archive)
            .ok_or_else(|| ArchiveError::NotFound(archive.display().to_string()))?;
        let data = mock
            .entries
            .as_ref()
            .and_then(|entries| entries.iter().find(|(name, _)| name == filename))
            .map(|(_, data)| data.clone())
            .ok_or_else(|| ArchiveError::Extraction(format!("No files to process: {}", filename)))?;
        Ok(ExtractedEntry::new(Cursor::new(data)))
    }

    async fn fingerprint(&self, archive: &Path) -> Result<String, ArchiveError> {
        let archives = self.archives();
        let mock = archives
            .get(archive)
            .ok_or_else(|| ArchiveError::NotFound(archive.display().to_string()))?;
        Ok(fingerprint_of(&format!("{}:{}", archive.display(), mock.revision)))
    }
}
