//! Directory browsing under the comics root

use std::cmp::Ordering;
use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::collation::compare_names;
use crate::error::ComicError;
use crate::service::paths::resolve_under_root;

const ARCHIVE_EXTENSIONS: &[&str] = &[".cbz", ".cbr"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub directory: bool,
    pub filename: String,
    pub size: u64,
}

pub struct DirectoryService {
    root: PathBuf,
}

impl DirectoryService {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Subdirectories and comic archives of `relative`, directories first
    ///
    /// Dotfiles are hidden. Entries that cannot be stat'ed are skipped rather
    /// than failing the whole listing.
    pub async fn list_directory(&self, relative: &str) -> Result<Vec<DirectoryEntry>, ComicError> {
        let dir = resolve_under_root(&self.root, relative)?;
        let mut reader = tokio::fs::read_dir(&dir).await?;

        let mut entries = Vec::new();
        while let Some(item) = reader.next_entry().await? {
            let filename = item.file_name().to_string_lossy().into_owned();
            if filename.starts_with('.') {
                continue;
            }
            let meta = match tokio::fs::metadata(item.path()).await {
                Ok(meta) => meta,
                Err(e) => {
                    debug!("Skipping {}: {}", item.path().display(), e);
                    continue;
                }
            };
            let directory = meta.is_dir();
            if directory || is_archive_name(&filename) {
                entries.push(DirectoryEntry {
                    directory,
                    filename,
                    size: meta.len(),
                });
            }
        }

        entries.sort_by(compare_entries);
        Ok(entries)
    }
}

pub fn is_archive_name(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    ARCHIVE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn compare_entries(a: &DirectoryEntry, b: &DirectoryEntry) -> Ordering {
    b.directory
        .cmp(&a.directory)
        .then_with(|| compare_names(&a.filename, &b.filename))
}
