//! In-process zip backend (cbz only)

use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use zip::ZipArchive;

use crate::archive::{not_found_or_io, ArchiveBackend, ArchiveError, ExtractedEntry, RawEntry};

pub struct ZipBackend {
    temp_path: PathBuf,
}

impl ZipBackend {
    pub fn new(temp_path: PathBuf) -> Self {
        Self { temp_path }
    }
}

#[async_trait]
impl ArchiveBackend for ZipBackend {
    async fn list_entries(&self, archive: &Path) -> Result<Vec<RawEntry>, ArchiveError> {
        let path = archive.to_path_buf();
        tokio::task::spawn_blocking(move || list_blocking(&path))
            .await
            .map_err(|e| ArchiveError::Unreadable(format!("zip listing task failed: {}", e)))?
    }

    async fn extract_entry(&self, archive: &Path, filename: &str) -> Result<ExtractedEntry, ArchiveError> {
        let path = archive.to_path_buf();
        let name = filename.to_string();
        let temp_path = self.temp_path.clone();
        let spooled = tokio::task::spawn_blocking(move || extract_blocking(&path, &name, &temp_path))
            .await
            .map_err(|e| ArchiveError::Extraction(format!("zip extraction task failed: {}", e)))??;
        Ok(ExtractedEntry::new(tokio::fs::File::from_std(spooled)))
    }
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>, ArchiveError> {
    let file = File::open(path).map_err(|e| not_found_or_io(path, e))?;
    ZipArchive::new(file)
        .map_err(|e| ArchiveError::Unreadable(format!("Can not open {} as archive: {}", path.display(), e)))
}

fn list_blocking(path: &Path) -> Result<Vec<RawEntry>, ArchiveError> {
    let mut archive = open_archive(path)?;
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive
            .by_index_raw(index)
            .map_err(|e| ArchiveError::Unreadable(format!("Corrupt entry {} in {}: {}", index, path.display(), e)))?;
        if entry.is_dir() {
            continue;
        }
        entries.push(RawEntry::new(entry.name(), entry.size()));
    }
    debug!("Listed {} entries in {}", entries.len(), path.display());
    Ok(entries)
}

/// Decompress one entry into an anonymous temp file, rewound for reading
///
/// The file has no name on disk, so closing it is all the cleanup needed.
fn extract_blocking(path: &Path, name: &str, temp_path: &Path) -> Result<File, ArchiveError> {
    let mut archive = open_archive(path)?;
    let mut entry = archive
        .by_name(name)
        .map_err(|e| ArchiveError::Extraction(format!("Can not extract {}: {}", name, e)))?;

    let extraction_err = |e: io::Error| ArchiveError::Extraction(format!("Can not extract {}: {}", name, e));
    std::fs::create_dir_all(temp_path).map_err(extraction_err)?;
    let mut spooled = tempfile::tempfile_in(temp_path).map_err(extraction_err)?;
    io::copy(&mut entry, &mut spooled).map_err(extraction_err)?;
    spooled.seek(SeekFrom::Start(0)).map_err(extraction_err)?;
    Ok(spooled)
}
