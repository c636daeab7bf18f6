//! Archive Capability Abstraction
//!
//! The server never decompresses archives itself. It talks to an
//! [`ArchiveBackend`] that can list the entries of an archive file and extract
//! one named entry, so the concrete implementation (the `7z` executable, the
//! `zip` crate, an in-memory mock) can be swapped without touching the
//! addressing logic in [`index`] and the comic service.
//!
//! # Ordering contract
//!
//! Entry offsets handed to clients are ranks in the order returned by
//! [`ArchiveBackend::list_entries`]. Offsets only survive between a listing
//! request and a later image request if two calls against the same unmodified
//! archive return entries in the same order. Every backend must uphold this;
//! nothing in the server can verify it.

pub mod config;
pub mod index;
pub mod mock_store;
pub mod seven_zip;
pub mod zip_store;


use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use tempfile::TempDir;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

pub use index::ArchiveEntry;

/// Errors reported by archive backends
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Archive not found: {0}")]
    NotFound(String),

    /// Open or enumerate failure, carries the backend's diagnostic text
    #[error("{0}")]
    Unreadable(String),

    /// Extraction failure, carries the backend's diagnostic text
    #[error("{0}")]
    Extraction(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// One entry exactly as the backend enumerated it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub filename: String,
    pub size: u64,
}

impl RawEntry {
    pub fn new(filename: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            size,
        }
    }
}

/// Trait defining the archive listing/extraction capability
#[async_trait]
pub trait ArchiveBackend: Send + Sync {
    /// Enumerate the file entries of the archive in raw order
    async fn list_entries(&self, archive: &Path) -> Result<Vec<RawEntry>, ArchiveError>;

    /// Extract a single named entry to a readable stream
    async fn extract_entry(&self, archive: &Path, filename: &str) -> Result<ExtractedEntry, ArchiveError>;

    /// Token identifying the current state of the archive file
    ///
    /// Defaults to an md5 over the file's size and modification time.
    async fn fingerprint(&self, archive: &Path) -> Result<String, ArchiveError> {
        let meta = tokio::fs::metadata(archive)
            .await
            .map_err(|e| not_found_or_io(archive, e))?;
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        Ok(fingerprint_of(&format!("{}:{}", meta.len(), modified)))
    }
}

/// Hex md5 of an arbitrary state description
pub fn fingerprint_of(state: &str) -> String {
    hex::encode(md5::compute(state.as_bytes()).0)
}

pub(crate) fn not_found_or_io(archive: &Path, err: io::Error) -> ArchiveError {
    if err.kind() == io::ErrorKind::NotFound {
        ArchiveError::NotFound(archive.display().to_string())
    } else {
        ArchiveError::Io(err)
    }
}

/// An extracted entry together with whatever must stay alive while it is read
///
/// The guard is released when the entry (or the stream made from it) is
/// dropped, which covers both normal completion and a client that
/// disconnects mid-transfer.
pub struct ExtractedEntry {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    _guard: Option<TempDir>,
}

impl ExtractedEntry {
    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            _guard: None,
        }
    }

    /// Tie the lifetime of a temporary extraction directory to this entry
    pub fn with_guard(reader: impl AsyncRead + Send + Unpin + 'static, guard: TempDir) -> Self {
        Self {
            reader: Box::new(reader),
            _guard: Some(guard),
        }
    }

    pub fn into_stream(self) -> EntryStream {
        EntryStream {
            inner: ReaderStream::new(self.reader),
            _guard: self._guard,
        }
    }
}

/// Chunked byte stream over an extracted entry
pub struct EntryStream {
    inner: ReaderStream<Box<dyn AsyncRead + Send + Unpin>>,
    _guard: Option<TempDir>,
}

impl Stream for EntryStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
