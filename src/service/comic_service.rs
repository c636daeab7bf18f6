//! Comic service: archive listing and page extraction
//!
//! Both operations enumerate the archive afresh; nothing is cached between
//! requests. A page offset from a listing is trusted as an index into the
//! raw entry list of a *new* enumeration, so a listing only stays valid while
//! the archive is unchanged. Out-of-range offsets fail with `InvalidOffset`;
//! clients that send the listing's archive token get `StaleListing` instead
//! when the archive has changed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::timeout;

use crate::archive::index::{image_listing, index_entries, mime_type_for};
use crate::archive::{ArchiveBackend, ArchiveEntry, ArchiveError, EntryStream, RawEntry};
use crate::error::ComicError;
use crate::service::paths::resolve_under_root;

/// Image entries of one archive plus the token identifying its state
#[derive(Debug)]
pub struct ComicListing {
    pub entries: Vec<ArchiveEntry>,
    pub token: String,
}

/// A single page ready to be streamed
pub struct ExtractedPage {
    pub filename: String,
    pub content_type: &'static str,
    pub stream: EntryStream,
}

pub struct ComicService {
    backend: Arc<dyn ArchiveBackend>,
    root: PathBuf,
    timeout: Duration,
}

impl ComicService {
    /// Create a new comic service with injected archive backend
    pub fn new(backend: Arc<dyn ArchiveBackend>, root: PathBuf, timeout: Duration) -> Self {
        Self { backend, root, timeout }
    }

    /// List image entries of an archive, sorted by name, with raw-order offsets
    pub async fn list(&self, file: &str) -> Result<ComicListing, ComicError> {
        let path = resolve_under_root(&self.root, file)?;
        let token = self
            .backend
            .fingerprint(&path)
            .await
            .map_err(|e| client_error(file, e))?;
        let raw = self.enumerate(file, &path).await?;
        let raw_count = raw.len();

        let entries = image_listing(index_entries(raw));
        info!("Listed {} of {} entries in {}", entries.len(), raw_count, path.display());
        Ok(ComicListing { entries, token })
    }

    /// Resolve a raw-order offset against a fresh enumeration and extract it
    pub async fn extract_by_offset(
        &self,
        file: &str,
        offset: u32,
        token: Option<&str>,
    ) -> Result<ExtractedPage, ComicError> {
        let path = resolve_under_root(&self.root, file)?;

        if let Some(expected) = token {
            let current = self
                .backend
                .fingerprint(&path)
                .await
                .map_err(|e| client_error(file, e))?;
            if current != expected {
                warn!("Stale listing token for {}: {} != {}", path.display(), expected, current);
                return Err(ComicError::StaleListing);
            }
        }

        let raw = self.enumerate(file, &path).await?;
        let entry = raw.get(offset as usize).ok_or(ComicError::InvalidOffset {
            offset,
            count: raw.len(),
        })?;
        debug!("Offset {} in {} resolves to {}", offset, path.display(), entry.filename);

        let extracted = timeout(self.timeout, self.backend.extract_entry(&path, &entry.filename))
            .await
            .map_err(|_| {
                ComicError::ExtractionFailed(format!(
                    "Extracting {} timed out after {}s",
                    entry.filename,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| client_error(file, e))?;

        Ok(ExtractedPage {
            content_type: mime_type_for(&entry.filename),
            filename: entry.filename.clone(),
            stream: extracted.into_stream(),
        })
    }

    async fn enumerate(&self, file: &str, path: &Path) -> Result<Vec<RawEntry>, ComicError> {
        let raw = timeout(self.timeout, self.backend.list_entries(path))
            .await
            .map_err(|_| {
                ComicError::ArchiveUnreadable(format!(
                    "Listing {} timed out after {}s",
                    file,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| client_error(file, e))?;
        Ok(raw)
    }
}

/// Name a missing archive by the client's path, never the server-side one
fn client_error(file: &str, err: ArchiveError) -> ComicError {
    match err {
        ArchiveError::NotFound(_) => ArchiveError::NotFound(file.to_string()).into(),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::mock_store::MockArchiveBackend;
    use crate::archive::ArchiveError;
    use crate::archive::ExtractedEntry;
    use async_trait::async_trait;
    use futures::StreamExt;

    const ROOT: &str = "/library";

    fn service_with(mock: Arc<MockArchiveBackend>) -> ComicService {
        ComicService::new(mock, PathBuf::from(ROOT), Duration::from_secs(5))
    }

    fn sample() -> Arc<MockArchiveBackend> {
        let mock = Arc::new(MockArchiveBackend::new());
        mock.insert_archive(
            "/library/book.cbz",
            &[
                ("readme.txt", b"read me"),
                ("002.png", b"second"),
                ("001.jpg", b"first page"),
                ("thumbs.bmp.tmp", b"junk"),
            ],
        );
        mock
    }

    async fn collect(page: ExtractedPage) -> Vec<u8> {
        let mut stream = page.stream;
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        body
    }

    #[tokio::test]
    async fn test_end_to_end_listing_and_extraction() {
        let service = service_with(sample());

        let listing = service.list("book.cbz").await.unwrap();
        let got: Vec<(&str, u32)> = listing.entries.iter().map(|e| (e.filename.as_str(), e.file_offset)).collect();
        assert_eq!(got, vec![("001.jpg", 2), ("002.png", 1)]);
        assert_eq!(listing.entries[0].size, 10);

        let page = service.extract_by_offset("book.cbz", 2, None).await.unwrap();
        assert_eq!(page.filename, "001.jpg");
        assert_eq!(page.content_type, "image/jpeg");
        assert_eq!(collect(page).await, b"first page");
    }

    #[tokio::test]
    async fn test_listing_is_idempotent_and_uncached() {
        let mock = sample();
        let service = service_with(mock.clone());

        let first = service.list("book.cbz").await.unwrap();
        let second = service.list("book.cbz").await.unwrap();
        assert_eq!(first.entries, second.entries);
        assert_eq!(first.token, second.token);

        service.extract_by_offset("book.cbz", 1, None).await.unwrap();
        assert_eq!(mock.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_offset_out_of_bounds() {
        let service = service_with(sample());
        match service.extract_by_offset("book.cbz", 4, None).await {
            Err(ComicError::InvalidOffset { offset, count }) => {
                assert_eq!(offset, 4);
                assert_eq!(count, 4);
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("offset past the end must not produce a stream"),
        }
    }

    #[tokio::test]
    async fn test_non_image_offsets_are_still_addressable() {
        let service = service_with(sample());
        let page = service.extract_by_offset("book.cbz", 0, None).await.unwrap();
        assert_eq!(page.content_type, "application/octet-stream");
        assert_eq!(collect(page).await, b"read me");
    }

    #[tokio::test]
    async fn test_stale_token_is_rejected() {
        let mock = sample();
        let service = service_with(mock.clone());
        let listing = service.list("book.cbz").await.unwrap();

        assert!(service.extract_by_offset("book.cbz", 2, Some(&listing.token)).await.is_ok());

        mock.insert_archive("/library/book.cbz", &[("001.jpg", b"replaced"), ("002.png", b"x"), ("003.png", b"y")]);
        assert!(matches!(
            service.extract_by_offset("book.cbz", 2, Some(&listing.token)).await,
            Err(ComicError::StaleListing)
        ));
        // without a token the fresh raw order is trusted
        let page = service.extract_by_offset("book.cbz", 2, None).await.unwrap();
        assert_eq!(page.filename, "003.png");
    }

    #[tokio::test]
    async fn test_unreadable_archive() {
        let mock = Arc::new(MockArchiveBackend::new());
        mock.insert_corrupt("/library/bad.cbr", "Can not open the file as archive");
        let service = service_with(mock);

        match service.list("bad.cbr").await {
            Err(ComicError::ArchiveUnreadable(msg)) => assert_eq!(msg, "Can not open the file as archive"),
            other => panic!("unexpected result: {:?}", other),
        }
        match service.list("missing.cbz").await {
            Err(ComicError::ArchiveUnreadable(msg)) => {
                assert_eq!(msg, "Archive not found: missing.cbz");
                assert!(!msg.contains(ROOT));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        match service.extract_by_offset("gone/missing.cbz", 0, None).await {
            Err(e) => assert_eq!(e.to_string(), "Archive not found: gone/missing.cbz"),
            Ok(_) => panic!("missing archive must not produce a stream"),
        }
        assert!(matches!(service.list("../etc/passwd").await, Err(ComicError::InvalidPath(_))));
    }

    /// Stalls listing or extraction well past any test timeout
    struct SlowBackend {
        stall_listing: bool,
    }

    #[async_trait]
    impl ArchiveBackend for SlowBackend {
        async fn list_entries(&self, _archive: &Path) -> Result<Vec<RawEntry>, ArchiveError> {
            if self.stall_listing {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok(vec![RawEntry::new("001.jpg", 10)])
        }

        async fn extract_entry(&self, _archive: &Path, _filename: &str) -> Result<ExtractedEntry, ArchiveError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(ArchiveError::Extraction("unreachable".to_string()))
        }

        async fn fingerprint(&self, _archive: &Path) -> Result<String, ArchiveError> {
            Ok("slow".to_string())
        }
    }

    #[tokio::test]
    async fn test_enumeration_timeout() {
        let backend = Arc::new(SlowBackend { stall_listing: true });
        let service = ComicService::new(backend, PathBuf::from(ROOT), Duration::from_millis(20));
        match service.list("huge.cbz").await {
            Err(ComicError::ArchiveUnreadable(msg)) => assert!(msg.contains("timed out")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_extraction_timeout() {
        let backend = Arc::new(SlowBackend { stall_listing: false });
        let service = ComicService::new(backend, PathBuf::from(ROOT), Duration::from_millis(20));
        match service.extract_by_offset("huge.cbz", 0, None).await {
            Err(ComicError::ExtractionFailed(msg)) => {
                assert!(msg.contains("timed out"));
                assert!(msg.contains("001.jpg"));
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("a stalled extraction must not produce a stream"),
        }
    }
}
