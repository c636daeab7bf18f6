//! Handler-facing error type
//!
//! Every failure a route can produce ends up here and is rendered as the
//! standard `{status: 1, data: {}, message}` envelope with HTTP 500.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

use crate::api::envelope::Envelope;
use crate::archive::ArchiveError;

#[derive(Error, Debug)]
pub enum ComicError {
    /// The archive could not be opened or enumerated
    #[error("{0}")]
    ArchiveUnreadable(String),

    /// The requested offset is outside the archive's current raw entry list
    #[error("Invalid Offset: {offset} (archive has {count} entries)")]
    InvalidOffset { offset: u32, count: usize },

    /// The offset query parameter is not an unsigned integer
    #[error("Invalid Offset: {0}")]
    MalformedOffset(String),

    /// The external extraction capability reported an error
    #[error("{0}")]
    ExtractionFailed(String),

    /// Directory listing I/O failure
    #[error("{0}")]
    Filesystem(#[from] std::io::Error),

    /// Client-supplied relative path escapes the comics root or is malformed
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The archive changed since the client listed it
    #[error("Archive has changed since it was listed, reload the page list")]
    StaleListing,
}

impl From<ArchiveError> for ComicError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Extraction(msg) => ComicError::ExtractionFailed(msg),
            other => ComicError::ArchiveUnreadable(other.to_string()),
        }
    }
}

impl ResponseError for ComicError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        error!("Request failed: {}", self);
        HttpResponse::build(self.status_code()).json(Envelope::failure(self.to_string()))
    }
}
