//! HTTP routes
//!
//! * `GET /file-list?directory=` lists folders and comic archives
//! * `GET /comic/list?file=` lists the pages of an archive
//! * `GET /comic/image?file=&offset=[&token=]` streams one page

pub mod envelope;

use actix_web::{get, web, HttpResponse};
use log::debug;
use serde::Deserialize;

use crate::api::envelope::Envelope;
use crate::app_state::{extract_app_state, AppState};
use crate::error::ComicError;

#[derive(Debug, Deserialize)]
pub struct FileListQuery {
    #[serde(default)]
    pub directory: String,
}

#[derive(Debug, Deserialize)]
pub struct ComicListQuery {
    #[serde(default)]
    pub file: String,
}

#[derive(Debug, Deserialize)]
pub struct ComicImageQuery {
    #[serde(default)]
    pub file: String,
    pub offset: Option<String>,
    /// `archiveToken` from the listing this offset came from
    pub token: Option<String>,
}

#[get("/file-list")]
pub async fn file_list(
    query: web::Query<FileListQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ComicError> {
    let state = extract_app_state(&data);
    debug!("File list: directory={:?}", query.directory);

    let entries = state.directory_service.list_directory(&query.directory).await?;
    Ok(HttpResponse::Ok().json(Envelope::ok(entries).with_meta("directory", query.directory.as_str())))
}

#[get("/comic/list")]
pub async fn comic_list(
    query: web::Query<ComicListQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ComicError> {
    let state = extract_app_state(&data);
    debug!("Comic list: file={:?}", query.file);

    let listing = state.comic_service.list(&query.file).await?;
    Ok(HttpResponse::Ok().json(Envelope::ok(listing.entries).with_meta("archiveToken", listing.token)))
}

#[get("/comic/image")]
pub async fn comic_image(
    query: web::Query<ComicImageQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ComicError> {
    let state = extract_app_state(&data);
    let offset = parse_offset(query.offset.as_deref())?;
    debug!("Comic image: file={:?}, offset={}", query.file, offset);

    let page = state
        .comic_service
        .extract_by_offset(&query.file, offset, query.token.as_deref())
        .await?;
    Ok(HttpResponse::Ok()
        .content_type(page.content_type)
        .streaming(page.stream))
}

/// A missing or empty offset means the first entry
fn parse_offset(raw: Option<&str>) -> Result<u32, ComicError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(0),
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| ComicError::MalformedOffset(value.to_string())),
    }
}

/// Register every route on an `App` or scope
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(file_list)
        .service(comic_list)
        .service(comic_image);
}
