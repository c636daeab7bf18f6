//! Entry addressing
//!
//! An archive entry has no identifier of its own, so clients address pages
//! by `fileOffset`: the entry's zero-based rank in the raw enumeration order.
//! Offsets are assigned before filtering, which keeps an offset meaning "the
//! Nth raw entry" no matter how the listing is filtered or sorted.

use serde::{Deserialize, Serialize};

use crate::archive::RawEntry;
use crate::collation::compare_names;

const IMAGE_EXTENSIONS: &[&str] = &[".gif", ".png", ".jpg", ".bmp"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub filename: String,
    pub size: u64,
    #[serde(rename = "fileOffset")]
    pub file_offset: u32,
}

/// Assign every raw entry its rank in enumeration order
pub fn index_entries(raw: Vec<RawEntry>) -> Vec<ArchiveEntry> {
    raw.into_iter()
        .enumerate()
        .map(|(rank, entry)| ArchiveEntry {
            filename: entry.filename,
            size: entry.size,
            file_offset: rank as u32,
        })
        .collect()
}

/// Keep image entries and order them by case-insensitive, locale-aware filename
///
/// The sort is stable, so entries whose names differ only in case keep their
/// raw relative order.
pub fn image_listing(entries: Vec<ArchiveEntry>) -> Vec<ArchiveEntry> {
    let mut images: Vec<ArchiveEntry> = entries
        .into_iter()
        .filter(|entry| is_image_name(&entry.filename))
        .collect();
    images.sort_by(|a, b| compare_names(&a.filename, &b.filename));
    images
}

pub fn is_image_name(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Content type for an extracted page, keyed on its extension
pub fn mime_type_for(filename: &str) -> &'static str {
    let lower = filename.to_lowercase();
    let extension = match lower.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => return "application/octet-stream",
    };
    match extension {
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
