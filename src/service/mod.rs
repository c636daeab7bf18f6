//service/mod.rs
pub mod comic_service;
pub mod directory_service;
pub mod paths;

pub use comic_service::{ComicListing, ComicService, ExtractedPage};
pub use directory_service::{DirectoryEntry, DirectoryService};
