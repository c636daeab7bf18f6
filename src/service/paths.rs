//! Client path resolution
//!
//! Client paths are relative to the comics root. A leading slash is ignored,
//! and `..` segments or NUL bytes are refused so a request can never name a
//! file outside the root.

use std::path::{Path, PathBuf};

use crate::error::ComicError;

pub fn resolve_under_root(root: &Path, relative: &str) -> Result<PathBuf, ComicError> {
    if relative.contains('\0') {
        return Err(ComicError::InvalidPath("path contains null bytes".to_string()));
    }

    let normalized = relative.replace('\\', "/");
    let mut resolved = root.to_path_buf();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(ComicError::InvalidPath(format!("{} leaves the comics root", relative))),
            segment => resolved.push(segment),
        }
    }
    Ok(resolved)
}
