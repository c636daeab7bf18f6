//! `7z` executable backend
//!
//! Lists with `7z l -slt` and extracts single entries with `7z e` into a
//! per-request temporary directory. Works for every format the installed
//! 7-Zip understands, which covers both cbz and cbr.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::process::Command;

use crate::archive::{not_found_or_io, ArchiveBackend, ArchiveError, ExtractedEntry, RawEntry};

/// Separator line between the archive header block and the entry blocks
const SLT_SEPARATOR: &str = "----------";

pub struct SevenZipBackend {
    executable: String,
    temp_path: PathBuf,
}

impl SevenZipBackend {
    pub fn new(executable: &str, temp_path: PathBuf) -> Self {
        Self {
            executable: executable.to_string(),
            temp_path,
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.executable);
        command.kill_on_drop(true);
        command
    }
}

#[async_trait]
impl ArchiveBackend for SevenZipBackend {
    async fn list_entries(&self, archive: &Path) -> Result<Vec<RawEntry>, ArchiveError> {
        tokio::fs::metadata(archive)
            .await
            .map_err(|e| not_found_or_io(archive, e))?;

        debug!("7z list: {}", archive.display());
        let output = self
            .command()
            .arg("l")
            .arg("-slt")
            .arg("--")
            .arg(archive)
            .output()
            .await
            .map_err(|e| ArchiveError::Unreadable(format!("Failed to run {}: {}", self.executable, e)))?;

        if !output.status.success() {
            warn!("7z list failed for {}: {}", archive.display(), output.status);
            return Err(ArchiveError::Unreadable(diagnostics(&output)));
        }

        Ok(parse_slt_listing(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn extract_entry(&self, archive: &Path, filename: &str) -> Result<ExtractedEntry, ArchiveError> {
        tokio::fs::create_dir_all(&self.temp_path).await?;
        let out_dir = tempfile::Builder::new()
            .prefix("comic-shelf-")
            .tempdir_in(&self.temp_path)?;

        debug!("7z extract: {} from {} into {}", filename, archive.display(), out_dir.path().display());
        let output = self
            .command()
            .arg("e")
            .arg("-y")
            .arg("-spd")
            .arg(format!("-o{}", out_dir.path().display()))
            .arg("--")
            .arg(archive)
            .arg(filename)
            .output()
            .await
            .map_err(|e| ArchiveError::Extraction(format!("Failed to run {}: {}", self.executable, e)))?;

        if !output.status.success() {
            warn!("7z extract failed for {} in {}: {}", filename, archive.display(), output.status);
            return Err(ArchiveError::Extraction(diagnostics(&output)));
        }

        // `7z e` drops the directory part of the entry name
        let extracted = out_dir.path().join(base_name(filename));
        let file = tokio::fs::File::open(&extracted).await.map_err(|e| {
            ArchiveError::Extraction(format!("{} did not produce {}: {}", self.executable, filename, e))
        })?;

        Ok(ExtractedEntry::with_guard(file, out_dir))
    }
}

/// Parse the technical listing printed by `7z l -slt`
///
/// Entry blocks follow the first separator line and are separated by blank
/// lines. Folder entries are skipped.
pub fn parse_slt_listing(stdout: &str) -> Vec<RawEntry> {
    let mut entries = Vec::new();
    let mut lines = stdout.lines().skip_while(|line| line.trim() != SLT_SEPARATOR);
    lines.next();

    let mut block = SltBlock::default();
    for line in lines {
        let line = line.trim_end();
        if line.is_empty() {
            block.flush_into(&mut entries);
            continue;
        }
        if let Some((key, value)) = line.split_once(" = ") {
            match key {
                "Path" => {
                    block.flush_into(&mut entries);
                    block.path = Some(value.to_string());
                }
                "Size" => block.size = value.trim().parse().unwrap_or(0),
                "Folder" => block.folder = value.trim() == "+",
                "Attributes" => block.folder |= value.trim_start().starts_with('D'),
                _ => {}
            }
        }
    }
    block.flush_into(&mut entries);
    entries
}

#[derive(Default)]
struct SltBlock {
    path: Option<String>,
    size: u64,
    folder: bool,
}

impl SltBlock {
    fn flush_into(&mut self, entries: &mut Vec<RawEntry>) {
        let block = std::mem::take(self);
        if let Some(path) = block.path {
            if !block.folder {
                entries.push(RawEntry::new(path, block.size));
            }
        }
    }
}

fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

/// Human-readable failure text from a finished `7z` process
fn diagnostics(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = [stderr.trim(), stdout.trim()]
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        format!("7z exited with {}", output.status)
    } else {
        text
    }
}
