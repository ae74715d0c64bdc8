//! File utility functions.

use crate::error::{BestiaryError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively find files with given extension in a directory, sorted by path.
pub fn find_files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(BestiaryError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory not found: {}", dir.display()),
        )));
    }

    let extension = extension.trim_start_matches('.');
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() {
            if let Some(ext) = entry.path().extension() {
                if ext.eq_ignore_ascii_case(extension) {
                    files.push(entry.path().to_path_buf());
                }
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Decode statblock bytes: UTF-8 when valid, otherwise Windows-1252.
pub fn decode_statblock(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            tracing::debug!("Statblock is not UTF-8, decoded as Windows-1252");
            text.into_owned()
        }
    }
}

/// Read a statblock file, see [`decode_statblock`].
pub fn read_statblock_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(decode_statblock(&bytes))
}
