//! Batch statblock processing.
//!
//! Files are read and parsed in parallel; storing happens afterwards on the
//! caller's thread so a single database connection is enough.

use crate::file_utils::read_statblock_file;
use crate::import::CreatureStore;
use crate::models::{CreatureRecord, StatblockFormat};
use crate::parsers::parse_statblock;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Outcome of parsing one statblock file.
#[derive(Debug, Clone)]
pub enum ImportResult {
    /// Parsed, not yet stored.
    Parsed { path: PathBuf, record: Box<CreatureRecord> },
    /// Parsed and stored under the given ID.
    Stored { path: PathBuf, name: String, id: i64 },
    /// Reading, parsing or storing failed.
    Failed { path: PathBuf, error: String },
}

impl ImportResult {
    pub fn path(&self) -> &Path {
        match self {
            ImportResult::Parsed { path, .. } => path,
            ImportResult::Stored { path, .. } => path,
            ImportResult::Failed { path, .. } => path,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ImportResult::Failed { .. })
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, ImportResult::Stored { .. })
    }
}

/// Summary of a batch import.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub total: usize,
    pub parsed: usize,
    pub failed: usize,
    pub stored: usize,
}

impl ImportSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, result: &ImportResult) {
        self.total += 1;
        match result {
            ImportResult::Parsed { .. } => self.parsed += 1,
            ImportResult::Stored { .. } => {
                self.parsed += 1;
                self.stored += 1;
            }
            ImportResult::Failed { .. } => self.failed += 1,
        }
    }

    pub fn from_results(results: &[ImportResult]) -> Self {
        let mut summary = Self::new();
        for result in results {
            summary.add_result(result);
        }
        summary
    }
}

/// Parse a single statblock file.
pub fn parse_statblock_file(path: &Path, format: StatblockFormat) -> ImportResult {
    let parsed = read_statblock_file(path).and_then(|text| parse_statblock(&text, format));
    match parsed {
        Ok(record) => ImportResult::Parsed {
            path: path.to_path_buf(),
            record: Box::new(record),
        },
        Err(e) => {
            if e.is_parse_failure() {
                tracing::warn!("Skipping {}: not a statblock: {}", path.display(), e);
            } else {
                tracing::warn!("Skipping {}: {}", path.display(), e);
            }
            ImportResult::Failed {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        }
    }
}

/// Parse many statblock files in parallel; results keep the input order.
pub fn parse_statblock_files(paths: &[PathBuf], format: StatblockFormat) -> Vec<ImportResult> {
    parse_statblock_files_with_progress(paths, format, |_| {})
}

/// Like [`parse_statblock_files`], calling `on_parsed` as each file finishes.
pub fn parse_statblock_files_with_progress<F>(
    paths: &[PathBuf],
    format: StatblockFormat,
    on_parsed: F,
) -> Vec<ImportResult>
where
    F: Fn(&ImportResult) + Sync,
{
    paths
        .par_iter()
        .map(|path| {
            let result = parse_statblock_file(path, format);
            on_parsed(&result);
            result
        })
        .collect()
}

/// Store every parsed result, turning it into `Stored` or `Failed`.
pub fn store_results<S: CreatureStore + ?Sized>(
    results: Vec<ImportResult>,
    store: &S,
) -> Vec<ImportResult> {
    results
        .into_iter()
        .map(|result| match result {
            ImportResult::Parsed { path, record } => match store.store_creature(&record) {
                Ok(id) => ImportResult::Stored {
                    path,
                    name: record.name,
                    id,
                },
                Err(e) => {
                    tracing::warn!("Failed to store {}: {}", path.display(), e);
                    ImportResult::Failed {
                        path,
                        error: e.to_string(),
                    }
                }
            },
            other => other,
        })
        .collect()
}
