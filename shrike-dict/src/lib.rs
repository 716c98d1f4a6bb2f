//! Shrike Dictionary Management
//!
//! Loads pattern dictionaries from disk (one pattern per line, UTF-8) and
//! watches them for changes, rebuilding a shared detector when the file
//! content changes.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub mod watcher;
pub use watcher::{DictionaryWatcher, ReloadEvent, WatcherConfig};

/// Dictionary loading errors
#[derive(Debug, Error)]
pub enum DictError {
    #[error("IO error accessing {0:?}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("Dictionary {0:?} is not valid UTF-8")]
    InvalidEncoding(PathBuf),

    #[error("Detector rejected dictionary: {0}")]
    Build(#[from] shrike_core::DetectError),
}

/// Result type for dictionary operations
pub type DictResult<T> = Result<T, DictError>;

/// Dictionary loading statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    /// Non-empty pattern lines handed to the caller
    pub loaded: usize,

    /// Blank and comment lines dropped
    pub skipped: usize,
}

/// Split already-read dictionary content into patterns: one per line,
/// trimmed of surrounding whitespace. Blank lines and lines starting with
/// `#` are skipped. Deduplication is left to the detector's pattern
/// table.
///
/// The watcher parses from memory so the content it hashes for change
/// detection is exactly the content it builds from.
pub fn parse_dictionary(content: &str) -> (Vec<String>, LoadStats) {
    let mut words = Vec::new();
    let mut stats = LoadStats::default();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            stats.skipped += 1;
            continue;
        }
        stats.loaded += 1;
        words.push(trimmed.to_string());
    }
    (words, stats)
}

/// Load a dictionary file via [`parse_dictionary`]
pub fn load_dictionary<P: AsRef<Path>>(path: P) -> DictResult<Vec<String>> {
    load_dictionary_with_stats(path).map(|(words, _)| words)
}

/// Like [`load_dictionary`], also reporting what was skipped
pub fn load_dictionary_with_stats<P: AsRef<Path>>(
    path: P,
) -> DictResult<(Vec<String>, LoadStats)> {
    let path = path.as_ref();
    let bytes =
        std::fs::read(path).map_err(|e| DictError::Io(path.to_path_buf(), e))?;
    let content = String::from_utf8(bytes)
        .map_err(|_| DictError::InvalidEncoding(path.to_path_buf()))?;

    let (words, stats) = parse_dictionary(&content);

    info!(
        path = %path.display(),
        loaded = stats.loaded,
        skipped = stats.skipped,
        "dictionary loaded"
    );
    debug!(bytes = content.len(), "dictionary content read");

    Ok((words, stats))
}
