//! Sector file discovery.
//!
//! Sector files are named `sd<index>.csdat`, where the index is the
//! sector's row-major position in the sector grid. Anything else in the
//! directory is ignored.

use std::fs;
use std::path::{Path, PathBuf};

/// Result of scanning a sector directory.
pub struct ScanOutcome {
    /// Discovered sectors, sorted by index.
    pub sectors: Vec<(usize, PathBuf)>,
    /// Paths that were shadowed by another file with the same index
    /// (e.g. `sd07.csdat` next to `sd7.csdat`). Later filename in sort
    /// order wins; callers should warn about the rest.
    pub duplicates: Vec<(usize, PathBuf)>,
}

#[derive(Debug)]
pub enum DirectoryError {
    /// No `sd*.csdat` files at all. Fatal to an import, unlike
    /// individual sector failures.
    NoMatches(PathBuf),
    Io(std::io::Error),
}

impl std::fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryError::NoMatches(dir) => {
                write!(f, "no sector files (sd*.csdat) found in {}", dir.display())
            }
            DirectoryError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for DirectoryError {}

impl From<std::io::Error> for DirectoryError {
    fn from(e: std::io::Error) -> Self {
        DirectoryError::Io(e)
    }
}

/// Parse a sector index out of a `sd<digits>.csdat` filename.
fn parse_sector_index(name: &str) -> Option<usize> {
    let digits = name.strip_prefix("sd")?.strip_suffix(".csdat")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Scan a directory for sector files and map them to sector indices.
///
/// Non-matching filenames are skipped silently. Duplicate indices are
/// resolved last-wins in filename sort order and reported back in
/// `ScanOutcome::duplicates`. Zero matches is the one fatal condition.
pub fn scan<P: AsRef<Path>>(dir: P) -> Result<ScanOutcome, DirectoryError> {
    let dir = dir.as_ref();

    let mut candidates: Vec<(String, usize, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
            if let Some(index) = parse_sector_index(name) {
                candidates.push((name.to_string(), index, path));
            }
        }
    }

    if candidates.is_empty() {
        return Err(DirectoryError::NoMatches(dir.to_path_buf()));
    }

    // Filesystem iteration order is unspecified; sort by filename so
    // last-wins duplicate resolution is deterministic.
    candidates.sort_by(|a, b| a.0.cmp(&b.0));

    let mut by_index: std::collections::BTreeMap<usize, PathBuf> = std::collections::BTreeMap::new();
    let mut duplicates = Vec::new();
    for (_, index, path) in candidates {
        if let Some(shadowed) = by_index.insert(index, path) {
            duplicates.push((index, shadowed));
        }
    }

    Ok(ScanOutcome {
        sectors: by_index.into_iter().collect(),
        duplicates,
    })
}
