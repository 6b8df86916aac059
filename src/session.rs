//! Import/export session state and batch orchestration.
//!
//! A [`TerrainSession`] is constructed by importing a sector directory
//! and owns everything an edit session needs: the directory path, the
//! grid configuration, and the decoded per-sector grids. Core
//! operations take the session by reference; nothing lives in global
//! state and nothing outlives the session.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::Rgba32FImage;
use rayon::prelude::*;

use crate::directory::{self, DirectoryError};
use crate::grid::HeightGrid;
use crate::mosaic;
use crate::normalize;
use crate::sector;

/// Sector grid dimensions for a session. Fixed once at import.
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    /// Number of sectors in X direction
    pub sectors_x: usize,
    /// Number of sectors in Y direction
    pub sectors_y: usize,
    /// Side length of each sector's elevation grid
    pub grid_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sectors_x: 8,
            sectors_y: 8,
            grid_size: sector::DEFAULT_GRID_SIZE,
        }
    }
}

/// What happened during an import, beyond the loaded sectors themselves.
///
/// Skipped sectors are soft failures (truncated or unreadable files);
/// only an empty directory aborts the import.
pub struct ImportSummary {
    pub loaded: usize,
    /// (index, reason) for every sector dropped from the batch
    pub skipped: Vec<(usize, String)>,
    /// Shadowed paths where two filenames produced the same index
    pub duplicates: Vec<(usize, PathBuf)>,
}

/// Per-sector success/failure counts from an export.
pub struct ExportReport {
    pub written: usize,
    /// (index, reason) for every sector whose write failed
    pub failed: Vec<(usize, String)>,
}

#[derive(Debug)]
pub enum ExportError {
    /// The edited image no longer matches the session's mosaic shape.
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::DimensionMismatch { expected, actual } => write!(
                f,
                "edited image is {}x{}, expected {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
        }
    }
}

impl std::error::Error for ExportError {}

/// An edit session over one sector directory.
pub struct TerrainSession {
    directory: PathBuf,
    config: SessionConfig,
    sectors: HashMap<usize, HeightGrid>,
    paths: HashMap<usize, PathBuf>,
}

impl TerrainSession {
    /// Scan a directory and decode every sector in parallel.
    ///
    /// Truncated or unreadable sectors are dropped and reported in the
    /// summary; each surviving sector lands in its fixed slot regardless
    /// of decode completion order.
    pub fn import<P: AsRef<Path>>(
        dir: P,
        config: SessionConfig,
    ) -> Result<(Self, ImportSummary), DirectoryError> {
        let dir = dir.as_ref().to_path_buf();
        let scan = directory::scan(&dir)?;

        let grid_size = config.grid_size;
        let results: Vec<(usize, PathBuf, Result<HeightGrid, String>)> = scan
            .sectors
            .into_par_iter()
            .map(|(index, path)| {
                let decoded = fs::read(&path).map_err(|e| e.to_string()).and_then(|bytes| {
                    sector::decode(&bytes, grid_size).map_err(|e| e.to_string())
                });
                (index, path, decoded)
            })
            .collect();

        let mut sectors = HashMap::new();
        let mut paths = HashMap::new();
        let mut skipped = Vec::new();
        for (index, path, decoded) in results {
            match decoded {
                Ok(grid) => {
                    sectors.insert(index, grid);
                    paths.insert(index, path);
                }
                Err(reason) => skipped.push((index, reason)),
            }
        }

        let summary = ImportSummary {
            loaded: sectors.len(),
            skipped,
            duplicates: scan.duplicates,
        };
        let session = Self {
            directory: dir,
            config,
            sectors,
            paths,
        };
        Ok((session, summary))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    /// Loaded sector indices, sorted.
    pub fn loaded_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.sectors.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// Compose the loaded sectors into a display-space mosaic.
    /// Missing sectors stay flat zero patches.
    pub fn mosaic(&self) -> HeightGrid {
        let c = self.config;
        mosaic::compose(&self.sectors, c.sectors_x, c.sectors_y, c.grid_size)
    }

    /// Min/max elevation over the loaded sector grids only; zero
    /// patches for missing sectors do not contaminate the range. This
    /// is the range an export must denormalize against.
    pub fn elevation_range(&self) -> Option<(f32, f32)> {
        let mut range: Option<(f32, f32)> = None;
        for grid in self.sectors.values() {
            if let Some((lo, hi)) = grid.min_max() {
                range = Some(match range {
                    None => (lo, hi),
                    Some((a, b)) => (a.min(lo), b.max(hi)),
                });
            }
        }
        range
    }

    /// Pixel dimensions an edited display image must have.
    pub fn display_dimensions(&self, rotated_for_display: bool) -> (u32, u32) {
        let c = self.config;
        let (w, h) = (c.sectors_y * c.grid_size, c.sectors_x * c.grid_size);
        if rotated_for_display {
            (h as u32, w as u32)
        } else {
            (w as u32, h as u32)
        }
    }

    /// Write an edited display image back into the sector files.
    ///
    /// Denormalizes against the caller-supplied range (recompute it via
    /// [`elevation_range`](Self::elevation_range) at export time, never
    /// cache it from import), unwinds the display and mosaic transforms,
    /// splits into per-sector grids, and rewrites each loaded sector's
    /// file in place. Only loaded sectors are written: a missing file's
    /// zero patch never creates a new sector on disk. Per-sector I/O
    /// and encode failures are collected, not fatal; writes run in
    /// parallel since every sector touches a distinct file.
    pub fn export_image(
        &self,
        image: &Rgba32FImage,
        original_min: f32,
        original_max: f32,
        rotated_for_display: bool,
    ) -> Result<ExportReport, ExportError> {
        let expected = self.display_dimensions(rotated_for_display);
        let actual = (image.width(), image.height());
        if expected != actual {
            return Err(ExportError::DimensionMismatch { expected, actual });
        }

        let display =
            normalize::from_display(image, original_min, original_max, rotated_for_display);
        let c = self.config;
        let split = mosaic::split(&display, c.sectors_x, c.sectors_y, c.grid_size);

        let mut indices: Vec<usize> = self.sectors.keys().copied().collect();
        indices.sort_unstable();

        let results: Vec<(usize, Result<(), String>)> = indices
            .into_par_iter()
            .map(|index| {
                let outcome = write_sector(&self.paths[&index], &split[&index], c.grid_size);
                (index, outcome)
            })
            .collect();

        let mut written = 0;
        let mut failed = Vec::new();
        for (index, outcome) in results {
            match outcome {
                Ok(()) => written += 1,
                Err(reason) => failed.push((index, reason)),
            }
        }
        Ok(ExportReport { written, failed })
    }

    /// Snapshot of the session for the manifest written beside an
    /// imported image. Advisory only: export recomputes the range.
    pub fn manifest(&self) -> SessionManifest {
        let (min, max) = self.elevation_range().unwrap_or((0.0, 0.0));
        SessionManifest {
            version: MANIFEST_VERSION,
            directory: self.directory.clone(),
            sectors_x: self.config.sectors_x,
            sectors_y: self.config.sectors_y,
            grid_size: self.config.grid_size,
            loaded_sectors: self.sectors.len(),
            min_elevation: min,
            max_elevation: max,
            created: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Re-read one sector file, splice the new elevation samples into it,
/// and rewrite it in place at its discovered path.
fn write_sector(path: &Path, grid: &HeightGrid, grid_size: usize) -> Result<(), String> {
    let original = fs::read(path).map_err(|e| e.to_string())?;
    let encoded = sector::encode(&original, grid, grid_size).map_err(|e| e.to_string())?;
    fs::write(path, encoded).map_err(|e| e.to_string())
}

pub const MANIFEST_VERSION: u32 = 1;

/// Session metadata written beside the imported heightmap image.
/// Includes a format version for forward compatibility.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct SessionManifest {
    pub version: u32,
    pub directory: PathBuf,
    pub sectors_x: usize,
    pub sectors_y: usize,
    pub grid_size: usize,
    pub loaded_sectors: usize,
    pub min_elevation: f32,
    pub max_elevation: f32,
    pub created: String,
}

impl SessionManifest {
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            io::Error::new(io::ErrorKind::Other, format!("Serialization failed: {}", e))
        })?;
        fs::write(path, json)
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let manifest: SessionManifest = serde_json::from_str(&text).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Deserialization failed: {}", e),
            )
        })?;

        if manifest.version > MANIFEST_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Manifest version {} is newer than supported version {}",
                    manifest.version, MANIFEST_VERSION,
                ),
            ));
        }

        Ok(manifest)
    }
}
