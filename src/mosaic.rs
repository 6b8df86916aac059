//! Sector-mosaic assembly and the file-space to display-space transform.
//!
//! Sectors are laid out row-major in file order, but the on-disk layout
//! is upside-down relative to how the terrain is edited: sector rows run
//! bottom-up and each sector's rows run bottom-up. Composition therefore
//! flips each sector vertically into an inverted row slot, then rotates
//! the whole canvas 90 degrees counter-clockwise and mirrors it left-right.
//! Splitting applies the exact inverse, so compose -> split is lossless.

use std::collections::HashMap;

use crate::grid::HeightGrid;

/// Sector index for a display-row/column position in the sector grid.
///
/// Display rows run inverted relative to file-order sector rows.
pub fn sector_index_at(display_row: usize, col: usize, sectors_x: usize, sectors_y: usize) -> usize {
    let sector_row = sectors_y - 1 - display_row;
    sector_row * sectors_x + col
}

/// Assemble sector grids into one contiguous display-space mosaic.
///
/// Missing sectors are left as flat zero patches, not errors. The
/// result has `sectors_x * grid_size` rows and `sectors_y * grid_size`
/// columns (the whole-canvas rotation swaps the axes).
pub fn compose(
    sectors: &HashMap<usize, HeightGrid>,
    sectors_x: usize,
    sectors_y: usize,
    grid_size: usize,
) -> HeightGrid {
    let mut canvas = HeightGrid::new(sectors_x * grid_size, sectors_y * grid_size);

    for display_row in 0..sectors_y {
        for col in 0..sectors_x {
            let index = sector_index_at(display_row, col, sectors_x, sectors_y);
            if let Some(sector) = sectors.get(&index) {
                canvas.blit(
                    &sector.flip_vertical(),
                    col * grid_size,
                    display_row * grid_size,
                );
            }
        }
    }

    canvas.rotate_ccw().flip_horizontal()
}

/// Split a display-space mosaic back into per-sector file-space grids.
///
/// Exact inverse of [`compose`]: mirror again, rotate clockwise, then
/// extract each block and undo its vertical flip. A grid is produced
/// for every sector position; restricting the output to the sectors
/// that were actually loaded is the caller's job.
pub fn split(
    mosaic: &HeightGrid,
    sectors_x: usize,
    sectors_y: usize,
    grid_size: usize,
) -> HashMap<usize, HeightGrid> {
    let canvas = mosaic.flip_horizontal().rotate_cw();

    let mut sectors = HashMap::new();
    for display_row in 0..sectors_y {
        for col in 0..sectors_x {
            let index = sector_index_at(display_row, col, sectors_x, sectors_y);
            let block = canvas.block(
                col * grid_size,
                display_row * grid_size,
                grid_size,
                grid_size,
            );
            sectors.insert(index, block.flip_vertical());
        }
    }
    sectors
}
