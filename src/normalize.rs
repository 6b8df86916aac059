//! Display normalization for external image editing.
//!
//! The mosaic is rescaled so its minimum maps to 0.0 and its maximum to
//! 1.0, replicated into equal RGB channels with full opacity, and handed
//! out as a float image. Editors work on an 8-bit quantization of it;
//! `quantize`/`dequantize` cover that hop. Denormalization always takes
//! the min/max recomputed from the sector set at export time, never a
//! value cached at import.

use image::{Rgba, Rgba32FImage, RgbaImage};

use crate::grid::HeightGrid;

/// Normalize a mosaic into a display image.
///
/// The optional extra rotation is purely for on-screen orientation and
/// composes on top of the mosaic's own file-to-display transform. Returns
/// the image together with the observed (min, max) over all mosaic
/// cells; a flat mosaic (max == min) normalizes to all zeros.
pub fn to_display(mosaic: &HeightGrid, rotate_for_display: bool) -> (Rgba32FImage, (f32, f32)) {
    let oriented = if rotate_for_display {
        mosaic.rotate_ccw()
    } else {
        mosaic.clone()
    };

    let (min, max) = oriented.min_max().unwrap_or((0.0, 0.0));
    let mut image = Rgba32FImage::new(oriented.width as u32, oriented.height as u32);
    for (x, y, v) in oriented.iter() {
        let n = if max > min { (v - min) / (max - min) } else { 0.0 };
        image.put_pixel(x as u32, y as u32, Rgba([n, n, n, 1.0]));
    }
    (image, (min, max))
}

/// Map an edited display image back to elevation values.
///
/// Reads the red channel (the three color channels are equal by
/// construction) and undoes the display rotation if one was applied.
/// When max == min every cell becomes `max`: a flat terrain normalizes
/// to an all-zero image, and consuming that image unedited has to
/// reproduce the flat terrain.
pub fn from_display(
    image: &Rgba32FImage,
    original_min: f32,
    original_max: f32,
    rotated_for_display: bool,
) -> HeightGrid {
    let mut grid = HeightGrid::new(image.width() as usize, image.height() as usize);
    for (x, y, px) in image.enumerate_pixels() {
        let n = px.0[0];
        let v = if original_max > original_min {
            n * (original_max - original_min) + original_min
        } else {
            original_max
        };
        grid.set(x as usize, y as usize, v);
    }

    if rotated_for_display {
        grid.rotate_cw()
    } else {
        grid
    }
}

/// Quantize a normalized float image to 8 bits per channel for editing.
pub fn quantize(image: &Rgba32FImage) -> RgbaImage {
    let mut out = RgbaImage::new(image.width(), image.height());
    for (x, y, px) in image.enumerate_pixels() {
        let q = px.0.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        out.put_pixel(x, y, Rgba(q));
    }
    out
}

/// Read an 8-bit edited image back into normalized float samples.
pub fn dequantize(image: &RgbaImage) -> Rgba32FImage {
    let mut out = Rgba32FImage::new(image.width(), image.height());
    for (x, y, px) in image.enumerate_pixels() {
        let f = px.0.map(|c| c as f32 / 255.0);
        out.put_pixel(x, y, Rgba(f));
    }
    out
}
