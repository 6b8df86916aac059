//! Binary codec for a single `.csdat` sector file.
//!
//! Layout per file:
//!
//! | offset            | size | meaning                                   |
//! |-------------------|------|-------------------------------------------|
//! | 0..707            | 708  | opaque header, preserved verbatim         |
//! | 708 + 4*i         | 2    | elevation sample i (LE u16, unit 1/128)   |
//! | 708 + 4*i + 2     | 2    | opaque per-cell payload, preserved        |
//! | 708 + 4*n*n .. EOF|      | opaque trailer, preserved verbatim        |
//!
//! Decoding only reads the sample bytes; encoding overwrites only the
//! sample bytes on a full copy of the original file, so every opaque
//! byte survives a decode -> edit -> encode round trip untouched.

use crate::grid::HeightGrid;

/// Opaque header length; the elevation region starts here.
pub const HEADER_LEN: usize = 708;
/// Bytes per grid cell: 2 sample bytes followed by 2 opaque payload bytes.
pub const CELL_STRIDE: usize = 4;
/// Bytes per elevation sample within a cell.
pub const SAMPLE_LEN: usize = 2;
/// Fixed-point divisor: raw file units are elevation x 128.
pub const HEIGHT_SCALE: f32 = 128.0;
/// Side length of a sector's elevation grid.
pub const DEFAULT_GRID_SIZE: usize = 65;

/// Smallest file that holds every elevation sample for `grid_size`.
///
/// The final cell only needs its 2 sample bytes; its trailing payload
/// may sit at end of file.
pub fn min_file_len(grid_size: usize) -> usize {
    HEADER_LEN + (grid_size * grid_size - 1) * CELL_STRIDE + SAMPLE_LEN
}

#[derive(Debug)]
pub enum DecodeError {
    /// File ends before the last expected elevation sample.
    Truncated { needed: usize, actual: usize },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Truncated { needed, actual } => {
                write!(f, "sector truncated: need {} bytes, have {}", needed, actual)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

#[derive(Debug)]
pub enum EncodeError {
    /// Original file is too short to hold the elevation region.
    TooSmall { needed: usize, actual: usize },
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::TooSmall { needed, actual } => {
                write!(f, "sector file too small: need {} bytes, have {}", needed, actual)
            }
        }
    }
}

impl std::error::Error for EncodeError {}

/// Decode a sector file's elevation region into a grid.
///
/// Rows are read in source order; no geometric transform is applied
/// here. A truncated file is a soft failure: callers drop the sector
/// and continue the batch.
pub fn decode(bytes: &[u8], grid_size: usize) -> Result<HeightGrid, DecodeError> {
    let needed = min_file_len(grid_size);
    if bytes.len() < needed {
        return Err(DecodeError::Truncated {
            needed,
            actual: bytes.len(),
        });
    }

    let mut grid = HeightGrid::new(grid_size, grid_size);
    for y in 0..grid_size {
        for x in 0..grid_size {
            let offset = HEADER_LEN + (y * grid_size + x) * CELL_STRIDE;
            let raw = u16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
            grid.set(x, y, raw as f32 / HEIGHT_SCALE);
        }
    }
    Ok(grid)
}

/// Encode a grid back into a sector file image.
///
/// Operates on a full copy of `original`, overwriting only the 2-byte
/// sample per cell; header, per-cell payload, and trailer are preserved
/// byte-for-byte. Values are rounded to raw units and clamped to the
/// u16 range.
pub fn encode(
    original: &[u8],
    grid: &HeightGrid,
    grid_size: usize,
) -> Result<Vec<u8>, EncodeError> {
    let needed = min_file_len(grid_size);
    if original.len() < needed {
        return Err(EncodeError::TooSmall {
            needed,
            actual: original.len(),
        });
    }

    let mut bytes = original.to_vec();
    for y in 0..grid_size {
        for x in 0..grid_size {
            let offset = HEADER_LEN + (y * grid_size + x) * CELL_STRIDE;
            let raw = (grid.get(x, y) * HEIGHT_SCALE)
                .round()
                .clamp(0.0, u16::MAX as f32) as u16;
            bytes[offset..offset + SAMPLE_LEN].copy_from_slice(&raw.to_le_bytes());
        }
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const GRID: usize = 8;

    fn random_sector_bytes(rng: &mut ChaCha8Rng, grid_size: usize, trailer: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_LEN + grid_size * grid_size * CELL_STRIDE + trailer];
        rng.fill_bytes(&mut bytes);
        bytes
    }

    #[test]
    fn test_decode_fixed_point_scale() {
        let mut bytes = vec![0u8; min_file_len(GRID)];
        // First cell: raw 128 -> 1.0, second cell: raw 64 -> 0.5
        bytes[HEADER_LEN..HEADER_LEN + 2].copy_from_slice(&128u16.to_le_bytes());
        bytes[HEADER_LEN + CELL_STRIDE..HEADER_LEN + CELL_STRIDE + 2]
            .copy_from_slice(&64u16.to_le_bytes());

        let grid = decode(&bytes, GRID).unwrap();
        assert_eq!(grid.get(0, 0), 1.0);
        assert_eq!(grid.get(1, 0), 0.5);
        assert_eq!(grid.get(2, 0), 0.0);
    }

    #[test]
    fn test_round_trip_bit_for_bit() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for trailer in [0usize, 17, 512] {
            let bytes = random_sector_bytes(&mut rng, GRID, trailer);
            let grid = decode(&bytes, GRID).unwrap();
            let encoded = encode(&bytes, &grid, GRID).unwrap();
            assert_eq!(encoded, bytes);
        }
    }

    #[test]
    fn test_minimum_length_decodes() {
        // The last cell's payload bytes may be cut off at EOF.
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut bytes = vec![0u8; min_file_len(GRID)];
        rng.fill_bytes(&mut bytes);

        let grid = decode(&bytes, GRID).unwrap();
        let encoded = encode(&bytes, &grid, GRID).unwrap();
        assert_eq!(encoded, bytes);
    }

    #[test]
    fn test_decode_truncated() {
        let bytes = vec![0u8; HEADER_LEN + 100];
        match decode(&bytes, DEFAULT_GRID_SIZE) {
            Err(DecodeError::Truncated { needed, actual }) => {
                assert_eq!(needed, min_file_len(DEFAULT_GRID_SIZE));
                assert_eq!(actual, HEADER_LEN + 100);
            }
            other => panic!("expected Truncated, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_encode_too_small() {
        let grid = HeightGrid::new(GRID, GRID);
        let bytes = vec![0u8; min_file_len(GRID) - 1];
        assert!(matches!(
            encode(&bytes, &grid, GRID),
            Err(EncodeError::TooSmall { .. })
        ));
    }

    #[test]
    fn test_encode_clamps_to_u16_range() {
        let bytes = vec![0u8; min_file_len(GRID)];
        let mut grid = HeightGrid::new(GRID, GRID);
        grid.set(0, 0, -5.0);
        grid.set(1, 0, 1000.0); // 1000 * 128 overflows u16

        let encoded = encode(&bytes, &grid, GRID).unwrap();
        let low = u16::from_le_bytes([encoded[HEADER_LEN], encoded[HEADER_LEN + 1]]);
        let high = u16::from_le_bytes([
            encoded[HEADER_LEN + CELL_STRIDE],
            encoded[HEADER_LEN + CELL_STRIDE + 1],
        ]);
        assert_eq!(low, 0);
        assert_eq!(high, u16::MAX);
    }

    #[test]
    fn test_encode_touches_only_sample_bytes() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let bytes = random_sector_bytes(&mut rng, GRID, 64);

        let mut grid = decode(&bytes, GRID).unwrap();
        for y in 0..GRID {
            for x in 0..GRID {
                grid.set(x, y, rng.gen_range(0..512) as f32);
            }
        }
        let encoded = encode(&bytes, &grid, GRID).unwrap();

        // Header and trailer untouched
        assert_eq!(&encoded[..HEADER_LEN], &bytes[..HEADER_LEN]);
        let region_end = HEADER_LEN + GRID * GRID * CELL_STRIDE;
        assert_eq!(&encoded[region_end..], &bytes[region_end..]);

        // Per-cell payload untouched, samples match the edited grid
        for i in 0..GRID * GRID {
            let offset = HEADER_LEN + i * CELL_STRIDE;
            assert_eq!(
                &encoded[offset + SAMPLE_LEN..offset + CELL_STRIDE],
                &bytes[offset + SAMPLE_LEN..offset + CELL_STRIDE]
            );
            let raw = u16::from_le_bytes([encoded[offset], encoded[offset + 1]]);
            assert_eq!(raw as f32, grid.get(i % GRID, i / GRID) * HEIGHT_SCALE);
        }
    }
}
