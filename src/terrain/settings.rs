//! Compile-time clipmap grid dimensions.
//!
//! A level is an N×N vertex grid with N = 4M - 1: twelve M×M blocks around
//! the edge, 3×M ring fixups in the middle of each side, and a 2M×2M hole
//! filled by the next finer level plus a one-cell L-shaped trim.

use crate::math::IntVector2;

/// Vertices along one side of a block
pub const BLOCK_SIZE_M: i32 = 64;
pub const BLOCK_SIZE_M_MINUS_ONE: i32 = BLOCK_SIZE_M - 1;

/// Vertices along one side of a level
pub const GRID_SIZE_N: i32 = 4 * BLOCK_SIZE_M - 1;
pub const GRID_SIZE_N_MINUS_ONE: i32 = GRID_SIZE_N - 1;

/// The viewer may roam this 2×2 cell square (grid coordinates) before a
/// level re-centers. Chosen so that the viewer sitting at the min corner puts
/// the finer level in the lower-left of the ring hole.
pub const CENTRAL_SQUARE_MIN: IntVector2 = IntVector2::splat(2 * BLOCK_SIZE_M - 2);
pub const CENTRAL_SQUARE_MAX: IntVector2 = IntVector2::splat(2 * BLOCK_SIZE_M - 1);

/// Elevation and normal textures hold one texel per grid vertex plus one
/// spare row and column so the size stays a power of two
pub const ELEVATION_TEXTURE_SIZE: i32 = GRID_SIZE_N + 1;
pub const ELEVATION_TEXTURE_SIZE_INVERSE: f32 = 1.0 / ELEVATION_TEXTURE_SIZE as f32;
pub const NORMAL_MAP_TEXTURE_SIZE: i32 = GRID_SIZE_N + 1;
pub const NORMAL_MAP_TEXTURE_SIZE_INVERSE: f32 = 1.0 / NORMAL_MAP_TEXTURE_SIZE as f32;

/// Width in grid cells of the band where a level morphs into its coarser neighbour
pub const TRANSITION_WIDTH: i32 = GRID_SIZE_N / 10;
pub const TRANSITION_WIDTH_INVERSE: f32 = 1.0 / TRANSITION_WIDTH as f32;

/// Distance from the viewer (grid cells) at which morphing starts
pub const ALPHA_OFFSET: i32 = GRID_SIZE_N_MINUS_ONE / 2 - TRANSITION_WIDTH - 1;

pub const DEFAULT_LEVEL_COUNT: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_layout_closes() {
        // Last ring block starts at 3(M-1)+2 and spans M-1 cells
        assert_eq!(3 * BLOCK_SIZE_M_MINUS_ONE + 2 + BLOCK_SIZE_M_MINUS_ONE, GRID_SIZE_N_MINUS_ONE);
        // The finer level spans N-1 fine cells = 2M-1 coarse cells, one less than the hole
        assert_eq!(GRID_SIZE_N_MINUS_ONE / 2, 2 * BLOCK_SIZE_M - 1);
        assert!(ELEVATION_TEXTURE_SIZE.count_ones() == 1);
    }

    #[test]
    fn test_transition_band_fits_inside_level() {
        assert!(ALPHA_OFFSET > 0);
        assert_eq!(ALPHA_OFFSET + TRANSITION_WIDTH + 1, GRID_SIZE_N_MINUS_ONE / 2);
    }
}
