//! Zero-area triangles around a level's outer perimeter.
//!
//! Along the boundary with the coarser level every other vertex of this level
//! sits in the middle of a coarser edge. The morph pulls those vertices onto
//! the coarser edge, and the degenerate strip seals the T-junctions against
//! rasterization cracks.

use crate::core::types::Result;
use crate::math::IntVector2;
use crate::render::device::RenderDevice;

use super::draw_list::{DrawList, DrawUniform, MeshKind};
use super::geometry_cache::GeometryCache;
use super::settings::{ELEVATION_TEXTURE_SIZE_INVERSE, GRID_SIZE_N, GRID_SIZE_N_MINUS_ONE};
use super::vertex::TerrainVertex;

pub const NUM_VERTICES: usize = (4 * GRID_SIZE_N - 3) as usize;
pub const NUM_INDICES: usize = (4 * GRID_SIZE_N + 1) as usize;

/// Perimeter walked counter-clockwise from (0, 0); the last vertex
/// coincides with the first
pub fn vertices() -> Vec<TerrainVertex> {
    let n = GRID_SIZE_N;
    let last = GRID_SIZE_N_MINUS_ONE;

    let bottom = (0..n).map(|x| (x, 0));
    let right = (1..n).map(|y| (last, y));
    let top = (0..last).rev().map(|x| (x, last));
    let left = (0..last).rev().map(|y| (0, y));

    bottom
        .chain(right)
        .chain(top)
        .chain(left)
        .map(|(x, y)| TerrainVertex::new(x, y))
        .collect()
}

/// Strip indices; each corner index is emitted twice
pub fn indices() -> Vec<u16> {
    let n = GRID_SIZE_N as usize;
    let mut next = 0u16;
    (0..NUM_INDICES)
        .map(|i| {
            let index = next;
            if i % n != 0 {
                next += 1;
            }
            index
        })
        .collect()
}

/// Per-level placement of the perimeter strip
#[derive(Clone, Debug)]
pub struct EdgeStitches {
    grid_spacing: i32,
    scale_factor: [f32; 4],
}

impl EdgeStitches {
    pub fn new(grid_spacing: i32) -> Self {
        let s = grid_spacing as f32;
        Self { grid_spacing, scale_factor: [s, s, 0.0, 0.0] }
    }

    pub fn create<D: RenderDevice>(&self, cache: &mut GeometryCache<D>, device: &mut D) -> Result<()> {
        cache.edge_stitches_mesh(device).map(|_| ())
    }

    pub fn update(&mut self, level_min: IntVector2) {
        let s = self.grid_spacing as f32;
        self.scale_factor = [s, s, level_min.x as f32, level_min.y as f32];
    }

    pub fn draw<'a, D: RenderDevice>(
        &self,
        cache: &'a GeometryCache<D>,
        shading: [f32; 4],
        list: &mut DrawList<'a, D>,
    ) {
        if let Some(mesh) = cache.edge_stitches() {
            let uniform = DrawUniform::new(self.scale_factor, shading).with_fine_block_orig([
                ELEVATION_TEXTURE_SIZE_INVERSE,
                ELEVATION_TEXTURE_SIZE_INVERSE,
                0.0,
                0.0,
            ]);
            list.push(MeshKind::EdgeStitches, mesh.as_ref(), uniform);
        }
    }

    pub fn scale_factor(&self) -> [f32; 4] {
        self.scale_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::strip::{signed_area, triangles};
    use crate::terrain::vertex::Topology;

    #[test]
    fn test_counts() {
        assert_eq!(vertices().len(), NUM_VERTICES);
        assert_eq!(indices().len(), NUM_INDICES);
        assert_eq!(*indices().last().unwrap() as usize, NUM_VERTICES - 1);
    }

    #[test]
    fn test_perimeter_closes() {
        let vertices = vertices();
        assert_eq!(vertices[0], *vertices.last().unwrap());
        for pair in vertices.windows(2) {
            let step = (pair[1].x() - pair[0].x()).abs() + (pair[1].y() - pair[0].y()).abs();
            assert_eq!(step, 1);
        }
        assert!(vertices.iter().all(|v| {
            v.x() == 0 || v.y() == 0 || v.x() == GRID_SIZE_N_MINUS_ONE || v.y() == GRID_SIZE_N_MINUS_ONE
        }));
    }

    #[test]
    fn test_corners_repeat() {
        let indices = indices();
        let n = GRID_SIZE_N as usize;
        for corner in [0, n, 2 * n, 3 * n] {
            assert_eq!(indices[corner], indices[corner + 1], "corner at {corner}");
        }
        let repeats = indices.windows(2).filter(|w| w[0] == w[1]).count();
        assert_eq!(repeats, 4);
    }

    #[test]
    fn test_all_triangles_are_degenerate() {
        let vertices = vertices();
        for triangle in triangles(&indices(), Topology::TriangleStrip) {
            assert_eq!(signed_area(&vertices, &triangle), 0);
        }
    }

    #[test]
    fn test_update() {
        let mut stitches = EdgeStitches::new(16);
        stitches.update(IntVector2::new(-4064, -4064));
        assert_eq!(stitches.scale_factor(), [16.0, 16.0, -4064.0, -4064.0]);
    }
}
