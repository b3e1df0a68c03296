//! L-shaped one-cell strip between a level's ring and the next finer level.
//!
//! The finer level covers 2M-1 of the 2M cells of the ring hole, so one row
//! and one column are left over. Which row and column depends on where the
//! viewer sits inside the central square; each orientation names the corner
//! of the hole that the L wraps around.

use crate::core::types::Result;
use crate::math::IntVector2;
use crate::render::device::RenderDevice;

use super::draw_list::{DrawList, DrawUniform, MeshKind};
use super::geometry_cache::GeometryCache;
use super::settings::{BLOCK_SIZE_M, CENTRAL_SQUARE_MAX, CENTRAL_SQUARE_MIN, ELEVATION_TEXTURE_SIZE_INVERSE};
use super::vertex::TerrainVertex;

/// Horizontal run of 2(2M+1) plus vertical run of 2(2M)
pub const NUM_VERTICES: usize = (8 * BLOCK_SIZE_M + 2) as usize;
pub const NUM_INDICES: usize = (16 * BLOCK_SIZE_M - 4) as usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrimOrientation {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl TrimOrientation {
    pub const ALL: [Self; 4] = [Self::TopLeft, Self::TopRight, Self::BottomLeft, Self::BottomRight];

    pub fn index(self) -> usize {
        match self {
            Self::TopLeft => 0,
            Self::TopRight => 1,
            Self::BottomLeft => 2,
            Self::BottomRight => 3,
        }
    }

    fn is_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight)
    }

    fn is_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft)
    }

    /// Pick the orientation for a viewer at `viewer_grid` (this level's grid).
    /// Positions off the central square's corners keep `current`.
    pub fn select(viewer_grid: IntVector2, current: Self) -> Self {
        let (min, max) = (CENTRAL_SQUARE_MIN, CENTRAL_SQUARE_MAX);
        if viewer_grid == IntVector2::new(max.x, min.y) {
            Self::TopLeft
        } else if viewer_grid == min {
            Self::TopRight
        } else if viewer_grid == max {
            Self::BottomLeft
        } else if viewer_grid == IntVector2::new(min.x, max.y) {
            Self::BottomRight
        } else {
            current
        }
    }

    /// Grid position, in this level's grid, of the finer level's vertex (0, 0)
    pub fn coarser_grid_pos_min(self) -> IntVector2 {
        let m = BLOCK_SIZE_M;
        match self {
            Self::BottomLeft => IntVector2::new(m, m),
            Self::BottomRight => IntVector2::new(m - 1, m),
            Self::TopLeft => IntVector2::new(m, m - 1),
            Self::TopRight => IntVector2::new(m - 1, m - 1),
        }
    }
}

/// Vertices for one orientation: two rows of 2M+1 along x, then two columns
/// of 2M along y
pub fn vertices(orientation: TrimOrientation) -> Vec<TerrainVertex> {
    let m = BLOCK_SIZE_M;
    let row = if orientation.is_top() { 3 * m - 2 } else { m - 1 };
    let column = if orientation.is_left() { m - 1 } else { 3 * m - 2 };
    let y_start = if orientation.is_top() { m - 1 } else { m };

    let mut vertices = Vec::with_capacity(NUM_VERTICES);
    for r in 0..2 {
        vertices.extend((0..2 * m + 1).map(|x| TerrainVertex::new(m - 1 + x, row + r)));
    }
    for y in 0..2 * m {
        vertices.extend((0..2).map(|x| TerrainVertex::new(column + x, y_start + y)));
    }
    vertices
}

/// Indices shared by all four orientations. The horizontal run is a plain
/// two-rail strip; the vertical run restarts on every row with repeats.
pub fn indices() -> Vec<u16> {
    let m = BLOCK_SIZE_M as u16;
    let row_len = 2 * m + 1;
    let mut indices = Vec::with_capacity(NUM_INDICES);

    for x in 0..row_len {
        indices.push(x);
        indices.push(x + row_len);
    }
    indices.push(2 * row_len - 1);

    let column_base = 2 * row_len;
    for y in 0..2 * m - 1 {
        let lower = column_base + 2 * y;
        let upper = lower + 2;
        indices.extend_from_slice(&[lower, lower, upper, lower + 1, upper + 1]);
        if y < 2 * m - 2 {
            indices.push(upper + 1);
        }
    }
    indices
}

/// Per-level placement of the trim mesh
#[derive(Clone, Debug)]
pub struct InteriorTrim {
    grid_spacing: i32,
    orientation: TrimOrientation,
    scale_factor: [f32; 4],
}

impl InteriorTrim {
    pub fn new(grid_spacing: i32, orientation: TrimOrientation) -> Self {
        let s = grid_spacing as f32;
        Self { grid_spacing, orientation, scale_factor: [s, s, 0.0, 0.0] }
    }

    /// Allocate the four shared orientation buffers on first use
    pub fn create<D: RenderDevice>(&self, cache: &mut GeometryCache<D>, device: &mut D) -> Result<()> {
        cache.interior_trim_meshes(device).map(|_| ())
    }

    /// Re-place under `level_min` and pick the orientation for the viewer's
    /// grid cell. Off the central square corners the orientation is kept.
    pub fn update(&mut self, level_min: IntVector2, viewer_grid: IntVector2) {
        let s = self.grid_spacing as f32;
        self.orientation = TrimOrientation::select(viewer_grid, self.orientation);
        self.scale_factor = [s, s, level_min.x as f32, level_min.y as f32];
    }

    pub fn set_orientation(&mut self, orientation: TrimOrientation) {
        self.orientation = orientation;
    }

    pub fn draw<'a, D: RenderDevice>(
        &self,
        cache: &'a GeometryCache<D>,
        centre: bool,
        shading: [f32; 4],
        list: &mut DrawList<'a, D>,
    ) {
        let Some(meshes) = cache.interior_trim() else {
            return;
        };
        let kind = if centre {
            MeshKind::CentreTrim(self.orientation)
        } else {
            MeshKind::InteriorTrim(self.orientation)
        };
        let uniform = DrawUniform::new(self.scale_factor, shading).with_fine_block_orig([
            ELEVATION_TEXTURE_SIZE_INVERSE,
            ELEVATION_TEXTURE_SIZE_INVERSE,
            0.0,
            0.0,
        ]);
        list.push(kind, meshes.mesh(self.orientation), uniform);
    }

    pub fn orientation(&self) -> TrimOrientation {
        self.orientation
    }

    pub fn scale_factor(&self) -> [f32; 4] {
        self.scale_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::strip::{tests::assert_well_formed, triangles};
    use crate::terrain::vertex::Topology;

    const M: i32 = BLOCK_SIZE_M;

    #[test]
    fn test_counts() {
        assert_eq!(indices().len(), NUM_INDICES);
        for orientation in TrimOrientation::ALL {
            assert_eq!(vertices(orientation).len(), NUM_VERTICES);
        }
        assert_eq!(*indices().iter().max().unwrap() as usize, NUM_VERTICES - 1);
    }

    #[test]
    fn test_every_orientation_is_clockwise() {
        let indices = indices();
        for orientation in TrimOrientation::ALL {
            assert_well_formed(&vertices(orientation), &indices, Topology::TriangleStrip);
        }
    }

    #[test]
    fn test_real_triangle_count() {
        // 2M cells along x and 2M-1 along y, two triangles each
        let real = triangles(&indices(), Topology::TriangleStrip).iter().filter(|t| !t.repeated).count();
        assert_eq!(real, (4 * M + 2 * (2 * M - 1)) as usize);
    }

    #[test]
    fn test_l_shape_rows_and_columns() {
        let bottom_left = vertices(TrimOrientation::BottomLeft);
        let top_right = vertices(TrimOrientation::TopRight);

        let horizontal = (2 * (2 * M + 1)) as usize;
        assert!(bottom_left[..horizontal].iter().all(|v| v.y() == M - 1 || v.y() == M));
        assert!(top_right[..horizontal].iter().all(|v| v.y() == 3 * M - 2 || v.y() == 3 * M - 1));
        assert!(bottom_left[horizontal..].iter().all(|v| v.x() == M - 1 || v.x() == M));
        assert!(top_right[horizontal..].iter().all(|v| v.x() == 3 * M - 2 || v.x() == 3 * M - 1));

        // The vertical leg starts where the horizontal leg's inner row is
        assert_eq!(bottom_left[horizontal].y(), M);
        assert_eq!(top_right.last().unwrap().y(), 3 * M - 2);
    }

    #[test]
    fn test_select_from_central_square_corners() {
        let min = CENTRAL_SQUARE_MIN;
        let max = CENTRAL_SQUARE_MAX;
        let current = TrimOrientation::BottomLeft;

        assert_eq!(TrimOrientation::select(min, current), TrimOrientation::TopRight);
        assert_eq!(TrimOrientation::select(max, current), TrimOrientation::BottomLeft);
        assert_eq!(TrimOrientation::select(IntVector2::new(max.x, min.y), current), TrimOrientation::TopLeft);
        assert_eq!(TrimOrientation::select(IntVector2::new(min.x, max.y), current), TrimOrientation::BottomRight);
        assert_eq!(TrimOrientation::select(IntVector2::new(0, 0), TrimOrientation::TopLeft), TrimOrientation::TopLeft);
    }

    #[test]
    fn test_trim_and_finer_level_tile_the_hole() {
        // Finer level covers 2M-1 coarse cells starting at coarser_grid_pos_min;
        // the trim must cover the remaining row and column of the [M-1, 3M-1] hole.
        for orientation in TrimOrientation::ALL {
            let start = orientation.coarser_grid_pos_min();
            let verts = vertices(orientation);
            let tris = triangles(&indices(), Topology::TriangleStrip);

            let mut covered = std::collections::HashSet::new();
            for tri in tris.iter().filter(|t| !t.repeated) {
                let [a, b, c] = tri.indices.map(|i| verts[i as usize]);
                covered.insert((a.x().min(b.x()).min(c.x()), a.y().min(b.y()).min(c.y())));
            }

            for y in M - 1..3 * M - 1 {
                for x in M - 1..3 * M - 1 {
                    let in_finer = x >= start.x && x < start.x + 2 * M - 1 && y >= start.y && y < start.y + 2 * M - 1;
                    assert_eq!(covered.contains(&(x, y)), !in_finer, "{orientation:?} cell ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_update_selects_orientation() {
        let mut trim = InteriorTrim::new(2, TrimOrientation::BottomLeft);
        trim.update(IntVector2::new(-256, 4), CENTRAL_SQUARE_MIN);
        assert_eq!(trim.orientation(), TrimOrientation::TopRight);
        assert_eq!(trim.scale_factor(), [2.0, 2.0, -256.0, 4.0]);

        // Off the corners the previous choice persists
        trim.update(IntVector2::new(-252, 4), IntVector2::new(3, 3));
        assert_eq!(trim.orientation(), TrimOrientation::TopRight);
        assert_eq!(trim.scale_factor(), [2.0, 2.0, -252.0, 4.0]);

        trim.set_orientation(TrimOrientation::BottomLeft);
        assert_eq!(trim.orientation(), TrimOrientation::BottomLeft);
    }
}
