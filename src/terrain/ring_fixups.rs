//! Fills the 3-vertex-wide gaps between the ring blocks in the middle of
//! each side of a level

use crate::core::types::Result;
use crate::math::IntVector2;
use crate::render::device::RenderDevice;

use super::draw_list::{DrawList, DrawUniform, MeshKind};
use super::geometry_cache::GeometryCache;
use super::settings::{BLOCK_SIZE_M, BLOCK_SIZE_M_MINUS_ONE, ELEVATION_TEXTURE_SIZE_INVERSE};
use super::strip::StripBuilder;
use super::vertex::TerrainVertex;

/// Four patches of 3×M vertices
pub const NUM_VERTICES: usize = (BLOCK_SIZE_M * 3 * 4) as usize;
/// Eight 2M-index bands joined by seven 2-index degenerate runs
pub const NUM_INDICES: usize = (BLOCK_SIZE_M * 16 + 14) as usize;

/// First column of the bottom/top patches and first row of the left/right patches
const CROSS_START: i32 = 2 * BLOCK_SIZE_M_MINUS_ONE;
/// First row of the top patch and first column of the right patch
const FAR_START: i32 = 3 * BLOCK_SIZE_M_MINUS_ONE + 2;

struct Patch {
    origin: IntVector2,
    /// Long axis runs along y (bottom, top) or x (left, right)
    vertical: bool,
}

const PATCHES: [Patch; 4] = [
    Patch { origin: IntVector2::new(CROSS_START, 0), vertical: true },
    Patch { origin: IntVector2::new(CROSS_START, FAR_START), vertical: true },
    Patch { origin: IntVector2::new(0, CROSS_START), vertical: false },
    Patch { origin: IntVector2::new(FAR_START, CROSS_START), vertical: false },
];

/// Shared vertices: each patch row-major in its own 3×M or M×3 box
pub fn vertices() -> Vec<TerrainVertex> {
    let m = BLOCK_SIZE_M;
    let mut vertices = Vec::with_capacity(NUM_VERTICES);
    for patch in &PATCHES {
        let (w, h) = if patch.vertical { (3, m) } else { (m, 3) };
        for y in 0..h {
            for x in 0..w {
                vertices.push(TerrainVertex::new(patch.origin.x + x, patch.origin.y + y));
            }
        }
    }
    vertices
}

/// Shared indices: one triangle strip through all four patches
pub fn indices() -> Vec<u16> {
    let m = BLOCK_SIZE_M as u16;
    let patch_len = 3 * m;
    let mut strip = StripBuilder::new();

    for (p, patch) in PATCHES.iter().enumerate() {
        let base = p as u16 * patch_len;
        for band in 0..2u16 {
            if patch.vertical {
                // Walk up between columns `band` and `band + 1`
                strip.band(
                    (0..m).map(|y| base + y * 3 + band + 1),
                    (0..m).map(|y| base + y * 3 + band),
                );
            } else {
                // Walk right between rows `band` and `band + 1`
                strip.band(
                    (0..m).map(|x| base + band * m + x),
                    (0..m).map(|x| base + (band + 1) * m + x),
                );
            }
        }
    }

    strip.finish()
}

/// Per-level placement of the shared ring fixup strip
#[derive(Clone, Debug)]
pub struct RingFixups {
    grid_spacing: i32,
    scale_factor: [f32; 4],
}

impl RingFixups {
    pub fn new(grid_spacing: i32) -> Self {
        let s = grid_spacing as f32;
        Self { grid_spacing, scale_factor: [s, s, 0.0, 0.0] }
    }

    /// Allocate the shared buffers on first use
    pub fn create<D: RenderDevice>(&self, cache: &mut GeometryCache<D>, device: &mut D) -> Result<()> {
        cache.ring_fixups_mesh(device).map(|_| ())
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
        if let Some(mesh) = cache.ring_fixups() {
            let uniform = DrawUniform::new(self.scale_factor, shading).with_fine_block_orig([
                ELEVATION_TEXTURE_SIZE_INVERSE,
                ELEVATION_TEXTURE_SIZE_INVERSE,
                0.0,
                0.0,
            ]);
            list.push(MeshKind::RingFixups, mesh.as_ref(), uniform);
        }
    }

    pub fn scale_factor(&self) -> [f32; 4] {
        self.scale_factor
    }
}
