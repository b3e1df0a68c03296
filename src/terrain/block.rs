//! M×M grid tile, instanced by offset only

use crate::core::types::{Result, Vec3};
use crate::math::{Aabb, Frustum, IntVector2};
use crate::render::device::RenderDevice;

use super::draw_list::{DrawList, DrawUniform, MeshKind};
use super::geometry_cache::GeometryCache;
use super::settings::{BLOCK_SIZE_M, BLOCK_SIZE_M_MINUS_ONE};
use super::vertex::TerrainVertex;

pub const NUM_VERTICES: usize = (BLOCK_SIZE_M * BLOCK_SIZE_M) as usize;
pub const NUM_INDICES: usize = (BLOCK_SIZE_M_MINUS_ONE * BLOCK_SIZE_M_MINUS_ONE * 6) as usize;

/// Shared block vertices, row-major
pub fn vertices() -> Vec<TerrainVertex> {
    (0..BLOCK_SIZE_M)
        .flat_map(|y| (0..BLOCK_SIZE_M).map(move |x| TerrainVertex::new(x, y)))
        .collect()
}

/// Shared block indices, a triangle list with two clockwise triangles per cell
pub fn indices() -> Vec<u16> {
    let m = BLOCK_SIZE_M as u16;
    let mut indices = Vec::with_capacity(NUM_INDICES);
    for y in 0..m - 1 {
        for x in 0..m - 1 {
            let bottom_left = y * m + x;
            let bottom_right = bottom_left + 1;
            let top_left = bottom_left + m;
            let top_right = top_left + 1;

            indices.extend_from_slice(&[bottom_left, top_left, bottom_right]);
            indices.extend_from_slice(&[bottom_right, top_left, top_right]);
        }
    }
    indices
}

/// One placement of the shared block geometry inside a level
#[derive(Clone, Debug)]
pub struct Block {
    grid_offset: IntVector2,
    world_offset: IntVector2,
    grid_spacing: i32,
    height_bounds: (f32, f32),
    scale_factor: [f32; 4],
    bounding_box: Aabb,
    visible: bool,
}

impl Block {
    /// `grid_offset` is in level grid cells; `height_bounds` bounds the
    /// terrain surface for culling
    pub fn new(grid_offset: IntVector2, grid_spacing: i32, height_bounds: (f32, f32)) -> Self {
        Self {
            grid_offset,
            world_offset: grid_offset * grid_spacing,
            grid_spacing,
            height_bounds,
            scale_factor: [grid_spacing as f32, grid_spacing as f32, 0.0, 0.0],
            bounding_box: Aabb::default(),
            visible: true,
        }
    }

    /// Allocate the shared buffers on first use
    pub fn create<D: RenderDevice>(&self, cache: &mut GeometryCache<D>, device: &mut D) -> Result<()> {
        cache.block_mesh(device).map(|_| ())
    }

    /// Re-place this instance under a level whose footprint starts at `level_min`
    pub fn update(&mut self, level_min: IntVector2) {
        let origin = level_min + self.world_offset;
        let spacing = self.grid_spacing as f32;
        self.scale_factor = [spacing, spacing, origin.x as f32, origin.y as f32];

        let extent = (BLOCK_SIZE_M_MINUS_ONE * self.grid_spacing) as f32;
        let (z_min, z_max) = self.height_bounds;
        self.bounding_box = Aabb::new(
            Vec3::new(origin.x as f32, origin.y as f32, z_min),
            Vec3::new(origin.x as f32 + extent, origin.y as f32 + extent, z_max),
        );
    }

    /// Visible unless the frustum is disjoint from the block's bounds
    pub fn cull(&mut self, frustum: &Frustum) {
        self.visible = frustum.intersects_aabb(&self.bounding_box);
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Queue one draw, or nothing when culled
    pub fn draw<'a, D: RenderDevice>(
        &self,
        cache: &'a GeometryCache<D>,
        kind: MeshKind,
        shading: [f32; 4],
        list: &mut DrawList<'a, D>,
    ) {
        if !self.visible {
            return;
        }
        if let Some(mesh) = cache.block() {
            list.push(kind, mesh.as_ref(), DrawUniform::new(self.scale_factor, shading));
        }
    }

    pub fn grid_offset(&self) -> IntVector2 {
        self.grid_offset
    }

    pub fn world_offset(&self) -> IntVector2 {
        self.world_offset
    }

    pub fn scale_factor(&self) -> [f32; 4] {
        self.scale_factor
    }

    pub fn bounding_box(&self) -> &Aabb {
        &self.bounding_box
    }

    pub fn visible(&self) -> bool {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessDevice;
    use crate::terrain::strip::tests::assert_well_formed;
    use crate::terrain::vertex::Topology;

    #[test]
    fn test_geometry_counts() {
        assert_eq!(vertices().len(), NUM_VERTICES);
        assert_eq!(indices().len(), NUM_INDICES);
        assert_eq!(*indices().iter().max().unwrap() as usize, NUM_VERTICES - 1);
    }

    #[test]
    fn test_triangles_are_clockwise() {
        assert_well_formed(&vertices(), &indices(), Topology::TriangleList);
    }

    #[test]
    fn test_update_places_block() {
        let mut block = Block::new(IntVector2::new(BLOCK_SIZE_M_MINUS_ONE, 0), 4, (0.0, 100.0));
        block.update(IntVector2::new(-1008, 8));

        let origin_x = -1008.0 + (BLOCK_SIZE_M_MINUS_ONE * 4) as f32;
        assert_eq!(block.scale_factor(), [4.0, 4.0, origin_x, 8.0]);
        assert_eq!(block.bounding_box().min, Vec3::new(origin_x, 8.0, 0.0));
        assert_eq!(block.bounding_box().size(), Vec3::new(252.0, 252.0, 100.0));
    }

    #[test]
    fn test_shared_buffers_created_once() {
        let mut device = HeadlessDevice::new();
        let mut cache = GeometryCache::new();

        let a = Block::new(IntVector2::ZERO, 1, (0.0, 1.0));
        let b = Block::new(IntVector2::new(BLOCK_SIZE_M, BLOCK_SIZE_M), 2, (0.0, 1.0));
        a.create(&mut cache, &mut device).unwrap();
        b.create(&mut cache, &mut device).unwrap();
        a.create(&mut cache, &mut device).unwrap();

        assert_eq!(device.stats().vertex_buffers, 1);
        assert_eq!(device.stats().index_buffers, 1);
    }

    #[test]
    fn test_culled_block_is_not_drawn() {
        let mut device = HeadlessDevice::new();
        let mut cache = GeometryCache::new();
        let mut block = Block::new(IntVector2::ZERO, 1, (0.0, 10.0));
        block.create(&mut cache, &mut device).unwrap();
        block.update(IntVector2::new(1000, 1000));

        // Camera at the origin looking along -Y, away from the block
        let view = glam::Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, -10.0, 5.0), Vec3::Z);
        let proj = glam::Mat4::perspective_rh(1.0, 1.0, 1.0, 5000.0);
        block.cull(&Frustum::from_view_projection(&(proj * view)));
        assert!(!block.visible());

        let mut list = DrawList::new(Default::default(), None);
        block.draw(&cache, MeshKind::Block, [1.0; 4], &mut list);
        assert!(list.commands.is_empty());
    }
}
