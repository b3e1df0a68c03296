//! Back-end neutral record of one frame's terrain draws.
//!
//! The terrain walks its levels and fills a [`DrawList`]; a render back end
//! replays it in order. Uniform structs are laid out to match
//! `shaders/terrain.wgsl`.

use bytemuck::{Pod, Zeroable};

use crate::render::device::RenderDevice;

use super::geometry_cache::MeshRef;
use super::interior_trim::TrimOrientation;

/// Debug tints, applied when `FrameUniform::debug_shading` is set
pub const SHADING_BLOCK: [f32; 4] = [0.7, 0.0, 0.0, 1.0];
pub const SHADING_RING_FIXUP: [f32; 4] = [0.0, 0.7, 0.0, 1.0];
pub const SHADING_TRIM: [f32; 4] = [0.0, 0.0, 0.7, 1.0];
pub const SHADING_CENTRE: [f32; 4] = [0.7, 0.7, 0.0, 1.0];
pub const SHADING_EDGE_STITCH: [f32; 4] = [0.7, 0.7, 0.0, 1.0];

/// Which shared mesh a draw uses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Block,
    RingFixups,
    InteriorTrim(TrimOrientation),
    /// Block filling the finest level's hole
    CentreBlock,
    CentreTrim(TrimOrientation),
    EdgeStitches,
}

/// Per-frame constants (group 0)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_projection: [[f32; 4]; 4],
    pub eye_position: [f32; 3],
    /// Non-zero enables the per-mesh debug tint
    pub debug_shading: f32,
}

impl Default for FrameUniform {
    fn default() -> Self {
        Self {
            view_projection: glam::Mat4::IDENTITY.to_cols_array_2d(),
            eye_position: [0.0; 3],
            debug_shading: 0.0,
        }
    }
}

/// Per-level constants (group 1). Grid quantities are in this level's cells.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LevelUniform {
    /// World position of grid vertex (0, 0)
    pub position_min: [f32; 2],
    /// Viewer position in grid units, continuous
    pub viewer_grid: [f32; 2],
    pub toroidal_origin: [f32; 2],
    pub coarser_toroidal_origin: [f32; 2],
    /// This level's vertex (0, 0) in the coarser level's grid
    pub coarser_grid_pos_min: [f32; 2],
    pub grid_spacing: f32,
    pub alpha_offset: f32,
    pub one_over_width: f32,
    pub grid_size: f32,
    pub texture_size: f32,
    /// 1 when a coarser level exists to blend normals with
    pub has_coarser: f32,
    pub light_direction: [f32; 3],
    pub _padding: f32,
}

/// Per-draw constants (group 2, dynamic offset)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct DrawUniform {
    /// (scale x, scale y, offset x, offset y): world = grid * scale + offset
    pub scale_factor: [f32; 4],
    pub shading: [f32; 4],
    /// (texel width, texel height, unused, unused) for addressing level
    /// textures; zero falls back to `1 / LevelUniform::texture_size`
    pub fine_block_orig: [f32; 4],
    pub fine_block_orig2: [f32; 4],
}

impl DrawUniform {
    pub fn new(scale_factor: [f32; 4], shading: [f32; 4]) -> Self {
        Self { scale_factor, shading, ..Default::default() }
    }

    pub fn with_fine_block_orig(mut self, fine_block_orig: [f32; 4]) -> Self {
        self.fine_block_orig = fine_block_orig;
        self
    }
}

/// Resources bound for every draw of one level
pub struct LevelDraw<'a, D: RenderDevice> {
    pub level_index: usize,
    pub grid_spacing: i32,
    pub uniform: LevelUniform,
    pub elevation: &'a D::Texture,
    pub normal_map: &'a D::Texture,
    pub coarser_normal_map: Option<&'a D::Texture>,
}

pub struct DrawCommand<'a, D: RenderDevice> {
    pub kind: MeshKind,
    /// Index into [`DrawList::levels`]
    pub level: usize,
    pub mesh: MeshRef<'a, D::Buffer>,
    pub uniform: DrawUniform,
}

pub struct DrawList<'a, D: RenderDevice> {
    pub frame: FrameUniform,
    pub grass: Option<&'a D::Texture>,
    pub levels: Vec<LevelDraw<'a, D>>,
    pub commands: Vec<DrawCommand<'a, D>>,
}

impl<'a, D: RenderDevice> DrawList<'a, D> {
    pub fn new(frame: FrameUniform, grass: Option<&'a D::Texture>) -> Self {
        Self { frame, grass, levels: Vec::new(), commands: Vec::new() }
    }

    /// Subsequent draws bind this level's resources
    pub fn begin_level(&mut self, level: LevelDraw<'a, D>) {
        self.levels.push(level);
    }

    pub fn push(&mut self, kind: MeshKind, mesh: MeshRef<'a, D::Buffer>, uniform: DrawUniform) {
        self.commands.push(DrawCommand {
            kind,
            level: self.levels.len().saturating_sub(1),
            mesh,
            uniform,
        });
    }

    /// Mesh kinds in submission order, tagged with the level index that owns them
    pub fn sequence(&self) -> Vec<(usize, MeshKind)> {
        self.commands
            .iter()
            .map(|command| {
                let level = self.levels.get(command.level).map_or(usize::MAX, |l| l.level_index);
                (level, command.kind)
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessDevice;
    use crate::terrain::geometry_cache::GeometryCache;

    #[test]
    fn test_uniform_sizes_match_shader() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 80);
        assert_eq!(std::mem::size_of::<LevelUniform>(), 80);
        assert_eq!(std::mem::size_of::<DrawUniform>(), 64);
        assert_eq!(std::mem::offset_of!(LevelUniform, light_direction), 64);
        assert_eq!(std::mem::offset_of!(FrameUniform, eye_position), 64);
    }

    #[test]
    fn test_draw_uniform_builder() {
        let uniform = DrawUniform::new([2.0, 2.0, 8.0, -8.0], SHADING_TRIM).with_fine_block_orig([0.5, 0.5, 0.0, 0.0]);
        assert_eq!(uniform.scale_factor, [2.0, 2.0, 8.0, -8.0]);
        assert_eq!(uniform.fine_block_orig, [0.5, 0.5, 0.0, 0.0]);
        assert_eq!(uniform.fine_block_orig2, [0.0; 4]);
    }

    #[test]
    fn test_commands_attach_to_latest_level() {
        let mut device = HeadlessDevice::new();
        let mut cache = GeometryCache::new();
        cache.block_mesh(&mut device).unwrap();
        let elevation = device.create_render_target("e", 4, crate::render::device::TargetFormat::Elevation).unwrap();
        let normals = device.create_render_target("n", 4, crate::render::device::TargetFormat::NormalMap).unwrap();

        let mesh = cache.block().unwrap().as_ref();
        let mut list = DrawList::<HeadlessDevice>::new(FrameUniform::default(), None);
        for level_index in [3, 2] {
            list.begin_level(LevelDraw {
                level_index,
                grid_spacing: 1 << level_index,
                uniform: LevelUniform::default(),
                elevation: &elevation,
                normal_map: &normals,
                coarser_normal_map: None,
            });
            list.push(MeshKind::Block, mesh, DrawUniform::default());
        }

        assert_eq!(list.sequence(), vec![(3, MeshKind::Block), (2, MeshKind::Block)]);
        assert_eq!(list.commands[1].level, 1);
    }
}
