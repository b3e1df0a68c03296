//! Rendering back-end abstraction consumed by the terrain core

use crate::core::types::Result;
use crate::math::IntVector2;
use crate::terrain::elevation::ElevationData;
use crate::terrain::toroidal::TexelRect;
use crate::terrain::vertex::TerrainVertex;

/// Pixel format of a level render target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetFormat {
    /// 4×f32: fine height, coarser-level height, unused, 1
    Elevation,
    /// 2×f16: height gradient (dz/dx, dz/dy)
    NormalMap,
}

/// Parameters for regenerating (part of) a level's elevation texture
#[derive(Clone, Debug, PartialEq)]
pub struct ElevationUpdate {
    /// World position of grid vertex (0, 0)
    pub position_min: IntVector2,
    pub grid_spacing: i32,
    /// Texel holding grid vertex (0, 0)
    pub toroidal_origin: IntVector2,
    pub texture_size: u32,
    /// World height of a heightmap sample of 65535
    pub height_scale: f32,
    /// Texel rectangles to write; the rest of the target is left untouched
    pub regions: Vec<TexelRect>,
}

/// Parameters for deriving a normal map from an elevation texture
#[derive(Clone, Debug, PartialEq)]
pub struct NormalMapUpdate {
    pub toroidal_origin: IntVector2,
    pub texture_size: u32,
    /// Central-difference scale, `0.5 / grid_spacing`
    pub normal_scale: f32,
}

/// Device services the terrain needs. Buffers and textures are opaque
/// handles owned by whoever created them.
pub trait RenderDevice {
    type Buffer;
    type Texture;

    fn create_vertex_buffer(&mut self, label: &str, vertices: &[TerrainVertex]) -> Result<Self::Buffer>;

    fn create_index_buffer(&mut self, label: &str, indices: &[u16]) -> Result<Self::Buffer>;

    /// Upload the static heightmap, sampled with wrapping
    fn create_heightmap(&mut self, elevation: &ElevationData) -> Result<Self::Texture>;

    /// Upload an RGBA8 colour texture (grass)
    fn create_color_texture(&mut self, label: &str, image: &image::RgbaImage) -> Result<Self::Texture>;

    /// Allocate a square render target
    fn create_render_target(&mut self, label: &str, size: u32, format: TargetFormat) -> Result<Self::Texture>;

    /// Rasterize heightmap samples into `target` over `update.regions`
    fn render_elevation(
        &mut self,
        target: &Self::Texture,
        heightmap: &Self::Texture,
        update: &ElevationUpdate,
    ) -> Result<()>;

    /// Rewrite all of `target` from the elevation texture
    fn render_normal_map(
        &mut self,
        target: &Self::Texture,
        elevation: &Self::Texture,
        update: &NormalMapUpdate,
    ) -> Result<()>;
}
