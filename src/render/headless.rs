//! CPU back end.
//!
//! Runs the same elevation and normal-map passes as the GPU shaders on the
//! CPU, which lets the clipmap run without a window and lets tests read back
//! texels. Buffers are recorded but never drawn.

use half::f16;
use rayon::prelude::*;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::math::IntVector2;
use crate::terrain::elevation::ElevationData;
use crate::terrain::toroidal::{grid_of, texel_of};
use crate::terrain::vertex::TerrainVertex;

use super::device::{ElevationUpdate, NormalMapUpdate, RenderDevice, TargetFormat};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeadlessBuffer {
    pub id: usize,
    /// Element count
    pub len: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeadlessTexture {
    pub id: usize,
    pub width: u32,
    pub height: u32,
}

/// Counters for everything the device has been asked to do
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub vertex_buffers: usize,
    pub index_buffers: usize,
    pub textures: usize,
    pub elevation_updates: usize,
    pub normal_map_updates: usize,
    /// Elevation texels rewritten, summed over all updates
    pub texels_written: u64,
}

enum TextureData {
    /// Normalized heights, row-major
    Heightmap(Vec<f32>),
    Color,
    Target { format: TargetFormat, texels: Vec<[f32; 4]> },
}

struct StoredTexture {
    width: u32,
    height: u32,
    data: TextureData,
}

#[derive(Default)]
pub struct HeadlessDevice {
    buffers: Vec<usize>,
    textures: Vec<StoredTexture>,
    stats: DeviceStats,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    /// Read back one texel of a render target
    pub fn texel(&self, texture: &HeadlessTexture, x: u32, y: u32) -> Result<[f32; 4]> {
        let texels = self.target_texels(texture)?;
        texels
            .get((y * texture.width + x) as usize)
            .copied()
            .ok_or_else(|| Error::Device(format!("texel ({x}, {y}) outside {}x{}", texture.width, texture.height)))
    }

    /// All texels of a render target, row-major
    pub fn target_texels(&self, texture: &HeadlessTexture) -> Result<&[[f32; 4]]> {
        match self.textures.get(texture.id).map(|t| &t.data) {
            Some(TextureData::Target { texels, .. }) => Ok(texels),
            _ => Err(Error::Device(format!("texture {} is not a render target", texture.id))),
        }
    }

    fn add_texture(&mut self, texture: StoredTexture) -> HeadlessTexture {
        let handle = HeadlessTexture { id: self.textures.len(), width: texture.width, height: texture.height };
        self.textures.push(texture);
        self.stats.textures += 1;
        handle
    }

    fn take_target(&mut self, texture: &HeadlessTexture, expected: TargetFormat) -> Result<Vec<[f32; 4]>> {
        match self.textures.get_mut(texture.id).map(|t| &mut t.data) {
            Some(TextureData::Target { format, texels }) if *format == expected => Ok(std::mem::take(texels)),
            _ => Err(Error::Device(format!("texture {} is not a {expected:?} target", texture.id))),
        }
    }

    fn restore_target(&mut self, texture: &HeadlessTexture, data: Vec<[f32; 4]>) {
        if let Some(TextureData::Target { texels, .. }) = self.textures.get_mut(texture.id).map(|t| &mut t.data) {
            *texels = data;
        }
    }
}

impl RenderDevice for HeadlessDevice {
    type Buffer = HeadlessBuffer;
    type Texture = HeadlessTexture;

    fn create_vertex_buffer(&mut self, _label: &str, vertices: &[TerrainVertex]) -> Result<HeadlessBuffer> {
        self.stats.vertex_buffers += 1;
        self.buffers.push(vertices.len());
        Ok(HeadlessBuffer { id: self.buffers.len() - 1, len: vertices.len() })
    }

    fn create_index_buffer(&mut self, _label: &str, indices: &[u16]) -> Result<HeadlessBuffer> {
        self.stats.index_buffers += 1;
        self.buffers.push(indices.len());
        Ok(HeadlessBuffer { id: self.buffers.len() - 1, len: indices.len() })
    }

    fn create_heightmap(&mut self, elevation: &ElevationData) -> Result<HeadlessTexture> {
        let values = elevation.samples().par_iter().map(|&s| s as f32 / u16::MAX as f32).collect();
        Ok(self.add_texture(StoredTexture {
            width: elevation.width(),
            height: elevation.height(),
            data: TextureData::Heightmap(values),
        }))
    }

    fn create_color_texture(&mut self, _label: &str, image: &image::RgbaImage) -> Result<HeadlessTexture> {
        let (width, height) = image.dimensions();
        Ok(self.add_texture(StoredTexture { width, height, data: TextureData::Color }))
    }

    fn create_render_target(&mut self, _label: &str, size: u32, format: TargetFormat) -> Result<HeadlessTexture> {
        if size == 0 {
            return Err(Error::Device("render target size is 0".into()));
        }
        let texels = vec![[0.0; 4]; size as usize * size as usize];
        Ok(self.add_texture(StoredTexture { width: size, height: size, data: TextureData::Target { format, texels } }))
    }

    fn render_elevation(
        &mut self,
        target: &HeadlessTexture,
        heightmap: &HeadlessTexture,
        update: &ElevationUpdate,
    ) -> Result<()> {
        let mut texels = self.take_target(target, TargetFormat::Elevation)?;

        let result = match self.textures.get(heightmap.id) {
            Some(StoredTexture { width, height, data: TextureData::Heightmap(values) }) => {
                let map = HeightSampler { width: *width as i32, height: *height as i32, values, scale: update.height_scale };
                fill_elevation(&mut texels, &map, update);
                Ok(())
            }
            _ => Err(Error::Device(format!("texture {} is not a heightmap", heightmap.id))),
        };
        self.restore_target(target, texels);
        result?;

        let written: u64 = update.regions.iter().map(|r| r.area()).sum();
        self.stats.elevation_updates += 1;
        self.stats.texels_written += written;
        Ok(())
    }

    fn render_normal_map(
        &mut self,
        target: &HeadlessTexture,
        elevation: &HeadlessTexture,
        update: &NormalMapUpdate,
    ) -> Result<()> {
        let mut texels = self.take_target(target, TargetFormat::NormalMap)?;
        let result = match self.target_texels(elevation) {
            Ok(heights) if heights.len() == texels.len() => {
                fill_normals(&mut texels, heights, update);
                Ok(())
            }
            Ok(_) => Err(Error::Device("elevation and normal map sizes differ".into())),
            Err(e) => Err(e),
        };
        self.restore_target(target, texels);
        result?;

        self.stats.normal_map_updates += 1;
        Ok(())
    }
}

/// Wrapping point sampler over the normalized heightmap
struct HeightSampler<'a> {
    width: i32,
    height: i32,
    values: &'a [f32],
    scale: f32,
}

impl HeightSampler<'_> {
    fn height(&self, x: i32, y: i32) -> f32 {
        let x = x.rem_euclid(self.width);
        let y = y.rem_euclid(self.height);
        self.values[(y * self.width + x) as usize] * self.scale
    }
}

/// Fine and coarse heights for one grid vertex. Vertices that are not on the
/// coarser grid take the coarser level's interpolated height along the edge or
/// the cell diagonal they fall on.
fn elevation_texel(map: &HeightSampler, world: IntVector2, grid: IntVector2, spacing: i32) -> [f32; 4] {
    let (x, y, s) = (world.x, world.y, spacing);
    let fine = map.height(x, y);
    let coarse = match (grid.x & 1 == 1, grid.y & 1 == 1) {
        (false, false) => fine,
        (true, false) => 0.5 * (map.height(x - s, y) + map.height(x + s, y)),
        (false, true) => 0.5 * (map.height(x, y - s) + map.height(x, y + s)),
        (true, true) => 0.5 * (map.height(x + s, y - s) + map.height(x - s, y + s)),
    };
    [fine, coarse, 0.0, 1.0]
}

fn fill_elevation(texels: &mut [[f32; 4]], map: &HeightSampler, update: &ElevationUpdate) {
    let size = update.texture_size as usize;
    let regions = &update.regions;

    texels.par_chunks_mut(size).enumerate().for_each(|(ty, row)| {
        for (tx, texel) in row.iter_mut().enumerate() {
            if !regions.iter().any(|r| r.contains(tx as u32, ty as u32)) {
                continue;
            }
            let grid = grid_of(IntVector2::new(tx as i32, ty as i32), update.toroidal_origin, size as i32);
            let world = update.position_min + grid * update.grid_spacing;
            *texel = elevation_texel(map, world, grid, update.grid_spacing);
        }
    });
}

fn fill_normals(texels: &mut [[f32; 4]], heights: &[[f32; 4]], update: &NormalMapUpdate) {
    let size = update.texture_size as i32;
    let origin = update.toroidal_origin;
    let fine = |grid: IntVector2| {
        let clamped = IntVector2::new(grid.x.clamp(0, size - 1), grid.y.clamp(0, size - 1));
        let t = texel_of(clamped, origin, size);
        heights[(t.y * size + t.x) as usize][0]
    };

    texels.par_chunks_mut(size as usize).enumerate().for_each(|(ty, row)| {
        for (tx, texel) in row.iter_mut().enumerate() {
            let g = grid_of(IntVector2::new(tx as i32, ty as i32), origin, size);
            let dx = (fine(g + IntVector2::new(1, 0)) - fine(g - IntVector2::new(1, 0))) * update.normal_scale;
            let dy = (fine(g + IntVector2::new(0, 1)) - fine(g - IntVector2::new(0, 1))) * update.normal_scale;
            // Stored as Rg16Float on the GPU
            *texel = [f16::from_f32(dx).to_f32(), f16::from_f32(dy).to_f32(), 0.0, 0.0];
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::toroidal::TexelRect;

    fn ramp_heightmap(device: &mut HeadlessDevice) -> HeadlessTexture {
        // Height grows by one sample per unit of x
        let samples = (0..64 * 64).map(|i| ((i % 64) * 1000) as u16).collect();
        let data = ElevationData::from_samples(64, 64, samples).unwrap();
        device.create_heightmap(&data).unwrap()
    }

    fn update(regions: Vec<TexelRect>) -> ElevationUpdate {
        ElevationUpdate {
            position_min: IntVector2::new(4, 0),
            grid_spacing: 2,
            toroidal_origin: IntVector2::ZERO,
            texture_size: 8,
            height_scale: u16::MAX as f32,
            regions,
        }
    }

    #[test]
    fn test_elevation_fine_and_coarse_channels() {
        let mut device = HeadlessDevice::new();
        let heightmap = ramp_heightmap(&mut device);
        let target = device.create_render_target("elevation", 8, TargetFormat::Elevation).unwrap();

        device.render_elevation(&target, &heightmap, &update(vec![TexelRect::full(8)])).unwrap();

        // Grid (1, 0) is world x = 6: odd in x, so coarse averages x = 4 and x = 8
        let texel = device.texel(&target, 1, 0).unwrap();
        assert!((texel[0] - 6000.0).abs() < 0.01);
        assert!((texel[1] - 6000.0).abs() < 0.01);
        assert_eq!(texel[3], 1.0);

        // Grid (2, 0) lies on the coarser grid
        let texel = device.texel(&target, 2, 0).unwrap();
        assert_eq!(texel[0], texel[1]);
    }

    #[test]
    fn test_coarse_channel_interpolates_across_steps() {
        let mut device = HeadlessDevice::new();
        let samples = (0..16 * 16).map(|i| if (i % 16) % 4 == 2 { 3000 } else { 0 }).collect();
        let heightmap = device.create_heightmap(&ElevationData::from_samples(16, 16, samples).unwrap()).unwrap();
        let target = device.create_render_target("elevation", 8, TargetFormat::Elevation).unwrap();

        let mut u = update(vec![TexelRect::full(8)]);
        u.position_min = IntVector2::ZERO;
        device.render_elevation(&target, &heightmap, &u).unwrap();

        // World x = 2 is a spike between two zero coarse vertices
        let texel = device.texel(&target, 1, 0).unwrap();
        assert!((texel[0] - 3000.0).abs() < 0.01);
        assert_eq!(texel[1], 0.0);
    }

    #[test]
    fn test_regions_limit_writes() {
        let mut device = HeadlessDevice::new();
        let heightmap = ramp_heightmap(&mut device);
        let target = device.create_render_target("elevation", 8, TargetFormat::Elevation).unwrap();

        device.render_elevation(&target, &heightmap, &update(vec![TexelRect::new(0, 0, 2, 8)])).unwrap();
        assert_eq!(device.texel(&target, 1, 5).unwrap()[3], 1.0);
        assert_eq!(device.texel(&target, 2, 5).unwrap(), [0.0; 4]);
        assert_eq!(device.stats().texels_written, 16);
        assert_eq!(device.stats().elevation_updates, 1);
    }

    #[test]
    fn test_normal_map_gradient() {
        let mut device = HeadlessDevice::new();
        let heightmap = ramp_heightmap(&mut device);
        let elevation = device.create_render_target("elevation", 8, TargetFormat::Elevation).unwrap();
        let normals = device.create_render_target("normals", 8, TargetFormat::NormalMap).unwrap();

        let mut u = update(vec![TexelRect::full(8)]);
        u.height_scale = 1.0;
        device.render_elevation(&elevation, &heightmap, &u).unwrap();
        device
            .render_normal_map(&normals, &elevation, &NormalMapUpdate {
                toroidal_origin: IntVector2::ZERO,
                texture_size: 8,
                normal_scale: 0.5 / 2.0,
            })
            .unwrap();

        // Interior texel: height rises 1000/65535 per world unit along x, flat along y
        let texel = device.texel(&normals, 3, 3).unwrap();
        let expected = 1000.0 / u16::MAX as f32;
        assert!((texel[0] - expected).abs() < 1e-4, "{texel:?}");
        assert_eq!(texel[1], 0.0);
    }

    #[test]
    fn test_wrong_target_kind_is_an_error() {
        let mut device = HeadlessDevice::new();
        let heightmap = ramp_heightmap(&mut device);
        let normals = device.create_render_target("normals", 8, TargetFormat::NormalMap).unwrap();
        assert!(device.render_elevation(&normals, &heightmap, &update(vec![TexelRect::full(8)])).is_err());
        assert!(device.render_elevation(&heightmap, &heightmap, &update(vec![TexelRect::full(8)])).is_err());
    }
}
