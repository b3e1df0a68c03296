//! Geometry clipmap terrain.
//!
//! A [`Terrain`] owns a stack of [`Level`]s at doubling grid spacings, from
//! the coarsest (index 0) to the finest (spacing 1). Every frame the levels
//! follow the viewer, and [`Terrain::draw`] records what to render into a
//! [`DrawList`] for a [`RenderDevice`] back end.

pub mod settings;
pub mod elevation;
pub mod vertex;
pub mod strip;
pub mod block;
pub mod ring_fixups;
pub mod interior_trim;
pub mod edge_stitches;
pub mod geometry_cache;
pub mod toroidal;
pub mod level;
pub mod draw_list;
pub mod viewer;

pub use draw_list::{DrawCommand, DrawList, DrawUniform, FrameUniform, LevelDraw, LevelUniform, MeshKind};
pub use elevation::ElevationData;
pub use geometry_cache::GeometryCache;
pub use interior_trim::TrimOrientation;
pub use level::{Level, LevelFrame, LevelSettings};
pub use viewer::{CameraView, TerrainViewer};

use crate::core::config::TerrainConfig;
use crate::core::error::Error;
use crate::core::types::Result;
use crate::math::IntVector2;
use crate::render::device::RenderDevice;

/// Spacing of the coarsest level is `2^(MAX_LEVELS - 1)`
pub const MAX_LEVELS: usize = 16;

pub struct Terrain<D: RenderDevice> {
    config: TerrainConfig,
    elevation: ElevationData,
    levels: Vec<Level<D>>,
    geometry: GeometryCache<D>,
    heightmap: Option<D::Texture>,
    grass: Option<D::Texture>,
    frame: FrameUniform,
}

impl<D: RenderDevice> Terrain<D> {
    /// Lay out `config.level_count` levels over `elevation`, coarsest first
    pub fn new(config: TerrainConfig, elevation: ElevationData) -> Self {
        let level_count = config.level_count.clamp(1, MAX_LEVELS);
        if level_count != config.level_count {
            log::warn!("level_count {} out of range, using {}", config.level_count, level_count);
        }

        let (lo, hi) = elevation.range();
        let to_world = config.height_scale / u16::MAX as f32;
        let settings = LevelSettings {
            height_scale: config.height_scale,
            height_bounds: (lo as f32 * to_world, hi as f32 * to_world),
            toroidal_updates: config.toroidal_updates,
            light_direction: config.light_direction(),
        };

        let levels = (0..level_count)
            .map(|i| {
                let spacing = 1 << (level_count - 1 - i);
                let mut level = Level::new(i, spacing, settings);
                level.next_coarser = i.checked_sub(1);
                level.next_finer = (i + 1 < level_count).then_some(i + 1);
                level
            })
            .collect();

        Self {
            config,
            elevation,
            levels,
            geometry: GeometryCache::new(),
            heightmap: None,
            grass: None,
            frame: FrameUniform::default(),
        }
    }

    /// Build the heightmap from the configured source, then lay out levels
    pub fn from_config(config: TerrainConfig) -> Result<Self> {
        let elevation = ElevationData::from_source(&config.heightmap)?;
        Ok(Self::new(config, elevation))
    }

    /// Upload the heightmap and grass texture and create every level around `viewer`
    pub fn create(&mut self, device: &mut D, viewer: &impl TerrainViewer) -> Result<()> {
        let heightmap = device.create_heightmap(&self.elevation)?;

        if let Some(path) = &self.config.grass_texture {
            let image = image::open(path)?.into_rgba8();
            log::info!("Loaded grass texture {} ({}x{})", path.display(), image.width(), image.height());
            self.grass = Some(device.create_color_texture("Grass", &image)?);
        }

        let position = viewer.position_2d();
        for level in &mut self.levels {
            level.create(device, &mut self.geometry, &heightmap, position)?;
        }
        self.heightmap = Some(heightmap);

        let coarsest = self.levels.first().map_or(0, |l| l.footprint());
        log::info!(
            "Terrain ready: {} levels over a {}x{} heightmap, {} units across",
            self.levels.len(),
            self.elevation.width(),
            self.elevation.height(),
            coarsest
        );
        Ok(())
    }

    /// Move every active level to follow `viewer`, coarse to fine. Returns how
    /// many levels re-centered.
    pub fn update(&mut self, device: &mut D, viewer: &impl TerrainViewer, camera: &impl CameraView) -> Result<usize> {
        let heightmap = self
            .heightmap
            .as_ref()
            .ok_or_else(|| Error::Device("terrain updated before create".into()))?;

        let position = viewer.position_2d();
        let frustum = camera.frustum();
        let cell = IntVector2::floor_from(position);

        let mut recentered = 0;
        for i in 0..self.levels.len() {
            if !self.levels[i].is_active() {
                continue;
            }
            let finer_active = self.levels[i]
                .next_finer
                .and_then(|f| self.levels.get(f))
                .is_some_and(|f| f.is_active());

            let frame = LevelFrame { viewer: cell, frustum: Some(&frustum), finer_active };
            if self.levels[i].update(device, heightmap, &frame)? {
                recentered += 1;
            }
        }

        self.frame = FrameUniform {
            view_projection: camera.view_projection().to_cols_array_2d(),
            eye_position: viewer.position().to_array(),
            debug_shading: if self.config.debug_shading { 1.0 } else { 0.0 },
        };

        log::trace!("Terrain update at {}: {} levels re-centered", cell, recentered);
        Ok(recentered)
    }

    /// Record this frame's draws, coarse to fine. Inactive levels are skipped.
    pub fn draw(&self, viewer: &impl TerrainViewer) -> DrawList<'_, D> {
        let position = viewer.position_2d();
        let mut list = DrawList::new(self.frame, self.grass.as_ref());

        for level in self.levels.iter().filter(|l| l.is_active()) {
            let coarser = level
                .next_coarser
                .and_then(|c| self.levels.get(c))
                .filter(|c| c.is_active());
            level.draw(coarser, &self.geometry, position, &mut list);
        }
        list
    }

    /// Raw heightmap sample, 0 outside the map
    pub fn height(&self, x: i32, y: i32) -> u16 {
        self.elevation.get(x, y)
    }

    /// World-space surface height, bilinear between samples. Wraps like the
    /// rendered terrain does.
    pub fn height_at(&self, x: f32, y: f32) -> f32 {
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (ix, iy) = (x0 as i32, y0 as i32);
        let sample = |dx: i32, dy: i32| self.elevation.sample_wrapped(ix + dx, iy + dy) as f32;

        let bottom = sample(0, 0) * (1.0 - fx) + sample(1, 0) * fx;
        let top = sample(0, 1) * (1.0 - fx) + sample(1, 1) * fx;
        (bottom * (1.0 - fy) + top * fy) / u16::MAX as f32 * self.config.height_scale
    }

    /// Show or hide a level. Returns `false` for an unknown index.
    pub fn set_level_active(&mut self, index: usize, active: bool) -> bool {
        match self.levels.get_mut(index) {
            Some(level) => {
                level.set_active(active);
                log::info!("Level {} {}", index, if active { "enabled" } else { "disabled" });
                true
            }
            None => false,
        }
    }

    /// Toggle per-mesh debug tints from the next update on
    pub fn set_debug_shading(&mut self, enabled: bool) {
        self.config.debug_shading = enabled;
    }

    pub fn levels(&self) -> &[Level<D>] {
        &self.levels
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn elevation(&self) -> &ElevationData {
        &self.elevation
    }

    pub fn geometry(&self) -> &GeometryCache<D> {
        &self.geometry
    }
}
