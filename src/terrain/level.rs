//! One clipmap level: an N×N vertex grid at a fixed spacing that follows the
//! viewer in steps of two cells.

use crate::core::types::{Result, Vec2, Vec3};
use crate::math::{Frustum, IntVector2};
use crate::render::device::{ElevationUpdate, NormalMapUpdate, RenderDevice, TargetFormat};

use super::block::Block;
use super::draw_list::{
    DrawList, LevelDraw, LevelUniform, MeshKind, SHADING_BLOCK, SHADING_CENTRE, SHADING_EDGE_STITCH,
    SHADING_RING_FIXUP, SHADING_TRIM,
};
use super::edge_stitches::EdgeStitches;
use super::geometry_cache::GeometryCache;
use super::interior_trim::{InteriorTrim, TrimOrientation};
use super::ring_fixups::RingFixups;
use super::settings::{
    ALPHA_OFFSET, BLOCK_SIZE_M, BLOCK_SIZE_M_MINUS_ONE, CENTRAL_SQUARE_MAX, CENTRAL_SQUARE_MIN,
    ELEVATION_TEXTURE_SIZE, GRID_SIZE_N, GRID_SIZE_N_MINUS_ONE, NORMAL_MAP_TEXTURE_SIZE, TRANSITION_WIDTH_INVERSE,
};
use super::toroidal::{self, TexelRect};

const M1: i32 = BLOCK_SIZE_M_MINUS_ONE;

/// Ring of twelve blocks around the level, skipping the 2×2 interior
const BOUNDARY_OFFSETS: [IntVector2; 12] = [
    IntVector2::new(0, 0),
    IntVector2::new(0, M1),
    IntVector2::new(0, 2 * M1 + 2),
    IntVector2::new(0, 3 * M1 + 2),
    IntVector2::new(M1, 0),
    IntVector2::new(M1, 3 * M1 + 2),
    IntVector2::new(2 * M1 + 2, 0),
    IntVector2::new(2 * M1 + 2, 3 * M1 + 2),
    IntVector2::new(3 * M1 + 2, 0),
    IntVector2::new(3 * M1 + 2, M1),
    IntVector2::new(3 * M1 + 2, 2 * M1 + 2),
    IntVector2::new(3 * M1 + 2, 3 * M1 + 2),
];

/// Fills the hole of the finest level
const CENTRE_OFFSETS: [IntVector2; 4] = [
    IntVector2::new(BLOCK_SIZE_M, BLOCK_SIZE_M),
    IntVector2::new(BLOCK_SIZE_M, 2 * BLOCK_SIZE_M - 1),
    IntVector2::new(2 * BLOCK_SIZE_M - 1, BLOCK_SIZE_M),
    IntVector2::new(2 * BLOCK_SIZE_M - 1, 2 * BLOCK_SIZE_M - 1),
];

/// Values every level takes from the terrain configuration
#[derive(Clone, Copy, Debug)]
pub struct LevelSettings {
    pub height_scale: f32,
    /// World-space z range of the heightmap, for block bounds
    pub height_bounds: (f32, f32),
    pub toroidal_updates: bool,
    pub light_direction: Vec3,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            height_scale: 600.0,
            height_bounds: (0.0, 600.0),
            toroidal_updates: false,
            light_direction: Vec3::Z,
        }
    }
}

/// Per-frame input to [`Level::update`]
#[derive(Clone, Copy, Debug)]
pub struct LevelFrame<'f> {
    /// World cell containing the viewer
    pub viewer: IntVector2,
    /// `None` leaves every block visible
    pub frustum: Option<&'f Frustum>,
    /// Whether the next finer level exists and is drawn
    pub finer_active: bool,
}

struct LevelTargets<T> {
    elevation: T,
    normal_map: T,
}

pub struct Level<D: RenderDevice> {
    index: usize,
    grid_spacing: i32,
    position_min: IntVector2,
    toroidal_origin: IntVector2,
    viewer_grid: IntVector2,
    active: bool,
    finest: bool,
    recenter_count: usize,

    blocks: [Block; 12],
    centre_blocks: [Block; 4],
    trim: InteriorTrim,
    centre_trim: InteriorTrim,
    ring_fixups: RingFixups,
    edge_stitches: EdgeStitches,
    targets: Option<LevelTargets<D::Texture>>,
    settings: LevelSettings,

    pub next_finer: Option<usize>,
    pub next_coarser: Option<usize>,
}

impl<D: RenderDevice> Level<D> {
    /// Lay out a level; nothing touches the device until [`Level::create`]
    pub fn new(index: usize, grid_spacing: i32, settings: LevelSettings) -> Self {
        let bounds = settings.height_bounds;
        Self {
            index,
            grid_spacing,
            position_min: IntVector2::ZERO,
            toroidal_origin: IntVector2::ZERO,
            viewer_grid: IntVector2::ZERO,
            active: true,
            finest: false,
            recenter_count: 0,
            blocks: std::array::from_fn(|i| Block::new(BOUNDARY_OFFSETS[i], grid_spacing, bounds)),
            centre_blocks: std::array::from_fn(|i| Block::new(CENTRE_OFFSETS[i], grid_spacing, bounds)),
            trim: InteriorTrim::new(grid_spacing, TrimOrientation::BottomLeft),
            centre_trim: InteriorTrim::new(grid_spacing, TrimOrientation::TopRight),
            ring_fixups: RingFixups::new(grid_spacing),
            edge_stitches: EdgeStitches::new(grid_spacing),
            targets: None,
            settings,
            next_finer: None,
            next_coarser: None,
        }
    }

    /// Place the level around `viewer`, allocate its textures and fill them
    pub fn create(
        &mut self,
        device: &mut D,
        cache: &mut GeometryCache<D>,
        heightmap: &D::Texture,
        viewer: Vec2,
    ) -> Result<()> {
        self.position_min = IntVector2::ZERO;
        self.toroidal_origin = IntVector2::ZERO;
        self.recenter(IntVector2::floor_from(viewer));
        self.toroidal_origin = IntVector2::ZERO;
        self.recenter_count = 0;
        self.place_geometry(true);

        self.blocks[0].create(cache, device)?;
        self.ring_fixups.create(cache, device)?;
        self.trim.create(cache, device)?;
        self.edge_stitches.create(cache, device)?;

        let size = ELEVATION_TEXTURE_SIZE as u32;
        self.targets = Some(LevelTargets {
            elevation: device.create_render_target(
                &format!("Level {} Elevation", self.index),
                size,
                TargetFormat::Elevation,
            )?,
            normal_map: device.create_render_target(
                &format!("Level {} Normal Map", self.index),
                NORMAL_MAP_TEXTURE_SIZE as u32,
                TargetFormat::NormalMap,
            )?,
        });
        self.regenerate(device, heightmap, None)?;

        log::info!(
            "Created level {} (spacing {}, min {}, footprint {} units)",
            self.index,
            self.grid_spacing,
            self.position_min,
            self.footprint()
        );
        Ok(())
    }

    /// Follow the viewer. Returns `true` when the level re-centered and its
    /// textures were regenerated.
    pub fn update(&mut self, device: &mut D, heightmap: &D::Texture, frame: &LevelFrame) -> Result<bool> {
        let delta = self.recenter(frame.viewer);

        self.finest = !frame.finer_active;
        self.place_geometry(self.finest);

        let finest = self.finest;
        let centre = self.centre_blocks.iter_mut().filter(|_| finest);
        for block in self.blocks.iter_mut().chain(centre) {
            match frame.frustum {
                Some(frustum) => block.cull(frustum),
                None => block.set_visible(true),
            }
        }

        match delta {
            Some(delta) => {
                log::debug!(
                    "Level {} re-centered by {} to min {} (viewer grid {})",
                    self.index,
                    delta,
                    self.position_min,
                    self.viewer_grid
                );
                self.regenerate(device, heightmap, Some(delta))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Move `position_min` in even steps until the viewer's cell lies in the
    /// central square. Returns the shift in grid cells, if any.
    pub fn recenter(&mut self, viewer: IntVector2) -> Option<IntVector2> {
        let s = self.grid_spacing;
        self.viewer_grid = (viewer - self.position_min).div_floor(s);

        let v = self.viewer_grid;
        if v >= CENTRAL_SQUARE_MIN && v <= CENTRAL_SQUARE_MAX {
            return None;
        }

        let d = v - CENTRAL_SQUARE_MIN;
        let adjustment = d - d.abs() % 2;
        self.position_min += adjustment * s;
        self.viewer_grid = (viewer - self.position_min).div_floor(s);
        self.toroidal_origin = toroidal::advance_origin(self.toroidal_origin, adjustment, ELEVATION_TEXTURE_SIZE);
        self.recenter_count += 1;
        Some(adjustment)
    }

    fn place_geometry(&mut self, finest: bool) {
        let min = self.position_min;
        for block in &mut self.blocks {
            block.update(min);
        }
        self.ring_fixups.update(min);
        self.edge_stitches.update(min);

        self.trim.update(min, self.viewer_grid);

        if finest {
            self.trim.set_orientation(TrimOrientation::BottomLeft);
            for block in &mut self.centre_blocks {
                block.update(min);
            }
            self.centre_trim.update(min, self.viewer_grid);
            self.centre_trim.set_orientation(TrimOrientation::TopRight);
        }
    }

    /// Rewrite the elevation texture (whole, or only what `delta` exposed)
    /// and then the whole normal map
    fn regenerate(&self, device: &mut D, heightmap: &D::Texture, delta: Option<IntVector2>) -> Result<()> {
        let Some(targets) = &self.targets else {
            return Ok(());
        };

        let size = ELEVATION_TEXTURE_SIZE;
        let regions = match delta {
            Some(delta) if self.settings.toroidal_updates => {
                toroidal::update_regions(self.toroidal_origin, delta, size)
            }
            _ => vec![TexelRect::full(size as u32)],
        };

        device.render_elevation(
            &targets.elevation,
            heightmap,
            &ElevationUpdate {
                position_min: self.position_min,
                grid_spacing: self.grid_spacing,
                toroidal_origin: self.toroidal_origin,
                texture_size: size as u32,
                height_scale: self.settings.height_scale,
                regions,
            },
        )?;
        device.render_normal_map(
            &targets.normal_map,
            &targets.elevation,
            &NormalMapUpdate {
                toroidal_origin: self.toroidal_origin,
                texture_size: NORMAL_MAP_TEXTURE_SIZE as u32,
                normal_scale: 0.5 / self.grid_spacing as f32,
            },
        )
    }

    /// Append this level's resources and draws. `coarser` is the next
    /// coarser level when it is drawn too.
    pub fn draw<'a>(
        &'a self,
        coarser: Option<&'a Level<D>>,
        cache: &'a GeometryCache<D>,
        viewer: Vec2,
        list: &mut DrawList<'a, D>,
    ) {
        let Some(targets) = &self.targets else {
            return;
        };
        let coarser_normal_map = coarser.and_then(|c| c.targets.as_ref()).map(|t| &t.normal_map);

        list.begin_level(LevelDraw {
            level_index: self.index,
            grid_spacing: self.grid_spacing,
            uniform: self.uniform(coarser, viewer),
            elevation: &targets.elevation,
            normal_map: &targets.normal_map,
            coarser_normal_map,
        });

        for block in &self.blocks {
            block.draw(cache, MeshKind::Block, SHADING_BLOCK, list);
        }
        self.ring_fixups.draw(cache, SHADING_RING_FIXUP, list);
        self.trim.draw(cache, false, SHADING_TRIM, list);

        if self.finest {
            for block in &self.centre_blocks {
                block.draw(cache, MeshKind::CentreBlock, SHADING_CENTRE, list);
            }
            self.centre_trim.draw(cache, true, SHADING_TRIM, list);
        }

        self.edge_stitches.draw(cache, SHADING_EDGE_STITCH, list);
    }

    pub fn uniform(&self, coarser: Option<&Level<D>>, viewer: Vec2) -> LevelUniform {
        let s = self.grid_spacing as f32;
        let min = Vec2::from(self.position_min);
        let viewer_grid = (viewer - min) / s;

        let (coarser_toroidal_origin, coarser_grid_pos_min, has_coarser) = match coarser {
            Some(c) => (
                Vec2::from(c.toroidal_origin),
                Vec2::from(c.trim.orientation().coarser_grid_pos_min()),
                1.0,
            ),
            None => (Vec2::ZERO, Vec2::ZERO, 0.0),
        };

        LevelUniform {
            position_min: min.to_array(),
            viewer_grid: viewer_grid.to_array(),
            toroidal_origin: Vec2::from(self.toroidal_origin).to_array(),
            coarser_toroidal_origin: coarser_toroidal_origin.to_array(),
            coarser_grid_pos_min: coarser_grid_pos_min.to_array(),
            grid_spacing: s,
            alpha_offset: ALPHA_OFFSET as f32,
            one_over_width: TRANSITION_WIDTH_INVERSE,
            grid_size: GRID_SIZE_N as f32,
            texture_size: ELEVATION_TEXTURE_SIZE as f32,
            has_coarser,
            light_direction: self.settings.light_direction.to_array(),
            _padding: 0.0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn grid_spacing(&self) -> i32 {
        self.grid_spacing
    }

    /// World position of grid vertex (0, 0)
    pub fn position_min(&self) -> IntVector2 {
        self.position_min
    }

    pub fn toroidal_origin(&self) -> IntVector2 {
        self.toroidal_origin
    }

    /// Viewer cell in this level's grid as of the last update
    pub fn viewer_grid(&self) -> IntVector2 {
        self.viewer_grid
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_finest(&self) -> bool {
        self.finest
    }

    pub fn trim_orientation(&self) -> TrimOrientation {
        self.trim.orientation()
    }

    pub fn centre_trim_orientation(&self) -> TrimOrientation {
        self.centre_trim.orientation()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn centre_blocks(&self) -> &[Block] {
        &self.centre_blocks
    }

    pub fn recenter_count(&self) -> usize {
        self.recenter_count
    }

    /// Side length of the level in world units
    pub fn footprint(&self) -> i32 {
        GRID_SIZE_N_MINUS_ONE * self.grid_spacing
    }

    pub fn elevation_texture(&self) -> Option<&D::Texture> {
        self.targets.as_ref().map(|t| &t.elevation)
    }

    pub fn normal_map_texture(&self) -> Option<&D::Texture> {
        self.targets.as_ref().map(|t| &t.normal_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::{HeadlessDevice, HeadlessTexture};
    use crate::terrain::draw_list::FrameUniform;
    use crate::terrain::elevation::ElevationData;

    fn heightmap(device: &mut HeadlessDevice) -> HeadlessTexture {
        let data = ElevationData::procedural(128, 11, 4, 1.0 / 32.0).unwrap();
        device.create_heightmap(&data).unwrap()
    }

    fn frame(viewer: IntVector2, finer_active: bool) -> LevelFrame<'static> {
        LevelFrame { viewer, frustum: None, finer_active }
    }

    #[test]
    fn test_initial_placement() {
        let mut level = Level::<HeadlessDevice>::new(0, 1, LevelSettings::default());
        level.recenter(IntVector2::ZERO);
        assert_eq!(level.position_min(), IntVector2::splat(-(2 * BLOCK_SIZE_M - 2)));
        assert_eq!(level.viewer_grid(), CENTRAL_SQUARE_MIN);
    }

    #[test]
    fn test_recenter_invariant_and_containment() {
        for spacing in [1, 2, 8] {
            let mut level = Level::<HeadlessDevice>::new(0, spacing, LevelSettings::default());
            let mut viewer = IntVector2::new(-37, 91);
            let steps = [(3, 0), (0, -5), (17, 17), (-1, 2), (-400, 0), (1, 1), (0, 0), (2048, -999)];
            for step in steps.iter().cycle().take(64) {
                viewer += IntVector2::from(*step);
                level.recenter(viewer);

                let min = level.position_min();
                assert_eq!(min.rem_euclid(2 * spacing), IntVector2::ZERO, "min {min} spacing {spacing}");
                let v = level.viewer_grid();
                assert!(v >= CENTRAL_SQUARE_MIN && v <= CENTRAL_SQUARE_MAX, "viewer grid {v}");
            }
        }
    }

    #[test]
    fn test_viewer_moving_along_x() {
        let mut level = Level::<HeadlessDevice>::new(0, 1, LevelSettings::default());
        level.recenter(IntVector2::ZERO);
        let start = level.recenter_count();

        let mut previous = level.position_min();
        let mut events = 0;
        for x in 0..=1000 {
            if let Some(delta) = level.recenter(IntVector2::new(x, 0)) {
                events += 1;
                assert_eq!(delta, IntVector2::new(2, 0));
                assert_eq!(level.position_min().x - previous.x, 2);
                previous = level.position_min();
            }
        }
        assert_eq!(events, 1000 / 2);
        assert_eq!(level.recenter_count() - start, 500);
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut device = HeadlessDevice::new();
        let mut cache = GeometryCache::new();
        let map = heightmap(&mut device);
        let mut level = Level::new(1, 2, LevelSettings::default());
        level.create(&mut device, &mut cache, &map, Vec2::ZERO).unwrap();

        let viewer = IntVector2::new(301, -77);
        assert!(level.update(&mut device, &map, &frame(viewer, true)).unwrap());
        let (min, orientation) = (level.position_min(), level.trim_orientation());
        let updates = device.stats().elevation_updates;

        assert!(!level.update(&mut device, &map, &frame(viewer, true)).unwrap());
        assert_eq!(level.position_min(), min);
        assert_eq!(level.trim_orientation(), orientation);
        assert_eq!(device.stats().elevation_updates, updates);
    }

    #[test]
    fn test_trim_matches_finer_level_position() {
        let settings = LevelSettings::default();
        let mut coarse = Level::<HeadlessDevice>::new(0, 2, settings);
        let mut fine = Level::<HeadlessDevice>::new(1, 1, settings);

        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1), (7, -3), (-12, 5), (250, 251), (-1, -1)] {
            let viewer = IntVector2::new(x, y);
            coarse.recenter(viewer);
            coarse.place_geometry(false);
            fine.recenter(viewer);

            let finer_origin = (fine.position_min() - coarse.position_min()) / coarse.grid_spacing();
            assert_eq!(coarse.trim_orientation().coarser_grid_pos_min(), finer_origin, "viewer ({x}, {y})");
        }
    }

    #[test]
    fn test_finest_level_forces_trims() {
        let mut device = HeadlessDevice::new();
        let mut cache = GeometryCache::new();
        let map = heightmap(&mut device);
        let mut level = Level::new(0, 1, LevelSettings::default());
        level.create(&mut device, &mut cache, &map, Vec2::ZERO).unwrap();

        // Viewer at the central square max would select BottomLeft; min selects TopRight
        level.update(&mut device, &map, &frame(IntVector2::ZERO, true)).unwrap();
        assert_eq!(level.trim_orientation(), TrimOrientation::TopRight);
        assert!(!level.is_finest());

        level.update(&mut device, &map, &frame(IntVector2::ZERO, false)).unwrap();
        assert!(level.is_finest());
        assert_eq!(level.trim_orientation(), TrimOrientation::BottomLeft);
        assert_eq!(level.centre_trim_orientation(), TrimOrientation::TopRight);
    }

    #[test]
    fn test_draw_order_for_finest_level() {
        let mut device = HeadlessDevice::new();
        let mut cache = GeometryCache::new();
        let map = heightmap(&mut device);
        let mut level = Level::new(4, 1, LevelSettings::default());
        level.create(&mut device, &mut cache, &map, Vec2::ZERO).unwrap();
        level.update(&mut device, &map, &frame(IntVector2::ZERO, false)).unwrap();

        let mut list = DrawList::new(FrameUniform::default(), None);
        level.draw(None, &cache, Vec2::ZERO, &mut list);

        let kinds: Vec<MeshKind> = list.sequence().into_iter().map(|(_, kind)| kind).collect();
        let mut expected = vec![MeshKind::Block; 12];
        expected.push(MeshKind::RingFixups);
        expected.push(MeshKind::InteriorTrim(TrimOrientation::BottomLeft));
        expected.extend([MeshKind::CentreBlock; 4]);
        expected.push(MeshKind::CentreTrim(TrimOrientation::TopRight));
        expected.push(MeshKind::EdgeStitches);
        assert_eq!(kinds, expected);

        assert_eq!(list.levels.len(), 1);
        assert_eq!(list.levels[0].uniform.has_coarser, 0.0);
        let stitches = list.commands.last().unwrap();
        assert_eq!(stitches.uniform.shading, SHADING_EDGE_STITCH);
        assert_eq!(stitches.uniform.fine_block_orig[0], 1.0 / ELEVATION_TEXTURE_SIZE as f32);
        assert_eq!(list.commands[0].uniform.fine_block_orig, [0.0; 4]);
    }

    #[test]
    fn test_culled_blocks_are_skipped() {
        let mut device = HeadlessDevice::new();
        let mut cache = GeometryCache::new();
        let map = heightmap(&mut device);
        let mut level = Level::new(0, 1, LevelSettings::default());
        level.create(&mut device, &mut cache, &map, Vec2::ZERO).unwrap();

        // Looking along +Y from the level's centre: blocks entirely south of the viewer are culled
        let view = glam::Mat4::look_at_rh(Vec3::new(0.0, 0.0, 300.0), Vec3::new(0.0, 100.0, 300.0), Vec3::Z);
        let projection = glam::Mat4::perspective_rh(1.0, 1.0, 1.0, 5000.0);
        let frustum = Frustum::from_view_projection(&(projection * view));
        let frame = LevelFrame { viewer: IntVector2::ZERO, frustum: Some(&frustum), finer_active: true };
        level.update(&mut device, &map, &frame).unwrap();

        let visible = level.blocks().iter().filter(|b| b.visible()).count();
        assert!(visible > 0 && visible < 12, "{visible} visible");

        let mut list = DrawList::new(FrameUniform::default(), None);
        level.draw(None, &cache, Vec2::ZERO, &mut list);
        let drawn = list.commands.iter().filter(|c| c.kind == MeshKind::Block).count();
        assert_eq!(drawn, visible);
    }

    #[test]
    fn test_toroidal_updates_match_full_regeneration() {
        let mut device = HeadlessDevice::new();
        let mut cache = GeometryCache::new();
        let map = heightmap(&mut device);

        let partial_settings = LevelSettings { toroidal_updates: true, ..LevelSettings::default() };
        let mut full = Level::new(0, 2, LevelSettings::default());
        let mut partial = Level::new(1, 2, partial_settings);
        full.create(&mut device, &mut cache, &map, Vec2::ZERO).unwrap();
        partial.create(&mut device, &mut cache, &map, Vec2::ZERO).unwrap();

        for (x, y) in [(5, 0), (5, 9), (-30, 9), (-30, -60), (2000, 40), (1990, 47)] {
            let viewer = IntVector2::new(x, y);
            let moved = full.update(&mut device, &map, &frame(viewer, true)).unwrap();
            assert_eq!(partial.update(&mut device, &map, &frame(viewer, true)).unwrap(), moved);
            assert_eq!(full.toroidal_origin(), partial.toroidal_origin());

            for texture in [
                (full.elevation_texture().unwrap(), partial.elevation_texture().unwrap()),
                (full.normal_map_texture().unwrap(), partial.normal_map_texture().unwrap()),
            ] {
                let a = device.target_texels(texture.0).unwrap();
                let b = device.target_texels(texture.1).unwrap();
                assert!(a == b, "textures differ after moving to ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_update_order_does_not_change_draws() {
        let mut device = HeadlessDevice::new();
        let mut cache = GeometryCache::new();
        let map = heightmap(&mut device);
        let settings = LevelSettings::default();

        let mut pairs: Vec<(Level<HeadlessDevice>, Level<HeadlessDevice>)> = Vec::new();
        for _ in 0..2 {
            let mut coarse = Level::new(0, 2, settings);
            let mut fine = Level::new(1, 1, settings);
            coarse.create(&mut device, &mut cache, &map, Vec2::ZERO).unwrap();
            fine.create(&mut device, &mut cache, &map, Vec2::ZERO).unwrap();
            pairs.push((coarse, fine));
        }

        let viewer = IntVector2::new(13, 6);
        {
            let (coarse, fine) = &mut pairs[0];
            coarse.update(&mut device, &map, &frame(viewer, true)).unwrap();
            fine.update(&mut device, &map, &frame(viewer, false)).unwrap();
        }
        {
            let (coarse, fine) = &mut pairs[1];
            fine.update(&mut device, &map, &frame(viewer, false)).unwrap();
            coarse.update(&mut device, &map, &frame(viewer, true)).unwrap();
        }

        let position = Vec2::new(13.5, 6.5);
        let uniforms: Vec<_> = pairs
            .iter()
            .map(|(coarse, fine)| (coarse.uniform(None, position), fine.uniform(Some(coarse), position)))
            .collect();
        assert_eq!(uniforms[0], uniforms[1]);
        assert_eq!(uniforms[0].1.has_coarser, 1.0);
    }
}
