//! Toroidal addressing of level textures.
//!
//! Texel `t` of a level texture holds grid vertex `(t - origin) mod size`.
//! When a level moves by `delta` cells the origin advances by the same
//! amount, so every vertex that stays inside the footprint keeps its texel
//! and only the newly exposed rows and columns need to be written.

use crate::math::IntVector2;

/// Axis-aligned texel rectangle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TexelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TexelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// The whole `size`×`size` texture
    pub fn full(size: u32) -> Self {
        Self::new(0, 0, size, size)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// New origin after the level moved by `delta` cells
pub fn advance_origin(origin: IntVector2, delta: IntVector2, size: i32) -> IntVector2 {
    (origin + delta).rem_euclid(size)
}

/// Texel of grid vertex `grid` under `origin`
pub fn texel_of(grid: IntVector2, origin: IntVector2, size: i32) -> IntVector2 {
    (grid + origin).rem_euclid(size)
}

/// Grid vertex stored in `texel` under `origin`
pub fn grid_of(texel: IntVector2, origin: IntVector2, size: i32) -> IntVector2 {
    (texel - origin).rem_euclid(size)
}

/// Rectangles that must be rewritten after a move of `delta` cells, given
/// the already advanced `origin`. Column and row strips may overlap at their
/// crossing; at most four rectangles are returned.
pub fn update_regions(origin: IntVector2, delta: IntVector2, size: i32) -> Vec<TexelRect> {
    let s = size as u32;
    if delta.x.abs() >= size || delta.y.abs() >= size {
        return vec![TexelRect::full(s)];
    }

    let mut regions = Vec::with_capacity(4);
    for (start, len) in exposed_span(origin.x, delta.x, size) {
        regions.push(TexelRect::new(start, 0, len, s));
    }
    for (start, len) in exposed_span(origin.y, delta.y, size) {
        regions.push(TexelRect::new(0, start, s, len));
    }
    regions
}

/// Texel spans along one axis holding newly exposed grid lines, split at the
/// wrap seam
fn exposed_span(origin: i32, delta: i32, size: i32) -> Vec<(u32, u32)> {
    if delta == 0 {
        return Vec::new();
    }

    // Grid lines that entered the footprint
    let first_grid = if delta > 0 { size - delta } else { 0 };
    let len = delta.abs();

    let start = (origin + first_grid).rem_euclid(size);
    if start + len <= size {
        vec![(start as u32, len as u32)]
    } else {
        let head = size - start;
        vec![(start as u32, head as u32), (0, (len - head) as u32)]
    }
}
