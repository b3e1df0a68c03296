//! What the terrain needs to know about the camera

use crate::core::types::{Mat4, Vec2, Vec3};
use crate::math::Frustum;

/// Anything with a world position the clipmap follows
pub trait TerrainViewer {
    fn position(&self) -> Vec3;

    /// Ground-plane position; levels centre on this
    fn position_2d(&self) -> Vec2 {
        self.position().truncate()
    }
}

impl TerrainViewer for Vec3 {
    fn position(&self) -> Vec3 {
        *self
    }
}

/// Camera matrices for culling and the frame uniform
pub trait CameraView {
    fn view(&self) -> Mat4;

    fn projection(&self) -> Mat4;

    fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    fn frustum(&self) -> Frustum;
}
