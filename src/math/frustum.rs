//! View frustum for block culling

use crate::core::types::{Vec3, Vec4, Mat4};
use super::aabb::Aabb;

/// A plane defined by normal and distance from origin
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Plane from `(a, b, c, d)` coefficients, normalized
    fn from_coefficients(plane: Vec4) -> Self {
        let normal = plane.truncate();
        let len = normal.length();
        Self {
            normal: normal / len,
            distance: plane.w / len,
        }
    }

    /// Signed distance from point to plane (positive = in front)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// View frustum with 6 inward-facing planes (Near, Far, Left, Right, Top, Bottom)
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix with a 0..1
    /// clip-space depth range (wgpu / glam `*_rh` conventions)
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let [r0, r1, r2, r3] = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        Self {
            planes: [
                Plane::from_coefficients(r2),      // near: z >= 0
                Plane::from_coefficients(r3 - r2), // far: z <= w
                Plane::from_coefficients(r3 + r0), // left
                Plane::from_coefficients(r3 - r0), // right
                Plane::from_coefficients(r3 - r1), // top
                Plane::from_coefficients(r3 + r1), // bottom
            ],
        }
    }

    /// Check if point is inside frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance_to_point(point) >= 0.0)
    }

    /// False only when the box is entirely outside one plane. Conservative:
    /// boxes near frustum corners may report true while being disjoint.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            // p-vertex: the corner furthest along the plane normal
            let p = Vec3::select(plane.normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            plane.distance_to_point(p) >= 0.0
        })
    }
}
