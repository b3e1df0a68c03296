//! Perspective camera over z-up terrain

use crate::core::types::{Vec3, Mat4, Quat};
use crate::math::Frustum;
use crate::terrain::viewer::{CameraView, TerrainViewer};

/// Camera with position, rotation, and projection parameters.
///
/// The world is z-up; the camera looks down its local -Z axis with local +Y
/// as screen up, so the identity rotation would look straight down.
pub struct Camera {
    /// World position
    pub position: Vec3,
    /// Rotation as quaternion
    pub rotation: Quat,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Camera {
    /// Create a new camera looking horizontally along +Y
    pub fn new(position: Vec3, fov_y_degrees: f32, aspect: f32) -> Self {
        let mut camera = Self {
            position,
            rotation: Quat::IDENTITY,
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near: 1.0,
            far: 30000.0,
        };
        camera.set_rotation_euler(0.0, 0.0);
        camera
    }

    /// Create camera looking at a target
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        let forward = (target - position).normalize();
        let right = forward.cross(up).normalize();
        let up = right.cross(forward);

        let rotation = Quat::from_mat3(&glam::Mat3::from_cols(right, up, -forward));

        Self {
            position,
            rotation,
            fov_y: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 1.0,
            far: 30000.0,
        }
    }

    /// Get view matrix (world to camera space)
    pub fn view_matrix(&self) -> Mat4 {
        let rotation_matrix = Mat4::from_quat(self.rotation.conjugate());
        let translation_matrix = Mat4::from_translation(-self.position);
        rotation_matrix * translation_matrix
    }

    /// Get projection matrix (camera to clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Get combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Get forward direction (negative Z in camera space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Get right direction (positive X in camera space)
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get up direction (positive Y in camera space)
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Set rotation from yaw about world Z and pitch above the horizon (radians).
    /// Yaw 0 looks along +Y.
    pub fn set_rotation_euler(&mut self, yaw: f32, pitch: f32) {
        self.rotation = Quat::from_rotation_z(yaw)
            * Quat::from_rotation_x(std::f32::consts::FRAC_PI_2 + pitch);
    }

    /// Get rotation as euler angles (yaw, pitch in radians)
    pub fn euler_angles(&self) -> (f32, f32) {
        let f = self.forward();
        let yaw = (-f.x).atan2(f.y);
        let pitch = f.z.clamp(-1.0, 1.0).asin();
        (yaw, pitch)
    }

    /// Update aspect ratio (call on window resize)
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.aspect = width / height;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(10.0, 10.0, 140.0), 60.0, 16.0 / 9.0)
    }
}

impl TerrainViewer for Camera {
    fn position(&self) -> Vec3 {
        self.position
    }
}

impl CameraView for Camera {
    fn view(&self) -> Mat4 {
        self.view_matrix()
    }

    fn projection(&self) -> Mat4 {
        self.projection_matrix()
    }

    fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }
}
