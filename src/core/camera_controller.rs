//! Fly camera controller for the terrain demo

use crate::core::camera::Camera;
use crate::core::input::InputState;
use winit::keyboard::KeyCode;

/// Free-flying z-up camera: mouse look, WASD to move, Space/Shift for height
pub struct FlyCameraController {
    /// Movement speed in world units per second
    pub speed: f32,
    /// Mouse sensitivity
    pub sensitivity: f32,
    /// Speed multiplier while Ctrl is held
    pub boost: f32,
    /// Minimum height above the terrain surface
    pub ground_clearance: f32,
    yaw: f32,
    pitch: f32,
}

const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.1;

impl FlyCameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            speed,
            sensitivity,
            boost: 8.0,
            ground_clearance: 2.0,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Update camera from input. `ground` returns the terrain height under a
    /// world xy position.
    pub fn update(
        &mut self,
        camera: &mut Camera,
        input: &InputState,
        dt: f32,
        ground: impl Fn(f32, f32) -> f32,
    ) {
        if input.is_mouse_captured() {
            let (dx, dy) = input.mouse_delta();
            self.yaw -= dx * self.sensitivity * 0.001;
            self.pitch = (self.pitch - dy * self.sensitivity * 0.001).clamp(-PITCH_LIMIT, PITCH_LIMIT);
            camera.set_rotation_euler(self.yaw, self.pitch);
        }

        let mut velocity = glam::Vec3::ZERO;
        let forward = camera.forward();
        let right = camera.right();

        if input.is_key_pressed(KeyCode::KeyW) {
            velocity += forward;
        }
        if input.is_key_pressed(KeyCode::KeyS) {
            velocity -= forward;
        }
        if input.is_key_pressed(KeyCode::KeyA) {
            velocity -= right;
        }
        if input.is_key_pressed(KeyCode::KeyD) {
            velocity += right;
        }
        if input.is_key_pressed(KeyCode::Space) {
            velocity.z += 1.0;
        }
        if input.is_key_pressed(KeyCode::ShiftLeft) {
            velocity.z -= 1.0;
        }

        if let Some(direction) = velocity.try_normalize() {
            let mut speed = self.speed;
            if input.is_key_pressed(KeyCode::ControlLeft) {
                speed *= self.boost;
            }
            camera.position += direction * speed * dt;
        }

        let floor = ground(camera.position.x, camera.position.y) + self.ground_clearance;
        camera.position.z = camera.position.z.max(floor);
    }

    /// Set orientation (radians)
    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }
}

impl Default for FlyCameraController {
    fn default() -> Self {
        Self::new(40.0, 1.0)
    }
}
