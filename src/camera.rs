//! Orbit camera looking at the world origin.
//!
//! Position is derived from two rotation angles and pushed back from the
//! origin by `speed`, which doubles as the zoom distance.

use crate::color::Color;
use crate::config::CameraSettings;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

/// A world-space half line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

/// Vertex-stage constant block.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub origin: Vec3,
    forward: Vec3,
    pub sensitivity: f32,
    /// Distance from the world origin.
    pub speed: f32,
    pub background: Color,
    pub aspect_ratio: f32,
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    pub near_plane: f32,
    pub far_plane: f32,
}

impl Camera {
    pub fn new(settings: &CameraSettings) -> Self {
        let mut camera = Self {
            origin: Vec3::Z,
            forward: Vec3::NEG_Z,
            sensitivity: settings.sensitivity,
            speed: settings.speed,
            background: settings.background,
            aspect_ratio: 16.0 / 9.0,
            field_of_view: settings.field_of_view,
            near_plane: settings.near_plane,
            far_plane: settings.far_plane,
        };
        camera.orbit(Vec2::ZERO);
        camera
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Points the camera along `direction`; a zero vector is ignored.
    pub fn set_forward(&mut self, direction: Vec3) {
        self.forward = direction.try_normalize().unwrap_or(self.forward);
    }

    /// Places the camera from `rotation` (yaw, pitch) in radians.
    pub fn orbit(&mut self, rotation: Vec2) {
        self.origin = Vec3::new(rotation.x.sin(), rotation.y.tan(), rotation.x.cos());
        self.reload();
    }

    /// Faces the world origin and backs off to `speed`.
    pub fn reload(&mut self) {
        self.set_forward(-self.origin);
        self.origin = self.forward * -self.speed;
    }

    /// Ignores zero-sized windows.
    pub fn update_aspect_ratio(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.origin, self.forward, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.field_of_view.to_radians(),
            self.aspect_ratio,
            self.near_plane,
            self.far_plane,
        )
    }

    pub fn matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn uniforms(&self) -> CameraUniforms {
        CameraUniforms {
            view_proj: self.matrix().to_cols_array_2d(),
        }
    }

    /// Ray from the camera through a point in normalized device coordinates.
    pub fn ray(&self, ndc: Vec2) -> Ray {
        let inv_view_proj = self.matrix().inverse();
        let unproject = |depth: f32| {
            let clip = inv_view_proj * Vec4::new(ndc.x, ndc.y, depth, 1.0);
            clip.truncate() / clip.w
        };
        let direction = (unproject(1.0) - unproject(0.0))
            .try_normalize()
            .unwrap_or(self.forward);
        Ray {
            origin: self.origin,
            direction,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = Camera::default();
        camera.speed = 4.0;
        camera.orbit(Vec2::new(0.7, -0.4));
        assert!((camera.origin.length() - 4.0).abs() < 1e-4);
        assert!((camera.forward() + camera.origin.normalize()).length() < 1e-5);
    }

    #[test]
    fn test_rest_pose_looks_down_negative_z() {
        let camera = Camera::default();
        assert!((camera.origin - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_center_ray_points_at_origin() {
        let mut camera = Camera::default();
        camera.orbit(Vec2::new(1.2, 0.5));
        let ray = camera.ray(Vec2::ZERO);
        assert_eq!(ray.origin, camera.origin);
        assert!((ray.direction - camera.forward()).length() < 1e-3);
    }

    #[test]
    fn test_offset_ray_leans_toward_pointer() {
        let camera = Camera::default();
        let ray = camera.ray(Vec2::new(0.5, 0.0));
        assert!(ray.direction.x > 0.0);
        assert!((ray.direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_aspect_ignored() {
        let mut camera = Camera::default();
        camera.update_aspect_ratio(800, 400);
        camera.update_aspect_ratio(0, 400);
        assert_eq!(camera.aspect_ratio, 2.0);
    }
}
