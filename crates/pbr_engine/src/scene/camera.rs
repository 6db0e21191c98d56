//! Perspective camera

use crate::foundation::math::{utils, Mat4, Point3, Vec3};

/// Perspective camera with cached view and projection matrices
///
/// The matrices are recomputed eagerly whenever position, target, or lens
/// parameters change, so the renderer reads them without any per-frame work.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    /// Vertical field of view in degrees
    fov: f32,
    aspect_ratio: f32,
    near_plane: f32,
    far_plane: f32,
    view_matrix: Mat4,
    projection_matrix: Mat4,
}

impl Camera {
    /// Create a camera looking from `position` towards `target`
    #[must_use]
    pub fn new(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        fov: f32,
        aspect_ratio: f32,
        near_plane: f32,
        far_plane: f32,
    ) -> Self {
        let mut camera = Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near_plane,
            far_plane,
            view_matrix: Mat4::identity(),
            projection_matrix: Mat4::identity(),
        };
        camera.update_view_matrix();
        camera.update_projection_matrix();
        camera
    }

    /// Camera looking at the origin with Y up
    #[must_use]
    pub fn perspective(position: Vec3, fov: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self::new(
            position,
            Vec3::zeros(),
            Vec3::new(0.0, 1.0, 0.0),
            fov,
            aspect_ratio,
            near,
            far,
        )
    }

    /// Camera position
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Move the camera, keeping its target
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_view_matrix();
    }

    /// Aim the camera at a point
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
        self.update_view_matrix();
    }

    /// Update the aspect ratio (e.g. after a window resize)
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.update_projection_matrix();
    }

    /// Unit vector from the camera towards its target
    #[must_use]
    pub fn front(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Unit vector to the camera's right
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.front().cross(&self.up).normalize()
    }

    /// Rotate the view direction by pitch/yaw deltas in radians
    ///
    /// Pitch is clamped short of the poles so the view never flips over.
    /// The target keeps its distance from the camera.
    pub fn update_orientation(&mut self, d_pitch: f32, d_yaw: f32) {
        let front = self.front();
        let distance = (self.target - self.position).norm();

        let limit = utils::deg_to_rad(89.0);
        let pitch = (front.y.asin() + d_pitch).clamp(-limit, limit);
        let yaw = front.z.atan2(front.x) + d_yaw;

        let new_front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        self.target = self.position + new_front * distance;
        self.update_view_matrix();
    }

    /// View matrix (world to camera)
    #[must_use]
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix (camera to clip)
    #[must_use]
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    fn update_view_matrix(&mut self) {
        self.view_matrix = Mat4::look_at_rh(
            &Point3::from(self.position),
            &Point3::from(self.target),
            &self.up,
        );
    }

    fn update_projection_matrix(&mut self) {
        self.projection_matrix = Mat4::new_perspective(
            self.aspect_ratio,
            utils::deg_to_rad(self.fov),
            self.near_plane,
            self.far_plane,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_camera() -> Camera {
        Camera::perspective(Vec3::new(0.0, 0.0, 5.0), 60.0, 16.0 / 9.0, 0.1, 100.0)
    }

    #[test]
    fn test_view_matrix_moves_target_onto_view_axis() {
        let camera = test_camera();
        let p = camera
            .view_matrix()
            .transform_point(&Point3::new(0.0, 0.0, 0.0));
        // The target sits straight ahead, 5 units down -Z in view space
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, -5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_front_and_right_are_orthonormal() {
        let camera = test_camera();
        let front = camera.front();
        let right = camera.right();
        assert_relative_eq!(front.norm(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(front.dot(&right), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_update_orientation_keeps_target_distance() {
        let mut camera = test_camera();
        camera.update_orientation(0.2, -0.4);
        let distance = (camera.position() - Vec3::zeros()).norm();
        // Position did not move; the target rotated around it at distance 5
        assert_relative_eq!(distance, 5.0, epsilon = 1e-5);
        assert!(camera.front().y > 0.0);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = test_camera();
        camera.update_orientation(10.0, 0.0);
        let limit = utils::deg_to_rad(89.0);
        assert!(camera.front().y.asin() <= limit + 1e-5);
    }
}
