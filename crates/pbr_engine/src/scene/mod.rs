//! Scene graph: cameras, shapes, and lights
//!
//! A [`Scene`] is a flat container — the renderer walks its shape list in
//! insertion order, so there is no hierarchy to traverse. The aggregate
//! bounding box grows as shapes are added and never shrinks; removal is
//! unsupported.

pub mod camera;
pub mod light;
pub mod shape;

pub use camera::Camera;
pub use light::{Light, LightType};
pub use shape::Shape;

use crate::foundation::math::Aabb;

/// Container for everything the renderer draws in one pass
#[derive(Default)]
pub struct Scene {
    bbox: Aabb,
    cameras: Vec<Camera>,
    shapes: Vec<Shape>,
    lights: Vec<Light>,
}

impl Scene {
    /// Create an empty scene
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a camera
    pub fn add_camera(&mut self, camera: Camera) {
        self.cameras.push(camera);
    }

    /// Add a shape, expanding the scene bounds by its world-space box
    pub fn add_shape(&mut self, shape: Shape) {
        self.bbox.union(&shape.bbox());
        self.shapes.push(shape);
    }

    /// Add a light
    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Cameras, in insertion order
    #[must_use]
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    /// Shapes, in insertion order (the renderer draws them in this order)
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Mutable shape access for per-frame animation
    pub fn shapes_mut(&mut self) -> &mut [Shape] {
        &mut self.shapes
    }

    /// Lights, in insertion order
    #[must_use]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Aggregate bounds of every shape ever added
    #[must_use]
    pub fn bbox(&self) -> &Aabb {
        &self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::geometry::Geometry;
    use crate::material::Material;
    use crate::rhi::{ProgramHandle, RenderInterface};

    struct NullMaterial;

    impl Material for NullMaterial {
        fn program(&self) -> ProgramHandle {
            ProgramHandle::default()
        }

        fn upload_data(&self, _rhi: &mut RenderInterface) {}
    }

    fn sphere_at(position: Vec3, radius: f32) -> Shape {
        let mut shape = Shape::new(
            Geometry::uv_sphere(radius, 8, 6),
            Box::new(NullMaterial),
        );
        shape.set_position(position);
        shape.update_matrix();
        shape
    }

    #[test]
    fn test_scene_bbox_expands_monotonically() {
        let mut scene = Scene::new();
        assert!(scene.bbox().is_empty());

        scene.add_shape(sphere_at(Vec3::zeros(), 1.0));
        let first = *scene.bbox();
        assert!((first.min.x - -1.0).abs() < 1e-4);

        scene.add_shape(sphere_at(Vec3::new(10.0, 0.0, 0.0), 1.0));
        let second = *scene.bbox();
        assert!(second.max.x > first.max.x);
        // The old extent is still covered
        assert!(second.min.x <= first.min.x);
    }

    #[test]
    fn test_shapes_keep_insertion_order() {
        let mut scene = Scene::new();
        scene.add_shape(sphere_at(Vec3::new(1.0, 0.0, 0.0), 1.0));
        scene.add_shape(sphere_at(Vec3::new(2.0, 0.0, 0.0), 1.0));
        scene.add_shape(sphere_at(Vec3::new(3.0, 0.0, 0.0), 1.0));

        let xs: Vec<f32> = scene
            .shapes()
            .iter()
            .map(|s| s.transform().position.x)
            .collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    }
}
