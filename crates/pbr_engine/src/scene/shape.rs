//! Drawable scene objects

use crate::foundation::math::{normal_matrix, Aabb, Mat3, Mat4, Quat, Transform, Vec3};
use crate::geometry::Geometry;
use crate::material::Material;

/// A geometry placed in the world with a material
///
/// The object-to-world and normal matrices are cached; after mutating the
/// transform, call [`update_matrix`](Self::update_matrix) before the next
/// frame reads them.
pub struct Shape {
    transform: Transform,
    object_to_world: Mat4,
    normal_matrix: Mat3,
    geometry: Geometry,
    material: Box<dyn Material>,
}

impl Shape {
    /// Place a geometry at the origin with the given material
    #[must_use]
    pub fn new(geometry: Geometry, material: Box<dyn Material>) -> Self {
        let transform = Transform::identity();
        let object_to_world = transform.to_matrix();
        Self {
            normal_matrix: normal_matrix(&object_to_world),
            transform,
            object_to_world,
            geometry,
            material,
        }
    }

    /// Current transform
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Set the position component of the transform
    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    /// Set the scale component of the transform
    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) {
        self.transform.scale = Vec3::new(x, y, z);
    }

    /// Set the rotation component of the transform
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
    }

    /// Recompute the cached object-to-world and normal matrices
    pub fn update_matrix(&mut self) {
        self.object_to_world = self.transform.to_matrix();
        self.normal_matrix = normal_matrix(&self.object_to_world);
    }

    /// Cached object-to-world matrix
    #[must_use]
    pub fn object_to_world(&self) -> &Mat4 {
        &self.object_to_world
    }

    /// Cached normal matrix (inverse-transpose of the upper 3x3)
    #[must_use]
    pub fn normal_matrix(&self) -> &Mat3 {
        &self.normal_matrix
    }

    /// World-space bounding box of the geometry under the cached transform
    #[must_use]
    pub fn bbox(&self) -> Aabb {
        self.geometry.bbox().transform(&self.object_to_world)
    }

    /// The shape's geometry
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Mutable geometry access (needed for the GPU upload)
    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.geometry
    }

    /// The shape's material
    #[must_use]
    pub fn material(&self) -> &dyn Material {
        self.material.as_ref()
    }

    /// Mutable material access
    pub fn material_mut(&mut self) -> &mut dyn Material {
        self.material.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhi::{ProgramHandle, RenderInterface};
    use approx::assert_relative_eq;

    struct NullMaterial;

    impl Material for NullMaterial {
        fn program(&self) -> ProgramHandle {
            ProgramHandle::default()
        }

        fn upload_data(&self, _rhi: &mut RenderInterface) {}
    }

    #[test]
    fn test_matrices_update_after_transform_change() {
        let mut shape = Shape::new(Geometry::plane(2.0, 2.0), Box::new(NullMaterial));
        shape.set_position(Vec3::new(0.0, 5.0, 0.0));

        // Stale until update_matrix
        assert_relative_eq!(shape.object_to_world()[(1, 3)], 0.0);
        shape.update_matrix();
        assert_relative_eq!(shape.object_to_world()[(1, 3)], 5.0);
    }

    #[test]
    fn test_world_bbox_follows_scale() {
        let mut shape = Shape::new(Geometry::plane(2.0, 2.0), Box::new(NullMaterial));
        shape.set_scale(3.0, 1.0, 1.0);
        shape.update_matrix();

        let bbox = shape.bbox();
        assert_relative_eq!(bbox.min.x, -3.0);
        assert_relative_eq!(bbox.max.x, 3.0);
        assert_relative_eq!(bbox.max.z, 1.0);
    }
}
