//! CPU-side geometry: vertex/index lists and procedural generators
//!
//! A [`Geometry`] owns its vertex and index data and remembers at most one
//! GPU upload, recorded by
//! [`crate::rhi::RenderInterface::upload_geometry`]. The cached handle is a
//! derived value: mutating the vertex data does not touch the GPU copy, and
//! re-uploading produces a fresh handle.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Aabb, BoundingSphere, Vec3};
use crate::rhi::{AttributeKind, VertexArrayHandle, VertexAttribute};

/// Interleaved vertex layout shared by every mesh the engine draws
///
/// `#[repr(C)]` keeps the field order and packing stable so whole vertex
/// slices can be uploaded with a single byte cast.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in object space
    pub position: [f32; 3],
    /// Normal vector
    pub normal: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
}

impl Vertex {
    /// The fixed three-attribute layout: position at slot 0, normal at
    /// slot 1, uv at slot 2
    #[must_use]
    pub fn layout() -> [VertexAttribute; 3] {
        let stride = std::mem::size_of::<Vertex>() as i32;
        [
            VertexAttribute {
                index: 0,
                elements: 3,
                kind: AttributeKind::Float,
                stride,
                offset: std::mem::offset_of!(Vertex, position) as i32,
            },
            VertexAttribute {
                index: 1,
                elements: 3,
                kind: AttributeKind::Float,
                stride,
                offset: std::mem::offset_of!(Vertex, normal) as i32,
            },
            VertexAttribute {
                index: 2,
                elements: 2,
                kind: AttributeKind::Float,
                stride,
                offset: std::mem::offset_of!(Vertex, uv) as i32,
            },
        ]
    }
}

/// Triangle mesh data with an optional cached GPU upload
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    vertex_array: VertexArrayHandle,
}

impl Geometry {
    /// Create an empty geometry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vertex
    pub fn add_vertex(&mut self, vertex: Vertex) {
        self.vertices.push(vertex);
    }

    /// Append an index
    pub fn add_index(&mut self, index: u32) {
        self.indices.push(index);
    }

    /// Replace all vertices
    pub fn set_vertices(&mut self, vertices: Vec<Vertex>) {
        self.vertices = vertices;
    }

    /// Replace all indices
    pub fn set_indices(&mut self, indices: Vec<u32>) {
        self.indices = indices;
    }

    /// Vertex list
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Index list
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Handle of the GPU vertex array, null until uploaded
    #[must_use]
    pub fn vertex_array(&self) -> VertexArrayHandle {
        self.vertex_array
    }

    /// Record the GPU upload for this geometry
    pub fn set_vertex_array(&mut self, handle: VertexArrayHandle) {
        self.vertex_array = handle;
    }

    /// Object-space bounding box of the vertex positions
    #[must_use]
    pub fn bbox(&self) -> Aabb {
        let mut bbox = Aabb::empty();
        for vertex in &self.vertices {
            bbox.expand(Vec3::from(vertex.position));
        }
        bbox
    }

    /// Object-space bounding sphere
    #[must_use]
    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.bbox().sphere()
    }

    /// Generate a UV sphere
    ///
    /// Rings of `width_segments` x `height_segments` quads, split into
    /// triangles except at the poles.
    #[must_use]
    pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let mut geo = Geometry::new();
        let mut grid: Vec<Vec<u32>> = Vec::new();
        let mut index = 0u32;

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let mut row = Vec::new();

            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let theta = u * 2.0 * std::f32::consts::PI;
                let phi = v * std::f32::consts::PI;

                let position = Vec3::new(
                    -radius * theta.cos() * phi.sin(),
                    radius * phi.cos(),
                    radius * theta.sin() * phi.sin(),
                );
                let normal = position.normalize();

                geo.add_vertex(Vertex {
                    position: position.into(),
                    normal: normal.into(),
                    uv: [u, 1.0 - v],
                });

                row.push(index);
                index += 1;
            }
            grid.push(row);
        }

        for iy in 0..height_segments as usize {
            for ix in 0..width_segments as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];

                if iy != 0 {
                    geo.add_index(a);
                    geo.add_index(b);
                    geo.add_index(d);
                }
                if iy != height_segments as usize - 1 {
                    geo.add_index(b);
                    geo.add_index(c);
                    geo.add_index(d);
                }
            }
        }

        geo
    }

    /// Generate a flat plane in the XZ plane, centered at the origin,
    /// facing +Y
    #[must_use]
    pub fn plane(width: f32, depth: f32) -> Self {
        let hw = width * 0.5;
        let hd = depth * 0.5;
        let normal = [0.0, 1.0, 0.0];

        let mut geo = Geometry::new();
        geo.set_vertices(vec![
            Vertex { position: [-hw, 0.0, -hd], normal, uv: [0.0, 0.0] },
            Vertex { position: [-hw, 0.0, hd], normal, uv: [0.0, 1.0] },
            Vertex { position: [hw, 0.0, hd], normal, uv: [1.0, 1.0] },
            Vertex { position: [hw, 0.0, -hd], normal, uv: [1.0, 0.0] },
        ]);
        geo.set_indices(vec![0, 1, 2, 0, 2, 3]);
        geo
    }
}
