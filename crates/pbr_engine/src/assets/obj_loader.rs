//! OBJ file loader for 3D models
//!
//! Supports the subset the demo's assets use: `v`/`vt`/`vn` records and `f`
//! faces with `pos`, `pos/uv`, `pos/uv/normal`, or `pos//normal` corners.
//! Polygons are fan-triangulated. Corners sharing the same index triple are
//! deduplicated into one vertex.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use thiserror::Error;

use crate::geometry::{Geometry, Vertex};

/// OBJ parsing errors
#[derive(Error, Debug)]
pub enum ObjError {
    /// The file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record had a malformed number
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// 1-based source line
        line: usize,
        /// What failed to parse
        message: String,
    },

    /// A face referenced a position/uv/normal that does not exist
    #[error("invalid format at line {line}: {message}")]
    InvalidFormat {
        /// 1-based source line
        line: usize,
        /// Which reference was out of bounds
        message: String,
    },
}

/// Index triple of one face corner
type CornerKey = (usize, Option<usize>, Option<usize>);

/// Loader for Wavefront OBJ meshes
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file into a geometry
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Geometry, ObjError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let geometry = Self::read(BufReader::new(file))?;
        log::info!(
            "loaded '{}': {} vertices, {} triangles",
            path.display(),
            geometry.vertices().len(),
            geometry.indices().len() / 3
        );
        Ok(geometry)
    }

    /// Parse OBJ records from any reader
    pub fn read<R: Read>(reader: R) -> Result<Geometry, ObjError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();

        let mut geometry = Geometry::new();
        let mut corners: HashMap<CornerKey, u32> = HashMap::new();

        for (number, line) in BufReader::new(reader).lines().enumerate() {
            let number = number + 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts[0] {
                "v" if parts.len() >= 4 => {
                    positions.push(parse_vec3(&parts[1..4], number)?);
                }
                "vn" if parts.len() >= 4 => {
                    normals.push(parse_vec3(&parts[1..4], number)?);
                }
                "vt" if parts.len() >= 3 => {
                    tex_coords.push([
                        parse_float(parts[1], number)?,
                        parse_float(parts[2], number)?,
                    ]);
                }
                "f" if parts.len() >= 4 => {
                    let mut face = Vec::with_capacity(parts.len() - 1);
                    for corner in &parts[1..] {
                        face.push(resolve_corner(
                            corner,
                            number,
                            &positions,
                            &tex_coords,
                            &normals,
                            &mut corners,
                            &mut geometry,
                        )?);
                    }
                    // Fan triangulation handles quads and larger polygons
                    for i in 1..face.len() - 1 {
                        geometry.add_index(face[0]);
                        geometry.add_index(face[i]);
                        geometry.add_index(face[i + 1]);
                    }
                }
                // Groups, materials, smoothing: ignored
                _ => {}
            }
        }

        Ok(geometry)
    }
}

fn parse_float(text: &str, line: usize) -> Result<f32, ObjError> {
    text.parse().map_err(|_| ObjError::Parse {
        line,
        message: format!("invalid number '{text}'"),
    })
}

fn parse_vec3(parts: &[&str], line: usize) -> Result<[f32; 3], ObjError> {
    Ok([
        parse_float(parts[0], line)?,
        parse_float(parts[1], line)?,
        parse_float(parts[2], line)?,
    ])
}

fn parse_index(text: &str, line: usize, len: usize, what: &str) -> Result<usize, ObjError> {
    let raw: i64 = text.parse().map_err(|_| ObjError::Parse {
        line,
        message: format!("invalid {what} index '{text}'"),
    })?;
    // OBJ indices are 1-based; negative counts from the end of the list
    let index = if raw < 0 {
        len as i64 + raw
    } else {
        raw - 1
    };
    if index < 0 || index as usize >= len {
        return Err(ObjError::InvalidFormat {
            line,
            message: format!("{what} index {raw} out of bounds"),
        });
    }
    Ok(index as usize)
}

fn resolve_corner(
    corner: &str,
    line: usize,
    positions: &[[f32; 3]],
    tex_coords: &[[f32; 2]],
    normals: &[[f32; 3]],
    corners: &mut HashMap<CornerKey, u32>,
    geometry: &mut Geometry,
) -> Result<u32, ObjError> {
    let fields: Vec<&str> = corner.split('/').collect();

    let pos_idx = parse_index(fields[0], line, positions.len(), "position")?;
    let uv_idx = match fields.get(1) {
        Some(f) if !f.is_empty() => Some(parse_index(f, line, tex_coords.len(), "texcoord")?),
        _ => None,
    };
    let normal_idx = match fields.get(2) {
        Some(f) if !f.is_empty() => Some(parse_index(f, line, normals.len(), "normal")?),
        _ => None,
    };

    let key = (pos_idx, uv_idx, normal_idx);
    if let Some(&index) = corners.get(&key) {
        return Ok(index);
    }

    let vertex = Vertex {
        position: positions[pos_idx],
        normal: normal_idx.map_or([0.0, 0.0, 1.0], |i| normals[i]),
        uv: uv_idx.map_or([0.0, 0.0], |i| tex_coords[i]),
    };
    let index = geometry.vertices().len() as u32;
    geometry.add_vertex(vertex);
    corners.insert(key, index);
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TRIANGLE: &str = "\
# a triangle
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn test_triangle_with_full_corners() {
        let geo = ObjLoader::read(TRIANGLE.as_bytes()).unwrap();
        assert_eq!(geo.vertices().len(), 3);
        assert_eq!(geo.indices(), &[0, 1, 2]);
        assert_relative_eq!(geo.vertices()[1].position[0], 1.0);
        assert_relative_eq!(geo.vertices()[2].uv[1], 1.0);
        assert_relative_eq!(geo.vertices()[0].normal[2], 1.0);
    }

    #[test]
    fn test_quad_is_fan_triangulated() {
        let obj = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";
        let geo = ObjLoader::read(obj.as_bytes()).unwrap();
        assert_eq!(geo.vertices().len(), 4);
        assert_eq!(geo.indices(), &[0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_shared_corners_are_deduplicated() {
        let obj = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3
f 1 3 4
";
        let geo = ObjLoader::read(obj.as_bytes()).unwrap();
        // Corners 1 and 3 are shared between the two faces
        assert_eq!(geo.vertices().len(), 4);
        assert_eq!(geo.indices().len(), 6);
    }

    #[test]
    fn test_position_and_normal_without_uv() {
        let obj = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 1 0
f 1//1 2//1 3//1
";
        let geo = ObjLoader::read(obj.as_bytes()).unwrap();
        assert_relative_eq!(geo.vertices()[0].normal[1], 1.0);
        assert_relative_eq!(geo.vertices()[0].uv[0], 0.0);
    }

    #[test]
    fn test_negative_indices_count_from_end() {
        let obj = "\
v 0 0 0
v 1 0 0
v 0 1 0
f -3 -2 -1
";
        let geo = ObjLoader::read(obj.as_bytes()).unwrap();
        assert_eq!(geo.indices(), &[0, 1, 2]);
    }

    #[test]
    fn test_out_of_bounds_index_is_reported_with_line() {
        let obj = "\
v 0 0 0
f 1 2 3
";
        match ObjLoader::read(obj.as_bytes()) {
            Err(ObjError::InvalidFormat { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected InvalidFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_number_is_an_error() {
        let obj = "v 0 zero 0\n";
        assert!(matches!(
            ObjLoader::read(obj.as_bytes()),
            Err(ObjError::Parse { line: 1, .. })
        ));
    }
}
