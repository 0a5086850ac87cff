//! Triangle meshes and a small Wavefront OBJ reader.
//!
//! Only what the sampler needs survives loading: world positions and texture
//! coordinates, flattened into independent triangles. Polygons are fan
//! triangulated; normals, groups and materials are ignored.

use crate::error::ResourceError;
use glam::{Vec2, Vec3};
use std::path::Path;

/// A mesh corner: world position plus texture coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub world: Vec3,
    pub texture: Vec2,
}

impl Vertex {
    pub fn new(world: Vec3, texture: Vec2) -> Self {
        Self { world, texture }
    }
}

impl From<Vec3> for Vertex {
    fn from(world: Vec3) -> Self {
        Self {
            world,
            texture: Vec2::ZERO,
        }
    }
}

/// Three vertices, no shared topology.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Triangle {
    pub a: Vertex,
    pub b: Vertex,
    pub c: Vertex,
}

impl Triangle {
    pub fn new(a: impl Into<Vertex>, b: impl Into<Vertex>, c: impl Into<Vertex>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            c: c.into(),
        }
    }

    pub fn vertices(&self) -> [Vertex; 3] {
        [self.a, self.b, self.c]
    }

    /// Barycentric weights of `point` relative to `a`, `b` and `c`.
    ///
    /// The point is projected onto the triangle's plane. Degenerate triangles
    /// put all weight on `a`.
    pub fn weights(&self, point: Vec3) -> Vec3 {
        let v0 = self.b.world - self.a.world;
        let v1 = self.c.world - self.a.world;
        let v2 = point - self.a.world;

        let d00 = v0.dot(v0);
        let d01 = v0.dot(v1);
        let d11 = v1.dot(v1);
        let d20 = v2.dot(v0);
        let d21 = v2.dot(v1);

        let denom = d00 * d11 - d01 * d01;
        if denom.abs() <= f32::EPSILON * (d00 * d11).max(f32::MIN_POSITIVE) {
            return Vec3::X;
        }

        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        Vec3::new(1.0 - v - w, v, w)
    }

    /// Blends one scalar per vertex by barycentric `weights`.
    pub fn interpolate(weights: Vec3, values: [f32; 3]) -> f32 {
        weights.dot(Vec3::from_array(values))
    }

    /// Texture coordinate at `point`, interpolated from the corners.
    pub fn texture_at(&self, point: Vec3) -> Vec2 {
        let weights = self.weights(point);
        Vec2::new(
            Self::interpolate(weights, [self.a.texture.x, self.b.texture.x, self.c.texture.x]),
            Self::interpolate(weights, [self.a.texture.y, self.b.texture.y, self.c.texture.y]),
        )
    }
}

/// A list of triangles ready for sampling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    /// Reads an OBJ file and applies `scaling` then `offset` to every position.
    pub fn load(path: impl AsRef<Path>, scaling: f32, offset: Vec3) -> Result<Self, ResourceError> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::from_obj_str(&source)?.transformed(scaling, offset))
    }

    /// Parses OBJ text. Fails on malformed numbers or indices, or when no face is found.
    pub fn from_obj_str(source: &str) -> Result<Self, ResourceError> {
        let mut positions: Vec<Vec3> = Vec::new();
        let mut uvs: Vec<Vec2> = Vec::new();
        let mut triangles = Vec::new();

        for (number, line) in source.lines().enumerate() {
            let line_no = number + 1;
            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else {
                continue;
            };

            match keyword {
                "v" => {
                    let [x, y, z] = parse_floats::<3>(&mut parts, line_no)?;
                    positions.push(Vec3::new(x, y, z));
                }
                "vt" => {
                    let [u, v] = parse_floats::<2>(&mut parts, line_no)?;
                    uvs.push(Vec2::new(u, v));
                }
                "f" => {
                    let corners = parts
                        .map(|token| parse_corner(token, &positions, &uvs, line_no))
                        .collect::<Result<Vec<_>, _>>()?;
                    if corners.len() < 3 {
                        return Err(parse_error(line_no, "face needs at least three vertices"));
                    }
                    for i in 1..corners.len() - 1 {
                        triangles.push(Triangle {
                            a: corners[0],
                            b: corners[i],
                            c: corners[i + 1],
                        });
                    }
                }
                // comments, normals, groups, materials
                _ => {}
            }
        }

        if triangles.is_empty() {
            return Err(ResourceError::EmptyMesh);
        }
        Ok(Self { triangles })
    }

    /// Scales then offsets every world position.
    pub fn transformed(mut self, scaling: f32, offset: Vec3) -> Self {
        for triangle in &mut self.triangles {
            for vertex in [&mut triangle.a, &mut triangle.b, &mut triangle.c] {
                vertex.world = vertex.world * scaling + offset;
            }
        }
        self
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Host memory held by the triangle list.
    pub fn byte_size(&self) -> usize {
        self.triangles.len() * std::mem::size_of::<Triangle>()
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> ResourceError {
    ResourceError::ObjParse {
        line,
        message: message.into(),
    }
}

fn parse_floats<'a, const N: usize>(
    parts: &mut impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<[f32; N], ResourceError> {
    let mut out = [0.0; N];
    for slot in &mut out {
        let token = parts
            .next()
            .ok_or_else(|| parse_error(line, format!("expected {} components", N)))?;
        *slot = token
            .parse()
            .map_err(|_| parse_error(line, format!("invalid number '{}'", token)))?;
    }
    Ok(out)
}

/// Resolves a 1-based (or negative, relative) OBJ index.
fn resolve_index(token: &str, len: usize, line: usize) -> Result<usize, ResourceError> {
    let index: i64 = token
        .parse()
        .map_err(|_| parse_error(line, format!("invalid index '{}'", token)))?;
    let resolved = if index < 0 { len as i64 + index } else { index - 1 };
    if index == 0 || resolved < 0 || resolved >= len as i64 {
        return Err(parse_error(line, format!("index {} out of range", index)));
    }
    Ok(resolved as usize)
}

/// Parses `v`, `v/vt`, `v//vn` or `v/vt/vn`.
fn parse_corner(token: &str, positions: &[Vec3], uvs: &[Vec2], line: usize) -> Result<Vertex, ResourceError> {
    let mut fields = token.split('/');
    let position = fields
        .next()
        .map(|v| resolve_index(v, positions.len(), line))
        .ok_or_else(|| parse_error(line, "empty face vertex"))??;
    let texture = match fields.next() {
        Some(vt) if !vt.is_empty() => uvs[resolve_index(vt, uvs.len(), line)?],
        _ => Vec2::ZERO,
    };
    Ok(Vertex::new(positions[position], texture))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# unit quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn test_fan_triangulation() {
        let mesh = Mesh::from_obj_str(QUAD).unwrap();
        assert_eq!(mesh.len(), 2);
        let second = mesh.triangles()[1];
        assert_eq!(second.a.world, Vec3::ZERO);
        assert_eq!(second.b.world, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(second.c.texture, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_position_only_and_negative_indices() {
        let mesh = Mesh::from_obj_str("v 0 0 0\nv 2 0 0\nv 0 2 0\nf -3 -2 -1\n").unwrap();
        let tri = mesh.triangles()[0];
        assert_eq!(tri.b.world, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(tri.a.texture, Vec2::ZERO);
    }

    #[test]
    fn test_normal_only_corner() {
        let mesh = Mesh::from_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n").unwrap();
        assert_eq!(mesh.len(), 1);
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            Mesh::from_obj_str("v 0 zero 0\n"),
            Err(ResourceError::ObjParse { line: 1, .. })
        ));
        assert!(matches!(
            Mesh::from_obj_str("v 0 0 0\nf 1 2 3\n"),
            Err(ResourceError::ObjParse { line: 2, .. })
        ));
        assert!(matches!(Mesh::from_obj_str("v 0 0 0\n"), Err(ResourceError::EmptyMesh)));
    }

    #[test]
    fn test_transformed_scales_then_offsets() {
        let mesh = Mesh::from_obj_str(QUAD)
            .unwrap()
            .transformed(2.0, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(mesh.triangles()[0].c.world, Vec3::new(2.0, 2.0, 1.0));
    }

    #[test]
    fn test_weights_at_corners_and_center() {
        let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert!((tri.weights(Vec3::ZERO) - Vec3::X).length() < 1e-6);
        assert!((tri.weights(Vec3::X) - Vec3::Y).length() < 1e-6);
        let center = tri.weights(Vec3::new(1.0 / 3.0, 1.0 / 3.0, 0.0));
        assert!((center - Vec3::splat(1.0 / 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_degenerate_weights() {
        let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert_eq!(tri.weights(Vec3::X), Vec3::X);
    }

    #[test]
    fn test_texture_interpolation() {
        let mesh = Mesh::from_obj_str(QUAD).unwrap();
        let uv = mesh.triangles()[0].texture_at(Vec3::new(0.5, 0.25, 0.0));
        assert!((uv - Vec2::new(0.5, 0.25)).length() < 1e-5);
    }
}
