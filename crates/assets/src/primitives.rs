//! Procedural meshes: unit cube, height-mapped terrain grid, fullscreen quad.

use crate::{ImageData, MeshData};

/// Axis-aligned cube centred at the origin with per-face normals and uvs.
pub fn cube(size: f32) -> MeshData {
    let p = size * 0.5;
    // Each face lists its corners bottom-left, bottom-right, top-right,
    // top-left as seen from outside the cube.
    #[rustfmt::skip]
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([0.0, 0.0, 1.0],  [[-p, -p,  p], [ p, -p,  p], [ p,  p,  p], [-p,  p,  p]]),
        ([0.0, 0.0, -1.0], [[ p, -p, -p], [-p, -p, -p], [-p,  p, -p], [ p,  p, -p]]),
        ([1.0, 0.0, 0.0],  [[ p, -p,  p], [ p, -p, -p], [ p,  p, -p], [ p,  p,  p]]),
        ([-1.0, 0.0, 0.0], [[-p, -p, -p], [-p, -p,  p], [-p,  p,  p], [-p,  p, -p]]),
        ([0.0, 1.0, 0.0],  [[-p,  p,  p], [ p,  p,  p], [ p,  p, -p], [-p,  p, -p]]),
        ([0.0, -1.0, 0.0], [[-p, -p, -p], [ p, -p, -p], [ p, -p,  p], [-p, -p,  p]]),
    ];
    let corner_uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let mut mesh = MeshData {
        name: "cube".into(),
        ..Default::default()
    };
    for (normal, corners) in faces {
        let base = mesh.positions.len() as u32;
        mesh.positions.extend(corners);
        mesh.normals.extend([normal; 4]);
        mesh.uvs.extend(corner_uvs);
        mesh.indices
            .extend([base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    mesh
}

/// Terrain grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainParams {
    /// Extent along X.
    pub width: f32,
    /// Extent along Z.
    pub depth: f32,
    pub columns: u32,
    pub rows: u32,
    /// Height of a white height-map texel.
    pub max_height: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            width: 10.0,
            depth: 10.0,
            columns: 50,
            rows: 50,
            max_height: 5.0,
        }
    }
}

/// Grid on the XZ plane centred at the origin, optionally displaced along +Y
/// by the luminance of `heightmap`.
pub fn terrain(params: TerrainParams, heightmap: Option<&ImageData>) -> MeshData {
    let columns = params.columns.max(1);
    let rows = params.rows.max(1);
    let mut mesh = MeshData {
        name: "terrain".into(),
        ..Default::default()
    };

    for iz in 0..=rows {
        let v = iz as f32 / rows as f32;
        for ix in 0..=columns {
            let u = ix as f32 / columns as f32;
            let height = heightmap.map_or(0.0, |h| h.luminance_at(u, v) * params.max_height);
            mesh.positions.push([
                (u - 0.5) * params.width,
                height,
                (v - 0.5) * params.depth,
            ]);
            mesh.uvs.push([u, v]);
        }
    }

    let stride = columns + 1;
    for iz in 0..rows {
        for ix in 0..columns {
            let a = ix + stride * iz;
            let b = ix + stride * (iz + 1);
            let c = (ix + 1) + stride * (iz + 1);
            let d = (ix + 1) + stride * iz;
            mesh.indices.extend([a, b, d, b, c, d]);
        }
    }

    mesh.compute_normals();
    mesh
}

/// Two triangles covering clip space. Uvs put (0, 0) at the top-left.
pub fn fullscreen_quad() -> MeshData {
    MeshData {
        name: "fullscreen_quad".into(),
        positions: vec![
            [1.0, -1.0, 0.0],
            [1.0, 1.0, 0.0],
            [-1.0, 1.0, 0.0],
            [-1.0, 1.0, 0.0],
            [-1.0, -1.0, 0.0],
            [1.0, -1.0, 0.0],
        ],
        normals: Vec::new(),
        uvs: vec![
            [1.0, 1.0],
            [1.0, 0.0],
            [0.0, 0.0],
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
        ],
        indices: (0..6).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn cube_layout() {
        let mesh = cube(1.0);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.indices.len(), 36);
        mesh.validate().unwrap();
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::splat(-0.5));
        assert_eq!(max, Vec3::splat(0.5));
    }

    #[test]
    fn cube_winding_matches_face_normals() {
        let mesh = cube(2.0);
        for tri in mesh.indices.chunks_exact(3) {
            let p: Vec<Vec3> = tri
                .iter()
                .map(|&i| Vec3::from_array(mesh.positions[i as usize]))
                .collect();
            let face = (p[1] - p[0]).cross(p[2] - p[0]).normalize();
            let normal = Vec3::from_array(mesh.normals[tri[0] as usize]);
            assert!(face.dot(normal) > 0.99, "face {face} vs normal {normal}");
        }
    }

    #[test]
    fn flat_terrain_faces_up() {
        let params = TerrainParams {
            columns: 4,
            rows: 3,
            ..TerrainParams::default()
        };
        let mesh = terrain(params, None);
        assert_eq!(mesh.vertex_count(), 5 * 4);
        assert_eq!(mesh.triangle_count(), 4 * 3 * 2);
        mesh.validate().unwrap();
        for n in &mesh.normals {
            assert!((Vec3::from_array(*n) - Vec3::Y).length() < 1e-5);
        }
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::new(-5.0, 0.0, -5.0));
        assert_eq!(max, Vec3::new(5.0, 0.0, 5.0));
    }

    #[test]
    fn white_heightmap_lifts_to_max_height() {
        let heightmap = ImageData::solid([255, 255, 255, 255]);
        let mesh = terrain(TerrainParams::default(), Some(&heightmap));
        assert!(mesh.positions.iter().all(|p| (p[1] - 5.0).abs() < 1e-4));
    }

    #[test]
    fn fullscreen_quad_covers_clip_space() {
        let quad = fullscreen_quad();
        let (min, max) = quad.bounds().unwrap();
        assert_eq!((min.x, min.y, max.x, max.y), (-1.0, -1.0, 1.0, 1.0));
        // Top-left corner of the screen samples the texture origin.
        let i = quad
            .positions
            .iter()
            .position(|p| *p == [-1.0, 1.0, 0.0])
            .unwrap();
        assert_eq!(quad.uvs[i], [0.0, 0.0]);
    }
}
