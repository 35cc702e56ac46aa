use glam::Vec3;

use crate::AssetError;

/// Indexed triangle mesh with per-vertex attributes.
///
/// Attribute arrays run parallel to `positions`. Importers may leave
/// `normals` or `uvs` empty; call [`MeshData::ensure_normals`] and
/// [`MeshData::ensure_uvs`] before uploading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    /// Axis-aligned bounds as `(min, max)`. `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from_array(*p));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    pub fn validate(&self) -> Result<(), AssetError> {
        self.validate_indices()?;

        let vertex_count = self.positions.len();
        if self.has_normals() && self.normals.len() != vertex_count {
            return Err(self.invalid(format!(
                "{} normals for {vertex_count} vertices",
                self.normals.len()
            )));
        }
        if self.has_uvs() && self.uvs.len() != vertex_count {
            return Err(self.invalid(format!(
                "{} uvs for {vertex_count} vertices",
                self.uvs.len()
            )));
        }
        Ok(())
    }

    /// Check the index buffer alone: whole triangles, every index in range.
    ///
    /// Importers run this before generating missing attributes.
    pub fn validate_indices(&self) -> Result<(), AssetError> {
        if self.indices.len() % 3 != 0 {
            return Err(self.invalid(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        let vertex_count = self.positions.len();
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(self.invalid(format!(
                "index {bad} out of range for {vertex_count} vertices"
            )));
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> AssetError {
        AssetError::InvalidMesh {
            name: self.name.clone(),
            reason,
        }
    }

    /// Recompute smooth per-vertex normals from the triangles.
    ///
    /// Face normals are accumulated unnormalized, so larger triangles weigh
    /// more. Vertices touched only by degenerate triangles get +Y.
    /// Triangles with out-of-range indices are ignored.
    pub fn compute_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(pa), Some(pb), Some(pc)) = (
                self.positions.get(a),
                self.positions.get(b),
                self.positions.get(c),
            ) else {
                continue;
            };
            let [pa, pb, pc] = [pa, pb, pc].map(|p| Vec3::from_array(*p));
            let face = (pb - pa).cross(pc - pa);
            accum[a] += face;
            accum[b] += face;
            accum[c] += face;
        }
        self.normals = accum
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
            .collect();
    }

    /// Generate normals if the source had none.
    pub fn ensure_normals(&mut self) {
        if self.normals.len() != self.positions.len() {
            if self.has_normals() {
                tracing::warn!(
                    "mesh {}: {} normals for {} vertices, recomputing",
                    self.name,
                    self.normals.len(),
                    self.positions.len()
                );
            }
            self.compute_normals();
        }
    }

    /// Fill missing texture coordinates with zero.
    pub fn ensure_uvs(&mut self) {
        if self.uvs.len() != self.positions.len() {
            self.uvs = vec![[0.0, 0.0]; self.positions.len()];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        MeshData {
            name: "tri".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![0, 1, 2],
            ..Default::default()
        }
    }

    #[test]
    fn counts_and_bounds() {
        let mesh = triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(1.0, 1.0, 0.0));
        assert!(MeshData::default().bounds().is_none());
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        let mut mesh = triangle();
        mesh.indices = vec![0, 1, 3];
        assert!(matches!(mesh.validate(), Err(AssetError::InvalidMesh { .. })));
    }

    #[test]
    fn validate_rejects_partial_triangle() {
        let mut mesh = triangle();
        mesh.indices.push(0);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn computed_normals_face_the_winding() {
        let mut mesh = triangle();
        mesh.ensure_normals();
        assert_eq!(mesh.normals.len(), 3);
        for n in &mesh.normals {
            assert!((Vec3::from_array(*n) - Vec3::Z).length() < 1e-6);
        }
        mesh.validate().unwrap();
    }

    #[test]
    fn normals_skip_out_of_range_triangles() {
        let mut mesh = triangle();
        mesh.indices.extend([0, 1, 7]);
        mesh.compute_normals();
        assert_eq!(mesh.normals.len(), 3);
        assert!((Vec3::from_array(mesh.normals[2]) - Vec3::Z).length() < 1e-6);
        assert!(mesh.validate_indices().is_err());
    }

    #[test]
    fn unreferenced_vertex_gets_up_normal() {
        let mut mesh = triangle();
        mesh.positions.push([5.0, 5.0, 5.0]);
        mesh.compute_normals();
        assert_eq!(mesh.normals[3], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn ensure_uvs_fills_zeroes() {
        let mut mesh = triangle();
        mesh.ensure_uvs();
        assert_eq!(mesh.uvs, vec![[0.0, 0.0]; 3]);
    }
}
