use std::path::Path;

use crate::{AssetError, MeshData};

/// Import the first triangle mesh found in an OBJ or glTF/GLB file.
///
/// The returned mesh always carries normals and texture coordinates; missing
/// attributes are generated (normals) or zero-filled (uvs).
pub fn load_mesh(path: impl AsRef<Path>) -> Result<MeshData, AssetError> {
    let path = path.as_ref();
    let _span = tracing::debug_span!("load_mesh", path = %path.display()).entered();

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let mut mesh = match extension.as_str() {
        "obj" => load_obj(path)?,
        "gltf" | "glb" => load_gltf(path)?,
        _ => return Err(AssetError::UnsupportedFormat(path.display().to_string())),
    };

    if mesh.indices.is_empty() {
        return Err(AssetError::EmptyMesh(path.display().to_string()));
    }
    mesh.validate_indices()?;
    mesh.ensure_normals();
    mesh.ensure_uvs();
    mesh.validate()?;

    tracing::info!(
        "loaded mesh {} from {}: {} vertices, {} triangles",
        mesh.name,
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mesh")
        .to_string()
}

fn load_obj(path: &Path) -> Result<MeshData, AssetError> {
    let (models, materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)?;
    if let Err(e) = materials {
        tracing::debug!("no usable materials for {}: {e}", path.display());
    }

    // Only the first model is drawn.
    let model = models
        .into_iter()
        .next()
        .ok_or_else(|| AssetError::EmptyMesh(path.display().to_string()))?;
    let mesh = model.mesh;

    let name = if model.name.is_empty() {
        file_stem(path)
    } else {
        model.name
    };

    let positions = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    let normals = mesh
        .normals
        .chunks_exact(3)
        .map(|n| [n[0], n[1], n[2]])
        .collect();
    // OBJ puts the texture origin bottom-left; wgpu samples from top-left.
    let uvs = mesh
        .texcoords
        .chunks_exact(2)
        .map(|t| [t[0], 1.0 - t[1]])
        .collect();

    Ok(MeshData {
        name,
        positions,
        normals,
        uvs,
        indices: mesh.indices,
    })
}

fn load_gltf(path: &Path) -> Result<MeshData, AssetError> {
    let (document, buffers, _images) = gltf::import(path)?;

    let Some((mesh, primitive)) = document.meshes().find_map(|mesh| {
        mesh.primitives()
            .find(|p| p.mode() == gltf::mesh::Mode::Triangles)
            .map(|p| (mesh.clone(), p))
    }) else {
        return Err(AssetError::EmptyMesh(path.display().to_string()));
    };

    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| AssetError::EmptyMesh(path.display().to_string()))?
        .collect();
    let normals = reader
        .read_normals()
        .map(|n| n.collect())
        .unwrap_or_default();
    let uvs = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect())
        .unwrap_or_default();
    let indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    Ok(MeshData {
        name: mesh.name().map(str::to_string).unwrap_or_else(|| file_stem(path)),
        positions,
        normals,
        uvs,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const QUAD_OBJ: &str = "\
o quad
v -1.0 0.0 -1.0
v  1.0 0.0 -1.0
v  1.0 0.0  1.0
v -1.0 0.0  1.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 1.0 0.0
f 1/1/1 4/4/1 3/3/1 2/2/1
";

    #[test]
    fn obj_quad_is_triangulated() {
        let file = write_temp(".obj", QUAD_OBJ);
        let mesh = load_mesh(file.path()).unwrap();
        assert_eq!(mesh.name, "quad");
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.normals.len(), 4);
        assert!(mesh.normals.iter().all(|n| *n == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn obj_texture_v_is_flipped() {
        let file = write_temp(".obj", QUAD_OBJ);
        let mesh = load_mesh(file.path()).unwrap();
        // Vertex at (-1, 0, -1) carries vt (0, 0) in the file.
        let i = mesh
            .positions
            .iter()
            .position(|p| *p == [-1.0, 0.0, -1.0])
            .unwrap();
        assert_eq!(mesh.uvs[i], [0.0, 1.0]);
    }

    #[test]
    fn obj_without_normals_gets_generated_ones() {
        let file = write_temp(
            ".obj",
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
        );
        let mesh = load_mesh(file.path()).unwrap();
        assert_eq!(mesh.normals.len(), 3);
        assert_eq!(mesh.uvs.len(), 3);
        assert!((mesh.normals[0][2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = write_temp(".fbx", "");
        assert!(matches!(
            load_mesh(file.path()),
            Err(AssetError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn obj_without_faces_is_empty() {
        let file = write_temp(".obj", "v 0 0 0\nv 1 0 0\n");
        assert!(load_mesh(file.path()).is_err());
    }

    // Three positions (0,0,0) (1,0,0) (0,1,0) followed by u16 indices 0 1 2.
    const TRIANGLE_BUFFER: &str = "AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAA=";
    // Same positions, indices 0 1 5.
    const BAD_INDEX_BUFFER: &str = "AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAUAAAA=";

    /// Single-primitive embedded glTF without normals or uvs.
    fn gltf_triangle(buffer: &str, with_indices: bool, mode: u32) -> String {
        let indices = if with_indices { r#", "indices": 1"# } else { "" };
        format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "buffers": [{{ "byteLength": 44, "uri": "data:application/octet-stream;base64,{buffer}" }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
       "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ],
  "meshes": [{{ "name": "tri", "primitives": [{{ "attributes": {{ "POSITION": 0 }}{indices}, "mode": {mode} }}] }}]
}}"#
        )
    }

    #[test]
    fn gltf_triangle_gets_generated_normals() {
        let file = write_temp(".gltf", &gltf_triangle(TRIANGLE_BUFFER, true, 4));
        let mesh = load_mesh(file.path()).unwrap();
        assert_eq!(mesh.name, "tri");
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.uvs, vec![[0.0, 0.0]; 3]);
        assert!(mesh.normals.iter().all(|n| (n[2] - 1.0).abs() < 1e-6));
    }

    #[test]
    fn gltf_without_indices_draws_vertices_in_order() {
        let file = write_temp(".gltf", &gltf_triangle(TRIANGLE_BUFFER, false, 4));
        let mesh = load_mesh(file.path()).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn gltf_without_triangles_is_empty() {
        // Mode 0 is POINTS.
        let file = write_temp(".gltf", &gltf_triangle(TRIANGLE_BUFFER, true, 0));
        assert!(matches!(load_mesh(file.path()), Err(AssetError::EmptyMesh(_))));
    }

    #[test]
    fn gltf_index_past_vertex_count_is_invalid() {
        let file = write_temp(".gltf", &gltf_triangle(BAD_INDEX_BUFFER, true, 4));
        assert!(matches!(
            load_mesh(file.path()),
            Err(AssetError::InvalidMesh { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_mesh("/definitely/not/here.obj").is_err());
    }
}
