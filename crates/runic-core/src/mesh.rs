//! CPU-side triangle mesh data.
//!
//! A [`Mesh`] is created empty and populated by an external import call
//! (see [`MeshSource`]). The backend pre-renders it into an off-screen
//! sprite texture which the compositor then treats like any other textured
//! quad; the GPU-facing half lives behind
//! [`MeshRenderer`](crate::texture::MeshRenderer).

use crate::error::LoadError;
use crate::vec::Vec3;

/// A triangle as three vertex indices.
pub type Face = [u16; 3];

/// The standard mesh vertex layout.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: [f32; 4],
    pub texco: [f32; 2],
}

/// The import boundary: given an identifier, produce vertex/index arrays or
/// fail.
pub trait MeshSource {
    fn import(&mut self, path: &str) -> Result<(Vec<MeshVertex>, Vec<Face>), LoadError>;
}

/// A triangle mesh.
///
/// Vertex and face counts are fixed by [`set_geometry`](Mesh::set_geometry)
/// before any GPU buffer upload; the backend must not upload an empty mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<MeshVertex>,
    faces: Vec<Face>,
}

impl Mesh {
    /// Create an empty mesh (no geometry, nothing to upload).
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the mesh from imported geometry. Every face index must be in
    /// range; an out-of-range index or empty geometry is rejected and leaves
    /// the mesh unchanged.
    pub fn set_geometry(
        &mut self,
        vertices: Vec<MeshVertex>,
        faces: Vec<Face>,
    ) -> Result<(), LoadError> {
        if vertices.is_empty() || faces.is_empty() {
            return Err(LoadError::EmptyMesh);
        }
        let n = vertices.len();
        for face in &faces {
            if face.iter().any(|&i| i as usize >= n) {
                return Err(LoadError::Decode {
                    path: String::new(),
                    reason: format!("face index out of range (vertex count {n})"),
                });
            }
        }
        self.vertices = vertices;
        self.faces = faces;
        Ok(())
    }

    /// Convenience: import from `source` and populate.
    pub fn load(&mut self, source: &mut dyn MeshSource, path: &str) -> Result<(), LoadError> {
        let (vertices, faces) = source.import(path)?;
        self.set_geometry(vertices, faces)
    }

    #[inline]
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Whether geometry has been loaded.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        !self.faces.is_empty()
    }
}

/// A unit axis-aligned cube centred on the origin, handy default geometry
/// for demos and tests.
pub fn unit_cube() -> Mesh {
    let corners = [
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(0.5, -0.5, -0.5),
        Vec3::new(0.5, 0.5, -0.5),
        Vec3::new(-0.5, 0.5, -0.5),
        Vec3::new(-0.5, -0.5, 0.5),
        Vec3::new(0.5, -0.5, 0.5),
        Vec3::new(0.5, 0.5, 0.5),
        Vec3::new(-0.5, 0.5, 0.5),
    ];
    let vertices = corners
        .iter()
        .map(|&p| MeshVertex {
            position: p,
            normal: p.normalize(),
            color: [
                p.x.max(0.0) + 0.5,
                p.y.max(0.0) + 0.5,
                p.z.max(0.0) + 0.5,
                1.0,
            ],
            texco: [0.0, 0.0],
        })
        .collect();
    let faces = vec![
        [0, 1, 2],
        [0, 2, 3], // back
        [4, 6, 5],
        [4, 7, 6], // front
        [0, 4, 5],
        [0, 5, 1], // bottom
        [3, 2, 6],
        [3, 6, 7], // top
        [0, 3, 7],
        [0, 7, 4], // left
        [1, 5, 6],
        [1, 6, 2], // right
    ];
    let mut mesh = Mesh::new();
    mesh.set_geometry(vertices, faces)
        .expect("cube geometry is valid");
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_mesh_is_empty() {
        let m = Mesh::new();
        assert!(!m.is_loaded());
        assert_eq!(m.vertex_count(), 0);
        assert_eq!(m.face_count(), 0);
    }

    #[test]
    fn set_geometry_fixes_counts() {
        let m = unit_cube();
        assert!(m.is_loaded());
        assert_eq!(m.vertex_count(), 8);
        assert_eq!(m.face_count(), 12);
    }

    #[test]
    fn empty_geometry_rejected() {
        let mut m = Mesh::new();
        assert!(matches!(
            m.set_geometry(vec![], vec![]),
            Err(LoadError::EmptyMesh)
        ));
        assert!(!m.is_loaded());
    }

    #[test]
    fn out_of_range_index_rejected() {
        let mut m = Mesh::new();
        let v = vec![MeshVertex::default(); 3];
        let err = m.set_geometry(v, vec![[0, 1, 3]]);
        assert!(err.is_err());
        assert!(!m.is_loaded()); // untouched on failure
    }
}
