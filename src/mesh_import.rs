//! External mesh-import interface (spec §6): the only data the core accepts
//! to build a [`crate::topology::Topology`]. Reading Exodus/VTK/Tecplot (or
//! any other mesh file format) into this shape is the caller's job.

use std::collections::HashMap;

use glam::DVec3;

use crate::boundary::BoundaryTagSet;
use crate::topology::{CellShape, Dim};

/// One cell of the input mesh.
#[derive(Debug, Clone)]
pub struct CellInput {
    pub shape: CellShape,
    /// Vertex ring/shell, CCW (2D) or consistent with the shape's canonical
    /// local face template (3D). Orientation mistakes are corrected
    /// automatically from coordinates during construction/caching.
    pub vertex_ring: Vec<u32>,
    pub region_id: i32,
    /// Required only for `CellShape::Polyhedron`, where the vertex ring
    /// alone does not determine the face structure. Each entry is a face's
    /// local ring, indexing into `vertex_ring`.
    pub explicit_faces: Option<Vec<Vec<u32>>>,
}

impl CellInput {
    pub fn new(shape: CellShape, vertex_ring: Vec<u32>, region_id: i32) -> Self {
        Self { shape, vertex_ring, region_id, explicit_faces: None }
    }

    pub fn with_faces(mut self, faces: Vec<Vec<u32>>) -> Self {
        self.explicit_faces = Some(faces);
        self
    }
}

/// A face is identified, for tagging purposes, by its sorted vertex set.
/// This is independent of any id the topology assigns internally, since the
/// caller tags faces before the topology (and its ids) exist.
pub type FaceKey = Vec<u32>;

/// Builds a stable [`FaceKey`] from an (unsorted) vertex ring.
pub fn face_key(vertices: &[u32]) -> FaceKey {
    let mut key = vertices.to_vec();
    key.sort_unstable();
    key
}

/// Complete external description of a mesh, as handed to
/// [`crate::topology::Topology::build`].
#[derive(Debug, Clone)]
pub struct MeshInput {
    pub dim: Dim,
    pub vertices: Vec<DVec3>,
    pub cells: Vec<CellInput>,
    pub face_tags: HashMap<FaceKey, BoundaryTagSet>,
}

impl MeshInput {
    pub fn new(dim: Dim, vertices: Vec<DVec3>) -> Self {
        Self { dim, vertices, cells: Vec::new(), face_tags: HashMap::new() }
    }

    pub fn push_cell(&mut self, cell: CellInput) -> &mut Self {
        self.cells.push(cell);
        self
    }

    pub fn tag_face(&mut self, vertices: &[u32], tag: BoundaryTagSet) -> &mut Self {
        self.face_tags
            .entry(face_key(vertices))
            .and_modify(|existing| *existing = existing.union(tag))
            .or_insert(tag);
        self
    }
}
