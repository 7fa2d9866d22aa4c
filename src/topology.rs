//! The topology store (spec §3, §4.1): entity arenas, incidence tables, and
//! the corner/wedge construction that the nodal solver assembles over.
//!
//! Built once from a [`crate::mesh_import::MeshInput`] and immutable
//! thereafter (spec §3 "Lifecycle", §5 "the topology store is read-only
//! after construction") — vertex *coordinates* live outside the topology,
//! in whatever `&[DVec3]` the caller threads through the driver, so that
//! mesh motion never has to mutate this struct.


use std::collections::HashMap;

use crate::boundary::BoundaryTagSet;
use crate::error::HydroError;
use crate::mesh_import::{face_key, MeshInput};

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<usize> for $name {
            fn from(i: usize) -> Self {
                $name(i as u32)
            }
        }
    };
}

entity_id!(VertexId);
entity_id!(EdgeId);
entity_id!(FaceId);
entity_id!(CellId);
entity_id!(CornerId);
entity_id!(WedgeId);

/// Mesh dimensionality, fixed for the life of a [`Topology`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Dim {
    One = 1,
    Two = 2,
    Three = 3,
}

impl Dim {
    pub fn value(self) -> usize {
        self as usize
    }
}

/// Shape tag of a cell, carrying the capability set of spec §9
/// (`centroid`, `volume`, `min_length`, `create_entities`,
/// `create_bound_entities`) dispatched in `geometry.rs`/this module rather
/// than through a trait-object hierarchy.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CellShape {
    Line,
    Tri,
    Quad,
    Polygon,
    Tet,
    Hex,
    Prism,
    Pyramid,
    Polyhedron,
}

impl CellShape {
    /// Canonical local face template: each entry is a face's local vertex
    /// ring, indexing into the cell's `vertex_ring`. `None` for shapes whose
    /// faces are supplied explicitly (`Polyhedron`) or that have no 3D
    /// faces at all (1D/2D shapes, whose "faces" are edges/points handled
    /// directly by the dimension-specific construction path).
    fn face_template(self) -> Option<&'static [&'static [usize]]> {
        match self {
            CellShape::Tet => Some(&[&[0, 1, 2], &[0, 1, 3], &[1, 2, 3], &[0, 2, 3]]),
            CellShape::Hex => Some(&[
                &[0, 1, 2, 3],
                &[4, 5, 6, 7],
                &[0, 1, 5, 4],
                &[1, 2, 6, 5],
                &[2, 3, 7, 6],
                &[3, 0, 4, 7],
            ]),
            CellShape::Prism => Some(&[
                &[0, 1, 2],
                &[3, 4, 5],
                &[0, 1, 4, 3],
                &[1, 2, 5, 4],
                &[2, 0, 3, 5],
            ]),
            CellShape::Pyramid => Some(&[
                &[0, 1, 2, 3],
                &[0, 1, 4],
                &[1, 2, 4],
                &[2, 3, 4],
                &[3, 0, 4],
            ]),
            CellShape::Line | CellShape::Tri | CellShape::Quad | CellShape::Polygon | CellShape::Polyhedron => None,
        }
    }

    pub fn is_2d(self) -> bool {
        matches!(self, CellShape::Tri | CellShape::Quad | CellShape::Polygon)
    }

    pub fn is_3d(self) -> bool {
        matches!(
            self,
            CellShape::Tet | CellShape::Hex | CellShape::Prism | CellShape::Pyramid | CellShape::Polyhedron
        )
    }
}

/// A (cell, vertex) incidence: the per-vertex contribution of one cell to
/// the nodal system (spec §3, glossary).
#[derive(Copy, Clone, Debug)]
pub struct Corner {
    pub cell: CellId,
    pub vertex: VertexId,
}

/// The finest subcell simplex, incident to (cell, face, edge, vertex). In
/// 2D, `face` and `edge` name the same entity (spec §3: "Face ... in 2D
/// coincides with edge"); in 1D neither exists as a real sub-entity and
/// both are `None`.
#[derive(Copy, Clone, Debug)]
pub struct Wedge {
    pub cell: CellId,
    pub corner: CornerId,
    pub vertex: VertexId,
    pub face: Option<FaceId>,
    pub edge: Option<EdgeId>,
}

/// Precomputed entity arrays and incidence tables for one mesh. See the
/// module doc comment for the coordinate-ownership split.
#[derive(Debug)]
pub struct Topology {
    dim: Dim,
    vertex_count: usize,

    edge_vertices: Vec<[VertexId; 2]>,

    face_vertices: Vec<Vec<VertexId>>,
    face_edges: Vec<Vec<EdgeId>>,
    face_cells: Vec<Vec<CellId>>,
    face_tags: Vec<BoundaryTagSet>,

    cell_shape: Vec<CellShape>,
    cell_region: Vec<i32>,
    cell_vertices: Vec<Vec<VertexId>>,
    cell_faces: Vec<Vec<FaceId>>,
    cell_edges: Vec<Vec<EdgeId>>,
    cell_corners: Vec<Vec<CornerId>>,

    vertex_cells: Vec<Vec<CellId>>,
    vertex_faces: Vec<Vec<FaceId>>,
    vertex_edges: Vec<Vec<EdgeId>>,
    vertex_corners: Vec<Vec<CornerId>>,
    /// Only populated (and only meaningful) for `Dim::One`, where a "face"
    /// degenerates to a tagged boundary vertex.
    vertex_tags: Vec<BoundaryTagSet>,

    corners: Vec<Corner>,
    wedges: Vec<Wedge>,
    corner_wedges: Vec<Vec<WedgeId>>,
}

/// Dedups vertex pairs into edge ids, preserving first-seen orientation.
struct EdgeInterner {
    index: HashMap<(u32, u32), EdgeId>,
    vertices: Vec<[VertexId; 2]>,
}

impl EdgeInterner {
    fn new() -> Self {
        Self { index: HashMap::new(), vertices: Vec::new() }
    }

    fn intern(&mut self, a: VertexId, b: VertexId) -> EdgeId {
        let key = if a.0 <= b.0 { (a.0, b.0) } else { (b.0, a.0) };
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = EdgeId::from(self.vertices.len());
        self.vertices.push([a, b]);
        self.index.insert(key, id);
        id
    }
}

impl Topology {
    pub fn dim(&self) -> Dim {
        self.dim
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.face_vertices.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cell_shape.len()
    }

    pub fn corner_count(&self) -> usize {
        self.corners.len()
    }

    pub fn wedge_count(&self) -> usize {
        self.wedges.len()
    }

    pub fn cell_shape(&self, cell: CellId) -> CellShape {
        self.cell_shape[cell.index()]
    }

    pub fn cell_region(&self, cell: CellId) -> i32 {
        self.cell_region[cell.index()]
    }

    pub fn vertices_of_cell(&self, cell: CellId) -> &[VertexId] {
        &self.cell_vertices[cell.index()]
    }

    pub fn faces_of_cell(&self, cell: CellId) -> &[FaceId] {
        &self.cell_faces[cell.index()]
    }

    pub fn edges_of_cell(&self, cell: CellId) -> &[EdgeId] {
        &self.cell_edges[cell.index()]
    }

    pub fn corners_of_cell(&self, cell: CellId) -> &[CornerId] {
        &self.cell_corners[cell.index()]
    }

    pub fn corners_of_vertex(&self, vertex: VertexId) -> &[CornerId] {
        &self.vertex_corners[vertex.index()]
    }

    pub fn cells_of_vertex(&self, vertex: VertexId) -> &[CellId] {
        &self.vertex_cells[vertex.index()]
    }

    pub fn faces_of_vertex(&self, vertex: VertexId) -> &[FaceId] {
        &self.vertex_faces[vertex.index()]
    }

    pub fn edges_of_vertex(&self, vertex: VertexId) -> &[EdgeId] {
        &self.vertex_edges[vertex.index()]
    }

    pub fn vertices_of_edge(&self, edge: EdgeId) -> [VertexId; 2] {
        self.edge_vertices[edge.index()]
    }

    pub fn vertices_of_face(&self, face: FaceId) -> &[VertexId] {
        &self.face_vertices[face.index()]
    }

    pub fn edges_of_face(&self, face: FaceId) -> &[EdgeId] {
        &self.face_edges[face.index()]
    }

    pub fn cells_of_face(&self, face: FaceId) -> &[CellId] {
        &self.face_cells[face.index()]
    }

    pub fn face_tag(&self, face: FaceId) -> BoundaryTagSet {
        self.face_tags[face.index()]
    }

    pub fn corner(&self, corner: CornerId) -> Corner {
        self.corners[corner.index()]
    }

    pub fn wedge(&self, wedge: WedgeId) -> Wedge {
        self.wedges[wedge.index()]
    }

    pub fn wedges_of_corner(&self, corner: CornerId) -> &[WedgeId] {
        &self.corner_wedges[corner.index()]
    }

    /// Spec §3 invariant 4: a boundary vertex has at least one incident
    /// boundary face (2D/3D) or is itself a tagged endpoint (1D).
    pub fn is_boundary_vertex(&self, vertex: VertexId) -> bool {
        match self.dim {
            Dim::One => !self.vertex_tags[vertex.index()].is_empty(),
            Dim::Two | Dim::Three => self.vertex_faces[vertex.index()]
                .iter()
                .any(|&f| !self.face_tags[f.index()].is_empty()),
        }
    }

    /// Union of boundary tags over all faces incident to `vertex` (1D: the
    /// vertex's own tag set).
    pub fn boundary_tags_of_vertex(&self, vertex: VertexId) -> BoundaryTagSet {
        match self.dim {
            Dim::One => self.vertex_tags[vertex.index()],
            Dim::Two | Dim::Three => self.vertex_faces[vertex.index()]
                .iter()
                .fold(BoundaryTagSet::EMPTY, |acc, &f| acc.union(self.face_tags[f.index()])),
        }
    }

    /// Builds the topology from an external mesh description, performing
    /// the init-time invariant checks of spec §7 (a real geometric
    /// zero-volume check happens once coordinates are available, in
    /// [`crate::cache::GeometricCache::recompute`]; here we only reject
    /// structurally degenerate rings/faces).
    pub fn build(mesh: &MeshInput) -> Result<Topology, HydroError> {
        let topology = match mesh.dim {
            Dim::One => build_1d(mesh),
            Dim::Two => build_2d(mesh),
            Dim::Three => build_3d(mesh),
        }?;
        topology.validate_no_orphans()?;
        Ok(topology)
    }

    /// Spec §3 invariant 3 ("every wedge of `cn` has `c` as its cell and `v`
    /// as its vertex") and spec §7 ("orphan corner/wedge ... fatal at
    /// init"). Construction above always derives wedges from their owning
    /// corner, so this should never trip in practice; it is kept as a cheap
    /// post-construction check rather than trusted silently, matching the
    /// spec's explicit naming of orphan entities as a fatal topology
    /// inconsistency.
    fn validate_no_orphans(&self) -> Result<(), HydroError> {
        for (i, corner) in self.corners.iter().enumerate() {
            if corner.cell.index() >= self.cell_count() || corner.vertex.index() >= self.vertex_count {
                return Err(HydroError::OrphanEntity { kind: "corner" });
            }
            for &wedge_id in &self.corner_wedges[i] {
                let wedge = &self.wedges[wedge_id.index()];
                if wedge.cell != corner.cell || wedge.vertex != corner.vertex {
                    return Err(HydroError::OrphanEntity { kind: "wedge" });
                }
            }
        }
        Ok(())
    }
}

fn vertex_ring(cell: &crate::mesh_import::CellInput) -> Vec<VertexId> {
    cell.vertex_ring.iter().map(|&v| VertexId(v)).collect()
}

/// A 2D cell ring is expected CCW; this flags rings supplied CW so the
/// caller can reverse them before edges/wedges are built, rather than
/// carrying signed areas through the rest of construction.
fn reverse_oriented_ring(mesh: &MeshInput, ring: &[VertexId]) -> bool {
    let pts: Vec<_> = ring.iter().map(|v| mesh.vertices[v.index()]).collect();
    let n = pts.len();
    let signed: f64 = (0..n)
        .map(|i| {
            let p0 = pts[i];
            let p1 = pts[(i + 1) % n];
            p0.x * p1.y - p1.x * p0.y
        })
        .sum();
    signed < 0.0
}

fn build_1d(mesh: &MeshInput) -> Result<Topology, HydroError> {
    let n_vertices = mesh.vertices.len();
    let mut cell_shape = Vec::with_capacity(mesh.cells.len());
    let mut cell_region = Vec::with_capacity(mesh.cells.len());
    let mut cell_vertices = Vec::with_capacity(mesh.cells.len());
    let mut vertex_cells = vec![Vec::new(); n_vertices];
    let mut corners = Vec::new();
    let mut cell_corners = Vec::with_capacity(mesh.cells.len());
    let mut vertex_corners = vec![Vec::new(); n_vertices];
    let mut wedges = Vec::new();
    let mut corner_wedges = Vec::new();
    let mut vertex_tags = vec![BoundaryTagSet::EMPTY; n_vertices];

    for (i, cell) in mesh.cells.iter().enumerate() {
        if cell.shape != CellShape::Line {
            return Err(HydroError::UnsupportedConfiguration(format!(
                "1D mesh cell {i} has non-Line shape {:?}",
                cell.shape
            )));
        }
        if cell.vertex_ring.len() != 2 {
            return Err(HydroError::DegenerateTopology { cell: CellId::from(i), volume: 0.0 });
        }
        let ring = vertex_ring(cell);
        let id = CellId::from(i);
        cell_shape.push(cell.shape);
        cell_region.push(cell.region_id);

        let mut this_corners = Vec::with_capacity(2);
        for &v in &ring {
            vertex_cells[v.index()].push(id);
            let corner_id = CornerId::from(corners.len());
            corners.push(Corner { cell: id, vertex: v });
            vertex_corners[v.index()].push(corner_id);
            this_corners.push(corner_id);

            let wedge_id = WedgeId::from(wedges.len());
            wedges.push(Wedge { cell: id, corner: corner_id, vertex: v, face: None, edge: None });
            corner_wedges.push(vec![wedge_id]);
        }
        cell_corners.push(this_corners);
        cell_vertices.push(ring);
    }

    for (key, tag) in &mesh.face_tags {
        if key.len() == 1 {
            vertex_tags[key[0] as usize] = vertex_tags[key[0] as usize].union(*tag);
        }
    }

    Ok(Topology {
        dim: Dim::One,
        vertex_count: n_vertices,
        edge_vertices: Vec::new(),
        face_vertices: Vec::new(),
        face_edges: Vec::new(),
        face_cells: Vec::new(),
        face_tags: Vec::new(),
        cell_shape,
        cell_region,
        cell_vertices,
        cell_faces: vec![Vec::new(); mesh.cells.len()],
        cell_edges: vec![Vec::new(); mesh.cells.len()],
        cell_corners,
        vertex_cells,
        vertex_faces: vec![Vec::new(); n_vertices],
        vertex_edges: vec![Vec::new(); n_vertices],
        vertex_corners,
        vertex_tags,
        corners,
        wedges,
        corner_wedges,
    })
}

fn build_2d(mesh: &MeshInput) -> Result<Topology, HydroError> {
    let n_vertices = mesh.vertices.len();
    let mut interner = EdgeInterner::new();

    let mut cell_shape = Vec::with_capacity(mesh.cells.len());
    let mut cell_region = Vec::with_capacity(mesh.cells.len());
    let mut cell_vertices = Vec::with_capacity(mesh.cells.len());
    let mut cell_edge_local: Vec<Vec<EdgeId>> = Vec::with_capacity(mesh.cells.len());

    for (i, cell) in mesh.cells.iter().enumerate() {
        if !cell.shape.is_2d() {
            return Err(HydroError::UnsupportedConfiguration(format!(
                "2D mesh cell {i} has non-2D shape {:?}",
                cell.shape
            )));
        }
        if cell.vertex_ring.len() < 3 {
            return Err(HydroError::DegenerateTopology { cell: CellId::from(i), volume: 0.0 });
        }
        let mut ring = vertex_ring(cell);
        if reverse_oriented_ring(mesh, &ring) {
            ring.reverse();
        }
        let n = ring.len();
        let edges: Vec<EdgeId> = (0..n).map(|j| interner.intern(ring[j], ring[(j + 1) % n])).collect();

        cell_shape.push(cell.shape);
        cell_region.push(cell.region_id);
        cell_vertices.push(ring);
        cell_edge_local.push(edges);
    }

    let edge_vertices = interner.vertices;
    let n_edges = edge_vertices.len();

    // In 2D, faces and edges are the same entity (spec §3): face i <-> edge i.
    let face_vertices: Vec<Vec<VertexId>> = edge_vertices.iter().map(|e| vec![e[0], e[1]]).collect();
    let face_edges: Vec<Vec<EdgeId>> = (0..n_edges).map(|i| vec![EdgeId::from(i)]).collect();
    let cell_faces: Vec<Vec<FaceId>> =
        cell_edge_local.iter().map(|edges| edges.iter().map(|e| FaceId::from(e.index())).collect()).collect();

    let mut face_cells: Vec<Vec<CellId>> = vec![Vec::new(); n_edges];
    for (i, edges) in cell_edge_local.iter().enumerate() {
        for &e in edges {
            face_cells[e.index()].push(CellId::from(i));
        }
    }

    let mut face_tags = vec![BoundaryTagSet::EMPTY; n_edges];
    for (key, tag) in &mesh.face_tags {
        if key.len() == 2 {
            if let Some(&id) = interner.index.get(&(key[0].min(key[1]), key[0].max(key[1]))) {
                face_tags[id.index()] = face_tags[id.index()].union(*tag);
            }
        }
    }

    let mut vertex_cells = vec![Vec::new(); n_vertices];
    let mut vertex_faces = vec![Vec::new(); n_vertices];
    let mut vertex_edges = vec![Vec::new(); n_vertices];
    for (i, ring) in cell_vertices.iter().enumerate() {
        for &v in ring {
            vertex_cells[v.index()].push(CellId::from(i));
        }
    }
    for (face_id, verts) in face_vertices.iter().enumerate() {
        for &v in verts {
            vertex_faces[v.index()].push(FaceId::from(face_id));
            vertex_edges[v.index()].push(EdgeId::from(face_id));
        }
    }

    let mut corners = Vec::new();
    let mut cell_corners = Vec::with_capacity(mesh.cells.len());
    let mut vertex_corners = vec![Vec::new(); n_vertices];
    let mut wedges = Vec::new();
    let mut corner_wedges = Vec::new();

    for (i, ring) in cell_vertices.iter().enumerate() {
        let cell_id = CellId::from(i);
        let n = ring.len();
        let edges = &cell_edge_local[i];
        let mut this_corners = Vec::with_capacity(n);
        for j in 0..n {
            let v = ring[j];
            let corner_id = CornerId::from(corners.len());
            corners.push(Corner { cell: cell_id, vertex: v });
            vertex_corners[v.index()].push(corner_id);
            this_corners.push(corner_id);

            let prev_edge = edges[(j + n - 1) % n];
            let this_edge = edges[j];
            // Tie-break: ascending (face-id, edge-id); face == edge in 2D.
            let mut incident = [prev_edge, this_edge];
            incident.sort_by_key(|e| e.0);

            let mut corner_wedge_ids = Vec::with_capacity(2);
            for e in incident {
                let wedge_id = WedgeId::from(wedges.len());
                wedges.push(Wedge {
                    cell: cell_id,
                    corner: corner_id,
                    vertex: v,
                    face: Some(FaceId::from(e.index())),
                    edge: Some(e),
                });
                corner_wedge_ids.push(wedge_id);
            }
            corner_wedges.push(corner_wedge_ids);
        }
        cell_corners.push(this_corners);
    }

    Ok(Topology {
        dim: Dim::Two,
        vertex_count: n_vertices,
        edge_vertices,
        face_vertices,
        face_edges,
        face_cells,
        face_tags,
        cell_shape,
        cell_region,
        cell_vertices,
        cell_faces,
        cell_edges: cell_edge_local,
        cell_corners,
        vertex_cells,
        vertex_faces,
        vertex_edges,
        vertex_corners,
        vertex_tags: Vec::new(),
        corners,
        wedges,
        corner_wedges,
    })
}

fn build_3d(mesh: &MeshInput) -> Result<Topology, HydroError> {
    let n_vertices = mesh.vertices.len();
    let mut interner = EdgeInterner::new();

    // Pass 1: build each cell's face list (local vertex ids) and intern edges.
    struct CellFaces {
        faces: Vec<Vec<VertexId>>,
        face_edges: Vec<Vec<EdgeId>>,
    }

    let mut cell_shape = Vec::with_capacity(mesh.cells.len());
    let mut cell_region = Vec::with_capacity(mesh.cells.len());
    let mut cell_vertices = Vec::with_capacity(mesh.cells.len());
    let mut cell_faces_data = Vec::with_capacity(mesh.cells.len());

    for (i, cell) in mesh.cells.iter().enumerate() {
        if !cell.shape.is_3d() {
            return Err(HydroError::UnsupportedConfiguration(format!(
                "3D mesh cell {i} has non-3D shape {:?}",
                cell.shape
            )));
        }
        let ring = vertex_ring(cell);
        let local_faces: Vec<Vec<usize>> = match cell.shape.face_template() {
            Some(template) => template.iter().map(|f| f.to_vec()).collect(),
            None => match &cell.explicit_faces {
                Some(faces) => faces.iter().map(|f| f.iter().map(|&v| v as usize).collect()).collect(),
                None => {
                    return Err(HydroError::UnsupportedConfiguration(format!(
                        "polyhedron cell {i} has no explicit face list"
                    )))
                }
            },
        };
        if local_faces.is_empty() {
            return Err(HydroError::DegenerateTopology { cell: CellId::from(i), volume: 0.0 });
        }

        let mut faces = Vec::with_capacity(local_faces.len());
        let mut face_edges = Vec::with_capacity(local_faces.len());
        for face in &local_faces {
            let face_verts: Vec<VertexId> = face.iter().map(|&local| ring[local]).collect();
            let n = face_verts.len();
            let edges: Vec<EdgeId> =
                (0..n).map(|j| interner.intern(face_verts[j], face_verts[(j + 1) % n])).collect();
            faces.push(face_verts);
            face_edges.push(edges);
        }

        cell_shape.push(cell.shape);
        cell_region.push(cell.region_id);
        cell_vertices.push(ring);
        cell_faces_data.push(CellFaces { faces, face_edges });
    }

    // Pass 2: dedup faces globally by vertex-set key so shared faces between
    // two cells become one entity with two owning cells.
    let mut face_index: HashMap<Vec<u32>, FaceId> = HashMap::new();
    let mut face_vertices: Vec<Vec<VertexId>> = Vec::new();
    let mut face_edges: Vec<Vec<EdgeId>> = Vec::new();
    let mut face_cells: Vec<Vec<CellId>> = Vec::new();
    let mut cell_faces: Vec<Vec<FaceId>> = Vec::with_capacity(mesh.cells.len());
    let mut cell_edges: Vec<Vec<EdgeId>> = Vec::with_capacity(mesh.cells.len());

    for (i, cf) in cell_faces_data.iter().enumerate() {
        let cell_id = CellId::from(i);
        let mut this_cell_faces = Vec::with_capacity(cf.faces.len());
        let mut this_cell_edges: Vec<EdgeId> = Vec::new();

        for (face_verts, edges) in cf.faces.iter().zip(cf.face_edges.iter()) {
            let key = face_key(&face_verts.iter().map(|v| v.0).collect::<Vec<_>>());
            let face_id = *face_index.entry(key).or_insert_with(|| {
                let id = FaceId::from(face_vertices.len());
                face_vertices.push(face_verts.clone());
                face_edges.push(edges.clone());
                face_cells.push(Vec::new());
                id
            });
            face_cells[face_id.index()].push(cell_id);
            this_cell_faces.push(face_id);
            for &e in edges {
                if !this_cell_edges.contains(&e) {
                    this_cell_edges.push(e);
                }
            }
        }
        cell_faces.push(this_cell_faces);
        cell_edges.push(this_cell_edges);
    }

    let edge_vertices = interner.vertices;
    let n_faces = face_vertices.len();

    let mut face_tags = vec![BoundaryTagSet::EMPTY; n_faces];
    for (key, tag) in &mesh.face_tags {
        if let Some(&id) = face_index.get(key) {
            face_tags[id.index()] = face_tags[id.index()].union(*tag);
        }
    }

    let mut vertex_cells = vec![Vec::new(); n_vertices];
    for (i, ring) in cell_vertices.iter().enumerate() {
        for &v in ring {
            vertex_cells[v.index()].push(CellId::from(i));
        }
    }
    let mut vertex_faces = vec![Vec::new(); n_vertices];
    for (face_id, verts) in face_vertices.iter().enumerate() {
        for &v in verts {
            vertex_faces[v.index()].push(FaceId::from(face_id));
        }
    }
    let mut vertex_edges = vec![Vec::new(); n_vertices];
    for (edge_id, verts) in edge_vertices.iter().enumerate() {
        for &v in verts {
            vertex_edges[v.index()].push(EdgeId::from(edge_id));
        }
    }

    // Corners and wedges: for corner (cell, v), each face of the cell that
    // contains v contributes exactly two wedges — one per edge of that face
    // incident to v — ordered by (face-id, edge-id) ascending (spec §4.1).
    let mut corners = Vec::new();
    let mut cell_corners = Vec::with_capacity(mesh.cells.len());
    let mut vertex_corners = vec![Vec::new(); n_vertices];
    let mut wedges = Vec::new();
    let mut corner_wedges = Vec::new();

    for (i, ring) in cell_vertices.iter().enumerate() {
        let cell_id = CellId::from(i);
        let mut this_corners = Vec::with_capacity(ring.len());

        for &v in ring {
            let corner_id = CornerId::from(corners.len());
            corners.push(Corner { cell: cell_id, vertex: v });
            vertex_corners[v.index()].push(corner_id);
            this_corners.push(corner_id);

            let mut incident_wedges: Vec<(FaceId, EdgeId)> = Vec::new();
            for &face_id in &cell_faces[i] {
                let verts = &face_vertices[face_id.index()];
                let edges = &face_edges[face_id.index()];
                let n = verts.len();
                if let Some(pos) = verts.iter().position(|&fv| fv == v) {
                    let prev_edge = edges[(pos + n - 1) % n];
                    let this_edge = edges[pos];
                    incident_wedges.push((face_id, prev_edge));
                    incident_wedges.push((face_id, this_edge));
                }
            }
            incident_wedges.sort_by_key(|&(f, e)| (f.0, e.0));

            let mut corner_wedge_ids = Vec::with_capacity(incident_wedges.len());
            for (face_id, edge_id) in incident_wedges {
                let wedge_id = WedgeId::from(wedges.len());
                wedges.push(Wedge {
                    cell: cell_id,
                    corner: corner_id,
                    vertex: v,
                    face: Some(face_id),
                    edge: Some(edge_id),
                });
                corner_wedge_ids.push(wedge_id);
            }
            corner_wedges.push(corner_wedge_ids);
        }
        cell_corners.push(this_corners);
    }

    Ok(Topology {
        dim: Dim::Three,
        vertex_count: n_vertices,
        edge_vertices,
        face_vertices,
        face_edges,
        face_cells,
        face_tags,
        cell_shape,
        cell_region,
        cell_vertices,
        cell_faces,
        cell_edges,
        cell_corners,
        vertex_cells,
        vertex_faces,
        vertex_edges,
        vertex_corners,
        vertex_tags: Vec::new(),
        corners,
        wedges,
        corner_wedges,
    })
}
