//! Geometric cache (spec §4.2): per-entity derived geometry, recomputed on
//! demand whenever vertex coordinates change. Coordinates are never stored
//! here — they live in whatever `&[DVec3]` the driver passes to
//! [`GeometricCache::recompute`], per invariant 5 (cache coherence follows
//! mutation, not the other way around).


use std::collections::HashMap;

use glam::DVec3;

use crate::error::HydroError;
use crate::geometry::{
    min_pairwise_distance, polygon2d_area_centroid, polygon3d_area_centroid_normal,
    polyhedron_volume_centroid, quad3d_area_centroid_normal, segment_length, segment_midpoint,
    triangle3d_area_centroid_normal,
};
use crate::topology::{CellId, Dim, EdgeId, FaceId, Topology, WedgeId};

/// Flips `normal` so it points away from `from` through `at`, matching the
/// "outward from its cell" requirement of spec §3 without needing every
/// shape template's local vertex ordering to be hand-verified in advance.
fn orient_outward(normal: DVec3, at: DVec3, from: DVec3) -> DVec3 {
    if normal.dot(at - from) < 0.0 {
        -normal
    } else {
        normal
    }
}

fn rotate90_xy(v: DVec3) -> DVec3 {
    DVec3::new(v.y, -v.x, 0.0)
}

#[derive(Debug, Default)]
pub struct GeometricCache {
    cell_volume: Vec<f64>,
    cell_centroid: Vec<DVec3>,
    cell_min_length: Vec<f64>,

    face_area: Vec<f64>,
    face_centroid: Vec<DVec3>,
    face_normal: Vec<DVec3>,

    edge_length: Vec<f64>,
    edge_midpoint: Vec<DVec3>,

    wedge_facet_area: Vec<f64>,
    wedge_facet_normal: Vec<DVec3>,
    wedge_facet_centroid: Vec<DVec3>,
}

impl GeometricCache {
    /// Allocates zeroed storage sized to `topology`. Call [`Self::recompute`]
    /// before reading anything back.
    pub fn new(topology: &Topology) -> Self {
        Self {
            cell_volume: vec![0.0; topology.cell_count()],
            cell_centroid: vec![DVec3::ZERO; topology.cell_count()],
            cell_min_length: vec![0.0; topology.cell_count()],
            face_area: vec![0.0; topology.face_count()],
            face_centroid: vec![DVec3::ZERO; topology.face_count()],
            face_normal: vec![DVec3::ZERO; topology.face_count()],
            edge_length: vec![0.0; topology.edge_count()],
            edge_midpoint: vec![DVec3::ZERO; topology.edge_count()],
            wedge_facet_area: vec![0.0; topology.wedge_count()],
            wedge_facet_normal: vec![DVec3::ZERO; topology.wedge_count()],
            wedge_facet_centroid: vec![DVec3::ZERO; topology.wedge_count()],
        }
    }

    pub fn cell_volume(&self, cell: CellId) -> f64 {
        self.cell_volume[cell.index()]
    }

    pub fn cell_centroid(&self, cell: CellId) -> DVec3 {
        self.cell_centroid[cell.index()]
    }

    pub fn cell_min_length(&self, cell: CellId) -> f64 {
        self.cell_min_length[cell.index()]
    }

    pub fn face_area(&self, face: FaceId) -> f64 {
        self.face_area[face.index()]
    }

    pub fn face_centroid(&self, face: FaceId) -> DVec3 {
        self.face_centroid[face.index()]
    }

    pub fn face_normal(&self, face: FaceId) -> DVec3 {
        self.face_normal[face.index()]
    }

    pub fn edge_length(&self, edge: EdgeId) -> f64 {
        self.edge_length[edge.index()]
    }

    pub fn edge_midpoint(&self, edge: EdgeId) -> DVec3 {
        self.edge_midpoint[edge.index()]
    }

    pub fn wedge_facet_area(&self, wedge: WedgeId) -> f64 {
        self.wedge_facet_area[wedge.index()]
    }

    pub fn wedge_facet_normal(&self, wedge: WedgeId) -> DVec3 {
        self.wedge_facet_normal[wedge.index()]
    }

    pub fn wedge_facet_centroid(&self, wedge: WedgeId) -> DVec3 {
        self.wedge_facet_centroid[wedge.index()]
    }

    /// Recomputes every cached quantity from `coords`. The only mutator on
    /// this type; called once per mesh-motion step by the driver.
    pub fn recompute(&mut self, topology: &Topology, coords: &[DVec3]) -> Result<(), HydroError> {
        match topology.dim() {
            Dim::One => self.recompute_1d(topology, coords),
            Dim::Two => self.recompute_2d(topology, coords),
            Dim::Three => self.recompute_3d(topology, coords),
        }
    }

    fn recompute_1d(&mut self, topology: &Topology, coords: &[DVec3]) -> Result<(), HydroError> {
        for i in 0..topology.cell_count() {
            let cell = CellId::from(i);
            let verts = topology.vertices_of_cell(cell);
            let (a, b) = (coords[verts[0].index()], coords[verts[1].index()]);
            let length = segment_length(a, b);
            if length <= 0.0 {
                return Err(HydroError::DegenerateTopology { cell, volume: length });
            }
            self.cell_volume[i] = length;
            self.cell_centroid[i] = segment_midpoint(a, b);
            self.cell_min_length[i] = length;

            for &corner in topology.corners_of_cell(cell) {
                for &wedge_id in topology.wedges_of_corner(corner) {
                    let wedge = topology.wedge(wedge_id);
                    let vertex_pos = coords[wedge.vertex.index()];
                    let normal = (vertex_pos - self.cell_centroid[i]).normalize_or_zero();
                    self.wedge_facet_area[wedge_id.index()] = 1.0;
                    self.wedge_facet_normal[wedge_id.index()] = normal;
                    self.wedge_facet_centroid[wedge_id.index()] = vertex_pos;
                }
            }
        }
        Ok(())
    }

    fn recompute_2d(&mut self, topology: &Topology, coords: &[DVec3]) -> Result<(), HydroError> {
        for i in 0..topology.edge_count() {
            let edge = EdgeId::from(i);
            let verts = topology.vertices_of_edge(edge);
            let (a, b) = (coords[verts[0].index()], coords[verts[1].index()]);
            self.edge_length[i] = segment_length(a, b);
            self.edge_midpoint[i] = segment_midpoint(a, b);
        }

        for i in 0..topology.cell_count() {
            let cell = CellId::from(i);
            let cverts = topology.vertices_of_cell(cell);
            let points: Vec<DVec3> = cverts.iter().map(|&v| coords[v.index()]).collect();
            let (area, centroid) = polygon2d_area_centroid(&points);
            if area <= 0.0 {
                return Err(HydroError::DegenerateTopology { cell, volume: area });
            }
            self.cell_volume[i] = area;
            self.cell_centroid[i] = centroid;
            self.cell_min_length[i] = min_pairwise_distance(&points);
        }

        for i in 0..topology.face_count() {
            let face = FaceId::from(i);
            let edge = EdgeId::from(i);
            self.face_area[i] = self.edge_length[edge.index()];
            self.face_centroid[i] = self.edge_midpoint[edge.index()];

            let verts = topology.vertices_of_face(face);
            let raw_normal = rotate90_xy(coords[verts[1].index()] - coords[verts[0].index()]).normalize_or_zero();
            let primary_cell = topology.cells_of_face(face)[0];
            self.face_normal[i] = orient_outward(raw_normal, self.face_centroid[i], self.cell_centroid[primary_cell.index()]);
        }

        for i in 0..topology.cell_count() {
            let cell = CellId::from(i);
            let centroid = self.cell_centroid[i];

            for &corner in topology.corners_of_cell(cell) {
                let vertex = topology.corner(corner).vertex;
                for &wedge_id in topology.wedges_of_corner(corner) {
                    let wedge = topology.wedge(wedge_id);
                    let edge = wedge.edge.expect("2D wedge always carries an edge");
                    let edge_mid = self.edge_midpoint[edge.index()];
                    let vertex_pos = coords[vertex.index()];
                    let facet_centroid = segment_midpoint(vertex_pos, edge_mid);
                    let raw_normal = rotate90_xy(edge_mid - vertex_pos).normalize_or_zero();
                    let normal = orient_outward(raw_normal, facet_centroid, centroid);
                    self.wedge_facet_area[wedge_id.index()] = 0.5 * self.edge_length[edge.index()];
                    self.wedge_facet_normal[wedge_id.index()] = normal;
                    self.wedge_facet_centroid[wedge_id.index()] = facet_centroid;
                }
            }
        }
        Ok(())
    }

    fn recompute_3d(&mut self, topology: &Topology, coords: &[DVec3]) -> Result<(), HydroError> {
        for i in 0..topology.edge_count() {
            let edge = EdgeId::from(i);
            let verts = topology.vertices_of_edge(edge);
            let (a, b) = (coords[verts[0].index()], coords[verts[1].index()]);
            self.edge_length[i] = segment_length(a, b);
            self.edge_midpoint[i] = segment_midpoint(a, b);
        }

        for i in 0..topology.cell_count() {
            let cell = CellId::from(i);
            let cverts = topology.vertices_of_cell(cell);
            let cell_points: Vec<DVec3> = cverts.iter().map(|&v| coords[v.index()]).collect();
            let local_index: HashMap<_, _> =
                cverts.iter().enumerate().map(|(local, &v)| (v, local)).collect();
            let faces_local: Vec<Vec<usize>> = topology
                .faces_of_cell(cell)
                .iter()
                .map(|&f| topology.vertices_of_face(f).iter().map(|v| local_index[v]).collect())
                .collect();
            let (volume, centroid) = polyhedron_volume_centroid(&cell_points, &faces_local);
            if volume <= 0.0 {
                return Err(HydroError::DegenerateTopology { cell, volume });
            }
            self.cell_volume[i] = volume;
            self.cell_centroid[i] = centroid;
            self.cell_min_length[i] = min_pairwise_distance(&cell_points);
        }

        for i in 0..topology.face_count() {
            let face = FaceId::from(i);
            let verts = topology.vertices_of_face(face);
            let points: Vec<DVec3> = verts.iter().map(|&v| coords[v.index()]).collect();
            let (area, centroid, normal) = match points.len() {
                3 => triangle3d_area_centroid_normal(points[0], points[1], points[2]),
                4 => quad3d_area_centroid_normal([points[0], points[1], points[2], points[3]]),
                _ => polygon3d_area_centroid_normal(&points),
            };
            let primary_cell = topology.cells_of_face(face)[0];
            self.face_area[i] = area;
            self.face_centroid[i] = centroid;
            self.face_normal[i] = orient_outward(normal, centroid, self.cell_centroid[primary_cell.index()]);
        }

        for i in 0..topology.cell_count() {
            let cell = CellId::from(i);
            let centroid = self.cell_centroid[i];

            for &corner in topology.corners_of_cell(cell) {
                let vertex = topology.corner(corner).vertex;
                let vertex_pos = coords[vertex.index()];
                for &wedge_id in topology.wedges_of_corner(corner) {
                    let wedge = topology.wedge(wedge_id);
                    let face = wedge.face.expect("3D wedge always carries a face");
                    let edge = wedge.edge.expect("3D wedge always carries an edge");
                    let edge_mid = self.edge_midpoint[edge.index()];
                    let face_centroid = self.face_centroid[face.index()];

                    // Each of a corner's two wedges at this face owns one
                    // half of the (vertex, face-centroid) quad — the
                    // triangle toward its own edge, not the full quad —
                    // else the two wedges would double-count the quad's
                    // area (spec §3 invariant 2 requires the wedge facets
                    // to tile the cell, not overlap).
                    let (facet_area, facet_centroid, raw_normal) =
                        triangle3d_area_centroid_normal(vertex_pos, edge_mid, face_centroid);
                    let normal = orient_outward(raw_normal, facet_centroid, centroid);
                    self.wedge_facet_area[wedge_id.index()] = facet_area;
                    self.wedge_facet_normal[wedge_id.index()] = normal;
                    self.wedge_facet_centroid[wedge_id.index()] = facet_centroid;
                }
            }
        }
        Ok(())
    }
}
