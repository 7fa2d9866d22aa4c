//! The nodal solver (spec §4.5): per-corner impedance assembly, per-vertex
//! system assembly, boundary-condition application, and the saddle-point
//! solve that produces the nodal velocity field.


use std::collections::BTreeMap;

use glam::DVec3;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::boundary::BoundaryMap;
use crate::cache::GeometricCache;
use crate::error::HydroError;
use crate::linalg::solve_nodal_system;
use crate::state::{HydroFields, StateStore};
use crate::topology::{Topology, VertexId};

pub(crate) fn dvec3_to_dyn(v: DVec3, dim: usize) -> DVector<f64> {
    match dim {
        1 => DVector::from_row_slice(&[v.x]),
        2 => DVector::from_row_slice(&[v.x, v.y]),
        _ => DVector::from_row_slice(&[v.x, v.y, v.z]),
    }
}

pub(crate) fn dyn_to_dvec3(v: &DVector<f64>, dim: usize) -> DVec3 {
    match dim {
        1 => DVec3::new(v[0], 0.0, 0.0),
        2 => DVec3::new(v[0], v[1], 0.0),
        _ => DVec3::new(v[0], v[1], v[2]),
    }
}

/// Assembles one corner's impedance matrix and area-weighted normal sum,
/// `M_cn = Σ_w z·ℓ_w·(n_w⊗n_w)` and `N_cn = Σ_w ℓ_w·n_w` (spec §4.5), with no
/// boundary-condition adjustment. Shared between the nodal solve (which
/// additionally folds in boundary conditions) and the subcell force
/// computation (spec §4.6), which needs the same two quantities per corner.
pub(crate) fn corner_impedance(
    topology: &Topology,
    cache: &GeometricCache,
    corner: crate::topology::CornerId,
    z: f64,
    dim: usize,
) -> (DMatrix<f64>, DVector<f64>) {
    let mut m_cn = DMatrix::<f64>::zeros(dim, dim);
    let mut n_cn = DVector::<f64>::zeros(dim);
    for &wedge_id in topology.wedges_of_corner(corner) {
        let area = cache.wedge_facet_area(wedge_id);
        let normal = dvec3_to_dyn(cache.wedge_facet_normal(wedge_id), dim);
        let outer = normal.clone() * normal.transpose();
        m_cn += outer * (z * area);
        n_cn += normal * area;
    }
    (m_cn, n_cn)
}

/// Solves for the nodal velocity at every vertex, in parallel (spec §4.5
/// "embarrassingly parallel over vertices"; spec §5 bulk-synchronous phase).
/// Returns a dense per-vertex array the driver writes back into the state
/// store's `nodal_velocity` field.
pub fn solve_nodal_velocities(
    topology: &Topology,
    cache: &GeometricCache,
    coords: &[DVec3],
    store: &StateStore,
    fields: &HydroFields,
    boundary_map: &BoundaryMap,
    time: f64,
) -> Result<Vec<DVec3>, HydroError> {
    let dim = topology.dim().value();
    let density = store.scalar(fields.density);
    let velocity = store.vector(fields.velocity);
    let pressure = store.scalar(fields.pressure);
    let sound_speed = store.scalar(fields.sound_speed);

    (0..topology.vertex_count())
        .into_par_iter()
        .map(|i| {
            solve_vertex(
                VertexId::from(i),
                dim,
                topology,
                cache,
                coords,
                density,
                velocity,
                pressure,
                sound_speed,
                boundary_map,
                time,
            )
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn solve_vertex(
    vertex: VertexId,
    dim: usize,
    topology: &Topology,
    cache: &GeometricCache,
    coords: &[DVec3],
    density: &[f64],
    velocity: &[DVec3],
    pressure: &[f64],
    sound_speed: &[f64],
    boundary_map: &BoundaryMap,
    time: f64,
) -> Result<DVec3, HydroError> {
    let tags = topology.boundary_tags_of_vertex(vertex);
    let x_v = coords[vertex.index()];

    for tag in tags.iter() {
        if let Some(condition) = boundary_map.get(tag) {
            if let Some(velocity_fn) = &condition.velocity {
                return Ok(velocity_fn(x_v, time));
            }
        }
    }

    let mut m_v = DMatrix::<f64>::zeros(dim, dim);
    let mut b_v = DVector::<f64>::zeros(dim);
    let mut symmetry: BTreeMap<u32, DVector<f64>> = BTreeMap::new();

    for &corner in topology.corners_of_vertex(vertex) {
        let corner_data = topology.corner(corner);
        let cell = corner_data.cell;
        let z = density[cell.index()] * sound_speed[cell.index()];

        let (m_cn, n_cn) = corner_impedance(topology, cache, corner, z, dim);

        for &wedge_id in topology.wedges_of_corner(corner) {
            let wedge = topology.wedge(wedge_id);
            let area = cache.wedge_facet_area(wedge_id);
            let normal = dvec3_to_dyn(cache.wedge_facet_normal(wedge_id), dim);

            // In 2D/3D a wedge's boundary tags come from its face; in 1D a
            // wedge carries no face (spec §3: "in 1D neither exists"), so
            // the tag set is the vertex's own (already resolved above as
            // `tags`, since a 1D boundary vertex *is* the tagged entity).
            let wedge_tags = match wedge.face {
                Some(face) => topology.face_tag(face),
                None => tags,
            };
            if !wedge_tags.is_empty() {
                let facet_pos = cache.wedge_facet_centroid(wedge_id);
                for tag in wedge_tags.iter() {
                    let Some(condition) = boundary_map.get(tag) else { continue };
                    if let Some(pressure_fn) = &condition.pressure {
                        let p_bc = pressure_fn(facet_pos, time);
                        b_v -= normal.clone() * (area * p_bc);
                    }
                    if condition.symmetry {
                        let entry = symmetry.entry(tag.0).or_insert_with(|| DVector::zeros(dim));
                        *entry += normal.clone() * area;
                    }
                }
            }
        }

        let u_c = dvec3_to_dyn(velocity[cell.index()], dim);
        b_v += &n_cn * pressure[cell.index()] + &m_cn * u_c;
        m_v += m_cn;
    }

    let constraints: Vec<DVector<f64>> = symmetry.into_values().collect();
    let solution = solve_nodal_system(dim, &m_v, &b_v, &constraints)
        .ok_or_else(|| HydroError::DegenerateNodalSystem { vertex, tags: tags.iter().map(|t| t.0).collect() })?;
    Ok(dyn_to_dvec3(&solution, dim))
}
