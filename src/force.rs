//! Subcell force and conservative cell update (spec §4.6).

#[cfg(test)]
mod tests;

use glam::DVec3;
use rayon::prelude::*;

use crate::cache::GeometricCache;
use crate::eos::EquationOfState;
use crate::error::HydroError;
use crate::nodal::dvec3_to_dyn;
use crate::state::{HydroFields, StateStore};
use crate::topology::{CellId, Topology};

/// One cell's conservative time-derivatives, `d(Mu)/dt`, `d(ME)/dt` and
/// `dV/dt` (spec §4.6). Mass is invariant under Lagrangian motion, so no
/// `dM/dt` is carried.
#[derive(Copy, Clone, Debug, Default)]
pub struct CellResidual {
    pub d_momentum_dt: DVec3,
    pub d_energy_dt: f64,
    pub d_volume_dt: f64,
}

/// Computes every cell's residual from the subcell forces `F_cn = p_c·N_cn +
/// M_cn·(u_c − u_v)` (spec §4.6), in parallel over cells.
pub fn compute_residuals(
    topology: &Topology,
    cache: &GeometricCache,
    store: &StateStore,
    fields: &HydroFields,
    nodal_velocity: &[DVec3],
) -> Vec<CellResidual> {
    let dim = topology.dim().value();
    let density = store.scalar(fields.density);
    let velocity = store.vector(fields.velocity);
    let pressure = store.scalar(fields.pressure);
    let sound_speed = store.scalar(fields.sound_speed);

    (0..topology.cell_count())
        .into_par_iter()
        .map(|i| {
            let cell = CellId::from(i);
            let z = density[i] * sound_speed[i];
            let u_c = velocity[i];

            let mut d_momentum_dt = DVec3::ZERO;
            let mut d_energy_dt = 0.0;
            let mut d_volume_dt = 0.0;

            for &corner in topology.corners_of_cell(cell) {
                let corner_data = topology.corner(corner);
                let (m_cn, n_cn) = crate::nodal::corner_impedance(topology, cache, corner, z, dim);
                let u_v = nodal_velocity[corner_data.vertex.index()];
                let u_v_dyn = dvec3_to_dyn(u_v, dim);
                let u_c_dyn = dvec3_to_dyn(u_c, dim);

                let f_cn_dyn = &n_cn * pressure[i] + &m_cn * (u_c_dyn - &u_v_dyn);
                let f_cn = crate::nodal::dyn_to_dvec3(&f_cn_dyn, dim);

                d_momentum_dt -= f_cn;
                d_energy_dt -= f_cn.dot(u_v);
                d_volume_dt += n_cn.dot(&u_v_dyn);
            }

            CellResidual { d_momentum_dt, d_energy_dt, d_volume_dt }
        })
        .collect()
}

/// Advances momentum and total energy by `dt · residual` (spec §4.6). Mass is
/// untouched; volume follows from the moved mesh, not from `dV/dt`.
pub fn apply_update(store: &mut StateStore, fields: &HydroFields, residuals: &[CellResidual], dt: f64) {
    let momentum = store.vector_mut(fields.momentum);
    for (slot, residual) in momentum.iter_mut().zip(residuals) {
        *slot += residual.d_momentum_dt * dt;
    }
    let energy = store.scalar_mut(fields.total_energy);
    for (slot, residual) in energy.iter_mut().zip(residuals) {
        *slot += residual.d_energy_dt * dt;
    }
}

/// Closes the cell state after the mesh has moved and conserved quantities
/// have been updated: `ρ = M/V`, `u = (Mu)/M`, `e = (ME)/M − ½|u|²`, then the
/// equation of state supplies `p`, `c`, `T` (spec §4.6).
pub fn close_cell_state(
    topology: &Topology,
    cache: &GeometricCache,
    store: &mut StateStore,
    fields: &HydroFields,
    eos: &dyn EquationOfState,
) -> Result<(), HydroError> {
    for i in 0..topology.cell_count() {
        let cell = CellId::from(i);
        let volume = cache.cell_volume(cell);
        let mass = store.scalar(fields.mass)[i];
        if volume <= 0.0 {
            return Err(HydroError::NonPositiveState { cell, field: "volume", value: volume, limiter: "cell_update" });
        }

        let density = mass / volume;
        if density <= 0.0 {
            return Err(HydroError::NonPositiveState { cell, field: "density", value: density, limiter: "cell_update" });
        }

        let momentum = store.vector(fields.momentum)[i];
        let velocity = momentum / mass;
        let total_energy = store.scalar(fields.total_energy)[i];
        let internal_energy = total_energy / mass - 0.5 * velocity.length_squared();

        let eos_state = eos.update_from_energy(density, internal_energy);
        if eos_state.pressure <= 0.0 {
            return Err(HydroError::NonPositiveState { cell, field: "pressure", value: eos_state.pressure, limiter: "cell_update" });
        }

        store.scalar_mut(fields.density)[i] = density;
        store.vector_mut(fields.velocity)[i] = velocity;
        store.scalar_mut(fields.internal_energy)[i] = internal_energy;
        store.scalar_mut(fields.pressure)[i] = eos_state.pressure;
        store.scalar_mut(fields.sound_speed)[i] = eos_state.sound_speed;
        store.scalar_mut(fields.temperature)[i] = eos_state.temperature;
    }
    Ok(())
}
