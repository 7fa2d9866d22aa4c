//! The time integration driver (spec §4.8): couples the nodal solve, the
//! subcell force evaluation, the cell state update, the mesh motion and the
//! CFL-limited step-size control into the predictor-corrector loop.
//!
//! ```text
//! save_coords;  save_state
//! solve_nodal  ;  force  ;  Δt = step_size()
//! apply_update(½Δt)  ;  move_mesh(½Δt)
//! solve_nodal  ;  force
//! restore_coords  ;  restore_state
//! apply_update(Δt)  ;  move_mesh(Δt)
//! ```
//! The half-step gives a better estimate of the nodal velocity; the final
//! update is applied from the original (saved) state so the scheme stays
//! conservative in mass, momentum and energy.


use glam::DVec3;
use tracing::{debug_span, error, info, instrument, warn};

use crate::boundary::BoundaryMap;
use crate::cache::GeometricCache;
use crate::config::{Config, Scenario};
use crate::eos::EquationOfState;
use crate::error::HydroError;
use crate::force;
use crate::mesh_import::MeshInput;
use crate::nodal;
use crate::output::{OutputFrame, OutputWriter};
use crate::state::{self, HydroFields, StateStore};
use crate::timestep::{self, DEFAULT_DT_FLOOR};
use crate::topology::{CellId, Topology};

/// Read-only run-progress snapshot (SPEC_FULL §4.8). Not named in spec.md's
/// list of data structures, but every driver of this class surfaces step
/// count, simulation time and the winning CFL limiter to its caller.
#[derive(Copy, Clone, Debug, Default)]
pub struct DriverStats {
    pub step: u64,
    pub time: f64,
    pub last_dt: f64,
    pub last_limiter: &'static str,
}

/// Owns the mesh coordinates, topology, geometric cache and state store for
/// one run and drives the predictor-corrector loop above.
pub struct Driver<'a, E, W>
where
    E: EquationOfState,
    W: OutputWriter,
{
    topology: Topology,
    coords: Vec<DVec3>,
    coords_snapshot: Vec<DVec3>,
    cache: GeometricCache,
    store: StateStore,
    fields: HydroFields,
    region: Vec<i32>,
    eos: E,
    boundary_map: BoundaryMap,
    config: Config,
    writer: &'a mut W,
    stats: DriverStats,
    last_dt: f64,
}

impl<'a, E, W> Driver<'a, E, W>
where
    E: EquationOfState,
    W: OutputWriter,
{
    /// Composes `Topology::build -> init_fields` and closes the initial
    /// cell state from `ics` at `t=0` (spec §6 `load_config -> build_topology
    /// -> allocate_state`).
    pub fn new(config: Config, mesh: &MeshInput, scenario: Scenario, eos: E, writer: &'a mut W) -> Result<Self, HydroError> {
        scenario.boundary_map.validate_all()?;

        let topology = Topology::build(mesh)?;
        let coords = mesh.vertices.clone();
        let mut cache = GeometricCache::new(&topology);
        cache.recompute(&topology, &coords)?;

        let (mut store, fields) = state::init_fields(&topology);
        let region: Vec<i32> = (0..topology.cell_count()).map(|i| topology.cell_region(CellId::from(i))).collect();

        for i in 0..topology.cell_count() {
            let cell = CellId::from(i);
            let x = cache.cell_centroid(cell);
            let (density, velocity, pressure) = (scenario.initial_conditions)(x, 0.0);
            let eos_state = eos.update_from_pressure(density, pressure);
            let volume = cache.cell_volume(cell);
            let mass = density * volume;

            store.scalar_mut(fields.mass)[i] = mass;
            store.vector_mut(fields.momentum)[i] = velocity * mass;
            store.scalar_mut(fields.total_energy)[i] = mass * (eos_state.internal_energy + 0.5 * velocity.length_squared());
            store.scalar_mut(fields.density)[i] = density;
            store.vector_mut(fields.velocity)[i] = velocity;
            store.scalar_mut(fields.internal_energy)[i] = eos_state.internal_energy;
            store.scalar_mut(fields.pressure)[i] = eos_state.pressure;
            store.scalar_mut(fields.sound_speed)[i] = eos_state.sound_speed;
            store.scalar_mut(fields.temperature)[i] = eos_state.temperature;
        }

        Ok(Self {
            coords_snapshot: coords.clone(),
            coords,
            topology,
            cache,
            store,
            fields,
            region,
            eos,
            boundary_map: scenario.boundary_map,
            config,
            writer,
            stats: DriverStats::default(),
            // No previous Δt exists for the first step; an infinite previous
            // value keeps the growth limiter (spec §4.7) from binding before
            // there is anything to grow from.
            last_dt: f64::INFINITY,
        })
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn coords(&self) -> &[DVec3] {
        &self.coords
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn fields(&self) -> &HydroFields {
        &self.fields
    }

    /// Runs one predictor-corrector cycle starting at simulation time `t`,
    /// advancing `self.stats` on success.
    #[instrument(skip_all, fields(step = self.stats.step))]
    pub fn step(&mut self, time: f64) -> Result<(), HydroError> {
        self.coords_snapshot.copy_from_slice(&self.coords);
        self.store.copy_scalar(self.fields.mass, self.fields.mass_snapshot);
        self.store.copy_vector(self.fields.momentum, self.fields.momentum_snapshot);
        self.store.copy_scalar(self.fields.total_energy, self.fields.total_energy_snapshot);

        let predictor_velocity = {
            let _span = debug_span!("solve_nodal", half_step = false).entered();
            nodal::solve_nodal_velocities(
                &self.topology,
                &self.cache,
                &self.coords,
                &self.store,
                &self.fields,
                &self.boundary_map,
                time,
            )?
        };
        let predictor_residuals = {
            let _span = debug_span!("force", half_step = false).entered();
            force::compute_residuals(&self.topology, &self.cache, &self.store, &self.fields, &predictor_velocity)
        };

        let (dt, limiter) = timestep::select_step_size(
            &self.topology,
            &self.cache,
            &self.store,
            &self.fields,
            &predictor_residuals,
            self.last_dt,
            self.config.cfl.into(),
            DEFAULT_DT_FLOOR,
        )?;

        {
            let _span = debug_span!("apply_update", half_step = true).entered();
            force::apply_update(&mut self.store, &self.fields, &predictor_residuals, 0.5 * dt);
        }
        self.move_mesh(&predictor_velocity, 0.5 * dt)?;
        force::close_cell_state(&self.topology, &self.cache, &mut self.store, &self.fields, &self.eos)?;

        let corrector_velocity = {
            let _span = debug_span!("solve_nodal", half_step = true).entered();
            nodal::solve_nodal_velocities(
                &self.topology,
                &self.cache,
                &self.coords,
                &self.store,
                &self.fields,
                &self.boundary_map,
                time + 0.5 * dt,
            )?
        };
        let corrector_residuals = {
            let _span = debug_span!("force", half_step = true).entered();
            force::compute_residuals(&self.topology, &self.cache, &self.store, &self.fields, &corrector_velocity)
        };

        self.coords.copy_from_slice(&self.coords_snapshot);
        self.store.copy_scalar(self.fields.mass_snapshot, self.fields.mass);
        self.store.copy_vector(self.fields.momentum_snapshot, self.fields.momentum);
        self.store.copy_scalar(self.fields.total_energy_snapshot, self.fields.total_energy);
        self.cache.recompute(&self.topology, &self.coords)?;
        force::close_cell_state(&self.topology, &self.cache, &mut self.store, &self.fields, &self.eos)?;

        {
            let _span = debug_span!("apply_update", half_step = false).entered();
            force::apply_update(&mut self.store, &self.fields, &corrector_residuals, dt);
        }
        self.move_mesh(&corrector_velocity, dt)?;
        force::close_cell_state(&self.topology, &self.cache, &mut self.store, &self.fields, &self.eos)?;

        self.last_dt = dt;
        self.stats = DriverStats { step: self.stats.step + 1, time: time + dt, last_dt: dt, last_limiter: limiter };
        Ok(())
    }

    fn move_mesh(&mut self, nodal_velocity: &[DVec3], dt: f64) -> Result<(), HydroError> {
        let _span = debug_span!("move_mesh").entered();
        for (coord, &u) in self.coords.iter_mut().zip(nodal_velocity) {
            *coord += u * dt;
        }
        self.cache.recompute(&self.topology, &self.coords)
    }

    /// Writes the current state through the configured [`OutputWriter`]. A
    /// writer failure is logged and the run continues (spec §7), never
    /// propagated as a fatal error.
    fn emit_output(&mut self) {
        let frame = OutputFrame {
            step: self.stats.step,
            time: self.stats.time,
            coords: &self.coords,
            velocity: self.store.vector(self.fields.velocity),
            pressure: self.store.scalar(self.fields.pressure),
            density: self.store.scalar(self.fields.density),
            internal_energy: self.store.scalar(self.fields.internal_energy),
            temperature: self.store.scalar(self.fields.temperature),
            sound_speed: self.store.scalar(self.fields.sound_speed),
            region: &self.region,
        };
        if let Err(err) = self.writer.write_step(&frame) {
            warn!(step = self.stats.step, error = %err, "output writer failed, continuing run");
        } else {
            info!(step = self.stats.step, time = self.stats.time, "wrote output frame");
        }
    }

    /// Runs to `t >= final_time` or `step >= max_steps` (spec §4.8,
    /// "termination"), dumping output every `output_freq` steps (`0`
    /// disables periodic output; an initial dump at step 0 is still
    /// emitted whenever output is enabled at all).
    pub fn run_to_completion(&mut self) -> Result<DriverStats, HydroError> {
        if self.config.output_freq > 0 {
            self.emit_output();
        }

        let mut time = 0.0;
        while time < self.config.final_time && self.stats.step < self.config.max_steps {
            if let Err(err) = self.step(time) {
                error!(step = self.stats.step, error = %err, "fatal error, aborting run");
                return Err(err);
            }
            time = self.stats.time;

            if self.config.output_freq > 0 && self.stats.step % self.config.output_freq == 0 {
                self.emit_output();
            }
        }

        Ok(self.stats)
    }
}

/// Runs `load_config -> build_topology -> allocate_state -> run_driver ->
/// shutdown` end to end (spec §6 "process lifecycle"). `Ok` maps to exit
/// code 0 and `Err` to nonzero for a caller binary, which is out of scope
/// here per spec §1.
pub fn run<E, W>(config: Config, mesh: &MeshInput, scenario: Scenario, eos: E, writer: &mut W) -> Result<DriverStats, HydroError>
where
    E: EquationOfState,
    W: OutputWriter,
{
    let mut driver = Driver::new(config, mesh, scenario, eos, writer)?;
    driver.run_to_completion()
}
