//! CFL-limited step-size control (spec §4.7): acoustic, volumetric and
//! growth limiters combined by taking the minimum, with the selected
//! limiter's name surfaced for diagnostics.


use crate::cache::GeometricCache;
use crate::error::HydroError;
use crate::force::CellResidual;
use crate::state::{HydroFields, StateStore};
use crate::topology::{CellId, Topology};

/// The three CFL multipliers (spec §6/§9 `CFL.{acoustic,volume,growth}`).
#[derive(Copy, Clone, Debug)]
pub struct CflLimits {
    pub acoustic: f64,
    pub volume: f64,
    pub growth: f64,
}

/// A `Δt` that underflows `floor` is fatal (spec §7 "numerical exhaustion").
/// Not part of the spec's enumerated configuration; chosen as an
/// implementation safety net rather than a tunable physical quantity.
pub const DEFAULT_DT_FLOOR: f64 = 1e-12;

/// Picks the next `Δt` and names the limiter that produced it. Ties are
/// broken acoustic, then volumetric, then growth (spec §4.7), by checking
/// them in that order and only replacing the running minimum on a strict
/// improvement.
pub fn select_step_size(
    topology: &Topology,
    cache: &GeometricCache,
    store: &StateStore,
    fields: &HydroFields,
    residuals: &[CellResidual],
    previous_dt: f64,
    limits: CflLimits,
    floor: f64,
) -> Result<(f64, &'static str), HydroError> {
    let sound_speed = store.scalar(fields.sound_speed);

    let mut dt_acoustic = f64::INFINITY;
    for i in 0..topology.cell_count() {
        let cell = CellId::from(i);
        let l_c = cache.cell_min_length(cell);
        let c_c = sound_speed[i];
        if c_c > 0.0 {
            dt_acoustic = dt_acoustic.min(l_c / c_c);
        }
    }
    dt_acoustic *= limits.acoustic;

    let mut dt_volumetric = f64::INFINITY;
    for i in 0..topology.cell_count() {
        let cell = CellId::from(i);
        let rate = residuals[i].d_volume_dt;
        if rate != 0.0 {
            let v_c = cache.cell_volume(cell);
            dt_volumetric = dt_volumetric.min(v_c / rate.abs());
        }
    }
    dt_volumetric *= limits.volume;

    let dt_growth = (1.0 + limits.growth) * previous_dt;

    let mut dt = dt_acoustic;
    let mut limiter = "acoustic";
    if dt_volumetric < dt {
        dt = dt_volumetric;
        limiter = "volumetric";
    }
    if dt_growth < dt {
        dt = dt_growth;
        limiter = "growth";
    }

    if !(dt > floor) {
        return Err(HydroError::TimeStepUnderflow { dt, floor, limiter });
    }

    Ok((dt, limiter))
}
