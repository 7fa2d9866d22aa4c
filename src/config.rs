//! Run configuration (spec §9, §6): the serializable half of a run's setup.
//! Initial conditions and boundary condition closures cannot round-trip
//! through `serde` and live in [`Scenario`] instead, supplied by the caller
//! alongside a deserialized `Config`.


use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryMap;
use crate::eos::IdealGasEos;
use crate::timestep::CflLimits;

/// `CFL.{acoustic,volume,growth}` (spec §9): positive multipliers for the
/// three time-step limiters.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct CflConfig {
    pub acoustic: f64,
    pub volume: f64,
    pub growth: f64,
}

impl From<CflConfig> for CflLimits {
    fn from(cfl: CflConfig) -> Self {
        CflLimits { acoustic: cfl.acoustic, volume: cfl.volume, growth: cfl.growth }
    }
}

/// The only EOS kind the spec names (spec §9: `eos: {kind: ideal_gas,
/// gas_constant, specific_heat}`); an unrecognized `kind` is a `serde`
/// deserialization error, which is the idiomatic rendering of "Unsupported
/// EOS ... kind is fatal at configuration time" (spec §7).
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EosKind {
    IdealGas,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct EosConfig {
    pub kind: EosKind,
    pub gamma: f64,
    pub gas_constant: f64,
    pub specific_heat: f64,
}

impl EosConfig {
    pub fn build(&self) -> IdealGasEos {
        let EosKind::IdealGas = self.kind;
        IdealGasEos::new(self.gamma, self.gas_constant, self.specific_heat)
    }
}

/// The writer-selecting extension named by `postfix` (spec §9: `{exo, g,
/// vtk, vtu, vtm, dat, plt}`).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Exo,
    G,
    Vtk,
    Vtu,
    Vtm,
    Dat,
    Plt,
}

/// The serializable part of a run's configuration (spec §9). `0` disables
/// periodic output for `output_freq`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub prefix: String,
    pub postfix: OutputFormat,
    pub output_freq: u64,
    pub cfl: CflConfig,
    pub final_time: f64,
    pub max_steps: u64,
    pub eos: EosConfig,
}

/// The non-serializable half of a run's setup: the initial-condition
/// closure `(x,t) -> (ρ,u,p)` (spec §6/§9) and the boundary map, which
/// carries `Arc<dyn Fn>` callbacks `serde` cannot derive.
#[derive(Clone)]
pub struct Scenario {
    pub initial_conditions: std::sync::Arc<dyn Fn(glam::DVec3, f64) -> (f64, glam::DVec3, f64) + Send + Sync>,
    pub boundary_map: BoundaryMap,
}
