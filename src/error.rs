//! Fatal and non-fatal error taxonomy for the hydro core (spec §7).

use thiserror::Error;

use crate::topology::{CellId, VertexId};

/// A fatal error aborts the current step (or construction) with no in-step
/// recovery. Every variant carries enough identifying data to reconstruct
/// the single-line diagnostic the caller is expected to log.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HydroError {
    /// A cell failed to produce a positive volume at topology construction,
    /// or a corner/wedge was built with no owning cell or vertex.
    #[error("topology inconsistency: cell {cell:?} has non-positive volume ({volume})")]
    DegenerateTopology { cell: CellId, volume: f64 },

    /// An orphaned corner or wedge was discovered during construction.
    #[error("topology inconsistency: orphan {kind} encountered while building the topology")]
    OrphanEntity { kind: &'static str },

    /// The per-vertex saddle-point system was singular (e.g. two parallel
    /// symmetry constraints collapsed the solution space).
    #[error("degenerate nodal system at vertex {vertex:?} (tags: {tags:?})")]
    DegenerateNodalSystem { vertex: VertexId, tags: Vec<u32> },

    /// `Δt` underflowed the configured floor.
    #[error("time step underflow: dt={dt} fell below the floor {floor} (limiter: {limiter})")]
    TimeStepUnderflow { dt: f64, floor: f64, limiter: &'static str },

    /// A cell's density or pressure went non-positive after a state update.
    #[error("non-positive state in cell {cell:?}: {field}={value} (limiter: {limiter})")]
    NonPositiveState { cell: CellId, field: &'static str, value: f64, limiter: &'static str },

    /// An EOS kind or boundary condition kind named in the configuration is
    /// not supported.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// A state field handle was requested for a `(name, kind)` pair that was
    /// never registered with [`crate::state::StateStore`].
    #[error("unknown field \"{name}\" requested for entity kind {kind}")]
    UnknownField { name: String, kind: &'static str },
}

/// Output-writer failures are logged and never abort the run (spec §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("output writer failed at step {step}: {message}")]
pub struct WriterError {
    pub step: u64,
    pub message: String,
}
