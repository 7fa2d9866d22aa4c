//! Output writer interface (spec §6). The core is format-agnostic: it
//! collects one dump's worth of per-cell and per-vertex fields into an
//! [`OutputFrame`] and hands it to whatever [`OutputWriter`] the caller
//! configured via `Config::postfix`.


use glam::DVec3;

use crate::error::WriterError;

/// Exactly the fields spec §6 names for a dump: vertex coordinates and the
/// per-cell primitive/derived state, plus the region id every cell was
/// tagged with at mesh-import time.
pub struct OutputFrame<'a> {
    pub step: u64,
    pub time: f64,
    pub coords: &'a [DVec3],
    pub velocity: &'a [DVec3],
    pub pressure: &'a [f64],
    pub density: &'a [f64],
    pub internal_energy: &'a [f64],
    pub temperature: &'a [f64],
    pub sound_speed: &'a [f64],
    pub region: &'a [i32],
}

/// A pluggable dump writer (spec §6). A writer failure is logged and the
/// run continues (spec §7); it never aborts a step.
pub trait OutputWriter {
    fn write_step(&mut self, frame: &OutputFrame) -> Result<(), WriterError>;
}
