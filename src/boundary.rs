//! Boundary tags and boundary conditions (spec §4.5, §6, §9).


use std::collections::HashMap;
use std::sync::Arc;

use bitflags::bitflags;
use glam::DVec3;

use crate::error::HydroError;

/// Identifies one of the (small number of) named boundary groups a mesh
/// tags faces with, e.g. "inlet" or "symmetry-x". Assigned by the caller
/// when building the [`crate::mesh_import::MeshInput`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BoundaryTag(pub u32);

/// Dense bit-set of the [`BoundaryTag`]s carried by one face, per spec §3
/// invariant 4 ("a vertex is a boundary vertex iff at least one incident
/// face carries a nonempty boundary-tag set"). Supports up to 64 distinct
/// tags, which comfortably covers any mesh's named boundary groups; this is
/// a plain dynamic bit-set rather than the `bitflags` macro because the set
/// of tags is supplied by the caller at run time, not fixed at compile time
/// (see [`BoundaryKind`] below for the compile-time-fixed case).
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct BoundaryTagSet(u64);

impl BoundaryTagSet {
    pub const EMPTY: Self = Self(0);

    pub fn single(tag: BoundaryTag) -> Self {
        debug_assert!(tag.0 < 64, "tag id {} exceeds the 64-tag limit", tag.0);
        Self(1u64 << (tag.0 % 64))
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, tag: BoundaryTag) -> bool {
        (self.0 & (1u64 << (tag.0 % 64))) != 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn insert(&mut self, tag: BoundaryTag) {
        self.0 |= 1u64 << (tag.0 % 64);
    }

    /// Iterates the tag ids set in this bit-set, ascending.
    pub fn iter(self) -> impl Iterator<Item = BoundaryTag> {
        let bits = self.0;
        (0..64u32).filter(move |i| bits & (1u64 << i) != 0).map(BoundaryTag)
    }
}

bitflags! {
    /// Which of the three recognised boundary-condition capabilities
    /// (spec §6: `has_prescribed_velocity`, `has_prescribed_pressure`,
    /// `has_symmetry`) a single tag's [`BoundaryCondition`] carries. A tag
    /// may combine pressure and symmetry (spec §4.5 treats them as
    /// independent, additive contributions); prescribed velocity always
    /// takes precedence at assembly time regardless of what else is set.
    #[derive(Copy, Clone, PartialEq, Eq, Debug)]
    pub struct BoundaryKind: u8 {
        const PRESCRIBED_VELOCITY = 0b001;
        const PRESCRIBED_PRESSURE = 0b010;
        const SYMMETRY            = 0b100;
    }
}

pub type VelocityFn = Arc<dyn Fn(DVec3, f64) -> DVec3 + Send + Sync>;
pub type PressureFn = Arc<dyn Fn(DVec3, f64) -> f64 + Send + Sync>;

/// One named boundary condition, combining the independent capabilities
/// spec §4.5 describes. At least one capability must be set.
#[derive(Clone)]
pub struct BoundaryCondition {
    pub velocity: Option<VelocityFn>,
    pub pressure: Option<PressureFn>,
    pub symmetry: bool,
}

impl BoundaryCondition {
    pub fn prescribed_velocity(velocity: VelocityFn) -> Self {
        Self { velocity: Some(velocity), pressure: None, symmetry: false }
    }

    pub fn prescribed_pressure(pressure: PressureFn) -> Self {
        Self { velocity: None, pressure: Some(pressure), symmetry: false }
    }

    pub fn symmetry() -> Self {
        Self { velocity: None, pressure: None, symmetry: true }
    }

    pub fn with_pressure(mut self, pressure: PressureFn) -> Self {
        self.pressure = Some(pressure);
        self
    }

    pub fn kind(&self) -> BoundaryKind {
        let mut kind = BoundaryKind::empty();
        if self.velocity.is_some() {
            kind |= BoundaryKind::PRESCRIBED_VELOCITY;
        }
        if self.pressure.is_some() {
            kind |= BoundaryKind::PRESCRIBED_PRESSURE;
        }
        if self.symmetry {
            kind |= BoundaryKind::SYMMETRY;
        }
        kind
    }

    /// Fatal at configuration time if the condition carries none of the
    /// three recognised capabilities (spec §7, "unsupported ... BC kind").
    pub fn validate(&self, tag: BoundaryTag) -> Result<(), HydroError> {
        if self.kind().is_empty() {
            return Err(HydroError::UnsupportedConfiguration(format!(
                "boundary tag {} carries no recognised condition",
                tag.0
            )));
        }
        if self.velocity.is_some() && (self.pressure.is_some() || self.symmetry) {
            return Err(HydroError::UnsupportedConfiguration(format!(
                "boundary tag {} combines prescribed velocity with another condition",
                tag.0
            )));
        }
        Ok(())
    }
}

/// `tag -> condition`, validated once at configuration time.
#[derive(Clone, Default)]
pub struct BoundaryMap(HashMap<BoundaryTag, BoundaryCondition>);

impl BoundaryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: BoundaryTag, condition: BoundaryCondition) -> Result<(), HydroError> {
        condition.validate(tag)?;
        self.0.insert(tag, condition);
        Ok(())
    }

    pub fn get(&self, tag: BoundaryTag) -> Option<&BoundaryCondition> {
        self.0.get(&tag)
    }

    pub fn validate_all(&self) -> Result<(), HydroError> {
        for (tag, condition) in &self.0 {
            condition.validate(*tag)?;
        }
        Ok(())
    }
}
