//! The state store (spec §4.3): a `(name, entity-kind, version) -> Vec<T>`
//! mapping with non-owning typed handles. Lifecycle is `init_fields(topology)
//! -> run -> destroy_fields` (spec §9); `destroy_fields` is simply dropping
//! the [`StateStore`], since nothing here owns anything outside its own
//! arrays.


use std::collections::HashMap;
use std::marker::PhantomData;

use glam::DVec3;

use crate::error::HydroError;
use crate::topology::Topology;

/// Which entity collection a field is dense over.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum EntityKind {
    Vertex,
    Edge,
    Face,
    Cell,
    Corner,
    Wedge,
}

/// Version 0 is the live working state; version 1 is the pre-predictor
/// snapshot the corrector restores from (spec §4.3).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum FieldVersion {
    Working,
    Snapshot,
}

/// Non-owning view onto one scalar field's backing array.
#[derive(Copy, Clone, Debug)]
pub struct ScalarFieldHandle(usize, PhantomData<f64>);

/// Non-owning view onto one vector field's backing array.
#[derive(Copy, Clone, Debug)]
pub struct VectorFieldHandle(usize, PhantomData<DVec3>);

type FieldKey = (&'static str, EntityKind, FieldVersion);

#[derive(Default)]
pub struct StateStore {
    scalar_index: HashMap<FieldKey, usize>,
    scalar_data: Vec<Vec<f64>>,
    vector_index: HashMap<FieldKey, usize>,
    vector_data: Vec<Vec<DVec3>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entity_count(topology: &Topology, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Vertex => topology.vertex_count(),
            EntityKind::Edge => topology.edge_count(),
            EntityKind::Face => topology.face_count(),
            EntityKind::Cell => topology.cell_count(),
            EntityKind::Corner => topology.corner_count(),
            EntityKind::Wedge => topology.wedge_count(),
        }
    }

    /// Registers a scalar field, returning the existing handle if
    /// `(name, kind, version)` was already registered — requesting a field
    /// twice aliases the same backing array rather than allocating a second
    /// one (spec §4.3 "handles over the same (name, version) alias").
    pub fn register_scalar(&mut self, topology: &Topology, name: &'static str, kind: EntityKind, version: FieldVersion) -> ScalarFieldHandle {
        let key = (name, kind, version);
        if let Some(&index) = self.scalar_index.get(&key) {
            return ScalarFieldHandle(index, PhantomData);
        }
        let index = self.scalar_data.len();
        self.scalar_data.push(vec![0.0; Self::entity_count(topology, kind)]);
        self.scalar_index.insert(key, index);
        ScalarFieldHandle(index, PhantomData)
    }

    pub fn register_vector(&mut self, topology: &Topology, name: &'static str, kind: EntityKind, version: FieldVersion) -> VectorFieldHandle {
        let key = (name, kind, version);
        if let Some(&index) = self.vector_index.get(&key) {
            return VectorFieldHandle(index, PhantomData);
        }
        let index = self.vector_data.len();
        self.vector_data.push(vec![DVec3::ZERO; Self::entity_count(topology, kind)]);
        self.vector_index.insert(key, index);
        VectorFieldHandle(index, PhantomData)
    }

    /// Looks up a handle for a field that must already be registered;
    /// returns [`HydroError::UnknownField`] otherwise, per spec §7/§9 ("not
    /// a panic").
    pub fn scalar_field(&self, name: &'static str, kind: EntityKind, version: FieldVersion) -> Result<ScalarFieldHandle, HydroError> {
        self.scalar_index
            .get(&(name, kind, version))
            .map(|&index| ScalarFieldHandle(index, PhantomData))
            .ok_or_else(|| HydroError::UnknownField { name: name.to_string(), kind: entity_kind_name(kind) })
    }

    pub fn vector_field(&self, name: &'static str, kind: EntityKind, version: FieldVersion) -> Result<VectorFieldHandle, HydroError> {
        self.vector_index
            .get(&(name, kind, version))
            .map(|&index| VectorFieldHandle(index, PhantomData))
            .ok_or_else(|| HydroError::UnknownField { name: name.to_string(), kind: entity_kind_name(kind) })
    }

    pub fn scalar(&self, handle: ScalarFieldHandle) -> &[f64] {
        &self.scalar_data[handle.0]
    }

    pub fn scalar_mut(&mut self, handle: ScalarFieldHandle) -> &mut [f64] {
        &mut self.scalar_data[handle.0]
    }

    pub fn vector(&self, handle: VectorFieldHandle) -> &[DVec3] {
        &self.vector_data[handle.0]
    }

    pub fn vector_mut(&mut self, handle: VectorFieldHandle) -> &mut [DVec3] {
        &mut self.vector_data[handle.0]
    }

    pub fn copy_scalar(&mut self, from: ScalarFieldHandle, to: ScalarFieldHandle) {
        let (from, to) = (from.0, to.0);
        if from == to {
            return;
        }
        let source = self.scalar_data[from].clone();
        self.scalar_data[to].copy_from_slice(&source);
    }

    pub fn copy_vector(&mut self, from: VectorFieldHandle, to: VectorFieldHandle) {
        let (from, to) = (from.0, to.0);
        if from == to {
            return;
        }
        let source = self.vector_data[from].clone();
        self.vector_data[to].copy_from_slice(&source);
    }
}

fn entity_kind_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Vertex => "vertex",
        EntityKind::Edge => "edge",
        EntityKind::Face => "face",
        EntityKind::Cell => "cell",
        EntityKind::Corner => "corner",
        EntityKind::Wedge => "wedge",
    }
}

/// Handles for every field the hydro core reads or writes, resolved once at
/// start-up by [`init_fields`]. `*_snapshot` fields exist only for the three
/// conserved quantities the predictor-corrector restores between the
/// half-step and the full-step (spec §4.8); every other cell field is
/// derived from those plus the equation of state and never needs a second
/// version.
pub struct HydroFields {
    pub mass: ScalarFieldHandle,
    pub momentum: VectorFieldHandle,
    pub total_energy: ScalarFieldHandle,

    pub mass_snapshot: ScalarFieldHandle,
    pub momentum_snapshot: VectorFieldHandle,
    pub total_energy_snapshot: ScalarFieldHandle,

    pub density: ScalarFieldHandle,
    pub velocity: VectorFieldHandle,
    pub internal_energy: ScalarFieldHandle,
    pub pressure: ScalarFieldHandle,
    pub sound_speed: ScalarFieldHandle,
    pub temperature: ScalarFieldHandle,

    pub nodal_velocity: VectorFieldHandle,
}

/// Registers every field the core needs against a freshly built topology.
pub fn init_fields(topology: &Topology) -> (StateStore, HydroFields) {
    let mut store = StateStore::new();
    let fields = HydroFields {
        mass: store.register_scalar(topology, "mass", EntityKind::Cell, FieldVersion::Working),
        momentum: store.register_vector(topology, "momentum", EntityKind::Cell, FieldVersion::Working),
        total_energy: store.register_scalar(topology, "total_energy", EntityKind::Cell, FieldVersion::Working),

        mass_snapshot: store.register_scalar(topology, "mass", EntityKind::Cell, FieldVersion::Snapshot),
        momentum_snapshot: store.register_vector(topology, "momentum", EntityKind::Cell, FieldVersion::Snapshot),
        total_energy_snapshot: store.register_scalar(topology, "total_energy", EntityKind::Cell, FieldVersion::Snapshot),

        density: store.register_scalar(topology, "density", EntityKind::Cell, FieldVersion::Working),
        velocity: store.register_vector(topology, "velocity", EntityKind::Cell, FieldVersion::Working),
        internal_energy: store.register_scalar(topology, "internal_energy", EntityKind::Cell, FieldVersion::Working),
        pressure: store.register_scalar(topology, "pressure", EntityKind::Cell, FieldVersion::Working),
        sound_speed: store.register_scalar(topology, "sound_speed", EntityKind::Cell, FieldVersion::Working),
        temperature: store.register_scalar(topology, "temperature", EntityKind::Cell, FieldVersion::Working),

        nodal_velocity: store.register_vector(topology, "nodal_velocity", EntityKind::Vertex, FieldVersion::Working),
    };
    (store, fields)
}
