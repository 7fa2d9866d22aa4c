//! Cell-centered Lagrangian hydrodynamics on unstructured polygonal and
//! polyhedral meshes: a first-order Maire-style nodal solver that advances
//! compressible Euler flow in a reference frame that moves with the fluid.
//!
//! The crate is organized bottom-up, leaf modules first: shape-specific
//! [`geometry`] kernels; the immutable [`topology`] store built once from a
//! caller-supplied [`mesh_import::MeshInput`]; the [`cache`] of derived
//! geometric quantities kept coherent with vertex coordinates; the
//! [`state`] store of named dense fields; the pluggable [`eos`] closure;
//! [`boundary`] conditions; the [`linalg`] saddle-point solve; the
//! [`nodal`] solver and the [`force`]/update phase built on top of it;
//! [`timestep`] CFL control; and finally [`driver`], which couples all of
//! the above into the predictor-corrector time integration loop.
//!
//! Mesh I/O, input-file parsing, MPI partitioning and the equation-of-state
//! constants themselves are the caller's responsibility; this crate starts
//! from an already-built [`mesh_import::MeshInput`] and a concrete
//! [`eos::EquationOfState`].

pub mod boundary;
pub mod cache;
pub mod config;
pub mod driver;
pub mod eos;
pub mod error;
pub mod force;
pub mod geometry;
pub mod linalg;
pub mod mesh_import;
pub mod nodal;
pub mod output;
pub mod state;
pub mod timestep;
pub mod topology;

pub use driver::{run, Driver, DriverStats};
pub use error::{HydroError, WriterError};
