use glam::DVec3;
use lagrangian_hydro::mesh_import::{CellInput, MeshInput};
use lagrangian_hydro::topology::{CellShape, Dim, Topology};

fn main() {
    divan::main();
}

/// An `n x n` grid of unit quads, the same shape of input `Topology::build`
/// sees for a 2D scenario mesh.
fn grid_mesh(n: usize) -> MeshInput {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            vertices.push(DVec3::new(i as f64, j as f64, 0.0));
        }
    }
    let mut mesh = MeshInput::new(Dim::Two, vertices);
    let idx = |i: usize, j: usize| (j * (n + 1) + i) as u32;
    for j in 0..n {
        for i in 0..n {
            let ring = vec![idx(i, j), idx(i + 1, j), idx(i + 1, j + 1), idx(i, j + 1)];
            mesh.push_cell(CellInput::new(CellShape::Quad, ring, 0));
        }
    }
    mesh
}

#[divan::bench(args = [8, 16, 32, 64])]
fn build(n: usize) {
    let mesh = grid_mesh(n);
    Topology::build(&mesh).unwrap();
}
