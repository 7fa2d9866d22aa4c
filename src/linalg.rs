//! The per-vertex saddle-point solve (spec §4.5 "Solving"). One dynamic QR
//! path handles every `D ∈ {1,2,3}` and `k` (symmetry-constraint count)
//! combination rather than special-casing closed forms; see DESIGN.md for
//! why that tradeoff was taken over the spec's allowed `D=2,3` shortcuts.


use nalgebra::{DMatrix, DVector};

/// Solves
/// ```text
/// [ M_v   Sᵀ ] [ u_v ] = [ b_v ]
/// [ S     0  ] [ λ   ]   [ 0   ]
/// ```
/// for `u_v`, where `m_v` is `dim x dim` and each entry of `constraints` is
/// one `dim`-length symmetry normal `s_tag`. Returns `None` if the assembled
/// system is singular (e.g. two colinear symmetry constraints collapsing the
/// null space), leaving the caller to turn that into a diagnostic.
pub fn solve_nodal_system(dim: usize, m_v: &DMatrix<f64>, b_v: &DVector<f64>, constraints: &[DVector<f64>]) -> Option<DVector<f64>> {
    debug_assert_eq!(m_v.nrows(), dim);
    debug_assert_eq!(m_v.ncols(), dim);
    debug_assert_eq!(b_v.len(), dim);

    let k = constraints.len();
    if k == 0 {
        return m_v.clone().qr().solve(b_v);
    }

    let n = dim + k;
    let mut a = DMatrix::<f64>::zeros(n, n);
    a.view_mut((0, 0), (dim, dim)).copy_from(m_v);
    for (j, s) in constraints.iter().enumerate() {
        debug_assert_eq!(s.len(), dim);
        for i in 0..dim {
            a[(i, dim + j)] = s[i];
            a[(dim + j, i)] = s[i];
        }
    }

    let mut rhs = DVector::<f64>::zeros(n);
    rhs.rows_mut(0, dim).copy_from(b_v);

    let solution = a.qr().solve(&rhs)?;
    Some(solution.rows(0, dim).into_owned())
}
