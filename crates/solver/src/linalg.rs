//! Dense linear algebra over `nalgebra` storage.
//!
//! The systems solved here are small (a few dozen unknowns). Rank uses plain
//! row reduction with an absolute pivot tolerance; square solves go through
//! nalgebra's LU.

use nalgebra::linalg::LU;
use nalgebra::{DMatrix, DVector, Dyn};

/// Append `b` as an extra column of `a`.
pub fn augment(a: &DMatrix<f64>, b: &DVector<f64>) -> DMatrix<f64> {
    let (rows, cols) = a.shape();
    let mut aug = DMatrix::zeros(rows, cols + 1);
    aug.view_mut((0, 0), (rows, cols)).copy_from(a);
    aug.set_column(cols, b);
    aug
}

/// Numerical rank via row reduction with partial pivoting.
///
/// A column whose largest remaining magnitude is below `tolerance` does not
/// produce a pivot.
pub fn rank(matrix: &DMatrix<f64>, tolerance: f64) -> usize {
    let mut m = matrix.clone();
    let (rows, cols) = m.shape();
    let mut rank = 0;

    for col in 0..cols {
        if rank == rows {
            break;
        }

        let mut pivot_row = rank;
        let mut pivot_val = m[(rank, col)].abs();
        for row in (rank + 1)..rows {
            let val = m[(row, col)].abs();
            if val > pivot_val {
                pivot_val = val;
                pivot_row = row;
            }
        }
        if pivot_val < tolerance {
            continue;
        }

        m.swap_rows(rank, pivot_row);
        let pivot = m[(rank, col)];
        for row in (rank + 1)..rows {
            let factor = m[(row, col)] / pivot;
            if factor == 0.0 {
                continue;
            }
            for c in col..cols {
                let above = m[(rank, c)];
                m[(row, c)] -= factor * above;
            }
        }
        rank += 1;
    }

    rank
}

/// LU factorization of a square matrix, rejected when a pivot of `U` falls
/// below `tolerance` times the largest entry of `a`.
fn factor(a: &DMatrix<f64>, tolerance: f64) -> Option<LU<f64, Dyn, Dyn>> {
    debug_assert_eq!(a.nrows(), a.ncols());
    let threshold = tolerance * a.amax().max(f64::MIN_POSITIVE);
    let lu = a.clone().lu();
    if lu.u().diagonal().iter().any(|pivot| pivot.abs() < threshold) {
        return None;
    }
    Some(lu)
}

/// Solve a square system `a * x = b` with nalgebra's partial-pivot LU.
/// Returns `None` when `a` is singular to within `tolerance`.
pub fn solve_square(a: &DMatrix<f64>, b: &DVector<f64>, tolerance: f64) -> Option<DVector<f64>> {
    factor(a, tolerance)?.solve(b)
}

/// Least-squares solution of `a * x = b` through the normal equations
/// `(AᵀA) x = Aᵀb`.
///
/// `AᵀA` is factored once. Each refinement pass solves for the current
/// residual and adds the correction.
pub fn least_squares(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    tolerance: f64,
    refinement_steps: usize,
) -> Option<DVector<f64>> {
    let lu = factor(&a.tr_mul(a), tolerance)?;
    let mut x = lu.solve(&a.tr_mul(b))?;

    for _ in 0..refinement_steps {
        let residual = b - a * &x;
        x += lu.solve(&a.tr_mul(&residual))?;
    }
    Some(x)
}
