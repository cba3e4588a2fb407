//! Dense linear algebra on `ndarray` used by the decomposition.
//!
//! Covariance matrices here are small (assets × assets) and symmetric, so a
//! cyclic Jacobi eigensolver is accurate and needs no native LAPACK.

use ndarray::{Array1, Array2, Axis};
use ronda_traits::{Result, RondaError};

/// Upper bound on Jacobi sweeps; convergence is quadratic and normally
/// takes well under twenty.
const MAX_SWEEPS: usize = 100;

/// Relative off-diagonal norm at which the rotation loop stops.
const TOLERANCE: f64 = 1e-14;

/// Eigen decomposition of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues in descending order.
    pub values: Array1<f64>,
    /// Unit eigenvectors stored as columns, in the order of `values`.
    pub vectors: Array2<f64>,
}

/// Column means of a dates × assets matrix.
pub fn column_means(data: &Array2<f64>) -> Array1<f64> {
    data.mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(data.ncols()))
}

/// Sample covariance matrix (N-1 denominator) of the columns of `data`.
///
/// # Errors
///
/// Needs at least two rows.
pub fn covariance_matrix(data: &Array2<f64>) -> Result<Array2<f64>> {
    let n = data.nrows();
    if n < 2 {
        return Err(RondaError::InsufficientData(format!(
            "covariance needs at least 2 observations, got {n}"
        )));
    }
    let centered = data - &column_means(data);
    Ok(centered.t().dot(&centered) / (n - 1) as f64)
}

/// Eigen decomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Eigenvectors are sign-normalised so that the entry with the largest
/// magnitude is positive, which makes the output deterministic for a
/// given input.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> Result<SymmetricEigen> {
    let n = matrix.nrows();
    if n == 0 || matrix.ncols() != n {
        return Err(RondaError::DataContract(format!(
            "eigen decomposition needs a non-empty square matrix, got {:?}",
            matrix.dim()
        )));
    }

    let mut a = matrix.clone();
    let mut v: Array2<f64> = Array2::eye(n);
    let scale = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mut converged = scale == 0.0;

    for _ in 0..MAX_SWEEPS {
        if converged {
            break;
        }
        let off_diagonal = off_diagonal_norm(&a);
        if off_diagonal <= TOLERANCE * scale {
            converged = true;
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq.abs() <= f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    if !converged && off_diagonal_norm(&a) > TOLERANCE.sqrt() * scale {
        return Err(RondaError::Degenerate(format!(
            "Jacobi eigen decomposition did not converge after {MAX_SWEEPS} sweeps"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[[j, j]].total_cmp(&a[[i, i]]));

    let values = Array1::from_iter(order.iter().map(|&i| a[[i, i]]));
    let mut vectors = Array2::zeros((n, n));
    for (dst, &src) in order.iter().enumerate() {
        let mut column = v.column(src).to_owned();
        let pivot = column
            .iter()
            .copied()
            .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
        if pivot < 0.0 {
            column.mapv_inplace(|x| -x);
        }
        vectors.column_mut(dst).assign(&column);
    }

    Ok(SymmetricEigen { values, vectors })
}

fn off_diagonal_norm(a: &Array2<f64>) -> f64 {
    let n = a.nrows();
    let mut sum = 0.0;
    for p in 0..n {
        for q in (p + 1)..n {
            sum += 2.0 * a[[p, q]] * a[[p, q]];
        }
    }
    sum.sqrt()
}

/// Solves `a · x = b` by Gaussian elimination with partial pivoting.
///
/// # Errors
///
/// Returns [`RondaError::Degenerate`] when `a` is singular.
pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return Err(RondaError::DataContract(format!(
            "cannot solve a {:?} system against a vector of length {}",
            a.dim(),
            b.len()
        )));
    }

    let mut m = a.clone();
    let mut rhs = b.clone();
    let scale = m.iter().fold(0.0_f64, |acc, x| acc.max(x.abs())).max(1.0);

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| m[[i, col]].abs().total_cmp(&m[[j, col]].abs()))
            .unwrap_or(col);
        if m[[pivot_row, col]].abs() <= 1e-12 * scale {
            return Err(RondaError::Degenerate(
                "linear system is singular".to_string(),
            ));
        }
        if pivot_row != col {
            for k in 0..n {
                m.swap([col, k], [pivot_row, k]);
            }
            rhs.swap(col, pivot_row);
        }
        for row in (col + 1)..n {
            let factor = m[[row, col]] / m[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                m[[row, k]] -= factor * m[[col, k]];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| m[[row, k]] * x[k]).sum();
        x[row] = (rhs[row] - tail) / m[[row, row]];
    }
    Ok(x)
}
