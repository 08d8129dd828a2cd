use super::DenseRealMatrix;
use serde::Serialize;

/// Sweep budget per eigenvalue index for the implicit QL iteration.
pub const IMPLICIT_QL_MAX_SWEEPS: usize = 30;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TridiagonalEigenError {
    #[error("tridiagonal eigensolver requires a non-empty matrix")]
    EmptyMatrix,
    #[error(
        "tridiagonal input length mismatch: diagonal={diagonal}, offdiagonal={offdiagonal}, z={z}"
    )]
    LengthMismatch {
        diagonal: usize,
        offdiagonal: usize,
        z: usize,
    },
    #[error("tridiagonal vector '{field}' must contain finite values, index {index} got {value}")]
    NonFiniteEntry {
        field: &'static str,
        index: usize,
        value: f64,
    },
    #[error(
        "implicit QL iteration did not converge for eigenvalue index {index} after {iterations} sweeps"
    )]
    ConvergenceFailure { index: usize, iterations: usize },
}

/// Symmetric tridiagonal matrix stored as its diagonal and first off-diagonal.
///
/// The off-diagonal is kept at the full dimension `n`; its last entry has no
/// matrix position and is always zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricTridiagonal {
    diagonal: Vec<f64>,
    offdiagonal: Vec<f64>,
}

impl SymmetricTridiagonal {
    /// Accepts an off-diagonal of length `n - 1` or `n`; a trailing `n`-th
    /// entry is ignored.
    pub fn new(diagonal: &[f64], offdiagonal: &[f64]) -> Result<Self, TridiagonalEigenError> {
        let dimension = diagonal.len();
        if dimension == 0 {
            return Err(TridiagonalEigenError::EmptyMatrix);
        }
        if offdiagonal.len() != dimension && offdiagonal.len() + 1 != dimension {
            return Err(TridiagonalEigenError::LengthMismatch {
                diagonal: dimension,
                offdiagonal: offdiagonal.len(),
                z: dimension,
            });
        }

        validate_vector("diagonal", diagonal)?;
        validate_vector("offdiagonal", &offdiagonal[..dimension - 1])?;

        let mut stored = vec![0.0; dimension];
        stored[..dimension - 1].copy_from_slice(&offdiagonal[..dimension - 1]);

        Ok(Self {
            diagonal: diagonal.to_vec(),
            offdiagonal: stored,
        })
    }

    pub fn dimension(&self) -> usize {
        self.diagonal.len()
    }

    pub fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    pub fn offdiagonal(&self) -> &[f64] {
        &self.offdiagonal
    }

    pub fn to_dense(&self) -> DenseRealMatrix {
        let dimension = self.dimension();
        let mut dense = DenseRealMatrix::zeros(dimension, dimension);
        for index in 0..dimension {
            dense[(index, index)] = self.diagonal[index];
            if index + 1 < dimension {
                dense[(index, index + 1)] = self.offdiagonal[index];
                dense[(index + 1, index)] = self.offdiagonal[index];
            }
        }
        dense
    }

    pub fn eigen_solve(&self, z: &[f64]) -> Result<TridiagonalEigenSolution, TridiagonalEigenError> {
        ImplicitQlSolver::default().solve(self, z)
    }
}

/// Eigenvalues in ascending order and `Q' z`, permuted consistently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TridiagonalEigenSolution {
    pub eigenvalues: Vec<f64>,
    pub transformed: Vec<f64>,
    pub sweeps: usize,
}

pub trait TridiagonalEigenApi {
    fn solve(
        &self,
        matrix: &SymmetricTridiagonal,
        z: &[f64],
    ) -> Result<TridiagonalEigenSolution, TridiagonalEigenError>;
}

/// Implicit QL with a Wilkinson shift (EISPACK `imtql2` lineage), applying each
/// Givens rotation to `z` instead of accumulating the eigenvector matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImplicitQlSolver {
    pub max_sweeps: usize,
}

impl Default for ImplicitQlSolver {
    fn default() -> Self {
        Self {
            max_sweeps: IMPLICIT_QL_MAX_SWEEPS,
        }
    }
}

impl TridiagonalEigenApi for ImplicitQlSolver {
    fn solve(
        &self,
        matrix: &SymmetricTridiagonal,
        z: &[f64],
    ) -> Result<TridiagonalEigenSolution, TridiagonalEigenError> {
        let dimension = matrix.dimension();
        if z.len() != dimension {
            return Err(TridiagonalEigenError::LengthMismatch {
                diagonal: dimension,
                offdiagonal: matrix.offdiagonal.len(),
                z: z.len(),
            });
        }
        validate_vector("z", z)?;

        let mut eigenvalues = matrix.diagonal.clone();
        let mut offdiagonal = matrix.offdiagonal.clone();
        let mut transformed = z.to_vec();

        let sweeps = implicit_ql(
            &mut eigenvalues,
            &mut offdiagonal,
            &mut transformed,
            self.max_sweeps,
        )?;
        sort_eigenpairs(&mut eigenvalues, &mut transformed);

        tracing::debug!(dimension, sweeps, "implicit QL converged");

        Ok(TridiagonalEigenSolution {
            eigenvalues,
            transformed,
            sweeps,
        })
    }
}

/// Diagonalise the symmetric tridiagonal matrix `(diagonal, offdiagonal)` and
/// return its ascending eigenvalues together with `Q' z`.
///
/// Inputs are never modified. `offdiagonal` may have length `n` (trailing
/// entry ignored) or `n - 1`.
pub fn imtqlx(
    diagonal: &[f64],
    offdiagonal: &[f64],
    z: &[f64],
) -> Result<TridiagonalEigenSolution, TridiagonalEigenError> {
    SymmetricTridiagonal::new(diagonal, offdiagonal)?.eigen_solve(z)
}

fn implicit_ql(
    d: &mut [f64],
    e: &mut [f64],
    z: &mut [f64],
    max_sweeps: usize,
) -> Result<usize, TridiagonalEigenError> {
    let n = d.len();
    if n == 1 {
        return Ok(0);
    }

    let precision = f64::EPSILON;
    e[n - 1] = 0.0;
    let mut total_sweeps = 0;

    for l in 0..n {
        let mut sweeps = 0;
        loop {
            let mut m = l;
            while m + 1 < n {
                if e[m].abs() <= precision * (d[m].abs() + d[m + 1].abs()) {
                    break;
                }
                m += 1;
            }

            if m == l {
                break;
            }
            if sweeps >= max_sweeps {
                return Err(TridiagonalEigenError::ConvergenceFailure {
                    index: l,
                    iterations: sweeps,
                });
            }
            sweeps += 1;

            let mut p = d[l];
            let mut g = (d[l + 1] - p) / (2.0 * e[l]);
            let mut r = (g * g + 1.0).sqrt();
            g = d[m] - p + e[l] / (g + signed_magnitude(r, g));

            let mut s = 1.0;
            let mut c = 1.0;
            p = 0.0;

            for i in (l..m).rev() {
                let f = s * e[i];
                let b = c * e[i];
                if g.abs() <= f.abs() {
                    c = g / f;
                    r = (c * c + 1.0).sqrt();
                    e[i + 1] = f * r;
                    s = 1.0 / r;
                    c *= s;
                } else {
                    s = f / g;
                    r = (s * s + 1.0).sqrt();
                    e[i + 1] = g * r;
                    c = 1.0 / r;
                    s *= c;
                }

                g = d[i + 1] - p;
                r = (d[i] - g) * s + 2.0 * c * b;
                p = s * r;
                d[i + 1] = g + p;
                g = c * r - b;

                let upper = z[i + 1];
                z[i + 1] = s * z[i] + c * upper;
                z[i] = c * z[i] - s * upper;
            }

            d[l] -= p;
            e[l] = g;
            e[m] = 0.0;
        }
        total_sweeps += sweeps;
    }

    Ok(total_sweeps)
}

// Selection sort keeps the (eigenvalue, z) pairing with at most n - 1 swaps.
fn sort_eigenpairs(eigenvalues: &mut [f64], transformed: &mut [f64]) {
    let n = eigenvalues.len();
    for i in 0..n.saturating_sub(1) {
        let mut smallest = i;
        for j in (i + 1)..n {
            if eigenvalues[j] < eigenvalues[smallest] {
                smallest = j;
            }
        }
        if smallest != i {
            eigenvalues.swap(i, smallest);
            transformed.swap(i, smallest);
        }
    }
}

// Fortran SIGN(a, b): |a| carrying the sign of b, with b == 0 treated as positive.
fn signed_magnitude(magnitude: f64, sign_source: f64) -> f64 {
    if sign_source >= 0.0 {
        magnitude.abs()
    } else {
        -magnitude.abs()
    }
}

fn validate_vector(field: &'static str, values: &[f64]) -> Result<(), TridiagonalEigenError> {
    for (index, value) in values.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(TridiagonalEigenError::NonFiniteEntry {
                field,
                index,
                value,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        imtqlx, ImplicitQlSolver, SymmetricTridiagonal, TridiagonalEigenApi,
        TridiagonalEigenError,
    };
    use crate::numerics::special::DenseRealMatrix;
    use std::f64::consts::PI;

    #[test]
    fn imtqlx_reproduces_discrete_laplacian_spectrum() {
        let n = 5;
        let diagonal = vec![2.0; n];
        let offdiagonal = vec![-1.0; n];
        let z = vec![1.0; n];

        let solution = imtqlx(&diagonal, &offdiagonal, &z).expect("eigen solve");
        let expected: Vec<f64> = (1..=n)
            .map(|k| {
                let angle = k as f64 * PI / (2.0 * (n as f64 + 1.0));
                4.0 * angle.sin().powi(2)
            })
            .collect();

        assert_vector_close(&expected, &solution.eigenvalues, 1.0e-14);
        assert!(
            solution
                .eigenvalues
                .windows(2)
                .all(|pair| pair[0] <= pair[1]),
            "eigenvalues must be ascending"
        );
    }

    #[test]
    fn imtqlx_is_identity_for_single_entry() {
        let solution = imtqlx(&[3.25], &[7.0], &[-0.5]).expect("eigen solve");
        assert_eq!(solution.eigenvalues, vec![3.25]);
        assert_eq!(solution.transformed, vec![-0.5]);
        assert_eq!(solution.sweeps, 0);
    }

    #[test]
    fn imtqlx_transform_preserves_euclidean_norm() {
        let diagonal = [4.0, -1.0, 2.5, 0.75, 3.0, -2.0];
        let offdiagonal = [0.5, 1.25, -0.8, 2.0, 0.3];
        let z = [1.0, -2.0, 0.5, 3.0, 0.0, 1.5];

        let solution = imtqlx(&diagonal, &offdiagonal, &z).expect("eigen solve");
        let input_norm: f64 = z.iter().map(|value| value * value).sum();
        let output_norm: f64 = solution
            .transformed
            .iter()
            .map(|value| value * value)
            .sum();

        assert!(
            (input_norm - output_norm).abs() <= 1.0e-12 * input_norm,
            "input_norm={input_norm} output_norm={output_norm}"
        );
    }

    #[test]
    fn unit_vector_transforms_assemble_eigenvectors() {
        let diagonal = [1.0, 3.0, -2.0, 0.5];
        let offdiagonal = [0.7, -1.1, 0.4];
        let matrix = SymmetricTridiagonal::new(&diagonal, &offdiagonal).expect("matrix");
        let n = matrix.dimension();

        let mut eigenvectors = DenseRealMatrix::zeros(n, n);
        let mut eigenvalues = Vec::new();
        for row in 0..n {
            let mut unit = vec![0.0; n];
            unit[row] = 1.0;
            let solution = matrix.eigen_solve(&unit).expect("eigen solve");
            for col in 0..n {
                eigenvectors[(row, col)] = solution.transformed[col];
            }
            eigenvalues = solution.eigenvalues;
        }

        let dense = matrix.to_dense();
        for col in 0..n {
            for row in 0..n {
                let mut product = 0.0;
                for k in 0..n {
                    product += dense[(row, k)] * eigenvectors[(k, col)];
                }
                let residual = product - eigenvalues[col] * eigenvectors[(row, col)];
                assert!(
                    residual.abs() <= 1.0e-13,
                    "residual ({row},{col}) = {residual:.3e}"
                );
            }
        }
    }

    #[test]
    fn dense_expansion_invariants_match_spectrum() {
        let diagonal = [0.0, 0.0, 0.0, 0.0];
        let offdiagonal = [0.6, 0.5, 0.45, 0.0];
        let matrix = SymmetricTridiagonal::new(&diagonal, &offdiagonal).expect("matrix");
        let dense = matrix.to_dense();
        let solution = matrix.eigen_solve(&[1.0, 0.0, 0.0, 0.0]).expect("eigen solve");

        let mut trace = 0.0;
        let mut frobenius_sq = 0.0;
        for row in 0..dense.nrows() {
            trace += dense[(row, row)];
            for col in 0..dense.ncols() {
                frobenius_sq += dense[(row, col)] * dense[(row, col)];
            }
        }
        let eigen_sum: f64 = solution.eigenvalues.iter().sum();
        let eigen_sq_sum: f64 = solution.eigenvalues.iter().map(|value| value * value).sum();

        assert!((trace - eigen_sum).abs() <= 1.0e-14);
        assert!((frobenius_sq - eigen_sq_sum).abs() <= 1.0e-14);
        assert_eq!(dense[(0, 3)], 0.0);
        assert_eq!(dense[(2, 1)], 0.5);
    }

    #[test]
    fn trailing_offdiagonal_entry_is_ignored() {
        let diagonal = [1.0, 2.0, 3.0];
        let with_garbage = [0.5, 0.25, 99.0];
        let trimmed = [0.5, 0.25];
        let z = [1.0, 1.0, 1.0];

        let lhs = imtqlx(&diagonal, &with_garbage, &z).expect("eigen solve");
        let rhs = imtqlx(&diagonal, &trimmed, &z).expect("eigen solve");
        assert_eq!(lhs, rhs);
        assert_eq!(with_garbage[2], 99.0);
    }

    #[test]
    fn diagonal_input_is_sorted_with_z_in_lockstep() {
        let solver = ImplicitQlSolver { max_sweeps: 0 };
        let matrix = SymmetricTridiagonal::new(&[3.0, 1.0, 2.0], &[0.0, 0.0]).expect("matrix");

        let solution = solver.solve(&matrix, &[10.0, 20.0, 30.0]).expect("solve");
        assert_eq!(solution.eigenvalues, vec![1.0, 2.0, 3.0]);
        assert_eq!(solution.transformed, vec![20.0, 30.0, 10.0]);
    }

    #[test]
    fn sweep_cap_surfaces_convergence_failure() {
        let solver = ImplicitQlSolver { max_sweeps: 0 };
        let matrix = SymmetricTridiagonal::new(&[2.0, 2.0], &[-1.0]).expect("matrix");

        let error = solver
            .solve(&matrix, &[1.0, 0.0])
            .expect_err("zero sweep budget should fail");
        assert_eq!(
            error,
            TridiagonalEigenError::ConvergenceFailure {
                index: 0,
                iterations: 0,
            }
        );
    }

    #[test]
    fn imtqlx_validates_shapes_and_values() {
        assert_eq!(
            imtqlx(&[], &[], &[]).expect_err("empty should fail"),
            TridiagonalEigenError::EmptyMatrix
        );
        assert_eq!(
            imtqlx(&[1.0, 2.0, 3.0], &[0.5], &[1.0, 0.0, 0.0]).expect_err("short offdiagonal"),
            TridiagonalEigenError::LengthMismatch {
                diagonal: 3,
                offdiagonal: 1,
                z: 3,
            }
        );
        assert_eq!(
            imtqlx(&[1.0, 2.0], &[0.5], &[1.0]).expect_err("short z"),
            TridiagonalEigenError::LengthMismatch {
                diagonal: 2,
                offdiagonal: 2,
                z: 1,
            }
        );
        assert!(matches!(
            imtqlx(&[1.0, f64::NAN], &[0.5], &[1.0, 0.0]).expect_err("nan diagonal"),
            TridiagonalEigenError::NonFiniteEntry {
                field: "diagonal",
                index: 1,
                ..
            }
        ));
        assert!(matches!(
            imtqlx(&[1.0, 2.0], &[0.5], &[f64::INFINITY, 0.0]).expect_err("infinite z"),
            TridiagonalEigenError::NonFiniteEntry {
                field: "z",
                index: 0,
                ..
            }
        ));
    }

    fn assert_vector_close(expected: &[f64], actual: &[f64], abs_tol: f64) {
        assert_eq!(expected.len(), actual.len(), "vector length mismatch");
        for (index, (&expected_value, &actual_value)) in expected.iter().zip(actual).enumerate() {
            let abs_diff = (actual_value - expected_value).abs();
            assert!(
                abs_diff <= abs_tol,
                "entry {index} expected={expected_value:.15e} actual={actual_value:.15e} abs_diff={abs_diff:.3e}"
            );
        }
    }
}
