pub mod gamma;
pub mod tridiagonal;

pub use gamma::gamma;
pub use tridiagonal::{
    imtqlx, ImplicitQlSolver, SymmetricTridiagonal, TridiagonalEigenApi, TridiagonalEigenError,
    TridiagonalEigenSolution, IMPLICIT_QL_MAX_SWEEPS,
};

use faer::Mat;

pub type DenseRealMatrix = Mat<f64>;
