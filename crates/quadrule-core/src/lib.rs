//! Gauss-Gegenbauer quadrature construction.
//!
//! Rules for `integral_{-1}^{1} f(x) (1 - x^2)^alpha dx` are built either by
//! diagonalising the Jacobi matrix with an implicit QL eigensolver or by the
//! Stroud-Secrest Newton construction on the three-term recurrence.

pub mod domain;
pub mod numerics;
pub mod rules;

pub use numerics::special::{imtqlx, TridiagonalEigenError, TridiagonalEigenSolution};
pub use rules::{
    build_rule, check_exactness, compare_rules, gegenbauer_alpha_check, gegenbauer_ek_compute,
    gegenbauer_integral, gegenbauer_ss_compute, gegenbauer_zeroth_moment, GegenbauerError,
    QuadratureRule,
};
