//! Gauss-Gegenbauer quadrature rules.
//!
//! The rules integrate `f(x) * (1 - x^2)^alpha` over `[-1, 1]`; the zeroth
//! moment of that weight is `2^(2 alpha + 1) Gamma(alpha + 1)^2 / Gamma(2 alpha + 2)`.
//! Two independent constructions are provided:
//!
//! - [`jacobi::gegenbauer_ek_compute`] diagonalises the Jacobi matrix;
//! - [`stroud_secrest::gegenbauer_ss_compute`] polishes tuned initial guesses
//!   with Newton iteration on the three-term recurrence.

pub mod exactness;
pub mod jacobi;
pub mod stroud_secrest;

pub use exactness::{check_exactness, gegenbauer_integral, ExactnessReport, MonomialExactness};
pub use jacobi::{gegenbauer_ek_compute, gegenbauer_jacobi_matrix};
pub use stroud_secrest::{
    gegenbauer_ss_compute, gegenbauer_ss_recur, gegenbauer_ss_recurrence_coefficients,
    gegenbauer_ss_root, NewtonRoot, RecurrenceValue, NEWTON_MAX_STEPS,
};

use crate::domain::{QuadruleError, RuleMethod, RuleRequest};
use crate::numerics::special::{gamma, TridiagonalEigenError};
use crate::numerics::{
    compare_with_policy_tolerance, stable_sum, stable_weighted_sum, NumericTolerance,
};
use serde::Serialize;

/// Lower bound (exclusive) accepted by [`gegenbauer_alpha_check`].
pub const ALPHA_CHECK_LOWER_BOUND: f64 = -0.5;
/// Lower bound (exclusive) enforced by [`gegenbauer_ss_compute`].
pub const SS_ALPHA_LOWER_BOUND: f64 = -1.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GegenbauerError {
    #[error("rule order must be at least 1, got {order}")]
    InvalidOrder { order: usize },
    #[error("alpha={alpha} does not satisfy {requirement}")]
    InvalidAlpha {
        alpha: f64,
        requirement: &'static str,
    },
    #[error(transparent)]
    Eigen(#[from] TridiagonalEigenError),
    #[error("rule construction produced a non-finite {field} at index {index}")]
    NonFiniteResult { field: &'static str, index: usize },
    #[error("rule shape mismatch: nodes={nodes}, weights={weights}")]
    LengthMismatch { nodes: usize, weights: usize },
}

impl GegenbauerError {
    /// True for the invalid-parameter family (order or alpha out of range).
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidOrder { .. } | Self::InvalidAlpha { .. })
    }
}

impl From<GegenbauerError> for QuadruleError {
    fn from(error: GegenbauerError) -> Self {
        let message = error.to_string();
        match error {
            GegenbauerError::InvalidOrder { .. } => {
                QuadruleError::input_validation("INPUT.RULE_ORDER", message)
            }
            GegenbauerError::InvalidAlpha { .. } => {
                QuadruleError::input_validation("INPUT.RULE_ALPHA", message)
            }
            GegenbauerError::Eigen(TridiagonalEigenError::ConvergenceFailure { .. }) => {
                QuadruleError::computation("RUN.EIGEN_CONVERGENCE", message)
            }
            GegenbauerError::Eigen(_) => {
                QuadruleError::input_validation("INPUT.TRIDIAGONAL", message)
            }
            GegenbauerError::NonFiniteResult { .. } => {
                QuadruleError::computation("RUN.NON_FINITE", message)
            }
            GegenbauerError::LengthMismatch { .. } => {
                QuadruleError::internal("SYS.RULE_SHAPE", message)
            }
        }
    }
}

/// Quadrature nodes with their weights, nodes ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuadratureRule {
    nodes: Vec<f64>,
    weights: Vec<f64>,
}

impl QuadratureRule {
    pub fn new(nodes: Vec<f64>, weights: Vec<f64>) -> Result<Self, GegenbauerError> {
        if nodes.len() != weights.len() {
            return Err(GegenbauerError::LengthMismatch {
                nodes: nodes.len(),
                weights: weights.len(),
            });
        }
        if nodes.is_empty() {
            return Err(GegenbauerError::InvalidOrder { order: 0 });
        }
        if let Some(index) = nodes.iter().position(|node| !node.is_finite()) {
            return Err(GegenbauerError::NonFiniteResult {
                field: "node",
                index,
            });
        }
        if let Some(index) = weights.iter().position(|weight| !weight.is_finite()) {
            return Err(GegenbauerError::NonFiniteResult {
                field: "weight",
                index,
            });
        }

        Ok(Self { nodes, weights })
    }

    pub fn order(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn weight_sum(&self) -> f64 {
        stable_sum(&self.weights)
    }

    /// Approximate the weighted integral of `f` as `sum_i w_i f(x_i)`.
    pub fn integrate<F: Fn(f64) -> f64>(&self, f: F) -> f64 {
        let values: Vec<f64> = self.nodes.iter().copied().map(f).collect();
        stable_weighted_sum(&values, &self.weights).unwrap_or(f64::NAN)
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.nodes, self.weights)
    }
}

/// Soft validator for the eigenvalue construction: `alpha > -0.5`.
///
/// Returns `false` instead of failing; callers decide what to do.
pub fn gegenbauer_alpha_check(alpha: f64) -> bool {
    alpha > ALPHA_CHECK_LOWER_BOUND
}

/// `2^(2 alpha + 1) Gamma(alpha + 1)^2 / Gamma(2 alpha + 2)`.
pub fn gegenbauer_zeroth_moment(alpha: f64) -> f64 {
    let gamma_shifted = gamma(alpha + 1.0);
    2.0_f64.powf(2.0 * alpha + 1.0) * gamma_shifted * gamma_shifted / gamma(2.0 * alpha + 2.0)
}

pub trait GaussRuleBuilder {
    fn method(&self) -> RuleMethod;
    fn build(&self, order: usize, alpha: f64) -> Result<QuadratureRule, GegenbauerError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JacobiMatrixBuilder;

impl GaussRuleBuilder for JacobiMatrixBuilder {
    fn method(&self) -> RuleMethod {
        RuleMethod::JacobiMatrix
    }

    fn build(&self, order: usize, alpha: f64) -> Result<QuadratureRule, GegenbauerError> {
        gegenbauer_ek_compute(order, alpha)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewtonPolishedBuilder;

impl GaussRuleBuilder for NewtonPolishedBuilder {
    fn method(&self) -> RuleMethod {
        RuleMethod::NewtonPolished
    }

    fn build(&self, order: usize, alpha: f64) -> Result<QuadratureRule, GegenbauerError> {
        gegenbauer_ss_compute(order, alpha)
    }
}

pub fn builder_for(method: RuleMethod) -> &'static dyn GaussRuleBuilder {
    match method {
        RuleMethod::JacobiMatrix => &JacobiMatrixBuilder,
        RuleMethod::NewtonPolished => &NewtonPolishedBuilder,
    }
}

/// Build the requested rule, applying [`gegenbauer_alpha_check`] before the
/// eigenvalue construction.
pub fn build_rule(request: RuleRequest) -> Result<QuadratureRule, GegenbauerError> {
    if request.method == RuleMethod::JacobiMatrix && !gegenbauer_alpha_check(request.alpha) {
        return Err(GegenbauerError::InvalidAlpha {
            alpha: request.alpha,
            requirement: "alpha > -0.5",
        });
    }

    let rule = builder_for(request.method).build(request.order, request.alpha)?;
    tracing::debug!(
        method = %request.method,
        order = request.order,
        alpha = request.alpha,
        "built Gauss-Gegenbauer rule"
    );
    Ok(rule)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RuleComparison {
    pub max_node_abs_diff: f64,
    pub max_weight_abs_diff: f64,
    pub max_weight_rel_diff: f64,
    pub passes: bool,
}

/// Node-by-node and weight-by-weight agreement of two rules of equal order.
pub fn compare_rules(
    lhs: &QuadratureRule,
    rhs: &QuadratureRule,
    tolerance: NumericTolerance,
) -> Result<RuleComparison, GegenbauerError> {
    if lhs.order() != rhs.order() {
        return Err(GegenbauerError::LengthMismatch {
            nodes: lhs.order(),
            weights: rhs.order(),
        });
    }

    let mut comparison = RuleComparison {
        max_node_abs_diff: 0.0,
        max_weight_abs_diff: 0.0,
        max_weight_rel_diff: 0.0,
        passes: true,
    };

    for (&baseline, &actual) in lhs.nodes.iter().zip(&rhs.nodes) {
        let node = compare_with_policy_tolerance(baseline, actual, tolerance);
        comparison.max_node_abs_diff = comparison.max_node_abs_diff.max(node.abs_diff);
        comparison.passes &= node.passes;
    }
    for (&baseline, &actual) in lhs.weights.iter().zip(&rhs.weights) {
        let weight = compare_with_policy_tolerance(baseline, actual, tolerance);
        comparison.max_weight_abs_diff = comparison.max_weight_abs_diff.max(weight.abs_diff);
        comparison.max_weight_rel_diff = comparison.max_weight_rel_diff.max(weight.rel_diff);
        comparison.passes &= weight.passes;
    }

    Ok(comparison)
}
