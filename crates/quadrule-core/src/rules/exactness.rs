use super::QuadratureRule;
use crate::numerics::special::gamma;
use crate::numerics::{compare_with_policy_tolerance, stable_weighted_sum, NumericTolerance};
use serde::Serialize;

/// Exact `integral_{-1}^{1} x^degree (1 - x^2)^alpha dx`.
///
/// Odd degrees vanish by symmetry; even degrees reduce to a Beta function.
pub fn gegenbauer_integral(degree: usize, alpha: f64) -> f64 {
    if degree % 2 == 1 {
        return 0.0;
    }

    let half = (degree as f64 + 1.0) / 2.0;
    gamma(half) * gamma(alpha + 1.0) / gamma(half + alpha + 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonomialExactness {
    pub degree: usize,
    pub quadrature: f64,
    pub exact: f64,
    pub abs_error: f64,
    pub rel_error: f64,
    pub passes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExactnessReport {
    pub order: usize,
    pub alpha: f64,
    pub max_degree: usize,
    pub monomials: Vec<MonomialExactness>,
    pub max_abs_error: f64,
    pub max_rel_error: f64,
    pub passed: bool,
}

impl ExactnessReport {
    pub fn failures(&self) -> impl Iterator<Item = &MonomialExactness> {
        self.monomials.iter().filter(|monomial| !monomial.passes)
    }
}

/// Integrate `x^p` for `p = 0..=max_degree` with `rule` and compare against
/// [`gegenbauer_integral`].
pub fn check_exactness(
    rule: &QuadratureRule,
    alpha: f64,
    max_degree: usize,
    tolerance: NumericTolerance,
) -> ExactnessReport {
    let mut powers = vec![1.0; rule.order()];
    let mut monomials = Vec::with_capacity(max_degree + 1);

    for degree in 0..=max_degree {
        if degree > 0 {
            for (power, &node) in powers.iter_mut().zip(rule.nodes()) {
                *power *= node;
            }
        }

        let quadrature = stable_weighted_sum(&powers, rule.weights()).unwrap_or(f64::NAN);
        let exact = gegenbauer_integral(degree, alpha);
        let comparison = compare_with_policy_tolerance(exact, quadrature, tolerance);
        monomials.push(MonomialExactness {
            degree,
            quadrature,
            exact,
            abs_error: comparison.abs_diff,
            rel_error: comparison.rel_diff,
            passes: comparison.passes,
        });
    }

    let max_abs_error = monomials
        .iter()
        .map(|monomial| monomial.abs_error)
        .fold(0.0, f64::max);
    let max_rel_error = monomials
        .iter()
        .map(|monomial| monomial.rel_error)
        .fold(0.0, f64::max);
    let passed = monomials.iter().all(|monomial| monomial.passes);

    if !passed {
        tracing::debug!(
            order = rule.order(),
            alpha,
            max_degree,
            max_rel_error,
            "rule failed monomial exactness"
        );
    }

    ExactnessReport {
        order: rule.order(),
        alpha,
        max_degree,
        monomials,
        max_abs_error,
        max_rel_error,
        passed,
    }
}
