//! Stroud-Secrest construction of Gauss-Gegenbauer rules.
//!
//! Roots are generated from the largest down. Each starts from an empirical
//! asymptotic estimate that depends on its position and is polished by Newton
//! iteration on the monic three-term recurrence
//! `p_k(x) = x p_{k-1}(x) - c_{k-1} p_{k-2}(x)`.

use super::{gegenbauer_zeroth_moment, GegenbauerError, QuadratureRule, SS_ALPHA_LOWER_BOUND};

/// Newton step budget per root.
pub const NEWTON_MAX_STEPS: usize = 10;

/// Degree-`n` value `p2`, its derivative `dp2` and the degree-`n-1` value `p1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecurrenceValue {
    pub p2: f64,
    pub dp2: f64,
    pub p1: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonRoot {
    pub x: f64,
    /// Derivative of the degree-`n` polynomial at the last evaluated iterate.
    pub dp2: f64,
    /// Degree-`n-1` polynomial at the last evaluated iterate.
    pub p1: f64,
    pub steps: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuessPosition {
    First,
    Second,
    Third,
    Interior,
    SecondToLast,
    Last,
}

impl GuessPosition {
    fn for_index(index: usize, order: usize) -> Self {
        match index {
            0 => Self::First,
            1 => Self::Second,
            2 => Self::Third,
            _ if index + 2 < order => Self::Interior,
            _ if index + 2 == order => Self::SecondToLast,
            _ => Self::Last,
        }
    }
}

/// `c[0] = 0`, `c[1] = 1 / (2a + 3)`, `c[k] = k (2a + k) / ((2a + 2k + 1)(2a + 2k - 1))`.
pub fn gegenbauer_ss_recurrence_coefficients(order: usize, alpha: f64) -> Vec<f64> {
    let mut coefficients = vec![0.0; order];
    if order >= 2 {
        coefficients[1] = 1.0 / (2.0 * alpha + 3.0);
    }
    for (index, coefficient) in coefficients.iter_mut().enumerate().skip(2) {
        let k = index as f64;
        *coefficient =
            k * (2.0 * alpha + k) / ((2.0 * alpha + 2.0 * k + 1.0) * (2.0 * alpha + 2.0 * k - 1.0));
    }
    coefficients
}

/// Evaluate the degree-`order` recurrence polynomial, its derivative and the
/// degree-`order - 1` polynomial at `x`.
pub fn gegenbauer_ss_recur(x: f64, order: usize, coefficients: &[f64]) -> RecurrenceValue {
    let mut p1 = 1.0;
    let mut dp1 = 0.0;
    let mut p2 = x;
    let mut dp2 = 1.0;

    for &coefficient in coefficients.iter().take(order).skip(1) {
        let p0 = p1;
        let dp0 = dp1;
        p1 = p2;
        dp1 = dp2;
        p2 = x * p1 - coefficient * p0;
        dp2 = x * dp1 + p1 - coefficient * dp0;
    }

    RecurrenceValue { p2, dp2, p1 }
}

/// Newton iteration from `x0`, stopping once `|step| <= eps (|x| + 1)`.
///
/// Exhausting [`NEWTON_MAX_STEPS`] is not an error: the last iterate is
/// returned with `converged == false`.
pub fn gegenbauer_ss_root(x0: f64, order: usize, coefficients: &[f64]) -> NewtonRoot {
    let eps = f64::EPSILON;
    let mut x = x0;
    let mut value = RecurrenceValue {
        p2: 0.0,
        dp2: 1.0,
        p1: 1.0,
    };

    for step in 1..=NEWTON_MAX_STEPS {
        value = gegenbauer_ss_recur(x, order, coefficients);
        let delta = value.p2 / value.dp2;
        x -= delta;
        if delta.abs() <= eps * (x.abs() + 1.0) {
            return NewtonRoot {
                x,
                dp2: value.dp2,
                p1: value.p1,
                steps: step,
                converged: true,
            };
        }
    }

    tracing::warn!(
        order,
        x0,
        x,
        max_steps = NEWTON_MAX_STEPS,
        "Newton polishing stopped at the step limit"
    );
    NewtonRoot {
        x,
        dp2: value.dp2,
        p1: value.p1,
        steps: NEWTON_MAX_STEPS,
        converged: false,
    }
}

/// Gauss-Gegenbauer rule by the Stroud-Secrest method.
///
/// Requires `order >= 1` and `alpha > -1`.
pub fn gegenbauer_ss_compute(order: usize, alpha: f64) -> Result<QuadratureRule, GegenbauerError> {
    if order == 0 {
        return Err(GegenbauerError::InvalidOrder { order });
    }
    if !alpha.is_finite() || alpha <= SS_ALPHA_LOWER_BOUND {
        return Err(GegenbauerError::InvalidAlpha {
            alpha,
            requirement: "alpha > -1.0",
        });
    }

    let coefficients = gegenbauer_ss_recurrence_coefficients(order, alpha);
    let product: f64 = coefficients.iter().skip(1).product();
    let cc = gegenbauer_zeroth_moment(alpha) * product;

    let mut nodes = Vec::with_capacity(order);
    let mut weights = Vec::with_capacity(order);
    let mut unconverged = 0;
    let mut x = 0.0;

    for index in 0..order {
        x = initial_guess(index, order, alpha, x, &nodes);
        let root = gegenbauer_ss_root(x, order, &coefficients);
        if !root.converged {
            unconverged += 1;
        }

        x = root.x;
        nodes.push(x);
        weights.push(cc / (root.dp2 * root.p1));
    }

    if unconverged > 0 {
        tracing::warn!(order, alpha, unconverged, "rule contains unpolished roots");
    }

    nodes.reverse();
    weights.reverse();
    QuadratureRule::new(nodes, weights)
}

// Empirical estimates for the zeros of the Jacobi polynomial with equal
// exponents. `previous` is the last polished root and `roots` holds every root
// found so far (descending).
fn initial_guess(index: usize, order: usize, alpha: f64, previous: f64, roots: &[f64]) -> f64 {
    let n = order as f64;
    let x = previous;

    match GuessPosition::for_index(index, order) {
        GuessPosition::First => {
            let an = alpha / n;
            let r1 = (1.0 + alpha) * (2.78 / (4.0 + n * n) + 0.768 * an / n);
            let r2 = 1.0 + 2.44 * an + 1.282 * an * an;
            (r2 - r1) / r2
        }
        GuessPosition::Second => {
            let r1 = (4.1 + alpha) / ((1.0 + alpha) * (1.0 + 0.156 * alpha));
            let r2 = 1.0 + 0.06 * (n - 8.0) * (1.0 + 0.12 * alpha) / n;
            let r3 = 1.0 + 0.012 * alpha * (1.0 + 0.25 * alpha.abs()) / n;
            x - r1 * r2 * r3 * (1.0 - x)
        }
        GuessPosition::Third => {
            let r1 = (1.67 + 0.28 * alpha) / (1.0 + 0.37 * alpha);
            let r2 = 1.0 + 0.22 * (n - 8.0) / n;
            let r3 = 1.0 + 8.0 * alpha / ((6.28 + alpha) * n * n);
            x - r1 * r2 * r3 * (roots[0] - x)
        }
        GuessPosition::Interior => {
            3.0 * roots[index - 1] - 3.0 * roots[index - 2] + roots[index - 3]
        }
        GuessPosition::SecondToLast => {
            let r1 = (1.0 + 0.235 * alpha) / (0.766 + 0.119 * alpha);
            let r2 = 1.0 / (1.0 + 0.639 * (n - 4.0) / (1.0 + 0.71 * (n - 4.0)));
            let r3 = 1.0 / (1.0 + 20.0 * alpha / ((7.5 + alpha) * n * n));
            x + r1 * r2 * r3 * (x - roots[index - 2])
        }
        GuessPosition::Last => {
            let r1 = (1.0 + 0.37 * alpha) / (1.67 + 0.28 * alpha);
            let r2 = 1.0 / (1.0 + 0.22 * (n - 8.0) / n);
            let r3 = 1.0 / (1.0 + 8.0 * alpha / ((6.28 + alpha) * n * n));
            x + r1 * r2 * r3 * (x - roots[index - 2])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        gegenbauer_ss_compute, gegenbauer_ss_recur, gegenbauer_ss_recurrence_coefficients,
        gegenbauer_ss_root, GuessPosition, NEWTON_MAX_STEPS,
    };
    use crate::rules::{gegenbauer_zeroth_moment, GegenbauerError};

    #[test]
    fn guess_positions_follow_the_tagged_layout() {
        let layout: Vec<GuessPosition> = (0..7).map(|index| GuessPosition::for_index(index, 7)).collect();
        assert_eq!(
            layout,
            vec![
                GuessPosition::First,
                GuessPosition::Second,
                GuessPosition::Third,
                GuessPosition::Interior,
                GuessPosition::Interior,
                GuessPosition::SecondToLast,
                GuessPosition::Last,
            ]
        );
        assert_eq!(GuessPosition::for_index(2, 3), GuessPosition::Third);
        assert_eq!(GuessPosition::for_index(3, 4), GuessPosition::Last);
    }

    #[test]
    fn recurrence_coefficients_match_legendre_for_zero_alpha() {
        let coefficients = gegenbauer_ss_recurrence_coefficients(5, 0.0);
        assert_eq!(coefficients[0], 0.0);
        for (index, &coefficient) in coefficients.iter().enumerate().skip(1) {
            let k = index as f64;
            let expected = k * k / (4.0 * k * k - 1.0);
            assert!(
                (coefficient - expected).abs() <= 1.0e-15,
                "c[{index}] expected={expected} actual={coefficient}"
            );
        }
    }

    #[test]
    fn recurrence_evaluates_monic_legendre_polynomials() {
        let coefficients = gegenbauer_ss_recurrence_coefficients(3, 0.0);
        let x = 0.3;
        let value = gegenbauer_ss_recur(x, 3, &coefficients);

        // Monic P3 = x^3 - 3x/5, P2 = x^2 - 1/3.
        assert!((value.p2 - (x * x * x - 0.6 * x)).abs() <= 1.0e-15);
        assert!((value.dp2 - (3.0 * x * x - 0.6)).abs() <= 1.0e-15);
        assert!((value.p1 - (x * x - 1.0 / 3.0)).abs() <= 1.0e-15);
    }

    #[test]
    fn recurrence_of_order_one_is_linear() {
        let value = gegenbauer_ss_recur(0.75, 1, &[0.0]);
        assert_eq!(value.p2, 0.75);
        assert_eq!(value.dp2, 1.0);
        assert_eq!(value.p1, 1.0);
    }

    #[test]
    fn single_point_rule_is_the_zeroth_moment_at_the_origin() {
        let alpha = 0.5;
        let rule = gegenbauer_ss_compute(1, alpha).expect("rule");
        assert!(rule.nodes()[0].abs() <= f64::EPSILON);
        let expected = gegenbauer_zeroth_moment(alpha);
        assert!((rule.weights()[0] - expected).abs() <= 1.0e-14 * expected);
    }

    #[test]
    fn two_point_legendre_rule_matches_closed_form() {
        let rule = gegenbauer_ss_compute(2, 0.0).expect("rule");
        let root = 1.0 / 3.0_f64.sqrt();
        assert!((rule.nodes()[0] + root).abs() <= 1.0e-15);
        assert!((rule.nodes()[1] - root).abs() <= 1.0e-15);
        assert!((rule.weights()[0] - 1.0).abs() <= 1.0e-14);
        assert!((rule.weights()[1] - 1.0).abs() <= 1.0e-14);
    }

    #[test]
    fn nodes_ascend_after_reversal() {
        for order in 1..=12 {
            let rule = gegenbauer_ss_compute(order, 0.75).expect("rule");
            assert!(
                rule.nodes().windows(2).all(|pair| pair[0] < pair[1]),
                "order={order} nodes={:?}",
                rule.nodes()
            );
        }
    }

    #[test]
    fn newton_polish_is_a_fixed_point_at_converged_roots() {
        let order = 8;
        let alpha = 1.5;
        let coefficients = gegenbauer_ss_recurrence_coefficients(order, alpha);
        let rule = gegenbauer_ss_compute(order, alpha).expect("rule");

        for &node in rule.nodes() {
            let again = gegenbauer_ss_root(node, order, &coefficients);
            assert!(again.converged);
            assert!(
                (again.x - node).abs() <= 16.0 * f64::EPSILON * (node.abs() + 1.0),
                "node={node:.17e} repolished={:.17e}",
                again.x
            );
        }
    }

    #[test]
    fn newton_polish_returns_best_effort_at_step_limit() {
        let order = 10;
        let coefficients = gegenbauer_ss_recurrence_coefficients(order, 0.0);
        let root = gegenbauer_ss_root(1.0e6, order, &coefficients);

        assert!(!root.converged);
        assert_eq!(root.steps, NEWTON_MAX_STEPS);
        assert!(root.x.is_finite());
        assert!(root.x < 1.0e6 && root.x > 1.0);
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert_eq!(
            gegenbauer_ss_compute(0, 0.0).expect_err("order zero"),
            GegenbauerError::InvalidOrder { order: 0 }
        );
        assert_eq!(
            gegenbauer_ss_compute(4, -1.0).expect_err("alpha at bound"),
            GegenbauerError::InvalidAlpha {
                alpha: -1.0,
                requirement: "alpha > -1.0",
            }
        );
        assert!(
            gegenbauer_ss_compute(4, f64::INFINITY)
                .expect_err("infinite alpha")
                .is_invalid_parameter()
        );
    }
}
