use super::{gegenbauer_zeroth_moment, GegenbauerError, QuadratureRule};
use crate::numerics::special::SymmetricTridiagonal;

/// Jacobi matrix of the monic Gegenbauer family: zero diagonal (the weight is
/// even) and off-diagonal `sqrt(b_k)` from the closed-form recurrence.
pub fn gegenbauer_jacobi_matrix(
    order: usize,
    alpha: f64,
) -> Result<SymmetricTridiagonal, GegenbauerError> {
    validate_parameters(order, alpha)?;

    let mut offdiagonal = vec![0.0; order];
    offdiagonal[0] = 4.0 * (alpha + 1.0).powi(2)
        / ((2.0 * alpha + 3.0) * (2.0 * alpha + 2.0).powi(2));
    for (index, entry) in offdiagonal.iter_mut().enumerate().skip(1) {
        let k = (index + 1) as f64;
        let abi = 2.0 * (alpha + k);
        *entry = 4.0 * k * (alpha + k).powi(2) * (2.0 * alpha + k)
            / ((abi - 1.0) * (abi + 1.0) * abi * abi);
    }
    for entry in &mut offdiagonal {
        *entry = entry.sqrt();
    }

    let diagonal = vec![0.0; order];
    Ok(SymmetricTridiagonal::new(&diagonal, &offdiagonal)?)
}

/// Gauss-Gegenbauer rule from the eigen-decomposition of the Jacobi matrix.
///
/// Nodes are the eigenvalues; weights are `zemu * q_0i^2`, obtained by
/// transforming `z = sqrt(zemu) e_0`. The range of `alpha` is not checked here;
/// see [`super::gegenbauer_alpha_check`].
pub fn gegenbauer_ek_compute(order: usize, alpha: f64) -> Result<QuadratureRule, GegenbauerError> {
    let matrix = gegenbauer_jacobi_matrix(order, alpha)?;

    let zemu = gegenbauer_zeroth_moment(alpha);
    if !zemu.is_finite() {
        return Err(GegenbauerError::NonFiniteResult {
            field: "zeroth moment",
            index: 0,
        });
    }

    let mut z = vec![0.0; order];
    z[0] = zemu.sqrt();

    let solution = matrix.eigen_solve(&z)?;
    let weights = solution
        .transformed
        .iter()
        .map(|component| component * component)
        .collect();

    QuadratureRule::new(solution.eigenvalues, weights)
}

fn validate_parameters(order: usize, alpha: f64) -> Result<(), GegenbauerError> {
    if order == 0 {
        return Err(GegenbauerError::InvalidOrder { order });
    }
    if !alpha.is_finite() {
        return Err(GegenbauerError::InvalidAlpha {
            alpha,
            requirement: "a finite alpha",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{gegenbauer_ek_compute, gegenbauer_jacobi_matrix};
    use crate::rules::{gegenbauer_ss_recurrence_coefficients, gegenbauer_zeroth_moment, GegenbauerError};
    use std::f64::consts::PI;

    #[test]
    fn single_point_rule_is_the_zeroth_moment_at_the_origin() {
        let alpha = 0.5;
        let rule = gegenbauer_ek_compute(1, alpha).expect("rule");
        assert_eq!(rule.nodes(), &[0.0]);
        assert_scalar_close(
            "weight",
            gegenbauer_zeroth_moment(alpha),
            rule.weights()[0],
            1.0e-14,
        );
    }

    #[test]
    fn chebyshev_first_kind_limit_matches_closed_form() {
        let order = 5;
        let rule = gegenbauer_ek_compute(order, -0.5).expect("rule");
        for (index, (&node, &weight)) in rule.nodes().iter().zip(rule.weights()).enumerate() {
            let k = (order - index) as f64;
            let expected_node = ((2.0 * k - 1.0) * PI / (2.0 * order as f64)).cos();
            assert_scalar_close(&format!("node {index}"), expected_node, node, 1.0e-14);
            assert_scalar_close(
                &format!("weight {index}"),
                PI / order as f64,
                weight,
                1.0e-13,
            );
        }
    }

    #[test]
    fn chebyshev_second_kind_limit_matches_closed_form() {
        let order = 6;
        let rule = gegenbauer_ek_compute(order, 0.5).expect("rule");
        let scale = PI / (order as f64 + 1.0);
        for (index, (&node, &weight)) in rule.nodes().iter().zip(rule.weights()).enumerate() {
            let angle = (order - index) as f64 * scale;
            assert_scalar_close(&format!("node {index}"), angle.cos(), node, 1.0e-14);
            assert_scalar_close(
                &format!("weight {index}"),
                scale * angle.sin().powi(2),
                weight,
                1.0e-13,
            );
        }
    }

    #[test]
    fn nodes_are_ascending_and_symmetric() {
        let rule = gegenbauer_ek_compute(7, 1.3).expect("rule");
        let nodes = rule.nodes();
        assert!(nodes.windows(2).all(|pair| pair[0] < pair[1]));
        for index in 0..nodes.len() {
            let mirror = nodes[nodes.len() - 1 - index];
            assert!((nodes[index] + mirror).abs() <= 1.0e-14);
        }
        assert!(nodes[0] > -1.0 && nodes[nodes.len() - 1] < 1.0);
    }

    #[test]
    fn jacobi_offdiagonal_squares_match_recurrence_coefficients() {
        let order = 6;
        let alpha = 0.8;
        let matrix = gegenbauer_jacobi_matrix(order, alpha).expect("matrix");
        let coefficients = gegenbauer_ss_recurrence_coefficients(order, alpha);

        assert!(matrix.diagonal().iter().all(|&entry| entry == 0.0));
        for index in 0..order - 1 {
            let squared = matrix.offdiagonal()[index].powi(2);
            assert_scalar_close(
                &format!("b_{index}"),
                coefficients[index + 1],
                squared,
                1.0e-14,
            );
        }
        assert_eq!(matrix.offdiagonal()[order - 1], 0.0);
    }

    #[test]
    fn rejects_empty_order_and_non_finite_alpha() {
        assert_eq!(
            gegenbauer_ek_compute(0, 0.5).expect_err("order zero"),
            GegenbauerError::InvalidOrder { order: 0 }
        );
        assert!(matches!(
            gegenbauer_ek_compute(3, f64::NAN).expect_err("nan alpha"),
            GegenbauerError::InvalidAlpha { .. }
        ));
    }

    fn assert_scalar_close(label: &str, expected: f64, actual: f64, abs_tol: f64) {
        let abs_diff = (actual - expected).abs();
        assert!(
            abs_diff <= abs_tol * expected.abs().max(1.0),
            "{label} expected={expected:.15e} actual={actual:.15e} abs_diff={abs_diff:.3e}"
        );
    }
}
