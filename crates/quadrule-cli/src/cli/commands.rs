use super::CliError;
use super::helpers::{
    format_real_list, load_policy, parse_real_list, parse_rule_method, write_json,
};
use quadrule_core::domain::{RuleMethod, RuleRequest};
use quadrule_core::numerics::{format_numeric_for_policy, AGREEMENT_CATEGORY, EXACTNESS_CATEGORY};
use quadrule_core::{build_rule, check_exactness, compare_rules, imtqlx};
use serde::Serialize;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct RuleArgs {
    /// Number of nodes
    #[arg(long)]
    order: usize,
    /// Exponent of the weight (1 - x^2)^alpha
    #[arg(long, allow_negative_numbers = true)]
    alpha: f64,
    /// Construction method: ek (Jacobi matrix) or ss (Newton polished)
    #[arg(long, default_value = "ek", value_parser = parse_rule_method)]
    method: RuleMethod,
    /// Emit the rule as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct ExactnessArgs {
    #[arg(long)]
    order: usize,
    #[arg(long, allow_negative_numbers = true)]
    alpha: f64,
    #[arg(long, default_value = "ek", value_parser = parse_rule_method)]
    method: RuleMethod,
    /// Numeric tolerance policy JSON; the builtin policy is used when omitted
    #[arg(long)]
    policy: Option<PathBuf>,
    /// Policy category that supplies the tolerance
    #[arg(long, default_value = EXACTNESS_CATEGORY)]
    category: String,
}

#[derive(clap::Args)]
pub(super) struct CompareArgs {
    #[arg(long)]
    order: usize,
    #[arg(long, allow_negative_numbers = true)]
    alpha: f64,
    #[arg(long)]
    policy: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct EigenArgs {
    /// Diagonal entries, comma separated
    #[arg(long, allow_hyphen_values = true)]
    diagonal: String,
    /// Sub-diagonal entries, comma separated (length n-1 or n)
    #[arg(long, allow_hyphen_values = true, default_value = "")]
    offdiagonal: String,
    /// Vector to transform by Q'; defaults to the first unit vector
    #[arg(long, allow_hyphen_values = true)]
    z: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuleOutput<'a> {
    order: usize,
    alpha: f64,
    method: &'static str,
    nodes: &'a [f64],
    weights: &'a [f64],
    weight_sum: f64,
}

pub(super) fn run_rule_command(args: RuleArgs) -> Result<i32, CliError> {
    let request = RuleRequest::new(args.order, args.alpha, args.method);
    let rule = build_rule(request)?;

    if args.json {
        write_json(&RuleOutput {
            order: rule.order(),
            alpha: request.alpha,
            method: request.method.as_str(),
            nodes: rule.nodes(),
            weights: rule.weights(),
            weight_sum: rule.weight_sum(),
        })?;
        return Ok(0);
    }

    println!(
        "Gauss-Gegenbauer rule: order={} alpha={} method={}",
        rule.order(),
        format_numeric_for_policy(request.alpha),
        request.method
    );
    for (index, (&node, &weight)) in rule.nodes().iter().zip(rule.weights()).enumerate() {
        println!(
            "{:>4} {} {}",
            index + 1,
            format_numeric_for_policy(node),
            format_numeric_for_policy(weight)
        );
    }
    println!("Weight sum: {}", format_numeric_for_policy(rule.weight_sum()));
    Ok(0)
}

pub(super) fn run_exactness_command(args: ExactnessArgs) -> Result<i32, CliError> {
    let policy = load_policy(args.policy.as_deref())?;
    let tolerance = match policy.tolerance_for_category(&args.category) {
        Some(tolerance) => tolerance,
        None => {
            tracing::warn!(
                category = %args.category,
                "policy category not found, using default tolerance"
            );
            policy.default_tolerance
        }
    };

    let request = RuleRequest::new(args.order, args.alpha, args.method);
    let rule = build_rule(request)?;
    let report = check_exactness(&rule, request.alpha, request.exact_degree(), tolerance);

    println!(
        "Exactness check: order={} alpha={} method={} max_degree={}",
        report.order,
        format_numeric_for_policy(report.alpha),
        request.method,
        report.max_degree
    );
    for monomial in &report.monomials {
        println!(
            "  x^{:<3} quadrature={} exact={} abs_err={} {}",
            monomial.degree,
            format_numeric_for_policy(monomial.quadrature),
            format_numeric_for_policy(monomial.exact),
            format_numeric_for_policy(monomial.abs_error),
            if monomial.passes { "ok" } else { "FAIL" }
        );
    }
    println!(
        "Max abs error: {}",
        format_numeric_for_policy(report.max_abs_error)
    );
    println!(
        "Max rel error: {}",
        format_numeric_for_policy(report.max_rel_error)
    );
    println!(
        "Exactness status: {}",
        if report.passed { "PASS" } else { "FAIL" }
    );

    if report.passed { Ok(0) } else { Ok(1) }
}

pub(super) fn run_compare_command(args: CompareArgs) -> Result<i32, CliError> {
    let policy = load_policy(args.policy.as_deref())?;
    let tolerance = policy.resolve(AGREEMENT_CATEGORY);

    let eigen_request = RuleRequest::new(args.order, args.alpha, RuleMethod::JacobiMatrix);
    let eigen_rule = build_rule(eigen_request)?;
    let newton_rule = build_rule(RuleRequest {
        method: RuleMethod::NewtonPolished,
        ..eigen_request
    })?;
    let comparison = compare_rules(&eigen_rule, &newton_rule, tolerance)?;

    println!(
        "Builder comparison: order={} alpha={} ({} vs {})",
        args.order,
        format_numeric_for_policy(args.alpha),
        RuleMethod::JacobiMatrix,
        RuleMethod::NewtonPolished
    );
    println!(
        "Max node abs diff: {}",
        format_numeric_for_policy(comparison.max_node_abs_diff)
    );
    println!(
        "Max weight abs diff: {}",
        format_numeric_for_policy(comparison.max_weight_abs_diff)
    );
    println!(
        "Max weight rel diff: {}",
        format_numeric_for_policy(comparison.max_weight_rel_diff)
    );
    println!(
        "Agreement status: {}",
        if comparison.passes { "PASS" } else { "FAIL" }
    );

    if comparison.passes { Ok(0) } else { Ok(1) }
}

pub(super) fn run_eigen_command(args: EigenArgs) -> Result<i32, CliError> {
    let diagonal = parse_real_list("diagonal", &args.diagonal)?;
    let offdiagonal = parse_real_list("offdiagonal", &args.offdiagonal)?;
    let z = match args.z.as_deref() {
        Some(source) => parse_real_list("z", source)?,
        None => {
            let mut unit = vec![0.0; diagonal.len()];
            if let Some(first) = unit.first_mut() {
                *first = 1.0;
            }
            unit
        }
    };

    let solution = imtqlx(&diagonal, &offdiagonal, &z)?;

    if args.json {
        write_json(&solution)?;
        return Ok(0);
    }

    println!("Eigenvalues: {}", format_real_list(&solution.eigenvalues));
    println!("Transformed: {}", format_real_list(&solution.transformed));
    println!("Sweeps: {}", solution.sweeps);
    Ok(0)
}
