pub mod special;

pub use special::{
    gamma, imtqlx, DenseRealMatrix, ImplicitQlSolver, SymmetricTridiagonal, TridiagonalEigenApi,
    TridiagonalEigenError, TridiagonalEigenSolution,
};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const NUMERIC_TOLERANCE_POLICY_PATH: &str = "tasks/numeric-tolerance-policy.json";

/// Category used when checking monomial exactness of a single rule.
pub const EXACTNESS_CATEGORY: &str = "monomial_exactness";
/// Category used when cross-checking the two rule builders against each other.
pub const AGREEMENT_CATEGORY: &str = "builder_agreement";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct NumericTolerance {
    #[serde(rename = "absTol")]
    pub abs_tol: f64,
    #[serde(rename = "relTol")]
    pub rel_tol: f64,
    #[serde(rename = "relativeFloor")]
    pub relative_floor: f64,
}

impl NumericTolerance {
    pub const fn new(abs_tol: f64, rel_tol: f64, relative_floor: f64) -> Self {
        Self {
            abs_tol,
            rel_tol,
            relative_floor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyToleranceComparison {
    pub abs_diff: f64,
    pub rel_diff: f64,
    pub passes: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NumericTolerancePolicy {
    #[serde(rename = "policyVersion")]
    pub policy_version: String,
    #[serde(rename = "defaultTolerance")]
    pub default_tolerance: NumericTolerance,
    #[serde(default)]
    pub categories: Vec<NumericToleranceCategory>,
}

impl NumericTolerancePolicy {
    pub fn tolerance_for_category(&self, category_id: &str) -> Option<NumericTolerance> {
        self.categories
            .iter()
            .find(|category| category.id == category_id)
            .and_then(|category| category.tolerance)
    }

    /// Category tolerance, or the policy default when the category is absent.
    pub fn resolve(&self, category_id: &str) -> NumericTolerance {
        self.tolerance_for_category(category_id)
            .unwrap_or(self.default_tolerance)
    }
}

impl Default for NumericTolerancePolicy {
    fn default() -> Self {
        Self {
            policy_version: "builtin".to_string(),
            default_tolerance: NumericTolerance::new(1.0e-12, 1.0e-10, 1.0e-12),
            categories: vec![
                NumericToleranceCategory {
                    id: EXACTNESS_CATEGORY.to_string(),
                    description: "quadrature sum against exact Gegenbauer moments".to_string(),
                    tolerance: Some(NumericTolerance::new(1.0e-13, 1.0e-10, 1.0e-12)),
                },
                NumericToleranceCategory {
                    id: AGREEMENT_CATEGORY.to_string(),
                    description: "eigenvalue and Newton builders on the same order and alpha"
                        .to_string(),
                    tolerance: Some(NumericTolerance::new(1.0e-12, 1.0e-8, 1.0e-12)),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NumericToleranceCategory {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub tolerance: Option<NumericTolerance>,
}

#[derive(Debug, thiserror::Error)]
pub enum NumericTolerancePolicyError {
    #[error("failed to read numeric tolerance policy '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse numeric tolerance policy '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn load_numeric_tolerance_policy(
    policy_path: impl AsRef<Path>,
) -> Result<NumericTolerancePolicy, NumericTolerancePolicyError> {
    let policy_path = policy_path.as_ref();
    let source =
        fs::read_to_string(policy_path).map_err(|source| NumericTolerancePolicyError::Read {
            path: policy_path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&source).map_err(|source| NumericTolerancePolicyError::Parse {
        path: policy_path.to_path_buf(),
        source,
    })
}

pub fn compare_with_policy_tolerance(
    baseline: f64,
    actual: f64,
    tolerance: NumericTolerance,
) -> PolicyToleranceComparison {
    let abs_diff = (actual - baseline).abs();
    let rel_denominator = baseline.abs().max(tolerance.relative_floor);
    let rel_diff = abs_diff / rel_denominator;
    let passes = abs_diff <= tolerance.abs_tol || abs_diff <= tolerance.rel_tol * rel_denominator;

    PolicyToleranceComparison {
        abs_diff,
        rel_diff,
        passes,
    }
}

pub fn format_numeric_for_policy(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }

    if value == f64::INFINITY {
        return "inf".to_string();
    }

    if value == f64::NEG_INFINITY {
        return "-inf".to_string();
    }

    format!("{value:.15E}")
}

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for &value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

pub fn stable_weighted_sum(values: &[f64], weights: &[f64]) -> Option<f64> {
    if values.len() != weights.len() {
        return None;
    }

    let mut sum = 0.0;
    let mut correction = 0.0;
    for (&value, &weight) in values.iter().zip(weights) {
        kahan_add(&mut sum, &mut correction, value * weight);
    }

    Some(sum)
}
