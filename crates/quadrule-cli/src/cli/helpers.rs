use super::CliError;
use anyhow::Context;
use quadrule_core::domain::{QuadruleError, RuleMethod};
use quadrule_core::numerics::{
    format_numeric_for_policy, load_numeric_tolerance_policy, NumericTolerancePolicy,
    NumericTolerancePolicyError,
};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub(super) const LOG_ENV_VAR: &str = "QUADRULE_LOG";

pub(super) fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be installed when run from a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub(super) fn load_policy(policy_path: Option<&Path>) -> Result<NumericTolerancePolicy, CliError> {
    let Some(policy_path) = policy_path else {
        return Ok(NumericTolerancePolicy::default());
    };

    load_numeric_tolerance_policy(policy_path).map_err(|error| {
        let message = error.to_string();
        let error = match error {
            NumericTolerancePolicyError::Read { .. } => {
                QuadruleError::io_system("IO.POLICY_READ", message)
            }
            NumericTolerancePolicyError::Parse { .. } => {
                QuadruleError::input_validation("INPUT.POLICY_PARSE", message)
            }
        };
        CliError::Compute(error)
    })
}

pub(super) fn parse_rule_method(token: &str) -> Result<RuleMethod, String> {
    RuleMethod::from_token(token).ok_or_else(|| {
        format!("unknown rule method '{token}' (expected 'ek' or 'ss')")
    })
}

/// Parses a comma or whitespace separated list of reals.
pub(super) fn parse_real_list(label: &str, source: &str) -> Result<Vec<f64>, CliError> {
    source
        .split(|character: char| character == ',' || character.is_whitespace())
        .filter(|token| !token.is_empty())
        .enumerate()
        .map(|(index, token)| {
            token.parse::<f64>().map_err(|_| {
                CliError::Compute(QuadruleError::input_validation(
                    "INPUT.REAL_LIST",
                    format!("{label} entry {index} is not a real number: '{token}'"),
                ))
            })
        })
        .collect()
}

pub(super) fn format_real_list(values: &[f64]) -> String {
    values
        .iter()
        .map(|&value| format_numeric_for_policy(value))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(super) fn write_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(value).context("failed to serialize command output")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}").context("failed to write command output")?;
    Ok(())
}
