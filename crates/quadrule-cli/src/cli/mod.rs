mod commands;
mod helpers;

use clap::Parser;
use quadrule_core::domain::QuadruleError;

pub fn run_from_env() -> i32 {
    helpers::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let compatibility_error = error.as_quadrule_error();
            eprintln!("{}", compatibility_error.diagnostic_line());
            if let Some(summary_line) = compatibility_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            compatibility_error.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "quadrule", about = "Gauss-Gegenbauer quadrature rule construction")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Print the nodes and weights of a Gauss-Gegenbauer rule
    Rule(commands::RuleArgs),
    /// Check that a rule integrates monomials up to degree 2n-1
    Exactness(commands::ExactnessArgs),
    /// Cross-check the eigenvalue and Newton constructions
    Compare(commands::CompareArgs),
    /// Diagonalise a symmetric tridiagonal matrix with the implicit QL solver
    Eigen(commands::EigenArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Rule(args) => commands::run_rule_command(args),
        CliCommand::Exactness(args) => commands::run_exactness_command(args),
        CliCommand::Compare(args) => commands::run_compare_command(args),
        CliCommand::Eigen(args) => commands::run_eigen_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(QuadruleError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_quadrule_error(&self) -> QuadruleError {
        match self {
            Self::Usage(message) => {
                QuadruleError::input_validation("INPUT.CLI_USAGE", message.clone())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => QuadruleError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

impl From<quadrule_core::GegenbauerError> for CliError {
    fn from(error: quadrule_core::GegenbauerError) -> Self {
        Self::Compute(error.into())
    }
}

impl From<quadrule_core::TridiagonalEigenError> for CliError {
    fn from(error: quadrule_core::TridiagonalEigenError) -> Self {
        quadrule_core::GegenbauerError::from(error).into()
    }
}
