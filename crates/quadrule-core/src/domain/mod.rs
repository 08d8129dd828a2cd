pub mod errors;

pub use errors::{QuadruleError, QuadruleErrorCategory, QuadruleResult};

use std::fmt::{Display, Formatter};

/// Construction path for a Gauss-Gegenbauer rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RuleMethod {
    /// Diagonalise the Jacobi matrix with the implicit QL solver.
    #[default]
    JacobiMatrix,
    /// Stroud-Secrest initial guesses polished by Newton iteration.
    NewtonPolished,
}

impl RuleMethod {
    pub const ALL: [RuleMethod; 2] = [Self::JacobiMatrix, Self::NewtonPolished];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JacobiMatrix => "EK",
            Self::NewtonPolished => "SS",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "EK" | "JACOBI" | "EIGEN" => Some(Self::JacobiMatrix),
            "SS" | "NEWTON" | "STROUD-SECREST" => Some(Self::NewtonPolished),
            _ => None,
        }
    }
}

impl Display for RuleMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleRequest {
    pub order: usize,
    pub alpha: f64,
    pub method: RuleMethod,
}

impl RuleRequest {
    pub fn new(order: usize, alpha: f64, method: RuleMethod) -> Self {
        Self {
            order,
            alpha,
            method,
        }
    }

    /// Largest monomial degree a rule of this order integrates exactly.
    pub fn exact_degree(&self) -> usize {
        (2 * self.order).saturating_sub(1)
    }
}
