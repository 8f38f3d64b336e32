use thiserror::Error;

use crate::branch::BranchAndBound;
use crate::problem::LpProblem;
use crate::simplex::Simplex;
use crate::solution::Solution;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Solver backend '{0}' is unavailable (known backends: {known})", known = BACKENDS.join(", "))]
    Unavailable(String),
}

/// Names accepted by [`create_backend`]
pub const BACKENDS: &[&str] = &["simplex"];

/// An LP/MIP engine. Every call builds its own model and keeps nothing between calls.
pub trait SolverBackend {
    fn name(&self) -> &str;

    /// Solve the continuous relaxation, reporting one dual per constraint.
    /// Integrality flags are ignored.
    fn solve_lp(&self, problem: &LpProblem) -> Solution;

    /// Solve with integrality enforced. Duals are not reported.
    fn solve_mip(&self, problem: &LpProblem) -> Solution;
}

/// Dense simplex for LPs, branch and bound over it for MIPs
#[derive(Default)]
pub struct SimplexBackend {
    simplex: Simplex,
    branch_and_bound: BranchAndBound,
}

impl SimplexBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SolverBackend for SimplexBackend {
    fn name(&self) -> &str {
        "simplex"
    }

    fn solve_lp(&self, problem: &LpProblem) -> Solution {
        self.simplex.solve(problem)
    }

    fn solve_mip(&self, problem: &LpProblem) -> Solution {
        self.branch_and_bound.solve(problem)
    }
}

/// Look up a backend by name. Unknown names are an error, never a silent substitute.
pub fn create_backend(name: &str) -> Result<Box<dyn SolverBackend>, SolverError> {
    match name.to_ascii_lowercase().as_str() {
        "simplex" => Ok(Box::new(SimplexBackend::new())),
        _ => Err(SolverError::Unavailable(name.to_string())),
    }
}
