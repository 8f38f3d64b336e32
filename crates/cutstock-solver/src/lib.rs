mod backend;
mod branch;
mod problem;
mod simplex;
mod solution;

pub use backend::{BACKENDS, SimplexBackend, SolverBackend, SolverError, create_backend};
pub use branch::BranchAndBound;
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, Variable};
pub use simplex::Simplex;
pub use solution::{Solution, SolutionStatus};
