/// The result of solving an LP or MIP problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal values for each variable
    pub values: Vec<f64>,
    /// Dual value for each constraint, in constraint order (LP solves only)
    ///
    /// Marginal change of the objective per unit increase of the
    /// constraint's right-hand side.
    pub duals: Vec<f64>,
    /// Optimal objective value
    pub objective_value: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// Solver encountered an error or hit an iteration/node limit
    Error,
}

impl SolutionStatus {
    pub fn is_optimal(self) -> bool {
        self == SolutionStatus::Optimal
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SolutionStatus::Optimal => "OPTIMAL",
            SolutionStatus::Infeasible => "INFEASIBLE",
            SolutionStatus::Unbounded => "UNBOUNDED",
            SolutionStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}

impl Solution {
    pub fn optimal(values: Vec<f64>, duals: Vec<f64>, objective_value: f64) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            values,
            duals,
            objective_value,
        }
    }

    pub fn infeasible() -> Self {
        Self::without_values(SolutionStatus::Infeasible, f64::INFINITY)
    }

    pub fn unbounded() -> Self {
        Self::without_values(SolutionStatus::Unbounded, f64::NEG_INFINITY)
    }

    pub fn error() -> Self {
        Self::without_values(SolutionStatus::Error, f64::NAN)
    }

    fn without_values(status: SolutionStatus, objective_value: f64) -> Self {
        Self {
            status,
            values: Vec::new(),
            duals: Vec::new(),
            objective_value,
        }
    }
}
