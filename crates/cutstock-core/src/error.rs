use std::fmt;
use std::time::Duration;

use cutstock_solver::{SolutionStatus, SolverError};
use thiserror::Error;

use crate::data::DataError;
use crate::parser::ParseError;

/// Which master problem failed
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterStage {
    /// The LP relaxation solved every column-generation iteration
    Restricted,
    /// The integer resolve over the final pattern set
    FinalInteger,
}

impl fmt::Display for MasterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MasterStage::Restricted => f.write_str("restricted"),
            MasterStage::FinalInteger => f.write_str("final integer"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CutStockError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Invalid data: {0}")]
    Data(#[from] DataError),
    #[error(transparent)]
    SolverUnavailable(#[from] SolverError),
    #[error("The {stage} master problem has no optimal solution (status {status})")]
    MasterInfeasible {
        stage: MasterStage,
        status: SolutionStatus,
    },
    #[error("Column generation did not converge within {iterations} iterations")]
    NonConvergence { iterations: usize },
    #[error("Column generation exceeded its time limit after {elapsed:?}")]
    TimeLimit { elapsed: Duration },
}
