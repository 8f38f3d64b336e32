use cutstock_solver::{ConstraintOp, LpProblem, SolverBackend, Variable};
use log::debug;

use crate::data::ProblemData;
use crate::error::{CutStockError, MasterStage};

/// Optimal LP relaxation of the restricted master problem
#[derive(Debug, Clone)]
pub struct RelaxedMaster {
    /// One dual price per part, in part order
    pub duals: Vec<f64>,
    /// Fractional rolls per pattern
    pub rolls: Vec<f64>,
    pub objective_value: f64,
}

/// The covering problem over the current pattern set:
/// `min sum_j x_j` subject to `sum_j count_ij x_j >= demand_i` for every part.
pub fn build_master_problem(data: &ProblemData, integer: bool) -> LpProblem {
    let variables = (0..data.patterns().len())
        .map(|j| {
            let name = format!("x_{}", j);
            if integer {
                Variable::integer(name)
            } else {
                Variable::continuous(name)
            }
        })
        .collect::<Vec<_>>();
    let n = variables.len();

    let mut problem = LpProblem::new(variables);
    problem.set_objective(vec![1.0; n], true);

    let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); data.num_parts()];
    for (j, pattern) in data.patterns().iter().enumerate() {
        for (part, count) in pattern.iter() {
            rows[part].push((j, f64::from(count)));
        }
    }
    for (i, terms) in rows.into_iter().enumerate() {
        problem.add_constraint(format!("c_{}", i), terms, ConstraintOp::Ge, data.demands()[i]);
    }

    problem
}

/// Solve the LP relaxation and return its dual prices.
///
/// A non-optimal status is fatal for column generation.
pub fn solve_restricted_master(
    data: &ProblemData,
    backend: &dyn SolverBackend,
) -> Result<RelaxedMaster, CutStockError> {
    let problem = build_master_problem(data, false);
    let solution = backend.solve_lp(&problem);

    if !solution.status.is_optimal() || solution.duals.len() != data.num_parts() {
        return Err(CutStockError::MasterInfeasible {
            stage: MasterStage::Restricted,
            status: solution.status,
        });
    }

    debug!("relax value is {:.5}", solution.objective_value);

    // Zero-demand rows are degenerate; a zero price for them is still dual optimal.
    let duals = solution
        .duals
        .iter()
        .zip(data.demands())
        .map(|(&dual, &demand)| if demand == 0.0 { 0.0 } else { dual })
        .collect();

    Ok(RelaxedMaster {
        duals,
        rolls: solution.values,
        objective_value: solution.objective_value,
    })
}
