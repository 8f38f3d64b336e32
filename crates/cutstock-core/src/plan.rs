use cutstock_solver::SolverBackend;
use log::{debug, info};

use crate::data::{Pattern, ProblemData};
use crate::error::{CutStockError, MasterStage};
use crate::master::build_master_problem;

/// Rolls cut to one pattern
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntry {
    /// Position of the pattern in `ProblemData::patterns`
    pub pattern_index: usize,
    pub pattern: Pattern,
    pub rolls: u64,
}

/// Integer roll-usage plan over the generated patterns
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CuttingPlan {
    pub total_rolls: u64,
    /// Only patterns cut at least once, in pattern order
    pub entries: Vec<PlanEntry>,
    /// Demanded length over cut stock length, in `[0, 1]`; zero when no roll is cut
    pub utilization: f64,
}

impl CuttingPlan {
    fn new(data: &ProblemData, entries: Vec<PlanEntry>) -> Self {
        let total_rolls = entries.iter().map(|e| e.rolls).sum();
        let utilization = if total_rolls == 0 {
            0.0
        } else {
            data.demanded_length() / (total_rolls as f64 * data.stock_length())
        };
        Self {
            total_rolls,
            entries,
            utilization,
        }
    }

    /// Pieces of `part` the plan yields
    pub fn produced(&self, part: usize) -> u64 {
        self.entries
            .iter()
            .map(|e| u64::from(e.pattern.count(part)) * e.rolls)
            .sum()
    }

    /// Whether every demand is met
    pub fn covers(&self, data: &ProblemData) -> bool {
        data.demands()
            .iter()
            .enumerate()
            .all(|(part, &demand)| self.produced(part) as f64 >= demand - 1e-9)
    }
}

/// Resolve the master problem with whole rolls over the final pattern set.
pub fn solve_final_master(data: &ProblemData, backend: &dyn SolverBackend) -> Result<CuttingPlan, CutStockError> {
    let problem = build_master_problem(data, true);
    let solution = backend.solve_mip(&problem);

    if !solution.status.is_optimal() {
        return Err(CutStockError::MasterInfeasible {
            stage: MasterStage::FinalInteger,
            status: solution.status,
        });
    }

    let entries: Vec<PlanEntry> = solution
        .values
        .iter()
        .enumerate()
        .filter_map(|(j, &x)| {
            let rolls = x.round().max(0.0) as u64;
            (rolls > 0).then(|| PlanEntry {
                pattern_index: j,
                pattern: data.patterns()[j].clone(),
                rolls,
            })
        })
        .collect();

    let plan = CuttingPlan::new(data, entries);
    debug!("final master objective {:.3}", solution.objective_value);
    info!(
        "used roll num is {}, utilization is {:.2}%",
        plan.total_rolls,
        plan.utilization * 100.0
    );
    Ok(plan)
}
