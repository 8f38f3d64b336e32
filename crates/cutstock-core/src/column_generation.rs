use std::time::Instant;

use cutstock_solver::SolverBackend;
use log::{info, warn};

use crate::config::ColumnGenerationConfig;
use crate::data::ProblemData;
use crate::error::CutStockError;
use crate::master::solve_restricted_master;
use crate::plan::{CuttingPlan, solve_final_master};
use crate::pricing::solve_pricing;

/// Why the loop stopped iterating
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Reduced cost rose above `-tolerance`
    Converged,
    /// Pricing kept proposing a pattern the master already has
    DuplicatePattern,
}

/// History of a column-generation run
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ColumnGenerationOutcome {
    /// Master solves performed
    pub iterations: usize,
    /// LP objective of the restricted master, one per iteration
    pub relaxation_values: Vec<f64>,
    /// Pricing reduced cost, one per iteration
    pub reduced_costs: Vec<f64>,
    /// Patterns appended by pricing (seed patterns excluded)
    pub patterns_added: usize,
    pub termination: Termination,
}

impl ColumnGenerationOutcome {
    pub fn final_relaxation_value(&self) -> Option<f64> {
        self.relaxation_values.last().copied()
    }

    pub fn final_reduced_cost(&self) -> Option<f64> {
        self.reduced_costs.last().copied()
    }
}

/// Seed the trivial patterns, then alternate master and pricing until no
/// pattern with a reduced cost below `-tolerance` remains.
pub fn run_column_generation(
    data: &mut ProblemData,
    backend: &dyn SolverBackend,
    config: &ColumnGenerationConfig,
) -> Result<ColumnGenerationOutcome, CutStockError> {
    data.seed_patterns();

    let started = Instant::now();
    let mut relaxation_values = Vec::new();
    let mut reduced_costs = Vec::new();
    let mut patterns_added = 0;

    let termination = loop {
        let iterations = relaxation_values.len();
        if iterations >= config.max_iterations {
            return Err(CutStockError::NonConvergence { iterations });
        }
        if let Some(limit) = config.time_limit {
            let elapsed = started.elapsed();
            if elapsed > limit {
                return Err(CutStockError::TimeLimit { elapsed });
            }
        }

        let master = solve_restricted_master(data, backend)?;
        relaxation_values.push(master.objective_value);

        let pricing = solve_pricing(data, &master.duals, backend);
        reduced_costs.push(pricing.reduced_cost);
        info!(
            "iteration {}: relax value is {:.5}, reduce cost is {:.6}",
            iterations + 1,
            master.objective_value,
            pricing.reduced_cost
        );

        let improving = pricing.reduced_cost <= -config.tolerance;

        if let Some(pattern) = pricing.pattern.filter(|p| !p.is_empty()) {
            if config.dedup_patterns && data.contains_pattern(&pattern) {
                if improving {
                    warn!("pricing returned a pattern already in the master; stopping at the current relaxation");
                    break Termination::DuplicatePattern;
                }
            } else {
                data.add_pattern(pattern)?;
                patterns_added += 1;
            }
        }

        if !improving {
            break Termination::Converged;
        }
    };

    Ok(ColumnGenerationOutcome {
        iterations: relaxation_values.len(),
        relaxation_values,
        reduced_costs,
        patterns_added,
        termination,
    })
}

/// A full run: column generation followed by the integer resolve
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct Solved {
    pub column_generation: ColumnGenerationOutcome,
    pub plan: CuttingPlan,
}

pub fn solve(
    data: &mut ProblemData,
    backend: &dyn SolverBackend,
    config: &ColumnGenerationConfig,
) -> Result<Solved, CutStockError> {
    let column_generation = run_column_generation(data, backend, config)?;
    let plan = solve_final_master(data, backend)?;
    Ok(Solved { column_generation, plan })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    use crate::error::MasterStage;
    use cutstock_solver::{LpProblem, SimplexBackend, Solution};

    struct InfeasibleLp;

    impl SolverBackend for InfeasibleLp {
        fn name(&self) -> &str {
            "infeasible"
        }

        fn solve_lp(&self, _problem: &LpProblem) -> Solution {
            Solution::infeasible()
        }

        fn solve_mip(&self, problem: &LpProblem) -> Solution {
            SimplexBackend::new().solve_mip(problem)
        }
    }

    /// Simplex with a pause before every LP solve
    struct SlowLp;

    impl SolverBackend for SlowLp {
        fn name(&self) -> &str {
            "slow"
        }

        fn solve_lp(&self, problem: &LpProblem) -> Solution {
            thread::sleep(Duration::from_millis(20));
            SimplexBackend::new().solve_lp(problem)
        }

        fn solve_mip(&self, problem: &LpProblem) -> Solution {
            SimplexBackend::new().solve_mip(problem)
        }
    }

    /// Pricing always answers three pieces of part 0 worth 2, which is the
    /// seeded trivial pattern for a 10-long stock and 3-long part
    struct RepeatingPricer;

    impl SolverBackend for RepeatingPricer {
        fn name(&self) -> &str {
            "repeating"
        }

        fn solve_lp(&self, problem: &LpProblem) -> Solution {
            SimplexBackend::new().solve_lp(problem)
        }

        fn solve_mip(&self, problem: &LpProblem) -> Solution {
            if problem.objective.minimize {
                return SimplexBackend::new().solve_mip(problem);
            }
            let mut values = vec![0.0; problem.num_variables()];
            values[0] = 3.0;
            Solution::optimal(values, Vec::new(), 2.0)
        }
    }

    fn data() -> ProblemData {
        ProblemData::new(10.0, vec![3.0, 4.0, 5.0], vec![5.0, 3.0, 2.0]).unwrap()
    }

    #[test]
    fn test_loop_converges_and_grows_patterns() {
        let mut data = data();

        let outcome = run_column_generation(&mut data, &SimplexBackend::new(), &ColumnGenerationConfig::default()).unwrap();

        assert_eq!(outcome.termination, Termination::Converged);
        assert!(outcome.final_reduced_cost().unwrap() > -1e-3);
        assert_eq!(outcome.reduced_costs.len(), outcome.iterations);
        assert!(outcome.patterns_added >= 1);
        assert_eq!(data.patterns().len(), 3 + outcome.patterns_added);
        assert!(data.patterns().iter().all(|p| data.fits(p)));
    }

    #[test]
    fn test_relaxation_is_non_increasing() {
        let mut data = data();

        let outcome = run_column_generation(&mut data, &SimplexBackend::new(), &ColumnGenerationConfig::default()).unwrap();

        for pair in outcome.relaxation_values.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-9, "relaxation went up: {:?}", pair);
        }
    }

    #[test]
    fn test_iteration_cap_reports_non_convergence() {
        let mut data = data();
        let config = ColumnGenerationConfig::default().with_max_iterations(1);

        let err = run_column_generation(&mut data, &SimplexBackend::new(), &config).unwrap_err();

        assert!(matches!(err, CutStockError::NonConvergence { iterations: 1 }));
    }

    #[test]
    fn test_infeasible_master_aborts() {
        let mut data = data();

        let err = run_column_generation(&mut data, &InfeasibleLp, &ColumnGenerationConfig::default()).unwrap_err();

        assert!(matches!(
            err,
            CutStockError::MasterInfeasible {
                stage: MasterStage::Restricted,
                ..
            }
        ));
    }

    #[test]
    fn test_time_limit_stops_between_iterations() {
        let mut data = data();
        let config = ColumnGenerationConfig::default().with_time_limit(Duration::from_millis(5));

        let err = run_column_generation(&mut data, &SlowLp, &config).unwrap_err();

        match err {
            CutStockError::TimeLimit { elapsed } => assert!(elapsed > Duration::from_millis(5)),
            other => panic!("expected a time limit error, got {:?}", other),
        }
    }

    #[test]
    fn test_time_limit_produces_no_plan() {
        let mut data = data();
        let config = ColumnGenerationConfig::default().with_time_limit(Duration::from_millis(5));

        let result = solve(&mut data, &SlowLp, &config);

        assert!(matches!(result, Err(CutStockError::TimeLimit { .. })));
    }

    #[test]
    fn test_improving_duplicate_stops_the_loop() {
        let mut data = data();

        let outcome = run_column_generation(&mut data, &RepeatingPricer, &ColumnGenerationConfig::default()).unwrap();

        assert_eq!(outcome.termination, Termination::DuplicatePattern);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.patterns_added, 0);
        assert!((outcome.final_reduced_cost().unwrap() + 1.0).abs() < 1e-9);
        assert_eq!(data.patterns().len(), 3);
    }

    #[test]
    fn test_duplicate_stop_still_yields_a_covering_plan() {
        let mut data = data();

        let solved = solve(&mut data, &RepeatingPricer, &ColumnGenerationConfig::default()).unwrap();

        assert_eq!(solved.column_generation.termination, Termination::DuplicatePattern);
        assert!(solved.plan.covers(&data));
        // Trivial patterns only: ceil(5/3) + ceil(3/2) + ceil(2/2)
        assert_eq!(solved.plan.total_rolls, 5);
    }
}
