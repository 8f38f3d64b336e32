use cutstock_solver::{ConstraintOp, LpProblem, SolverBackend, Variable};
use log::warn;

use crate::data::{Pattern, ProblemData};

/// Outcome of one pricing round.
///
/// The pattern is returned rather than stored; the caller decides whether to
/// append it.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingResult {
    /// `1 - value of the best pattern at the current dual prices`
    pub reduced_cost: f64,
    /// Best pattern found, `None` when the knapsack was not solved to optimality
    pub pattern: Option<Pattern>,
}

impl PricingResult {
    /// Stand-in when pricing fails: never improving, no pattern
    pub fn not_improving() -> Self {
        Self {
            reduced_cost: 1.0,
            pattern: None,
        }
    }
}

/// Bounded knapsack: `max sum_i dual_i y_i` with `sum_i len_i y_i <= stock` and
/// `0 <= y_i <= floor(stock / len_i)` integer.
pub fn build_pricing_problem(data: &ProblemData, duals: &[f64]) -> LpProblem {
    let variables = (0..data.num_parts())
        .map(|i| Variable::integer(format!("y_{}", i)).with_bounds(0.0, f64::from(data.max_count(i))))
        .collect();

    let mut problem = LpProblem::new(variables);
    problem.set_objective(duals.to_vec(), false);
    problem.add_constraint(
        "capacity",
        data.part_lengths().iter().copied().enumerate().collect(),
        ConstraintOp::Le,
        data.stock_length(),
    );
    problem
}

/// Search for the pattern with the most negative reduced cost at the given duals.
pub fn solve_pricing(data: &ProblemData, duals: &[f64], backend: &dyn SolverBackend) -> PricingResult {
    if duals.len() != data.num_parts() {
        warn!(
            "pricing got {} dual values for {} parts; treating as no improving pattern",
            duals.len(),
            data.num_parts()
        );
        return PricingResult::not_improving();
    }

    let problem = build_pricing_problem(data, duals);
    let solution = backend.solve_mip(&problem);

    if !solution.status.is_optimal() {
        warn!("pricing subproblem ended with status {}; assuming convergence", solution.status);
        return PricingResult::not_improving();
    }

    let pattern = solution
        .values
        .iter()
        .enumerate()
        .map(|(i, &y)| (i, y.round().max(0.0) as u32))
        .collect::<Pattern>();

    PricingResult {
        reduced_cost: 1.0 - solution.objective_value,
        pattern: Some(pattern),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutstock_solver::{SimplexBackend, Solution};

    struct FailingMip;

    impl SolverBackend for FailingMip {
        fn name(&self) -> &str {
            "failing"
        }

        fn solve_lp(&self, problem: &LpProblem) -> Solution {
            SimplexBackend::new().solve_lp(problem)
        }

        fn solve_mip(&self, _problem: &LpProblem) -> Solution {
            Solution::error()
        }
    }

    fn data() -> ProblemData {
        ProblemData::new(10.0, vec![3.0, 4.0, 5.0], vec![5.0, 3.0, 2.0]).unwrap()
    }

    #[test]
    fn test_pricing_finds_best_knapsack() {
        let data = data();
        // Duals of the trivial master
        let duals = [1.0 / 3.0, 0.5, 0.5];

        let result = solve_pricing(&data, &duals, &SimplexBackend::new());

        // Best fill of 10: {3: 2, 4: 1} is worth 2/3 + 1/2 = 7/6
        let pattern = result.pattern.unwrap();
        assert_eq!(pattern, [(0, 2), (1, 1)].into_iter().collect());
        assert!((result.reduced_cost - (1.0 - 7.0 / 6.0)).abs() < 1e-6);
        assert!(data.fits(&pattern));
    }

    #[test]
    fn test_variable_bounds_follow_stock_length() {
        let problem = build_pricing_problem(&data(), &[1.0, 1.0, 1.0]);
        let uppers: Vec<_> = problem.variables.iter().map(|v| v.upper).collect();
        assert_eq!(uppers, vec![3.0, 2.0, 2.0]);
        assert!(!problem.objective.minimize);
    }

    #[test]
    fn test_zero_duals_are_not_improving() {
        let result = solve_pricing(&data(), &[0.0, 0.0, 0.0], &SimplexBackend::new());
        assert!((result.reduced_cost - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_failed_pricing_forces_convergence() {
        let result = solve_pricing(&data(), &[1.0, 1.0, 1.0], &FailingMip);
        assert_eq!(result, PricingResult::not_improving());
    }

    #[test]
    fn test_dual_length_mismatch() {
        let result = solve_pricing(&data(), &[1.0], &SimplexBackend::new());
        assert_eq!(result.pattern, None);
        assert_eq!(result.reduced_cost, 1.0);
    }
}
