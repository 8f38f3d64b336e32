use log::{debug, warn};

use crate::problem::LpProblem;
use crate::simplex::Simplex;
use crate::solution::{Solution, SolutionStatus};

/// Depth-first branch and bound over the simplex relaxation.
pub struct BranchAndBound {
    simplex: Simplex,
    /// How far from an integer a value may be and still count as integral
    integrality_tolerance: f64,
    /// Maximum number of LP relaxations solved per MIP
    max_nodes: usize,
}

impl Default for BranchAndBound {
    fn default() -> Self {
        Self {
            simplex: Simplex::default(),
            integrality_tolerance: 1e-6,
            max_nodes: 200_000,
        }
    }
}

struct Incumbent {
    values: Vec<f64>,
    objective: f64,
}

impl BranchAndBound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simplex(mut self, simplex: Simplex) -> Self {
        self.simplex = simplex;
        self
    }

    pub fn with_max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = max;
        self
    }

    pub fn with_integrality_tolerance(mut self, tol: f64) -> Self {
        self.integrality_tolerance = tol;
        self
    }

    pub fn solve(&self, problem: &LpProblem) -> Solution {
        if !problem.has_integers() {
            return self.simplex.solve(problem);
        }

        // Compare everything as a minimization
        let sense = if problem.objective.minimize { 1.0 } else { -1.0 };
        let integral_objective = problem.variables.iter().all(|v| v.integer)
            && problem
                .objective
                .coefficients
                .iter()
                .all(|c| (c - c.round()).abs() < f64::EPSILON);

        let root: Vec<(f64, f64)> = problem
            .variables
            .iter()
            .map(|v| {
                if v.integer {
                    (
                        (v.lower - self.integrality_tolerance).ceil(),
                        (v.upper + self.integrality_tolerance).floor(),
                    )
                } else {
                    (v.lower, v.upper)
                }
            })
            .collect();

        let mut incumbent: Option<Incumbent> = None;
        let mut stack = vec![root];
        let mut nodes = 0usize;

        while let Some(bounds) = stack.pop() {
            nodes += 1;
            if nodes > self.max_nodes {
                warn!("branch and bound stopped after {} nodes without proving optimality", self.max_nodes);
                let mut solution = Solution::error();
                if let Some(best) = incumbent {
                    solution.values = best.values;
                    solution.objective_value = best.objective;
                }
                return solution;
            }

            let node = restrict(problem, &bounds);
            let relaxation = self.simplex.solve(&node);
            match relaxation.status {
                SolutionStatus::Optimal => {}
                SolutionStatus::Infeasible => continue,
                SolutionStatus::Unbounded if nodes == 1 => return Solution::unbounded(),
                SolutionStatus::Unbounded => continue,
                SolutionStatus::Error => return Solution::error(),
            }

            let bound = sense * relaxation.objective_value;
            if let Some(best) = &incumbent {
                if self.is_dominated(bound, sense * best.objective, integral_objective) {
                    continue;
                }
            }

            self.try_rounding(problem, &relaxation.values, sense, &mut incumbent);

            let Some(branch_var) = self.most_fractional(problem, &relaxation.values) else {
                let values = self.snap(problem, &relaxation.values);
                let objective = problem.objective_value(&values);
                if incumbent.as_ref().is_none_or(|best| sense * objective < sense * best.objective) {
                    incumbent = Some(Incumbent { values, objective });
                }
                continue;
            };

            let value = relaxation.values[branch_var];
            let mut down = bounds.clone();
            down[branch_var].1 = value.floor();
            let mut up = bounds;
            up[branch_var].0 = value.ceil();

            // The child closer to the relaxed value is explored first
            if value - value.floor() >= 0.5 {
                stack.push(down);
                stack.push(up);
            } else {
                stack.push(up);
                stack.push(down);
            }
        }

        debug!("branch and bound finished after {} nodes", nodes);

        match incumbent {
            Some(best) => Solution::optimal(best.values, Vec::new(), best.objective),
            None => Solution::infeasible(),
        }
    }

    fn is_dominated(&self, bound: f64, incumbent: f64, integral_objective: bool) -> bool {
        if integral_objective {
            (bound - 1e-6).ceil() >= incumbent - 1e-6
        } else {
            bound >= incumbent - 1e-9 * incumbent.abs().max(1.0)
        }
    }

    fn most_fractional(&self, problem: &LpProblem, values: &[f64]) -> Option<usize> {
        let mut best = None;
        let mut best_frac = self.integrality_tolerance;
        for (j, v) in problem.variables.iter().enumerate() {
            if !v.integer {
                continue;
            }
            let frac = (values[j] - values[j].round()).abs();
            if frac > best_frac {
                best_frac = frac;
                best = Some(j);
            }
        }
        best
    }

    fn snap(&self, problem: &LpProblem, values: &[f64]) -> Vec<f64> {
        problem
            .variables
            .iter()
            .zip(values)
            .map(|(v, &x)| if v.integer { x.round() } else { x })
            .collect()
    }

    /// Floor, ceil and nearest roundings of the relaxed point, kept if feasible
    fn try_rounding(&self, problem: &LpProblem, values: &[f64], sense: f64, incumbent: &mut Option<Incumbent>) {
        let roundings: [fn(f64) -> f64; 3] = [f64::round, f64::ceil, f64::floor];
        for round in roundings {
            let candidate: Vec<f64> = problem
                .variables
                .iter()
                .zip(values)
                .map(|(v, &x)| {
                    if !v.integer {
                        x
                    } else if (x - x.round()).abs() <= self.integrality_tolerance {
                        x.round()
                    } else {
                        round(x)
                    }
                })
                .collect();
            if !problem.is_feasible(&candidate, 1e-7) {
                continue;
            }
            let objective = problem.objective_value(&candidate);
            if incumbent.as_ref().is_none_or(|best| sense * objective < sense * best.objective) {
                *incumbent = Some(Incumbent {
                    values: candidate,
                    objective,
                });
            }
        }
    }
}

fn restrict(problem: &LpProblem, bounds: &[(f64, f64)]) -> LpProblem {
    let mut node = problem.clone();
    for (variable, &(lower, upper)) in node.variables.iter_mut().zip(bounds) {
        variable.lower = lower;
        variable.upper = upper;
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ConstraintOp, Variable};

    #[test]
    fn test_bounded_knapsack() {
        // max 5a + 4b + 3c, 2a + 3b + 1c <= 6, a <= 2, b <= 1, c <= 1
        // LP relaxation takes a third of b; best integer point is a=2, c=1 -> 13
        let mut problem = LpProblem::new(vec![
            Variable::integer("a").with_bounds(0.0, 2.0),
            Variable::integer("b").with_bounds(0.0, 1.0),
            Variable::integer("c").with_bounds(0.0, 1.0),
        ]);
        problem.set_objective(vec![5.0, 4.0, 3.0], false);
        problem.add_constraint("cap", vec![(0, 2.0), (1, 3.0), (2, 1.0)], ConstraintOp::Le, 6.0);

        let solution = BranchAndBound::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.values, vec![2.0, 0.0, 1.0]);
        assert!((solution.objective_value - 13.0).abs() < 1e-9);
        assert!(solution.duals.is_empty());
    }

    #[test]
    fn test_integer_covering() {
        // min x + y, 3x + 2y >= 7, x + 3y >= 4
        // LP optimum is fractional; the integer optimum uses 3 units
        let mut problem = LpProblem::new(vec![Variable::integer("x"), Variable::integer("y")]);
        problem.set_objective(vec![1.0, 1.0], true);
        problem.add_constraint("c0", vec![(0, 3.0), (1, 2.0)], ConstraintOp::Ge, 7.0);
        problem.add_constraint("c1", vec![(0, 1.0), (1, 3.0)], ConstraintOp::Ge, 4.0);

        let solution = BranchAndBound::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective_value - 3.0).abs() < 1e-9);
        assert!(problem.is_feasible(&solution.values, 1e-9));
        assert!(solution.values.iter().all(|v| v.fract() == 0.0));
    }

    #[test]
    fn test_integer_infeasible() {
        // 2x = 3 has no integer solution
        let mut problem = LpProblem::new(vec![Variable::integer("x").with_bounds(0.0, 10.0)]);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("odd", vec![(0, 2.0)], ConstraintOp::Eq, 3.0);

        let solution = BranchAndBound::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
    }

    #[test]
    fn test_node_limit_is_not_optimal() {
        let mut problem = LpProblem::new(vec![Variable::integer("x"), Variable::integer("y")]);
        problem.set_objective(vec![1.0, 1.0], true);
        problem.add_constraint("c0", vec![(0, 3.0), (1, 2.0)], ConstraintOp::Ge, 7.5);

        let solution = BranchAndBound::new().with_max_nodes(1).solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Error);
    }

    #[test]
    fn test_relaxation_failure_is_an_error() {
        let mut problem = LpProblem::new(vec![Variable::integer("x"), Variable::integer("y")]);
        problem.set_objective(vec![1.0, 1.0], true);
        problem.add_constraint("c0", vec![(0, 3.0), (1, 2.0)], ConstraintOp::Ge, 7.0);

        let starved = Simplex::new().with_max_iterations(0);
        let solution = BranchAndBound::new().with_simplex(starved).solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Error);
    }

    #[test]
    fn test_integrality_tolerance_controls_snapping() {
        // min x, 4x >= 9: relaxation sits at 2.25
        let mut problem = LpProblem::new(vec![Variable::integer("x")]);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("c0", vec![(0, 4.0)], ConstraintOp::Ge, 9.0);

        let strict = BranchAndBound::new().solve(&problem);
        assert_eq!(strict.values, vec![3.0]);

        // 0.25 is close enough to count as integral, so the point is snapped without branching
        let loose = BranchAndBound::new().with_integrality_tolerance(0.3).solve(&problem);
        assert_eq!(loose.status, SolutionStatus::Optimal);
        assert_eq!(loose.values, vec![2.0]);
    }
}
