use log::debug;

use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::Solution;

/// Dense two-phase simplex solver for the continuous relaxation of a problem.
///
/// Integrality flags on variables are ignored. Finite lower bounds are
/// shifted out of the problem and finite upper bounds become extra `<=`
/// rows, so the tableau only ever works with `x >= 0`.
pub struct Simplex {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for pivot selection and reduced-cost tests
    tolerance: f64,
    /// Tolerance for deciding that phase 1 reached a feasible point
    feasibility_tolerance: f64,
    /// Consecutive degenerate pivots before switching to Bland's rule
    degenerate_limit: usize,
}

impl Default for Simplex {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            feasibility_tolerance: 1e-7,
            degenerate_limit: 50,
        }
    }
}

impl Simplex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Solve the LP relaxation using the two-phase simplex method
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        if let Some(v) = problem.variables.iter().find(|v| !v.lower.is_finite()) {
            debug!("variable {} has no finite lower bound", v.name);
            return Solution::error();
        }
        if problem
            .variables
            .iter()
            .any(|v| v.upper < v.lower - self.feasibility_tolerance)
        {
            return Solution::infeasible();
        }

        let mut tableau = self.build_tableau(problem);

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                Phase1Result::Feasible => {}
                Phase1Result::Infeasible => return Solution::infeasible(),
                Phase1Result::Failed => return Solution::error(),
            }
        }

        // Phase 2: Optimize
        let art_start = tableau.n_vars + tableau.n_slack;
        match self.iterate(&mut tableau, art_start) {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded => return Solution::unbounded(),
            SimplexResult::IterationLimit => {
                debug!("simplex hit the iteration limit of {}", self.max_iterations);
                return Solution::error();
            }
        }

        self.extract_solution(&tableau, problem)
    }

    fn build_tableau(&self, problem: &LpProblem) -> Tableau {
        let n_vars = problem.num_variables();

        // Rows in original variable space, shifted by lower bounds and with a non-negative RHS
        let mut rows: Vec<(Vec<f64>, ConstraintOp, f64)> = Vec::new();
        let mut flipped = Vec::new();

        for c in &problem.constraints {
            let mut coefficients = vec![0.0; n_vars];
            let mut rhs = c.rhs;
            for &(j, coef) in &c.terms {
                if j < n_vars {
                    coefficients[j] += coef;
                    rhs -= coef * problem.variables[j].lower;
                }
            }
            rows.push((coefficients, c.op, rhs));
        }
        for (j, v) in problem.variables.iter().enumerate() {
            if v.upper.is_finite() {
                let mut coefficients = vec![0.0; n_vars];
                coefficients[j] = 1.0;
                rows.push((coefficients, ConstraintOp::Le, v.upper - v.lower));
            }
        }

        for (coefficients, op, rhs) in rows.iter_mut() {
            let flip = *rhs < 0.0;
            if flip {
                *rhs = -*rhs;
                coefficients.iter_mut().for_each(|a| *a = -*a);
                *op = match *op {
                    ConstraintOp::Le => ConstraintOp::Ge,
                    ConstraintOp::Ge => ConstraintOp::Le,
                    ConstraintOp::Eq => ConstraintOp::Eq,
                };
            }
            flipped.push(flip);
        }

        let n_slack = rows.iter().filter(|r| r.1 != ConstraintOp::Eq).count();
        let n_artificial = rows.iter().filter(|r| r.1 != ConstraintOp::Le).count();
        let n_rows = rows.len();
        let n_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS

        let mut tableau = Tableau {
            data: vec![vec![0.0; n_cols]; n_rows + 1],
            basic_vars: vec![0; n_rows],
            identity_cols: vec![0; n_rows],
            flipped,
            n_vars,
            n_slack,
            n_artificial,
            n_cols,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (coefficients, op, rhs)) in rows.into_iter().enumerate() {
            tableau.data[i][..n_vars].copy_from_slice(&coefficients);
            tableau.data[i][n_cols - 1] = rhs;

            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    tableau.identity_cols[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    tableau.identity_cols[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    tableau.identity_cols[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Objective row (last row). The tableau maximizes, so a minimization
        // objective is stored negated.
        let obj_row = n_rows;
        for (j, &coef) in problem.objective.coefficients.iter().enumerate().take(n_vars) {
            tableau.data[obj_row][j] = if problem.objective.minimize { -coef } else { coef };
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau) -> Phase1Result {
        let obj_row = tableau.obj_row();
        let n_cols = tableau.n_cols;
        let art_start = tableau.art_start();

        let orig_obj = tableau.data[obj_row].clone();

        // Maximize -sum(artificials), priced out against the starting basis
        tableau.data[obj_row].iter_mut().for_each(|v| *v = 0.0);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[obj_row][j] = -1.0;
        }
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, n_cols - 1) {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded | SimplexResult::IterationLimit => return Phase1Result::Failed,
        }

        let rhs_col = n_cols - 1;
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start
                && tableau.data[i][rhs_col].abs() > self.feasibility_tolerance
            {
                return Phase1Result::Infeasible;
            }
        }

        // Artificials still basic sit at zero; pivot them out so phase 2 cannot raise them.
        // A row without any usable entry is redundant and stays as it is.
        for i in 0..obj_row {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            tableau.data[i][rhs_col] = 0.0;
            let entering = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.feasibility_tolerance);
            if let Some(col) = entering {
                tableau.pivot(i, col);
            }
        }

        // Restore original objective and price out the basis
        tableau.data[obj_row] = orig_obj;
        for i in 0..obj_row {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        Phase1Result::Feasible
    }

    /// Pivot until no column below `col_limit` has a positive reduced cost
    fn iterate(&self, tableau: &mut Tableau, col_limit: usize) -> SimplexResult {
        let rhs_col = tableau.n_cols - 1;
        let mut degenerate_streak = 0;

        for _ in 0..self.max_iterations {
            let bland = degenerate_streak >= self.degenerate_limit;
            let Some(pivot_col) = self.find_pivot_column(tableau, col_limit, bland) else {
                return SimplexResult::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };
            if tableau.data[pivot_row][rhs_col].abs() <= self.tolerance {
                degenerate_streak += 1;
            } else {
                degenerate_streak = 0;
            }
            tableau.pivot(pivot_row, pivot_col);
        }
        SimplexResult::IterationLimit
    }

    fn find_pivot_column(&self, tableau: &Tableau, col_limit: usize, bland: bool) -> Option<usize> {
        let obj = &tableau.data[tableau.obj_row()];

        if bland {
            return (0..col_limit).find(|&j| obj[j] > self.tolerance);
        }

        // Most positive reduced cost
        let mut max_val = self.tolerance;
        let mut max_col = None;
        for (j, &value) in obj.iter().enumerate().take(col_limit) {
            if value > max_val {
                max_val = value;
                max_col = Some(j);
            }
        }
        max_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.n_cols - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..tableau.obj_row() {
            let val = tableau.data[i][col];
            if val > self.tolerance {
                let ratio = tableau.data[i][rhs_col].max(0.0) / val;
                let better = match min_row {
                    None => true,
                    Some(r) if (ratio - min_ratio).abs() <= self.tolerance => {
                        tableau.basic_vars[i] < tableau.basic_vars[r]
                    }
                    Some(_) => ratio < min_ratio,
                };
                if better {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem) -> Solution {
        let n_vars = problem.num_variables();
        let rhs_col = tableau.n_cols - 1;
        let obj_row = tableau.obj_row();

        let mut values: Vec<f64> = problem.variables.iter().map(|v| v.lower).collect();
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < n_vars {
                values[basic] += tableau.data[i][rhs_col];
            }
        }

        // The reduced cost of a row's starting identity column is minus its dual
        // in the maximization form of the normalized row.
        let duals = (0..problem.num_constraints())
            .map(|i| {
                let mut dual = -tableau.data[obj_row][tableau.identity_cols[i]];
                if tableau.flipped[i] {
                    dual = -dual;
                }
                if problem.objective.minimize {
                    dual = -dual;
                }
                if dual.abs() < self.tolerance { 0.0 } else { dual }
            })
            .collect();

        let objective_value = problem.objective_value(&values);
        debug!(
            "simplex optimum {:.6} ({} vars, {} rows)",
            objective_value,
            n_vars,
            problem.num_constraints()
        );

        Solution::optimal(values, duals, objective_value)
    }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    /// Column that formed the starting basis of each row (slack or artificial)
    identity_cols: Vec<usize>,
    /// Rows negated to make the RHS non-negative
    flipped: Vec<bool>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
    n_cols: usize,
}

impl Tableau {
    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }

    fn pivot(&mut self, row: usize, col: usize) {
        self.basic_vars[row] = col;

        let pivot_val = self.data[row][col];
        for value in self.data[row].iter_mut() {
            *value /= pivot_val;
        }

        let pivot_row = self.data[row].clone();
        for (i, current) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = current[col];
            if factor != 0.0 {
                for (value, &p) in current.iter_mut().zip(&pivot_row) {
                    *value -= factor * p;
                }
            }
        }
    }
}

enum SimplexResult {
    Optimal,
    Unbounded,
    IterationLimit,
}

enum Phase1Result {
    Feasible,
    Infeasible,
    Failed,
}
