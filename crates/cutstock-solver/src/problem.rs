/// Represents a linear (or mixed-integer linear) programming problem
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Decision variables with their bounds
    pub variables: Vec<Variable>,
    /// Objective function coefficients (costs)
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// Lower bound, must be finite
    pub lower: f64,
    /// Upper bound, may be `f64::INFINITY`
    pub upper: f64,
    /// Whether a MIP solve must assign an integral value
    pub integer: bool,
}

impl Variable {
    /// A continuous variable in `[0, inf)`
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lower: 0.0,
            upper: f64::INFINITY,
            integer: false,
        }
    }

    /// An integer variable in `[0, inf)`
    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            integer: true,
            ..Self::continuous(name)
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Sparse coefficients as (variable index, coefficient)
    pub terms: Vec<(usize, f64)>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl Constraint {
    /// Left-hand side value of this row for the given assignment
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(j, coef)| coef * values.get(j).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.activity(values);
        match self.op {
            ConstraintOp::Le => lhs <= self.rhs + tolerance,
            ConstraintOp::Ge => lhs >= self.rhs - tolerance,
            ConstraintOp::Eq => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

impl LpProblem {
    pub fn new(variables: Vec<Variable>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                minimize: true,
            },
            constraints: Vec::new(),
        }
    }

    /// Append a variable with a zero objective coefficient, returning its index
    pub fn add_variable(&mut self, variable: Variable) -> usize {
        self.variables.push(variable);
        self.objective.coefficients.push(0.0);
        self.variables.len() - 1
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: Vec<(usize, f64)>,
        op: ConstraintOp,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            terms,
            op,
            rhs,
        });
    }

    /// `lower <= a.x <= upper`, expanded into at most two rows. Infinite sides are dropped.
    pub fn add_range_constraint(
        &mut self,
        name: impl Into<String>,
        terms: Vec<(usize, f64)>,
        lower: f64,
        upper: f64,
    ) {
        let name = name.into();
        if lower.is_finite() && upper.is_finite() && lower == upper {
            self.add_constraint(name, terms, ConstraintOp::Eq, lower);
            return;
        }
        if lower.is_finite() {
            self.add_constraint(format!("{}_lo", name), terms.clone(), ConstraintOp::Ge, lower);
        }
        if upper.is_finite() {
            self.add_constraint(format!("{}_up", name), terms, ConstraintOp::Le, upper);
        }
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn has_integers(&self) -> bool {
        self.variables.iter().any(|v| v.integer)
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(c, x)| c * x)
            .sum()
    }

    /// Check bounds and rows (integrality is not checked)
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        if values.len() != self.variables.len() {
            return false;
        }
        let within_bounds = self
            .variables
            .iter()
            .zip(values)
            .all(|(v, &x)| x >= v.lower - tolerance && x <= v.upper + tolerance);
        within_bounds && self.constraints.iter().all(|c| c.is_satisfied(values, tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_constraint_expansion() {
        let mut problem = LpProblem::new(vec![Variable::continuous("x")]);
        problem.add_range_constraint("r", vec![(0, 1.0)], 1.0, 4.0);
        problem.add_range_constraint("eq", vec![(0, 1.0)], 2.0, 2.0);
        problem.add_range_constraint("half", vec![(0, 1.0)], f64::NEG_INFINITY, 3.0);

        let ops: Vec<_> = problem.constraints.iter().map(|c| c.op).collect();
        assert_eq!(
            ops,
            vec![ConstraintOp::Ge, ConstraintOp::Le, ConstraintOp::Eq, ConstraintOp::Le]
        );
        assert_eq!(problem.constraints[0].name, "r_lo");
    }

    #[test]
    fn test_feasibility_check() {
        let mut problem = LpProblem::new(vec![
            Variable::integer("a").with_bounds(0.0, 2.0),
            Variable::continuous("b"),
        ]);
        problem.add_constraint("cover", vec![(0, 3.0), (1, 1.0)], ConstraintOp::Ge, 5.0);

        assert!(!problem.is_feasible(&[1.0, 1.0], 1e-9));
        assert!(problem.is_feasible(&[2.0, 0.0], 1e-9));
        assert!(problem.is_feasible(&[1.0, 2.0], 1e-9));
        assert!(!problem.is_feasible(&[3.0, 0.0], 1e-9), "upper bound violated");
        assert!(problem.has_integers());
    }

    #[test]
    fn test_add_variable_extends_objective() {
        let mut problem = LpProblem::new(vec![Variable::continuous("x")]);
        problem.set_objective(vec![2.0], true);

        let y = problem.add_variable(Variable::integer("y").with_bounds(0.0, 3.0));

        assert_eq!(y, 1);
        assert_eq!(problem.num_variables(), 2);
        assert_eq!(problem.objective.coefficients, vec![2.0, 0.0]);
        assert!(problem.has_integers());
        assert!(!problem.is_feasible(&[0.0, 4.0], 1e-9));
    }
}
