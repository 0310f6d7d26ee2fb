use crate::error::InstanceError;
use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{Analysis, ConstraintViolation, ReducedCost, ShadowPrice, Solution, SolutionStatus};

/// Rule used to choose the entering variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PricingRule {
    /// Smallest-index column with a negative reduced cost. Never cycles.
    #[default]
    Bland,
    /// Most negative reduced cost, ties to the smallest index.
    /// Falls back to Bland after a run of degenerate pivots.
    Dantzig,
}

/// Two-phase primal simplex solver for linear programming problems.
///
/// The solver holds configuration only; every call to [`Solver::solve`]
/// works on its own tableau, so one solver can be shared between threads.
#[derive(Debug, Clone, Copy)]
pub struct Solver {
    /// Maximum pivots (both phases) before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Entering variable selection
    pricing: PricingRule,
    /// Consecutive degenerate pivots after which Dantzig pricing switches to Bland
    degenerate_limit: usize,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 50_000,
            tolerance: 1e-9,
            pricing: PricingRule::Bland,
            degenerate_limit: 50,
        }
    }
}

impl Solver {
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

    pub fn with_pricing(mut self, pricing: PricingRule) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_degenerate_limit(mut self, limit: usize) -> Self {
        self.degenerate_limit = limit;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Solve the LP problem using the two-phase simplex method.
    ///
    /// Infeasible, unbounded and iteration-limited problems are reported in
    /// the returned [`Solution`]; an error means the problem itself is
    /// malformed.
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, InstanceError> {
        problem.validate()?;

        let mut tableau = self.build_tableau(problem);
        log::debug!(
            "simplex: {} variables, {} constraints, {} slack, {} artificial",
            tableau.n_vars,
            problem.num_constraints(),
            tableau.n_slack,
            tableau.n_artificial
        );

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                SimplexResult::Optimal => {}
                SimplexResult::IterationLimit => {
                    log::warn!("phase 1 hit the iteration limit of {}", self.max_iterations);
                    return Ok(Solution::iteration_limit(tableau.iterations));
                }
                SimplexResult::Unbounded => {
                    log::warn!("phase 1 found no leaving row; treating residual as infeasibility");
                }
            }

            let violations = self.phase1_violations(&tableau, problem);
            if !violations.is_empty() {
                log::info!(
                    "problem is infeasible after {} pivots ({} violated constraints)",
                    tableau.iterations,
                    violations.len()
                );
                return Ok(Solution::infeasible(violations, tableau.iterations));
            }

            self.drive_out_artificials(&mut tableau);
        }

        // Phase 2: Optimize
        self.set_phase2_objective(&mut tableau, problem);
        match self.phase2(&mut tableau) {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded => {
                log::info!("problem is unbounded after {} pivots", tableau.iterations);
                return Ok(Solution::unbounded(tableau.iterations));
            }
            SimplexResult::IterationLimit => {
                log::warn!("phase 2 hit the iteration limit of {}", self.max_iterations);
                return Ok(Solution::iteration_limit(tableau.iterations));
            }
        }

        let solution = self.extract_solution(&tableau, problem);
        log::info!(
            "optimal objective {:?} after {} pivots",
            solution.objective_value,
            solution.iterations
        );
        Ok(solution)
    }

    fn build_tableau(&self, problem: &LpProblem) -> Tableau {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // Rows with a negative RHS are negated, which swaps <= and >=
        let flipped: Vec<bool> = problem.constraints.iter().map(|c| c.rhs < 0.0).collect();
        let effective_ops: Vec<ConstraintOp> = problem
            .constraints
            .iter()
            .zip(&flipped)
            .map(|(c, &flip)| match (c.op, flip) {
                (ConstraintOp::Le, true) => ConstraintOp::Ge,
                (ConstraintOp::Ge, true) => ConstraintOp::Le,
                (op, _) => op,
            })
            .collect();

        // Count slack and artificial variables needed
        let mut n_slack = 0;
        let mut n_artificial = 0;
        for op in &effective_ops {
            match op {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let rhs_col = total_cols - 1;

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; n_constraints + 1], // +1 for objective
            basic_vars: vec![0; n_constraints],
            row_origin: (0..n_constraints).collect(),
            unit_cols: vec![0; n_constraints],
            flipped,
            n_vars,
            n_slack,
            n_artificial,
            iterations: 0,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, c) in problem.constraints.iter().enumerate() {
            let sign = if tableau.flipped[i] { -1.0 } else { 1.0 };
            for (j, &coef) in c.coefficients.iter().enumerate() {
                tableau.data[i][j] = sign * coef;
            }
            tableau.data[i][rhs_col] = sign * c.rhs;

            // Add slack/surplus/artificial
            match effective_ops[i] {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    tableau.unit_cols[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    tableau.unit_cols[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    tableau.unit_cols[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau) -> SimplexResult {
        // Objective row holds reduced costs of "minimize sum of artificials"
        // with respect to the artificial starting basis.
        let obj_row = tableau.obj_row();
        let n_cols = tableau.n_cols();
        let art_start = tableau.art_start();

        tableau.data[obj_row].iter_mut().for_each(|v| *v = 0.0);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[obj_row][j] = 1.0;
        }
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= tableau.data[i][j];
                }
            }
        }

        log::debug!("phase 1: initial infeasibility {}", -tableau.data[obj_row][n_cols - 1]);
        self.run(tableau, art_start)
    }

    /// Constraints whose artificial variable is still positive after phase 1
    fn phase1_violations(&self, tableau: &Tableau, problem: &LpProblem) -> Vec<ConstraintViolation> {
        let art_start = tableau.art_start();
        let rhs_col = tableau.n_cols() - 1;

        let mut violations: Vec<ConstraintViolation> = (0..tableau.obj_row())
            .filter(|&i| tableau.basic_vars[i] >= art_start)
            .filter(|&i| tableau.data[i][rhs_col] > self.tolerance)
            .map(|i| {
                let origin = tableau.row_origin[i];
                let c = &problem.constraints[origin];
                let residual = tableau.data[i][rhs_col];
                let sign = if tableau.flipped[origin] { -1.0 } else { 1.0 };
                let actual = sign * (sign * c.rhs - residual);
                ConstraintViolation::new(c.name.clone(), c.rhs, actual)
            })
            .collect();

        violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));
        violations
    }

    /// Pivot zero-valued artificials out of the basis; rows where that is
    /// impossible are linear combinations of other rows and are dropped.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let art_start = tableau.art_start();
        let rhs_col = tableau.n_cols() - 1;

        let mut i = 0;
        while i < tableau.obj_row() {
            if tableau.basic_vars[i] < art_start {
                i += 1;
                continue;
            }

            tableau.data[i][rhs_col] = 0.0;
            let replacement = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance);
            match replacement {
                Some(col) => {
                    log::trace!("pivoting artificial out of row {} on column {}", i, col);
                    self.pivot(tableau, i, col);
                    tableau.iterations += 1;
                    i += 1;
                }
                None => {
                    log::debug!("dropping redundant constraint row {}", tableau.row_origin[i]);
                    tableau.data.remove(i);
                    tableau.basic_vars.remove(i);
                    tableau.row_origin.remove(i);
                }
            }
        }
    }

    /// Restore the original objective (as minimization) and price out the basis
    fn set_phase2_objective(&self, tableau: &mut Tableau, problem: &LpProblem) {
        let obj_row = tableau.obj_row();
        let n_cols = tableau.n_cols();
        let sense = if problem.objective.minimize { 1.0 } else { -1.0 };

        tableau.data[obj_row].iter_mut().for_each(|v| *v = 0.0);
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            tableau.data[obj_row][j] = sense * coef;
        }

        for i in 0..obj_row {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio != 0.0 {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= ratio * tableau.data[i][j];
                }
            }
        }
    }

    fn phase2(&self, tableau: &mut Tableau) -> SimplexResult {
        // Artificial columns never re-enter
        let art_start = tableau.art_start();
        self.run(tableau, art_start)
    }

    /// Pivot until no column below `limit_col` has a negative reduced cost
    fn run(&self, tableau: &mut Tableau, limit_col: usize) -> SimplexResult {
        let mut rule = self.pricing;
        let mut degenerate_run = 0;

        loop {
            let Some(pivot_col) = self.find_pivot_column(tableau, limit_col, rule) else {
                return SimplexResult::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };
            if tableau.iterations >= self.max_iterations {
                return SimplexResult::IterationLimit;
            }

            let rhs_col = tableau.n_cols() - 1;
            if tableau.data[pivot_row][rhs_col] <= self.tolerance {
                degenerate_run += 1;
                if rule == PricingRule::Dantzig && degenerate_run >= self.degenerate_limit {
                    log::debug!("{} degenerate pivots in a row, switching to Bland's rule", degenerate_run);
                    rule = PricingRule::Bland;
                }
            } else {
                degenerate_run = 0;
            }

            log::trace!(
                "pivot {}: column {} enters, column {} leaves (row {})",
                tableau.iterations,
                pivot_col,
                tableau.basic_vars[pivot_row],
                pivot_row
            );
            self.pivot(tableau, pivot_row, pivot_col);
            tableau.iterations += 1;
        }
    }

    fn find_pivot_column(&self, tableau: &Tableau, limit_col: usize, rule: PricingRule) -> Option<usize> {
        let obj = &tableau.data[tableau.obj_row()][..limit_col];

        match rule {
            PricingRule::Bland => obj.iter().position(|&d| d < -self.tolerance),
            PricingRule::Dantzig => {
                let mut min_val = -self.tolerance;
                let mut min_col = None;
                for (j, &d) in obj.iter().enumerate() {
                    if d < min_val {
                        min_val = d;
                        min_col = Some(j);
                    }
                }
                min_col
            }
        }
    }

    /// Minimum ratio test; ties go to the row whose basic variable has the
    /// smallest index.
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.n_cols() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..tableau.obj_row() {
            let val = tableau.data[i][col];
            if val > self.tolerance {
                let ratio = tableau.data[i][rhs_col].max(0.0) / val;
                let better = match min_row {
                    None => true,
                    Some(r) => {
                        ratio < min_ratio - self.tolerance
                            || (ratio <= min_ratio + self.tolerance
                                && tableau.basic_vars[i] < tableau.basic_vars[r])
                    }
                };
                if better {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.n_cols();
        let rhs_col = n_cols - 1;

        // Update basic variable
        tableau.basic_vars[row] = col;

        // Scale pivot row
        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }
        tableau.data[row][col] = 1.0;

        // Eliminate column in other rows
        let pivot_row = tableau.data[row].clone();
        for i in 0..n_rows {
            if i == row {
                continue;
            }
            let factor = tableau.data[i][col];
            if factor == 0.0 {
                continue;
            }
            for (v, p) in tableau.data[i].iter_mut().zip(&pivot_row) {
                *v -= factor * p;
            }
            tableau.data[i][col] = 0.0;

            // Round-off must not push a basic value negative
            if i < n_rows - 1 && tableau.data[i][rhs_col] < 0.0 && tableau.data[i][rhs_col] > -self.tolerance {
                tableau.data[i][rhs_col] = 0.0;
            }
        }
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem) -> Solution {
        let n_vars = problem.num_variables();
        let rhs_col = tableau.n_cols() - 1;

        // Extract variable values
        let mut values = vec![0.0; n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < n_vars {
                let v = tableau.data[i][rhs_col];
                values[basic] = if v.abs() <= self.tolerance { 0.0 } else { v };
            }
        }

        let objective_value = problem.evaluate_objective(&values);
        let analysis = self.analyze(tableau, problem, &values);

        Solution {
            status: SolutionStatus::Optimal,
            values,
            objective_value: Some(objective_value),
            analysis,
            violations: Vec::new(),
            iterations: tableau.iterations,
        }
    }

    /// Duals are read from the reduced costs of each row's unit column
    /// (its slack or artificial), which carry `-c_B B^-1`.
    fn analyze(&self, tableau: &Tableau, problem: &LpProblem, values: &[f64]) -> Analysis {
        let obj = &tableau.data[tableau.obj_row()];
        let sense = if problem.objective.minimize { 1.0 } else { -1.0 };
        let clean = |v: f64| if v.abs() <= self.tolerance { 0.0 } else { v };

        let shadow_prices = problem
            .constraints
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let flip = if tableau.flipped[i] { -1.0 } else { 1.0 };
                ShadowPrice {
                    constraint: c.name.clone(),
                    value: clean(-obj[tableau.unit_cols[i]] * flip * sense),
                }
            })
            .collect();

        let reduced_costs = problem
            .variables
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let is_basic = tableau.basic_vars.contains(&j);
                ReducedCost {
                    variable: name.clone(),
                    value: values[j],
                    reduced_cost: if is_basic { 0.0 } else { clean(obj[j] * sense) },
                    is_basic,
                }
            })
            .collect();

        Analysis {
            shadow_prices,
            reduced_costs,
        }
    }
}

struct Tableau {
    /// Constraint rows followed by the reduced-cost row; last column is the RHS
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    /// Original constraint index of each remaining row
    row_origin: Vec<usize>,
    /// Column holding +1 in each original constraint row at the start
    unit_cols: Vec<usize>,
    /// Original constraints that were negated to make their RHS non-negative
    flipped: Vec<bool>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
    iterations: usize,
}

impl Tableau {
    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn n_cols(&self) -> usize {
        self.data[0].len()
    }

    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }
}

enum SimplexResult {
    Optimal,
    Unbounded,
    IterationLimit,
}
