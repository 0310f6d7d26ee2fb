/// The result of solving an LP problem
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal values for each variable (empty unless optimal)
    pub values: Vec<f64>,
    /// Optimal objective value, recomputed from `values`
    pub objective_value: Option<f64>,
    /// Dual information for the optimal basis
    pub analysis: Analysis,
    /// Constraint violations (populated when infeasible)
    pub violations: Vec<ConstraintViolation>,
    /// Pivots performed across both phases
    pub iterations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The pivot budget ran out before a verdict was reached
    IterationLimitExceeded,
}

impl SolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolutionStatus::Optimal => "Optimal",
            SolutionStatus::Infeasible => "Infeasible",
            SolutionStatus::Unbounded => "Unbounded",
            SolutionStatus::IterationLimitExceeded => "IterationLimitExceeded",
        }
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dual information read off the final tableau
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Analysis {
    /// Shadow prices (dual values) for each constraint, in constraint order.
    /// Rate of change of the objective per unit increase of the RHS.
    pub shadow_prices: Vec<ShadowPrice>,

    /// Reduced costs for each variable, in variable order
    pub reduced_costs: Vec<ReducedCost>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShadowPrice {
    /// Constraint name
    pub constraint: String,
    /// Shadow price value
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReducedCost {
    /// Variable name
    pub variable: String,
    /// Current value in solution
    pub value: f64,
    /// Objective increase per unit of this variable forced into the solution
    pub reduced_cost: f64,
    /// Is this variable in the basis?
    pub is_basic: bool,
}

/// Information about a violated constraint
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintViolation {
    /// Constraint name
    pub constraint: String,
    /// Required value (from constraint RHS)
    pub required: f64,
    /// Closest value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
    /// Human-readable description of what's wrong
    pub description: String,
}

impl Solution {
    pub fn infeasible(violations: Vec<ConstraintViolation>, iterations: usize) -> Self {
        Self::without_values(SolutionStatus::Infeasible, violations, iterations)
    }

    pub fn unbounded(iterations: usize) -> Self {
        Self::without_values(SolutionStatus::Unbounded, Vec::new(), iterations)
    }

    pub fn iteration_limit(iterations: usize) -> Self {
        Self::without_values(SolutionStatus::IterationLimitExceeded, Vec::new(), iterations)
    }

    fn without_values(status: SolutionStatus, violations: Vec<ConstraintViolation>, iterations: usize) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: None,
            analysis: Analysis::default(),
            violations,
            iterations,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}

impl ConstraintViolation {
    /// Violation of an equality-style requirement `actual == required`
    pub fn new(constraint: impl Into<String>, required: f64, actual: f64) -> Self {
        let constraint = constraint.into();
        let violation_amount = (required - actual).abs();
        let description = format!(
            "{} requires {:.2} but at best {:.2} can be achieved",
            constraint, required, actual
        );
        Self {
            constraint,
            required,
            actual,
            violation_amount,
            description,
        }
    }
}
