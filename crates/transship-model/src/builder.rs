use std::collections::HashMap;

use transship_solver::{ConstraintOp, LpProblem};

use crate::error::ModelError;
use crate::network::{Arc, ArcLayout, NodeCounts, NodeRole};

/// How arcs without an explicit cost are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MissingCostPolicy {
    /// Fail with [`ModelError::MissingCost`]
    #[default]
    Reject,
    /// Treat the arc as free to use
    Zero,
}

/// Options for turning a [`TransshipmentProblem`] into an LP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildOptions {
    pub missing_cost: MissingCostPolicy,
    /// Report unequal total supply and demand as infeasible without solving
    pub check_balance: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            missing_cost: MissingCostPolicy::Reject,
            check_balance: true,
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_cost(mut self, policy: MissingCostPolicy) -> Self {
        self.missing_cost = policy;
        self
    }

    pub fn with_balance_check(mut self, check: bool) -> Self {
        self.check_balance = check;
        self
    }
}

/// Validated transshipment input: node counts, quantities and arc costs
#[derive(Debug, Clone, PartialEq)]
pub struct TransshipmentProblem {
    layout: ArcLayout,
    supplies: Vec<f64>,
    demands: Vec<f64>,
    /// Cost per arc slot, `None` when not given
    costs: Vec<Option<f64>>,
}

impl TransshipmentProblem {
    /// Create a problem with no arc costs set yet
    pub fn new(counts: NodeCounts, supplies: Vec<f64>, demands: Vec<f64>) -> Result<Self, ModelError> {
        let too_large = || ModelError::TooManyArcs {
            supply: counts.supply,
            intermediate: counts.intermediate,
            demand: counts.demand,
        };
        let num_arcs = counts.checked_num_arcs().ok_or_else(too_large)?;

        check_quantities(NodeRole::Supply, counts.supply, &supplies, 1)?;
        check_quantities(NodeRole::Demand, counts.demand, &demands, counts.supply + counts.intermediate + 1)?;

        let mut costs = Vec::new();
        costs.try_reserve_exact(num_arcs).map_err(|_| too_large())?;
        costs.resize(num_arcs, None);

        Ok(Self {
            layout: ArcLayout::new(counts),
            supplies,
            demands,
            costs,
        })
    }

    /// Create a problem from a cost lookup keyed by `(from, to)` node ids
    pub fn from_parts(
        counts: NodeCounts,
        supplies: Vec<f64>,
        demands: Vec<f64>,
        costs: &HashMap<(usize, usize), f64>,
    ) -> Result<Self, ModelError> {
        let mut problem = Self::new(counts, supplies, demands)?;
        // Sorted so the first reported error does not depend on hash order
        let mut entries: Vec<_> = costs.iter().collect();
        entries.sort_by_key(|(key, _)| **key);
        for (&(from, to), &cost) in entries {
            problem.set_cost(from, to, cost)?;
        }
        Ok(problem)
    }

    /// Set the unit cost of the arc `from -> to`, replacing any previous cost
    pub fn set_cost(&mut self, from: usize, to: usize, cost: f64) -> Result<(), ModelError> {
        let slot = self.layout.slot(from, to)?;
        if !cost.is_finite() || cost < 0.0 {
            return Err(ModelError::InvalidCost { from, to, cost });
        }
        self.costs[slot] = Some(cost);
        Ok(())
    }

    pub fn cost(&self, from: usize, to: usize) -> Option<f64> {
        self.layout.slot(from, to).ok().and_then(|slot| self.costs[slot])
    }

    pub fn counts(&self) -> NodeCounts {
        self.layout.counts()
    }

    pub fn layout(&self) -> &ArcLayout {
        &self.layout
    }

    pub fn supplies(&self) -> &[f64] {
        &self.supplies
    }

    pub fn demands(&self) -> &[f64] {
        &self.demands
    }

    pub fn total_supply(&self) -> f64 {
        self.supplies.iter().sum()
    }

    pub fn total_demand(&self) -> f64 {
        self.demands.iter().sum()
    }

    /// Arcs that have no cost set
    pub fn missing_costs(&self) -> Vec<Arc> {
        self.costs
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(|(slot, _)| self.layout.arc(slot))
            .collect()
    }
}

fn check_quantities(role: NodeRole, expected: usize, values: &[f64], first_node: usize) -> Result<(), ModelError> {
    if values.len() != expected {
        return Err(ModelError::LengthMismatch {
            role,
            expected,
            found: values.len(),
        });
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite() || *v < 0.0) {
        return Err(ModelError::InvalidQuantity {
            role,
            node: first_node + i,
            value: values[i],
        });
    }
    Ok(())
}

/// Normalized LP for a transshipment problem
#[derive(Debug, Clone)]
pub struct LpInstance {
    pub lp: LpProblem,
    pub layout: ArcLayout,
    /// Cost per arc slot after applying the missing-cost policy
    pub costs: Vec<f64>,
}

/// Translates a [`TransshipmentProblem`] into an [`LpInstance`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelBuilder {
    options: BuildOptions,
}

impl ModelBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    /// Build one flow variable per arc and one equality row per node:
    /// supply rows, then demand rows, then intermediate balance rows.
    pub fn build(&self, problem: &TransshipmentProblem) -> Result<LpInstance, ModelError> {
        let layout = *problem.layout();
        let counts = layout.counts();
        let costs = self.resolve_costs(problem)?;

        let variables: Vec<String> = layout
            .arcs()
            .map(|arc| format!("flow_{}_{}", arc.from, arc.to))
            .collect();
        let n = variables.len();

        let mut lp = LpProblem::new(variables);
        lp.set_objective(costs.clone(), true);

        // Supply: everything produced leaves the node
        for (i, node) in counts.nodes(NodeRole::Supply).enumerate() {
            let mut coeffs = vec![0.0; n];
            for slot in layout.outgoing(node) {
                coeffs[slot] = 1.0;
            }
            lp.add_constraint(format!("supply_{}", node), coeffs, ConstraintOp::Eq, problem.supplies[i]);
        }

        // Demand: everything required arrives at the node
        for (i, node) in counts.nodes(NodeRole::Demand).enumerate() {
            let mut coeffs = vec![0.0; n];
            for slot in layout.incoming(node) {
                coeffs[slot] = 1.0;
            }
            lp.add_constraint(format!("demand_{}", node), coeffs, ConstraintOp::Eq, problem.demands[i]);
        }

        // Balance: inflow minus outflow is zero
        for node in counts.nodes(NodeRole::Intermediate) {
            let mut coeffs = vec![0.0; n];
            for slot in layout.incoming(node) {
                coeffs[slot] = 1.0;
            }
            for slot in layout.outgoing(node) {
                coeffs[slot] = -1.0;
            }
            lp.add_constraint(format!("balance_{}", node), coeffs, ConstraintOp::Eq, 0.0);
        }

        log::debug!(
            "built transshipment LP: {} variables, {} constraints",
            lp.num_variables(),
            lp.num_constraints()
        );

        Ok(LpInstance { lp, layout, costs })
    }

    fn resolve_costs(&self, problem: &TransshipmentProblem) -> Result<Vec<f64>, ModelError> {
        let missing = problem.missing_costs();
        if let Some(first) = missing.first() {
            match self.options.missing_cost {
                MissingCostPolicy::Reject => {
                    return Err(ModelError::MissingCost {
                        from: first.from,
                        to: first.to,
                    });
                }
                MissingCostPolicy::Zero => {
                    log::warn!("{} arcs have no cost and are treated as free (first: {})", missing.len(), first);
                }
            }
        }

        Ok(problem.costs.iter().map(|c| c.unwrap_or(0.0)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TransshipmentProblem {
        // supply 1,2; intermediate 3; demand 4,5
        let mut problem =
            TransshipmentProblem::new(NodeCounts::new(2, 1, 2), vec![5.0, 5.0], vec![4.0, 6.0]).unwrap();
        problem.set_cost(1, 3, 1.0).unwrap();
        problem.set_cost(2, 3, 2.0).unwrap();
        problem.set_cost(3, 4, 3.0).unwrap();
        problem.set_cost(3, 5, 4.0).unwrap();
        problem
    }

    #[test]
    fn test_dimensions() {
        let instance = ModelBuilder::default().build(&sample()).unwrap();

        assert_eq!(instance.lp.num_variables(), 2 * 1 + 1 * 2);
        assert_eq!(instance.lp.num_constraints(), 2 + 2 + 1);
        assert_eq!(instance.lp.objective.coefficients, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(instance.lp.objective.minimize);
        assert_eq!(instance.lp.variables[2], "flow_3_4");

        let names: Vec<&str> = instance.lp.constraints.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["supply_1", "supply_2", "demand_4", "demand_5", "balance_3"]);
    }

    #[test]
    fn test_constraint_rows() {
        let instance = ModelBuilder::default().build(&sample()).unwrap();
        let rows = &instance.lp.constraints;

        assert_eq!(rows[0].coefficients, vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(rows[0].rhs, 5.0);
        assert_eq!(rows[3].coefficients, vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(rows[3].rhs, 6.0);
        assert_eq!(rows[4].coefficients, vec![1.0, 1.0, -1.0, -1.0]);
        assert_eq!(rows[4].rhs, 0.0);
        assert!(rows.iter().all(|r| r.op == ConstraintOp::Eq));
    }

    #[test]
    fn test_missing_cost_rejected_by_default() {
        let mut problem = TransshipmentProblem::new(NodeCounts::new(1, 1, 1), vec![1.0], vec![1.0]).unwrap();
        problem.set_cost(1, 2, 1.0).unwrap();

        let err = ModelBuilder::default().build(&problem).unwrap_err();
        assert_eq!(err, ModelError::MissingCost { from: 2, to: 3 });
    }

    #[test]
    fn test_missing_cost_as_zero() {
        let mut problem = TransshipmentProblem::new(NodeCounts::new(1, 1, 1), vec![1.0], vec![1.0]).unwrap();
        problem.set_cost(1, 2, 1.0).unwrap();

        let options = BuildOptions::new().with_missing_cost(MissingCostPolicy::Zero);
        let instance = ModelBuilder::new(options).build(&problem).unwrap();
        assert_eq!(instance.costs, vec![1.0, 0.0]);
    }

    #[test]
    fn test_invalid_quantities() {
        let err = TransshipmentProblem::new(NodeCounts::new(2, 1, 1), vec![1.0], vec![1.0]).unwrap_err();
        assert_eq!(
            err,
            ModelError::LengthMismatch { role: NodeRole::Supply, expected: 2, found: 1 }
        );

        let err = TransshipmentProblem::new(NodeCounts::new(1, 1, 2), vec![1.0], vec![0.5, -0.5]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::InvalidQuantity { role: NodeRole::Demand, node: 4, .. }
        ));

        let err = TransshipmentProblem::new(NodeCounts::new(1, 1, 1), vec![f64::INFINITY], vec![1.0]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidQuantity { node: 1, .. }));
    }

    #[test]
    fn test_oversized_network_is_rejected() {
        let counts = NodeCounts::try_from_signed(3, i64::MAX / 2, 1).unwrap();
        let err = TransshipmentProblem::new(counts, vec![1.0; 3], vec![3.0]).unwrap_err();

        assert!(matches!(err, ModelError::TooManyArcs { supply: 3, demand: 1, .. }));
    }

    #[test]
    fn test_invalid_costs() {
        let mut problem = TransshipmentProblem::new(NodeCounts::new(1, 1, 1), vec![1.0], vec![1.0]).unwrap();
        assert!(matches!(problem.set_cost(1, 2, -1.0), Err(ModelError::InvalidCost { .. })));
        assert!(matches!(problem.set_cost(1, 2, f64::NAN), Err(ModelError::InvalidCost { .. })));
        assert!(matches!(problem.set_cost(1, 3, 1.0), Err(ModelError::InvalidArc { .. })));

        let mut costs = HashMap::new();
        costs.insert((1, 9), 1.0);
        let err = TransshipmentProblem::from_parts(NodeCounts::new(1, 1, 1), vec![1.0], vec![1.0], &costs)
            .unwrap_err();
        assert_eq!(err, ModelError::NodeOutOfRange { node: 9, total: 3 });
    }

    #[test]
    fn test_empty_network() {
        let problem = TransshipmentProblem::new(NodeCounts::default(), Vec::new(), Vec::new()).unwrap();
        let instance = ModelBuilder::default().build(&problem).unwrap();

        assert_eq!(instance.lp.num_variables(), 0);
        assert_eq!(instance.lp.num_constraints(), 0);
    }
}
