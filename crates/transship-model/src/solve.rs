use transship_solver::{ConstraintViolation, Solution, SolutionStatus, Solver};

use crate::builder::{BuildOptions, LpInstance, ModelBuilder, TransshipmentProblem};
use crate::error::ModelError;
use crate::network::{Arc, NodeCounts, NodeRole};

/// Optimal flow on one arc
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArcFlow {
    pub from: usize,
    pub to: usize,
    pub flow: f64,
    /// Unit cost used by the model
    pub cost: f64,
    /// Cost increase per unit forced onto this arc
    pub reduced_cost: f64,
}

impl ArcFlow {
    pub fn arc(&self) -> Arc {
        Arc {
            from: self.from,
            to: self.to,
        }
    }
}

/// Dual value of a node's conservation row
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodePrice {
    pub node: usize,
    pub role: NodeRole,
    /// Change in total cost per extra unit of supply, demand or balance
    pub price: f64,
}

/// Result of solving a transshipment problem
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowSolution {
    pub status: SolutionStatus,
    /// Flow on every arc in slot order; empty unless optimal
    pub flows: Vec<ArcFlow>,
    /// Sum of flow times unit cost over all arcs; `None` unless optimal
    pub total_cost: Option<f64>,
    /// Node duals; empty unless optimal
    pub prices: Vec<NodePrice>,
    /// Why the problem is infeasible, when it is
    pub violations: Vec<ConstraintViolation>,
    /// Simplex pivots performed
    pub iterations: usize,
}

impl FlowSolution {
    fn without_flows(status: SolutionStatus, violations: Vec<ConstraintViolation>, iterations: usize) -> Self {
        Self {
            status,
            flows: Vec::new(),
            total_cost: None,
            prices: Vec::new(),
            violations,
            iterations,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Flow on `from -> to`, `None` if there is no such arc in the solution
    pub fn flow(&self, from: usize, to: usize) -> Option<f64> {
        self.flows
            .iter()
            .find(|f| f.from == from && f.to == to)
            .map(|f| f.flow)
    }

    /// Arcs carrying a positive flow
    pub fn nonzero_flows(&self) -> impl Iterator<Item = &ArcFlow> {
        self.flows.iter().filter(|f| f.flow > 0.0)
    }

    pub fn inflow(&self, node: usize) -> f64 {
        self.flows.iter().filter(|f| f.to == node).map(|f| f.flow).sum()
    }

    pub fn outflow(&self, node: usize) -> f64 {
        self.flows.iter().filter(|f| f.from == node).map(|f| f.flow).sum()
    }

    pub fn price(&self, node: usize) -> Option<f64> {
        self.prices.iter().find(|p| p.node == node).map(|p| p.price)
    }
}

/// Build the LP for `problem` and solve it.
///
/// Infeasible, unbounded and iteration-limited outcomes are statuses of the
/// returned solution. Errors are reserved for input that cannot form a model.
pub fn solve(
    problem: &TransshipmentProblem,
    options: &BuildOptions,
    solver: &Solver,
) -> Result<FlowSolution, ModelError> {
    let instance = ModelBuilder::new(*options).build(problem)?;

    if options.check_balance {
        if let Some(violation) = balance_violation(problem, solver) {
            log::info!("{}", violation.description);
            return Ok(FlowSolution::without_flows(SolutionStatus::Infeasible, vec![violation], 0));
        }
    }

    let solution = solver.solve(&instance.lp)?;
    Ok(to_flow_solution(&instance, problem.counts(), solution))
}

/// Total supply and total demand must match, within the solver's absolute
/// tolerance, for any flow to exist
pub fn balance_violation(problem: &TransshipmentProblem, solver: &Solver) -> Option<ConstraintViolation> {
    let supply = problem.total_supply();
    let demand = problem.total_demand();

    if (supply - demand).abs() <= solver.tolerance() {
        return None;
    }

    Some(ConstraintViolation {
        constraint: "total_balance".to_string(),
        required: demand,
        actual: supply,
        violation_amount: (supply - demand).abs(),
        description: format!(
            "Total supply {} does not match total demand {}",
            supply, demand
        ),
    })
}

fn to_flow_solution(instance: &LpInstance, counts: NodeCounts, solution: Solution) -> FlowSolution {
    if solution.status != SolutionStatus::Optimal {
        return FlowSolution::without_flows(solution.status, solution.violations, solution.iterations);
    }

    let flows: Vec<ArcFlow> = instance
        .layout
        .arcs()
        .enumerate()
        .map(|(slot, arc)| ArcFlow {
            from: arc.from,
            to: arc.to,
            flow: solution.values[slot],
            cost: instance.costs[slot],
            reduced_cost: solution.analysis.reduced_costs[slot].reduced_cost,
        })
        .collect();

    let total_cost = flows.iter().map(|f| f.flow * f.cost).sum();

    // Rows were emitted as supply, demand, then intermediate
    let nodes = counts
        .nodes(NodeRole::Supply)
        .map(|n| (n, NodeRole::Supply))
        .chain(counts.nodes(NodeRole::Demand).map(|n| (n, NodeRole::Demand)))
        .chain(counts.nodes(NodeRole::Intermediate).map(|n| (n, NodeRole::Intermediate)));
    let prices = nodes
        .zip(&solution.analysis.shadow_prices)
        .map(|((node, role), sp)| NodePrice {
            node,
            role,
            price: sp.value,
        })
        .collect();

    FlowSolution {
        status: SolutionStatus::Optimal,
        flows,
        total_cost: Some(total_cost),
        prices,
        violations: Vec::new(),
        iterations: solution.iterations,
    }
}
