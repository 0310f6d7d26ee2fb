use thiserror::Error;
use transship_solver::InstanceError;

use crate::network::NodeRole;

/// Caller-supplied transshipment data that cannot form a valid model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Negative {role} node count: {count}")]
    NegativeCount { role: NodeRole, count: i64 },
    #[error("Network with {supply} supply, {intermediate} intermediate and {demand} demand nodes is too large")]
    TooManyArcs {
        supply: usize,
        intermediate: usize,
        demand: usize,
    },
    #[error("Expected {expected} {role} quantities, found {found}")]
    LengthMismatch {
        role: NodeRole,
        expected: usize,
        found: usize,
    },
    #[error("Invalid {role} quantity {value} at node {node}: must be finite and non-negative")]
    InvalidQuantity { role: NodeRole, node: usize, value: f64 },
    #[error("Node {node} is outside the node range 1..={total}")]
    NodeOutOfRange { node: usize, total: usize },
    #[error("No arc from node {from} to node {to}: only supply->intermediate and intermediate->demand arcs exist")]
    InvalidArc { from: usize, to: usize },
    #[error("Invalid cost {cost} on arc {from}->{to}: must be finite and non-negative")]
    InvalidCost { from: usize, to: usize, cost: f64 },
    #[error("Cost for arc {from}->{to} given more than once")]
    DuplicateCost { from: usize, to: usize },
    #[error("Missing cost for arc {from}->{to}")]
    MissingCost { from: usize, to: usize },
    #[error(transparent)]
    Solver(#[from] InstanceError),
}
