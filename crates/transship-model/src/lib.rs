pub mod builder;
pub mod error;
pub mod network;
pub mod solve;

#[cfg(feature = "serde")]
pub mod input;

pub use builder::{BuildOptions, LpInstance, MissingCostPolicy, ModelBuilder, TransshipmentProblem};
pub use error::ModelError;
pub use network::{Arc, ArcLayout, NodeCounts, NodeRole};
pub use solve::{ArcFlow, FlowSolution, NodePrice, balance_violation, solve};

pub use transship_solver::{ConstraintViolation, PricingRule, SolutionStatus, Solver};
