mod error;
mod problem;
mod simplex;
mod solution;

pub use error::InstanceError;
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective};
pub use simplex::{PricingRule, Solver};
pub use solution::{Analysis, ConstraintViolation, ReducedCost, ShadowPrice, Solution, SolutionStatus};
