use thiserror::Error;

/// An `LpProblem` whose internal dimensions or numbers are inconsistent.
///
/// This is a contract violation by whoever built the problem, not a property
/// of the optimization problem itself; infeasible and unbounded problems are
/// reported through [`SolutionStatus`](crate::SolutionStatus) instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstanceError {
    #[error("Invalid instance: objective has {found} coefficients but there are {expected} variables")]
    ObjectiveLength { expected: usize, found: usize },
    #[error("Invalid instance: constraint {constraint} has {found} coefficients but there are {expected} variables")]
    ConstraintLength {
        constraint: String,
        expected: usize,
        found: usize,
    },
    #[error("Invalid instance: non-finite value in {0}")]
    NonFinite(String),
}
