//! Instance description as read from external input.

use std::collections::HashSet;

use serde::Deserialize;

use crate::builder::TransshipmentProblem;
use crate::error::ModelError;
use crate::network::NodeCounts;

/// A transshipment instance in its raw, unvalidated form.
///
/// Node counts are signed so that negative counts surface as
/// [`ModelError::NegativeCount`] rather than as a parse failure. The supply
/// and demand counts are optional and default to the sequence lengths.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceFile {
    #[serde(default, alias = "num_supply_nodes")]
    pub supply_nodes: Option<i64>,
    #[serde(alias = "num_intermediate_nodes")]
    pub intermediate: i64,
    #[serde(default, alias = "num_demand_nodes")]
    pub demand_nodes: Option<i64>,
    pub supply: Vec<f64>,
    pub demand: Vec<f64>,
    #[serde(default)]
    pub costs: Vec<CostEntry>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CostEntry {
    pub from: usize,
    pub to: usize,
    pub cost: f64,
}

impl InstanceFile {
    pub fn into_problem(self) -> Result<TransshipmentProblem, ModelError> {
        let counts = NodeCounts::try_from_signed(
            self.supply_nodes.unwrap_or(self.supply.len() as i64),
            self.intermediate,
            self.demand_nodes.unwrap_or(self.demand.len() as i64),
        )?;

        let mut problem = TransshipmentProblem::new(counts, self.supply, self.demand)?;
        let mut seen = HashSet::new();
        for entry in &self.costs {
            if !seen.insert((entry.from, entry.to)) {
                return Err(ModelError::DuplicateCost {
                    from: entry.from,
                    to: entry.to,
                });
            }
            problem.set_cost(entry.from, entry.to, entry.cost)?;
        }
        Ok(problem)
    }
}
