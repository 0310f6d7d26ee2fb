use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use transship_model::{ArcFlow, ConstraintViolation, FlowSolution};

/// JSON response: `{"status": ..., "flows": {"1->2": 10.0}, "total_cost": ...}`
#[derive(Serialize)]
pub struct Report<'a> {
    status: &'static str,
    flows: FlowMap<'a>,
    total_cost: Option<f64>,
    #[serde(skip_serializing_if = "is_empty")]
    violations: &'a [ConstraintViolation],
}

impl<'a> Report<'a> {
    pub fn new(solution: &'a FlowSolution) -> Self {
        Self {
            status: solution.status.as_str(),
            flows: FlowMap(&solution.flows),
            total_cost: solution.total_cost,
            violations: &solution.violations,
        }
    }
}

fn is_empty(violations: &&[ConstraintViolation]) -> bool {
    violations.is_empty()
}

/// Flows keyed by arc, kept in slot order
struct FlowMap<'a>(&'a [ArcFlow]);

impl Serialize for FlowMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for f in self.0 {
            map.serialize_entry(&f.arc().to_string(), &f.flow)?;
        }
        map.end()
    }
}
