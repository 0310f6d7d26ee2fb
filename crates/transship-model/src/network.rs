//! Node numbering and the arc-to-variable slot table.
//!
//! Nodes are numbered from 1 in one contiguous range: supply nodes first,
//! then intermediate nodes, then demand nodes. Arcs exist only from every
//! supply node to every intermediate node and from every intermediate node
//! to every demand node, so an arc's variable slot is pure index arithmetic.

use std::fmt;

use crate::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeRole {
    Supply,
    Intermediate,
    Demand,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Supply => write!(f, "supply"),
            NodeRole::Intermediate => write!(f, "intermediate"),
            NodeRole::Demand => write!(f, "demand"),
        }
    }
}

/// Number of nodes in each echelon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeCounts {
    pub supply: usize,
    pub intermediate: usize,
    pub demand: usize,
}

impl NodeCounts {
    pub fn new(supply: usize, intermediate: usize, demand: usize) -> Self {
        Self {
            supply,
            intermediate,
            demand,
        }
    }

    /// Build from signed counts as they arrive from external input
    pub fn try_from_signed(supply: i64, intermediate: i64, demand: i64) -> Result<Self, ModelError> {
        let check = |role: NodeRole, count: i64| {
            usize::try_from(count).map_err(|_| ModelError::NegativeCount { role, count })
        };
        Ok(Self {
            supply: check(NodeRole::Supply, supply)?,
            intermediate: check(NodeRole::Intermediate, intermediate)?,
            demand: check(NodeRole::Demand, demand)?,
        })
    }

    /// Number of arcs, `None` when the node or arc count overflows `usize`
    pub fn checked_num_arcs(&self) -> Option<usize> {
        self.supply.checked_add(self.intermediate)?.checked_add(self.demand)?;
        let outbound = self.supply.checked_mul(self.intermediate)?;
        let inbound = self.intermediate.checked_mul(self.demand)?;
        outbound.checked_add(inbound)
    }

    pub fn total(&self) -> usize {
        self.supply + self.intermediate + self.demand
    }

    pub fn num_arcs(&self) -> usize {
        self.supply * self.intermediate + self.intermediate * self.demand
    }

    /// Role of a 1-based node id, `None` when out of range
    pub fn role(&self, node: usize) -> Option<NodeRole> {
        if node == 0 {
            None
        } else if node <= self.supply {
            Some(NodeRole::Supply)
        } else if node <= self.supply + self.intermediate {
            Some(NodeRole::Intermediate)
        } else if node <= self.total() {
            Some(NodeRole::Demand)
        } else {
            None
        }
    }

    /// 1-based ids of the nodes with `role`
    pub fn nodes(&self, role: NodeRole) -> std::ops::RangeInclusive<usize> {
        let first = match role {
            NodeRole::Supply => 1,
            NodeRole::Intermediate => self.supply + 1,
            NodeRole::Demand => self.supply + self.intermediate + 1,
        };
        let len = match role {
            NodeRole::Supply => self.supply,
            NodeRole::Intermediate => self.intermediate,
            NodeRole::Demand => self.demand,
        };
        first..=(first + len - 1)
    }
}

/// A directed arc between two 1-based node ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Arc {
    pub from: usize,
    pub to: usize,
}

impl fmt::Display for Arc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// Fixed mapping between arcs and LP variable slots.
///
/// Supply→intermediate arcs occupy slots `0..S*M` (by supply, then
/// intermediate); intermediate→demand arcs follow (by intermediate, then
/// demand).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcLayout {
    counts: NodeCounts,
}

impl ArcLayout {
    pub fn new(counts: NodeCounts) -> Self {
        Self { counts }
    }

    pub fn counts(&self) -> NodeCounts {
        self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.num_arcs()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn inbound_offset(&self) -> usize {
        self.counts.supply * self.counts.intermediate
    }

    /// Slot of the arc `from -> to`.
    ///
    /// Fails when either id is out of range or the pair is not a
    /// supply→intermediate or intermediate→demand arc.
    pub fn slot(&self, from: usize, to: usize) -> Result<usize, ModelError> {
        let c = &self.counts;
        let total = c.total();
        for node in [from, to] {
            if c.role(node).is_none() {
                return Err(ModelError::NodeOutOfRange { node, total });
            }
        }

        match (c.role(from), c.role(to)) {
            (Some(NodeRole::Supply), Some(NodeRole::Intermediate)) => {
                let s = from - 1;
                let m = to - c.supply - 1;
                Ok(s * c.intermediate + m)
            }
            (Some(NodeRole::Intermediate), Some(NodeRole::Demand)) => {
                let m = from - c.supply - 1;
                let d = to - c.supply - c.intermediate - 1;
                Ok(self.inbound_offset() + m * c.demand + d)
            }
            _ => Err(ModelError::InvalidArc { from, to }),
        }
    }

    /// Arc stored at `slot`
    pub fn arc(&self, slot: usize) -> Arc {
        let c = &self.counts;
        let offset = self.inbound_offset();
        if slot < offset {
            Arc {
                from: slot / c.intermediate + 1,
                to: c.supply + slot % c.intermediate + 1,
            }
        } else {
            let rel = slot - offset;
            Arc {
                from: c.supply + rel / c.demand + 1,
                to: c.supply + c.intermediate + rel % c.demand + 1,
            }
        }
    }

    /// All arcs in slot order
    pub fn arcs(&self) -> impl Iterator<Item = Arc> + '_ {
        (0..self.len()).map(move |slot| self.arc(slot))
    }

    /// Slots of the arcs leaving `node`
    pub fn outgoing(&self, node: usize) -> Vec<usize> {
        let c = &self.counts;
        match c.role(node) {
            Some(NodeRole::Supply) => {
                let start = (node - 1) * c.intermediate;
                (start..start + c.intermediate).collect()
            }
            Some(NodeRole::Intermediate) => {
                let start = self.inbound_offset() + (node - c.supply - 1) * c.demand;
                (start..start + c.demand).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Slots of the arcs entering `node`
    pub fn incoming(&self, node: usize) -> Vec<usize> {
        let c = &self.counts;
        match c.role(node) {
            Some(NodeRole::Intermediate) => {
                let m = node - c.supply - 1;
                (0..c.supply).map(|s| s * c.intermediate + m).collect()
            }
            Some(NodeRole::Demand) => {
                let d = node - c.supply - c.intermediate - 1;
                (0..c.intermediate)
                    .map(|m| self.inbound_offset() + m * c.demand + d)
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles() {
        let counts = NodeCounts::new(2, 1, 3);
        assert_eq!(counts.role(0), None);
        assert_eq!(counts.role(1), Some(NodeRole::Supply));
        assert_eq!(counts.role(2), Some(NodeRole::Supply));
        assert_eq!(counts.role(3), Some(NodeRole::Intermediate));
        assert_eq!(counts.role(4), Some(NodeRole::Demand));
        assert_eq!(counts.role(6), Some(NodeRole::Demand));
        assert_eq!(counts.role(7), None);
        assert_eq!(counts.nodes(NodeRole::Demand), 4..=6);
        assert!(NodeCounts::new(2, 0, 1).nodes(NodeRole::Intermediate).is_empty());
    }

    #[test]
    fn test_negative_count() {
        let err = NodeCounts::try_from_signed(1, -2, 1).unwrap_err();
        assert!(matches!(
            err,
            ModelError::NegativeCount { role: NodeRole::Intermediate, count: -2 }
        ));
    }

    #[test]
    fn test_checked_num_arcs() {
        assert_eq!(NodeCounts::new(2, 3, 4).checked_num_arcs(), Some(18));
        assert_eq!(NodeCounts::new(0, 0, 0).checked_num_arcs(), Some(0));
        assert_eq!(NodeCounts::new(3, usize::MAX / 2, 1).checked_num_arcs(), None);
        assert_eq!(NodeCounts::new(usize::MAX, 0, 1).checked_num_arcs(), None);
    }

    #[test]
    fn test_slot_layout() {
        // nodes: supply 1,2; intermediate 3,4; demand 5,6,7
        let layout = ArcLayout::new(NodeCounts::new(2, 2, 3));
        assert_eq!(layout.len(), 4 + 6);

        assert_eq!(layout.slot(1, 3).unwrap(), 0);
        assert_eq!(layout.slot(2, 4).unwrap(), 3);
        assert_eq!(layout.slot(3, 5).unwrap(), 4);
        assert_eq!(layout.slot(4, 7).unwrap(), 9);

        for (slot, arc) in layout.arcs().enumerate() {
            assert_eq!(layout.slot(arc.from, arc.to).unwrap(), slot, "arc {}", arc);
        }
    }

    #[test]
    fn test_adjacency() {
        let layout = ArcLayout::new(NodeCounts::new(2, 2, 3));
        assert_eq!(layout.outgoing(2), vec![2, 3]);
        assert_eq!(layout.incoming(4), vec![1, 3]);
        assert_eq!(layout.outgoing(3), vec![4, 5, 6]);
        assert_eq!(layout.incoming(6), vec![5, 8]);
        assert!(layout.incoming(1).is_empty());
        assert!(layout.outgoing(7).is_empty());
    }

    #[test]
    fn test_rejects_invalid_arcs() {
        let layout = ArcLayout::new(NodeCounts::new(1, 1, 1));
        assert!(matches!(layout.slot(1, 3), Err(ModelError::InvalidArc { from: 1, to: 3 })));
        assert!(matches!(layout.slot(2, 1), Err(ModelError::InvalidArc { .. })));
        assert!(matches!(layout.slot(1, 4), Err(ModelError::NodeOutOfRange { node: 4, total: 3 })));
        assert!(matches!(layout.slot(0, 2), Err(ModelError::NodeOutOfRange { node: 0, .. })));
    }
}
