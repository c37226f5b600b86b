//! Automatic node placement.
//!
//! Two strategies share one entry point: a force simulation for topologies
//! the user rearranges freely, and a one-shot ranked layout that gives
//! freshly created graphs with edges a readable starting arrangement.
//! Prebuilt topologies keep the coordinates from their asset and are never
//! ranked.

pub mod force;
pub mod hierarchical;

use serde::{Deserialize, Serialize};

use crate::config::{CanvasConfig, LayoutConfig};
use crate::topology::{NetworkTopology, NodeId, Position, TopologyKind};

pub use force::{ForceSimulation, LayoutFrame};
pub use hierarchical::hierarchical_layout;

/// Upper bound for one-shot force layouts
pub const MAX_FORCE_TICKS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
    Force,
    Hierarchical,
}

/// Layout requests that cannot be honoured
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("prebuilt topology '{0}' keeps its asset coordinates")]
    PrebuiltPositions(String),
}

/// Which strategy, if any, should place a topology when it is first shown
///
/// Ranked layout runs once for custom topologies that already have edges.
/// Custom topologies without edges start under the force simulation.
/// Prebuilt topologies and anything laid out before are left untouched.
pub fn initial_strategy(kind: &TopologyKind, has_edges: bool, already_laid_out: bool) -> Option<LayoutStrategy> {
    match kind {
        TopologyKind::Prebuilt { .. } => None,
        TopologyKind::Custom if already_laid_out => None,
        TopologyKind::Custom if has_edges => Some(LayoutStrategy::Hierarchical),
        TopologyKind::Custom => Some(LayoutStrategy::Force),
    }
}

/// Compute positions for every node with the given strategy
///
/// Force layouts run to rest (bounded by [`MAX_FORCE_TICKS`]) starting from
/// the current positions.
pub fn layout(
    topology: &NetworkTopology,
    strategy: LayoutStrategy,
    config: &LayoutConfig,
    canvas: &CanvasConfig,
) -> Result<Vec<(NodeId, Position)>, LayoutError> {
    match strategy {
        LayoutStrategy::Hierarchical => {
            if let Some(asset) = topology.kind.asset() {
                return Err(LayoutError::PrebuiltPositions(asset.to_string()));
            }
            Ok(hierarchical_layout(topology, &config.hierarchical, canvas))
        }
        LayoutStrategy::Force => {
            let mut simulation = ForceSimulation::new(topology, 0, &config.force, canvas);
            simulation.run_until_settled(MAX_FORCE_TICKS);
            Ok(simulation.positions())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{NetworkEdge, NetworkNode};

    #[test]
    fn test_initial_strategy_policy() {
        let prebuilt = TopologyKind::Prebuilt { asset: "ln".to_string() };
        assert_eq!(initial_strategy(&prebuilt, true, false), None);
        assert_eq!(initial_strategy(&TopologyKind::Custom, true, true), None);
        assert_eq!(
            initial_strategy(&TopologyKind::Custom, true, false),
            Some(LayoutStrategy::Hierarchical)
        );
        assert_eq!(initial_strategy(&TopologyKind::Custom, false, false), Some(LayoutStrategy::Force));
    }

    #[test]
    fn test_hierarchical_refused_for_prebuilt() {
        let mut topology = NetworkTopology::new(0, "ln", TopologyKind::Prebuilt { asset: "ln".to_string() });
        topology.nodes.push(NetworkNode::new("0", "a"));
        let result = layout(
            &topology,
            LayoutStrategy::Hierarchical,
            &LayoutConfig::default(),
            &CanvasConfig::default(),
        );
        assert_eq!(result, Err(LayoutError::PrebuiltPositions("ln".to_string())));
    }

    #[test]
    fn test_force_layout_terminates() {
        let mut topology = NetworkTopology::new(0, "pair", TopologyKind::Custom);
        topology.nodes.push(NetworkNode::new("0", "a"));
        topology.nodes.push(NetworkNode::new("1", "b"));
        topology.edges.push(NetworkEdge::new("0", "1"));

        let positions = layout(&topology, LayoutStrategy::Force, &LayoutConfig::default(), &CanvasConfig::default())
            .unwrap();
        assert_eq!(positions.len(), 2);
        assert_ne!(positions[0].1, positions[1].1);
    }
}
