//! Topology validation utilities.
//!
//! Standalone checks for topologies that did not come through
//! `GraphState`: decoded documents, generated graphs, hand-written JSON.

use crate::topology::generate::TopologyTemplate;
use crate::topology::{NetworkTopology, NodeId};
use std::collections::HashSet;

/// Validate the structural invariants of a topology
///
/// Checks for:
/// - Duplicate node ids
/// - Edges referencing nodes that do not exist
/// - Self-loops
/// - Duplicate `(source, target)` edges
///
/// # Returns
/// * `Ok(())` if every invariant holds
/// * `Err(String)` describing the first violation found
///
/// # Examples
/// ```
/// use topograph::topology::{NetworkEdge, NetworkNode, NetworkTopology, TopologyKind};
/// use topograph::utils::validation::validate_topology;
///
/// let mut topology = NetworkTopology::new(0, "pair", TopologyKind::Custom);
/// topology.nodes.push(NetworkNode::new("0", "node 0"));
/// topology.nodes.push(NetworkNode::new("1", "node 1"));
/// topology.edges.push(NetworkEdge::new("0", "1"));
/// assert!(validate_topology(&topology).is_ok());
///
/// topology.edges.push(NetworkEdge::new("1", "1"));
/// assert!(validate_topology(&topology).is_err());
/// ```
pub fn validate_topology(topology: &NetworkTopology) -> Result<(), String> {
    let mut node_ids: HashSet<&NodeId> = HashSet::new();
    for node in &topology.nodes {
        if !node_ids.insert(&node.id) {
            return Err(format!("Duplicate node ID: {}", node.id));
        }
    }

    let mut seen_edges = HashSet::new();
    for edge in &topology.edges {
        if !node_ids.contains(&edge.source) {
            return Err(format!("Edge references non-existent source node: {}", edge.source));
        }
        if !node_ids.contains(&edge.target) {
            return Err(format!("Edge references non-existent target node: {}", edge.target));
        }
        if edge.source == edge.target {
            return Err(format!("Self-loop on node {}", edge.source));
        }
        if !seen_edges.insert((&edge.source, &edge.target)) {
            return Err(format!("Duplicate edge {} -> {}", edge.source, edge.target));
        }
    }

    Ok(())
}

/// Validate that a connection template makes sense for a node count
///
/// - Ring needs at least 3 nodes
/// - Star needs at least 2 nodes
/// - Mesh is not recommended above 50 nodes (n² links)
/// - DAG is always valid
///
/// # Examples
/// ```
/// use topograph::topology::generate::TopologyTemplate;
/// use topograph::utils::validation::validate_template_size;
///
/// assert!(validate_template_size(TopologyTemplate::Mesh, 10).is_ok());
/// assert!(validate_template_size(TopologyTemplate::Ring, 2).is_err());
/// assert!(validate_template_size(TopologyTemplate::Star, 1).is_err());
/// ```
pub fn validate_template_size(template: TopologyTemplate, node_count: usize) -> Result<(), String> {
    match template {
        TopologyTemplate::Mesh => {
            if node_count > 50 {
                return Err("Mesh template not recommended for more than 50 nodes due to link count".to_string());
            }
        }
        TopologyTemplate::Ring => {
            if node_count < 3 {
                return Err("Ring template requires at least 3 nodes".to_string());
            }
        }
        TopologyTemplate::Star => {
            if node_count < 2 {
                return Err("Star template requires at least 2 nodes".to_string());
            }
        }
        TopologyTemplate::Dag => {}
    }
    Ok(())
}
