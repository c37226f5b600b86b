//! Peer lookups.
//!
//! Pure queries over a node/edge set. Each call scans the edge list once,
//! which is fine for editor-sized topologies.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::types::{NetworkEdge, NetworkNode, NodeId};

/// Degree information for a single node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDegree {
    pub node_id: NodeId,
    pub outbound: usize,
    pub inbound: usize,
    pub total: usize,
}

/// Nodes linked to `node_id` by any edge, in either direction
///
/// Each peer appears once, in the order of `nodes`. A node is never its own
/// peer. Unknown ids yield an empty list.
pub fn peers_of<'a>(node_id: &NodeId, nodes: &'a [NetworkNode], edges: &[NetworkEdge]) -> Vec<&'a NetworkNode> {
    let peer_ids: HashSet<&NodeId> = edges
        .iter()
        .filter_map(|edge| {
            if &edge.source == node_id {
                Some(&edge.target)
            } else if &edge.target == node_id {
                Some(&edge.source)
            } else {
                None
            }
        })
        .filter(|peer| *peer != node_id)
        .collect();

    nodes.iter().filter(|node| peer_ids.contains(&node.id)).collect()
}

/// Inbound/outbound link counts for a node
pub fn degree_of(node_id: &NodeId, edges: &[NetworkEdge]) -> NodeDegree {
    let outbound = edges.iter().filter(|edge| &edge.source == node_id).count();
    let inbound = edges.iter().filter(|edge| &edge.target == node_id).count();
    NodeDegree {
        node_id: node_id.clone(),
        outbound,
        inbound,
        total: outbound + inbound,
    }
}

/// Nodes with no links at all
pub fn isolated_nodes<'a>(nodes: &'a [NetworkNode], edges: &[NetworkEdge]) -> Vec<&'a NetworkNode> {
    let linked: HashSet<&NodeId> = edges
        .iter()
        .flat_map(|edge| [&edge.source, &edge.target])
        .collect();
    nodes.iter().filter(|node| !linked.contains(&node.id)).collect()
}
