//! Topology type definitions.
//!
//! This file contains the data model shared by every component: nodes,
//! directed peer links, and the topology that owns them. The
//! `custom`/`prebuilt` distinction lives on [`TopologyKind`] and nowhere else.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default drawing size of a node, exported under the `size` key
pub const DEFAULT_NODE_SIZE: f64 = 10.0;

/// Opaque node identifier, unique within a topology and stable across edits
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the id, if it is a plain unsigned integer
    pub fn numeric(&self) -> Option<u64> {
        self.0.parse::<u64>().ok()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        NodeId(id)
    }
}

/// 2D canvas position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Hardware profile of a simulated host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceProfile {
    /// Memory in GB
    pub ram: u32,
    /// CPU cores
    pub cpu: u32,
}

/// A simulated host in the peer-to-peer network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: NodeId,
    pub label: String,
    pub size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_fee_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_profile: Option<ResourceProfile>,
    /// Opaque bitcoin.conf key/value overrides
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bitcoin_conf_overrides: BTreeMap<String, String>,
    pub position: Position,
}

impl NetworkNode {
    /// Create a node with only an id and a label set
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            size: DEFAULT_NODE_SIZE,
            version: None,
            latency_profile: None,
            base_fee_rate: None,
            resource_profile: None,
            bitcoin_conf_overrides: BTreeMap::new(),
            position: Position::default(),
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// A directed peer link
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub source: NodeId,
    pub target: NodeId,
}

impl NetworkEdge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Returns true if this edge touches the given node on either end
    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }
}

/// Where a topology came from. Drives layout policy and asset loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyKind {
    /// Built by the user, starting from scratch or from a generator
    Custom,
    /// Decoded from a named GraphML asset; positions carry external meaning
    Prebuilt { asset: String },
}

impl TopologyKind {
    /// Returns true if this is a prebuilt topology
    pub fn is_prebuilt(&self) -> bool {
        matches!(self, Self::Prebuilt { .. })
    }

    /// Returns the asset name if this is a prebuilt topology
    pub fn asset(&self) -> Option<&str> {
        match self {
            Self::Prebuilt { asset } => Some(asset),
            Self::Custom => None,
        }
    }
}

/// A complete node/edge description of a simulated network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkTopology {
    pub id: u32,
    pub name: String,
    #[serde(flatten)]
    pub kind: TopologyKind,
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

impl NetworkTopology {
    /// Create an empty topology
    pub fn new(id: u32, name: impl Into<String>, kind: TopologyKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&NetworkNode> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut NetworkNode> {
        self.nodes.iter_mut().find(|node| &node.id == id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn contains_edge(&self, source: &NodeId, target: &NodeId) -> bool {
        self.edges
            .iter()
            .any(|edge| &edge.source == source && &edge.target == target)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_numeric() {
        assert_eq!(NodeId::from("42").numeric(), Some(42));
        assert_eq!(NodeId::from("n42").numeric(), None);
        assert_eq!(NodeId::from("-1").numeric(), None);
    }

    #[test]
    fn test_kind_serializes_as_tag() {
        let topology = NetworkTopology::new(
            1,
            "wheel",
            TopologyKind::Prebuilt { asset: "wheel".to_string() },
        );
        let json = serde_json::to_value(&topology).unwrap();
        assert_eq!(json["kind"], "prebuilt");
        assert_eq!(json["asset"], "wheel");

        let back: NetworkTopology = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind.asset(), Some("wheel"));
    }

    #[test]
    fn test_edge_touches() {
        let edge = NetworkEdge::new("a", "b");
        assert!(edge.touches(&NodeId::from("a")));
        assert!(edge.touches(&NodeId::from("b")));
        assert!(!edge.touches(&NodeId::from("c")));
    }
}
