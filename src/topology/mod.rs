//! Network topology module.
//!
//! This module contains the topology data model, the editing store that
//! guards its invariants, peer lookups and topology generators.

pub mod generate;
pub mod patch;
pub mod peers;
pub mod state;
pub mod types;

// Re-export key types and functions for easier access
pub use generate::TopologyTemplate;
pub use patch::{FieldEdit, NodePatch, EDITABLE_FIELDS};
pub use peers::{degree_of, isolated_nodes, peers_of, NodeDegree};
pub use state::{GraphState, Rejection};
pub use types::{
    NetworkEdge, NetworkNode, NetworkTopology, NodeId, Position, ResourceProfile, TopologyKind, DEFAULT_NODE_SIZE,
};
