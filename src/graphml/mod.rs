//! GraphML codec.
//!
//! Encodes topologies into the GraphML subset consumed by the simulation
//! runtime and decodes both exported documents and hand-written preset
//! assets back into nodes and edges.

pub mod assets;
pub mod decode;
pub mod encode;
pub mod keys;

use serde::Serialize;

use crate::topology::{NetworkEdge, NetworkNode, NetworkTopology, TopologyKind};

pub use assets::{LoadTicket, PresetLoader};
pub use decode::{decode, decode_file, decode_str};
pub use encode::{encode, ExportArtifact, EXPORT_FILE_NAME};
pub use keys::{KeyDecl, NodeAttribute, NODE_KEYS};

/// Errors raised while reading a GraphML document
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed GraphML: {0}")]
    Malformed(String),
    #[error("document ended with {0} unclosed element(s)")]
    Truncated(usize),
    #[error("<{element}> is missing the '{attribute}' attribute")]
    MissingAttribute { element: &'static str, attribute: &'static str },
}

/// Nodes and edges read from a document, before they are seeded into a
/// `GraphState`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartialTopology {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

impl PartialTopology {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Wrap into a full topology
    pub fn into_topology(self, id: u32, name: impl Into<String>, kind: TopologyKind) -> NetworkTopology {
        let mut topology = NetworkTopology::new(id, name, kind);
        topology.nodes = self.nodes;
        topology.edges = self.edges;
        topology
    }
}

impl From<NetworkTopology> for PartialTopology {
    fn from(topology: NetworkTopology) -> Self {
        Self {
            nodes: topology.nodes,
            edges: topology.edges,
        }
    }
}
