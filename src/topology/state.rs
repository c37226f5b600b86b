//! Authoritative in-memory topology store.
//!
//! All editing goes through [`GraphState`]. Every public mutation keeps the
//! structural invariants intact (edges reference live nodes, no self-loops,
//! no duplicate edges, ids never reused) and turns invalid input into a
//! logged no-op. The `try_*` variants expose the reason to callers that
//! want it.

use std::collections::HashSet;

use log::{debug, info, warn};

use crate::config::{CanvasConfig, NodeOptions};
use crate::layout::LayoutFrame;

use super::patch::NodePatch;
use super::types::{NetworkEdge, NetworkNode, NetworkTopology, NodeId, Position, TopologyKind};

/// Why an edit was refused. Never surfaced as a failure to the UI.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("self-loop on node {0} is not allowed")]
    SelfLoop(NodeId),
    #[error("edge {0} -> {1} already exists")]
    DuplicateEdge(NodeId, NodeId),
    #[error("edge {0} -> {1} does not exist")]
    MissingEdge(NodeId, NodeId),
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("invalid value '{value}' for field '{field}'")]
    InvalidValue { field: String, value: String },
}

/// Topology plus the editing state around it
#[derive(Debug, Clone)]
pub struct GraphState {
    topology: NetworkTopology,
    options: NodeOptions,
    canvas: CanvasConfig,
    /// Next numeric candidate, `None` once the numeric range is used up
    next_id: Option<u64>,
    /// Counter for `n<k>` ids handed out after the numeric range
    spilled: u64,
    /// Ids deleted during this session
    retired: HashSet<NodeId>,
    selected: Option<NodeId>,
    /// Bumped on every change to the node or edge set
    revision: u64,
}

impl GraphState {
    /// Create an empty custom topology
    pub fn new(options: NodeOptions, canvas: CanvasConfig) -> Self {
        Self {
            topology: NetworkTopology::new(0, "Untitled", TopologyKind::Custom),
            options,
            canvas,
            next_id: Some(0),
            spilled: 0,
            retired: HashSet::new(),
            selected: None,
            revision: 0,
        }
    }

    /// Create a state seeded with an existing topology
    pub fn with_topology(topology: NetworkTopology, options: NodeOptions, canvas: CanvasConfig) -> Self {
        let mut state = Self::new(options, canvas);
        state.seed(topology);
        state
    }

    /// Replace the current topology
    ///
    /// Duplicate node ids and edges violating the invariants are dropped with
    /// a warning. Id allocation restarts above the largest numeric id seen,
    /// or switches to `n<k>` ids when that id is `u64::MAX`.
    pub fn seed(&mut self, topology: NetworkTopology) {
        let NetworkTopology { id, name, kind, nodes, edges } = topology;

        let mut clean = NetworkTopology::new(id, name, kind);
        for node in nodes {
            if clean.contains_node(&node.id) {
                warn!("Dropping duplicate node id {} while seeding '{}'", node.id, clean.name);
                continue;
            }
            clean.nodes.push(node);
        }

        let mut dropped = 0usize;
        for edge in edges {
            let valid = edge.source != edge.target
                && clean.contains_node(&edge.source)
                && clean.contains_node(&edge.target)
                && !clean.contains_edge(&edge.source, &edge.target);
            if valid {
                clean.edges.push(edge);
            } else {
                debug!("Dropping invalid edge {} -> {}", edge.source, edge.target);
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!("Dropped {} invalid edge(s) while seeding '{}'", dropped, clean.name);
        }

        self.next_id = clean
            .nodes
            .iter()
            .filter_map(|node| node.id.numeric())
            .max()
            .map_or(Some(0), |max| max.checked_add(1));
        self.spilled = 0;
        self.retired.clear();
        self.selected = None;
        self.topology = clean;
        self.bump();

        info!(
            "Seeded topology '{}' with {} nodes and {} edges",
            self.topology.name,
            self.topology.nodes.len(),
            self.topology.edges.len()
        );
    }

    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    pub fn into_topology(self) -> NetworkTopology {
        self.topology
    }

    pub fn nodes(&self) -> &[NetworkNode] {
        &self.topology.nodes
    }

    pub fn edges(&self) -> &[NetworkEdge] {
        &self.topology.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&NetworkNode> {
        self.topology.node(id)
    }

    pub fn options(&self) -> &NodeOptions {
        &self.options
    }

    /// Node the caller should edit next, set by `add_node` and `duplicate_node`
    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    pub fn select(&mut self, id: &NodeId) -> bool {
        if self.topology.contains_node(id) {
            self.selected = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// Structural revision, changes whenever nodes or edges are added or removed
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn allocate_id(&mut self) -> NodeId {
        loop {
            let candidate = match self.next_id {
                Some(next) => {
                    self.next_id = next.checked_add(1);
                    NodeId::new(next.to_string())
                }
                None => {
                    self.spilled = self.spilled.saturating_add(1);
                    NodeId::new(format!("n{}", self.spilled))
                }
            };
            if !self.topology.contains_node(&candidate) && !self.retired.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn default_node(&self, id: NodeId) -> NetworkNode {
        let new_nodes = self
            .topology
            .nodes
            .iter()
            .filter(|node| node.label.contains("new node"))
            .count();
        let (x, y) = self.canvas.center();
        NetworkNode::new(id, format!("new node {}", new_nodes)).with_position(x, y)
    }

    /// Add a node, or a copy of `template` under a fresh id
    ///
    /// The new node becomes the selected node.
    pub fn add_node(&mut self, template: Option<NetworkNode>) -> &NetworkTopology {
        let id = self.allocate_id();
        let node = match template {
            Some(mut node) => {
                node.id = id.clone();
                if node.label.is_empty() {
                    node.label = self.default_node(id.clone()).label;
                }
                node
            }
            None => self.default_node(id.clone()),
        };

        debug!("Added node {} ('{}')", node.id, node.label);
        self.topology.nodes.push(node);
        self.selected = Some(id);
        self.bump();
        &self.topology
    }

    /// Validate and apply a patch to a node. Nothing is applied unless every
    /// entry is valid.
    pub fn try_edit_node(&mut self, id: &NodeId, patch: &NodePatch) -> Result<(), Rejection> {
        let edits = patch.resolve(&self.options)?;
        let current = self.topology.node(id).ok_or_else(|| Rejection::UnknownNode(id.clone()))?;

        let mut edited = current.clone();
        for edit in &edits {
            edit.apply(&mut edited, &self.options);
        }

        if let Some(slot) = self.topology.node_mut(id) {
            *slot = edited;
        }
        debug!("Edited node {} ({} field(s))", id, edits.len());
        Ok(())
    }

    pub fn edit_node(&mut self, id: &NodeId, patch: &NodePatch) -> &NetworkTopology {
        if let Err(rejection) = self.try_edit_node(id, patch) {
            debug!("Edit of node {} ignored: {}", id, rejection);
        }
        &self.topology
    }

    /// Copy a node under a fresh id with " duplicate" appended to its label.
    /// Links are never copied.
    pub fn try_duplicate_node(&mut self, id: &NodeId) -> Result<NodeId, Rejection> {
        let source = self.topology.node(id).ok_or_else(|| Rejection::UnknownNode(id.clone()))?;
        let mut copy = source.clone();
        copy.label = format!("{} duplicate", source.label);

        self.add_node(Some(copy));
        self.selected.clone().ok_or_else(|| Rejection::UnknownNode(id.clone()))
    }

    pub fn duplicate_node(&mut self, id: &NodeId) -> &NetworkTopology {
        if let Err(rejection) = self.try_duplicate_node(id) {
            debug!("Duplicate of node {} ignored: {}", id, rejection);
        }
        &self.topology
    }

    /// Remove a node and every edge touching it
    pub fn try_delete_node(&mut self, id: &NodeId) -> Result<(), Rejection> {
        let index = self
            .topology
            .nodes
            .iter()
            .position(|node| &node.id == id)
            .ok_or_else(|| Rejection::UnknownNode(id.clone()))?;

        self.topology.nodes.remove(index);
        let before = self.topology.edges.len();
        self.topology.edges.retain(|edge| !edge.touches(id));
        let cascaded = before - self.topology.edges.len();

        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        self.retired.insert(id.clone());
        self.bump();

        debug!("Deleted node {} and {} edge(s)", id, cascaded);
        Ok(())
    }

    pub fn delete_node(&mut self, id: &NodeId) -> &NetworkTopology {
        if let Err(rejection) = self.try_delete_node(id) {
            debug!("Delete ignored: {}", rejection);
        }
        &self.topology
    }

    /// Add the directed edge `source -> target`
    pub fn try_connect(&mut self, source: &NodeId, target: &NodeId) -> Result<(), Rejection> {
        if source == target {
            return Err(Rejection::SelfLoop(source.clone()));
        }
        for id in [source, target] {
            if !self.topology.contains_node(id) {
                return Err(Rejection::UnknownNode(id.clone()));
            }
        }
        if self.topology.contains_edge(source, target) {
            return Err(Rejection::DuplicateEdge(source.clone(), target.clone()));
        }

        self.topology.edges.push(NetworkEdge::new(source.clone(), target.clone()));
        self.bump();
        debug!("Connected {} -> {}", source, target);
        Ok(())
    }

    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> &NetworkTopology {
        if let Err(rejection) = self.try_connect(source, target) {
            debug!("Connect ignored: {}", rejection);
        }
        &self.topology
    }

    /// Remove the directed edge `source -> target`
    pub fn try_disconnect(&mut self, source: &NodeId, target: &NodeId) -> Result<(), Rejection> {
        let index = self
            .topology
            .edges
            .iter()
            .position(|edge| &edge.source == source && &edge.target == target)
            .ok_or_else(|| Rejection::MissingEdge(source.clone(), target.clone()))?;

        self.topology.edges.remove(index);
        self.bump();
        debug!("Disconnected {} -> {}", source, target);
        Ok(())
    }

    pub fn disconnect(&mut self, source: &NodeId, target: &NodeId) -> &NetworkTopology {
        if let Err(rejection) = self.try_disconnect(source, target) {
            debug!("Disconnect ignored: {}", rejection);
        }
        &self.topology
    }

    /// Move a node, e.g. at the end of a drag. Does not change the revision.
    pub fn move_node(&mut self, id: &NodeId, position: Position) -> bool {
        match self.topology.node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Apply computed positions. Ids that no longer exist are skipped.
    pub fn apply_positions<'a, I>(&mut self, positions: I) -> usize
    where
        I: IntoIterator<Item = &'a (NodeId, Position)>,
    {
        positions
            .into_iter()
            .filter(|(id, position)| self.move_node(id, *position))
            .count()
    }

    /// Apply positions computed against `revision`. Results computed against
    /// an older node/edge set are discarded.
    pub fn apply_positions_at(&mut self, revision: u64, positions: &[(NodeId, Position)]) -> bool {
        if revision != self.revision {
            debug!(
                "Discarding {} stale position(s) from revision {} (current {})",
                positions.len(),
                revision,
                self.revision
            );
            return false;
        }
        self.apply_positions(positions);
        true
    }

    /// Apply a simulation frame unless it was computed for an older revision
    pub fn apply_frame(&mut self, frame: &LayoutFrame) -> bool {
        self.apply_positions_at(frame.revision, &frame.positions)
    }
}
