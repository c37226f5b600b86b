//! Editing session controller.
//!
//! [`EditorSession`] is the single owner of the wizard step, the graph
//! state, the running force simulation and outstanding preset loads. The
//! hosting UI drives it one user action at a time.

use log::{debug, info, warn};
use serde::Serialize;
use std::path::Path;

use crate::config::EditorConfig;
use crate::graphml::{ExportArtifact, LoadTicket, PartialTopology, PresetLoader};
use crate::layout::{self, initial_strategy, ForceSimulation, LayoutStrategy};
use crate::topology::generate;
use crate::topology::{GraphState, NetworkNode, NetworkTopology, NodeId, NodePatch, Position};

/// Where the user is in the create/load flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WizardStep {
    /// Pick between a preset and an empty canvas
    ChooseStart,
    /// Browse the preset list
    SelectPreset,
    /// Inspect a decoded preset before opening it
    PresetInfo,
    /// Edit the topology
    EditGraph,
}

pub struct EditorSession {
    config: EditorConfig,
    state: GraphState,
    step: WizardStep,
    simulation: Option<ForceSimulation>,
    presets: PresetLoader,
    pending: Option<LoadTicket>,
    preview: Option<NetworkTopology>,
}

impl EditorSession {
    pub fn new(config: EditorConfig, asset_root: &Path) -> Self {
        let state = GraphState::new(config.node_options.clone(), config.canvas.clone());
        let presets = PresetLoader::new(asset_root, &config.assets);
        Self {
            config,
            state,
            step: WizardStep::ChooseStart,
            simulation: None,
            presets,
            pending: None,
            preview: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn state(&self) -> &GraphState {
        &self.state
    }

    pub fn topology(&self) -> &NetworkTopology {
        self.state.topology()
    }

    pub fn presets(&self) -> &PresetLoader {
        &self.presets
    }

    /// Decoded preset shown on the info step
    pub fn preview(&self) -> Option<&NetworkTopology> {
        self.preview.as_ref()
    }

    pub fn simulation(&self) -> Option<&ForceSimulation> {
        self.simulation.as_ref()
    }

    pub fn is_simulating(&self) -> bool {
        self.simulation.as_ref().is_some_and(ForceSimulation::is_running)
    }

    fn transition(&mut self, from: WizardStep, to: WizardStep) -> bool {
        if self.step != from {
            debug!("Ignoring {:?} -> {:?} while at {:?}", from, to, self.step);
            return false;
        }
        debug!("Wizard step {:?} -> {:?}", from, to);
        self.step = to;
        true
    }

    /// Start from a single seed node
    pub fn start_from_scratch(&mut self) -> bool {
        if !self.transition(WizardStep::ChooseStart, WizardStep::EditGraph) {
            return false;
        }
        let topology = generate::from_scratch(&self.config.canvas);
        self.open(topology, false);
        true
    }

    /// Open an existing custom topology, e.g. a generated graph
    pub fn open_custom(&mut self, topology: NetworkTopology) -> bool {
        if !self.transition(WizardStep::ChooseStart, WizardStep::EditGraph) {
            return false;
        }
        self.open(topology, false);
        true
    }

    /// Open a custom topology whose stored positions should be kept as is
    pub fn open_saved(&mut self, topology: NetworkTopology) -> bool {
        if !self.transition(WizardStep::ChooseStart, WizardStep::EditGraph) {
            return false;
        }
        self.open(topology, true);
        true
    }

    pub fn browse_presets(&mut self) -> bool {
        self.transition(WizardStep::ChooseStart, WizardStep::SelectPreset)
    }

    /// Issue a load for a preset, superseding any earlier request
    pub fn request_preset(&mut self, name: &str) -> Option<LoadTicket> {
        if self.step != WizardStep::SelectPreset {
            debug!("Preset request for '{}' ignored at {:?}", name, self.step);
            return None;
        }
        let ticket = self.presets.request(name);
        self.pending = Some(ticket.clone());
        Some(ticket)
    }

    /// Finish a preset load. Stale or empty results leave the session as is.
    pub fn complete_preset(&mut self, ticket: &LoadTicket, partial: PartialTopology) -> bool {
        if self.step != WizardStep::SelectPreset {
            return false;
        }
        match self.presets.complete(ticket, partial) {
            Some(topology) => {
                self.pending = None;
                self.preview = Some(topology);
                self.transition(WizardStep::SelectPreset, WizardStep::PresetInfo)
            }
            None => false,
        }
    }

    /// Request, fetch and complete a preset in one step
    pub fn load_preset(&mut self, name: &str) -> bool {
        match self.request_preset(name) {
            Some(ticket) => {
                let partial = ticket.fetch();
                self.complete_preset(&ticket, partial)
            }
            None => false,
        }
    }

    /// Open the previewed preset for editing
    pub fn confirm_preset(&mut self) -> bool {
        if self.step != WizardStep::PresetInfo {
            return false;
        }
        let Some(topology) = self.preview.take() else {
            return false;
        };
        self.transition(WizardStep::PresetInfo, WizardStep::EditGraph);
        self.open(topology, false);
        true
    }

    /// Step back, discarding whatever the current step holds
    pub fn back(&mut self) -> WizardStep {
        let previous = match self.step {
            WizardStep::ChooseStart => WizardStep::ChooseStart,
            WizardStep::SelectPreset => {
                self.presets.cancel();
                self.pending = None;
                WizardStep::ChooseStart
            }
            WizardStep::PresetInfo => {
                self.preview = None;
                WizardStep::SelectPreset
            }
            WizardStep::EditGraph => {
                self.teardown();
                self.state = GraphState::new(self.config.node_options.clone(), self.config.canvas.clone());
                WizardStep::ChooseStart
            }
        };
        self.step = previous;
        previous
    }

    /// Seed the state and run the initial layout policy
    ///
    /// A ranked arrangement is left at rest so it stays readable. The
    /// simulation wakes on the first drag or structural edit.
    fn open(&mut self, topology: NetworkTopology, already_laid_out: bool) {
        self.teardown();
        let kind = topology.kind.clone();
        let has_edges = !topology.edges.is_empty();
        self.state.seed(topology);

        match initial_strategy(&kind, has_edges, already_laid_out) {
            Some(LayoutStrategy::Hierarchical) => {
                self.apply_layout(LayoutStrategy::Hierarchical);
                self.start_simulation();
                if let Some(simulation) = self.simulation.as_mut() {
                    simulation.rest();
                }
            }
            Some(LayoutStrategy::Force) => self.start_simulation(),
            None => {}
        }
        info!(
            "Opened '{}' with {} nodes and {} edges",
            self.state.topology().name,
            self.state.nodes().len(),
            self.state.edges().len()
        );
    }

    fn start_simulation(&mut self) {
        if self.state.topology().kind.is_prebuilt() {
            return;
        }
        self.simulation = Some(ForceSimulation::new(
            self.state.topology(),
            self.state.revision(),
            &self.config.layout.force,
            &self.config.canvas,
        ));
    }

    /// Rebuild the simulation after the node or edge set changed
    fn on_structure_changed(&mut self, revision_before: u64) {
        if self.state.revision() != revision_before && self.simulation.is_some() {
            self.start_simulation();
        }
    }

    /// Stop any running simulation, e.g. when the view goes away
    pub fn teardown(&mut self) {
        if let Some(mut simulation) = self.simulation.take() {
            simulation.stop();
        }
    }

    /// Advance the simulation one tick and apply the frame
    pub fn tick(&mut self) -> bool {
        let Some(simulation) = self.simulation.as_mut() else {
            return false;
        };
        match simulation.tick() {
            Some(frame) => self.state.apply_frame(&frame),
            None => false,
        }
    }

    /// Run a one-shot layout over the current topology
    pub fn apply_layout(&mut self, strategy: LayoutStrategy) -> bool {
        match layout::layout(self.state.topology(), strategy, &self.config.layout, &self.config.canvas) {
            Ok(positions) => {
                self.state.apply_positions(&positions);
                true
            }
            Err(e) => {
                warn!("Layout not applied: {}", e);
                false
            }
        }
    }

    pub fn drag_start(&mut self, id: &NodeId) -> bool {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.drag_start(id);
        }
        self.state.node(id).is_some()
    }

    /// Move a dragged node; user input wins over the simulation
    pub fn drag_to(&mut self, id: &NodeId, position: Position) -> bool {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.drag_to(id, position);
        }
        self.state.move_node(id, position)
    }

    pub fn drag_end(&mut self, id: &NodeId) -> bool {
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.drag_end(id);
        }
        self.state.node(id).is_some()
    }

    pub fn add_node(&mut self, template: Option<NetworkNode>) -> &NetworkTopology {
        let before = self.state.revision();
        self.state.add_node(template);
        self.on_structure_changed(before);
        self.state.topology()
    }

    pub fn edit_node(&mut self, id: &NodeId, patch: &NodePatch) -> &NetworkTopology {
        self.state.edit_node(id, patch)
    }

    pub fn duplicate_node(&mut self, id: &NodeId) -> &NetworkTopology {
        let before = self.state.revision();
        self.state.duplicate_node(id);
        self.on_structure_changed(before);
        self.state.topology()
    }

    pub fn delete_node(&mut self, id: &NodeId) -> &NetworkTopology {
        let before = self.state.revision();
        self.state.delete_node(id);
        self.on_structure_changed(before);
        self.state.topology()
    }

    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> &NetworkTopology {
        let before = self.state.revision();
        self.state.connect(source, target);
        self.on_structure_changed(before);
        self.state.topology()
    }

    pub fn disconnect(&mut self, source: &NodeId, target: &NodeId) -> &NetworkTopology {
        let before = self.state.revision();
        self.state.disconnect(source, target);
        self.on_structure_changed(before);
        self.state.topology()
    }

    /// Encode the current topology as a `graph.graphml` download
    pub fn export(&self) -> ExportArtifact {
        ExportArtifact::from_topology(self.state.topology())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphml::encode;
    use crate::topology::{NetworkEdge, TopologyKind};
    use tempfile::TempDir;

    const MAX_TICKS: usize = 10_000;

    fn assets() -> TempDir {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("graphml")).unwrap();
        let mut topology = NetworkTopology::new(0, "trio", TopologyKind::Custom);
        for (i, x) in [100.0, 200.0, 300.0].iter().enumerate() {
            topology.nodes.push(NetworkNode::new(i.to_string(), format!("n{}", i)).with_position(*x, 50.0));
        }
        topology.edges.push(NetworkEdge::new("0", "1"));
        std::fs::write(root.path().join("graphml/trio.graphml"), encode(&topology)).unwrap();
        root
    }

    fn session(root: &TempDir) -> EditorSession {
        EditorSession::new(EditorConfig::default(), root.path())
    }

    #[test]
    fn test_scratch_flow() {
        let root = assets();
        let mut session = session(&root);
        assert!(session.start_from_scratch());
        assert_eq!(session.step(), WizardStep::EditGraph);
        assert_eq!(session.topology().nodes.len(), 1);
        assert!(session.is_simulating());

        // Scratch is only reachable from the first step
        assert!(!session.start_from_scratch());
    }

    #[test]
    fn test_preset_flow_keeps_asset_positions() {
        let root = assets();
        let mut session = session(&root);
        assert!(session.browse_presets());
        assert!(session.load_preset("trio"));
        assert_eq!(session.step(), WizardStep::PresetInfo);
        assert_eq!(session.preview().map(|t| t.nodes.len()), Some(3));

        assert!(session.confirm_preset());
        assert_eq!(session.step(), WizardStep::EditGraph);
        assert!(session.topology().kind.is_prebuilt());
        assert!(session.simulation().is_none());
        assert_eq!(session.topology().nodes[2].position, Position::new(300.0, 50.0));
    }

    #[test]
    fn test_missing_preset_stays_on_selection() {
        let root = assets();
        let mut session = session(&root);
        session.browse_presets();
        assert!(!session.load_preset("nope"));
        assert_eq!(session.step(), WizardStep::SelectPreset);
        assert!(session.topology().nodes.is_empty());
    }

    #[test]
    fn test_superseded_preset_load() {
        let root = assets();
        let mut session = session(&root);
        session.browse_presets();
        let first = session.request_preset("trio").unwrap();
        let second = session.request_preset("trio").unwrap();
        assert!(!session.complete_preset(&first, first.fetch()));
        assert!(session.complete_preset(&second, second.fetch()));
    }

    fn positions(session: &EditorSession) -> Vec<Position> {
        session.topology().nodes.iter().map(|n| n.position).collect()
    }

    #[test]
    fn test_ranked_layout_survives_ticking() {
        let root = assets();
        let mut session = session(&root);
        let topology = generate::from_template(generate::TopologyTemplate::Dag, 4, "26.0");
        assert!(session.open_custom(topology));

        let ranked = positions(&session);
        let config = EditorConfig::default();
        let expected =
            layout::layout(session.topology(), LayoutStrategy::Hierarchical, &config.layout, &config.canvas).unwrap();
        assert_eq!(ranked, expected.iter().map(|(_, p)| *p).collect::<Vec<_>>());
        assert!(!session.is_simulating());

        let mut ticks = 0;
        while session.tick() && ticks < MAX_TICKS {
            ticks += 1;
        }
        assert_eq!(positions(&session), ranked);
    }

    #[test]
    fn test_drag_wakes_resting_ranked_layout() {
        let root = assets();
        let mut session = session(&root);
        session.open_custom(generate::from_template(generate::TopologyTemplate::Dag, 4, "26.0"));
        let id = session.topology().nodes[0].id.clone();

        assert!(session.drag_start(&id));
        assert!(session.is_simulating());
        assert!(session.drag_end(&id));
    }

    #[test]
    fn test_saved_positions_are_kept() {
        let root = assets();
        let mut session = session(&root);
        let mut topology = generate::from_template(generate::TopologyTemplate::Ring, 4, "26.0");
        for (i, node) in topology.nodes.iter_mut().enumerate() {
            node.position = Position::new(i as f64 * 7.0, 3.0);
        }
        let saved: Vec<Position> = topology.nodes.iter().map(|n| n.position).collect();

        assert!(session.open_saved(topology));
        assert_eq!(positions(&session), saved);
        assert!(session.simulation().is_none());
    }

    #[test]
    fn test_stale_frames_are_discarded_after_edit() {
        let root = assets();
        let mut session = session(&root);
        session.start_from_scratch();
        let seed = session.topology().nodes[0].id.clone();

        session.add_node(None);
        let added = session.state().selected().cloned().unwrap();
        session.connect(&seed, &added);

        let simulation = session.simulation().unwrap();
        assert_eq!(simulation.revision(), session.state().revision());
        assert!(session.tick());
    }

    #[test]
    fn test_drag_wins_over_simulation() {
        let root = assets();
        let mut session = session(&root);
        session.start_from_scratch();
        session.add_node(None);
        let id = session.state().selected().cloned().unwrap();
        let drop = Position::new(10.0, 20.0);

        assert!(session.drag_start(&id));
        assert!(session.drag_to(&id, drop));
        session.tick();
        assert_eq!(session.state().node(&id).unwrap().position, drop);
        assert!(session.drag_end(&id));
    }

    #[test]
    fn test_back_discards_graph() {
        let root = assets();
        let mut session = session(&root);
        session.start_from_scratch();
        assert_eq!(session.back(), WizardStep::ChooseStart);
        assert!(session.topology().nodes.is_empty());
        assert!(session.simulation().is_none());
    }

    #[test]
    fn test_export() {
        let root = assets();
        let mut session = session(&root);
        session.start_from_scratch();
        let artifact = session.export();
        assert_eq!(artifact.file_name, "graph.graphml");
        assert!(String::from_utf8(artifact.bytes).unwrap().contains("<data key=\"bitcoin_conf\"></data>"));
    }
}
