//! Force-directed simulation.
//!
//! Each tick applies three forces and integrates velocities:
//! - springs along every edge toward `link_distance`
//! - pairwise charge between all node pairs (negative strength repels)
//! - a weak pull toward the canvas midpoint
//!
//! The force contribution is scaled by `alpha`, which cools toward
//! `alpha_target` by `alpha_decay` every tick. The simulation stops once
//! alpha falls below `alpha_min`. A dragged node is pinned: forces never
//! move it and its position always comes from the drag.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use crate::config::{CanvasConfig, ForceConfig};
use crate::topology::{NetworkTopology, NodeId, Position};

/// Minimum squared distance used by the charge force
const MIN_DISTANCE_SQUARED: f64 = 1.0;

/// Positions produced by one tick, tagged with the graph revision the
/// simulation was built from
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutFrame {
    pub revision: u64,
    pub alpha: f64,
    pub positions: Vec<(NodeId, Position)>,
}

#[derive(Debug, Clone)]
struct Body {
    id: NodeId,
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    pinned: Option<Position>,
}

#[derive(Debug, Clone, Copy)]
struct Link {
    source: usize,
    target: usize,
    strength: f64,
    bias: f64,
}

/// A running force layout over a snapshot of one topology
#[derive(Debug, Clone)]
pub struct ForceSimulation {
    config: ForceConfig,
    center: Position,
    bodies: Vec<Body>,
    index: HashMap<NodeId, usize>,
    links: Vec<Link>,
    alpha: f64,
    alpha_target: f64,
    revision: u64,
    running: bool,
    ticks: u64,
    rng: StdRng,
}

impl ForceSimulation {
    /// Build a simulation from the current node positions
    ///
    /// Nodes sharing a position with an earlier node are spread on a small
    /// spiral around it so the charge force has a direction to work with.
    pub fn new(topology: &NetworkTopology, revision: u64, config: &ForceConfig, canvas: &CanvasConfig) -> Self {
        let (cx, cy) = canvas.center();
        let mut bodies: Vec<Body> = Vec::with_capacity(topology.nodes.len());
        let mut index = HashMap::with_capacity(topology.nodes.len());

        for (i, node) in topology.nodes.iter().enumerate() {
            let mut position = node.position;
            if bodies.iter().any(|b| b.x == position.x && b.y == position.y) {
                // Phyllotaxis offset
                let radius = 10.0 * (0.5 + i as f64).sqrt();
                let angle = i as f64 * std::f64::consts::PI * (3.0 - 5f64.sqrt());
                position = Position::new(position.x + radius * angle.cos(), position.y + radius * angle.sin());
            }
            index.insert(node.id.clone(), i);
            bodies.push(Body {
                id: node.id.clone(),
                x: position.x,
                y: position.y,
                vx: 0.0,
                vy: 0.0,
                pinned: None,
            });
        }

        let pairs: Vec<(usize, usize)> = topology
            .edges
            .iter()
            .filter_map(|edge| Some((*index.get(&edge.source)?, *index.get(&edge.target)?)))
            .filter(|(source, target)| source != target)
            .collect();

        let mut degree = vec![0usize; bodies.len()];
        for &(source, target) in &pairs {
            degree[source] += 1;
            degree[target] += 1;
        }
        let links = pairs
            .into_iter()
            .map(|(source, target)| Link {
                source,
                target,
                strength: 1.0 / degree[source].min(degree[target]) as f64,
                bias: degree[source] as f64 / (degree[source] + degree[target]) as f64,
            })
            .collect();

        debug!(
            "Force simulation over {} nodes at revision {}",
            bodies.len(),
            revision
        );

        Self {
            config: config.clone(),
            center: Position::new(cx, cy),
            bodies,
            index,
            links,
            alpha: 1.0,
            alpha_target: 0.0,
            revision,
            running: true,
            ticks: 0,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Halt the simulation. Further ticks produce nothing.
    pub fn stop(&mut self) {
        if self.running {
            debug!("Force simulation stopped after {} ticks", self.ticks);
        }
        self.running = false;
    }

    /// Halt with no energy left, keeping current positions. Only a drag or
    /// an explicit reheat starts it again.
    pub fn rest(&mut self) {
        self.stop();
        self.alpha = 0.0;
        self.alpha_target = 0.0;
    }

    /// Resume with at least `alpha` energy
    pub fn reheat(&mut self, alpha: f64) {
        self.alpha = self.alpha.max(alpha);
        self.running = true;
    }

    /// Current positions, in node order
    pub fn positions(&self) -> Vec<(NodeId, Position)> {
        self.bodies
            .iter()
            .map(|body| (body.id.clone(), Position::new(body.x, body.y)))
            .collect()
    }

    fn frame(&self) -> LayoutFrame {
        LayoutFrame {
            revision: self.revision,
            alpha: self.alpha,
            positions: self.positions(),
        }
    }

    /// Pin a node where it is and keep the simulation warm while it is held
    pub fn drag_start(&mut self, id: &NodeId) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        let body = &mut self.bodies[i];
        body.pinned = Some(Position::new(body.x, body.y));
        self.alpha_target = self.config.drag_alpha_target;
        self.reheat(self.config.drag_alpha_target);
        true
    }

    /// Move a pinned node. The drag position wins over any force.
    pub fn drag_to(&mut self, id: &NodeId, position: Position) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        let body = &mut self.bodies[i];
        body.pinned = Some(position);
        body.x = position.x;
        body.y = position.y;
        body.vx = 0.0;
        body.vy = 0.0;
        true
    }

    /// Release a node from its drop position and let the system cool down
    pub fn drag_end(&mut self, id: &NodeId) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.bodies[i].pinned = None;
        if self.bodies.iter().all(|body| body.pinned.is_none()) {
            self.alpha_target = 0.0;
        }
        true
    }

    /// Small random offset for exactly coincident nodes
    fn jiggle(&mut self) -> f64 {
        (self.rng.gen::<f64>() - 0.5) * 1e-6
    }

    fn apply_links(&mut self) {
        let alpha = self.alpha;
        let distance = self.config.link_distance;
        for i in 0..self.links.len() {
            let link = self.links[i];
            let (s, t) = (&self.bodies[link.source], &self.bodies[link.target]);
            let mut dx = t.x + t.vx - s.x - s.vx;
            let mut dy = t.y + t.vy - s.y - s.vy;
            if dx == 0.0 {
                dx = self.jiggle();
            }
            if dy == 0.0 {
                dy = self.jiggle();
            }
            let length = (dx * dx + dy * dy).sqrt();
            let factor = (length - distance) / length * alpha * link.strength;
            let (fx, fy) = (dx * factor, dy * factor);

            let target = &mut self.bodies[link.target];
            target.vx -= fx * link.bias;
            target.vy -= fy * link.bias;
            let source = &mut self.bodies[link.source];
            source.vx += fx * (1.0 - link.bias);
            source.vy += fy * (1.0 - link.bias);
        }
    }

    fn apply_charge(&mut self) {
        let strength = self.config.charge_strength * self.alpha;
        let count = self.bodies.len();
        for i in 0..count {
            for j in 0..count {
                if i == j {
                    continue;
                }
                let mut dx = self.bodies[j].x - self.bodies[i].x;
                let mut dy = self.bodies[j].y - self.bodies[i].y;
                if dx == 0.0 {
                    dx = self.jiggle();
                }
                if dy == 0.0 {
                    dy = self.jiggle();
                }
                let mut distance_squared = dx * dx + dy * dy;
                if distance_squared < MIN_DISTANCE_SQUARED {
                    distance_squared = (MIN_DISTANCE_SQUARED * distance_squared).sqrt();
                }
                let weight = strength / distance_squared;
                let body = &mut self.bodies[i];
                body.vx += dx * weight;
                body.vy += dy * weight;
            }
        }
    }

    fn apply_center(&mut self) {
        let strength = self.config.center_strength * self.alpha;
        for body in &mut self.bodies {
            body.vx += (self.center.x - body.x) * strength;
            body.vy += (self.center.y - body.y) * strength;
        }
    }

    /// Advance one tick
    ///
    /// Returns `None` once the simulation has stopped or settled.
    pub fn tick(&mut self) -> Option<LayoutFrame> {
        if !self.running {
            return None;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.apply_links();
        self.apply_charge();
        self.apply_center();

        let retain = 1.0 - self.config.velocity_decay;
        for body in &mut self.bodies {
            match body.pinned {
                Some(pin) => {
                    body.x = pin.x;
                    body.y = pin.y;
                    body.vx = 0.0;
                    body.vy = 0.0;
                }
                None => {
                    body.vx *= retain;
                    body.vy *= retain;
                    body.x += body.vx;
                    body.y += body.vy;
                }
            }
        }
        self.ticks += 1;

        if self.alpha < self.config.alpha_min {
            debug!("Force simulation settled after {} ticks", self.ticks);
            self.running = false;
        }
        Some(self.frame())
    }

    /// Tick until settled or `max_ticks` have run, returning the last frame
    pub fn run_until_settled(&mut self, max_ticks: usize) -> Option<LayoutFrame> {
        let mut last = None;
        for _ in 0..max_ticks {
            match self.tick() {
                Some(frame) => last = Some(frame),
                None => break,
            }
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{NetworkEdge, NetworkNode, TopologyKind};

    fn chain(count: usize) -> NetworkTopology {
        let mut topology = NetworkTopology::new(0, "chain", TopologyKind::Custom);
        for i in 0..count {
            topology.nodes.push(NetworkNode::new(i.to_string(), format!("node {}", i)).with_position(325.0, 325.0));
        }
        for i in 1..count {
            topology.edges.push(NetworkEdge::new((i - 1).to_string(), i.to_string()));
        }
        topology
    }

    fn simulation(topology: &NetworkTopology) -> ForceSimulation {
        ForceSimulation::new(topology, 0, &ForceConfig::default(), &CanvasConfig::default())
    }

    #[test]
    fn test_coincident_nodes_are_separated() {
        let sim = simulation(&chain(5));
        let positions = sim.positions();
        for (i, (_, a)) in positions.iter().enumerate() {
            for (_, b) in positions.iter().skip(i + 1) {
                assert!(a.distance_to(b) > 0.0);
            }
        }
    }

    #[test]
    fn test_settles_and_stops_ticking() {
        let mut sim = simulation(&chain(6));
        let frame = sim.run_until_settled(10_000).unwrap();
        assert!(!sim.is_running());
        assert!(frame.alpha < ForceConfig::default().alpha_min);
        assert_eq!(frame.positions.len(), 6);
        assert!(sim.tick().is_none());
        assert!(frame.positions.iter().all(|(_, p)| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_springs_pull_toward_link_distance() {
        let mut topology = chain(2);
        topology.nodes[0].position = Position::new(0.0, 325.0);
        topology.nodes[1].position = Position::new(650.0, 325.0);
        let mut sim = simulation(&topology);
        let frame = sim.run_until_settled(10_000).unwrap();
        let distance = frame.positions[0].1.distance_to(&frame.positions[1].1);
        assert!(distance < 650.0);
    }

    #[test]
    fn test_stop_before_first_tick() {
        let mut sim = simulation(&chain(3));
        sim.stop();
        assert!(sim.tick().is_none());
        assert_eq!(sim.ticks(), 0);
    }

    #[test]
    fn test_resting_simulation_keeps_positions_until_dragged() {
        let mut sim = simulation(&chain(4));
        let before = sim.positions();
        sim.rest();
        assert!(sim.tick().is_none());
        assert_eq!(sim.alpha(), 0.0);
        assert_eq!(sim.positions(), before);

        assert!(sim.drag_start(&NodeId::from("0")));
        assert!(sim.is_running());
        assert_eq!(sim.alpha(), ForceConfig::default().drag_alpha_target);
    }

    #[test]
    fn test_dragged_node_is_pinned() {
        let mut sim = simulation(&chain(4));
        let id = NodeId::from("1");
        let drop = Position::new(42.0, 24.0);

        assert!(sim.drag_start(&id));
        assert!(sim.drag_to(&id, drop));
        for _ in 0..20 {
            let frame = sim.tick().unwrap();
            assert_eq!(frame.positions[1].1, drop);
        }
        // Held drags keep the simulation warm
        assert!(sim.is_running());

        assert!(sim.drag_end(&id));
        sim.run_until_settled(10_000);
        assert!(!sim.is_running());
        assert!(!sim.drag_start(&NodeId::from("missing")));
    }
}
