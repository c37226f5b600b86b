//! Topology generators.
//!
//! Everything here produces `custom` topologies with node ids `0..n` and
//! zero positions; callers run the initial layout afterwards.

use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::CanvasConfig;

use super::types::{NetworkEdge, NetworkNode, NetworkTopology, NodeId, TopologyKind};

/// Connection templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TopologyTemplate {
    /// Star: every node connects to the first node (hub)
    Star,
    /// Mesh: every node connects to every other node
    Mesh,
    /// Ring: every node connects to its previous and next neighbour
    Ring,
    /// DAG: every node connects to all nodes created before it
    Dag,
}

/// The "start from scratch" topology: a single seed node at the canvas center
pub fn from_scratch(canvas: &CanvasConfig) -> NetworkTopology {
    let (x, y) = canvas.center();
    let mut topology = NetworkTopology::new(1, "Start from scratch", TopologyKind::Custom);
    topology.nodes.push(NetworkNode::new("0", "new node").with_position(x, y));
    topology
}

fn numbered_nodes(count: usize, version: &str, overrides: &BTreeMap<String, String>) -> Vec<NetworkNode> {
    (0..count)
        .map(|i| {
            let mut node = NetworkNode::new(i.to_string(), format!("node {}", i)).with_version(version);
            node.bitcoin_conf_overrides = overrides.clone();
            node
        })
        .collect()
}

fn link(topology: &mut NetworkTopology, source: usize, target: usize) -> bool {
    let (source, target) = (NodeId::new(source.to_string()), NodeId::new(target.to_string()));
    if source == target || topology.contains_edge(&source, &target) {
        return false;
    }
    topology.edges.push(NetworkEdge::new(source, target));
    true
}

/// Directed ring over `count` nodes plus up to `extra_outbounds` random
/// outbound links per node
///
/// Extra targets are drawn without replacement from nodes the source is not
/// already linked to, so a node never gains a duplicate or a self-loop.
pub fn cycle_with_outbounds<R: Rng + ?Sized>(
    count: usize,
    extra_outbounds: usize,
    version: &str,
    overrides: &BTreeMap<String, String>,
    rng: &mut R,
) -> NetworkTopology {
    let mut topology = NetworkTopology::new(0, format!("cycle_{}", count), TopologyKind::Custom);
    topology.nodes = numbered_nodes(count, version, overrides);

    // Ring: i -> i+1, closing last -> first
    if count > 1 {
        for i in 0..count {
            link(&mut topology, i, (i + 1) % count);
        }
    }

    for source in 0..count {
        let mut candidates: Vec<usize> = (0..count)
            .filter(|&target| {
                target != source
                    && !topology.contains_edge(&NodeId::new(source.to_string()), &NodeId::new(target.to_string()))
            })
            .collect();
        candidates.shuffle(rng);
        for target in candidates.into_iter().take(extra_outbounds) {
            link(&mut topology, source, target);
        }
    }

    info!(
        "Generated cycle graph with {} nodes and {} edges",
        topology.nodes.len(),
        topology.edges.len()
    );
    topology
}

/// Random graph where each ordered pair is linked with `probability`
///
/// Out-of-range probabilities are clamped and NaN links nothing.
pub fn erdos_renyi<R: Rng + ?Sized>(count: usize, probability: f64, version: &str, rng: &mut R) -> NetworkTopology {
    let probability = if probability.is_nan() { 0.0 } else { probability.clamp(0.0, 1.0) };
    let mut topology = NetworkTopology::new(0, format!("random_{}", count), TopologyKind::Custom);
    topology.nodes = numbered_nodes(count, version, &BTreeMap::new());

    for source in 0..count {
        for target in 0..count {
            if source != target && rng.gen_bool(probability) {
                link(&mut topology, source, target);
            }
        }
    }

    info!(
        "Generated random graph with {} nodes and {} edges (p={})",
        topology.nodes.len(),
        topology.edges.len(),
        probability
    );
    topology
}

/// Topology following a fixed connection template
pub fn from_template(template: TopologyTemplate, count: usize, version: &str) -> NetworkTopology {
    let name = format!("{:?}_{}", template, count).to_lowercase();
    let mut topology = NetworkTopology::new(0, name, TopologyKind::Custom);
    topology.nodes = numbered_nodes(count, version, &BTreeMap::new());

    match template {
        TopologyTemplate::Star => {
            for i in 1..count {
                link(&mut topology, i, 0);
            }
        }
        TopologyTemplate::Mesh => {
            for i in 0..count {
                for j in 0..count {
                    link(&mut topology, i, j);
                }
            }
        }
        TopologyTemplate::Ring => {
            if count > 1 {
                for i in 0..count {
                    let prev = if i == 0 { count - 1 } else { i - 1 };
                    let next = if i == count - 1 { 0 } else { i + 1 };
                    link(&mut topology, i, prev);
                    link(&mut topology, i, next);
                }
            }
        }
        TopologyTemplate::Dag => {
            for i in 0..count {
                for j in 0..i {
                    link(&mut topology, i, j);
                }
            }
        }
    }

    topology
}
