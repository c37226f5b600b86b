//! Ranked left-to-right layout.
//!
//! 1. Break cycles by reversing DFS back edges
//! 2. Rank every node by its longest path from a source
//! 3. Order nodes within a rank by barycenter sweeps
//! 4. Place ranks left to right and nodes top to bottom, centered on the canvas.
//!    Spacing shrinks when the drawing would be wider or taller than the canvas.
//!
//! The result is deterministic for a given node and edge order.

use std::collections::HashMap;

use crate::config::{CanvasConfig, HierarchicalConfig};
use crate::topology::{NetworkTopology, NodeId, Position};

const ORDERING_SWEEPS: usize = 4;

/// Compute positions for every node, in node order
pub fn hierarchical_layout(
    topology: &NetworkTopology,
    config: &HierarchicalConfig,
    canvas: &CanvasConfig,
) -> Vec<(NodeId, Position)> {
    let count = topology.nodes.len();
    let (cx, cy) = canvas.center();
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![(topology.nodes[0].id.clone(), Position::new(cx, cy))];
    }

    let index: HashMap<&NodeId, usize> = topology.nodes.iter().enumerate().map(|(i, node)| (&node.id, i)).collect();
    let edges: Vec<(usize, usize)> = topology
        .edges
        .iter()
        .filter_map(|edge| Some((*index.get(&edge.source)?, *index.get(&edge.target)?)))
        .filter(|(source, target)| source != target)
        .collect();

    let acyclic = break_cycles(count, &edges);
    let ranks = longest_path_ranks(count, &acyclic);
    let layers = order_layers(count, &acyclic, &ranks);

    let widest = layers.iter().map(Vec::len).max().unwrap_or(1);
    let rank_step = fit_step(config.node_width + config.rank_sep, layers.len(), canvas.width);
    let node_step = fit_step(config.node_height + config.node_sep, widest, canvas.height);
    let mut positions = vec![Position::default(); count];
    for (rank, layer) in layers.iter().enumerate() {
        for (slot, &node) in layer.iter().enumerate() {
            positions[node] = Position::new(rank as f64 * rank_step, slot as f64 * node_step);
        }
    }

    // Center the drawing's bounding box on the canvas
    let (min_x, max_x, min_y, max_y) = positions.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(min_x, max_x, min_y, max_y), p| (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y)),
    );
    let (dx, dy) = (cx - (min_x + max_x) / 2.0, cy - (min_y + max_y) / 2.0);

    log::debug!("Hierarchical layout: {} nodes in {} ranks", count, layers.len());

    topology
        .nodes
        .iter()
        .zip(positions)
        .map(|(node, p)| (node.id.clone(), Position::new(p.x + dx, p.y + dy)))
        .collect()
}

/// Shrink `step` so `slots` evenly spaced centers span at most `extent`
fn fit_step(step: f64, slots: usize, extent: f64) -> f64 {
    if slots < 2 || !(extent > 0.0) {
        return step;
    }
    step.min(extent / (slots - 1) as f64)
}

/// Reverse every edge that closes a cycle during a depth-first walk
fn break_cycles(count: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (i, &(source, _)) in edges.iter().enumerate() {
        outgoing[source].push(i);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Visit {
        New,
        Active,
        Done,
    }

    let mut state = vec![Visit::New; count];
    let mut reversed = vec![false; edges.len()];

    for root in 0..count {
        if state[root] != Visit::New {
            continue;
        }
        // (node, next outgoing edge to look at)
        let mut stack = vec![(root, 0usize)];
        state[root] = Visit::Active;
        while let Some(&(node, cursor)) = stack.last() {
            match outgoing[node].get(cursor).copied() {
                Some(edge) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    let target = edges[edge].1;
                    match state[target] {
                        Visit::New => {
                            state[target] = Visit::Active;
                            stack.push((target, 0));
                        }
                        Visit::Active => reversed[edge] = true,
                        Visit::Done => {}
                    }
                }
                None => {
                    state[node] = Visit::Done;
                    stack.pop();
                }
            }
        }
    }

    let mut acyclic: Vec<(usize, usize)> = edges
        .iter()
        .zip(reversed)
        .map(|(&(source, target), flip)| if flip { (target, source) } else { (source, target) })
        .collect();
    // Reversing can recreate an edge that already points the other way
    acyclic.sort_unstable();
    acyclic.dedup();
    acyclic
}

/// Rank = length of the longest path reaching the node from any source
fn longest_path_ranks(count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut indegree = vec![0usize; count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); count];
    for &(source, target) in edges {
        indegree[target] += 1;
        outgoing[source].push(target);
    }

    let mut ranks = vec![0usize; count];
    let mut queue: Vec<usize> = (0..count).filter(|&n| indegree[n] == 0).collect();
    let mut head = 0;
    while head < queue.len() {
        let node = queue[head];
        head += 1;
        for &target in &outgoing[node] {
            ranks[target] = ranks[target].max(ranks[node] + 1);
            indegree[target] -= 1;
            if indegree[target] == 0 {
                queue.push(target);
            }
        }
    }
    ranks
}

/// Group nodes by rank and reduce crossings with barycenter sweeps
fn order_layers(count: usize, edges: &[(usize, usize)], ranks: &[usize]) -> Vec<Vec<usize>> {
    let depth = ranks.iter().copied().max().unwrap_or(0) + 1;
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); depth];
    for node in 0..count {
        layers[ranks[node]].push(node);
    }

    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
    for &(source, target) in edges {
        successors[source].push(target);
        predecessors[target].push(source);
    }

    fn reindex(layers: &[Vec<usize>], slot: &mut [usize]) {
        for layer in layers {
            for (i, &node) in layer.iter().enumerate() {
                slot[node] = i;
            }
        }
    }

    let mut slot = vec![0usize; count];
    reindex(&layers, &mut slot);

    for sweep in 0..ORDERING_SWEEPS {
        let downward = sweep % 2 == 0;
        let ranks_in_order: Vec<usize> = if downward {
            (1..depth).collect()
        } else {
            (0..depth.saturating_sub(1)).rev().collect()
        };
        for rank in ranks_in_order {
            let neighbours = if downward { &predecessors } else { &successors };
            let mut keyed: Vec<(f64, usize)> = layers[rank]
                .iter()
                .map(|&node| {
                    let adjacent = &neighbours[node];
                    let key = if adjacent.is_empty() {
                        slot[node] as f64
                    } else {
                        adjacent.iter().map(|&n| slot[n] as f64).sum::<f64>() / adjacent.len() as f64
                    };
                    (key, node)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            layers[rank] = keyed.into_iter().map(|(_, node)| node).collect();
            reindex(&layers[rank..=rank], &mut slot);
        }
    }

    layers
}
