#[cfg(test)]
mod graph_state_tests {
    use std::collections::{BTreeMap, HashSet};

    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    use topograph::config::{EditorConfig, LayoutConfig};
    use topograph::layout::{self, ForceSimulation, LayoutStrategy};
    use topograph::topology::generate;
    use topograph::topology::{GraphState, NetworkNode, NetworkTopology, NodeId, TopologyKind};
    use topograph::utils::validate_topology;

    fn state_with(topology: NetworkTopology) -> GraphState {
        let config = EditorConfig::default();
        GraphState::with_topology(topology, config.node_options.clone(), config.canvas.clone())
    }

    fn random_states() -> Vec<GraphState> {
        let mut rng = StdRng::seed_from_u64(11);
        (0..6)
            .map(|i| {
                let topology = if i % 2 == 0 {
                    generate::erdos_renyi(4 + i * 3, 0.3, "26.0", &mut rng)
                } else {
                    generate::cycle_with_outbounds(4 + i * 3, 2, "26.0", &BTreeMap::new(), &mut rng)
                };
                state_with(topology)
            })
            .collect()
    }

    fn ids(state: &GraphState) -> Vec<NodeId> {
        state.nodes().iter().map(|node| node.id.clone()).collect()
    }

    /// Scenario A: A->B, B->C; deleting B leaves A and C with no edges
    #[test]
    fn test_delete_middle_of_chain() {
        let mut topology = NetworkTopology::new(0, "abc", TopologyKind::Custom);
        for id in ["A", "B", "C"] {
            topology.nodes.push(NetworkNode::new(id, id));
        }
        topology.edges.push(topograph::topology::NetworkEdge::new("A", "B"));
        topology.edges.push(topograph::topology::NetworkEdge::new("B", "C"));
        let mut state = state_with(topology);

        let result = state.delete_node(&NodeId::from("B"));
        assert!(result.edges.is_empty());
        let remaining: Vec<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(remaining, vec!["A", "C"]);
    }

    /// Scenario D and the self-loop property, for every node
    #[test]
    fn test_self_loops_are_always_rejected() {
        for mut state in random_states() {
            let edges_before = state.edges().to_vec();
            for id in ids(&state) {
                state.connect(&id, &id);
            }
            assert_eq!(state.edges(), edges_before.as_slice());
        }
    }

    /// Deleting any node leaves no edge referencing it
    #[test]
    fn test_cascade_delete() {
        for state in random_states() {
            for id in ids(&state) {
                let mut copy = state.clone();
                copy.delete_node(&id);
                assert!(copy.edges().iter().all(|edge| !edge.touches(&id)));
                assert!(validate_topology(copy.topology()).is_ok());
            }
        }
    }

    /// Connecting twice equals connecting once
    #[test]
    fn test_connect_is_idempotent() {
        for mut state in random_states() {
            let ids = ids(&state);
            for pair in ids.windows(2) {
                let mut once = state.clone();
                once.connect(&pair[1], &pair[0]);
                state.connect(&pair[1], &pair[0]);
                state.connect(&pair[1], &pair[0]);
                assert_eq!(once.edges(), state.edges());
            }
        }
    }

    /// Duplicates get an unseen id and no links
    #[test]
    fn test_duplicate_gets_fresh_id() {
        for mut state in random_states() {
            let existing: HashSet<NodeId> = ids(&state).into_iter().collect();
            let source = ids(&state)[0].clone();
            let copy = state.try_duplicate_node(&source).unwrap();

            assert!(!existing.contains(&copy));
            assert!(state.edges().iter().all(|edge| !edge.touches(&copy)));
            assert_eq!(state.node(&copy).unwrap().label, format!("{} duplicate", state.node(&source).unwrap().label));
        }
    }

    /// A long random editing session never breaks an invariant or reuses an id
    #[test]
    fn test_random_edit_session_keeps_invariants() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut state = state_with(generate::from_scratch(&EditorConfig::default().canvas));
        let mut ever_seen: HashSet<NodeId> = ids(&state).into_iter().collect();
        let mut deleted: HashSet<NodeId> = HashSet::new();

        for step in 0..400 {
            let current = ids(&state);
            let pick = |rng: &mut StdRng| current.choose(rng).cloned();
            match step % 5 {
                0 => {
                    state.add_node(None);
                }
                1 => {
                    if let Some(id) = pick(&mut rng) {
                        state.duplicate_node(&id);
                    }
                }
                2 => {
                    if let (Some(a), Some(b)) = (pick(&mut rng), pick(&mut rng)) {
                        state.connect(&a, &b);
                    }
                }
                3 => {
                    if let (Some(a), Some(b)) = (pick(&mut rng), pick(&mut rng)) {
                        state.disconnect(&a, &b);
                    }
                }
                _ => {
                    if step % 3 == 0 {
                        if let Some(id) = pick(&mut rng) {
                            state.delete_node(&id);
                            deleted.insert(id);
                        }
                    }
                }
            }

            assert!(validate_topology(state.topology()).is_ok(), "invariant broken at step {}", step);
            for id in ids(&state) {
                assert!(!deleted.contains(&id), "id {} reused", id);
                ever_seen.insert(id);
            }
        }
        assert!(ever_seen.len() > state.nodes().len());
    }

    /// Ranked layout with no edges: N distinct positions
    #[test]
    fn test_hierarchical_layout_without_edges() {
        let mut topology = NetworkTopology::new(0, "loose", TopologyKind::Custom);
        for i in 0..12 {
            topology.nodes.push(NetworkNode::new(i.to_string(), format!("node {}", i)));
        }
        let config = EditorConfig::default();
        let positions =
            layout::layout(&topology, LayoutStrategy::Hierarchical, &config.layout, &config.canvas).unwrap();

        assert_eq!(positions.len(), 12);
        for (i, (_, a)) in positions.iter().enumerate() {
            for (_, b) in positions.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    /// Starting then immediately stopping the simulation changes nothing
    #[test]
    fn test_zero_tick_simulation() {
        let config = EditorConfig::default();
        for mut state in random_states() {
            let before = state.topology().clone();
            let mut simulation =
                ForceSimulation::new(state.topology(), state.revision(), &LayoutConfig::default().force, &config.canvas);
            simulation.stop();
            while let Some(frame) = simulation.tick() {
                state.apply_frame(&frame);
            }
            assert_eq!(state.topology(), &before);
        }
    }

    /// Frames built before a structural edit are discarded
    #[test]
    fn test_stale_frame_is_discarded() {
        let config = EditorConfig::default();
        let mut state = state_with(generate::from_template(generate::TopologyTemplate::Ring, 5, "26.0"));
        let mut simulation = ForceSimulation::new(state.topology(), state.revision(), &config.layout.force, &config.canvas);
        let frame = simulation.tick().unwrap();

        state.add_node(None);
        let positions_before: Vec<_> = state.nodes().iter().map(|n| n.position).collect();
        assert!(!state.apply_frame(&frame));
        let positions_after: Vec<_> = state.nodes().iter().map(|n| n.position).collect();
        assert_eq!(positions_before, positions_after);
    }
}
