//! # Topograph - Peer-to-peer network topology editor core
//!
//! This library holds the engine behind an interactive topology editor for
//! simulated Bitcoin networks: the topology model and its editing rules, the
//! GraphML codec used to exchange topologies with the simulation runtime,
//! and the automatic layout engine.
//!
//! ## Overview
//!
//! A topology is a set of simulated hosts (nodes) and directed peer links
//! (edges). Users either open a prebuilt preset or start from a single node,
//! edit the graph, and export it as `graph.graphml` for the simulator.
//!
//! ## Key Features
//!
//! - **Safe Editing**: Every mutation keeps edges valid, refuses self-loops
//!   and duplicates, and never reuses a deleted node id
//! - **GraphML Exchange**: Symmetric encode/decode including bitcoin.conf overrides
//! - **Tolerant Presets**: Broken or missing preset assets never disturb the session
//! - **Layout**: Force simulation with drag pinning, and a one-shot ranked layout
//! - **Generators**: Cycle with random outbounds, Erdős–Rényi and Star/Mesh/Ring/DAG templates
//!
//! ## Architecture
//!
//! - `config`: Editor configuration structures (node option enumerations, layout tuning)
//! - `config_loader`: Configuration file loading and validation
//! - `topology`: Data model, `GraphState`, peer lookups and generators
//! - `graphml`: Key dictionary, encoder, decoder and preset assets
//! - `layout`: Force simulation and hierarchical layout
//! - `session`: Wizard flow and the controller tying the pieces together
//! - `utils`: bitcoin.conf helpers and standalone validation
//!
//! ## Example Usage
//!
//! ```rust
//! use topograph::config::EditorConfig;
//! use topograph::graphml::{decode_str, encode};
//! use topograph::topology::{GraphState, NodeId};
//!
//! let config = EditorConfig::default();
//! let mut state = GraphState::new(config.node_options.clone(), config.canvas.clone());
//! state.add_node(None);
//! state.add_node(None);
//! state.connect(&NodeId::from("0"), &NodeId::from("1"));
//!
//! let xml = encode(state.topology());
//! let decoded = decode_str(&xml)?;
//! assert_eq!(decoded.nodes.len(), 2);
//! assert_eq!(decoded.edges.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Editing never fails: invalid edits are logged no-ops, with `try_*`
//! variants returning the reason. Decoding has a strict `decode_str` and
//! soft-failing `decode`/`decode_file`. File-facing functions return
//! `color_eyre::Result` with context.

pub mod config;
pub mod config_loader;
pub mod graphml;
pub mod layout;
pub mod session;
pub mod topology;
pub mod utils;
