use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use topograph::config::EditorConfig;
use topograph::config_loader;
use topograph::graphml::{self, ExportArtifact, PresetLoader};
use topograph::layout::{self, ForceSimulation, LayoutStrategy};
use topograph::topology::generate::{self, TopologyTemplate};
use topograph::topology::{
    degree_of, isolated_nodes, peers_of, GraphState, NetworkTopology, NodeDegree, NodeId, TopologyKind,
};
use topograph::utils::{bitcoin_conf, validation};

/// Build, inspect and lay out peer-to-peer network topologies as GraphML
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the editor configuration YAML file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Asset root holding the preset directory
    #[arg(long, global = true, default_value = ".")]
    assets: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Directed ring plus random outbound links per node
    Create {
        #[arg(short, long, default_value_t = 12)]
        nodes: usize,
        /// Extra random outbound links per node
        #[arg(long, default_value_t = 7)]
        outbounds: usize,
        /// Software version tag for every node (defaults to the newest configured version)
        #[arg(long)]
        node_version: Option<String>,
        /// bitcoin.conf whose settings are applied to every node
        #[arg(long)]
        bitcoin_conf: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long)]
        outfile: Option<PathBuf>,
    },
    /// Random graph linking each ordered pair with a fixed probability
    Random {
        #[arg(short, long, default_value_t = 12)]
        nodes: usize,
        #[arg(short, long, default_value_t = 0.2)]
        probability: f64,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long)]
        outfile: Option<PathBuf>,
    },
    /// Fixed connection pattern
    Template {
        #[arg(value_enum)]
        template: TopologyTemplate,
        #[arg(short, long, default_value_t = 5)]
        nodes: usize,
        #[arg(short, long)]
        outfile: Option<PathBuf>,
    },
    /// Single seed node at the canvas center
    Scratch {
        #[arg(short, long)]
        outfile: Option<PathBuf>,
    },
    /// Summarize a GraphML file
    Info {
        file: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the peers of one node
    Peers { file: PathBuf, node: String },
    /// Recompute node positions
    Layout {
        file: PathBuf,
        #[arg(short, long, value_enum, default_value = "hierarchical")]
        strategy: LayoutStrategy,
        /// Run the force simulation tick by tick at the configured interval
        #[arg(long)]
        animate: bool,
        #[arg(short, long)]
        outfile: Option<PathBuf>,
    },
    /// List available presets
    Presets,
}

#[derive(Serialize)]
struct Summary {
    nodes: usize,
    edges: usize,
    isolated: Vec<NodeId>,
    versions: BTreeMap<String, usize>,
    degrees: Vec<NodeDegree>,
}

fn summarize(topology: &NetworkTopology) -> Summary {
    let mut versions = BTreeMap::new();
    for node in &topology.nodes {
        let version = node.version.clone().unwrap_or_else(|| "unset".to_string());
        *versions.entry(version).or_insert(0) += 1;
    }
    Summary {
        nodes: topology.nodes.len(),
        edges: topology.edges.len(),
        isolated: isolated_nodes(&topology.nodes, &topology.edges)
            .into_iter()
            .map(|node| node.id.clone())
            .collect(),
        versions,
        degrees: topology
            .nodes
            .iter()
            .map(|node| degree_of(&node.id, &topology.edges))
            .collect(),
    }
}

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Read a GraphML file as an editable custom topology
fn read_topology(path: &Path) -> Result<NetworkTopology> {
    let partial = graphml::decode::try_decode_file(path)
        .wrap_err_with(|| format!("Failed to decode '{}'", path.display()))?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "topology".to_string());
    Ok(partial.into_topology(0, name, TopologyKind::Custom))
}

fn write_topology(topology: &NetworkTopology, outfile: Option<&Path>) -> Result<PathBuf> {
    validation::validate_topology(topology).map_err(|e| eyre!(e))?;
    let artifact = ExportArtifact::from_topology(topology);
    match outfile {
        Some(path) => {
            std::fs::write(path, &artifact.bytes)
                .wrap_err_with(|| format!("Failed to write '{}'", path.display()))?;
            info!(
                "Wrote {} nodes and {} edges to {:?}",
                topology.nodes.len(),
                topology.edges.len(),
                path
            );
            Ok(path.to_path_buf())
        }
        None => artifact.write_to(Path::new(".")),
    }
}

fn animate(topology: &NetworkTopology, config: &EditorConfig) -> NetworkTopology {
    let mut state = GraphState::with_topology(topology.clone(), config.node_options.clone(), config.canvas.clone());
    let mut simulation = ForceSimulation::new(state.topology(), state.revision(), &config.layout.force, &config.canvas);
    while let Some(frame) = simulation.tick() {
        state.apply_frame(&frame);
        if simulation.ticks() % 50 == 0 {
            info!("tick {} alpha {:.4}", simulation.ticks(), frame.alpha);
        }
        std::thread::sleep(config.layout.force.tick_interval);
        if simulation.ticks() as usize >= layout::MAX_FORCE_TICKS {
            simulation.stop();
        }
    }
    info!("Simulation settled after {} ticks", simulation.ticks());
    state.into_topology()
}

fn run(cli: Cli) -> Result<()> {
    let config = config_loader::load_config_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Create {
            nodes,
            outbounds,
            node_version,
            bitcoin_conf: conf_file,
            seed,
            outfile,
        } => {
            let version = node_version.unwrap_or_else(|| config.node_options.default_version().to_string());
            if !config.node_options.allows_version(&version) {
                warn!("Version '{}' is not among the configured versions", version);
            }
            let overrides = match conf_file {
                Some(path) => bitcoin_conf::parse_conf_file(&path)?,
                None => BTreeMap::new(),
            };
            let topology = generate::cycle_with_outbounds(nodes, outbounds, &version, &overrides, &mut rng(seed));
            write_topology(&topology, outfile.as_deref())?;
        }
        Command::Random {
            nodes,
            probability,
            seed,
            outfile,
        } => {
            if !(0.0..=1.0).contains(&probability) {
                return Err(eyre!("probability must be within [0, 1], got {}", probability));
            }
            let version = config.node_options.default_version().to_string();
            let topology = generate::erdos_renyi(nodes, probability, &version, &mut rng(seed));
            write_topology(&topology, outfile.as_deref())?;
        }
        Command::Template {
            template,
            nodes,
            outfile,
        } => {
            validation::validate_template_size(template, nodes).map_err(|e| eyre!(e))?;
            let version = config.node_options.default_version().to_string();
            let mut topology = generate::from_template(template, nodes, &version);
            let positions = layout::layout(&topology, LayoutStrategy::Hierarchical, &config.layout, &config.canvas)?;
            let mut state = GraphState::with_topology(topology, config.node_options.clone(), config.canvas.clone());
            state.apply_positions(&positions);
            topology = state.into_topology();
            write_topology(&topology, outfile.as_deref())?;
        }
        Command::Scratch { outfile } => {
            let topology = generate::from_scratch(&config.canvas);
            write_topology(&topology, outfile.as_deref())?;
        }
        Command::Info { file, json } => {
            let topology = read_topology(&file)?;
            let summary = summarize(&topology);
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).wrap_err("Failed to serialize summary")?
                );
            } else {
                println!("{}: {} nodes, {} edges", file.display(), summary.nodes, summary.edges);
                for (version, count) in &summary.versions {
                    println!("  version {}: {} node(s)", version, count);
                }
                if !summary.isolated.is_empty() {
                    let isolated: Vec<&str> = summary.isolated.iter().map(NodeId::as_str).collect();
                    println!("  isolated: {}", isolated.join(", "));
                }
                if let Err(e) = validation::validate_topology(&topology) {
                    warn!("{}", e);
                }
            }
        }
        Command::Peers { file, node } => {
            let topology = read_topology(&file)?;
            let id = NodeId::new(node);
            if !topology.contains_node(&id) {
                return Err(eyre!("Node '{}' not found in '{}'", id, file.display()));
            }
            for peer in peers_of(&id, &topology.nodes, &topology.edges) {
                println!("{}\t{}", peer.id, peer.label);
            }
        }
        Command::Layout {
            file,
            strategy,
            animate: animated,
            outfile,
        } => {
            let topology = read_topology(&file)?;
            let topology = if animated && strategy == LayoutStrategy::Force {
                animate(&topology, &config)
            } else {
                let positions = layout::layout(&topology, strategy, &config.layout, &config.canvas)?;
                let mut state = GraphState::with_topology(topology, config.node_options.clone(), config.canvas.clone());
                state.apply_positions(&positions);
                state.into_topology()
            };
            write_topology(&topology, Some(outfile.as_deref().unwrap_or(file.as_path())))?;
        }
        Command::Presets => {
            let loader = PresetLoader::new(&cli.assets, &config.assets);
            for name in loader.list()? {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    run(cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["topograph", "create", "--nodes", "20", "--seed", "4"]);
        assert_eq!(cli.assets, PathBuf::from("."));
        match cli.command {
            Command::Create {
                nodes,
                outbounds,
                seed,
                ..
            } => {
                assert_eq!(nodes, 20);
                assert_eq!(outbounds, 7);
                assert_eq!(seed, Some(4));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::parse_from(["topograph", "presets", "--assets", "public", "--config", "editor.yaml"]);
        assert_eq!(cli.assets, PathBuf::from("public"));
        assert_eq!(cli.config, Some(PathBuf::from("editor.yaml")));
    }

    #[test]
    fn test_layout_args() {
        let cli = Cli::parse_from(["topograph", "layout", "g.graphml", "--strategy", "force", "--animate"]);
        match cli.command {
            Command::Layout { strategy, animate, .. } => {
                assert_eq!(strategy, LayoutStrategy::Force);
                assert!(animate);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_create_then_info() {
        let dir = tempdir().unwrap();
        let outfile = dir.path().join("cycle.graphml");
        let cli = Cli::parse_from([
            "topograph",
            "create",
            "--nodes",
            "6",
            "--outbounds",
            "2",
            "--seed",
            "9",
            "--outfile",
            outfile.to_str().unwrap(),
        ]);
        run(cli).unwrap();

        let topology = read_topology(&outfile).unwrap();
        let summary = summarize(&topology);
        assert_eq!(summary.nodes, 6);
        assert_eq!(summary.edges, 6 * 3);
        assert_eq!(summary.versions.get("26.0"), Some(&6));
        assert!(summary.isolated.is_empty());
    }

    #[test]
    fn test_template_rejects_small_ring() {
        let cli = Cli::parse_from(["topograph", "template", "ring", "--nodes", "2"]);
        assert!(run(cli).is_err());
    }

    #[test]
    fn test_random_rejects_bad_probability() {
        for probability in ["nan", "inf", "1.5"] {
            let cli = Cli::parse_from(["topograph", "random", "--nodes", "4", "--probability", probability]);
            assert!(run(cli).is_err(), "accepted probability {}", probability);
        }
    }
}
