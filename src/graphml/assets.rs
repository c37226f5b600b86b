//! Prebuilt topology assets.
//!
//! Presets live at `<asset root>/<graphml_dir>/<name>.graphml`. Loading is
//! split into request, fetch and complete so a caller can run the fetch
//! elsewhere; only the most recent request may complete; older tickets are
//! ignored.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::config::AssetConfig;
use crate::topology::{NetworkTopology, TopologyKind};

use super::decode::decode_file;
use super::PartialTopology;

const EXTENSION: &str = "graphml";

/// Handle for one preset load request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub name: String,
    pub path: PathBuf,
    generation: u64,
}

impl LoadTicket {
    /// Read and decode the preset. Failures yield an empty result.
    pub fn fetch(&self) -> PartialTopology {
        decode_file(&self.path)
    }
}

/// Resolves, lists and loads prebuilt topologies
#[derive(Debug, Clone)]
pub struct PresetLoader {
    dir: PathBuf,
    generation: u64,
}

impl PresetLoader {
    pub fn new(asset_root: &Path, config: &AssetConfig) -> Self {
        Self {
            dir: asset_root.join(&config.graphml_dir),
            generation: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a preset by name; a trailing `.graphml` is accepted
    pub fn path_for(&self, name: &str) -> PathBuf {
        let stem = name.strip_suffix(".graphml").unwrap_or(name);
        self.dir.join(format!("{}.{}", stem, EXTENSION))
    }

    /// Names of all presets in the asset directory, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir)
            .wrap_err_with(|| format!("Failed to list presets in '{}'", self.dir.display()))?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.wrap_err("Failed to read preset directory entry")?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        debug!("Found {} preset(s) in {:?}", names.len(), self.dir);
        Ok(names)
    }

    /// Start loading a preset. Any ticket issued earlier is superseded.
    pub fn request(&mut self, name: &str) -> LoadTicket {
        self.generation += 1;
        let stem = name.strip_suffix(".graphml").unwrap_or(name);
        LoadTicket {
            name: stem.to_string(),
            path: self.path_for(stem),
            generation: self.generation,
        }
    }

    /// Supersede every outstanding ticket
    pub fn cancel(&mut self) {
        self.generation += 1;
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Finish a load
    ///
    /// Returns `None` when the ticket was superseded or the document held
    /// nothing to import; the caller keeps its current topology in both cases.
    pub fn complete(&self, ticket: &LoadTicket, partial: PartialTopology) -> Option<NetworkTopology> {
        if !self.is_current(ticket) {
            debug!("Ignoring superseded load of preset '{}'", ticket.name);
            return None;
        }
        if partial.is_empty() {
            warn!("Preset '{}' has nothing to import", ticket.name);
            return None;
        }

        info!(
            "Loaded preset '{}' ({} nodes, {} edges)",
            ticket.name,
            partial.nodes.len(),
            partial.edges.len()
        );
        Some(partial.into_topology(
            0,
            ticket.name.clone(),
            TopologyKind::Prebuilt {
                asset: ticket.name.clone(),
            },
        ))
    }

    /// Request, fetch and complete in one step
    pub fn load(&mut self, name: &str) -> Option<NetworkTopology> {
        let ticket = self.request(name);
        let partial = ticket.fetch();
        self.complete(&ticket, partial)
    }
}
