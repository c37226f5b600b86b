//! Node edit patches.
//!
//! The hosting UI submits edits as key/value strings from its forms. A
//! [`NodePatch`] collects them; [`NodePatch::resolve`] checks every key
//! against the editable field set and every value against the configured
//! enumerations before anything is applied.

use std::collections::BTreeMap;

use crate::config::NodeOptions;
use crate::utils::bitcoin_conf;

use super::types::{NetworkNode, ResourceProfile};
use super::Rejection;

/// Keys accepted by `edit_node`
pub const EDITABLE_FIELDS: [&str; 6] = [
    "label",
    "version",
    "latencyProfile",
    "resourceProfile.ram",
    "resourceProfile.cpu",
    "bitcoinConfOverrides",
];

/// A single validated field assignment
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    Label(String),
    Version(String),
    LatencyProfile(String),
    Ram(u32),
    Cpu(u32),
    BitcoinConfOverrides(BTreeMap<String, String>),
}

impl FieldEdit {
    /// Parse and validate one key/value pair
    pub fn parse(key: &str, value: &str, options: &NodeOptions) -> Result<Self, Rejection> {
        match key {
            "label" => Ok(FieldEdit::Label(value.to_string())),
            "version" => {
                if options.allows_version(value) {
                    Ok(FieldEdit::Version(value.to_string()))
                } else {
                    Err(invalid(key, value))
                }
            }
            "latencyProfile" => {
                if options.allows_latency(value) {
                    Ok(FieldEdit::LatencyProfile(value.to_string()))
                } else {
                    Err(invalid(key, value))
                }
            }
            "resourceProfile.ram" => match value.trim().parse::<u32>() {
                Ok(ram) if options.allows_ram(ram) => Ok(FieldEdit::Ram(ram)),
                _ => Err(invalid(key, value)),
            },
            "resourceProfile.cpu" => match value.trim().parse::<u32>() {
                Ok(cpu) if options.allows_cpu(cpu) => Ok(FieldEdit::Cpu(cpu)),
                _ => Err(invalid(key, value)),
            },
            "bitcoinConfOverrides" => Ok(FieldEdit::BitcoinConfOverrides(bitcoin_conf::unflatten(value))),
            _ => Err(Rejection::UnknownField(key.to_string())),
        }
    }

    /// Apply this edit to a node
    pub fn apply(&self, node: &mut NetworkNode, options: &NodeOptions) {
        match self {
            FieldEdit::Label(label) => node.label = label.clone(),
            FieldEdit::Version(version) => node.version = Some(version.clone()),
            FieldEdit::LatencyProfile(latency) => node.latency_profile = Some(latency.clone()),
            FieldEdit::Ram(ram) => {
                let profile = node.resource_profile.get_or_insert_with(|| default_profile(options));
                profile.ram = *ram;
            }
            FieldEdit::Cpu(cpu) => {
                let profile = node.resource_profile.get_or_insert_with(|| default_profile(options));
                profile.cpu = *cpu;
            }
            FieldEdit::BitcoinConfOverrides(overrides) => node.bitcoin_conf_overrides = overrides.clone(),
        }
    }
}

fn invalid(key: &str, value: &str) -> Rejection {
    Rejection::InvalidValue {
        field: key.to_string(),
        value: value.to_string(),
    }
}

/// Smallest configured profile, used when a node gains its first resource field
fn default_profile(options: &NodeOptions) -> ResourceProfile {
    ResourceProfile {
        ram: options.ram.iter().copied().min().unwrap_or(1),
        cpu: options.cpu.iter().copied().min().unwrap_or(1),
    }
}

/// Raw key/value edits as submitted by a form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    entries: Vec<(String, String)>,
}

impl NodePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key/value pair. Later values for the same key win.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate every entry. A single unknown key or invalid value rejects
    /// the whole patch.
    pub fn resolve(&self, options: &NodeOptions) -> Result<Vec<FieldEdit>, Rejection> {
        self.entries
            .iter()
            .map(|(key, value)| FieldEdit::parse(key, value, options))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NodePatch {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
