use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Editor configuration. Every section is optional and falls back to the
/// defaults the editor ships with.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas: CanvasConfig,
    pub node_options: NodeOptions,
    pub layout: LayoutConfig,
    pub assets: AssetConfig,
}

impl EditorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        // Canvas dimensions
        if !(self.canvas.width > 0.0) || !(self.canvas.height > 0.0) {
            return Err(ValidationError::InvalidCanvas(format!(
                "canvas must have positive dimensions, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }

        self.node_options.validate()?;
        self.layout.force.validate()?;
        self.layout.hierarchical.validate()?;

        if self.assets.graphml_dir.trim().is_empty() {
            return Err(ValidationError::InvalidAssets(
                "graphml_dir cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Drawing area the layouts target
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
}

impl CanvasConfig {
    /// Midpoint of the canvas
    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 650.0,
            height: 650.0,
        }
    }
}

/// Allowed values for node fields. The editor only checks membership,
/// the lists themselves belong to whoever ships the simulation runtime.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct NodeOptions {
    pub versions: Vec<String>,
    pub latency_profiles: Vec<String>,
    /// RAM sizes in GB
    pub ram: Vec<u32>,
    /// CPU core counts
    pub cpu: Vec<u32>,
}

impl NodeOptions {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.versions.is_empty() {
            return Err(ValidationError::InvalidNodeOptions("versions cannot be empty".to_string()));
        }
        if self.latency_profiles.is_empty() {
            return Err(ValidationError::InvalidNodeOptions(
                "latency_profiles cannot be empty".to_string(),
            ));
        }
        if self.ram.is_empty() || self.cpu.is_empty() {
            return Err(ValidationError::InvalidNodeOptions(
                "ram and cpu options cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn allows_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    pub fn allows_latency(&self, latency: &str) -> bool {
        self.latency_profiles.iter().any(|l| l == latency)
    }

    pub fn allows_ram(&self, ram: u32) -> bool {
        self.ram.contains(&ram)
    }

    pub fn allows_cpu(&self, cpu: u32) -> bool {
        self.cpu.contains(&cpu)
    }

    /// Newest known version, used by generators
    pub fn default_version(&self) -> &str {
        self.versions.last().map(String::as_str).unwrap_or("26.0")
    }
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            versions: ["22.0", "23.0", "24.0", "24.1", "25.0", "26.0"]
                .iter()
                .map(|v| v.to_string())
                .collect(),
            latency_profiles: ["0ms", "10ms", "50ms", "100ms", "200ms"]
                .iter()
                .map(|l| l.to_string())
                .collect(),
            ram: vec![1, 2, 4, 8, 16],
            cpu: vec![1, 2, 4, 8],
        }
    }
}

/// Layout engine tuning
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub force: ForceConfig,
    pub hierarchical: HierarchicalConfig,
}

/// Force simulation parameters
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ForceConfig {
    /// Spring rest length along each edge
    pub link_distance: f64,
    /// Pairwise charge, negative values repel
    pub charge_strength: f64,
    /// Pull toward the canvas midpoint
    pub center_strength: f64,
    pub alpha_decay: f64,
    pub alpha_min: f64,
    pub velocity_decay: f64,
    /// Alpha target held while a node is being dragged
    pub drag_alpha_target: f64,
    /// Delay between animation frames
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    /// Seed for separating coincident nodes
    pub seed: u64,
}

impl ForceConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(self.alpha_decay > 0.0 && self.alpha_decay < 1.0) {
            return Err(ValidationError::InvalidLayout(format!(
                "alpha_decay must be in (0, 1), got {}",
                self.alpha_decay
            )));
        }
        if !(self.alpha_min > 0.0 && self.alpha_min < 1.0) {
            return Err(ValidationError::InvalidLayout(format!(
                "alpha_min must be in (0, 1), got {}",
                self.alpha_min
            )));
        }
        if !(self.velocity_decay >= 0.0 && self.velocity_decay <= 1.0) {
            return Err(ValidationError::InvalidLayout(format!(
                "velocity_decay must be in [0, 1], got {}",
                self.velocity_decay
            )));
        }
        if !(self.link_distance > 0.0) {
            return Err(ValidationError::InvalidLayout(
                "link_distance must be positive".to_string(),
            ));
        }
        if !(self.drag_alpha_target >= 0.0 && self.drag_alpha_target < 1.0) {
            return Err(ValidationError::InvalidLayout(
                "drag_alpha_target must be in [0, 1)".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            link_distance: 150.0,
            charge_strength: -60.0,
            center_strength: 0.05,
            alpha_decay: 0.0228,
            alpha_min: 0.001,
            velocity_decay: 0.4,
            drag_alpha_target: 0.3,
            tick_interval: Duration::from_millis(16),
            seed: 0x5eed,
        }
    }
}

/// Ranked layout geometry
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct HierarchicalConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Horizontal gap between ranks
    pub rank_sep: f64,
    /// Vertical gap between nodes of one rank
    pub node_sep: f64,
}

impl HierarchicalConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(self.node_width > 0.0) || !(self.node_height > 0.0) {
            return Err(ValidationError::InvalidLayout(
                "node bounding box must be positive".to_string(),
            ));
        }
        if self.rank_sep < 0.0 || self.node_sep < 0.0 {
            return Err(ValidationError::InvalidLayout(
                "rank_sep and node_sep cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for HierarchicalConfig {
    fn default() -> Self {
        Self {
            node_width: 172.0,
            node_height: 36.0,
            rank_sep: 50.0,
            node_sep: 50.0,
        }
    }
}

/// Static asset locations
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory holding prebuilt `<name>.graphml` topologies, relative to the asset root
    pub graphml_dir: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            graphml_dir: "graphml".to_string(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid canvas configuration: {0}")]
    InvalidCanvas(String),
    #[error("Invalid node options: {0}")]
    InvalidNodeOptions(String),
    #[error("Invalid layout configuration: {0}")]
    InvalidLayout(String),
    #[error("Invalid asset configuration: {0}")]
    InvalidAssets(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EditorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.canvas.center(), (325.0, 325.0));
        assert_eq!(config.layout.force.link_distance, 150.0);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
canvas:
  width: 800
layout:
  force:
    tick_interval: "40ms"
"#;
        let config: EditorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.canvas.width, 800.0);
        assert_eq!(config.canvas.height, 650.0);
        assert_eq!(config.layout.force.tick_interval, Duration::from_millis(40));
        assert_eq!(config.layout.force.link_distance, 150.0);
        assert!(config.node_options.allows_version("25.0"));
    }

    #[test]
    fn test_invalid_alpha_decay() {
        let mut config = EditorConfig::default();
        config.layout.force.alpha_decay = 0.0;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidLayout(_))));

        config.layout.force.alpha_decay = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_enumerations_rejected() {
        let mut config = EditorConfig::default();
        config.node_options.versions.clear();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidNodeOptions(_))));
    }

    #[test]
    fn test_membership() {
        let options = NodeOptions::default();
        assert!(options.allows_latency("10ms"));
        assert!(!options.allows_latency("3ms"));
        assert!(options.allows_ram(8));
        assert!(!options.allows_cpu(3));
        assert_eq!(options.default_version(), "26.0");
    }
}
