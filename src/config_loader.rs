use crate::config::EditorConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and parse editor configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<EditorConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: EditorConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;

    info!(
        "Configuration loaded: {} versions, {} latency profiles, canvas {}x{}",
        config.node_options.versions.len(),
        config.node_options.latency_profiles.len(),
        config.canvas.width,
        config.canvas.height
    );

    Ok(config)
}

/// Load configuration if a path was given, otherwise use the built-in defaults
pub fn load_config_or_default(config_path: Option<&Path>) -> Result<EditorConfig> {
    match config_path {
        Some(path) => load_config(path),
        None => {
            info!("No configuration file given, using defaults");
            Ok(EditorConfig::default())
        }
    }
}
