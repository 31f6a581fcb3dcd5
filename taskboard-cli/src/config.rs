/// Configuration for the taskboard CLI.
/// Reads config.json from ~/.config/taskboard/config.json (or platform equivalent).
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use taskboard_core::config::BoardConfig;

/// Default config path: ~/.config/taskboard/config.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskboard")
        .join("config.json")
}

/// Default board file: ~/.local/share/taskboard/state.json
pub fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskboard")
        .join("state.json")
}

/// Load config from path. Returns default if the file is missing or broken.
pub fn load_config(path: &Path) -> BoardConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Failed to parse config {}: {}", path.display(), e);
            BoardConfig::default()
        }),
        Err(_) => {
            log::info!("No config at {}, using defaults", path.display());
            BoardConfig::default()
        }
    }
}

/// Load a config the user pointed at explicitly. Unlike [`load_config`],
/// a missing or unparsable file is an error.
pub fn load_config_strict(path: &Path) -> Result<BoardConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))
}

/// `--state` wins over the config's `stateFile`, which wins over the
/// platform default.
pub fn resolve_state_path(flag: Option<PathBuf>, config: &BoardConfig) -> PathBuf {
    flag.or_else(|| config.state_file.as_ref().map(PathBuf::from))
        .unwrap_or_else(default_state_path)
}
