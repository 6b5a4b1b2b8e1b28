//! Plotter configuration and its JSON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::data::samples::DEFAULT_SAMPLE_COUNT;

/// Startup configuration. Unknown fields in a config file are ignored,
/// missing ones fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Native window size in logical pixels.
    pub window_width: u32,
    pub window_height: u32,
    /// Logical point the view is centered on at startup.
    pub center: [f64; 2],
    /// Number of samples per sampling pass.
    pub sample_count: usize,
    /// Expression loaded into the plotter at startup.
    pub initial_expression: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 800,
            center: [0.0, 0.0],
            sample_count: DEFAULT_SAMPLE_COUNT,
            initial_expression: "sqrt(x)".to_string(),
        }
    }
}

/// Serialize a configuration as pretty JSON.
pub fn config_to_json(config: &PlotConfig) -> Result<String, String> {
    serde_json::to_string_pretty(config).map_err(|e| e.to_string())
}

/// Deserialize a configuration from JSON.
pub fn config_from_json(json: &str) -> Result<PlotConfig, String> {
    serde_json::from_str(json).map_err(|e| e.to_string())
}

/// Save the configuration to a JSON file at the given path.
pub fn save_config_to_path(config: &PlotConfig, path: &Path) -> Result<(), String> {
    let txt = config_to_json(config)?;
    std::fs::write(path, txt).map_err(|e| e.to_string())
}

/// Load the configuration from a JSON file at the given path.
pub fn load_config_from_path(path: &Path) -> Result<PlotConfig, String> {
    let txt = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    config_from_json(&txt)
}

/// Load the configuration, falling back to defaults (with a warning) when
/// the file is missing or malformed.
pub fn load_or_default(path: Option<&Path>) -> PlotConfig {
    match path {
        None => PlotConfig::default(),
        Some(path) => match load_config_from_path(path) {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    "could not load config from {}: {err}; using defaults",
                    path.display()
                );
                PlotConfig::default()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_preserves_fields() {
        let mut config = PlotConfig::default();
        config.sample_count = 250;
        config.center = [1.0, -2.5];
        config.initial_expression = "sin(x)".into();
        let json = config_to_json(&config).unwrap();
        assert_eq!(config_from_json(&json).unwrap(), config);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = config_from_json(r#"{ "sample_count": 42 }"#).unwrap();
        assert_eq!(config.sample_count, 42);
        assert_eq!(config.window_width, PlotConfig::default().window_width);
        assert_eq!(config.initial_expression, "sqrt(x)");
    }

    #[test]
    fn file_round_trip() {
        let dir = std::env::temp_dir().join("funcplot-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("saved.json");
        let mut config = PlotConfig::default();
        config.window_width = 640;
        config.initial_expression = "tanh(x)".into();
        save_config_to_path(&config, &path).unwrap();
        assert_eq!(load_config_from_path(&path).unwrap(), config);
    }

    #[test]
    fn malformed_files_fall_back_to_defaults() {
        let dir = std::env::temp_dir().join("funcplot-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_or_default(Some(&path)), PlotConfig::default());
        assert_eq!(load_or_default(None), PlotConfig::default());
    }
}
