use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::WorldArgs;

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// A named set of world generation inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub world: WorldArgs,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .world
            .validate()
            .with_context(|| format!("Invalid world settings in {}", path.display()))?;
        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document_uses_defaults() {
        let scenario: Scenario = serde_yaml::from_str("name: bare\n").unwrap();
        assert_eq!(scenario.description, None);
        assert_eq!(scenario.logging.level, "info");
        assert_eq!(scenario.world, WorldArgs::default());
    }

    #[test]
    fn test_partial_world_overrides() {
        let yaml = r#"
name: islands
logging:
  level: debug
world:
  world_seed: 9
  num_plates: 4
  elevation:
    continental_desired: { min: 10, max: 12 }
"#;
        let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(scenario.logging.level, "debug");
        assert_eq!(scenario.world.world_seed, 9);
        assert_eq!(scenario.world.num_plates, 4);
        assert_eq!(scenario.world.elevation.continental_desired.min, 10);
        assert_eq!(scenario.world.elevation.oceanic_clamp.min, -75);
        assert_eq!(scenario.world.size_chunks_x, 8);
    }
}
