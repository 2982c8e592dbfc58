use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::net::{MAX_TOKENS, Tokens};

/// Runner settings; every field may be omitted from the TOML file.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SimConfig {
    #[serde(default = "default_places")]
    pub places: usize,
    #[serde(default = "default_transitions")]
    pub transitions: usize,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Tokens,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            places: default_places(),
            transitions: default_transitions(),
            max_tokens: default_max_tokens(),
            seed: None,
            log_file: None,
        }
    }
}

impl SimConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimConfig = toml::from_str(content)?;
        anyhow::ensure!(
            config.places > 0 && config.transitions > 0,
            "places and transitions must be positive"
        );
        Ok(config)
    }
}

// Demo net size.
fn default_places() -> usize {
    7
}

fn default_transitions() -> usize {
    5
}

fn default_max_tokens() -> Tokens {
    MAX_TOKENS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(SimConfig::from_toml_str("").unwrap(), SimConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = SimConfig::from_toml_str(
            r#"
            places = 3
            max_tokens = 5
            seed = 9
            log_file = "log.txt"
            "#,
        )
        .unwrap();
        assert_eq!(config.places, 3);
        assert_eq!(config.transitions, 5);
        assert_eq!(config.max_tokens, 5);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.log_file, Some(PathBuf::from("log.txt")));
    }

    #[test]
    fn zero_places_rejected() {
        assert!(SimConfig::from_toml_str("places = 0").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = SimConfig::load_from_file("/nonexistent/petri-sim.toml").unwrap();
        assert_eq!(config, SimConfig::default());
    }
}
