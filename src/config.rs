//! Engine configuration, loaded from `regex2fsm.toml`.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{FsmError, Result};

/// File name looked up by [`Config::discover`].
pub const CONFIG_FILE_NAME: &str = "regex2fsm.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub construction: ConstructionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConstructionConfig {
    /// Create a new state whenever syntactic equality finds no match,
    /// instead of pausing for an external decision.
    pub confident: bool,
    /// Steps performed per `construct_step` call when driving a machine to completion.
    pub step_batch: usize,
    /// Hard cap on the number of states (0 = unlimited).
    pub max_states: usize,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        Self {
            confident: true,
            step_batch: 64,
            max_states: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| FsmError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Load `regex2fsm.toml` from `dir` if it exists, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Serialize back to TOML (used by `regex2fsm config`).
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| FsmError::SerializeError(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.construction.step_batch == 0 {
            return Err(FsmError::ConfigError(
                "construction.step_batch must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_from_empty_text() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.construction.confident);
        assert_eq!(config.construction.step_batch, 64);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml_str(
            r#"
[construction]
confident = false
max_states = 12

[logging]
filter = "regex2fsm=debug"
"#,
        )
        .unwrap();
        assert!(!config.construction.confident);
        assert_eq!(config.construction.max_states, 12);
        assert_eq!(config.construction.step_batch, 64);
        assert_eq!(config.logging.filter, "regex2fsm=debug");
    }

    #[test]
    fn test_zero_step_batch_rejected() {
        let result = Config::from_toml_str("[construction]\nstep_batch = 0\n");
        assert!(matches!(result, Err(FsmError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = Config::from_toml_str("[construction\n");
        assert!(matches!(result, Err(FsmError::ConfigError(_))));
    }

    #[test]
    fn test_discover() {
        let dir = tempdir().unwrap();
        assert_eq!(Config::discover(dir.path()).unwrap(), Config::default());

        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[construction]\nstep_batch = 3\n",
        )
        .unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.construction.step_batch, 3);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }
}
