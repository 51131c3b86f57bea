//! Session configuration and errors.

use std::path::Path;

use serde::{Deserialize, Serialize};
use wayfinder_explore::{ConfigError, SearchConfig};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration for one exploration session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub search: SearchConfig,
    /// Paths returned per search when the caller does not say.
    pub default_path_count_limitation: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            default_path_count_limitation: 10,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.search.validate()
    }

    /// Load and validate a JSON configuration file. Missing fields take
    /// their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let text = std::fs::read_to_string(path)?;
        let config: SessionConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}
