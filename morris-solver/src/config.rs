//! Solver configuration, loadable from TOML.
//!
//! ```toml
//! tablebase = "data/tablebase.bin"
//!
//! [board]
//! topology = "classic"        # or "dense"
//!
//! # Optional explicit graph; overrides `topology`.
//! [board.adjacency]
//! A1 = ["A2", "B1", "B2"]
//!
//! [rules]
//! anti_oscillation = true
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use morris_core::{Board, Rules, Topology};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// Adjacency graph selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub topology: Topology,
    /// Neighbour lists keyed by cell label.
    pub adjacency: Option<BTreeMap<String, Vec<String>>>,
}

impl BoardConfig {
    /// Build and validate the board.
    pub fn build(&self) -> Result<Board, ConfigError> {
        match &self.adjacency {
            Some(map) => Ok(Board::from_labels(map)?),
            None => Ok(Board::new(self.topology)),
        }
    }
}

/// Top-level solver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub board: BoardConfig,
    pub rules: Rules,
    /// Where the solved tablebase is written and read.
    pub tablebase: PathBuf,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            board: BoardConfig::default(),
            rules: Rules::default(),
            tablebase: PathBuf::from("data/tablebase.bin"),
        }
    }
}

impl SolverConfig {
    /// Parse from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: SolverConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values. A bad board graph is fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tablebase.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                message: "tablebase path is empty".into(),
            });
        }
        self.board.build()?;
        Ok(())
    }
}
