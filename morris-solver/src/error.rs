//! Solver error types.

use std::path::PathBuf;

use derive_more::{Display, Error};
use morris_core::{BoardError, PositionIndex};

/// Errors reading or writing a tablebase file.
#[derive(Debug, Display, Error)]
pub enum CheckpointError {
    #[display("I/O error: {source}")]
    Io { source: std::io::Error },

    #[display("invalid tablebase magic")]
    BadMagic,

    #[display("unsupported tablebase version: {version}")]
    UnsupportedVersion { version: u32 },

    #[display("tablebase checksum mismatch (stored {stored:#018x}, computed {computed:#018x})")]
    ChecksumMismatch { stored: u64, computed: u64 },

    #[display("corrupt record {index}: {reason}")]
    CorruptRecord {
        index: PositionIndex,
        reason: &'static str,
    },

    #[display("header declares {count} entries but the file holds {bytes} body bytes")]
    LengthMismatch { count: u64, bytes: u64 },

    #[display("position {index} appears twice")]
    DuplicatePosition { index: PositionIndex },

    #[display("position {index} carries a ban its rules never produce")]
    InadmissibleBan { index: PositionIndex },

    #[display("stored statuses are not a solved fixed point")]
    InconsistentStatus,

    #[display("stored board is invalid: {source}")]
    Board { source: BoardError },
}

impl From<std::io::Error> for CheckpointError {
    fn from(source: std::io::Error) -> Self {
        CheckpointError::Io { source }
    }
}

impl From<BoardError> for CheckpointError {
    fn from(source: BoardError) -> Self {
        CheckpointError::Board { source }
    }
}

/// Errors loading solver configuration.
#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[display("failed to parse TOML: {source}")]
    TomlParse { source: toml::de::Error },

    #[display("invalid board: {source}")]
    Board { source: BoardError },

    #[display("config validation error: {message}")]
    Validation { message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(source: toml::de::Error) -> Self {
        ConfigError::TomlParse { source }
    }
}

impl From<BoardError> for ConfigError {
    fn from(source: BoardError) -> Self {
        ConfigError::Board { source }
    }
}
