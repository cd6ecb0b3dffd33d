//! Retrograde solver for the three-stone sliding mill game.
//!
//! Pipeline, leaf-first:
//!
//! ```text
//! Board -> Catalog -> MoveGenerator -> TransitionGraph -> Solver -> Tablebase
//! ```
//!
//! Everything runs once, single-threaded, and produces immutable tables.
//! `Tablebase` is the read-only query surface over the result.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod graph;
pub mod movegen;
pub mod solver;
pub mod stats;
pub mod tablebase;

pub use checkpoint::Checkpoint;
pub use config::{BoardConfig, SolverConfig};
pub use error::{CheckpointError, ConfigError};
pub use graph::TransitionGraph;
pub use solver::{Solver, Status, StatusTable};
pub use stats::SolverStats;
pub use tablebase::{MoveOutcomes, SideSummary, Summary, Tablebase};
