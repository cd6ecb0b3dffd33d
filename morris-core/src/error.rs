//! Board configuration errors.

use derive_more::{Display, Error};

use crate::board::Cell;

/// A malformed board description. Fatal: the whole state space depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// A cell label outside A1..C3.
    #[display("unknown cell label {label:?}")]
    UnknownCell { label: String },

    /// A cell index outside 0..9.
    #[display("cell index {index} out of range")]
    CellOutOfRange { index: u8 },

    /// A side label other than red/black.
    #[display("unknown side {label:?}")]
    UnknownSide { label: String },

    /// A cell listed as its own neighbour.
    #[display("cell {cell} is listed as adjacent to itself")]
    SelfLoop { cell: Cell },

    /// An edge present in one direction only.
    #[display("adjacency is not symmetric: {from} -> {to} has no reverse edge")]
    Asymmetric { from: Cell, to: Cell },
}
