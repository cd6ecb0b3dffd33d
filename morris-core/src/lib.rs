//! Game logic for a two-player, three-stone sliding mill game on a 3x3 board.
//!
//! # Board Layout
//!
//! ```text
//!   A1 A2 A3      0 1 2
//!   B1 B2 B3      3 4 5
//!   C1 C2 C3      6 7 8
//! ```
//!
//! Each side owns exactly three stones and moves one of them per turn to an
//! adjacent empty cell. Three stones on a winning line form a mill and win the
//! game, except for the side's own starting row (row A for Red, row C for
//! Black), which never counts.
//!
//! # Stone Encoding (9-bit)
//!
//! ```text
//! Bit i set <=> the cell with index i is occupied (A1 = bit 0 ... C3 = bit 8)
//! ```
//!
//! Because a set is stored as a bitmask, iteration is always ascending, so
//! every position is canonical by construction.

pub mod board;
pub mod catalog;
pub mod error;
pub mod position;

pub use board::{Board, Cell, CellSet, Topology, WIN_LINES};
pub use catalog::{Catalog, PositionIndex};
pub use error::BoardError;
pub use position::{Position, Rules, Step};

use serde::{Deserialize, Serialize};

/// Side identifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    Red = 0,
    Black = 1,
}

impl Side {
    /// Both sides, Red first.
    pub const ALL: [Side; 2] = [Side::Red, Side::Black];

    /// Get the opposing side.
    #[inline]
    pub fn opponent(self) -> Side {
        match self {
            Side::Red => Side::Black,
            Side::Black => Side::Red,
        }
    }

    /// Dense index (0 for Red, 1 for Black) for per-side tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The winning line this side starts on, which never counts as a mill.
    #[inline]
    pub fn starting_line(self) -> CellSet {
        match self {
            Side::Red => CellSet::from_cells(&[Cell::A1, Cell::A2, Cell::A3]),
            Side::Black => CellSet::from_cells(&[Cell::C1, Cell::C2, Cell::C3]),
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Red => f.write_str("Red"),
            Side::Black => f.write_str("Black"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" | "r" => Ok(Side::Red),
            "black" | "b" => Ok(Side::Black),
            _ => Err(BoardError::UnknownSide {
                label: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::Red.opponent(), Side::Black);
        assert_eq!(Side::Black.opponent(), Side::Red);
    }

    #[test]
    fn test_side_index() {
        assert_eq!(Side::Red.index(), 0);
        assert_eq!(Side::Black.index(), 1);
    }

    #[test]
    fn test_side_parse() {
        assert_eq!("red".parse::<Side>().unwrap(), Side::Red);
        assert_eq!("Black".parse::<Side>().unwrap(), Side::Black);
        assert_eq!("B".parse::<Side>().unwrap(), Side::Black);
        assert!("green".parse::<Side>().is_err());
    }

    #[test]
    fn test_starting_lines() {
        assert_eq!(
            Side::Red.starting_line().iter().collect::<Vec<_>>(),
            vec![Cell::A1, Cell::A2, Cell::A3]
        );
        assert_eq!(
            Side::Black.starting_line().iter().collect::<Vec<_>>(),
            vec![Cell::C1, Cell::C2, Cell::C3]
        );
    }
}
