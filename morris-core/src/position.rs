//! Position value type and the anti-oscillation annotation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Cell, CellSet};
use crate::Side;

/// A single stone slide.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Step {
    pub from: Cell,
    pub to: Cell,
}

impl Step {
    #[inline]
    pub fn new(from: Cell, to: Cell) -> Step {
        Step { from, to }
    }

    /// The slide that undoes this one.
    #[inline]
    pub fn reversed(self) -> Step {
        Step {
            from: self.to,
            to: self.from,
        }
    }

    /// Pack into one byte: `from << 4 | to`.
    #[inline]
    pub fn to_byte(self) -> u8 {
        (self.from.index() << 4) | self.to.index()
    }

    pub fn from_byte(byte: u8) -> Option<Step> {
        Some(Step {
            from: Cell::from_index(byte >> 4)?,
            to: Cell::from_index(byte & 0x0F)?,
        })
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// Rule variant.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Forbid a side from immediately undoing its own previous slide. When
    /// off, positions carry no ban fields.
    pub anti_oscillation: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            anti_oscillation: true,
        }
    }
}

/// A game position. Stones are bitmasks, so equal positions always compare
/// and hash identically.
///
/// A ban is the slide that side may not play on its next turn: the reverse of
/// its most recent slide. It belongs to the position so that the move graph
/// is a pure function of its nodes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct Position {
    pub red: CellSet,
    pub black: CellSet,
    pub red_ban: Option<Step>,
    pub black_ban: Option<Step>,
}

impl Position {
    /// Position without bans.
    pub fn new(red: CellSet, black: CellSet) -> Position {
        Position {
            red,
            black,
            red_ban: None,
            black_ban: None,
        }
    }

    /// Starting position: Red on row A, Black on row C, no bans.
    pub fn start() -> Position {
        let (red, black) = Board::start_cells();
        Position::new(red, black)
    }

    /// Stones of one side.
    #[inline]
    pub fn stones(&self, side: Side) -> CellSet {
        match side {
            Side::Red => self.red,
            Side::Black => self.black,
        }
    }

    /// Ban of one side.
    #[inline]
    pub fn ban(&self, side: Side) -> Option<Step> {
        match side {
            Side::Red => self.red_ban,
            Side::Black => self.black_ban,
        }
    }

    /// All occupied cells.
    #[inline]
    pub fn occupied(&self) -> CellSet {
        self.red.union(self.black)
    }

    /// Three stones each, no overlap.
    pub fn is_valid_layout(&self) -> bool {
        self.red.len() == 3 && self.black.len() == 3 && self.red.is_disjoint(self.black)
    }

    /// The side holding a mill, if any.
    pub fn mill_owner(&self) -> Option<Side> {
        Side::ALL
            .into_iter()
            .find(|&side| Board::has_mill(self.stones(side), side))
    }

    /// Position after `side` slides `step`: the mover's ban becomes the
    /// reverse slide, the opponent's ban is untouched.
    ///
    /// Legality is the caller's concern.
    pub fn after(&self, side: Side, step: Step, rules: Rules) -> Position {
        let moved = self.stones(side).without(step.from).with(step.to);
        let ban = rules.anti_oscillation.then(|| step.reversed());
        let mut next = *self;
        match side {
            Side::Red => {
                next.red = moved;
                next.red_ban = ban;
            }
            Side::Black => {
                next.black = moved;
                next.black_ban = ban;
            }
        }
        next
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Red={} Black={}", self.red, self.black)?;
        if let Some(ban) = self.red_ban {
            write!(f, " R-ban={ban}")?;
        }
        if let Some(ban) = self.black_ban {
            write!(f, " B-ban={ban}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_byte_roundtrip() {
        for from in Cell::ALL {
            for to in Cell::ALL {
                let step = Step::new(from, to);
                assert_eq!(Step::from_byte(step.to_byte()), Some(step));
            }
        }
        assert_eq!(Step::from_byte(0xFF), None);
    }

    #[test]
    fn test_start_position() {
        let pos = Position::start();
        assert!(pos.is_valid_layout());
        assert_eq!(pos.mill_owner(), None);
        assert_eq!(pos.to_string(), "Red=(A1, A2, A3) Black=(C1, C2, C3)");
    }

    #[test]
    fn test_after_sets_only_mover_ban() {
        let pos = Position {
            black_ban: Some(Step::new(Cell::C2, Cell::B3)),
            ..Position::start()
        };
        let next = pos.after(Side::Red, Step::new(Cell::A1, Cell::B1), Rules::default());
        assert_eq!(
            next.red,
            CellSet::from_cells(&[Cell::A2, Cell::A3, Cell::B1])
        );
        assert_eq!(next.black, pos.black);
        assert_eq!(next.red_ban, Some(Step::new(Cell::B1, Cell::A1)));
        assert_eq!(next.black_ban, pos.black_ban);
    }

    #[test]
    fn test_after_without_anti_oscillation() {
        let rules = Rules {
            anti_oscillation: false,
        };
        let next = Position::start().after(Side::Black, Step::new(Cell::C2, Cell::B2), rules);
        assert_eq!(next.black_ban, None);
        assert!(next.black.contains(Cell::B2));
    }

    #[test]
    fn test_mill_owner() {
        let pos = Position::new(
            CellSet::from_cells(&[Cell::A1, Cell::B2, Cell::C3]),
            CellSet::from_cells(&[Cell::A2, Cell::A3, Cell::B1]),
        );
        assert_eq!(pos.mill_owner(), Some(Side::Red));
    }
}
