//! Position catalog: every legal position with a dense, stable index.
//!
//! Enumeration order:
//! 1. Red's three cells, lexicographic over cell indices (84 sets)
//! 2. Black's three cells from the remaining six, lexicographic (20 sets)
//! 3. Red's ban options, then Black's ban options (None first)
//!
//! Layouts where both sides hold a mill are skipped. The catalog is built
//! once and never mutated.

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use crate::board::{Board, Cell, CellSet};
use crate::position::{Position, Rules, Step};
use crate::Side;

/// Dense 0-based index into the catalog.
pub type PositionIndex = u32;

/// Index <-> position tables.
#[derive(Debug, Clone)]
pub struct Catalog {
    positions: Vec<Position>,
    index: HashMap<Position, PositionIndex>,
    rules: Rules,
}

/// All three-cell subsets of `cells`, lexicographic.
fn triples(cells: &[Cell]) -> Vec<CellSet> {
    let mut out = Vec::new();
    for i in 0..cells.len() {
        for j in i + 1..cells.len() {
            for k in j + 1..cells.len() {
                out.push(CellSet::from_cells(&[cells[i], cells[j], cells[k]]));
            }
        }
    }
    out
}

impl Catalog {
    /// Enumerate every legal position for the given board and rules.
    #[instrument(skip(board))]
    pub fn build(board: &Board, rules: Rules) -> Catalog {
        let mut positions = Vec::new();
        let mut layouts = 0usize;
        let mut double_mills = 0usize;

        for red in triples(&Cell::ALL) {
            let remaining: Vec<Cell> = Cell::ALL.into_iter().filter(|c| !red.contains(*c)).collect();
            for black in triples(&remaining) {
                if Board::has_mill(red, Side::Red) && Board::has_mill(black, Side::Black) {
                    double_mills += 1;
                    continue;
                }
                layouts += 1;

                let red_bans = Self::ban_options(board, red, rules);
                let black_bans = Self::ban_options(board, black, rules);
                for &red_ban in &red_bans {
                    for &black_ban in &black_bans {
                        positions.push(Position {
                            red,
                            black,
                            red_ban,
                            black_ban,
                        });
                    }
                }
            }
        }

        debug!(double_mills, "Skipped layouts with a mill on both sides");
        info!(positions = positions.len(), layouts, "Enumerated position catalog");

        Self::index_positions(positions, rules)
    }

    /// Bans a side can carry with these stones: none, or any slide from one of
    /// its stones to a neighbour it does not itself occupy. The neighbour may
    /// hold an opponent stone, since the opponent can step into a cell the
    /// side just vacated.
    pub fn ban_options(board: &Board, stones: CellSet, rules: Rules) -> Vec<Option<Step>> {
        let mut options = vec![None];
        if !rules.anti_oscillation {
            return options;
        }
        for stone in stones.iter() {
            for neighbour in board.neighbors(stone).iter() {
                if !stones.contains(neighbour) {
                    options.push(Some(Step::new(stone, neighbour)));
                }
            }
        }
        options
    }

    /// Rebuild a catalog from an index-ordered position table.
    ///
    /// Returns the first duplicated index on failure.
    pub fn from_positions(positions: Vec<Position>, rules: Rules) -> Result<Catalog, PositionIndex> {
        let mut index = HashMap::with_capacity(positions.len());
        for (i, pos) in positions.iter().enumerate() {
            if index.insert(*pos, i as PositionIndex).is_some() {
                return Err(i as PositionIndex);
            }
        }
        Ok(Catalog {
            positions,
            index,
            rules,
        })
    }

    fn index_positions(positions: Vec<Position>, rules: Rules) -> Catalog {
        let index = positions
            .iter()
            .enumerate()
            .map(|(i, pos)| (*pos, i as PositionIndex))
            .collect();
        Catalog {
            positions,
            index,
            rules,
        }
    }

    /// Rules this catalog was enumerated under.
    #[inline]
    pub fn rules(&self) -> Rules {
        self.rules
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position at an index.
    #[inline]
    pub fn position(&self, idx: PositionIndex) -> Option<&Position> {
        self.positions.get(idx as usize)
    }

    /// All positions in index order.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Index of a position, or None if it is not catalogued.
    #[inline]
    pub fn index_of(&self, pos: &Position) -> Option<PositionIndex> {
        self.index.get(pos).copied()
    }

    /// Look up by unordered cell lists. Returns None for anything that is not
    /// a catalogued position (wrong stone counts, overlaps, double mills,
    /// inadmissible bans).
    pub fn find(
        &self,
        red: &[Cell],
        black: &[Cell],
        red_ban: Option<Step>,
        black_ban: Option<Step>,
    ) -> Option<PositionIndex> {
        let pos = Position {
            red: CellSet::from_cells(red),
            black: CellSet::from_cells(black),
            red_ban,
            black_ban,
        };
        if red.len() != 3 || black.len() != 3 || !pos.is_valid_layout() {
            return None;
        }
        self.index_of(&pos)
    }

    /// Number of distinct (red, black) cell layouts.
    pub fn layout_count(&self) -> usize {
        let mut count = 0;
        let mut last = None;
        // Positions of one layout are contiguous.
        for pos in &self.positions {
            let layout = (pos.red, pos.black);
            if last != Some(layout) {
                count += 1;
                last = Some(layout);
            }
        }
        count
    }
}
