//! Lazy move generator.
//!
//! Produces one slide at a time, tracking its cursor so it can resume where it
//! left off. Order is deterministic: source cells ascending, then destination
//! cells ascending among the source's neighbours.

use morris_core::{Board, Catalog, Cell, CellSet, Position, PositionIndex, Side, Step};

/// Lazy generator of the slides available to one side.
pub struct MoveGenerator {
    /// Stones of the moving side
    stones: CellSet,
    /// Cells held by either side
    occupied: CellSet,
    /// Slide the mover may not play this turn
    ban: Option<Step>,
    /// Current source cell index
    from_idx: u8,
    /// Current destination cell index
    to_idx: u8,
}

impl MoveGenerator {
    /// Create a generator for `side` moving in `position`.
    pub fn new(position: &Position, side: Side) -> Self {
        Self {
            stones: position.stones(side),
            occupied: position.occupied(),
            ban: position.ban(side),
            from_idx: 0,
            to_idx: 0,
        }
    }

    /// Get the next legal slide, or None if exhausted.
    pub fn next(&mut self, board: &Board) -> Option<Step> {
        while let Some(from) = Cell::from_index(self.from_idx) {
            if self.stones.contains(from) {
                let neighbours = board.neighbors(from);
                while let Some(to) = Cell::from_index(self.to_idx) {
                    self.to_idx += 1;

                    if !neighbours.contains(to) || self.occupied.contains(to) {
                        continue;
                    }

                    let step = Step::new(from, to);
                    if self.ban == Some(step) {
                        continue;
                    }
                    return Some(step);
                }
            }

            // Done with this source cell
            self.from_idx += 1;
            self.to_idx = 0;
        }
        None
    }
}

/// Every legal slide for `side`, paired with the index of the resulting
/// position. Slides whose result is not catalogued (a mill on both sides) are
/// dropped.
pub fn successors(
    board: &Board,
    catalog: &Catalog,
    position: &Position,
    side: Side,
) -> Vec<(Step, PositionIndex)> {
    let rules = catalog.rules();
    let mut out = Vec::new();
    let mut gen = MoveGenerator::new(position, side);
    while let Some(step) = gen.next(board) {
        let next = position.after(side, step, rules);
        if let Some(idx) = catalog.index_of(&next) {
            out.push((step, idx));
        }
    }
    out
}

/// Indices reachable by one slide of `side`.
pub fn moves_for(board: &Board, catalog: &Catalog, position: &Position, side: Side) -> Vec<PositionIndex> {
    successors(board, catalog, position, side)
        .into_iter()
        .map(|(_, idx)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use morris_core::{Rules, Topology};

    fn all_steps(board: &Board, position: &Position, side: Side) -> Vec<Step> {
        let mut steps = Vec::new();
        let mut gen = MoveGenerator::new(position, side);
        while let Some(step) = gen.next(board) {
            steps.push(step);
        }
        steps
    }

    #[test]
    fn test_start_position_moves() {
        let board = Board::default();
        let pos = Position::start();
        assert_eq!(
            all_steps(&board, &pos, Side::Red),
            vec![
                Step::new(Cell::A1, Cell::B1),
                Step::new(Cell::A1, Cell::B2),
                Step::new(Cell::A2, Cell::B2),
                Step::new(Cell::A3, Cell::B2),
                Step::new(Cell::A3, Cell::B3),
            ]
        );
        assert_eq!(all_steps(&board, &pos, Side::Black).len(), 5);
    }

    #[test]
    fn test_dense_start_position_moves() {
        let board = Board::new(Topology::Dense);
        // A2 also reaches B1 and B3.
        assert_eq!(all_steps(&board, &Position::start(), Side::Red).len(), 7);
    }

    #[test]
    fn test_ban_is_skipped() {
        let board = Board::default();
        let pos = Position {
            red_ban: Some(Step::new(Cell::A2, Cell::B2)),
            ..Position::start()
        };
        let steps = all_steps(&board, &pos, Side::Red);
        assert_eq!(steps.len(), 4);
        assert!(!steps.contains(&Step::new(Cell::A2, Cell::B2)));
        // Black's slides are unaffected by Red's ban.
        assert_eq!(all_steps(&board, &pos, Side::Black).len(), 5);
    }

    #[test]
    fn test_successors_set_mover_ban() {
        let board = Board::default();
        let catalog = Catalog::build(&board, Rules::default());
        let start = Position::start();
        let succ = successors(&board, &catalog, &start, Side::Red);
        assert_eq!(succ.len(), 5);
        for (step, idx) in succ {
            let next = catalog.position(idx).unwrap();
            assert_eq!(next.red_ban, Some(step.reversed()));
            assert_eq!(next.black_ban, None);
            assert_eq!(next.black, start.black);
        }
    }

    #[test]
    fn test_blocked_side_has_no_moves() {
        let board = Board::default();
        let catalog = Catalog::build(&board, Rules::default());
        // A1 is boxed in; A3 and C1 each keep one exit.
        let pos = Position::new(
            CellSet::from_cells(&[Cell::A1, Cell::A3, Cell::C1]),
            CellSet::from_cells(&[Cell::A2, Cell::B1, Cell::B2]),
        );
        assert_eq!(moves_for(&board, &catalog, &pos, Side::Red).len(), 2);

        let pos = Position::new(
            CellSet::from_cells(&[Cell::A1, Cell::A2, Cell::B1]),
            CellSet::from_cells(&[Cell::A3, Cell::B2, Cell::C1]),
        );
        assert!(moves_for(&board, &catalog, &pos, Side::Red).is_empty());
    }

    #[test]
    fn test_double_mill_successor_is_dropped() {
        let board = Board::default();
        let catalog = Catalog::build(&board, Rules::default());
        // Black holds column 1; Red completing column 3 would be a double mill.
        let pos = Position::new(
            CellSet::from_cells(&[Cell::A3, Cell::B3, Cell::C2]),
            CellSet::from_cells(&[Cell::A1, Cell::B1, Cell::C1]),
        );
        let steps = all_steps(&board, &pos, Side::Red);
        assert!(steps.contains(&Step::new(Cell::C2, Cell::C3)));
        let succ = successors(&board, &catalog, &pos, Side::Red);
        assert!(succ.iter().all(|(step, _)| *step != Step::new(Cell::C2, Cell::C3)));
        assert_eq!(succ.len(), steps.len() - 1);
    }
}
