//! Solved tablebase: the immutable handle every consumer queries.
//!
//! `Tablebase::build` runs the whole pipeline (enumerate, build the move
//! graph, solve). `Tablebase::from_checkpoint` restores the same answers from
//! a saved file without enumerating or solving again.

use std::time::Instant;

use morris_core::{Board, Catalog, Position, PositionIndex, Rules, Side, Step};
use tracing::{info, instrument};

use crate::checkpoint::Checkpoint;
use crate::error::CheckpointError;
use crate::graph::TransitionGraph;
use crate::movegen::successors;
use crate::solver::{verify, Solver, Status, StatusTable};
use crate::stats::SolverStats;

/// Successors of a position, grouped by the opponent's status there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveOutcomes {
    /// Opponent loses: moves that keep or achieve a forced win
    pub winning: Vec<PositionIndex>,
    /// Opponent wins
    pub losing: Vec<PositionIndex>,
    /// Opponent's outcome undetermined
    pub undecided: Vec<PositionIndex>,
}

impl MoveOutcomes {
    pub fn len(&self) -> usize {
        self.winning.len() + self.losing.len() + self.undecided.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// WIN / LOSS / UNKNOWN counts for one side to move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideSummary {
    pub wins: usize,
    pub losses: usize,
    pub unknown: usize,
}

/// Counts for both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub red: SideSummary,
    pub black: SideSummary,
}

impl Summary {
    pub fn side(&self, side: Side) -> SideSummary {
        match side {
            Side::Red => self.red,
            Side::Black => self.black,
        }
    }
}

/// Catalog, move graph and solved statuses for one board and rule set.
#[derive(Debug, Clone)]
pub struct Tablebase {
    board: Board,
    catalog: Catalog,
    graph: TransitionGraph,
    status: StatusTable,
}

impl Tablebase {
    /// Enumerate, build the graph and solve.
    #[instrument(skip(board))]
    pub fn build(board: Board, rules: Rules) -> Self {
        Self::build_with_stats(board, rules).0
    }

    /// Like `build`, also returning solver statistics.
    pub fn build_with_stats(board: Board, rules: Rules) -> (Self, SolverStats) {
        let start = Instant::now();
        let catalog = Catalog::build(&board, rules);
        let graph = TransitionGraph::build(&board, &catalog);
        let (status, stats) = Solver::new(&catalog, &graph).solve();

        let tablebase = Self {
            board,
            catalog,
            graph,
            status,
        };
        info!(
            positions = tablebase.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tablebase ready"
        );
        (tablebase, stats)
    }

    /// Restore from a saved file. The move graph is regenerated from the
    /// stored board, then every ban and status is checked against it.
    #[instrument(skip_all, fields(entries = checkpoint.positions.len()))]
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Result<Self, CheckpointError> {
        let (board, catalog) = checkpoint.catalog()?;
        for (i, position) in catalog.positions().iter().enumerate() {
            let admissible = Side::ALL.into_iter().all(|side| {
                Catalog::ban_options(&board, position.stones(side), catalog.rules())
                    .contains(&position.ban(side))
            });
            if !admissible {
                return Err(CheckpointError::InadmissibleBan {
                    index: i as PositionIndex,
                });
            }
        }

        let graph = TransitionGraph::build(&board, &catalog);
        if !verify(&catalog, &graph, &checkpoint.status) {
            return Err(CheckpointError::InconsistentStatus);
        }
        Ok(Self {
            board,
            catalog,
            graph,
            status: checkpoint.status,
        })
    }

    /// Write to a tablebase file.
    pub fn save(&self, path: &std::path::Path) -> Result<usize, CheckpointError> {
        Checkpoint::save(path, &self.board, &self.catalog, &self.status)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn graph(&self) -> &TransitionGraph {
        &self.graph
    }

    pub fn statuses(&self) -> &StatusTable {
        &self.status
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    // ========== Catalog ==========

    pub fn position(&self, idx: PositionIndex) -> Option<&Position> {
        self.catalog.position(idx)
    }

    pub fn index_of(&self, position: &Position) -> Option<PositionIndex> {
        self.catalog.index_of(position)
    }

    /// Index of the starting position (no bans).
    pub fn start_index(&self) -> Option<PositionIndex> {
        self.catalog.index_of(&Position::start())
    }

    // ========== Queries ==========

    /// Game value of `idx` with `side` to move.
    pub fn status_of(&self, idx: PositionIndex, side: Side) -> Option<Status> {
        self.status.get(side, idx)
    }

    /// Successors for `side`, grouped by the opponent's status in each.
    pub fn moves_of(&self, idx: PositionIndex, side: Side) -> Option<MoveOutcomes> {
        self.catalog.position(idx)?;
        let opponent = side.opponent();
        let mut outcomes = MoveOutcomes::default();
        for &next in self.graph.outgoing(side, idx) {
            match self.status.get(opponent, next).unwrap_or_default() {
                Status::Loss => outcomes.winning.push(next),
                Status::Win => outcomes.losing.push(next),
                Status::Unknown => outcomes.undecided.push(next),
            }
        }
        Some(outcomes)
    }

    /// Positions from which `side`, moving, reaches `idx`.
    pub fn predecessors_of(&self, idx: PositionIndex, side: Side) -> &[PositionIndex] {
        self.graph.predecessors(side, idx)
    }

    /// Moves that preserve a forced win. Empty unless `idx` is a WIN for
    /// `side`.
    pub fn winning_moves(&self, idx: PositionIndex, side: Side) -> Vec<PositionIndex> {
        if self.status_of(idx, side) != Some(Status::Win) {
            return Vec::new();
        }
        self.moves_of(idx, side)
            .map(|outcomes| outcomes.winning)
            .unwrap_or_default()
    }

    /// Slides for `side` that do not hand the opponent a forced win, with the
    /// resulting index.
    pub fn safe_steps(&self, idx: PositionIndex, side: Side) -> Vec<(Step, PositionIndex)> {
        let Some(position) = self.catalog.position(idx) else {
            return Vec::new();
        };
        let opponent = side.opponent();
        successors(&self.board, &self.catalog, position, side)
            .into_iter()
            .filter(|&(_, next)| self.status.get(opponent, next) != Some(Status::Win))
            .collect()
    }

    /// WIN / LOSS / UNKNOWN counts per side to move.
    pub fn summary(&self) -> Summary {
        let count = |side: Side| {
            let mut s = SideSummary::default();
            for status in self.status.side(side) {
                match status {
                    Status::Win => s.wins += 1,
                    Status::Loss => s.losses += 1,
                    Status::Unknown => s.unknown += 1,
                }
            }
            s
        };
        Summary {
            red: count(Side::Red),
            black: count(Side::Black),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morris_core::{Cell, CellSet};
    use std::sync::OnceLock;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("morris_tb_{}_{}.bin", name, std::process::id()))
    }

    fn tablebase() -> &'static Tablebase {
        static TB: OnceLock<Tablebase> = OnceLock::new();
        TB.get_or_init(|| Tablebase::build(Board::default(), Rules::default()))
    }

    #[test]
    fn test_summary_covers_every_position() {
        let tb = tablebase();
        let summary = tb.summary();
        for side in Side::ALL {
            let s = summary.side(side);
            assert_eq!(s.wins + s.losses + s.unknown, tb.len());
            assert!(s.wins > 0);
            assert!(s.losses > 0);
        }
    }

    #[test]
    fn test_moves_of_partitions_outgoing() {
        let tb = tablebase();
        let start = tb.start_index().unwrap();
        for side in Side::ALL {
            let outcomes = tb.moves_of(start, side).unwrap();
            assert_eq!(outcomes.len(), tb.graph().out_degree(side, start));
            for &next in &outcomes.winning {
                assert_eq!(tb.status_of(next, side.opponent()), Some(Status::Loss));
            }
            for &next in &outcomes.losing {
                assert_eq!(tb.status_of(next, side.opponent()), Some(Status::Win));
            }
        }
    }

    #[test]
    fn test_winning_moves_only_for_wins() {
        let tb = tablebase();
        for idx in 0..tb.len() as PositionIndex {
            for side in Side::ALL {
                let moves = tb.winning_moves(idx, side);
                match tb.status_of(idx, side) {
                    Some(Status::Win) => {
                        if tb.position(idx).unwrap().mill_owner().is_none() {
                            assert!(!moves.is_empty());
                        }
                    }
                    _ => assert!(moves.is_empty()),
                }
            }
        }
    }

    #[test]
    fn test_safe_steps_exclude_opponent_wins() {
        let tb = tablebase();
        let idx = tb.start_index().unwrap();
        let safe = tb.safe_steps(idx, Side::Black);
        let outcomes = tb.moves_of(idx, Side::Black).unwrap();
        assert_eq!(safe.len(), outcomes.winning.len() + outcomes.undecided.len());
        for (step, next) in safe {
            let pos = tb.position(next).unwrap();
            assert!(pos.black.contains(step.to));
            assert_ne!(tb.status_of(next, Side::Red), Some(Status::Win));
        }
    }

    #[test]
    fn test_predecessors_of_matches_graph() {
        let tb = tablebase();
        let pos = Position {
            red_ban: Some(Step::new(Cell::B1, Cell::A1)),
            ..Position::new(
                CellSet::from_cells(&[Cell::A2, Cell::A3, Cell::B1]),
                CellSet::from_cells(&[Cell::C1, Cell::C2, Cell::C3]),
            )
        };
        let idx = tb.index_of(&pos).unwrap();
        let start = tb.start_index().unwrap();
        assert!(tb.predecessors_of(idx, Side::Red).contains(&start));
        assert!(tb
            .predecessors_of(idx, Side::Black)
            .iter()
            .all(|&p| tb.graph().outgoing(Side::Black, p).contains(&idx)));
    }

    #[test]
    fn test_out_of_range_queries() {
        let tb = tablebase();
        let past_end = tb.len() as PositionIndex;
        assert_eq!(tb.status_of(past_end, Side::Red), None);
        assert_eq!(tb.moves_of(past_end, Side::Red), None);
        assert!(tb.predecessors_of(past_end, Side::Black).is_empty());
        assert!(tb.winning_moves(past_end, Side::Red).is_empty());
        assert!(tb.safe_steps(past_end, Side::Red).is_empty());
    }

    #[test]
    fn test_restore_rejects_unsolved_statuses() {
        let tb = tablebase();
        let path = temp_path("unsolved");
        let unsolved = StatusTable::unknown(tb.len());
        Checkpoint::save(&path, tb.board(), tb.catalog(), &unsolved).unwrap();

        let restored = Tablebase::from_checkpoint(Checkpoint::load(&path).unwrap());
        std::fs::remove_file(&path).ok();
        assert!(matches!(restored, Err(CheckpointError::InconsistentStatus)));
    }

    #[test]
    fn test_restore_rejects_flipped_mill_status() {
        let tb = tablebase();
        let mut checkpoint = Checkpoint {
            rules: tb.catalog().rules(),
            adjacency: tb.board().masks(),
            positions: tb.catalog().positions().to_vec(),
            status: tb.statuses().clone(),
        };
        let mill = tb
            .catalog()
            .find(&[Cell::B1, Cell::B2, Cell::B3], &[Cell::C1, Cell::C2, Cell::A3], None, None)
            .unwrap();
        let red = tb.statuses().side(Side::Red).to_vec();
        let mut black = tb.statuses().side(Side::Black).to_vec();
        black[mill as usize] = Status::Unknown;
        checkpoint.status = StatusTable::from_arrays(red, black).unwrap();

        assert!(matches!(
            Tablebase::from_checkpoint(checkpoint),
            Err(CheckpointError::InconsistentStatus)
        ));
    }

    #[test]
    fn test_restore_rejects_inadmissible_ban() {
        let tb = tablebase();
        let mut positions = tb.catalog().positions().to_vec();
        let start = tb.start_index().unwrap() as usize;
        // C1 cannot be reached from row A in one slide.
        positions[start].red_ban = Some(Step::new(Cell::A1, Cell::C1));
        let checkpoint = Checkpoint {
            rules: tb.catalog().rules(),
            adjacency: tb.board().masks(),
            positions,
            status: tb.statuses().clone(),
        };
        assert!(matches!(
            Tablebase::from_checkpoint(checkpoint),
            Err(CheckpointError::InadmissibleBan { .. })
        ));
    }

    #[test]
    fn test_restore_accepts_solved_table() {
        let tb = tablebase();
        let path = temp_path("solved");
        tb.save(&path).unwrap();
        let restored = Tablebase::from_checkpoint(Checkpoint::load(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(restored.statuses(), tb.statuses());
    }
}
