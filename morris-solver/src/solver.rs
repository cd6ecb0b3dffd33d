//! Retrograde solver.
//!
//! Seeds terminal positions (a mill on the board, or no legal slide for the
//! side to move), then walks the reverse move graph with a FIFO worklist:
//!
//! - a LOSS for the mover makes every predecessor a WIN for the opponent
//! - a WIN for the mover removes one option from each predecessor; a
//!   predecessor whose options are all gone becomes a LOSS for the opponent
//!
//! Statuses are written once. Whatever is still UNKNOWN at the fixed point is
//! a draw under perfect play.

use std::collections::VecDeque;
use std::time::Instant;

use morris_core::{Catalog, PositionIndex, Side};
use tracing::{debug, instrument};

use crate::graph::TransitionGraph;
use crate::stats::SolverStats;

/// Game value for the side to move.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
#[repr(i8)]
pub enum Status {
    Win = 1,
    #[default]
    Unknown = 0,
    Loss = -1,
}

impl Status {
    /// Convert from i8 (1, 0 or -1).
    #[inline]
    pub fn from_i8(value: i8) -> Option<Status> {
        match value {
            1 => Some(Status::Win),
            0 => Some(Status::Unknown),
            -1 => Some(Status::Loss),
            _ => None,
        }
    }

    #[inline]
    pub fn to_i8(self) -> i8 {
        self as i8
    }

    #[inline]
    pub fn is_resolved(self) -> bool {
        self != Status::Unknown
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Win => f.write_str("WIN"),
            Status::Unknown => f.write_str("UNKNOWN"),
            Status::Loss => f.write_str("LOSS"),
        }
    }
}

/// Solved status per side, indexed by catalog index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTable {
    status: [Vec<Status>; 2],
}

impl StatusTable {
    /// All positions unknown.
    pub fn unknown(len: usize) -> Self {
        Self {
            status: [vec![Status::Unknown; len], vec![Status::Unknown; len]],
        }
    }

    /// Build from stored per-side arrays. Returns None if the lengths differ.
    pub fn from_arrays(red: Vec<Status>, black: Vec<Status>) -> Option<Self> {
        if red.len() != black.len() {
            return None;
        }
        Some(Self {
            status: [red, black],
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.status[0].len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Status of `idx` with `side` to move.
    #[inline]
    pub fn get(&self, side: Side, idx: PositionIndex) -> Option<Status> {
        self.status[side.index()].get(idx as usize).copied()
    }

    /// The full array for one side.
    pub fn side(&self, side: Side) -> &[Status] {
        &self.status[side.index()]
    }

    /// Set an unresolved entry. Returns false if it was already resolved.
    #[inline]
    fn resolve(&mut self, side: Side, idx: PositionIndex, status: Status) -> bool {
        let slot = &mut self.status[side.index()][idx as usize];
        if slot.is_resolved() {
            return false;
        }
        *slot = status;
        true
    }
}

/// Retrograde solver over a fixed catalog and transition graph.
pub struct Solver<'a> {
    catalog: &'a Catalog,
    graph: &'a TransitionGraph,
    status: StatusTable,
    /// Unrefuted options left per (side, index)
    remaining: [Vec<u32>; 2],
    queue: VecDeque<(PositionIndex, Side)>,
    /// Solver statistics
    pub stats: SolverStats,
}

impl<'a> Solver<'a> {
    pub fn new(catalog: &'a Catalog, graph: &'a TransitionGraph) -> Self {
        debug_assert_eq!(catalog.len(), graph.len());
        let n = catalog.len();
        let degrees = |side: Side| {
            (0..n as PositionIndex)
                .map(|idx| graph.out_degree(side, idx) as u32)
                .collect::<Vec<_>>()
        };
        Self {
            catalog,
            graph,
            status: StatusTable::unknown(n),
            remaining: [degrees(Side::Red), degrees(Side::Black)],
            queue: VecDeque::new(),
            stats: SolverStats::new(),
        }
    }

    fn assign(&mut self, side: Side, idx: PositionIndex, status: Status) -> bool {
        if self.status.resolve(side, idx, status) {
            self.queue.push_back((idx, side));
            self.stats.max_queue = self.stats.max_queue.max(self.queue.len());
            true
        } else {
            false
        }
    }

    /// Mark terminal positions and queue them.
    fn seed(&mut self) {
        let start = Instant::now();
        let catalog = self.catalog;
        for (i, position) in catalog.positions().iter().enumerate() {
            let idx = i as PositionIndex;

            if let Some(winner) = position.mill_owner() {
                if self.assign(winner, idx, Status::Win) {
                    self.stats.mill_wins += 1;
                }
                if self.assign(winner.opponent(), idx, Status::Loss) {
                    self.stats.mill_losses += 1;
                }
                continue;
            }

            for side in Side::ALL {
                if self.remaining[side.index()][i] == 0 && self.assign(side, idx, Status::Loss) {
                    self.stats.stalemates += 1;
                }
            }
        }
        self.stats.seed_time = start.elapsed();
        debug!(seeded = self.stats.seeded(), "Seeded terminal positions");
    }

    /// Drain the worklist.
    fn propagate(&mut self) {
        let start = Instant::now();
        let graph = self.graph;
        while let Some((idx, side)) = self.queue.pop_front() {
            self.stats.pops += 1;
            let current = self.status.get(side, idx).unwrap_or_default();
            let mover = side.opponent();

            for &prev in graph.predecessors(mover, idx) {
                if self.status.get(mover, prev).is_some_and(Status::is_resolved) {
                    continue;
                }
                match current {
                    Status::Loss => {
                        if self.assign(mover, prev, Status::Win) {
                            self.stats.propagated_wins += 1;
                        }
                    }
                    Status::Win => {
                        let left = &mut self.remaining[mover.index()][prev as usize];
                        *left -= 1;
                        if *left == 0 && self.assign(mover, prev, Status::Loss) {
                            self.stats.propagated_losses += 1;
                        }
                    }
                    Status::Unknown => {}
                }
            }
        }
        self.stats.propagate_time = start.elapsed();
    }

    /// Run to the fixed point.
    #[instrument(skip_all, fields(positions = self.catalog.len()))]
    pub fn solve(mut self) -> (StatusTable, SolverStats) {
        self.seed();
        self.propagate();
        self.stats.log_summary();
        (self.status, self.stats)
    }
}

/// Solve a catalog over its transition graph.
pub fn solve(catalog: &Catalog, graph: &TransitionGraph) -> StatusTable {
    Solver::new(catalog, graph).solve().0
}

/// Check that `status` is locally consistent with `graph` at `idx` for
/// `side`. Mill positions are terminal: the owner must hold WIN and the
/// other side LOSS.
pub fn is_consistent(
    catalog: &Catalog,
    graph: &TransitionGraph,
    status: &StatusTable,
    side: Side,
    idx: PositionIndex,
) -> bool {
    let Some(position) = catalog.position(idx) else {
        return false;
    };
    if let Some(owner) = position.mill_owner() {
        let expected = if owner == side { Status::Win } else { Status::Loss };
        return status.get(side, idx) == Some(expected);
    }
    let opponent = side.opponent();
    let replies: Vec<Status> = graph
        .outgoing(side, idx)
        .iter()
        .map(|&next| status.get(opponent, next).unwrap_or_default())
        .collect();
    let any_loss = replies.contains(&Status::Loss);
    let all_win = replies.iter().all(|&s| s == Status::Win);
    match status.get(side, idx) {
        Some(Status::Win) => any_loss,
        Some(Status::Loss) => all_win,
        Some(Status::Unknown) => !any_loss && !all_win,
        None => false,
    }
}

/// Check every (side, index) pair. Used by tests and after loading a
/// tablebase.
pub fn verify(catalog: &Catalog, graph: &TransitionGraph, status: &StatusTable) -> bool {
    (0..catalog.len() as PositionIndex)
        .all(|idx| Side::ALL.into_iter().all(|side| is_consistent(catalog, graph, status, side, idx)))
}
