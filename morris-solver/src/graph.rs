//! Forward and reverse move graph over the catalog.

use std::time::Instant;

use morris_core::{Board, Catalog, PositionIndex, Side};
use tracing::{info, instrument};

use crate::movegen::moves_for;

/// Per-side adjacency lists, indexed by catalog index.
///
/// `outgoing[side][i]` lists the positions `side` reaches by one slide from
/// `i`; `predecessors[side][j]` lists every `i` with `j` in
/// `outgoing[side][i]`.
#[derive(Debug, Clone)]
pub struct TransitionGraph {
    outgoing: [Vec<Vec<PositionIndex>>; 2],
    predecessors: [Vec<Vec<PositionIndex>>; 2],
}

impl TransitionGraph {
    /// Generate every move of both sides from every catalogued position.
    #[instrument(skip_all, fields(positions = catalog.len()))]
    pub fn build(board: &Board, catalog: &Catalog) -> Self {
        let start = Instant::now();
        let n = catalog.len();
        let mut outgoing = [vec![Vec::new(); n], vec![Vec::new(); n]];
        let mut predecessors = [vec![Vec::new(); n], vec![Vec::new(); n]];

        for (idx, position) in catalog.positions().iter().enumerate() {
            for side in Side::ALL {
                let moves = moves_for(board, catalog, position, side);
                for &next in &moves {
                    predecessors[side.index()][next as usize].push(idx as PositionIndex);
                }
                outgoing[side.index()][idx] = moves;
            }
        }

        let graph = Self {
            outgoing,
            predecessors,
        };
        info!(
            red_edges = graph.edge_count(Side::Red),
            black_edges = graph.edge_count(Side::Black),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built transition graph"
        );
        graph
    }

    /// Number of positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.outgoing[0].len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positions `side` reaches from `idx`. Empty for unknown indices.
    #[inline]
    pub fn outgoing(&self, side: Side, idx: PositionIndex) -> &[PositionIndex] {
        self.outgoing[side.index()]
            .get(idx as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Positions from which `side`, moving, reaches `idx`.
    #[inline]
    pub fn predecessors(&self, side: Side, idx: PositionIndex) -> &[PositionIndex] {
        self.predecessors[side.index()]
            .get(idx as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[inline]
    pub fn out_degree(&self, side: Side, idx: PositionIndex) -> usize {
        self.outgoing(side, idx).len()
    }

    /// Total number of edges for one side.
    pub fn edge_count(&self, side: Side) -> usize {
        self.outgoing[side.index()].iter().map(Vec::len).sum()
    }
}
