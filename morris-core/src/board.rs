//! Board model: cells, adjacency graph, winning lines and the mill predicate.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::Side;

/// One of the nine board cells, row-major.
///
/// Layout:
/// ```text
///   A1 A2 A3
///   B1 B2 B3
///   C1 C2 C3
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Cell {
    A1 = 0,
    A2 = 1,
    A3 = 2,
    B1 = 3,
    B2 = 4,
    B3 = 5,
    C1 = 6,
    C2 = 7,
    C3 = 8,
}

impl Cell {
    /// All cells in index order.
    pub const ALL: [Cell; 9] = [
        Cell::A1,
        Cell::A2,
        Cell::A3,
        Cell::B1,
        Cell::B2,
        Cell::B3,
        Cell::C1,
        Cell::C2,
        Cell::C3,
    ];

    /// Convert from index (0-8) to Cell.
    #[inline]
    pub fn from_index(idx: u8) -> Option<Cell> {
        Self::ALL.get(idx as usize).copied()
    }

    /// Get the index (0-8).
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Row-major bit for this cell.
    #[inline]
    pub fn bit(self) -> u16 {
        1 << self as u16
    }

    /// Get the label, e.g. "B2".
    pub fn label(self) -> &'static str {
        const LABELS: [&str; 9] = ["A1", "A2", "A3", "B1", "B2", "B3", "C1", "C2", "C3"];
        LABELS[self as usize]
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Cell {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Cell::ALL
            .iter()
            .copied()
            .find(|c| c.label() == upper)
            .ok_or_else(|| BoardError::UnknownCell {
                label: s.to_string(),
            })
    }
}

// ============================================================================
// CELL SETS
// ============================================================================

/// Set of cells packed into the low 9 bits.
///
/// Iteration is ascending by cell index, which is the canonical order for a
/// side's stones.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct CellSet(u16);

impl CellSet {
    const MASK: u16 = 0x1FF;

    /// The empty set.
    pub const EMPTY: CellSet = CellSet(0);

    /// Build from raw bits. Returns None if bits above the ninth are set.
    #[inline]
    pub fn from_bits(bits: u16) -> Option<CellSet> {
        if bits & !Self::MASK == 0 {
            Some(CellSet(bits))
        } else {
            None
        }
    }

    /// Raw bits.
    #[inline]
    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn from_cells(cells: &[Cell]) -> CellSet {
        CellSet(cells.iter().fold(0, |acc, c| acc | c.bit()))
    }

    #[inline]
    pub fn contains(self, cell: Cell) -> bool {
        self.0 & cell.bit() != 0
    }

    #[inline]
    pub fn with(self, cell: Cell) -> CellSet {
        CellSet(self.0 | cell.bit())
    }

    #[inline]
    pub fn without(self, cell: Cell) -> CellSet {
        CellSet(self.0 & !cell.bit())
    }

    #[inline]
    pub fn union(self, other: CellSet) -> CellSet {
        CellSet(self.0 | other.0)
    }

    #[inline]
    pub fn is_disjoint(self, other: CellSet) -> bool {
        self.0 & other.0 == 0
    }

    #[inline]
    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate cells in ascending order.
    pub fn iter(self) -> impl Iterator<Item = Cell> {
        Cell::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl fmt::Debug for CellSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for CellSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, cell) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{cell}")?;
        }
        f.write_str(")")
    }
}

/// The eight winning lines: rows, columns, diagonals.
pub const WIN_LINES: [[Cell; 3]; 8] = [
    [Cell::A1, Cell::A2, Cell::A3],
    [Cell::B1, Cell::B2, Cell::B3],
    [Cell::C1, Cell::C2, Cell::C3],
    [Cell::A1, Cell::B1, Cell::C1],
    [Cell::A2, Cell::B2, Cell::C2],
    [Cell::A3, Cell::B3, Cell::C3],
    [Cell::A1, Cell::B2, Cell::C3],
    [Cell::A3, Cell::B2, Cell::C1],
];

// ============================================================================
// TOPOLOGY
// ============================================================================

/// Built-in adjacency graphs.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// Center touches every cell; the rest follow the outer ring.
    #[default]
    Classic,
    /// Classic plus diagonal links between neighbouring edge midpoints.
    Dense,
}

impl Topology {
    fn edges(self) -> &'static [(Cell, Cell)] {
        use Cell::*;
        const CLASSIC: [(Cell, Cell); 16] = [
            (A1, A2),
            (A2, A3),
            (A3, B3),
            (B3, C3),
            (C3, C2),
            (C2, C1),
            (C1, B1),
            (B1, A1),
            (B2, A1),
            (B2, A2),
            (B2, A3),
            (B2, B1),
            (B2, B3),
            (B2, C1),
            (B2, C2),
            (B2, C3),
        ];
        const DENSE: [(Cell, Cell); 20] = [
            (A1, A2),
            (A2, A3),
            (A3, B3),
            (B3, C3),
            (C3, C2),
            (C2, C1),
            (C1, B1),
            (B1, A1),
            (B2, A1),
            (B2, A2),
            (B2, A3),
            (B2, B1),
            (B2, B3),
            (B2, C1),
            (B2, C2),
            (B2, C3),
            (A2, B1),
            (A2, B3),
            (C2, B1),
            (C2, B3),
        ];
        match self {
            Topology::Classic => &CLASSIC,
            Topology::Dense => &DENSE,
        }
    }
}

// ============================================================================
// BOARD
// ============================================================================

/// Immutable board model: the adjacency graph over the nine cells.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    /// Neighbour set per cell index.
    adjacency: [CellSet; 9],
}

impl Board {
    /// Build a board from one of the built-in topologies.
    pub fn new(topology: Topology) -> Board {
        let mut adjacency = [CellSet::EMPTY; 9];
        for &(a, b) in topology.edges() {
            adjacency[a as usize] = adjacency[a as usize].with(b);
            adjacency[b as usize] = adjacency[b as usize].with(a);
        }
        Board { adjacency }
    }

    /// Build a board from per-cell neighbour masks, validating the graph.
    pub fn from_masks(masks: [u16; 9]) -> Result<Board, BoardError> {
        let mut adjacency = [CellSet::EMPTY; 9];
        for (i, &bits) in masks.iter().enumerate() {
            adjacency[i] = CellSet::from_bits(bits).ok_or(BoardError::CellOutOfRange {
                index: (16 - bits.leading_zeros()) as u8 - 1,
            })?;
        }
        let board = Board { adjacency };
        board.validate()?;
        Ok(board)
    }

    /// Build a board from a label-keyed neighbour map such as
    /// `{"A1": ["A2", "B1", "B2"], ...}`. Cells missing from the map have no
    /// neighbours of their own but must still agree with the reverse edges.
    pub fn from_labels(map: &BTreeMap<String, Vec<String>>) -> Result<Board, BoardError> {
        let mut masks = [0u16; 9];
        for (cell, neighbours) in map {
            let cell: Cell = cell.parse()?;
            for n in neighbours {
                let n: Cell = n.parse()?;
                masks[cell as usize] |= n.bit();
            }
        }
        Board::from_masks(masks)
    }

    fn validate(&self) -> Result<(), BoardError> {
        for cell in Cell::ALL {
            let neighbours = self.adjacency[cell as usize];
            if neighbours.contains(cell) {
                return Err(BoardError::SelfLoop { cell });
            }
            for n in neighbours.iter() {
                if !self.adjacency[n as usize].contains(cell) {
                    return Err(BoardError::Asymmetric { from: cell, to: n });
                }
            }
        }
        Ok(())
    }

    /// Neighbours of a cell.
    #[inline]
    pub fn neighbors(&self, cell: Cell) -> CellSet {
        self.adjacency[cell as usize]
    }

    #[inline]
    pub fn is_adjacent(&self, a: Cell, b: Cell) -> bool {
        self.adjacency[a as usize].contains(b)
    }

    /// Raw neighbour masks, one per cell index.
    pub fn masks(&self) -> [u16; 9] {
        self.adjacency.map(CellSet::bits)
    }

    /// Check if `stones` form a mill for `side`: exactly the cells of a
    /// winning line, other than the side's own starting line.
    pub fn has_mill(stones: CellSet, side: Side) -> bool {
        if stones == side.starting_line() {
            return false;
        }
        WIN_LINES
            .iter()
            .any(|line| stones == CellSet::from_cells(line))
    }

    /// Starting layout: Red on row A, Black on row C.
    pub fn start_cells() -> (CellSet, CellSet) {
        (Side::Red.starting_line(), Side::Black.starting_line())
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new(Topology::Classic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_index_roundtrip() {
        for i in 0..9 {
            assert_eq!(Cell::from_index(i).unwrap().index(), i);
        }
        assert_eq!(Cell::from_index(9), None);
    }

    #[test]
    fn test_cell_parse() {
        assert_eq!("B2".parse::<Cell>().unwrap(), Cell::B2);
        assert_eq!("c3".parse::<Cell>().unwrap(), Cell::C3);
        assert_eq!(
            "D1".parse::<Cell>(),
            Err(BoardError::UnknownCell {
                label: "D1".to_string()
            })
        );
    }

    #[test]
    fn test_cell_serde_uses_labels() {
        assert_eq!(serde_json::to_string(&Cell::B2).unwrap(), "\"B2\"");
        let cell: Cell = serde_json::from_str("\"C1\"").unwrap();
        assert_eq!(cell, Cell::C1);
    }

    #[test]
    fn test_cellset_iteration_is_sorted() {
        let set = CellSet::from_cells(&[Cell::C3, Cell::A1, Cell::B2]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Cell::A1, Cell::B2, Cell::C3]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.to_string(), "(A1, B2, C3)");
    }

    #[test]
    fn test_cellset_from_bits_rejects_high_bits() {
        assert!(CellSet::from_bits(0x1FF).is_some());
        assert!(CellSet::from_bits(0x200).is_none());
    }

    #[test]
    fn test_classic_adjacency() {
        let board = Board::new(Topology::Classic);
        assert_eq!(
            board.neighbors(Cell::A1).iter().collect::<Vec<_>>(),
            vec![Cell::A2, Cell::B1, Cell::B2]
        );
        assert_eq!(
            board.neighbors(Cell::A2).iter().collect::<Vec<_>>(),
            vec![Cell::A1, Cell::A3, Cell::B2]
        );
        assert_eq!(board.neighbors(Cell::B2).len(), 8);
        for cell in Cell::ALL {
            if cell != Cell::B2 {
                assert!(board.is_adjacent(cell, Cell::B2));
                assert_eq!(board.neighbors(cell).len(), 3);
            }
        }
    }

    #[test]
    fn test_dense_adjacency() {
        let board = Board::new(Topology::Dense);
        assert_eq!(
            board.neighbors(Cell::B1).iter().collect::<Vec<_>>(),
            vec![Cell::A1, Cell::A2, Cell::B2, Cell::C1, Cell::C2]
        );
        assert_eq!(board.neighbors(Cell::A1).len(), 3);
        assert_eq!(board.neighbors(Cell::C2).len(), 5);
    }

    #[test]
    fn test_builtin_topologies_validate() {
        for topology in [Topology::Classic, Topology::Dense] {
            let board = Board::new(topology);
            assert_eq!(Board::from_masks(board.masks()).unwrap(), board);
        }
    }

    #[test]
    fn test_from_labels() {
        let mut map = BTreeMap::new();
        map.insert("A1".to_string(), vec!["A2".to_string()]);
        map.insert("A2".to_string(), vec!["A1".to_string()]);
        let board = Board::from_labels(&map).unwrap();
        assert!(board.is_adjacent(Cell::A1, Cell::A2));
        assert!(board.neighbors(Cell::B2).is_empty());
    }

    #[test]
    fn test_from_labels_rejects_bad_graphs() {
        let mut map = BTreeMap::new();
        map.insert("A1".to_string(), vec!["Z9".to_string()]);
        assert_eq!(
            Board::from_labels(&map),
            Err(BoardError::UnknownCell {
                label: "Z9".to_string()
            })
        );

        let mut map = BTreeMap::new();
        map.insert("A1".to_string(), vec!["A2".to_string()]);
        assert_eq!(
            Board::from_labels(&map),
            Err(BoardError::Asymmetric {
                from: Cell::A1,
                to: Cell::A2
            })
        );

        let mut map = BTreeMap::new();
        map.insert("B2".to_string(), vec!["B2".to_string()]);
        assert_eq!(
            Board::from_labels(&map),
            Err(BoardError::SelfLoop { cell: Cell::B2 })
        );
    }

    #[test]
    fn test_from_masks_rejects_out_of_range_bits() {
        let mut masks = Board::default().masks();
        masks[0] |= 1 << 12;
        assert_eq!(
            Board::from_masks(masks),
            Err(BoardError::CellOutOfRange { index: 12 })
        );
    }

    #[test]
    fn test_has_mill_lines() {
        for line in &WIN_LINES {
            let stones = CellSet::from_cells(line);
            let red = stones != Side::Red.starting_line();
            let black = stones != Side::Black.starting_line();
            assert_eq!(Board::has_mill(stones, Side::Red), red);
            assert_eq!(Board::has_mill(stones, Side::Black), black);
        }
    }

    #[test]
    fn test_starting_line_is_not_a_mill() {
        let (red, black) = Board::start_cells();
        assert!(!Board::has_mill(red, Side::Red));
        assert!(!Board::has_mill(black, Side::Black));
        // The opponent's starting row is a regular line.
        assert!(Board::has_mill(red, Side::Black));
        assert!(Board::has_mill(black, Side::Red));
    }

    #[test]
    fn test_has_mill_rejects_non_lines() {
        let stones = CellSet::from_cells(&[Cell::A1, Cell::A2, Cell::B1]);
        assert!(!Board::has_mill(stones, Side::Red));
        assert!(!Board::has_mill(stones, Side::Black));
    }
}
