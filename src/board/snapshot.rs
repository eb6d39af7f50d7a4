use std::collections::BTreeSet;

use super::notation::Square;

/// Raw analog readings, one per square, in square order.
pub type Readings = [u16; Square::COUNT];

/// Hall-sensor voltage bands. Below `low` a black piece sits on the cell,
/// above `high` a white one; anything in between reads as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub low: u16,
    pub high: u16,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds { low: 341, high: 683 }
    }
}

impl Thresholds {
    pub fn cell_state(&self, reading: u16) -> CellState {
        if reading < self.low {
            CellState::Black
        } else if reading > self.high {
            CellState::White
        } else {
            CellState::Empty
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    White,
    Black,
    Empty,
}

impl CellState {
    pub fn is_empty(self) -> bool {
        self == CellState::Empty
    }
}

/// One complete scan of the sensor grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    cells: [CellState; Square::COUNT],
}

impl Snapshot {
    pub fn empty() -> Snapshot {
        Snapshot {
            cells: [CellState::Empty; Square::COUNT],
        }
    }

    /// White on ranks 1 and 2, black on ranks 7 and 8.
    pub fn starting_layout() -> Snapshot {
        let mut snapshot = Snapshot::empty();
        for square in Square::all() {
            snapshot.cells[square.index()] = match square.rank() {
                0 | 1 => CellState::White,
                6 | 7 => CellState::Black,
                _ => CellState::Empty,
            };
        }
        snapshot
    }

    pub fn from_readings(readings: &Readings, thresholds: Thresholds) -> Snapshot {
        let mut cells = [CellState::Empty; Square::COUNT];
        for (cell, reading) in cells.iter_mut().zip(readings.iter()) {
            *cell = thresholds.cell_state(*reading);
        }
        Snapshot { cells }
    }

    pub fn with(mut self, square: Square, state: CellState) -> Snapshot {
        self.cells[square.index()] = state;
        self
    }

    pub fn get(&self, square: Square) -> CellState {
        self.cells[square.index()]
    }
}

/// Occupancy change between two snapshots.
///
/// A square is never in both sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    pub vacated: BTreeSet<Square>,
    pub occupied: BTreeSet<Square>,
}

/// Shape of a delta judged by set sizes alone. Castling and en passant are
/// only *shapes* here; whether such a delta is a real move is decided against
/// the rules engine by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaShape {
    Unchanged,
    Lift(Square),
    Place(Square),
    CastlingShaped,
    EnPassantShaped,
    Other,
}

impl Delta {
    pub fn new(
        vacated: impl IntoIterator<Item = Square>,
        occupied: impl IntoIterator<Item = Square>,
    ) -> Delta {
        let mut delta = Delta::default();
        delta.merge(&Delta {
            vacated: vacated.into_iter().collect(),
            occupied: BTreeSet::new(),
        });
        delta.merge(&Delta {
            vacated: BTreeSet::new(),
            occupied: occupied.into_iter().collect(),
        });
        delta
    }

    pub fn is_empty(&self) -> bool {
        self.vacated.is_empty() && self.occupied.is_empty()
    }

    /// Number of distinct squares touched.
    pub fn len(&self) -> usize {
        self.vacated.len() + self.occupied.len()
    }

    pub fn contains(&self, square: Square) -> bool {
        self.vacated.contains(&square) || self.occupied.contains(&square)
    }

    pub fn squares(&self) -> impl Iterator<Item = Square> + '_ {
        self.vacated.iter().chain(self.occupied.iter()).copied()
    }

    pub fn shape(&self) -> DeltaShape {
        match (self.vacated.len(), self.occupied.len()) {
            (0, 0) => DeltaShape::Unchanged,
            (1, 0) => self.vacated.iter().next().map_or(DeltaShape::Other, |s| DeltaShape::Lift(*s)),
            (0, 1) => self.occupied.iter().next().map_or(DeltaShape::Other, |s| DeltaShape::Place(*s)),
            (2, 2) => DeltaShape::CastlingShaped,
            (2, 1) => DeltaShape::EnPassantShaped,
            _ => DeltaShape::Other,
        }
    }

    /// Folds a later delta into this one, keeping only the net change.
    /// A square that is lifted and then put back drops out entirely.
    pub fn merge(&mut self, later: &Delta) {
        for square in &later.vacated {
            if !self.occupied.remove(square) {
                self.vacated.insert(*square);
            }
        }
        for square in &later.occupied {
            if !self.vacated.remove(square) {
                self.occupied.insert(*square);
            }
        }
    }
}

/// Diffs two snapshots into the squares that emptied and the squares that
/// filled. Colour changes on an occupied square are not reported.
pub fn classify(prev: &Snapshot, curr: &Snapshot) -> Delta {
    let mut delta = Delta::default();
    for square in Square::all() {
        let before = prev.get(square);
        let after = curr.get(square);
        if !before.is_empty() && after.is_empty() {
            delta.vacated.insert(square);
        } else if before.is_empty() && !after.is_empty() {
            delta.occupied.insert(square);
        }
    }
    delta
}
