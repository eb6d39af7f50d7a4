use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{LedColor, LedDriver, LedError, LedTarget, SensorError, SensorGrid};
use crate::board::{CellState, Readings, Snapshot, Square};

const WHITE_READING: u16 = 1023;
const BLACK_READING: u16 = 0;
const EMPTY_READING: u16 = 512;

fn reading_for(state: CellState) -> u16 {
    match state {
        CellState::White => WHITE_READING,
        CellState::Black => BLACK_READING,
        CellState::Empty => EMPTY_READING,
    }
}

/// Sensor grid backed by an in-memory reading table.
pub struct SimulatedGrid {
    readings: Arc<Mutex<Readings>>,
}

/// Cloneable remote control for a [`SimulatedGrid`].
#[derive(Clone)]
pub struct SimulatedGridHandle {
    readings: Arc<Mutex<Readings>>,
}

impl SimulatedGrid {
    pub fn new(layout: &Snapshot) -> (SimulatedGrid, SimulatedGridHandle) {
        let mut readings = [EMPTY_READING; Square::COUNT];
        for square in Square::all() {
            readings[square.index()] = reading_for(layout.get(square));
        }
        let shared = Arc::new(Mutex::new(readings));
        (
            SimulatedGrid {
                readings: shared.clone(),
            },
            SimulatedGridHandle { readings: shared },
        )
    }
}

impl SensorGrid for SimulatedGrid {
    fn poll(&mut self) -> Result<Readings, SensorError> {
        Ok(*self.readings.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl SimulatedGridHandle {
    pub fn set(&self, square: Square, state: CellState) {
        let mut readings = self.readings.lock().unwrap_or_else(PoisonError::into_inner);
        readings[square.index()] = reading_for(state);
    }

    pub fn lift(&self, square: Square) {
        self.set(square, CellState::Empty);
    }

    pub fn place(&self, square: Square, state: CellState) {
        self.set(square, state);
    }

    pub fn reading(&self, square: Square) -> u16 {
        self.readings.lock().unwrap_or_else(PoisonError::into_inner)[square.index()]
    }
}

/// LED driver that only logs what it would light.
#[derive(Default)]
pub struct LogLedDriver;

impl LedDriver for LogLedDriver {
    fn set(&mut self, target: LedTarget, color: LedColor) -> Result<(), LedError> {
        match target {
            LedTarget::All => debug!("LEDs all set to {:?} {:?}", color, color.rgb()),
            LedTarget::Square(square) => debug!("LED {} set to {:?} {:?}", square, color, color.rgb()),
        }
        Ok(())
    }
}

/// LED driver that remembers every write and the resulting lit cells.
#[derive(Clone, Default)]
pub struct RecordingLedDriver {
    inner: Arc<Mutex<RecordedLeds>>,
}

#[derive(Default)]
struct RecordedLeds {
    writes: Vec<(LedTarget, LedColor)>,
    lit: HashMap<Square, LedColor>,
}

impl RecordingLedDriver {
    pub fn new() -> RecordingLedDriver {
        RecordingLedDriver::default()
    }

    pub fn writes(&self) -> Vec<(LedTarget, LedColor)> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).writes.clone()
    }

    /// Colour currently shown on `square`, `Off` when dark.
    pub fn color_of(&self, square: Square) -> LedColor {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .lit
            .get(&square)
            .copied()
            .unwrap_or(LedColor::Off)
    }

    /// Squares lit in `color`, in square order.
    pub fn lit_with(&self, color: LedColor) -> Vec<Square> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut squares: Vec<Square> = inner
            .lit
            .iter()
            .filter(|(_, c)| **c == color)
            .map(|(s, _)| *s)
            .collect();
        squares.sort();
        squares
    }

    pub fn is_dark(&self) -> bool {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).lit.is_empty()
    }
}

impl LedDriver for RecordingLedDriver {
    fn set(&mut self, target: LedTarget, color: LedColor) -> Result<(), LedError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.writes.push((target, color));
        match (target, color) {
            (LedTarget::All, LedColor::Off) => inner.lit.clear(),
            (LedTarget::All, color) => {
                for square in Square::all() {
                    inner.lit.insert(square, color);
                }
            }
            (LedTarget::Square(square), LedColor::Off) => {
                inner.lit.remove(&square);
            }
            (LedTarget::Square(square), color) => {
                inner.lit.insert(square, color);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{classify, Thresholds};

    #[test]
    fn test_simulated_grid_reads_back_layout() {
        let (mut grid, handle) = SimulatedGrid::new(&Snapshot::starting_layout());
        let first = Snapshot::from_readings(&grid.poll().unwrap(), Thresholds::default());
        assert_eq!(first, Snapshot::starting_layout());

        let e2: Square = "e2".parse().unwrap();
        handle.lift(e2);
        let second = Snapshot::from_readings(&grid.poll().unwrap(), Thresholds::default());
        let delta = classify(&first, &second);
        assert_eq!(delta.vacated.iter().copied().collect::<Vec<_>>(), vec![e2]);
    }

    #[test]
    fn test_recording_driver_tracks_lit_cells() {
        let mut driver = RecordingLedDriver::new();
        let a1: Square = "a1".parse().unwrap();
        driver.set(LedTarget::Square(a1), LedColor::Red).unwrap();
        assert_eq!(driver.color_of(a1), LedColor::Red);
        driver.set(LedTarget::All, LedColor::Off).unwrap();
        assert!(driver.is_dark());
        assert_eq!(driver.writes().len(), 2);
    }
}
