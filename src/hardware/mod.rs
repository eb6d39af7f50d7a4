//! Capabilities the board controller needs from the hardware.
//!
//! Concrete ADC, LED strip and actuator drivers live outside this crate; the
//! `simulated` module provides in-memory versions used by the binary when no
//! hardware is attached and by the tests.

use thiserror::Error;

use crate::board::{BoardMove, Readings, Square};

pub mod simulated;

pub use simulated::{LogLedDriver, RecordingLedDriver, SimulatedGrid, SimulatedGridHandle};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("sensor read failed on channel {channel}: {reason}")]
    ReadFailed { channel: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedError {
    #[error("LED write failed: {0}")]
    WriteFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuatorError {
    #[error("actuator could not move {mv}: {reason}")]
    Relocate { mv: String, reason: String },
}

/// Scans the 8x8 hall-sensor grid. Implementations return readings already
/// ordered by square, whatever their multiplexer wiring.
pub trait SensorGrid: Send {
    fn poll(&mut self) -> Result<Readings, SensorError>;
}

/// Palette of the LED strip under the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedColor {
    Off,
    Red,
    Green,
    Blue,
    White,
    Yellow,
    Cyan,
    Magenta,
}

impl LedColor {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            LedColor::Off => (0, 0, 0),
            LedColor::Red => (255, 0, 0),
            LedColor::Green => (0, 255, 0),
            LedColor::Blue => (0, 0, 255),
            LedColor::White => (255, 255, 255),
            LedColor::Yellow => (255, 255, 0),
            LedColor::Cyan => (0, 255, 255),
            LedColor::Magenta => (255, 0, 255),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedTarget {
    Square(Square),
    All,
}

pub trait LedDriver: Send {
    fn set(&mut self, target: LedTarget, color: LedColor) -> Result<(), LedError>;

    /// Latches buffered writes onto the strip.
    fn show(&mut self) -> Result<(), LedError> {
        Ok(())
    }
}

/// Moves a piece by itself (e.g. an XY gantry with a magnet) so the local
/// player does not have to execute remote moves by hand.
pub trait Actuator: Send {
    fn relocate(&mut self, mv: &BoardMove) -> Result<(), ActuatorError>;
}
