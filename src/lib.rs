//! Controller for a hall-sensor chessboard that plays against a remote peer.
//!
//! Sensor deltas and remote moves meet in [`board::BoardController`], which
//! both the polling thread and the websocket dispatcher reach through one
//! mutex.

pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod hardware;
pub mod models;
pub mod polling;
pub mod routes;
pub mod websocket;

pub use error::BoardError;
