pub mod controller;
pub mod lights;
pub mod machine;
pub mod notation;
pub mod snapshot;

pub use controller::{lock, BoardController};
pub use lights::{LightFeedback, LightRole};
pub use machine::{BoardOutcome, BoardState, BoardStateMachine};
pub use notation::{BoardMove, Promotion, Square};
pub use snapshot::{classify, CellState, Delta, DeltaShape, Readings, Snapshot, Thresholds};
