pub mod oracle;
pub mod session;
pub mod utils;

pub use oracle::{ChessGame, ChessOracle, OracleFactory};
pub use session::{GameMode, GameSession};
pub use utils::GameOutcome;
