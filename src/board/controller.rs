use log::debug;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::machine::{BoardOutcome, BoardState, BoardStateMachine};
use super::notation::BoardMove;
use super::snapshot::Delta;
use crate::error::BoardError;
use crate::game::{GameMode, GameSession};

/// The game session and the board state machine, mutated together.
///
/// Both the sensor polling loop and the command dispatcher go through one
/// `Mutex<BoardController>`; see [`lock`].
pub struct BoardController {
    session: GameSession,
    machine: BoardStateMachine,
}

/// Locks the shared controller. A panic on another thread while holding the
/// lock does not take the board down with it.
pub fn lock(board: &Mutex<BoardController>) -> MutexGuard<'_, BoardController> {
    board.lock().unwrap_or_else(PoisonError::into_inner)
}

impl BoardController {
    pub fn new(session: GameSession, machine: BoardStateMachine) -> Self {
        BoardController { session, machine }
    }

    pub fn set_mode(&mut self, mode: GameMode) -> Result<(), BoardError> {
        self.session.set_mode(mode)
    }

    /// Starts a game and returns the starting position as FEN.
    pub fn start_game(&mut self) -> Result<String, BoardError> {
        self.session.start()?;
        self.machine.cancel();
        Ok(self
            .session
            .position()
            .map(|position| position.fen())
            .unwrap_or_default())
    }

    pub fn remote_move(&mut self, mv: BoardMove) -> Result<BoardOutcome, BoardError> {
        if self.session.mode() == Some(GameMode::Local) {
            return Err(BoardError::RemoteMovesDisabled);
        }
        let position = self.session.position_mut().ok_or(BoardError::NoActiveGame)?;
        self.machine.remote_move(position.as_mut(), mv)
    }

    pub fn apply_delta(&mut self, delta: &Delta) -> Vec<BoardOutcome> {
        match self.session.position_mut() {
            Some(position) => self.machine.on_delta(position.as_mut(), delta),
            None => {
                debug!("Ignoring board change outside a game: {:?}", delta);
                Vec::new()
            }
        }
    }

    /// Ends the game from any state. Safe to call repeatedly.
    pub fn end_game(&mut self) {
        self.machine.cancel();
        self.session.end();
    }

    pub fn state(&self) -> BoardState {
        self.machine.state()
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn machine(&self) -> &BoardStateMachine {
        &self.machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{LightFeedback, Square};
    use crate::game::{ChessGame, ChessOracle, GameOutcome};
    use crate::hardware::RecordingLedDriver;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn controller() -> BoardController {
        let lights = LightFeedback::new(Box::new(RecordingLedDriver::new()));
        BoardController::new(GameSession::default(), BoardStateMachine::new(lights, None))
    }

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn lift(name: &str) -> Delta {
        Delta::new([sq(name)], [])
    }

    fn place(name: &str) -> Delta {
        Delta::new([], [sq(name)])
    }

    /// Real rules underneath, counting how often a move is committed.
    struct CountingOracle {
        inner: ChessGame,
        applied: Arc<AtomicUsize>,
    }

    impl ChessOracle for CountingOracle {
        fn legal_moves(&self) -> Vec<BoardMove> {
            self.inner.legal_moves()
        }

        fn resolve(&self, mv: &BoardMove) -> Option<BoardMove> {
            self.inner.resolve(mv)
        }

        fn footprint(&self, mv: &BoardMove) -> Option<Delta> {
            self.inner.footprint(mv)
        }

        fn validate_and_apply(&mut self, mv: &BoardMove) -> bool {
            self.applied.fetch_add(1, Ordering::SeqCst);
            self.inner.validate_and_apply(mv)
        }

        fn result(&self) -> Option<GameOutcome> {
            self.inner.result()
        }

        fn fen(&self) -> String {
            self.inner.fen()
        }
    }

    fn counting_controller() -> (BoardController, Arc<AtomicUsize>) {
        let applied = Arc::new(AtomicUsize::new(0));
        let counter = applied.clone();
        let session = GameSession::new(Box::new(move || -> Box<dyn ChessOracle> {
            Box::new(CountingOracle {
                inner: ChessGame::new(),
                applied: counter.clone(),
            })
        }));
        let lights = LightFeedback::new(Box::new(RecordingLedDriver::new()));
        let mut board = BoardController::new(session, BoardStateMachine::new(lights, None));
        board.set_mode(GameMode::Pvp).unwrap();
        board.start_game().unwrap();
        (board, applied)
    }

    #[test]
    fn test_remote_move_needs_a_game() {
        let mut board = controller();
        let mv: BoardMove = "e2e4".parse().unwrap();
        assert_eq!(board.remote_move(mv), Err(BoardError::NoActiveGame));

        board.set_mode(GameMode::Local).unwrap();
        board.start_game().unwrap();
        assert_eq!(board.remote_move(mv), Err(BoardError::RemoteMovesDisabled));
    }

    #[test]
    fn test_end_game_discards_pending_lift() {
        let mut board = controller();
        assert!(board.apply_delta(&lift("e2")).is_empty());

        board.set_mode(GameMode::Pvp).unwrap();
        let fen = board.start_game().unwrap();
        assert!(fen.starts_with("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w"));
        assert_eq!(board.apply_delta(&lift("e2")).len(), 1);
        assert!(!board.machine().lights().is_dark());

        board.end_game();
        assert_eq!(board.state(), BoardState::Idle);
        assert!(board.machine().lights().is_dark());
        assert!(!board.session().is_active());
        board.end_game();
    }

    #[test]
    fn test_placement_commits_exactly_one_move() {
        let (mut board, applied) = counting_controller();

        board.apply_delta(&lift("e2"));
        assert_eq!(applied.load(Ordering::SeqCst), 0);
        let outcomes = board.apply_delta(&place("e4"));
        assert!(matches!(outcomes.as_slice(), [BoardOutcome::MoveAccepted { .. }]));
        assert_eq!(applied.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ambiguous_delta_commits_nothing() {
        let (mut board, applied) = counting_controller();

        let noise = Delta::new([sq("a2"), sq("b2")], []);
        assert!(matches!(
            board.apply_delta(&noise).as_slice(),
            [BoardOutcome::SensorAmbiguity { .. }]
        ));
        let castle_shape = Delta::new([sq("e1"), sq("h1")], [sq("f1"), sq("g1")]);
        assert!(matches!(
            board.apply_delta(&castle_shape).as_slice(),
            [BoardOutcome::SensorAmbiguity { .. }]
        ));
        assert_eq!(applied.load(Ordering::SeqCst), 0);
        assert_eq!(board.state(), BoardState::Idle);
    }
}
