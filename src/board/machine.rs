use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::mem;

use super::lights::{LightFeedback, LightRole};
use super::notation::{BoardMove, Promotion, Square};
use super::snapshot::{Delta, DeltaShape};
use crate::error::BoardError;
use crate::game::{ChessOracle, GameOutcome};
use crate::hardware::Actuator;

/// Externally visible state of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardState {
    Idle,
    AwaitingPlacement(Square),
    AwaitingRemotePhysicalMove { start: Square, end: Square },
    /// A local move was accepted but a piece it drags along (castling rook,
    /// en-passant victim) has not been moved yet.
    Settling(BoardMove),
    /// The pieces on the board differ from the position and no move explains
    /// the difference; waiting for the player to put things back.
    Restoring,
}

/// What a delta or remote request did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardOutcome {
    LegalMovesShown { from: Square, destinations: Vec<Square> },
    LiftCancelled { square: Square },
    CaptureLifted { square: Square },
    MoveAccepted { mv: BoardMove, fen: String },
    IllegalMove { mv: BoardMove },
    /// Squares to refill (`missing`) and to clear (`extra`) before the board
    /// matches the position again.
    OutOfSync { missing: Vec<Square>, extra: Vec<Square> },
    BoardRestored,
    SettlingPending { mv: BoardMove },
    Settled { mv: BoardMove },
    RemoteMoveAccepted { mv: BoardMove },
    RemoteMoveIncomplete { mv: BoardMove },
    RemoteMoveCompleted { mv: BoardMove, fen: String },
    GameOver { result: GameOutcome },
    /// The delta does not fit the current state; the board is probably
    /// still settling under the player's hands.
    SensorAmbiguity { vacated: Vec<Square>, occupied: Vec<Square> },
}

/// Net physical change expected from a move versus what the sensors have
/// reported since.
#[derive(Debug, Clone)]
struct PhysicalSync {
    expected: Delta,
    progress: Delta,
}

impl PhysicalSync {
    fn new(expected: Delta, progress: Delta) -> Self {
        PhysicalSync { expected, progress }
    }

    fn advance(&mut self, delta: &Delta) -> bool {
        self.progress.merge(delta);
        self.is_complete()
    }

    fn is_complete(&self) -> bool {
        self.progress == self.expected
    }

    fn remaining_vacated(&self) -> BTreeSet<Square> {
        self.expected.vacated.difference(&self.progress.vacated).copied().collect()
    }

    fn remaining_occupied(&self) -> BTreeSet<Square> {
        self.expected.occupied.difference(&self.progress.occupied).copied().collect()
    }

    /// Squares changed that the move never asked for, apart from `allowed`.
    fn stray(&self, allowed: &BTreeSet<Square>) -> Vec<Square> {
        self.progress
            .squares()
            .filter(|square| !self.expected.contains(*square) && !allowed.contains(square))
            .collect()
    }
}

enum MoveIntent {
    Idle,
    LocalLift { from: Square, observed: Delta },
    RemoteHeld { mv: BoardMove, sync: PhysicalSync },
    Settling { mv: BoardMove, sync: PhysicalSync },
    /// Net change of the physical board away from the position.
    Restoring { offset: Delta },
}

/// Correlates sensor deltas and remote moves with the rules engine.
///
/// At most one move intent is live at a time: a local lift and a remote move
/// waiting to be executed exclude each other, and neither can start while
/// the board is out of sync with the position.
pub struct BoardStateMachine {
    intent: MoveIntent,
    lights: LightFeedback,
    actuator: Option<Box<dyn Actuator>>,
}

impl BoardStateMachine {
    pub fn new(lights: LightFeedback, actuator: Option<Box<dyn Actuator>>) -> Self {
        BoardStateMachine {
            intent: MoveIntent::Idle,
            lights,
            actuator,
        }
    }

    pub fn state(&self) -> BoardState {
        match &self.intent {
            MoveIntent::Idle => BoardState::Idle,
            MoveIntent::LocalLift { from, .. } => BoardState::AwaitingPlacement(*from),
            MoveIntent::RemoteHeld { mv, .. } => BoardState::AwaitingRemotePhysicalMove {
                start: mv.start,
                end: mv.end,
            },
            MoveIntent::Settling { mv, .. } => BoardState::Settling(*mv),
            MoveIntent::Restoring { .. } => BoardState::Restoring,
        }
    }

    pub fn lights(&self) -> &LightFeedback {
        &self.lights
    }

    /// Drops whatever move is pending and turns the lights off.
    pub fn cancel(&mut self) {
        if !matches!(self.intent, MoveIntent::Idle) {
            info!("Discarding pending move ({:?})", self.state());
        }
        self.intent = MoveIntent::Idle;
        self.lights.clear();
    }

    pub fn on_delta(&mut self, oracle: &mut dyn ChessOracle, delta: &Delta) -> Vec<BoardOutcome> {
        if delta.is_empty() {
            return Vec::new();
        }
        match mem::replace(&mut self.intent, MoveIntent::Idle) {
            MoveIntent::Idle => self.idle_delta(oracle, delta),
            MoveIntent::LocalLift { from, observed } => {
                self.placement_delta(oracle, from, observed, delta)
            }
            MoveIntent::RemoteHeld { mv, sync } => self.remote_delta(oracle, mv, sync, delta),
            MoveIntent::Settling { mv, sync } => self.settling_delta(mv, sync, delta),
            MoveIntent::Restoring { offset } => self.restoring_delta(oracle, offset, delta),
        }
    }

    /// Accepts a move made by the remote peer and guides the local player
    /// (or the actuator) through executing it on the physical board. The
    /// rules engine only sees the move once the sensors confirm it.
    pub fn remote_move(
        &mut self,
        oracle: &mut dyn ChessOracle,
        mv: BoardMove,
    ) -> Result<BoardOutcome, BoardError> {
        if !matches!(self.intent, MoveIntent::Idle) {
            return Err(BoardError::MoveInProgress);
        }
        let resolved = oracle.resolve(&mv).ok_or(BoardError::IllegalMove(mv))?;
        let expected = oracle
            .footprint(&resolved)
            .ok_or(BoardError::IllegalMove(mv))?;

        let sync = PhysicalSync::new(expected, Delta::default());
        self.show_remote_guides(&resolved, &sync);
        if let Some(actuator) = self.actuator.as_mut() {
            if let Err(e) = actuator.relocate(&resolved) {
                warn!("Actuator failed, falling back to light guidance: {}", e);
            }
        }
        info!("Remote move {} accepted, waiting for the board", resolved);
        self.intent = MoveIntent::RemoteHeld { mv: resolved, sync };
        Ok(BoardOutcome::RemoteMoveAccepted { mv: resolved })
    }

    fn idle_delta(&mut self, oracle: &mut dyn ChessOracle, delta: &Delta) -> Vec<BoardOutcome> {
        match delta.shape() {
            DeltaShape::Lift(from) => self.begin_lift(oracle, from, delta.clone()),
            _ if delta.len() >= 2 => match matching_move(oracle, delta) {
                Some(mv) => {
                    debug!("Delta matches {} in a single scan", mv);
                    self.apply_local(oracle, mv, delta.clone())
                }
                None => vec![ambiguity(delta)],
            },
            _ => vec![ambiguity(delta)],
        }
    }

    fn begin_lift(&mut self, oracle: &dyn ChessOracle, from: Square, observed: Delta) -> Vec<BoardOutcome> {
        let destinations = oracle.legal_destinations(from);
        debug!("Piece lifted from {}, legal destinations {:?}", from, destinations);
        self.lights.clear();
        self.lights
            .highlight(destinations.iter().copied(), LightRole::LegalDestination);
        self.intent = MoveIntent::LocalLift { from, observed };
        vec![BoardOutcome::LegalMovesShown { from, destinations }]
    }

    fn placement_delta(
        &mut self,
        oracle: &mut dyn ChessOracle,
        from: Square,
        mut observed: Delta,
        delta: &Delta,
    ) -> Vec<BoardOutcome> {
        observed.merge(delta);
        match delta.shape() {
            DeltaShape::Place(end) if end == from && observed.is_empty() => {
                debug!("Piece put back on {}", from);
                self.lights.clear();
                vec![BoardOutcome::LiftCancelled { square: from }]
            }
            DeltaShape::Place(end) if end == from => {
                debug!("Piece put back on {}, other squares still changed", from);
                self.restore(observed)
            }
            DeltaShape::Place(end) => self.apply_local(oracle, BoardMove::new(from, end), observed),
            DeltaShape::Lift(other) => {
                let destinations = oracle.legal_destinations(from);
                if destinations.contains(&other) {
                    self.intent = MoveIntent::LocalLift { from, observed };
                    vec![BoardOutcome::CaptureLifted { square: other }]
                } else if destinations.is_empty() && !oracle.legal_destinations(other).is_empty() {
                    // The first lift was the piece about to be captured.
                    self.begin_lift(oracle, other, observed)
                } else {
                    self.intent = MoveIntent::LocalLift { from, observed };
                    vec![ambiguity(delta)]
                }
            }
            _ => {
                self.intent = MoveIntent::LocalLift { from, observed };
                vec![ambiguity(delta)]
            }
        }
    }

    fn apply_local(
        &mut self,
        oracle: &mut dyn ChessOracle,
        mv: BoardMove,
        observed: Delta,
    ) -> Vec<BoardOutcome> {
        let mv = oracle.resolve(&mv).unwrap_or(mv);
        let expected = oracle.footprint(&mv);
        if !oracle.validate_and_apply(&mv) {
            info!("Illegal move {}", mv);
            self.lights.clear();
            self.lights.highlight([mv.start, mv.end], LightRole::Error);
            if !observed.is_empty() {
                self.intent = MoveIntent::Restoring { offset: observed };
            }
            return vec![BoardOutcome::IllegalMove { mv }];
        }

        info!("Move {} accepted", mv);
        self.lights.clear();
        let mut outcomes = vec![BoardOutcome::MoveAccepted {
            mv,
            fen: oracle.fen(),
        }];
        if let Some(expected) = expected {
            let sync = PhysicalSync::new(expected, observed);
            if !sync.is_complete() {
                self.show_settling(&sync);
                self.intent = MoveIntent::Settling { mv, sync };
                outcomes.push(BoardOutcome::SettlingPending { mv });
            }
        }
        outcomes.extend(game_over(oracle));
        outcomes
    }

    fn settling_delta(&mut self, mv: BoardMove, mut sync: PhysicalSync, delta: &Delta) -> Vec<BoardOutcome> {
        if sync.advance(delta) {
            debug!("Board settled after {}", mv);
            self.lights.clear();
            return vec![BoardOutcome::Settled { mv }];
        }
        self.show_settling(&sync);
        self.intent = MoveIntent::Settling { mv, sync };
        vec![BoardOutcome::SettlingPending { mv }]
    }

    fn remote_delta(
        &mut self,
        oracle: &mut dyn ChessOracle,
        mv: BoardMove,
        mut sync: PhysicalSync,
        delta: &Delta,
    ) -> Vec<BoardOutcome> {
        if !sync.advance(delta) {
            debug!("Remote move {} not yet completed", mv);
            self.show_remote_guides(&mv, &sync);
            self.intent = MoveIntent::RemoteHeld { mv, sync };
            return vec![BoardOutcome::RemoteMoveIncomplete { mv }];
        }

        self.lights.clear();
        if !oracle.validate_and_apply(&mv) {
            warn!("Remote move {} no longer legal after physical execution", mv);
            return vec![BoardOutcome::IllegalMove { mv }];
        }
        info!("Remote move {} completed on the board", mv);
        let mut outcomes = vec![BoardOutcome::RemoteMoveCompleted {
            mv,
            fen: oracle.fen(),
        }];
        outcomes.extend(game_over(oracle));
        outcomes
    }

    /// Follows the player while the board is out of sync. A lift that
    /// leaves exactly one movable piece in hand resumes as that piece's lift,
    /// so an illegal placement can be corrected to a legal square. A
    /// placement that leaves exactly one legal move's footprint plays it.
    fn restoring_delta(
        &mut self,
        oracle: &mut dyn ChessOracle,
        mut offset: Delta,
        delta: &Delta,
    ) -> Vec<BoardOutcome> {
        offset.merge(delta);
        if offset.is_empty() {
            info!("Board matches the position again");
            self.lights.clear();
            return vec![BoardOutcome::BoardRestored];
        }
        if let DeltaShape::Lift(_) = delta.shape() {
            if let DeltaShape::Lift(from) = offset.shape() {
                if !oracle.legal_destinations(from).is_empty() {
                    return self.begin_lift(oracle, from, offset);
                }
            }
        } else if let Some(mv) = matching_move(oracle, &offset) {
            debug!("Board difference matches {}", mv);
            return self.apply_local(oracle, mv, offset);
        }
        self.restore(offset)
    }

    fn restore(&mut self, offset: Delta) -> Vec<BoardOutcome> {
        debug!(
            "Board out of sync: missing {:?}, extra {:?}",
            offset.vacated, offset.occupied
        );
        self.lights.clear();
        self.lights
            .highlight(offset.vacated.iter().copied(), LightRole::GuideEnd);
        self.lights
            .highlight(offset.occupied.iter().copied(), LightRole::Error);
        let outcome = BoardOutcome::OutOfSync {
            missing: offset.vacated.iter().copied().collect(),
            extra: offset.occupied.iter().copied().collect(),
        };
        self.intent = MoveIntent::Restoring { offset };
        vec![outcome]
    }

    fn show_remote_guides(&mut self, mv: &BoardMove, sync: &PhysicalSync) {
        let mut starts: BTreeSet<Square> = sync.expected.vacated.clone();
        starts.insert(mv.start);
        let mut ends: BTreeSet<Square> = sync.expected.occupied.clone();
        ends.insert(mv.end);
        let allowed: BTreeSet<Square> = starts.union(&ends).copied().collect();
        let stray = sync.stray(&allowed);

        self.lights.clear();
        self.lights.highlight(starts, LightRole::GuideStart);
        self.lights.highlight(ends, LightRole::GuideEnd);
        self.lights.highlight(stray, LightRole::Error);
    }

    fn show_settling(&mut self, sync: &PhysicalSync) {
        let stray = sync.stray(&BTreeSet::new());
        self.lights.clear();
        self.lights.highlight(sync.remaining_vacated(), LightRole::GuideStart);
        self.lights.highlight(sync.remaining_occupied(), LightRole::GuideEnd);
        self.lights.highlight(stray, LightRole::Error);
    }
}

/// The single legal move whose footprint is exactly `delta`, if any.
/// Under-promotions are ignored so a promotion footprint stays unambiguous.
fn matching_move(oracle: &dyn ChessOracle, delta: &Delta) -> Option<BoardMove> {
    let mut matches = oracle.legal_moves().into_iter().filter(|mv| {
        mv.promotion.map_or(true, |p| p == Promotion::Queen)
            && oracle.footprint(mv).as_ref() == Some(delta)
    });
    let first = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some(first)
}

fn ambiguity(delta: &Delta) -> BoardOutcome {
    debug!(
        "Unrecognised delta: vacated {:?}, occupied {:?}",
        delta.vacated, delta.occupied
    );
    BoardOutcome::SensorAmbiguity {
        vacated: delta.vacated.iter().copied().collect(),
        occupied: delta.occupied.iter().copied().collect(),
    }
}

fn game_over(oracle: &dyn ChessOracle) -> Option<BoardOutcome> {
    let result = oracle.result()?;
    info!("Game over: {}", result);
    Some(BoardOutcome::GameOver { result })
}
