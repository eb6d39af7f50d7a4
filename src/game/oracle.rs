use chess::{ChessMove, Game, MoveGen, Piece, Rank};
use std::collections::BTreeSet;

use super::utils::{has_insufficient_material, outcome_of, GameOutcome};
use crate::board::{BoardMove, Delta, Promotion, Square};

/// Rules engine as seen by the board controller.
pub trait ChessOracle: Send {
    /// Every legal move in the current position; empty once the game is over.
    fn legal_moves(&self) -> Vec<BoardMove>;

    /// Fills in what a physical move leaves implicit (the promotion piece) and
    /// returns the move only if it is legal.
    fn resolve(&self, mv: &BoardMove) -> Option<BoardMove>;

    /// Occupancy change the move causes on the physical board, `None` when
    /// the move is not legal.
    fn footprint(&self, mv: &BoardMove) -> Option<Delta>;

    fn validate_and_apply(&mut self, mv: &BoardMove) -> bool;

    fn result(&self) -> Option<GameOutcome>;

    fn fen(&self) -> String;

    fn legal_destinations(&self, from: Square) -> Vec<Square> {
        let destinations: BTreeSet<Square> = self
            .legal_moves()
            .into_iter()
            .filter(|mv| mv.start == from)
            .map(|mv| mv.end)
            .collect();
        destinations.into_iter().collect()
    }

    fn is_legal(&self, mv: &BoardMove) -> bool {
        self.resolve(mv).is_some()
    }

    fn is_over(&self) -> bool {
        self.result().is_some()
    }
}

pub type OracleFactory = Box<dyn Fn() -> Box<dyn ChessOracle> + Send>;

/// [`ChessOracle`] over the `chess` crate.
///
/// Claimable draws (threefold repetition, fifty-move rule) and dead positions
/// end the game without anyone having to claim them.
pub struct ChessGame {
    game: Game,
}

impl ChessGame {
    pub fn new() -> Self {
        ChessGame { game: Game::new() }
    }

    pub fn from_fen(fen: &str) -> Option<Self> {
        Game::new_from_fen(fen).map(|game| ChessGame { game })
    }

    fn to_chess_move(&self, mv: &BoardMove) -> Option<ChessMove> {
        if self.is_over() {
            return None;
        }
        let board = self.game.current_position();
        let source: chess::Square = mv.start.into();
        let dest: chess::Square = mv.end.into();
        let promotion = match mv.promotion {
            Some(promotion) => Some(promotion_piece(promotion)),
            None if board.piece_on(source) == Some(Piece::Pawn)
                && matches!(dest.get_rank(), Rank::First | Rank::Eighth) =>
            {
                Some(Piece::Queen)
            }
            None => None,
        };
        let chess_move = ChessMove::new(source, dest, promotion);
        if board.legal(chess_move) {
            Some(chess_move)
        } else {
            None
        }
    }
}

impl Default for ChessGame {
    fn default() -> Self {
        ChessGame::new()
    }
}

impl ChessOracle for ChessGame {
    fn legal_moves(&self) -> Vec<BoardMove> {
        if self.is_over() {
            return Vec::new();
        }
        MoveGen::new_legal(&self.game.current_position())
            .map(board_move)
            .collect()
    }

    fn resolve(&self, mv: &BoardMove) -> Option<BoardMove> {
        self.to_chess_move(mv).map(board_move)
    }

    fn footprint(&self, mv: &BoardMove) -> Option<Delta> {
        let chess_move = self.to_chess_move(mv)?;
        let before = self.game.current_position();
        let after = before.make_move_new(chess_move);
        let was = *before.combined();
        let now = *after.combined();
        Some(Delta::new(
            (was & !now).map(Square::from),
            (now & !was).map(Square::from),
        ))
    }

    fn validate_and_apply(&mut self, mv: &BoardMove) -> bool {
        match self.to_chess_move(mv) {
            Some(chess_move) => self.game.make_move(chess_move),
            None => false,
        }
    }

    fn result(&self) -> Option<GameOutcome> {
        if let Some(result) = self.game.result() {
            return Some(outcome_of(result));
        }
        if has_insufficient_material(&self.game.current_position()) || self.game.can_declare_draw() {
            return Some(GameOutcome::Draw);
        }
        None
    }

    fn fen(&self) -> String {
        self.game.current_position().to_string()
    }
}

fn promotion_piece(promotion: Promotion) -> Piece {
    match promotion {
        Promotion::Queen => Piece::Queen,
        Promotion::Rook => Piece::Rook,
        Promotion::Bishop => Piece::Bishop,
        Promotion::Knight => Piece::Knight,
    }
}

fn board_move(chess_move: ChessMove) -> BoardMove {
    let mv = BoardMove::new(chess_move.get_source().into(), chess_move.get_dest().into());
    match chess_move.get_promotion() {
        Some(Piece::Queen) => mv.with_promotion(Promotion::Queen),
        Some(Piece::Rook) => mv.with_promotion(Promotion::Rook),
        Some(Piece::Bishop) => mv.with_promotion(Promotion::Bishop),
        Some(Piece::Knight) => mv.with_promotion(Promotion::Knight),
        _ => mv,
    }
}
