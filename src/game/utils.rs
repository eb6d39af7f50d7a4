use chess::{Board, GameResult, Piece};
use std::fmt;

/// Final result of a game, written the PGN way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    WhiteWins,
    BlackWins,
    Draw,
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameOutcome::WhiteWins => "1-0",
            GameOutcome::BlackWins => "0-1",
            GameOutcome::Draw => "1/2-1/2",
        })
    }
}

pub fn outcome_of(result: GameResult) -> GameOutcome {
    match result {
        GameResult::WhiteCheckmates => GameOutcome::WhiteWins,
        GameResult::BlackCheckmates => GameOutcome::BlackWins,
        GameResult::WhiteResigns => GameOutcome::BlackWins,
        GameResult::BlackResigns => GameOutcome::WhiteWins,
        GameResult::Stalemate => GameOutcome::Draw,
        GameResult::DrawAccepted => GameOutcome::Draw,
        GameResult::DrawDeclared => GameOutcome::Draw,
    }
}

/// Check if the board has insufficient material for checkmate
pub fn has_insufficient_material(board: &Board) -> bool {
    let mut minor_pieces = 0;

    for square in *board.combined() {
        match board.piece_on(square) {
            Some(Piece::Pawn) | Some(Piece::Rook) | Some(Piece::Queen) => return false,
            Some(Piece::Knight) | Some(Piece::Bishop) => minor_pieces += 1,
            _ => {}
        }
    }

    // A lone knight or bishop cannot force mate against a bare king
    minor_pieces <= 1
}
