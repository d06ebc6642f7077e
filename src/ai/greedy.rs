use tracing::{debug, instrument};

use crate::board::Board;
use crate::error::EngineError;
use crate::types::{ComputerMove, Token};

/// The computer always plays the second token.
pub const COMPUTER_TOKEN: Token = Token::Second;

/// Result of one round of computer play.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputerTurns {
    /// Moves made, in order. Empty when the computer had to pass.
    pub moves: Vec<ComputerMove>,
    /// Contract:
    /// - `true` when neither side can move after the computer is done.
    /// - `false` when the opposing side has a legal move.
    pub game_over: bool,
}

/// Picks the placement flipping the most tokens for `token`.
///
/// Ties go to the first cell in the board's scan order. Returns `None`
/// when `token` has no legal move.
pub fn choose_computer_move(board: &Board, token: Token) -> Option<ComputerMove> {
    let mut best: Option<ComputerMove> = None;

    for at in board.scan_order() {
        let flips = board.flips_at(at, token);
        if is_better_move(flips.len(), best.as_ref()) {
            best = Some(ComputerMove {
                placement: at,
                flips,
            });
        }
    }

    best
}

/// Plays computer moves until the opposing side can move again or the game ends.
#[instrument(skip(board), level = "debug")]
pub fn take_computer_turns(board: &mut Board) -> Result<ComputerTurns, EngineError> {
    let human = COMPUTER_TOKEN.opponent();
    let mut turns = ComputerTurns::default();

    // Every move fills a cell, so the loop ends before the board runs out of them.
    for _ in 0..board.cells().len() {
        let Some(mv) = choose_computer_move(board, COMPUTER_TOKEN) else {
            turns.game_over = !board.has_moves(human);
            return Ok(turns);
        };

        board.apply_move(mv.placement, COMPUTER_TOKEN, &mv.flips)?;
        debug!(
            x = mv.placement.x,
            y = mv.placement.y,
            flipped = mv.flips.len(),
            "computer moved"
        );
        turns.moves.push(mv);

        if board.has_moves(human) {
            return Ok(turns);
        }
    }

    turns.game_over = board.is_game_over();
    Ok(turns)
}

fn is_better_move(flip_count: usize, best: Option<&ComputerMove>) -> bool {
    flip_count > best.map_or(0, |mv| mv.flips.len())
}
