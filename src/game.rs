use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::ai::take_computer_turns;
use crate::board::Board;
use crate::config::GameConfig;
use crate::error::EngineError;
use crate::types::{Coord, GameResult, GameState, MoveOutcome, OpponentKind, Token, TurnState};

/// One game: the board plus the turn state machine driving it.
///
/// The caller owns persistence and must not run two `submit_move` calls
/// against the same game concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredGame")]
pub struct Game {
    board: Board,
    turn: TurnState,
    opponent: OpponentKind,
    /// Milliseconds since the Unix epoch of the last successful move.
    last_activity: u64,
}

impl Game {
    pub fn new(config: GameConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            board: Board::with_dimension(config.dimension)?,
            turn: TurnState::FirstPlayerTurn,
            opponent: config.opponent,
            last_activity: now_millis(),
        })
    }

    /// Reassembles a game from stored fields.
    ///
    /// Rejects combinations `submit_move` never produces: the computer to
    /// move, a side to move without a legal move, or a finished game on a
    /// board where someone can still play.
    pub fn from_parts(
        board: Board,
        turn: TurnState,
        opponent: OpponentKind,
        last_activity: u64,
    ) -> Result<Self, EngineError> {
        if opponent == OpponentKind::Cpu && turn == TurnState::SecondPlayerTurn {
            return Err(EngineError::CorruptRecord(
                "computer game cannot be waiting on the second side".to_string(),
            ));
        }
        match turn.to_move() {
            Some(side) if !board.has_moves(side) => {
                return Err(EngineError::CorruptRecord(format!(
                    "{side:?} is to move but has no legal move"
                )));
            }
            None if !board.is_game_over() => {
                return Err(EngineError::CorruptRecord(
                    "game marked over while a side can still move".to_string(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            board,
            turn,
            opponent,
            last_activity,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> TurnState {
        self.turn
    }

    pub fn opponent(&self) -> OpponentKind {
        self.opponent
    }

    pub fn last_activity(&self) -> u64 {
        self.last_activity
    }

    pub fn is_game_over(&self) -> bool {
        self.turn == TurnState::GameOver
    }

    pub fn possible_moves(&self, token: Token) -> Option<Vec<Coord>> {
        self.board.possible_moves(token)
    }

    pub fn score(&self, token: Token) -> usize {
        self.board.score(token)
    }

    /// Plays `acting`'s move at `(x, y)` and advances the turn.
    ///
    /// Against the computer, its replies are played before returning and
    /// the turn comes back to the first player unless the game ended.
    pub fn submit_move(
        &mut self,
        acting: Token,
        x: i32,
        y: i32,
    ) -> Result<MoveOutcome, EngineError> {
        self.submit_move_at(acting, x, y, now_millis())
    }

    /// [`Game::submit_move`] with an explicit activity timestamp.
    #[instrument(skip(self, now), fields(turn = ?self.turn, opponent = ?self.opponent))]
    pub fn submit_move_at(
        &mut self,
        acting: Token,
        x: i32,
        y: i32,
        now: u64,
    ) -> Result<MoveOutcome, EngineError> {
        if self.turn == TurnState::GameOver {
            return Err(EngineError::GameOver);
        }
        if acting == Token::Second && self.opponent == OpponentKind::Vacant {
            return Err(EngineError::SeatVacant);
        }
        if self.turn.to_move() != Some(acting) {
            return Err(EngineError::NotYourTurn);
        }

        let flipped = self.board.take_player_turn(x, y, acting)?;
        let mut computer_moves = Vec::new();
        let mut opponent_passed = false;

        self.turn = match (self.opponent, acting) {
            (OpponentKind::Cpu, Token::First) => {
                let turns = take_computer_turns(&mut self.board)?;
                opponent_passed = turns.moves.is_empty() && !turns.game_over;
                computer_moves = turns.moves;
                if turns.game_over {
                    TurnState::GameOver
                } else {
                    TurnState::FirstPlayerTurn
                }
            }
            _ => {
                let other = acting.opponent();
                if self.board.has_moves(other) {
                    TurnState::for_token(other)
                } else if self.board.has_moves(acting) {
                    opponent_passed = true;
                    TurnState::for_token(acting)
                } else {
                    TurnState::GameOver
                }
            }
        };
        self.last_activity = now;

        if self.turn == TurnState::GameOver {
            info!(
                first = self.board.score(Token::First),
                second = self.board.score(Token::Second),
                "game over"
            );
        } else {
            debug!(turn = ?self.turn, opponent_passed, "turn advanced");
        }

        Ok(MoveOutcome {
            turn: self.turn,
            flipped,
            computer_moves,
            opponent_passed,
        })
    }

    /// Lets a guest take the vacant second seat.
    pub fn seat_guest(&mut self) -> Result<(), EngineError> {
        match self.opponent {
            OpponentKind::Vacant => {
                self.opponent = OpponentKind::Human;
                Ok(())
            }
            _ => Err(EngineError::SeatUnavailable),
        }
    }

    /// Marks the human second seat as left.
    pub fn vacate_seat(&mut self) -> Result<(), EngineError> {
        match self.opponent {
            OpponentKind::Human => {
                self.opponent = OpponentKind::Vacant;
                Ok(())
            }
            _ => Err(EngineError::SeatUnavailable),
        }
    }

    pub fn state(&self) -> GameState {
        GameState {
            board: self.board.to_bytes(),
            dimension: self.board.dimension(),
            turn: self.turn,
            opponent: self.opponent,
            first_count: self.board.score(Token::First),
            second_count: self.board.score(Token::Second),
            is_game_over: self.is_game_over(),
            possible_moves: self.turn.to_move().and_then(|t| self.board.possible_moves(t)),
            last_activity: self.last_activity,
        }
    }

    pub fn result(&self) -> GameResult {
        let first_count = self.board.score(Token::First);
        let second_count = self.board.score(Token::Second);
        GameResult {
            winner: match first_count.cmp(&second_count) {
                std::cmp::Ordering::Greater => Some(Token::First),
                std::cmp::Ordering::Less => Some(Token::Second),
                std::cmp::Ordering::Equal => None,
            },
            first_count,
            second_count,
        }
    }
}

/// Field-for-field mirror of [`Game`], checked by [`Game::from_parts`] on load.
#[derive(Deserialize)]
struct StoredGame {
    board: Board,
    turn: TurnState,
    opponent: OpponentKind,
    last_activity: u64,
}

impl TryFrom<StoredGame> for Game {
    type Error = EngineError;

    fn try_from(stored: StoredGame) -> Result<Self, Self::Error> {
        Game::from_parts(stored.board, stored.turn, stored.opponent, stored.last_activity)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}
