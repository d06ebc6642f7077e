use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Contents of one board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    #[default]
    Empty,
    First,
    Second,
}

impl Cell {
    /// Byte form used by the record codec and the WASM board array:
    /// 0=empty, 1=first, 2=second.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::First => 1,
            Self::Second => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Empty),
            1 => Some(Self::First),
            2 => Some(Self::Second),
            _ => None,
        }
    }

    pub fn token(self) -> Option<Token> {
        match self {
            Self::Empty => None,
            Self::First => Some(Token::First),
            Self::Second => Some(Token::Second),
        }
    }
}

/// A player's marker. The first player always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Token {
    First,
    Second,
}

impl Token {
    pub fn opponent(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

impl From<Token> for Cell {
    fn from(token: Token) -> Self {
        match token {
            Token::First => Cell::First,
            Token::Second => Cell::Second,
        }
    }
}

impl TryFrom<u8> for Token {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Cell::from_u8(value)
            .and_then(Cell::token)
            .ok_or(EngineError::InvalidToken(value))
    }
}

/// A board coordinate. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Whose move it is, or that nobody moves anymore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    #[default]
    FirstPlayerTurn,
    SecondPlayerTurn,
    GameOver,
}

impl TurnState {
    /// The side allowed to move, `None` once the game is over.
    pub fn to_move(self) -> Option<Token> {
        match self {
            Self::FirstPlayerTurn => Some(Token::First),
            Self::SecondPlayerTurn => Some(Token::Second),
            Self::GameOver => None,
        }
    }

    pub fn for_token(token: Token) -> Self {
        match token {
            Token::First => Self::FirstPlayerTurn,
            Token::Second => Self::SecondPlayerTurn,
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::FirstPlayerTurn => 1,
            Self::SecondPlayerTurn => 2,
            Self::GameOver => 0,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::GameOver),
            1 => Some(Self::FirstPlayerTurn),
            2 => Some(Self::SecondPlayerTurn),
            _ => None,
        }
    }
}

/// Who occupies the second seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpponentKind {
    #[default]
    Human,
    Cpu,
    /// Nobody: the guest left, or has not joined yet.
    Vacant,
}

impl OpponentKind {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::Human => 0,
            Self::Cpu => 1,
            Self::Vacant => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Human),
            1 => Some(Self::Cpu),
            2 => Some(Self::Vacant),
            _ => None,
        }
    }
}

/// A computer placement together with the cells it flips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputerMove {
    pub placement: Coord,
    pub flips: Vec<Coord>,
}

/// What a successful `submit_move` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub turn: TurnState,
    /// Cells flipped by the submitted move.
    pub flipped: Vec<Coord>,
    /// Moves the computer made in response, in order.
    pub computer_moves: Vec<ComputerMove>,
    /// Contract:
    /// - `true` when the other side had no legal move and was skipped.
    /// - `false` otherwise, including when the game ended.
    pub opponent_passed: bool,
}

/// Public game state for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameState {
    /// Row-major cells, 0=empty, 1=first, 2=second.
    pub board: Vec<u8>,
    pub dimension: usize,
    pub turn: TurnState,
    pub opponent: OpponentKind,
    pub first_count: usize,
    pub second_count: usize,
    pub is_game_over: bool,
    /// Legal moves for the side to move; `None` when it has none or the game is over.
    pub possible_moves: Option<Vec<Coord>>,
    pub last_activity: u64,
}

/// Final tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameResult {
    /// `None` on a tie.
    pub winner: Option<Token>,
    pub first_count: usize,
    pub second_count: usize,
}
