//! Error type shared by the board engine, the turn controller and the record codec.

use derive_more::Display;

/// Every way an engine operation can fail.
///
/// No variant is produced after a partial mutation: operations validate
/// their input completely before touching the board or the turn state.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum EngineError {
    /// A coordinate lies outside `[0, dimension)`.
    #[display("coordinate ({x}, {y}) is outside 0..{dimension}")]
    OutOfRange { x: i32, y: i32, dimension: usize },

    /// The cell is occupied or the placement sandwiches nothing.
    #[display("illegal move at ({x}, {y})")]
    IllegalMove { x: usize, y: usize },

    /// The acting side does not own the current turn.
    #[display("it is not this side's turn")]
    NotYourTurn,

    /// The game has already ended.
    #[display("game is already over")]
    GameOver,

    /// The second seat has nobody in it.
    #[display("the second seat is vacant")]
    SeatVacant,

    /// Seating or vacating does not apply to the current opponent kind.
    #[display("the second seat cannot change occupants")]
    SeatUnavailable,

    /// A flip target was empty or off the board. Indicates a bug in flip
    /// computation rather than bad user input.
    #[display("tried to flip empty space ({x}, {y})")]
    InvalidFlip { x: usize, y: usize },

    /// A raw value that does not name a player token.
    #[display("token must be 1 (first) or 2 (second): {_0}")]
    InvalidToken(u8),

    /// Board dimension is odd or outside the supported range.
    #[display("board dimension must be even and in 4..=16: {_0}")]
    InvalidDimension(usize),

    /// A cell sequence whose length is not the square of a supported dimension.
    #[display("board of {_0} cells is not a supported square")]
    InvalidBoard(usize),

    /// A persisted game record failed validation.
    #[display("corrupt game record: {_0}")]
    CorruptRecord(String),
}

impl std::error::Error for EngineError {}

impl EngineError {
    /// Stable machine-readable code, for callers that pick user messaging by kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::OutOfRange { .. } => "out_of_range",
            Self::IllegalMove { .. } => "illegal_move",
            Self::NotYourTurn => "not_your_turn",
            Self::GameOver => "game_over",
            Self::SeatVacant => "seat_vacant",
            Self::SeatUnavailable => "seat_unavailable",
            Self::InvalidFlip { .. } => "invalid_flip",
            Self::InvalidToken(_) => "invalid_token",
            Self::InvalidDimension(_) => "invalid_dimension",
            Self::InvalidBoard(_) => "invalid_board",
            Self::CorruptRecord(_) => "corrupt_record",
        }
    }
}
