pub mod ai;
pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod record;
pub mod types;
pub mod wasm;

pub use board::Board;
pub use config::GameConfig;
pub use error::EngineError;
pub use game::Game;
pub use types::{Cell, Coord, GameResult, GameState, MoveOutcome, OpponentKind, Token, TurnState};
