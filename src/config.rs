//! Settings chosen when a game is created.

use serde::{Deserialize, Serialize};

use crate::board::{DEFAULT_DIMENSION, validate_dimension};
use crate::error::EngineError;
use crate::types::OpponentKind;

/// Configuration for a new game.
///
/// Missing fields fall back to their defaults, so `{}` (or `{"opponent": "cpu"}`)
/// is a valid config coming from the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board side length; even, in `4..=16`.
    pub dimension: usize,
    /// Who sits in the second seat.
    pub opponent: OpponentKind,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
            opponent: OpponentKind::Human,
        }
    }
}

impl GameConfig {
    pub fn against(opponent: OpponentKind) -> Self {
        Self {
            opponent,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        validate_dimension(self.dimension)
    }
}
