//! Browser-facing bindings around [`Game`].

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::GameConfig;
use crate::error::EngineError;
use crate::game::Game;
use crate::types::Token;

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}

/// A game handle owned by the page.
#[wasm_bindgen]
pub struct WasmGame {
    game: Game,
}

#[wasm_bindgen]
impl WasmGame {
    /// `config` may be `undefined`, `null` or a partial `GameConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmGame, JsError> {
        let config = if config.is_undefined() || config.is_null() {
            GameConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| JsError::new(&e.to_string()))?
        };
        let game = Game::new(config).map_err(engine_error)?;
        Ok(Self { game })
    }

    /// Plays a move for `side` (1=first, 2=second) and returns the outcome.
    #[wasm_bindgen(js_name = submitMove)]
    pub fn submit_move(&mut self, side: u8, x: i32, y: i32) -> Result<JsValue, JsError> {
        let side = Token::try_from(side).map_err(engine_error)?;
        let outcome = self.game.submit_move(side, x, y).map_err(engine_error)?;
        to_js(&outcome)
    }

    /// Legal moves for `side`, or `null` when it has none.
    #[wasm_bindgen(js_name = possibleMoves)]
    pub fn possible_moves(&self, side: u8) -> Result<JsValue, JsError> {
        let side = Token::try_from(side).map_err(engine_error)?;
        to_js(&self.game.possible_moves(side))
    }

    pub fn state(&self) -> Result<JsValue, JsError> {
        to_js(&self.game.state())
    }

    pub fn result(&self) -> Result<JsValue, JsError> {
        to_js(&self.game.result())
    }

    #[wasm_bindgen(js_name = seatGuest)]
    pub fn seat_guest(&mut self) -> Result<(), JsError> {
        self.game.seat_guest().map_err(engine_error)
    }

    #[wasm_bindgen(js_name = vacateSeat)]
    pub fn vacate_seat(&mut self) -> Result<(), JsError> {
        self.game.vacate_seat().map_err(engine_error)
    }

    #[wasm_bindgen(js_name = toBytes)]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.game.to_bytes()
    }

    #[wasm_bindgen(js_name = fromBytes)]
    pub fn from_bytes(bytes: &[u8]) -> Result<WasmGame, JsError> {
        let game = Game::from_bytes(bytes).map_err(engine_error)?;
        Ok(Self { game })
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsError::new(&e.to_string()))
}

/// Prefixes the message with the error code so pages can branch on it.
fn engine_error(err: EngineError) -> JsError {
    JsError::new(&format!("{}: {err}", err.code()))
}
