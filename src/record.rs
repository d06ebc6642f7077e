//! Compact binary snapshot of a [`Game`] for opaque storage.
//!
//! Layout, little-endian:
//!
//! | offset | size | field                                  |
//! |--------|------|----------------------------------------|
//! | 0      | 4    | magic `RVSG`                           |
//! | 4      | 4    | version (1)                            |
//! | 8      | 4    | payload length                         |
//! | 12     | 4    | CRC32 of the payload                   |
//! | 16     | 4    | reserved (0)                           |
//! | 20     | 1    | dimension `D`                          |
//! | 21     | 1    | turn (0=over, 1=first, 2=second)       |
//! | 22     | 1    | opponent (0=human, 1=cpu, 2=vacant)    |
//! | 23     | 8    | last activity, ms since the Unix epoch |
//! | 31     | D²   | cells (0=empty, 1=first, 2=second)     |

use crate::board::{Board, validate_dimension};
use crate::error::EngineError;
use crate::game::Game;
use crate::types::{Cell, OpponentKind, TurnState};

const MAGIC: &[u8; 4] = b"RVSG";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 20;
const FIXED_PAYLOAD_SIZE: usize = 11;

impl Game {
    /// Encodes the game as a checksummed binary record.
    pub fn to_bytes(&self) -> Vec<u8> {
        let board = self.board();
        let mut payload = Vec::with_capacity(FIXED_PAYLOAD_SIZE + board.cells().len());
        payload.push(board.dimension() as u8);
        payload.push(self.turn().to_u8());
        payload.push(self.opponent().to_u8());
        payload.extend_from_slice(&self.last_activity().to_le_bytes());
        payload.extend_from_slice(&board.to_bytes());

        let crc = crc32fast::hash(&payload);
        let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&payload);
        out
    }

    /// Decodes a record produced by [`Game::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, EngineError> {
        if data.len() < HEADER_SIZE {
            return Err(corrupt(format!(
                "record too short: expected at least {HEADER_SIZE} bytes, got {}",
                data.len()
            )));
        }

        if &data[0..4] != MAGIC {
            return Err(corrupt("invalid record magic (expected RVSG)"));
        }

        let version = read_u32_le(data, 4)?;
        if version != VERSION {
            return Err(corrupt(format!(
                "unsupported record version: expected {VERSION}, got {version}"
            )));
        }

        let payload_len = read_u32_le(data, 8)? as usize;
        let expected_crc = read_u32_le(data, 12)?;
        let payload = &data[HEADER_SIZE..];
        if payload.len() != payload_len {
            return Err(corrupt(format!(
                "payload length mismatch: header says {payload_len}, got {}",
                payload.len()
            )));
        }

        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            return Err(corrupt(format!(
                "CRC32 mismatch: expected {expected_crc:#010x}, got {actual_crc:#010x}"
            )));
        }

        if payload.len() < FIXED_PAYLOAD_SIZE {
            return Err(corrupt("unexpected EOF while reading game fields"));
        }

        let dimension = payload[0] as usize;
        validate_dimension(dimension)
            .map_err(|_| corrupt(format!("unsupported board dimension {dimension}")))?;
        let turn = TurnState::from_u8(payload[1])
            .ok_or_else(|| corrupt(format!("invalid turn byte {}", payload[1])))?;
        let opponent = OpponentKind::from_u8(payload[2])
            .ok_or_else(|| corrupt(format!("invalid opponent byte {}", payload[2])))?;
        let mut activity = [0u8; 8];
        activity.copy_from_slice(&payload[3..FIXED_PAYLOAD_SIZE]);
        let last_activity = u64::from_le_bytes(activity);

        let cell_bytes = &payload[FIXED_PAYLOAD_SIZE..];
        if cell_bytes.len() != dimension * dimension {
            return Err(corrupt(format!(
                "expected {} cells for a {dimension}x{dimension} board, got {}",
                dimension * dimension,
                cell_bytes.len()
            )));
        }
        let cells = cell_bytes
            .iter()
            .enumerate()
            .map(|(idx, &b)| {
                Cell::from_u8(b).ok_or_else(|| corrupt(format!("invalid cell byte {b} at {idx}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Game::from_parts(Board::from_cells(cells)?, turn, opponent, last_activity)
    }
}

fn corrupt(message: impl Into<String>) -> EngineError {
    EngineError::CorruptRecord(message.into())
}

fn read_u32_le(data: &[u8], offset: usize) -> Result<u32, EngineError> {
    if offset + 4 > data.len() {
        return Err(corrupt("unexpected EOF while reading u32"));
    }
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    Ok(u32::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::types::Token;

    fn played_game() -> Game {
        let mut game = Game::new(GameConfig::against(OpponentKind::Cpu)).unwrap();
        game.submit_move_at(Token::First, 2, 3, 1_700_000_000_000).unwrap();
        game
    }

    fn reseal(bytes: &mut [u8]) {
        let crc = crc32fast::hash(&bytes[HEADER_SIZE..]);
        bytes[12..16].copy_from_slice(&crc.to_le_bytes());
    }

    fn message(err: EngineError) -> String {
        match err {
            EngineError::CorruptRecord(message) => message,
            other => panic!("expected a corrupt record error, got {other:?}"),
        }
    }

    #[test]
    fn from_bytes_restores_every_field() {
        let game = played_game();
        let bytes = game.to_bytes();

        assert_eq!(bytes.len(), HEADER_SIZE + FIXED_PAYLOAD_SIZE + 64);
        assert_eq!(Game::from_bytes(&bytes), Ok(game));
    }

    #[test]
    fn small_board_record_has_matching_cell_count() {
        let game = Game::new(GameConfig {
            dimension: 4,
            opponent: OpponentKind::Vacant,
        })
        .unwrap();
        let bytes = game.to_bytes();

        assert_eq!(bytes[HEADER_SIZE], 4);
        assert_eq!(bytes.len(), HEADER_SIZE + FIXED_PAYLOAD_SIZE + 16);
        assert_eq!(Game::from_bytes(&bytes), Ok(game));
    }

    #[test]
    fn from_bytes_rejects_invalid_magic() {
        let mut bytes = played_game().to_bytes();
        bytes[0] = b'X';

        assert!(message(Game::from_bytes(&bytes).unwrap_err()).contains("magic"));
    }

    #[test]
    fn from_bytes_rejects_unsupported_version() {
        let mut bytes = played_game().to_bytes();
        bytes[4..8].copy_from_slice(&2u32.to_le_bytes());

        assert!(message(Game::from_bytes(&bytes).unwrap_err()).contains("version"));
    }

    #[test]
    fn from_bytes_rejects_crc_mismatch() {
        let mut bytes = played_game().to_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        assert!(message(Game::from_bytes(&bytes).unwrap_err()).contains("CRC32"));
    }

    #[test]
    fn from_bytes_rejects_truncated_record() {
        let bytes = played_game().to_bytes();

        assert!(message(Game::from_bytes(&bytes[..10]).unwrap_err()).contains("too short"));
        let short = &bytes[..bytes.len() - 1];
        assert!(message(Game::from_bytes(short).unwrap_err()).contains("length mismatch"));
    }

    #[test]
    fn from_bytes_rejects_bad_enum_bytes_even_with_valid_crc() {
        let mut bytes = played_game().to_bytes();
        bytes[HEADER_SIZE + 1] = 9;
        reseal(&mut bytes);
        assert!(message(Game::from_bytes(&bytes).unwrap_err()).contains("turn"));

        let mut bytes = played_game().to_bytes();
        let last = bytes.len() - 1;
        bytes[last] = 3;
        reseal(&mut bytes);
        assert!(message(Game::from_bytes(&bytes).unwrap_err()).contains("cell"));
    }

    #[test]
    fn from_bytes_rejects_turn_the_game_could_not_reach() {
        let mut bytes = played_game().to_bytes();
        bytes[HEADER_SIZE + 1] = TurnState::SecondPlayerTurn.to_u8();
        reseal(&mut bytes);
        assert!(message(Game::from_bytes(&bytes).unwrap_err()).contains("computer"));

        let mut bytes = played_game().to_bytes();
        bytes[HEADER_SIZE + 1] = TurnState::GameOver.to_u8();
        reseal(&mut bytes);
        assert!(message(Game::from_bytes(&bytes).unwrap_err()).contains("marked over"));
    }

    #[test]
    fn from_bytes_rejects_unsupported_dimension() {
        let mut bytes = played_game().to_bytes();
        bytes[HEADER_SIZE] = 7;
        reseal(&mut bytes);

        assert!(message(Game::from_bytes(&bytes).unwrap_err()).contains("dimension"));
    }
}
