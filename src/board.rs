use serde::{Deserialize, Serialize};
use tracing::{error, instrument, warn};

use crate::error::EngineError;
use crate::types::{Cell, Coord, Token};

pub const DEFAULT_DIMENSION: usize = 8;
pub const MIN_DIMENSION: usize = 4;
pub const MAX_DIMENSION: usize = 16;

/// Scan order: x-step outer, y-step inner.
const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Reversi board: a flat row-major grid of `dimension²` cells,
/// index = `y * dimension + x`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Cell>", into = "Vec<Cell>")]
pub struct Board {
    dimension: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates the default 8x8 starting board:
    /// (3,3)=second, (4,3)=first, (3,4)=first, (4,4)=second.
    pub fn new() -> Self {
        Self::starting(DEFAULT_DIMENSION)
    }

    /// Creates a starting board of the given dimension.
    pub fn with_dimension(dimension: usize) -> Result<Self, EngineError> {
        validate_dimension(dimension)?;
        Ok(Self::starting(dimension))
    }

    /// Rebuilds a board from persisted cells. The length must be the square
    /// of a supported dimension.
    pub fn from_cells(cells: Vec<Cell>) -> Result<Self, EngineError> {
        let dimension = (MIN_DIMENSION..=MAX_DIMENSION)
            .step_by(2)
            .find(|d| d * d == cells.len())
            .ok_or(EngineError::InvalidBoard(cells.len()))?;
        Ok(Self { dimension, cells })
    }

    fn starting(dimension: usize) -> Self {
        let mut cells = vec![Cell::Empty; dimension * dimension];
        let mid = dimension / 2 - 1;
        cells[mid * dimension + mid] = Cell::Second;
        cells[mid * dimension + mid + 1] = Cell::First;
        cells[(mid + 1) * dimension + mid] = Cell::First;
        cells[(mid + 1) * dimension + mid + 1] = Cell::Second;
        Self { dimension, cells }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns the cell at `(x, y)`.
    pub fn token_at(&self, x: i32, y: i32) -> Result<Cell, EngineError> {
        let at = self.coord(x, y)?;
        Ok(self.cell(at))
    }

    /// Validates untrusted coordinates.
    pub fn coord(&self, x: i32, y: i32) -> Result<Coord, EngineError> {
        if self.in_bounds(x, y) {
            Ok(Coord::new(x as usize, y as usize))
        } else {
            Err(EngineError::OutOfRange {
                x,
                y,
                dimension: self.dimension,
            })
        }
    }

    /// Returns the cells `token` would flip by playing at `(x, y)`.
    /// Empty when the move is illegal.
    pub fn compute_flips(&self, x: i32, y: i32, token: Token) -> Result<Vec<Coord>, EngineError> {
        let at = self.coord(x, y)?;
        Ok(self.flips_at(at, token))
    }

    /// Places `token` at `at` and flips every cell in `flips`.
    ///
    /// `flips` must come from [`Board::compute_flips`]; an empty or
    /// off-board flip target is reported as [`EngineError::InvalidFlip`]
    /// and the board is left unchanged.
    pub fn apply_move(
        &mut self,
        at: Coord,
        token: Token,
        flips: &[Coord],
    ) -> Result<(), EngineError> {
        if at.x >= self.dimension || at.y >= self.dimension {
            return Err(EngineError::OutOfRange {
                x: at.x as i32,
                y: at.y as i32,
                dimension: self.dimension,
            });
        }
        if let Some(bad) = flips.iter().find(|c| {
            c.x >= self.dimension || c.y >= self.dimension || self.cell(**c) == Cell::Empty
        }) {
            error!(x = bad.x, y = bad.y, "flip target is empty or off the board");
            return Err(EngineError::InvalidFlip { x: bad.x, y: bad.y });
        }

        let idx = self.index(at);
        self.cells[idx] = token.into();
        for &c in flips {
            let idx = self.index(c);
            self.cells[idx] = match self.cells[idx] {
                Cell::First => Cell::Second,
                Cell::Second => Cell::First,
                Cell::Empty => unreachable!("flip targets validated above"),
            };
        }
        Ok(())
    }

    /// Plays a move for a human or API caller. Returns the flipped cells.
    #[instrument(skip(self), level = "debug")]
    pub fn take_player_turn(
        &mut self,
        x: i32,
        y: i32,
        token: Token,
    ) -> Result<Vec<Coord>, EngineError> {
        let at = self.coord(x, y)?;
        let flips = self.flips_at(at, token);
        if flips.is_empty() {
            warn!(x, y, ?token, "rejected illegal move");
            return Err(EngineError::IllegalMove { x: at.x, y: at.y });
        }
        self.apply_move(at, token, &flips)?;
        Ok(flips)
    }

    /// Legal moves for `token`, `None` when there are none.
    pub fn possible_moves(&self, token: Token) -> Option<Vec<Coord>> {
        let moves: Vec<Coord> = self
            .scan_order()
            .filter(|&c| !self.flips_at(c, token).is_empty())
            .collect();
        if moves.is_empty() { None } else { Some(moves) }
    }

    pub fn has_moves(&self, token: Token) -> bool {
        self.scan_order().any(|c| !self.flips_at(c, token).is_empty())
    }

    pub fn score(&self, token: Token) -> usize {
        let cell = Cell::from(token);
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == Cell::Empty).count()
    }

    /// True when neither side can move.
    pub fn is_game_over(&self) -> bool {
        !self.has_moves(Token::First) && !self.has_moves(Token::Second)
    }

    /// Cells as bytes, 0=empty, 1=first, 2=second.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.cells.iter().map(|c| c.to_u8()).collect()
    }

    /// Every coordinate, x outer and y inner.
    pub(crate) fn scan_order(&self) -> impl Iterator<Item = Coord> + use<> {
        let dimension = self.dimension;
        (0..dimension).flat_map(move |x| (0..dimension).map(move |y| Coord::new(x, y)))
    }

    pub(crate) fn flips_at(&self, at: Coord, token: Token) -> Vec<Coord> {
        if self.cell(at) != Cell::Empty {
            return Vec::new();
        }

        let me = Cell::from(token);
        let opp = Cell::from(token.opponent());
        let mut flips = Vec::new();

        for (dx, dy) in DIRECTIONS {
            let mut x = at.x as i32 + dx;
            let mut y = at.y as i32 + dy;
            let mut line = Vec::new();

            while self.in_bounds(x, y) {
                let square = Coord::new(x as usize, y as usize);
                let cell = self.cell(square);
                if cell == opp {
                    line.push(square);
                } else {
                    if cell == me {
                        flips.append(&mut line);
                    }
                    break;
                }

                x += dx;
                y += dy;
            }
        }

        flips
    }

    fn cell(&self, at: Coord) -> Cell {
        self.cells[self.index(at)]
    }

    fn index(&self, at: Coord) -> usize {
        at.y * self.dimension + at.x
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        let range = 0..self.dimension as i32;
        range.contains(&x) && range.contains(&y)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<Cell>> for Board {
    type Error = EngineError;

    fn try_from(cells: Vec<Cell>) -> Result<Self, Self::Error> {
        Self::from_cells(cells)
    }
}

impl From<Board> for Vec<Cell> {
    fn from(board: Board) -> Self {
        board.cells
    }
}

pub(crate) fn validate_dimension(dimension: usize) -> Result<(), EngineError> {
    if dimension % 2 == 0 && (MIN_DIMENSION..=MAX_DIMENSION).contains(&dimension) {
        Ok(())
    } else {
        Err(EngineError::InvalidDimension(dimension))
    }
}


#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use quickcheck::quickcheck;

    use super::test_support::board_from_rows;
    use super::*;

    fn c(x: usize, y: usize) -> Coord {
        Coord::new(x, y)
    }

    #[test]
    fn t01_initial_layout_matches_standard_opening() {
        let board = Board::new();

        assert_eq!(board.token_at(3, 3), Ok(Cell::Second));
        assert_eq!(board.token_at(4, 3), Ok(Cell::First));
        assert_eq!(board.token_at(3, 4), Ok(Cell::First));
        assert_eq!(board.token_at(4, 4), Ok(Cell::Second));
        assert_eq!(board.empty_count(), 60);
        assert_eq!(board.score(Token::First), 2);
        assert_eq!(board.score(Token::Second), 2);
    }

    #[test]
    fn t02_initial_first_moves_are_four_expected_squares() {
        let board = Board::new();

        let moves: BTreeSet<Coord> = board
            .possible_moves(Token::First)
            .expect("opening has moves")
            .into_iter()
            .collect();
        let expected: BTreeSet<Coord> = [c(2, 3), c(3, 2), c(4, 5), c(5, 4)].into_iter().collect();

        assert_eq!(moves, expected);
    }

    #[test]
    fn smallest_board_uses_centered_opening() {
        let board = Board::with_dimension(4).unwrap();

        assert_eq!(board.token_at(1, 1), Ok(Cell::Second));
        assert_eq!(board.token_at(2, 1), Ok(Cell::First));
        assert_eq!(board.token_at(1, 2), Ok(Cell::First));
        assert_eq!(board.token_at(2, 2), Ok(Cell::Second));
        assert_eq!(board.possible_moves(Token::First).map(|m| m.len()), Some(4));
    }

    #[test]
    fn unsupported_dimensions_are_rejected() {
        assert_eq!(Board::with_dimension(7), Err(EngineError::InvalidDimension(7)));
        assert_eq!(Board::with_dimension(2), Err(EngineError::InvalidDimension(2)));
        assert_eq!(Board::with_dimension(18), Err(EngineError::InvalidDimension(18)));
        assert_eq!(
            Board::from_cells(vec![Cell::Empty; 10]),
            Err(EngineError::InvalidBoard(10))
        );
    }

    #[test]
    fn token_at_rejects_out_of_range_coordinates() {
        let board = Board::new();

        assert_eq!(
            board.token_at(8, 0),
            Err(EngineError::OutOfRange {
                x: 8,
                y: 0,
                dimension: 8
            })
        );
        assert!(board.token_at(0, -1).is_err());
    }

    #[test]
    fn place_flips_opponent_tokens_and_updates_scores() {
        let mut board = Board::new();

        let flips = board.take_player_turn(2, 3, Token::First).unwrap();

        assert_eq!(flips, vec![c(3, 3)]);
        assert_eq!(board.score(Token::First), 4);
        assert_eq!(board.score(Token::Second), 1);
        assert_eq!(board.empty_count(), 59);
        assert_eq!(board.token_at(2, 3), Ok(Cell::First));
        assert_eq!(board.token_at(3, 3), Ok(Cell::First));
        assert_eq!(board.token_at(4, 4), Ok(Cell::Second));
    }

    #[test]
    fn run_without_closing_token_is_not_flipped() {
        // First at x=2 sees S,S up to the west edge and S,F to the east.
        let board = board_from_rows(&[
            "SS.SF...", "........", "........", "........", "........", "........", "........",
            "........",
        ]);

        let flips = board.compute_flips(2, 0, Token::First).unwrap();

        assert_eq!(flips, vec![c(3, 0)]);
    }

    #[test]
    fn run_ending_in_empty_cell_is_not_flipped() {
        let board = board_from_rows(&["....", ".SS.", "....", "...."]);

        assert!(board.compute_flips(0, 1, Token::First).unwrap().is_empty());
    }

    #[test]
    fn flips_are_collected_from_every_closed_direction_in_scan_order() {
        let mut board = board_from_rows(&["..F.", "S.S.", ".SS.", "FS.."]);

        let flips = board.take_player_turn(2, 3, Token::First).unwrap();

        // North-west run (1,2),(0,1) reaches the edge and stays.
        assert_eq!(flips, vec![c(1, 3), c(2, 2), c(2, 1)]);
        assert_eq!(board.token_at(1, 2), Ok(Cell::Second));
        assert_eq!(board.token_at(0, 1), Ok(Cell::Second));
        assert_eq!(board.token_at(2, 1), Ok(Cell::First));
    }

    #[test]
    fn occupied_cell_yields_no_flips() {
        let board = Board::new();

        assert!(board.compute_flips(3, 3, Token::First).unwrap().is_empty());
    }

    #[test]
    fn illegal_move_returns_error_and_keeps_board_unchanged() {
        let mut board = Board::new();
        let before = board.clone();

        let err = board.take_player_turn(0, 0, Token::First).unwrap_err();

        assert_eq!(err, EngineError::IllegalMove { x: 0, y: 0 });
        assert_eq!(board, before);
    }

    #[test]
    fn apply_move_rejects_empty_flip_target_without_mutating() {
        let mut board = Board::new();
        let before = board.clone();

        let err = board
            .apply_move(c(2, 3), Token::First, &[c(3, 3), c(0, 0)])
            .unwrap_err();

        assert_eq!(err, EngineError::InvalidFlip { x: 0, y: 0 });
        assert_eq!(board, before);
    }

    #[test]
    fn no_moves_is_reported_as_none() {
        let board = board_from_rows(&["FFFF", "FFFF", "FFFF", "FFF."]);

        assert_eq!(board.possible_moves(Token::First), None);
        assert_eq!(board.possible_moves(Token::Second), None);
        assert!(board.is_game_over());
    }

    #[test]
    fn opening_is_not_game_over() {
        assert!(!Board::new().is_game_over());
    }

    #[test]
    fn serde_round_trip_validates_cell_count() {
        let board = Board::new();
        let json = serde_json::to_string(&board).unwrap();

        assert!(json.starts_with("[\"empty\""));
        assert_eq!(serde_json::from_str::<Board>(&json).unwrap(), board);
        assert!(serde_json::from_str::<Board>("[\"empty\",\"first\"]").is_err());
    }

    fn board_from_seed(seed: &[u8]) -> Board {
        let cells = (0..DEFAULT_DIMENSION * DEFAULT_DIMENSION)
            .map(|i| match seed.get(i).copied().unwrap_or(0) % 3 {
                1 => Cell::First,
                2 => Cell::Second,
                _ => Cell::Empty,
            })
            .collect();
        Board::from_cells(cells).unwrap()
    }

    /// Whether `flip` lies on a line from `at` and is closed off by `token`
    /// further along that line with only opposing cells in between.
    fn is_sandwiched(board: &Board, at: Coord, flip: Coord, token: Token) -> bool {
        let dx = flip.x as i32 - at.x as i32;
        let dy = flip.y as i32 - at.y as i32;
        if (dx, dy) == (0, 0) || (dx != 0 && dy != 0 && dx.abs() != dy.abs()) {
            return false;
        }
        let (step_x, step_y) = (dx.signum(), dy.signum());
        let (mut x, mut y) = (flip.x as i32, flip.y as i32);
        loop {
            if !board.in_bounds(x, y) {
                return false;
            }
            let cell = board.cell(Coord::new(x as usize, y as usize));
            if cell == Cell::from(token) {
                return true;
            }
            if cell != Cell::from(token.opponent()) {
                return false;
            }
            x += step_x;
            y += step_y;
        }
    }

    quickcheck! {
        fn flips_are_opposing_tokens_closed_off_by_the_mover(seed: Vec<u8>) -> bool {
            let board = board_from_seed(&seed);
            board.scan_order().all(|at| {
                if board.cell(at) != Cell::Empty {
                    return true;
                }
                [Token::First, Token::Second].into_iter().all(|token| {
                    board.flips_at(at, token).iter().all(|&f| {
                        board.cell(f) == Cell::from(token.opponent())
                            && is_sandwiched(&board, at, f, token)
                    })
                })
            })
        }
    }

    quickcheck! {
        fn scores_and_empties_always_cover_the_board(choices: Vec<u8>) -> bool {
            let mut board = Board::new();
            let mut token = Token::First;
            let total = DEFAULT_DIMENSION * DEFAULT_DIMENSION;

            for choice in choices {
                let moves = match board.possible_moves(token) {
                    Some(moves) => moves,
                    None if board.has_moves(token.opponent()) => {
                        token = token.opponent();
                        continue;
                    }
                    None => break,
                };
                let at = moves[choice as usize % moves.len()];
                if board.take_player_turn(at.x as i32, at.y as i32, token).is_err() {
                    return false;
                }
                let covered =
                    board.score(Token::First) + board.score(Token::Second) + board.empty_count();
                if covered != total {
                    return false;
                }
                token = token.opponent();
            }
            true
        }
    }
}
