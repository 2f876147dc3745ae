use super::action::Move;

/// Side length of the square board
pub const BOARD_SIZE: usize = 4;

/// Number of cells on the board
pub const NUM_CELLS: usize = BOARD_SIZE * BOARD_SIZE;

/// A 4x4 board of tile exponents
///
/// Cell value `0` is empty, `k` holds the tile `2^k`. Cells are stored
/// row-major, top-left first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board {
    cells: [u8; NUM_CELLS],
}

/// Result of sliding a board in one direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftOutcome {
    /// Board after the slide (before any tile spawn)
    pub board: Board,
    /// Whether any tile moved or merged
    pub moved: bool,
    /// Sum of the values of all tiles created by merges
    pub merge_score: u32,
    /// Sum of the exponents of all tiles created by merges
    pub merge_exponents: u32,
}

impl Board {
    pub const EMPTY: Board = Board {
        cells: [0; NUM_CELLS],
    };

    pub fn from_exponents(cells: [u8; NUM_CELLS]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[u8; NUM_CELLS] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * BOARD_SIZE + col]
    }

    pub fn set(&mut self, row: usize, col: usize, exponent: u8) {
        self.cells[row * BOARD_SIZE + col] = exponent;
    }

    /// Indices of empty cells in row-major order
    pub fn empty_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &e)| e == 0)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn max_exponent(&self) -> u8 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Face value of the largest tile (0 on an empty board)
    pub fn max_tile(&self) -> u32 {
        tile_value(self.max_exponent())
    }

    /// Slide all tiles in a direction, merging equal neighbours once
    pub fn shift(&self, mv: Move) -> ShiftOutcome {
        let mut board = *self;
        let mut merge_score = 0;
        let mut merge_exponents = 0;

        for line in 0..BOARD_SIZE {
            let indices = line_indices(mv, line);
            let tiles = indices.map(|i| self.cells[i]);
            let (slid, score, exponents) = slide_line(tiles);

            for (&i, &e) in indices.iter().zip(slid.iter()) {
                board.cells[i] = e;
            }
            merge_score += score;
            merge_exponents += exponents;
        }

        ShiftOutcome {
            board,
            moved: board != *self,
            merge_score,
            merge_exponents,
        }
    }

    /// Whether at least one move changes the board
    pub fn has_legal_move(&self) -> bool {
        if self.cells.contains(&0) {
            return true;
        }

        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let e = self.get(row, col);
                if col + 1 < BOARD_SIZE && self.get(row, col + 1) == e {
                    return true;
                }
                if row + 1 < BOARD_SIZE && self.get(row + 1, col) == e {
                    return true;
                }
            }
        }

        false
    }
}

/// Face value of a tile exponent
pub fn tile_value(exponent: u8) -> u32 {
    if exponent == 0 { 0 } else { 1 << exponent }
}

/// Cell indices of one line, ordered from the edge the tiles slide toward
fn line_indices(mv: Move, line: usize) -> [usize; BOARD_SIZE] {
    let mut indices = [0; BOARD_SIZE];
    for (k, idx) in indices.iter_mut().enumerate() {
        let (row, col) = match mv {
            Move::Left => (line, k),
            Move::Right => (line, BOARD_SIZE - 1 - k),
            Move::Up => (k, line),
            Move::Down => (BOARD_SIZE - 1 - k, line),
        };
        *idx = row * BOARD_SIZE + col;
    }
    indices
}

/// Compact a line toward index 0, merging each equal pair once
///
/// Returns the new line, the merge score and the summed merged exponents.
fn slide_line(line: [u8; BOARD_SIZE]) -> ([u8; BOARD_SIZE], u32, u32) {
    let tiles: Vec<u8> = line.iter().copied().filter(|&e| e != 0).collect();
    let mut out = [0; BOARD_SIZE];
    let mut score = 0;
    let mut exponents = 0;

    let mut pos = 0;
    let mut i = 0;
    while i < tiles.len() {
        if i + 1 < tiles.len() && tiles[i] == tiles[i + 1] {
            let merged = tiles[i] + 1;
            out[pos] = merged;
            score += tile_value(merged);
            exponents += merged as u32;
            i += 2;
        } else {
            out[pos] = tiles[i];
            i += 1;
        }
        pos += 1;
    }

    (out, score, exponents)
}

/// Full state of one game
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub board: Board,
    pub score: u32,
    pub steps: usize,
    pub is_over: bool,
}

impl GameState {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            score: 0,
            steps: 0,
            is_over: false,
        }
    }
}
