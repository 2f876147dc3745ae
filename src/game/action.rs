use serde::{Deserialize, Serialize};

/// Direction the tiles slide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// All moves, ordered by their action index
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Number of distinct moves (size of the discrete action space)
    pub const COUNT: usize = 4;

    /// Discrete action index of this move
    pub fn index(&self) -> usize {
        match self {
            Move::Up => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Right => 3,
        }
    }

    /// Move for a discrete action index, `None` when out of range
    pub fn from_index(idx: usize) -> Option<Move> {
        Self::ALL.get(idx).copied()
    }
}
