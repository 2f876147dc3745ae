//! Core game logic for the 2048 sliding puzzle
//!
//! This module contains the game rules without any tensor or training
//! dependencies. The RL environment adapter in `rl::environment` wraps it.

pub mod action;
pub mod config;
pub mod engine;
pub mod state;

// Re-export commonly used types
pub use action::Move;
pub use config::GameConfig;
pub use engine::{GameEngine, StepInfo, StepResult};
pub use state::{BOARD_SIZE, Board, GameState, NUM_CELLS, ShiftOutcome, tile_value};
