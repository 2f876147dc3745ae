use super::{
    action::Move,
    config::GameConfig,
    state::{BOARD_SIZE, Board, GameState},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Information about a step
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// Whether the move changed the board
    pub moved: bool,
    /// Score gained from merges this step
    pub merge_score: u32,
    /// Largest tile on the board after the step
    pub max_tile: u32,
}

/// Result of a game step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Reward for this step (for RL training)
    pub reward: f32,
    /// Whether the game has terminated
    pub terminated: bool,
    /// Additional information about the step
    pub info: StepInfo,
}

/// The game engine that handles all game logic
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    /// Reset the game to a board with two spawned tiles
    pub fn reset(&mut self) -> GameState {
        let mut board = Board::EMPTY;
        self.spawn_tile(&mut board);
        self.spawn_tile(&mut board);
        GameState::new(board)
    }

    /// Execute one step of the game
    pub fn step(&mut self, state: &mut GameState, mv: Move) -> StepResult {
        if state.is_over {
            return StepResult {
                reward: 0.0,
                terminated: true,
                info: StepInfo {
                    moved: false,
                    merge_score: 0,
                    max_tile: state.board.max_tile(),
                },
            };
        }

        let outcome = state.board.shift(mv);
        state.steps += 1;

        let (reward, mut terminated) = if outcome.moved {
            state.board = outcome.board;
            self.spawn_tile(&mut state.board);
            state.score += outcome.merge_score;

            let reward = self.config.merge_reward_scale * outcome.merge_exponents as f32;
            (reward, !state.board.has_legal_move())
        } else {
            (
                self.config.invalid_move_penalty,
                self.config.end_on_invalid_move,
            )
        };

        if state.steps >= self.config.max_episode_steps {
            terminated = true;
        }
        if terminated {
            state.is_over = true;
        }

        StepResult {
            reward,
            terminated,
            info: StepInfo {
                moved: outcome.moved,
                merge_score: outcome.merge_score,
                max_tile: state.board.max_tile(),
            },
        }
    }

    /// Place a 2 (or, rarely, a 4) on a random empty cell
    fn spawn_tile(&mut self, board: &mut Board) {
        let empty = board.empty_cells();
        if empty.is_empty() {
            return;
        }

        let cell = empty[self.rng.gen_range(0..empty.len())];
        let exponent = if self.rng.gen_bool(self.config.four_probability) {
            2
        } else {
            1
        };

        board.set(cell / BOARD_SIZE, cell % BOARD_SIZE, exponent);
    }
}
