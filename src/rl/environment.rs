use super::observation::{TILE_CHANNELS, create_observation};
use super::time_step::{ActionSpec, ObservationSpec, TimeStep, TimeStepSpec};
use crate::error::{Result, Ri2048Error};
use crate::game::{GameConfig, GameEngine, GameState, Move, NUM_CELLS};
use burn::tensor::backend::Backend;

/// Step/reset interface consumed by the training loop and the evaluator
///
/// Implementations auto-reset: stepping after a LAST time step starts a new
/// episode and returns its FIRST time step, ignoring the action.
pub trait Environment<B: Backend> {
    fn observation_spec(&self) -> ObservationSpec;

    fn action_spec(&self) -> ActionSpec;

    fn time_step_spec(&self) -> TimeStepSpec {
        TimeStepSpec::new(self.observation_spec())
    }

    /// Number of parallel environment slots
    fn batch_size(&self) -> usize {
        1
    }

    fn reset(&mut self) -> TimeStep<B>;

    fn step(&mut self, action: usize) -> Result<TimeStep<B>>;

    fn current_time_step(&self) -> TimeStep<B>;
}

/// 2048 environment for reinforcement learning
///
/// Wraps the game engine and provides:
/// - One-hot tensor observations ([16, 16])
/// - Discrete action space (4 actions: Up, Down, Left, Right)
/// - TimeStep-based reset/step with auto-reset
pub struct GameEnvironment<B: Backend> {
    engine: GameEngine,
    state: GameState,
    current: TimeStep<B>,
    device: B::Device,
}

impl<B: Backend> GameEnvironment<B> {
    /// Create a new 2048 environment
    pub fn new(config: GameConfig, device: B::Device) -> Result<Self> {
        config.validate().map_err(Ri2048Error::InvalidConfig)?;

        let mut engine = GameEngine::new(config);
        let state = engine.reset();
        let current = TimeStep::first(create_observation(&state.board, &device));

        Ok(Self {
            engine,
            state,
            current,
            device,
        })
    }

    /// Get reference to current game state (for testing/debugging)
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Get the device used by this environment
    pub fn device(&self) -> &B::Device {
        &self.device
    }
}

impl<B: Backend> Environment<B> for GameEnvironment<B> {
    fn observation_spec(&self) -> ObservationSpec {
        ObservationSpec {
            shape: [NUM_CELLS, TILE_CHANNELS],
        }
    }

    fn action_spec(&self) -> ActionSpec {
        ActionSpec {
            num_actions: Move::COUNT,
        }
    }

    fn reset(&mut self) -> TimeStep<B> {
        self.state = self.engine.reset();
        self.current = TimeStep::first(create_observation(&self.state.board, &self.device));
        self.current.clone()
    }

    fn step(&mut self, action: usize) -> Result<TimeStep<B>> {
        let mv = Move::from_index(action).ok_or(Ri2048Error::InvalidAction {
            action,
            num_actions: Move::COUNT,
        })?;

        if self.current.is_last() {
            return Ok(self.reset());
        }

        let result = self.engine.step(&mut self.state, mv);
        let observation = create_observation(&self.state.board, &self.device);

        self.current = if result.terminated {
            TimeStep::termination(observation, result.reward)
        } else {
            TimeStep::transition(observation, result.reward, 1.0)
        };

        Ok(self.current.clone())
    }

    fn current_time_step(&self) -> TimeStep<B> {
        self.current.clone()
    }
}
