//! Reinforcement learning components for 2048
//!
//! Provides:
//! - TimeStep-based environment interface with auto-reset
//! - One-hot tile observations
//! - Layer-descriptor networks (ActionNet and Q-network presets)
//! - Greedy, epsilon-greedy and sampling policies
//! - Replay buffer with a blocking sample stream
//! - DQN agent and its configuration

pub mod backend;
pub mod buffer;
pub mod config;
pub mod dqn;
pub mod environment;
pub mod network;
pub mod observation;
pub mod policy;
pub mod seed;
pub mod time_step;

pub use backend::{InferenceBackend, TrainingBackend, default_device};
pub use buffer::{Experience, ReplayBuffer, SampleInfo, SampleStream};
pub use config::{DqnConfig, WINDOW_LENGTH};
pub use dqn::{DqnAgent, LossInfo};
pub use environment::{Environment, GameEnvironment};
pub use network::{Activation, LayerSpec, NetworkConfig, SequentialNetwork};
pub use observation::{TILE_CHANNELS, create_observation};
pub use policy::{ActorPolicy, EpsilonGreedyPolicy, GreedyPolicy, Policy, make_actor_policy};
pub use seed::{SeedStream, derive_seed};
pub use time_step::{
    ActionInfo, ActionSpec, ActionStep, ObservationSpec, StepType, TimeStep, TimeStepSpec,
    Trajectory,
};
