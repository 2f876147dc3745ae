//! ri2048 - DQN training for the 2048 sliding puzzle
//!
//! This library provides:
//! - Core game logic (game module)
//! - RL components: environment adapter, networks, policies, replay buffer
//!   and DQN agent (rl module)
//! - Training loop and policy evaluation (modes module)
//! - Training statistics and return history (metrics module)
//! - Return plots (report module)

pub mod error;
pub mod game;
pub mod logging;
pub mod metrics;
pub mod modes;
pub mod report;
pub mod rl;

pub use error::{Result, Ri2048Error};
