//! DQN algorithm hyperparameter configuration

use serde::{Deserialize, Serialize};

/// Number of consecutive steps in each sampled training window
///
/// One-step bootstrapped targets need a step and its successor.
pub const WINDOW_LENGTH: usize = 2;

/// Configuration for the DQN agent
///
/// Defaults follow the usual DQN agent defaults: undiscounted returns,
/// 10% exploration, and a target network synced after every update.
///
/// # Example
///
/// ```rust
/// use ri2048::rl::DqnConfig;
///
/// // Use default hyperparameters
/// let config = DqnConfig::default();
///
/// // Or customize specific parameters
/// let config = DqnConfig {
///     learning_rate: 5e-4,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    /// Learning rate for the Adam optimizer
    ///
    /// Default: 1e-3
    pub learning_rate: f64,

    /// Hidden layer widths of the Q-network
    ///
    /// Default: [100, 100, 100]
    pub fc_layer_params: Vec<usize>,

    /// Discount factor applied on top of the environment discount
    ///
    /// Default: 1.0
    pub gamma: f32,

    /// Probability of a uniformly random action in the collect policy
    ///
    /// Default: 0.1
    pub epsilon_greedy: f32,

    /// Copy the Q-network into the target network every N train steps
    ///
    /// Default: 1
    pub target_update_period: usize,

    /// Huber loss threshold
    ///
    /// Default: 1.0
    pub huber_delta: f32,

    /// Seed for the exploration RNG; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl DqnConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    ///
    /// # Returns
    ///
    /// `Ok(())` if all parameters are valid, `Err(String)` with an error message otherwise.
    pub fn validate(&self) -> Result<(), String> {
        if self.learning_rate <= 0.0 {
            return Err(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }

        if self.fc_layer_params.contains(&0) {
            return Err("fc_layer_params entries must be at least 1".to_string());
        }

        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(format!("gamma must be in [0, 1], got {}", self.gamma));
        }

        if !(0.0..=1.0).contains(&self.epsilon_greedy) {
            return Err(format!(
                "epsilon_greedy must be in [0, 1], got {}",
                self.epsilon_greedy
            ));
        }

        if self.target_update_period == 0 {
            return Err("target_update_period must be at least 1".to_string());
        }

        if self.huber_delta <= 0.0 {
            return Err(format!(
                "huber_delta must be positive, got {}",
                self.huber_delta
            ));
        }

        Ok(())
    }
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            fc_layer_params: vec![100, 100, 100],
            gamma: 1.0,
            epsilon_greedy: 0.1,
            target_update_period: 1,
            huber_delta: 1.0,
            seed: None,
        }
    }
}
