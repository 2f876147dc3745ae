use serde::{Deserialize, Serialize};

/// Configuration for the game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Probability that a spawned tile is a 4 instead of a 2
    pub four_probability: f64,
    /// Hard cap on moves per episode
    pub max_episode_steps: usize,
    /// End the episode when a move leaves the board unchanged
    pub end_on_invalid_move: bool,
    /// Seed for tile spawning; `None` draws from OS entropy
    pub seed: Option<u64>,

    // Rewards (for RL)
    /// Multiplier on the summed exponents of tiles created by merges
    pub merge_reward_scale: f32,
    /// Reward for a move that does not change the board
    pub invalid_move_penalty: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            four_probability: 0.1,
            max_episode_steps: 1000,
            end_on_invalid_move: true,
            seed: None,
            merge_reward_scale: 1.0,
            invalid_move_penalty: -1.0,
        }
    }
}

impl GameConfig {
    /// Default configuration with a fixed spawn seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.four_probability) {
            return Err(format!(
                "four_probability must be in [0, 1], got {}",
                self.four_probability
            ));
        }

        if self.max_episode_steps == 0 {
            return Err("max_episode_steps must be at least 1".to_string());
        }

        if !self.merge_reward_scale.is_finite() || !self.invalid_move_penalty.is_finite() {
            return Err("rewards must be finite".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.max_episode_steps, 1000);
        assert!(config.end_on_invalid_move);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_seeded_config() {
        let config = GameConfig::seeded(7);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.four_probability, 0.1);
    }

    #[test]
    fn test_validation() {
        let mut config = GameConfig::default();
        config.four_probability = 1.5;
        assert!(config.validate().is_err());

        config.four_probability = 0.1;
        config.max_episode_steps = 0;
        assert!(config.validate().is_err());
    }
}
