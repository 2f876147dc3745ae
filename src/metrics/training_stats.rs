//! Rolling training statistics for DQN runs
//!
//! Tracks collected episodes (return and length) and training losses
//! over a fixed window, for the periodic log lines of the training loop.

use std::collections::VecDeque;

/// Training statistics tracker with rolling averages
///
/// # Example
///
/// ```rust
/// use ri2048::metrics::TrainingStats;
///
/// let mut stats = TrainingStats::new(100);
/// stats.record_episode(12.0, 80);
/// stats.record_loss(0.25);
///
/// assert_eq!(stats.total_episodes(), 1);
/// assert_eq!(stats.total_steps(), 80);
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    episode_returns: VecDeque<f32>,
    episode_lengths: VecDeque<usize>,
    losses: VecDeque<f32>,

    total_episodes: usize,
    total_steps: usize,
    total_updates: usize,

    window_size: usize,
}

impl TrainingStats {
    /// Create a tracker keeping the last `window_size` values per series
    pub fn new(window_size: usize) -> Self {
        Self {
            episode_returns: VecDeque::with_capacity(window_size),
            episode_lengths: VecDeque::with_capacity(window_size),
            losses: VecDeque::with_capacity(window_size),
            total_episodes: 0,
            total_steps: 0,
            total_updates: 0,
            window_size,
        }
    }

    /// Record a completed collection episode
    ///
    /// # Arguments
    ///
    /// * `episode_return` - Sum of rewards over the episode
    /// * `length` - Number of environment steps, FIRST through LAST
    pub fn record_episode(&mut self, episode_return: f32, length: usize) {
        Self::push_deque(&mut self.episode_returns, episode_return, self.window_size);
        Self::push_deque(&mut self.episode_lengths, length, self.window_size);
        self.total_episodes += 1;
        self.total_steps += length;
    }

    /// Record the loss of one training step
    pub fn record_loss(&mut self, loss: f32) {
        Self::push_deque(&mut self.losses, loss, self.window_size);
        self.total_updates += 1;
    }

    pub fn mean_episode_return(&self) -> f32 {
        Self::mean(&self.episode_returns)
    }

    pub fn mean_episode_length(&self) -> f32 {
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            self.episode_lengths.iter().sum::<usize>() as f32 / self.episode_lengths.len() as f32
        }
    }

    pub fn mean_loss(&self) -> f32 {
        Self::mean(&self.losses)
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn total_updates(&self) -> usize {
        self.total_updates
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// One-line summary of the rolling statistics
    pub fn format_summary(&self) -> String {
        format!(
            "Episodes: {} | Steps: {} | Return: {:.2} | Len: {:.1} | Loss: {:.4}",
            self.total_episodes,
            self.total_steps,
            self.mean_episode_return(),
            self.mean_episode_length(),
            self.mean_loss(),
        )
    }

    fn mean(deque: &VecDeque<f32>) -> f32 {
        if deque.is_empty() {
            0.0
        } else {
            deque.iter().sum::<f32>() / deque.len() as f32
        }
    }

    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}
