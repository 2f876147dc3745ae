//! Training mode for the DQN agent
//!
//! Runs a baseline evaluation, a warm-up collection pass, then a fixed number
//! of iterations of collect → sample → train → maybe-evaluate → report.
//!
//! # Example
//!
//! ```rust,no_run
//! use ri2048::modes::{TrainConfig, TrainMode};
//! use ri2048::rl::{TrainingBackend, default_device};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = TrainConfig::new(200, "runs/dqn".into());
//! let mut train_mode = TrainMode::<TrainingBackend, _, _>::new(config, default_device())?;
//! train_mode.run()?;
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use burn::tensor::backend::AutodiffBackend;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::eval::compute_avg_return;
use crate::game::GameConfig;
use crate::metrics::{ReturnHistory, TrainingStats};
use crate::report::{PlotReporter, ReturnReporter};
use crate::rl::{
    DqnAgent, DqnConfig, Environment, GameEnvironment, Policy, ReplayBuffer, SampleStream,
    SeedStream, Trajectory, WINDOW_LENGTH, derive_seed,
};

/// Configuration for training mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Number of collect/train iterations
    pub num_iterations: usize,

    /// Episodes collected before each training step
    pub collect_episodes_per_iteration: usize,

    /// Episodes collected once before training starts
    pub initial_collect_episodes: usize,

    /// Trajectories kept per environment slot
    pub replay_buffer_capacity: usize,

    /// Log the loss every N train steps
    pub log_interval: usize,

    /// Episodes per evaluation
    pub num_eval_episodes: usize,

    /// Episodes for the untrained baseline on the training environment
    pub baseline_eval_episodes: usize,

    /// Evaluate every N train steps
    pub eval_interval: usize,

    /// Windows per sampled training batch
    pub batch_size: usize,

    /// Consecutive steps per window; only 2 is supported
    pub window_length: usize,

    /// Directory for the return plots
    pub output_dir: PathBuf,

    /// Resolution of the PNG plot
    pub raster_dpi: u32,

    pub game: GameConfig,

    pub dqn: DqnConfig,
}

impl TrainConfig {
    /// Create a configuration with default hyperparameters
    ///
    /// # Example
    ///
    /// ```rust
    /// use ri2048::modes::TrainConfig;
    ///
    /// let config = TrainConfig::new(1000, "runs/dqn".into());
    /// assert_eq!(config.batch_size, 64);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(num_iterations: usize, output_dir: PathBuf) -> Self {
        Self {
            num_iterations,
            output_dir,
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    /// Validate configuration parameters
    ///
    /// # Returns
    ///
    /// `Ok(())` if all parameters are valid, `Err(String)` with an error message otherwise.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let positive = [
            ("collect_episodes_per_iteration", self.collect_episodes_per_iteration),
            ("initial_collect_episodes", self.initial_collect_episodes),
            ("replay_buffer_capacity", self.replay_buffer_capacity),
            ("log_interval", self.log_interval),
            ("num_eval_episodes", self.num_eval_episodes),
            ("baseline_eval_episodes", self.baseline_eval_episodes),
            ("eval_interval", self.eval_interval),
            ("batch_size", self.batch_size),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(format!("{} must be at least 1", name));
            }
        }

        if self.window_length != WINDOW_LENGTH {
            return Err(format!(
                "window_length must be {}, got {}",
                WINDOW_LENGTH, self.window_length
            ));
        }

        if self.replay_buffer_capacity < self.window_length {
            return Err(format!(
                "replay_buffer_capacity must hold at least one window of {}",
                self.window_length
            ));
        }

        if self.raster_dpi == 0 {
            return Err("raster_dpi must be at least 1".to_string());
        }

        self.game.validate()?;
        self.dqn.validate()?;
        Ok(())
    }

    /// Per-consumer seeds for a run
    ///
    /// The game seed feeds the two environments and the DQN seed feeds replay
    /// sampling and exploration. Unseeded configs give `None` everywhere.
    pub fn run_seeds(&self) -> RunSeeds {
        let from_game = |stream| self.game.seed.map(|seed| derive_seed(seed, stream));
        let from_dqn = |stream| self.dqn.seed.map(|seed| derive_seed(seed, stream));
        RunSeeds {
            train_game: from_game(SeedStream::TrainGame),
            eval_game: from_game(SeedStream::EvalGame),
            replay: from_dqn(SeedStream::Replay),
            exploration: from_dqn(SeedStream::Exploration),
        }
    }
}

/// Seeds handed to each random source of a training run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSeeds {
    pub train_game: Option<u64>,
    pub eval_game: Option<u64>,
    pub replay: Option<u64>,
    pub exploration: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            num_iterations: 1000,
            collect_episodes_per_iteration: 5,
            initial_collect_episodes: 64,
            replay_buffer_capacity: 2000,
            log_interval: 25,
            num_eval_episodes: 10,
            baseline_eval_episodes: 5,
            eval_interval: 5,
            batch_size: 64,
            window_length: WINDOW_LENGTH,
            output_dir: PathBuf::from("output"),
            raster_dpi: 150,
            game: GameConfig::default(),
            dqn: DqnConfig::default(),
        }
    }
}

/// Stage of the training loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainPhase {
    Idle,
    Warmup,
    Collecting,
    Sampling,
    Training,
    Evaluating,
    Reporting,
    Finished,
}

/// Training mode for the DQN agent
///
/// Generic over the environments and the return reporter so the loop can run
/// against small scripted environments as well as the 2048 game.
pub struct TrainMode<B, E, R>
where
    B: AutodiffBackend,
    E: Environment<B::InnerBackend>,
    R: ReturnReporter,
{
    agent: DqnAgent<B>,
    train_env: E,
    eval_env: E,
    buffer: ReplayBuffer<B::InnerBackend>,
    reporter: R,
    stats: TrainingStats,
    returns: ReturnHistory,
    config: TrainConfig,
    phase: TrainPhase,
}

impl<B: AutodiffBackend> TrainMode<B, GameEnvironment<B::InnerBackend>, PlotReporter> {
    /// Training on the 2048 game with plots written to `config.output_dir`
    ///
    /// A seeded game config gives the training and evaluation environments
    /// separate derived seeds, so the two play different boards.
    pub fn new(config: TrainConfig, device: B::Device) -> Result<Self> {
        validate(&config)?;
        let seeds = config.run_seeds();

        let train_game = GameConfig {
            seed: seeds.train_game,
            ..config.game.clone()
        };
        let train_env = GameEnvironment::new(train_game, device.clone())
            .context("Failed to create training environment")?;

        let eval_game = GameConfig {
            seed: seeds.eval_game,
            ..config.game.clone()
        };
        let eval_env = GameEnvironment::new(eval_game, device.clone())
            .context("Failed to create evaluation environment")?;

        let reporter = PlotReporter::new(&config.output_dir, config.eval_interval, config.raster_dpi)
            .with_context(|| format!("Failed to prepare output directory {:?}", config.output_dir))?;

        Self::assemble(config, train_env, eval_env, reporter, device)
    }
}

fn validate(config: &TrainConfig) -> Result<()> {
    config.validate().map_err(|e| anyhow!("Invalid training config: {}", e))
}

impl<B, E, R> TrainMode<B, E, R>
where
    B: AutodiffBackend,
    E: Environment<B::InnerBackend>,
    R: ReturnReporter,
{
    pub fn with_environments(
        config: TrainConfig,
        train_env: E,
        eval_env: E,
        reporter: R,
        device: B::Device,
    ) -> Result<Self> {
        validate(&config)?;
        Self::assemble(config, train_env, eval_env, reporter, device)
    }

    /// Build the agent and replay buffer around already validated parts
    fn assemble(
        config: TrainConfig,
        train_env: E,
        eval_env: E,
        reporter: R,
        device: B::Device,
    ) -> Result<Self> {
        let seeds = config.run_seeds();

        let dqn = DqnConfig {
            seed: seeds.exploration,
            ..config.dqn.clone()
        };
        let mut agent = DqnAgent::new(train_env.time_step_spec(), train_env.action_spec(), dqn, device)
            .context("Failed to create DQN agent")?;
        agent.initialize();

        let buffer = ReplayBuffer::new(train_env.batch_size(), config.replay_buffer_capacity)
            .with_seed(seeds.replay);

        Ok(Self {
            agent,
            train_env,
            eval_env,
            buffer,
            reporter,
            stats: TrainingStats::new(100),
            returns: ReturnHistory::new(),
            config,
            phase: TrainPhase::Idle,
        })
    }

    /// Run the full training loop
    pub fn run(&mut self) -> Result<()> {
        self.print_header();

        let mut policy = self.agent.policy();
        let baseline = compute_avg_return(
            &mut self.train_env,
            &mut policy,
            self.config.baseline_eval_episodes,
        )
        .context("Baseline evaluation failed")?;
        info!("baseline average return = {:.2}", baseline);

        let initial = compute_avg_return(&mut self.eval_env, &mut policy, self.config.num_eval_episodes)
            .context("Initial evaluation failed")?;
        info!("step = 0: Average Return = {}", initial);
        self.returns.push(initial);

        self.set_phase(TrainPhase::Warmup);
        self.collect_episodes(self.config.initial_collect_episodes)
            .context("Warm-up collection failed")?;
        debug!(frames = self.buffer.num_frames(), "replay buffer warmed up");

        let mut stream = self
            .buffer
            .as_iterable(self.config.batch_size, self.config.window_length)
            .context("Failed to create replay sample stream")?;

        let progress = ProgressBar::new(self.config.num_iterations as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
                .progress_chars("#>-"),
        );

        for _ in 0..self.config.num_iterations {
            self.run_iteration(&mut stream)?;
            progress.set_message(format!("loss {:.4}", self.stats.mean_loss()));
            progress.inc(1);
        }
        progress.finish_and_clear();

        self.set_phase(TrainPhase::Finished);
        info!("Training complete: {}", self.stats.format_summary());
        if let Some(best) = self.returns.best() {
            info!("Best average return: {:.2}", best);
        }

        Ok(())
    }

    fn run_iteration(&mut self, stream: &mut SampleStream<B::InnerBackend>) -> Result<()> {
        self.set_phase(TrainPhase::Collecting);
        self.collect_episodes(self.config.collect_episodes_per_iteration)
            .context("Collection failed")?;

        self.set_phase(TrainPhase::Sampling);
        let (experience, _) = stream.next().context("Replay sample stream ended")?;

        self.set_phase(TrainPhase::Training);
        let loss_info = self.agent.train(&experience).context("Training step failed")?;
        self.stats.record_loss(loss_info.loss);

        let step = self.agent.train_step_counter();
        if step % self.config.log_interval == 0 {
            info!("step = {}: loss = {}", step, loss_info.loss);
        }

        if step % self.config.eval_interval == 0 {
            self.set_phase(TrainPhase::Evaluating);
            let mut policy = self.agent.policy();
            let avg_return =
                compute_avg_return(&mut self.eval_env, &mut policy, self.config.num_eval_episodes)
                    .with_context(|| format!("Evaluation at step {} failed", step))?;
            info!("step = {}: Average Return = {}", step, avg_return);
            self.returns.push(avg_return);
        }

        self.set_phase(TrainPhase::Reporting);
        self.reporter
            .report(&self.returns)
            .context("Failed to report return history")?;

        Ok(())
    }

    /// Collect `num_episodes` full episodes with the collect policy
    ///
    /// Every environment step appends one trajectory. An episode is counted
    /// when its boundary trajectory is appended.
    fn collect_episodes(&mut self, num_episodes: usize) -> Result<()> {
        let mut policy = self.agent.collect_policy();
        let mut time_step = self.train_env.reset();

        let mut episodes = 0;
        let mut episode_return = 0.0;
        let mut episode_length = 0;

        while episodes < num_episodes {
            let action_step = policy.action(&time_step)?;
            let next_time_step = self.train_env.step(action_step.action)?;

            let trajectory = Trajectory::from_transition(&time_step, &action_step, &next_time_step);
            let boundary = trajectory.is_boundary();
            if !boundary {
                episode_return += trajectory.reward;
            }
            self.buffer.add_batch(vec![trajectory])?;
            episode_length += 1;

            if boundary {
                self.stats.record_episode(episode_return, episode_length);
                episodes += 1;
                episode_return = 0.0;
                episode_length = 0;
            }

            time_step = next_time_step;
        }

        Ok(())
    }

    fn set_phase(&mut self, phase: TrainPhase) {
        debug!(?phase, "training phase");
        self.phase = phase;
    }

    pub fn phase(&self) -> TrainPhase {
        self.phase
    }

    pub fn returns(&self) -> &ReturnHistory {
        &self.returns
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn agent(&self) -> &DqnAgent<B> {
        &self.agent
    }

    pub fn buffer(&self) -> &ReplayBuffer<B::InnerBackend> {
        &self.buffer
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    fn print_header(&self) {
        info!("{}", "=".repeat(60));
        info!("DQN Training - 2048");
        info!("{}", "=".repeat(60));
        info!("Iterations: {}", self.config.num_iterations);
        info!(
            "Collection: {} warm-up episodes, {} per iteration",
            self.config.initial_collect_episodes, self.config.collect_episodes_per_iteration
        );
        info!(
            "Replay buffer: capacity {}, batch {} x window {}",
            self.config.replay_buffer_capacity, self.config.batch_size, self.config.window_length
        );
        info!("DQN Config:");
        info!("  Learning rate: {}", self.config.dqn.learning_rate);
        info!("  Hidden layers: {:?}", self.config.dqn.fc_layer_params);
        info!("  Gamma: {}", self.config.dqn.gamma);
        info!("  Epsilon: {}", self.config.dqn.epsilon_greedy);
        info!("  Target update period: {}", self.config.dqn.target_update_period);
        info!(
            "Logging every {} steps, evaluating every {} steps",
            self.config.log_interval, self.config.eval_interval
        );
        info!("Output: {:?}", self.config.output_dir);
        info!("{}", "=".repeat(60));
    }
}
