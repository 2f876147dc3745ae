use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ri2048::logging::{init_logging, level_from_verbosity};
use ri2048::modes::{TrainConfig, TrainMode};
use ri2048::rl::{TrainingBackend, default_device};

#[derive(Parser)]
#[command(name = "ri2048")]
#[command(version, about = "Train a DQN agent to play 2048")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train the agent and plot average returns
    Train(TrainArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// JSON training config; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of training iterations
    #[arg(long)]
    iterations: Option<usize>,

    /// Episodes collected per iteration
    #[arg(long)]
    collect_episodes: Option<usize>,

    /// Evaluate every N train steps
    #[arg(long)]
    eval_interval: Option<usize>,

    /// Episodes per evaluation
    #[arg(long)]
    eval_episodes: Option<usize>,

    /// Log the loss every N train steps
    #[arg(long)]
    log_interval: Option<usize>,

    /// Adam learning rate
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Directory for training.svg and training.png
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Seed for the game and exploration RNGs
    #[arg(long)]
    seed: Option<u64>,
}

impl TrainArgs {
    fn into_config(self) -> Result<TrainConfig> {
        let mut config = match &self.config {
            Some(path) => TrainConfig::from_json_file(path)?,
            None => TrainConfig::default(),
        };

        if let Some(iterations) = self.iterations {
            config.num_iterations = iterations;
        }
        if let Some(episodes) = self.collect_episodes {
            config.collect_episodes_per_iteration = episodes;
        }
        if let Some(interval) = self.eval_interval {
            config.eval_interval = interval;
        }
        if let Some(episodes) = self.eval_episodes {
            config.num_eval_episodes = episodes;
        }
        if let Some(interval) = self.log_interval {
            config.log_interval = interval;
        }
        if let Some(learning_rate) = self.learning_rate {
            config.dqn.learning_rate = learning_rate;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(seed) = self.seed {
            config.game.seed = Some(seed);
            config.dqn.seed = Some(seed);
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(level_from_verbosity(cli.verbose))?;

    match cli.command {
        Command::Train(args) => {
            let config = args.into_config()?;
            let mut train_mode = TrainMode::<TrainingBackend, _, _>::new(config, default_device())
                .context("Failed to set up training")?;
            train_mode.run()?;
        }
    }

    Ok(())
}
