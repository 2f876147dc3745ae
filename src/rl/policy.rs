//! Action-selection policies
//!
//! - [`GreedyPolicy`]: argmax over network outputs, used for evaluation
//! - [`EpsilonGreedyPolicy`]: greedy with random exploration, used for collection
//! - [`ActorPolicy`]: samples from a network that outputs action probabilities

use burn::tensor::{ElementConversion, Tensor, backend::Backend};
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::network::{NetworkConfig, SequentialNetwork};
use super::time_step::{ActionInfo, ActionSpec, ActionStep, ObservationSpec, TimeStep};
use crate::error::Result;

/// Maps a time step to an action
pub trait Policy<B: Backend> {
    fn action(&mut self, time_step: &TimeStep<B>) -> Result<ActionStep>;
}

fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Deterministic policy: picks the action with the highest network output
#[derive(Debug, Clone)]
pub struct GreedyPolicy<B: Backend> {
    network: SequentialNetwork<B>,
}

impl<B: Backend> GreedyPolicy<B> {
    pub fn new(network: SequentialNetwork<B>) -> Self {
        Self { network }
    }

    /// Network outputs for one observation, shape `[num_actions]`
    pub fn outputs(&self, time_step: &TimeStep<B>) -> Result<Tensor<B, 1>> {
        let batch = time_step.observation.clone().unsqueeze_dim::<3>(0);
        let outputs = self.network.forward(batch)?;
        Ok(outputs.squeeze::<1>(0))
    }

    pub fn num_actions(&self) -> usize {
        self.network.num_outputs()
    }
}

impl<B: Backend> Policy<B> for GreedyPolicy<B> {
    fn action(&mut self, time_step: &TimeStep<B>) -> Result<ActionStep> {
        let action = self
            .outputs(time_step)?
            .argmax(0)
            .into_scalar()
            .elem::<i64>() as usize;

        Ok(ActionStep {
            action,
            info: ActionInfo::Greedy,
        })
    }
}

/// Exploration policy: random action with probability `epsilon`, else greedy
#[derive(Debug, Clone)]
pub struct EpsilonGreedyPolicy<B: Backend> {
    greedy: GreedyPolicy<B>,
    epsilon: f32,
    rng: StdRng,
}

impl<B: Backend> EpsilonGreedyPolicy<B> {
    pub fn new(greedy: GreedyPolicy<B>, epsilon: f32, seed: Option<u64>) -> Self {
        Self {
            greedy,
            epsilon,
            rng: rng_from_seed(seed),
        }
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }
}

impl<B: Backend> Policy<B> for EpsilonGreedyPolicy<B> {
    fn action(&mut self, time_step: &TimeStep<B>) -> Result<ActionStep> {
        if self.rng.gen_bool(self.epsilon as f64) {
            let action = self.rng.gen_range(0..self.greedy.num_actions());
            return Ok(ActionStep {
                action,
                info: ActionInfo::Random,
            });
        }

        self.greedy.action(time_step)
    }
}

/// Stochastic policy over a network whose outputs are action probabilities
#[derive(Debug, Clone)]
pub struct ActorPolicy<B: Backend> {
    network: SequentialNetwork<B>,
    rng: StdRng,
}

impl<B: Backend> ActorPolicy<B> {
    pub fn new(network: SequentialNetwork<B>, seed: Option<u64>) -> Self {
        Self {
            network,
            rng: rng_from_seed(seed),
        }
    }
}

impl<B: Backend> Policy<B> for ActorPolicy<B> {
    fn action(&mut self, time_step: &TimeStep<B>) -> Result<ActionStep> {
        let batch = time_step.observation.clone().unsqueeze_dim::<3>(0);
        let probs: Vec<f32> = self
            .network
            .forward(batch)?
            .into_data()
            .iter::<f32>()
            .collect();

        let action = sample_categorical(&probs, &mut self.rng);
        Ok(ActionStep {
            action,
            info: ActionInfo::Sampled {
                probability: probs[action],
            },
        })
    }
}

/// Build an [`ActorPolicy`] around a freshly initialized ActionNet
pub fn make_actor_policy<B: Backend>(
    observation_spec: ObservationSpec,
    action_spec: ActionSpec,
    seed: Option<u64>,
    device: &B::Device,
) -> Result<ActorPolicy<B>> {
    let network = NetworkConfig::action_net(observation_spec, action_spec)
        .init_for_actions::<B>(action_spec, device)?;
    Ok(ActorPolicy::new(network, seed))
}

/// Sample an index from a categorical distribution
///
/// Falls back to the last index when rounding leaves the cumulative sum
/// below the drawn value.
fn sample_categorical(probs: &[f32], rng: &mut StdRng) -> usize {
    let random_val: f32 = rng.sample(rand::distributions::Standard);
    let mut cumsum = 0.0;

    for (idx, &prob) in probs.iter().enumerate() {
        cumsum += prob;
        if random_val < cumsum {
            return idx;
        }
    }

    probs.len() - 1
}
