//! DQN (Deep Q-Network) agent implementation
//!
//! The agent owns an online Q-network on the autodiff backend and a target
//! network snapshot on the inner backend. Training consumes windows of two
//! consecutive trajectories and regresses `Q(s, a)` onto the one-step target
//! `r + gamma * discount * max_a' Q_target(s', a')` with a Huber loss.

use burn::{
    module::AutodiffModule,
    optim::{Adam, AdamConfig, GradientsParams, Optimizer, adaptor::OptimizerAdaptor},
    tensor::{ElementConversion, Int, Tensor, TensorData, backend::AutodiffBackend},
};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use tracing::debug;

use super::buffer::Experience;
use super::config::{DqnConfig, WINDOW_LENGTH};
use super::network::{NetworkConfig, SequentialNetwork};
use super::policy::{EpsilonGreedyPolicy, GreedyPolicy};
use super::time_step::{ActionSpec, TimeStepSpec, Trajectory};
use crate::error::{Result, Ri2048Error};

/// Loss reported by one training step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossInfo {
    pub loss: f32,
}

/// Inner-backend tensors for one training batch
struct TransitionBatch<B: AutodiffBackend> {
    observations: Tensor<B::InnerBackend, 3>,
    next_observations: Tensor<B::InnerBackend, 3>,
    actions: Vec<i64>,
    rewards: Vec<f32>,
    discounts: Vec<f32>,
    valid: Vec<f32>,
}

/// DQN agent for the 2048 environment
///
/// # Type Parameters
///
/// * `B` - Autodiff backend for gradient computation
///
/// # Example
///
/// ```rust
/// use ri2048::rl::{ActionSpec, DqnAgent, DqnConfig, ObservationSpec, TimeStepSpec};
/// use burn::backend::{Autodiff, ndarray::{NdArray, NdArrayDevice}};
///
/// type Backend = Autodiff<NdArray<f32>>;
///
/// let spec = TimeStepSpec::new(ObservationSpec { shape: [16, 16] });
/// let actions = ActionSpec { num_actions: 4 };
/// let mut agent =
///     DqnAgent::<Backend>::new(spec, actions, DqnConfig::default(), NdArrayDevice::default())
///         .unwrap();
/// agent.initialize();
/// assert_eq!(agent.train_step_counter(), 0);
/// ```
pub struct DqnAgent<B: AutodiffBackend> {
    q_network: SequentialNetwork<B>,
    target_network: SequentialNetwork<B::InnerBackend>,
    optim: OptimizerAdaptor<Adam, SequentialNetwork<B>, B>,
    config: DqnConfig,
    action_spec: ActionSpec,
    train_step_counter: usize,
    /// Seeds one collect policy after another; `None` when unseeded
    exploration_seeds: Option<StdRng>,
    device: B::Device,
}

impl<B: AutodiffBackend> DqnAgent<B> {
    /// Create a new agent with a fresh Q-network
    ///
    /// Fails with `InvalidConfig` on bad hyperparameters and with
    /// `ShapeMismatch` when the network cannot map the observation spec onto
    /// the action spec.
    pub fn new(
        time_step_spec: TimeStepSpec,
        action_spec: ActionSpec,
        config: DqnConfig,
        device: B::Device,
    ) -> Result<Self> {
        config.validate().map_err(Ri2048Error::InvalidConfig)?;

        let q_network = NetworkConfig::q_network(
            time_step_spec.observation,
            action_spec,
            &config.fc_layer_params,
        )
        .init_for_actions::<B>(action_spec, &device)?;
        let target_network = q_network.valid();
        let exploration_seeds = config.seed.map(StdRng::seed_from_u64);

        Ok(Self {
            q_network,
            target_network,
            optim: AdamConfig::new().init(),
            config,
            action_spec,
            train_step_counter: 0,
            exploration_seeds,
            device,
        })
    }

    /// Reset training state and sync the target network
    pub fn initialize(&mut self) {
        self.train_step_counter = 0;
        self.target_network = self.q_network.valid();
    }

    /// Greedy policy over a snapshot of the current Q-network
    pub fn policy(&self) -> GreedyPolicy<B::InnerBackend> {
        GreedyPolicy::new(self.q_network.valid())
    }

    /// Epsilon-greedy policy over a snapshot of the current Q-network
    ///
    /// The snapshot does not follow later training steps; callers fetch a new
    /// collect policy after each update.
    pub fn collect_policy(&mut self) -> EpsilonGreedyPolicy<B::InnerBackend> {
        let seed = self.exploration_seeds.as_mut().map(RngCore::next_u64);
        EpsilonGreedyPolicy::new(self.policy(), self.config.epsilon_greedy, seed)
    }

    /// Perform one gradient step on a sampled batch
    ///
    /// Windows whose first trajectory crosses an episode boundary contribute
    /// no loss. Increments the train step counter and syncs the target network
    /// every `target_update_period` steps.
    pub fn train(&mut self, experience: &Experience<B::InnerBackend>) -> Result<LossInfo> {
        let batch = self.prepare_batch(experience)?;
        let batch_size = batch.actions.len();

        let td_targets = self.compute_td_targets(&batch)?;

        let observations = Tensor::<B, 3>::from_inner(batch.observations);
        let actions = Tensor::<B, 2, Int>::from_data(
            TensorData::new(batch.actions, [batch_size, 1]),
            &self.device,
        );
        let valid = Tensor::<B, 1>::from_data(
            TensorData::new(batch.valid, [batch_size]),
            &self.device,
        );

        let q_values = self.q_network.forward(observations)?;
        let q_taken = q_values.gather(1, actions).reshape([batch_size]);

        let per_example = huber(q_taken - td_targets, self.config.huber_delta) * valid;
        let loss = per_example.sum() / batch_size as f32;

        let loss_value = loss.clone().into_scalar().elem::<f32>();
        if !loss_value.is_finite() {
            return Err(Ri2048Error::NonFiniteLoss {
                step: self.train_step_counter,
                loss: loss_value,
            });
        }

        let grads = GradientsParams::from_grads(loss.backward(), &self.q_network);
        self.q_network = self
            .optim
            .step(self.config.learning_rate, self.q_network.clone(), grads);

        self.train_step_counter += 1;
        if self.train_step_counter % self.config.target_update_period == 0 {
            self.target_network = self.q_network.valid();
        }

        debug!(step = self.train_step_counter, loss = loss_value, "dqn train step");
        Ok(LossInfo { loss: loss_value })
    }

    /// `r + gamma * discount * max_a' Q_target(s', a')`, without gradient
    fn compute_td_targets(&self, batch: &TransitionBatch<B>) -> Result<Tensor<B, 1>> {
        let batch_size = batch.rewards.len();
        let device = batch.observations.device();

        let next_q = self
            .target_network
            .forward(batch.next_observations.clone())?
            .max_dim(1)
            .reshape([batch_size]);

        let rewards = Tensor::<B::InnerBackend, 1>::from_data(
            TensorData::new(batch.rewards.clone(), [batch_size]),
            &device,
        );
        let discounts = Tensor::<B::InnerBackend, 1>::from_data(
            TensorData::new(batch.discounts.clone(), [batch_size]),
            &device,
        );

        let targets = rewards + discounts * next_q * self.config.gamma;
        Ok(Tensor::from_inner(targets))
    }

    fn prepare_batch(&self, experience: &Experience<B::InnerBackend>) -> Result<TransitionBatch<B>> {
        if experience.windows.is_empty() {
            return Err(Ri2048Error::shape_mismatch(
                "experience batch",
                [1, WINDOW_LENGTH],
                [0, WINDOW_LENGTH],
            ));
        }

        let batch_size = experience.windows.len();
        let mut firsts = Vec::with_capacity(batch_size);
        let mut seconds = Vec::with_capacity(batch_size);

        for window in &experience.windows {
            match window.as_slice() {
                [first, second] => {
                    firsts.push(first);
                    seconds.push(second);
                }
                other => {
                    return Err(Ri2048Error::shape_mismatch(
                        "experience window",
                        [batch_size, WINDOW_LENGTH],
                        [batch_size, other.len()],
                    ));
                }
            }
        }

        for first in &firsts {
            if first.action >= self.action_spec.num_actions {
                return Err(Ri2048Error::InvalidAction {
                    action: first.action,
                    num_actions: self.action_spec.num_actions,
                });
            }
        }

        let stack = |items: &[&Trajectory<B::InnerBackend>]| {
            Tensor::stack::<3>(
                items.iter().map(|t| t.observation.clone()).collect(),
                0,
            )
        };

        Ok(TransitionBatch {
            observations: stack(&firsts),
            next_observations: stack(&seconds),
            actions: firsts.iter().map(|t| t.action as i64).collect(),
            rewards: firsts.iter().map(|t| t.reward).collect(),
            discounts: firsts.iter().map(|t| t.discount).collect(),
            valid: firsts
                .iter()
                .map(|t| if t.is_boundary() { 0.0 } else { 1.0 })
                .collect(),
        })
    }

    /// Number of completed training steps
    pub fn train_step_counter(&self) -> usize {
        self.train_step_counter
    }

    pub fn action_spec(&self) -> ActionSpec {
        self.action_spec
    }

    pub fn q_network(&self) -> &SequentialNetwork<B> {
        &self.q_network
    }
}

/// Elementwise Huber loss with threshold `delta`
fn huber<B: AutodiffBackend>(error: Tensor<B, 1>, delta: f32) -> Tensor<B, 1> {
    let abs_error = error.abs();
    let quadratic = abs_error.clone().clamp_max(delta);
    let linear = abs_error - quadratic.clone();
    quadratic.powf_scalar(2.0) * 0.5 + linear * delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::rl::environment::{Environment, GameEnvironment};
    use crate::rl::policy::Policy;
    use crate::rl::time_step::{ActionInfo, ActionStep, ObservationSpec, StepType};
    use burn::backend::{
        Autodiff,
        ndarray::{NdArray, NdArrayDevice},
    };

    type TestBackend = Autodiff<NdArray<f32>>;
    type TestInferenceBackend = NdArray<f32>;

    const SPEC: TimeStepSpec = TimeStepSpec {
        observation: ObservationSpec { shape: [16, 16] },
    };
    const ACTIONS: ActionSpec = ActionSpec { num_actions: 4 };

    fn create_test_agent(config: DqnConfig) -> DqnAgent<TestBackend> {
        let mut agent =
            DqnAgent::new(SPEC, ACTIONS, config, NdArrayDevice::default()).unwrap();
        agent.initialize();
        agent
    }

    fn small_config() -> DqnConfig {
        DqnConfig {
            fc_layer_params: vec![16],
            seed: Some(0),
            ..Default::default()
        }
    }

    /// Consecutive windows collected from a seeded environment
    fn collect_experience(num_windows: usize) -> Experience<TestInferenceBackend> {
        let mut env =
            GameEnvironment::<TestInferenceBackend>::new(GameConfig::seeded(4), NdArrayDevice::default())
                .unwrap();
        let mut trajectories = Vec::new();
        let mut ts = env.reset();

        for step in 0..=num_windows {
            let action = ActionStep {
                action: step % 4,
                info: ActionInfo::Random,
            };
            let next = env.step(action.action).unwrap();
            trajectories.push(Trajectory::from_transition(&ts, &action, &next));
            ts = next;
        }

        Experience {
            windows: trajectories.windows(2).map(|w| w.to_vec()).collect(),
        }
    }

    #[test]
    fn test_agent_creation() {
        let agent = create_test_agent(small_config());
        assert_eq!(agent.train_step_counter(), 0);
        assert_eq!(agent.q_network().num_outputs(), 4);
        assert_eq!(agent.action_spec(), ACTIONS);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DqnConfig {
            target_update_period: 0,
            ..Default::default()
        };
        let result = DqnAgent::<TestBackend>::new(SPEC, ACTIONS, config, NdArrayDevice::default());
        assert!(matches!(result, Err(Ri2048Error::InvalidConfig(_))));
    }

    #[test]
    fn test_train_increments_counter() {
        let mut agent = create_test_agent(small_config());
        let experience = collect_experience(8);

        let info = agent.train(&experience).unwrap();
        assert!(info.loss.is_finite());
        assert!(info.loss >= 0.0);
        assert_eq!(agent.train_step_counter(), 1);

        agent.train(&experience).unwrap();
        assert_eq!(agent.train_step_counter(), 2);
    }

    #[test]
    fn test_window_length_mismatch_rejected() {
        let mut agent = create_test_agent(small_config());
        let mut experience = collect_experience(4);
        let extra = experience.windows[0][1].clone();
        experience.windows[0].push(extra);

        let result = agent.train(&experience);
        assert!(matches!(result, Err(Ri2048Error::ShapeMismatch { .. })));
        assert_eq!(agent.train_step_counter(), 0);
    }

    #[test]
    fn test_empty_experience_rejected() {
        let mut agent = create_test_agent(small_config());
        let experience = Experience::<TestInferenceBackend> { windows: vec![] };
        assert!(agent.train(&experience).is_err());
    }

    #[test]
    fn test_boundary_windows_contribute_no_loss() {
        let mut agent = create_test_agent(small_config());
        let mut experience = collect_experience(4);
        for window in &mut experience.windows {
            window[0].step_type = StepType::Last;
        }

        let info = agent.train(&experience).unwrap();
        assert_eq!(info.loss, 0.0);
    }

    #[test]
    fn test_loss_decreases_on_fixed_batch() {
        let mut agent = create_test_agent(DqnConfig {
            gamma: 0.0,
            learning_rate: 1e-2,
            ..small_config()
        });
        let experience = collect_experience(16);

        let first = agent.train(&experience).unwrap().loss;
        let mut last = first;
        for _ in 0..50 {
            last = agent.train(&experience).unwrap().loss;
        }
        assert!(last < first, "loss should drop: {} -> {}", first, last);
    }

    #[test]
    fn test_policies_pick_valid_actions() {
        let mut agent = create_test_agent(small_config());
        let env =
            GameEnvironment::<TestInferenceBackend>::new(GameConfig::seeded(1), NdArrayDevice::default())
                .unwrap();
        let ts = env.current_time_step();

        let mut greedy = agent.policy();
        let mut collect = agent.collect_policy();
        assert!(greedy.action(&ts).unwrap().action < 4);
        assert!(collect.action(&ts).unwrap().action < 4);
        assert_eq!(collect.epsilon(), 0.1);
    }

    fn random_actions(policy: &mut EpsilonGreedyPolicy<TestInferenceBackend>) -> Vec<usize> {
        let env =
            GameEnvironment::<TestInferenceBackend>::new(GameConfig::seeded(1), NdArrayDevice::default())
                .unwrap();
        let ts = env.current_time_step();
        (0..32).map(|_| policy.action(&ts).unwrap().action).collect()
    }

    #[test]
    fn test_successive_collect_policies_explore_differently() {
        let config = DqnConfig {
            epsilon_greedy: 1.0,
            ..small_config()
        };
        let mut agent = create_test_agent(config.clone());
        let first = random_actions(&mut agent.collect_policy());
        let second = random_actions(&mut agent.collect_policy());
        assert_ne!(first, second);

        // Same seed, same sequence of collect policies
        let mut replay = create_test_agent(config);
        assert_eq!(random_actions(&mut replay.collect_policy()), first);
    }

    fn max_output_gap(agent: &DqnAgent<TestBackend>) -> f32 {
        let env =
            GameEnvironment::<TestInferenceBackend>::new(GameConfig::seeded(2), NdArrayDevice::default())
                .unwrap();
        let ts = env.current_time_step();

        let online = agent.policy().outputs(&ts).unwrap();
        let target = GreedyPolicy::new(agent.target_network.clone())
            .outputs(&ts)
            .unwrap();
        (online - target).abs().max().into_scalar().elem::<f32>()
    }

    #[test]
    fn test_target_network_syncs_on_period() {
        let mut agent = create_test_agent(DqnConfig {
            target_update_period: 3,
            learning_rate: 1e-2,
            ..small_config()
        });
        let experience = collect_experience(8);
        assert_eq!(max_output_gap(&agent), 0.0);

        agent.train(&experience).unwrap();
        assert!(max_output_gap(&agent) > 1e-6, "target must lag after step 1");

        agent.train(&experience).unwrap();
        assert!(max_output_gap(&agent) > 1e-6, "target must lag after step 2");

        agent.train(&experience).unwrap();
        assert_eq!(max_output_gap(&agent), 0.0, "target syncs on step 3");
    }

    #[test]
    fn test_huber_regions() {
        let device = NdArrayDevice::default();
        let errors = Tensor::<TestBackend, 1>::from_floats([0.5, -2.0, 0.0], &device);
        let values: Vec<f32> = huber(errors, 1.0).into_data().iter::<f32>().collect();

        assert!((values[0] - 0.125).abs() < 1e-6);
        assert!((values[1] - 1.5).abs() < 1e-6);
        assert_eq!(values[2], 0.0);
    }
}
