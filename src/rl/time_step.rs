//! Time steps, action steps and trajectories exchanged between the
//! environment, the policies and the replay buffer.

use burn::tensor::{Tensor, backend::Backend};

/// Position of a time step within its episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepType {
    First,
    Mid,
    Last,
}

/// Shape of a single (unbatched) observation: `[rows, features]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationSpec {
    pub shape: [usize; 2],
}

/// Discrete action space `0..num_actions`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    pub num_actions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeStepSpec {
    pub observation: ObservationSpec,
}

impl TimeStepSpec {
    pub fn new(observation: ObservationSpec) -> Self {
        Self { observation }
    }
}

/// One observation/reward/termination snapshot produced by an environment
#[derive(Debug, Clone)]
pub struct TimeStep<B: Backend> {
    pub step_type: StepType,
    pub reward: f32,
    pub discount: f32,
    /// Observation tensor with shape `[rows, features]`
    pub observation: Tensor<B, 2>,
}

impl<B: Backend> TimeStep<B> {
    /// First step of an episode: no reward, full discount
    pub fn first(observation: Tensor<B, 2>) -> Self {
        Self {
            step_type: StepType::First,
            reward: 0.0,
            discount: 1.0,
            observation,
        }
    }

    pub fn transition(observation: Tensor<B, 2>, reward: f32, discount: f32) -> Self {
        Self {
            step_type: StepType::Mid,
            reward,
            discount,
            observation,
        }
    }

    /// Last step of an episode: discount is zero
    pub fn termination(observation: Tensor<B, 2>, reward: f32) -> Self {
        Self {
            step_type: StepType::Last,
            reward,
            discount: 0.0,
            observation,
        }
    }

    pub fn is_first(&self) -> bool {
        self.step_type == StepType::First
    }

    pub fn is_last(&self) -> bool {
        self.step_type == StepType::Last
    }
}

/// How a policy arrived at its action
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionInfo {
    Greedy,
    Random,
    Sampled { probability: f32 },
}

/// Output of a policy for one time step
///
/// All policies in this crate are stateless, so there is no policy state to
/// carry between steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionStep {
    pub action: usize,
    pub info: ActionInfo,
}

/// A recorded one-step transition
#[derive(Debug, Clone)]
pub struct Trajectory<B: Backend> {
    pub step_type: StepType,
    pub observation: Tensor<B, 2>,
    pub action: usize,
    pub next_step_type: StepType,
    pub reward: f32,
    pub discount: f32,
}

impl<B: Backend> Trajectory<B> {
    /// Build the transition `time_step --action--> next_time_step`
    ///
    /// Reward and discount are taken from `next_time_step`.
    pub fn from_transition(
        time_step: &TimeStep<B>,
        action_step: &ActionStep,
        next_time_step: &TimeStep<B>,
    ) -> Self {
        Self {
            step_type: time_step.step_type,
            observation: time_step.observation.clone(),
            action: action_step.action,
            next_step_type: next_time_step.step_type,
            reward: next_time_step.reward,
            discount: next_time_step.discount,
        }
    }

    /// A LAST -> FIRST transition across an environment reset
    pub fn is_boundary(&self) -> bool {
        self.step_type == StepType::Last
    }
}
