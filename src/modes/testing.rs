//! Small deterministic environments, policies and reporters for mode tests

use burn::tensor::{Tensor, backend::Backend};

use crate::error::Result;
use crate::metrics::ReturnHistory;
use crate::report::ReturnReporter;
use crate::rl::{
    ActionInfo, ActionSpec, ActionStep, Environment, ObservationSpec, Policy, TimeStep,
};

/// Episodes of exactly `episode_length` steps after FIRST, each with `reward`
pub struct FixedLengthEnv<B: Backend> {
    episode_length: usize,
    reward: f32,
    elapsed: usize,
    resets: usize,
    current: TimeStep<B>,
    device: B::Device,
}

impl<B: Backend> FixedLengthEnv<B> {
    pub fn new(episode_length: usize, reward: f32) -> Self {
        let device = B::Device::default();
        Self {
            episode_length,
            reward,
            elapsed: 0,
            resets: 0,
            current: TimeStep::first(Self::observation(&device)),
            device,
        }
    }

    pub fn resets(&self) -> usize {
        self.resets
    }

    fn observation(device: &B::Device) -> Tensor<B, 2> {
        Tensor::zeros([16, 16], device)
    }
}

impl<B: Backend> Environment<B> for FixedLengthEnv<B> {
    fn observation_spec(&self) -> ObservationSpec {
        ObservationSpec { shape: [16, 16] }
    }

    fn action_spec(&self) -> ActionSpec {
        ActionSpec { num_actions: 4 }
    }

    fn reset(&mut self) -> TimeStep<B> {
        self.elapsed = 0;
        self.resets += 1;
        self.current = TimeStep::first(Self::observation(&self.device));
        self.current.clone()
    }

    fn step(&mut self, _action: usize) -> Result<TimeStep<B>> {
        if self.current.is_last() {
            return Ok(self.reset());
        }

        self.elapsed += 1;
        let observation = Self::observation(&self.device);
        self.current = if self.elapsed >= self.episode_length {
            TimeStep::termination(observation, self.reward)
        } else {
            TimeStep::transition(observation, self.reward, 1.0)
        };
        Ok(self.current.clone())
    }

    fn current_time_step(&self) -> TimeStep<B> {
        self.current.clone()
    }
}

/// Always picks the same action
pub struct FixedActionPolicy(pub usize);

impl<B: Backend> Policy<B> for FixedActionPolicy {
    fn action(&mut self, _time_step: &TimeStep<B>) -> Result<ActionStep> {
        Ok(ActionStep {
            action: self.0,
            info: ActionInfo::Greedy,
        })
    }
}

/// Remembers every history it was asked to report
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub reports: Vec<Vec<f32>>,
}

impl ReturnReporter for RecordingReporter {
    fn report(&mut self, returns: &ReturnHistory) -> Result<()> {
        self.reports.push(returns.as_slice().to_vec());
        Ok(())
    }
}
