//! Policy evaluation without learning

use burn::tensor::backend::Backend;
use tracing::debug;

use crate::error::{Result, Ri2048Error};
use crate::rl::{Environment, Policy};

/// Mean undiscounted return of `policy` over `num_episodes` full episodes
///
/// Each episode starts from `reset` and runs until a LAST time step. The
/// policy and environment are only stepped, never trained.
pub fn compute_avg_return<B, E, P>(env: &mut E, policy: &mut P, num_episodes: usize) -> Result<f32>
where
    B: Backend,
    E: Environment<B>,
    P: Policy<B>,
{
    if num_episodes == 0 {
        return Err(Ri2048Error::InvalidConfig(
            "num_episodes for evaluation must be at least 1".to_string(),
        ));
    }

    let mut total_return = 0.0;
    for episode in 0..num_episodes {
        let mut time_step = env.reset();
        let mut episode_return = 0.0;
        let mut steps = 0usize;

        while !time_step.is_last() {
            let action_step = policy.action(&time_step)?;
            time_step = env.step(action_step.action)?;
            episode_return += time_step.reward;
            steps += 1;
        }

        debug!(episode, steps, episode_return, "evaluation episode finished");
        total_return += episode_return;
    }

    Ok(total_return / num_episodes as f32)
}
