//! Error types shared by the environment, network, agent and buffer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Ri2048Error {
    #[error("shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("non-finite loss {loss} at train step {step}")]
    NonFiniteLoss { step: usize, loss: f32 },

    #[error("action {action} outside of action space of size {num_actions}")]
    InvalidAction { action: usize, num_actions: usize },

    #[error("plotting failed: {0}")]
    Plot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Ri2048Error {
    pub fn shape_mismatch(
        context: &'static str,
        expected: impl Into<Vec<usize>>,
        actual: impl Into<Vec<usize>>,
    ) -> Self {
        Self::ShapeMismatch {
            context,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Ri2048Error>;
