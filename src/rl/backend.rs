//! Backend type aliases and device management
//!
//! - **TrainingBackend**: autodiff NdArray backend, used by the DQN agent
//! - **InferenceBackend**: plain NdArray backend, used by environments,
//!   policies and the replay buffer
//!
//! The 2048 board and the Q-network are small enough that the CPU backend
//! keeps up with environment stepping.
//!
//! # Example
//!
//! ```rust
//! use ri2048::rl::{ActionSpec, NetworkConfig, ObservationSpec, TrainingBackend, default_device};
//!
//! let device = default_device();
//! let network = NetworkConfig::q_network(
//!     ObservationSpec { shape: [16, 16] },
//!     ActionSpec { num_actions: 4 },
//!     &[32],
//! )
//! .init::<TrainingBackend>(&device)
//! .unwrap();
//! assert_eq!(network.num_outputs(), 4);
//! ```

use burn::backend::{
    Autodiff,
    ndarray::{NdArray, NdArrayDevice},
};

/// Backend with automatic differentiation, for the Q-network being trained
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Backend without gradient tracking, for acting and storing experience
pub type InferenceBackend = NdArray<f32>;

/// The CPU device shared by both backends
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}
