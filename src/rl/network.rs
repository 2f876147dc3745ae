//! Layer-descriptor networks for the 2048 agent
//!
//! A network is described by a list of [`LayerSpec`]s and interpreted by
//! [`SequentialNetwork`]. Activations flow as rank-3 tensors
//! `[batch, rows, features]`; dense layers act on the last axis and reshapes
//! rearrange the two inner axes. The final inner shape must be
//! `[1, outputs]`, which is flattened to `[batch, outputs]`.
//!
//! # Presets
//!
//! ```text
//! action_net (ActionNet):
//!   Input: [batch, 16, 16]
//!     ↓ Dense(32) + ReLU          [batch, 16, 32]
//!     ↓ Reshape 16x32 → 1x512     [batch, 1, 512]
//!     ↓ Dense(32) + ReLU          [batch, 1, 32]
//!     ↓ Dense(4) + Softmax        [batch, 1, 4]
//!   Output: [batch, 4] action probabilities
//!
//! q_network:
//!   Input: [batch, r, c]
//!     ↓ Reshape r x c → 1 x (r*c)
//!     ↓ Dense(h) + ReLU  (for each h in fc_layer_params)
//!     ↓ Dense(num_actions)
//!   Output: [batch, num_actions] Q-values
//! ```
//!
//! # Example
//!
//! ```rust
//! use ri2048::rl::{ActionSpec, NetworkConfig, ObservationSpec};
//! use burn::backend::ndarray::NdArrayDevice;
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//!
//! type Backend = NdArray<f32>;
//!
//! let device = NdArrayDevice::default();
//! let config = NetworkConfig::action_net(
//!     ObservationSpec { shape: [16, 16] },
//!     ActionSpec { num_actions: 4 },
//! );
//! let network = config.init::<Backend>(&device).unwrap();
//!
//! let observations = Tensor::zeros([8, 16, 16], &device);
//! let probabilities = network.forward(observations).unwrap();
//! assert_eq!(probabilities.dims(), [8, 4]);
//! ```

use burn::{
    module::{Ignored, Module},
    nn::{Linear, LinearConfig},
    tensor::{
        Tensor,
        activation::{relu, softmax},
        backend::Backend,
    },
};
use serde::{Deserialize, Serialize};

use super::time_step::{ActionSpec, ObservationSpec};
use crate::error::{Result, Ri2048Error};

/// Activation applied after a dense layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    /// Normalized over the feature axis
    Softmax,
    Linear,
}

impl Activation {
    fn apply<B: Backend>(self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        match self {
            Activation::Relu => relu(x),
            Activation::Softmax => softmax(x, 2),
            Activation::Linear => x,
        }
    }
}

/// One stage of a sequential network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerSpec {
    /// Fully connected layer over the feature axis
    Dense { units: usize, activation: Activation },
    /// Rearrange the inner `[rows, features]` shape; element count is kept
    Reshape { from: [usize; 2], to: [usize; 2] },
}

/// Configuration for a [`SequentialNetwork`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Shape of a single observation: `[rows, features]`
    pub input_shape: [usize; 2],
    pub layers: Vec<LayerSpec>,
}

impl NetworkConfig {
    pub fn new(input_shape: [usize; 2], layers: Vec<LayerSpec>) -> Self {
        Self {
            input_shape,
            layers,
        }
    }

    /// The fixed ActionNet architecture
    ///
    /// The reshape expects 16 observation rows; other observation specs fail
    /// at `init` with a shape mismatch.
    pub fn action_net(observation_spec: ObservationSpec, action_spec: ActionSpec) -> Self {
        Self::new(
            observation_spec.shape,
            vec![
                LayerSpec::Dense {
                    units: 32,
                    activation: Activation::Relu,
                },
                LayerSpec::Reshape {
                    from: [16, 32],
                    to: [1, 16 * 32],
                },
                LayerSpec::Dense {
                    units: 32,
                    activation: Activation::Relu,
                },
                LayerSpec::Dense {
                    units: action_spec.num_actions,
                    activation: Activation::Softmax,
                },
            ],
        )
    }

    /// Flatten, hidden ReLU layers, then a linear Q-value head
    pub fn q_network(
        observation_spec: ObservationSpec,
        action_spec: ActionSpec,
        fc_layer_params: &[usize],
    ) -> Self {
        let [rows, features] = observation_spec.shape;
        let mut layers = vec![LayerSpec::Reshape {
            from: [rows, features],
            to: [1, rows * features],
        }];

        layers.extend(fc_layer_params.iter().map(|&units| LayerSpec::Dense {
            units,
            activation: Activation::Relu,
        }));

        layers.push(LayerSpec::Dense {
            units: action_spec.num_actions,
            activation: Activation::Linear,
        });

        Self::new(observation_spec.shape, layers)
    }

    /// Walk the layers and compute the plan, checking every shape
    fn plan(&self) -> Result<NetworkPlan> {
        let mut shape = self.input_shape;
        let mut steps = Vec::with_capacity(self.layers.len());
        let mut dense_inputs = Vec::new();

        for layer in &self.layers {
            match *layer {
                LayerSpec::Dense { units, activation } => {
                    if units == 0 {
                        return Err(Ri2048Error::InvalidConfig(
                            "dense layer must have at least one unit".to_string(),
                        ));
                    }
                    steps.push(PlanStep::Dense {
                        layer: dense_inputs.len(),
                        activation,
                    });
                    dense_inputs.push((shape[1], units));
                    shape = [shape[0], units];
                }
                LayerSpec::Reshape { from, to } => {
                    if from != shape {
                        return Err(Ri2048Error::shape_mismatch("reshape input", from, shape));
                    }
                    if from[0] * from[1] != to[0] * to[1] {
                        return Err(Ri2048Error::shape_mismatch("reshape element count", from, to));
                    }
                    steps.push(PlanStep::Reshape { to });
                    shape = to;
                }
            }
        }

        if shape[0] != 1 {
            return Err(Ri2048Error::shape_mismatch(
                "network output",
                [1, shape[1]],
                shape,
            ));
        }

        Ok(NetworkPlan {
            input_shape: self.input_shape,
            output_size: shape[1],
            steps,
            dense_inputs,
        })
    }

    /// Initialize the network from this configuration
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<SequentialNetwork<B>> {
        let plan = self.plan()?;

        let dense = plan
            .dense_inputs
            .iter()
            .map(|&(d_input, d_output)| LinearConfig::new(d_input, d_output).init(device))
            .collect();

        Ok(SequentialNetwork {
            dense,
            plan: Ignored(plan),
        })
    }

    /// Initialize and check the output width against an action spec
    pub fn init_for_actions<B: Backend>(
        &self,
        action_spec: ActionSpec,
        device: &B::Device,
    ) -> Result<SequentialNetwork<B>> {
        let network = self.init(device)?;
        if network.num_outputs() != action_spec.num_actions {
            return Err(Ri2048Error::shape_mismatch(
                "network output vs action spec",
                [action_spec.num_actions],
                [network.num_outputs()],
            ));
        }
        Ok(network)
    }
}

/// Interpreted form of a [`NetworkConfig`]
#[derive(Debug, Clone)]
pub struct NetworkPlan {
    input_shape: [usize; 2],
    output_size: usize,
    steps: Vec<PlanStep>,
    /// `(d_input, d_output)` of each dense layer
    dense_inputs: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, Copy)]
pub enum PlanStep {
    Dense { layer: usize, activation: Activation },
    Reshape { to: [usize; 2] },
}

/// Sequential network interpreted from layer descriptors
///
/// Generic over the Backend, so the same network runs on the inference
/// backend for acting and on the autodiff backend for training.
#[derive(Module, Debug)]
pub struct SequentialNetwork<B: Backend> {
    dense: Vec<Linear<B>>,
    plan: Ignored<NetworkPlan>,
}

impl<B: Backend> SequentialNetwork<B> {
    /// Forward pass over a batch of observations
    ///
    /// # Arguments
    ///
    /// * `observations` - Tensor with shape `[batch, rows, features]`
    ///
    /// # Returns
    ///
    /// Tensor with shape `[batch, outputs]`, or `ShapeMismatch` when the inner
    /// observation shape differs from the configured input shape.
    pub fn forward(&self, observations: Tensor<B, 3>) -> Result<Tensor<B, 2>> {
        let [batch, rows, features] = observations.dims();
        if [rows, features] != self.plan.input_shape {
            return Err(Ri2048Error::shape_mismatch(
                "network input",
                self.plan.input_shape,
                [rows, features],
            ));
        }

        let mut x = observations;
        for step in &self.plan.steps {
            x = match *step {
                PlanStep::Dense { layer, activation } => {
                    activation.apply(self.dense[layer].forward(x))
                }
                PlanStep::Reshape { to } => x.reshape([batch, to[0], to[1]]),
            };
        }

        Ok(x.reshape([batch, self.plan.output_size]))
    }

    pub fn input_shape(&self) -> [usize; 2] {
        self.plan.input_shape
    }

    pub fn num_outputs(&self) -> usize {
        self.plan.output_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::Autodiff;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};
    use burn::tensor::{Distribution, TensorData};

    type TestBackend = NdArray<f32>;
    type TestAutodiffBackend = Autodiff<NdArray<f32>>;

    const OBS: ObservationSpec = ObservationSpec { shape: [16, 16] };
    const ACTIONS: ActionSpec = ActionSpec { num_actions: 4 };

    #[test]
    fn test_action_net_shapes() {
        let device = NdArrayDevice::default();
        let network = NetworkConfig::action_net(OBS, ACTIONS)
            .init::<TestBackend>(&device)
            .unwrap();

        for batch_size in [1, 4, 16] {
            let observations = Tensor::zeros([batch_size, 16, 16], &device);
            let output = network.forward(observations).unwrap();
            assert_eq!(output.dims(), [batch_size, 4]);
        }
    }

    #[test]
    fn test_action_net_outputs_distribution() {
        let device = NdArrayDevice::default();
        let network = NetworkConfig::action_net(OBS, ACTIONS)
            .init::<TestBackend>(&device)
            .unwrap();

        let observations =
            Tensor::random([3, 16, 16], Distribution::Uniform(0.0, 1.0), &device);
        let probabilities = network.forward(observations).unwrap();

        let data: TensorData = probabilities.into_data();
        let values = data.as_slice::<f32>().unwrap();
        for row in values.chunks(4) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "row should sum to 1, got {}", sum);
            assert!(row.iter().all(|&p| p >= 0.0));
        }
    }

    #[test]
    fn test_q_network_shapes() {
        let device = NdArrayDevice::default();
        let network = NetworkConfig::q_network(OBS, ACTIONS, &[100, 100, 100])
            .init_for_actions::<TestBackend>(ACTIONS, &device)
            .unwrap();

        let output = network.forward(Tensor::ones([2, 16, 16], &device)).unwrap();
        assert_eq!(output.dims(), [2, 4]);
        assert_eq!(network.num_outputs(), 4);
        assert_eq!(network.input_shape(), [16, 16]);
    }

    #[test]
    fn test_input_shape_mismatch() {
        let device = NdArrayDevice::default();
        let network = NetworkConfig::action_net(OBS, ACTIONS)
            .init::<TestBackend>(&device)
            .unwrap();

        let result = network.forward(Tensor::zeros([1, 4, 4], &device));
        assert!(matches!(result, Err(Ri2048Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_action_net_rejects_other_observation_rows() {
        let device = NdArrayDevice::default();
        let config = NetworkConfig::action_net(ObservationSpec { shape: [9, 16] }, ACTIONS);
        let result = config.init::<TestBackend>(&device);
        assert!(matches!(result, Err(Ri2048Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_reshape_element_count_mismatch() {
        let device = NdArrayDevice::default();
        let config = NetworkConfig::new(
            [4, 4],
            vec![LayerSpec::Reshape {
                from: [4, 4],
                to: [1, 15],
            }],
        );
        assert!(matches!(
            config.init::<TestBackend>(&device),
            Err(Ri2048Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_output_must_be_flat() {
        let device = NdArrayDevice::default();
        let config = NetworkConfig::new(
            [4, 4],
            vec![LayerSpec::Dense {
                units: 4,
                activation: Activation::Linear,
            }],
        );
        assert!(config.init::<TestBackend>(&device).is_err());
    }

    #[test]
    fn test_output_width_checked_against_action_spec() {
        let device = NdArrayDevice::default();
        let config = NetworkConfig::q_network(OBS, ActionSpec { num_actions: 3 }, &[8]);
        let result = config.init_for_actions::<TestBackend>(ACTIONS, &device);
        assert!(matches!(result, Err(Ri2048Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_gradient_flow() {
        let device = NdArrayDevice::default();
        let network = NetworkConfig::q_network(OBS, ACTIONS, &[16])
            .init::<TestAutodiffBackend>(&device)
            .unwrap();

        let observation = Tensor::ones([1, 16, 16], &device).require_grad();
        let loss = network.forward(observation.clone()).unwrap().sum();
        let gradients = loss.backward();

        assert!(
            observation.grad(&gradients).is_some(),
            "Gradients should flow back to input observation"
        );
    }

    #[test]
    fn test_batch_consistency() {
        let device = NdArrayDevice::default();
        let network = NetworkConfig::action_net(OBS, ACTIONS)
            .init::<TestBackend>(&device)
            .unwrap();

        let single = Tensor::<TestBackend, 3>::ones([1, 16, 16], &device);
        let batch = Tensor::cat(vec![single.clone(), single.clone(), single.clone()], 0);

        let single_out: TensorData = network.forward(single).unwrap().into_data();
        let batch_out: TensorData = network.forward(batch).unwrap().into_data();

        let single_vals = single_out.as_slice::<f32>().unwrap();
        let batch_vals = batch_out.as_slice::<f32>().unwrap();
        for j in 0..4 {
            assert!((single_vals[j] - batch_vals[j]).abs() < 1e-5);
        }
    }
}
