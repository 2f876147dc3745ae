use burn::tensor::{Tensor, TensorData, backend::Backend};

use crate::game::{Board, NUM_CELLS};

/// Number of one-hot channels per cell (exponents 0..=15)
pub const TILE_CHANNELS: usize = 16;

/// Create a one-hot observation tensor from a board
///
/// Row `i` describes cell `i` (row-major); column `k` is 1.0 when the cell
/// holds exponent `k`. Column 0 marks empty cells. Exponents above 15 share
/// the last column.
///
/// Returns: Tensor<B, 2> with shape [16, 16]
pub fn create_observation<B: Backend>(board: &Board, device: &B::Device) -> Tensor<B, 2> {
    let mut data = vec![0.0f32; NUM_CELLS * TILE_CHANNELS];

    for (cell, &exponent) in board.cells().iter().enumerate() {
        let channel = (exponent as usize).min(TILE_CHANNELS - 1);
        data[cell * TILE_CHANNELS + channel] = 1.0;
    }

    let tensor_data = TensorData::new(data, [NUM_CELLS, TILE_CHANNELS]);

    Tensor::<B, 2>::from_data(tensor_data, device)
}
