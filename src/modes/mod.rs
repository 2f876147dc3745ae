pub mod eval;
pub mod train;

#[cfg(test)]
pub(crate) mod testing;

pub use eval::compute_avg_return;
pub use train::{RunSeeds, TrainConfig, TrainMode, TrainPhase};
