//! Sinks for the return history produced during training

pub mod plot;

pub use plot::{PlotReporter, return_curve};

use crate::error::Result;
use crate::metrics::ReturnHistory;

/// Receives the full return history after every training iteration
pub trait ReturnReporter {
    fn report(&mut self, returns: &ReturnHistory) -> Result<()>;
}
