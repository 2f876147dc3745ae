pub mod return_history;
pub mod training_stats;

pub use return_history::ReturnHistory;
pub use training_stats::TrainingStats;
