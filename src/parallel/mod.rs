//! Batch scheduling and progress reporting

use std::time::Duration;

use crate::processing::ImageTaskResult;

pub mod progress;
pub mod scheduler;

pub use progress::*;
pub use scheduler::*;

/// Result of a whole batch run
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Images finished, successful or not
    pub completed: usize,
    /// Failed results, in completion order
    pub errors: Vec<ImageTaskResult>,
    /// Number of sequential batches executed
    pub batches: usize,
    pub elapsed: Duration,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.completed.saturating_sub(self.errors.len())
    }

    /// Throughput over the whole run
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.is_zero() {
            return 0.0;
        }
        self.completed as f64 / self.elapsed.as_secs_f64()
    }
}
