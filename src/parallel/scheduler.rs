//! Wave scheduling of image tasks with bounded concurrency

use std::sync::Arc;
use std::time::Instant;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info};

use crate::config::EffectiveConfig;
use crate::discovery::DiscoveredFile;
use crate::error::PicslimError;
use crate::parallel::progress::{NoProgress, ProgressSink};
use crate::parallel::BatchOutcome;
use crate::processing::{ImageTaskResult, ProcessingEngine};

/// Runs image tasks in consecutive batches of `concurrency` images
///
/// All tasks of a batch run concurrently and the next batch starts only
/// once every member of the current one has finished, so at most
/// `concurrency` images are in flight at any time.
pub struct BatchScheduler {
    engine: ProcessingEngine,
    concurrency: usize,
    progress: Arc<dyn ProgressSink>,
}

impl BatchScheduler {
    /// Create a scheduler; a concurrency of zero is treated as one
    pub fn new(engine: ProcessingEngine, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        info!("Initializing batch scheduler with {} concurrent tasks", concurrency);

        Self {
            engine,
            concurrency,
            progress: Arc::new(NoProgress),
        }
    }

    /// Create a scheduler sized by the configuration
    pub fn from_config(engine: ProcessingEngine, config: &EffectiveConfig) -> Self {
        Self::new(engine, config.concurrency_level())
    }

    /// Report progress to the given sink
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Number of sequential batches needed for `images` files
    pub fn batch_count(&self, images: usize) -> usize {
        images.div_ceil(self.concurrency)
    }

    /// Process every image, writing outputs under `config.output_dir`
    ///
    /// Failures never abort the run; they are collected in completion order.
    pub async fn run(&self, images: &[DiscoveredFile], config: &EffectiveConfig) -> BatchOutcome {
        let start_time = Instant::now();
        let config = Arc::new(config.clone());
        let total = images.len();

        info!("Processing {} images in {} batches", total, self.batch_count(total));
        self.progress.start(total as u64);

        let mut completed = 0usize;
        let mut errors = Vec::new();
        let mut batches = 0usize;

        for (index, batch) in images.chunks(self.concurrency).enumerate() {
            debug!("Starting batch {} ({} images)", index + 1, batch.len());
            batches += 1;

            let mut in_flight: FuturesUnordered<_> = batch
                .iter()
                .map(|file| self.spawn_task(file.clone(), Arc::clone(&config)))
                .collect();

            while let Some(result) = in_flight.next().await {
                completed += 1;
                self.progress.update(completed as u64);

                if !result.success {
                    errors.push(result);
                }
            }
        }

        self.progress.stop();

        let outcome = BatchOutcome {
            completed,
            errors,
            batches,
            elapsed: start_time.elapsed(),
        };

        info!(
            "Batch processing completed in {:.2}s: {} succeeded, {} failed ({:.1} files/s)",
            outcome.elapsed.as_secs_f64(),
            outcome.succeeded(),
            outcome.errors.len(),
            outcome.files_per_second()
        );

        outcome
    }

    fn spawn_task(
        &self,
        file: DiscoveredFile,
        config: Arc<EffectiveConfig>,
    ) -> impl std::future::Future<Output = ImageTaskResult> {
        let engine = self.engine.clone();
        let relative = file.relative.clone();

        let handle = tokio::spawn(async move {
            engine
                .process_image(&file.path, &config.output_dir, &file.relative, &config)
                .await
        });

        async move {
            handle.await.unwrap_or_else(|e| {
                ImageTaskResult::failed(relative, &PicslimError::system(format!("Task join error: {}", e)))
            })
        }
    }
}
