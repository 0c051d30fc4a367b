//! Picslim - Batch Image Optimizer
//!
//! Walks a directory tree, resizes JPEG and PNG images to a bounding box,
//! re-encodes them and optionally emits WebP/AVIF siblings into a mirrored
//! output tree.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use picslim::{config::ConfigOverrides, parallel::NoProgress};
//!
//! # async fn example() -> picslim::Result<()> {
//! let config = picslim::config::resolve(None, &ConfigOverrides {
//!     formats: Some("source,webp".to_string()),
//!     max_width: Some(1920),
//!     ..Default::default()
//! })?;
//!
//! let outcome = picslim::optimize(&config, Arc::new(NoProgress)).await?;
//! println!("Processed: {}, errors: {}", outcome.completed, outcome.errors.len());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod discovery;
pub mod error;
pub mod parallel;
pub mod processing;
pub mod report;

use std::sync::Arc;
use tracing::info;

// Re-export commonly used types
pub use config::{ConfigOverrides, ConfigResolver, EffectiveConfig, FormatSpec};
pub use discovery::DiscoveredFile;
pub use error::{PicslimError, Result};
pub use parallel::{BatchOutcome, BatchScheduler, ProgressSink};
pub use processing::{ImageTaskResult, ProcessingEngine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `default_level`. Calling this more than
/// once is harmless.
pub fn init_logging(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        info!("Picslim v{} initialized", VERSION);
    }
}

/// Run one optimization pass with the default codec
///
/// Returns an error only for fatal conditions (an unreadable input root);
/// per-image failures are reported in the outcome.
pub async fn optimize(config: &EffectiveConfig, progress: Arc<dyn ProgressSink>) -> Result<BatchOutcome> {
    optimize_with(ProcessingEngine::new(), config, progress).await
}

/// Run one optimization pass with a specific engine
pub async fn optimize_with(
    engine: ProcessingEngine,
    config: &EffectiveConfig,
    progress: Arc<dyn ProgressSink>,
) -> Result<BatchOutcome> {
    info!("Input: {:?}", config.input_dir);
    info!("Output: {:?}", config.output_dir);

    let images = {
        let root = config.input_dir.clone();
        let recursive = config.recursive;
        tokio::task::spawn_blocking(move || discovery::discover_images(root, recursive))
            .await
            .map_err(|e| PicslimError::system(format!("Task join error: {}", e)))??
    };

    if images.is_empty() {
        info!("No images found in {:?}", config.input_dir);
        return Ok(BatchOutcome::default());
    }

    info!("Found {} images to process", images.len());

    let scheduler = BatchScheduler::from_config(engine, config).with_progress(progress);
    Ok(scheduler.run(&images, config).await)
}
