//! Per-image processing: resize once, fan out to every requested format

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use futures::future::try_join_all;
use tokio::fs;
use tracing::debug;

use crate::config::EffectiveConfig;
use crate::error::{ErrorContext, PicslimError, Result};

pub mod codec;
pub mod formats;
pub mod resize;

pub use codec::*;
pub use formats::*;
pub use resize::*;

/// Outcome of processing one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTaskResult {
    /// Path relative to the input root
    pub file: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}

impl ImageTaskResult {
    pub fn succeeded(file: PathBuf) -> Self {
        Self {
            file,
            success: true,
            error: None,
        }
    }

    /// Create a failed result carrying the error's message
    pub fn failed(file: PathBuf, error: &PicslimError) -> Self {
        Self {
            file,
            success: false,
            error: Some(error.user_message()),
        }
    }
}

/// Core processing engine; cheap to clone and share between tasks
#[derive(Clone)]
pub struct ProcessingEngine {
    codec: Arc<dyn ImageCodec>,
}

impl ProcessingEngine {
    /// Create an engine backed by the `image` crate codec
    pub fn new() -> Self {
        Self::with_codec(Arc::new(ImageCrateCodec::new()))
    }

    pub fn with_codec(codec: Arc<dyn ImageCodec>) -> Self {
        Self { codec }
    }

    /// Process one image into `output_root`, mirroring `relative_path`
    ///
    /// Never fails: any error is captured in the returned result.
    pub async fn process_image(
        &self,
        input_path: &Path,
        output_root: &Path,
        relative_path: &Path,
        config: &EffectiveConfig,
    ) -> ImageTaskResult {
        let start_time = Instant::now();

        match self.run(input_path, output_root, relative_path, config).await {
            Ok(written) => {
                debug!(
                    "Processed {:?} ({} outputs) in {:.2}s",
                    relative_path,
                    written,
                    start_time.elapsed().as_secs_f64()
                );
                ImageTaskResult::succeeded(relative_path.to_path_buf())
            }
            Err(e) => {
                match e.file_path() {
                    Some(path) => debug!("Failed to process {:?} at {:?}: {}", relative_path, path, e),
                    None => debug!("Failed to process {:?}: {}", relative_path, e),
                }
                ImageTaskResult::failed(relative_path.to_path_buf(), &e)
            }
        }
    }

    async fn run(
        &self,
        input_path: &Path,
        output_root: &Path,
        relative_path: &Path,
        config: &EffectiveConfig,
    ) -> Result<usize> {
        let output_path = output_root.join(relative_path);

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_file_context(parent.to_path_buf())?;
        }

        let metadata = {
            let codec = Arc::clone(&self.codec);
            let path = input_path.to_path_buf();
            blocking(move || codec.read_metadata(&path)).await?
        };
        debug!("Loaded {:?}: {}x{}", input_path, metadata.width, metadata.height);

        let targets = output_targets(&output_path, source_format(input_path), &config.formats);
        for format in &config.formats {
            if let crate::config::FormatSpec::Other(name) = format {
                debug!("Ignoring unrecognized output format '{}'", name);
            }
        }
        if targets.is_empty() {
            return Ok(0);
        }

        let image = {
            let codec = Arc::clone(&self.codec);
            let path = input_path.to_path_buf();
            let bounds = config.bounds();
            blocking(move || {
                let image = codec.decode(&path)?;
                Ok(match bounds {
                    Some(bounds) => codec.resize(image, bounds),
                    None => image,
                })
            })
            .await?
        };
        let image = Arc::new(image);

        let options = EncodeOptions {
            quality: config.quality,
            compression_level: config.compression_level,
        };

        let jobs = targets.iter().map(|target| {
            let codec = Arc::clone(&self.codec);
            let image = Arc::clone(&image);
            let target = target.clone();
            blocking(move || codec.encode_to_file(&image, target.format, options, &target.path))
        });
        try_join_all(jobs).await?;

        Ok(targets.len())
    }
}

impl Default for ProcessingEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Run blocking codec work off the async workers
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PicslimError::system(format!("Task join error: {}", e)))?
}
