//! Configuration resolution for Picslim
//!
//! The effective configuration is built from three layers in ascending
//! precedence: built-in defaults, an optional configuration file, and
//! explicit (command-line) overrides. Each field is merged independently.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{PicslimError, Result};
use crate::processing::Bounds;

pub mod file;
pub use file::*;

/// Configuration file probed in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

pub const DEFAULT_INPUT_DIR: &str = "./";
pub const DEFAULT_OUTPUT_DIR: &str = "./min";
pub const DEFAULT_QUALITY: u32 = 80;
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 9;

/// One requested output format
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormatSpec {
    /// Re-encode in the input's own container (JPEG or PNG)
    Source,
    WebP,
    Avif,
    /// Unrecognized token, carried through and ignored by the task
    Other(String),
}

impl FormatSpec {
    /// Parse a single format token (trimmed, case-insensitive)
    pub fn parse(token: &str) -> Self {
        let token = token.trim().to_lowercase();
        match token.as_str() {
            "source" => Self::Source,
            "webp" => Self::WebP,
            "avif" => Self::Avif,
            _ => Self::Other(token),
        }
    }

    /// Name of the format as written in configuration
    pub fn name(&self) -> &str {
        match self {
            Self::Source => "source",
            Self::WebP => "webp",
            Self::Avif => "avif",
            Self::Other(name) => name,
        }
    }
}

/// Parse a comma-separated format list into an ordered, de-duplicated set
pub fn parse_format_list(list: &str) -> Vec<FormatSpec> {
    collect_formats(list.split(','))
}

fn collect_formats<'a, I: IntoIterator<Item = &'a str>>(tokens: I) -> Vec<FormatSpec> {
    let mut formats: Vec<FormatSpec> = Vec::new();
    for token in tokens {
        if token.trim().is_empty() {
            continue;
        }
        let format = FormatSpec::parse(token);
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    formats
}

/// Fully merged, validated configuration for one run
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Encoder quality (1-100)
    pub quality: u8,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// PNG compression level (0-9)
    pub compression_level: u8,
    pub formats: Vec<FormatSpec>,
    pub recursive: bool,
    /// Batch size for the scheduler (None = number of CPUs)
    pub concurrency: Option<usize>,
}

impl EffectiveConfig {
    /// Bounding box for resizing, if either dimension is constrained
    pub fn bounds(&self) -> Option<Bounds> {
        if self.max_width.is_none() && self.max_height.is_none() {
            return None;
        }
        Some(Bounds {
            max_width: self.max_width,
            max_height: self.max_height,
        })
    }

    /// Whether the given output format was requested
    pub fn wants(&self, format: &FormatSpec) -> bool {
        self.formats.contains(format)
    }

    /// Number of images processed concurrently per batch
    pub fn concurrency_level(&self) -> usize {
        self.concurrency
            .filter(|&n| n > 0)
            .unwrap_or_else(num_cpus::get)
            .max(1)
    }
}

/// Explicit overrides, typically collected from the command line
///
/// `None` and empty strings leave the lower layers untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
    pub quality: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub compression_level: Option<u32>,
    /// Comma-separated list, e.g. `"source, WebP"`
    pub formats: Option<String>,
    pub recursive: Option<bool>,
    pub concurrency: Option<usize>,
}

impl From<&ConfigOverrides> for ConfigLayer {
    fn from(overrides: &ConfigOverrides) -> Self {
        let non_empty = |value: &Option<String>| value.clone().filter(|s| !s.trim().is_empty());

        Self {
            input_dir: non_empty(&overrides.input_dir),
            output_dir: non_empty(&overrides.output_dir),
            quality: overrides.quality,
            max_width: overrides.max_width,
            max_height: overrides.max_height,
            compression_level: overrides.compression_level,
            formats: non_empty(&overrides.formats).map(|list| {
                parse_format_list(&list)
                    .iter()
                    .map(|f| f.name().to_string())
                    .collect()
            }),
            recursive: overrides.recursive,
            concurrency: overrides.concurrency,
        }
    }
}

impl ConfigLayer {
    /// Built-in defaults, the lowest-precedence layer
    pub fn defaults() -> Self {
        Self {
            input_dir: Some(DEFAULT_INPUT_DIR.to_string()),
            output_dir: Some(DEFAULT_OUTPUT_DIR.to_string()),
            quality: Some(DEFAULT_QUALITY),
            max_width: None,
            max_height: None,
            compression_level: Some(DEFAULT_COMPRESSION_LEVEL),
            formats: Some(vec![FormatSpec::Source.name().to_string()]),
            recursive: Some(false),
            concurrency: None,
        }
    }

    /// Merge with another layer (other takes precedence, field by field)
    pub fn merge(self, other: ConfigLayer) -> Self {
        Self {
            input_dir: other.input_dir.or(self.input_dir),
            output_dir: other.output_dir.or(self.output_dir),
            quality: other.quality.or(self.quality),
            max_width: other.max_width.or(self.max_width),
            max_height: other.max_height.or(self.max_height),
            compression_level: other.compression_level.or(self.compression_level),
            formats: other.formats.or(self.formats),
            recursive: other.recursive.or(self.recursive),
            concurrency: other.concurrency.or(self.concurrency),
        }
    }

    /// Validate the merged layer and turn it into an effective configuration
    pub fn finalize(self) -> Result<EffectiveConfig> {
        let input_dir = required_dir("inputDir", self.input_dir)?;
        let output_dir = required_dir("outputDir", self.output_dir)?;

        let quality = self.quality.unwrap_or(DEFAULT_QUALITY);
        if !(1..=100).contains(&quality) {
            return Err(PicslimError::config(format!(
                "quality must be between 1 and 100, got {}",
                quality
            )));
        }

        let compression_level = self.compression_level.unwrap_or(DEFAULT_COMPRESSION_LEVEL);
        if compression_level > 9 {
            return Err(PicslimError::config(format!(
                "compressionLevel must be between 0 and 9, got {}",
                compression_level
            )));
        }

        let formats = self
            .formats
            .map(|list| collect_formats(list.iter().map(String::as_str)))
            .unwrap_or_else(|| vec![FormatSpec::Source]);

        Ok(EffectiveConfig {
            input_dir,
            output_dir,
            quality: quality as u8,
            max_width: self.max_width.filter(|&w| w > 0),
            max_height: self.max_height.filter(|&h| h > 0),
            compression_level: compression_level as u8,
            formats,
            recursive: self.recursive.unwrap_or(false),
            concurrency: self.concurrency.filter(|&n| n > 0),
        })
    }
}

fn required_dir(field: &str, value: Option<String>) -> Result<PathBuf> {
    let value = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| PicslimError::config(format!("{} must not be empty", field)))?;

    if value == "." {
        return std::env::current_dir().map_err(|e| {
            PicslimError::config(format!("Cannot resolve '.' for {}: {}", field, e))
        });
    }

    Ok(PathBuf::from(value))
}

/// Resolves the effective configuration from defaults, file and overrides
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    default_file: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver that probes `config.json` when no file is given
    pub fn new() -> Self {
        Self {
            default_file: Some(PathBuf::from(DEFAULT_CONFIG_FILE)),
        }
    }

    /// Do not probe any file when no explicit path is given
    pub fn without_default_file(mut self) -> Self {
        self.default_file = None;
        self
    }

    /// Merge defaults, the configuration file and overrides
    pub fn resolve(
        &self,
        config_file: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<EffectiveConfig> {
        let file_layer = match config_file {
            Some(path) => load_layer_or_fallback(path, true),
            None => match &self.default_file {
                Some(path) => load_layer_or_fallback(path, false),
                None => ConfigLayer::default(),
            },
        };

        let config = ConfigLayer::defaults()
            .merge(file_layer)
            .merge(ConfigLayer::from(overrides))
            .finalize()?;

        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve with the default resolver
pub fn resolve(config_file: Option<&Path>, overrides: &ConfigOverrides) -> Result<EffectiveConfig> {
    ConfigResolver::new().resolve(config_file, overrides)
}
