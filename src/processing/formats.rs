//! Image format detection and output naming

use std::path::{Path, PathBuf};
use crate::config::FormatSpec;

/// Extensions accepted as input images
pub fn supported_input_formats() -> &'static [&'static str] {
    &["jpg", "jpeg", "png"]
}

/// Supported input extension the file name ends with, lowercased
///
/// Matches on the whole file name so dotfiles such as `.png` count too.
fn input_extension(path: &Path) -> Option<&'static str> {
    let name = path.file_name()?.to_str()?.to_lowercase();
    supported_input_formats()
        .iter()
        .copied()
        .find(|ext| name.strip_suffix(ext).is_some_and(|stem| stem.ends_with('.')))
}

/// Check whether a path names a supported input image, by extension only
pub fn is_image<P: AsRef<Path>>(path: P) -> bool {
    input_extension(path.as_ref()).is_some()
}

/// Concrete container written to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Avif,
}

impl OutputFormat {
    /// Get file extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Avif => "avif",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Avif => "avif",
        }
    }
}

/// Source container of an input path, if it can be re-encoded as itself
pub fn source_format<P: AsRef<Path>>(path: P) -> Option<OutputFormat> {
    match input_extension(path.as_ref())? {
        "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
        "png" => Some(OutputFormat::Png),
        _ => None,
    }
}

/// One encode job: which container goes to which path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub format: OutputFormat,
    pub path: PathBuf,
}

/// Compute the output files for one input
///
/// `source` keeps the relative path as-is; additional formats become siblings
/// sharing the file stem. Unrecognized formats produce no target.
pub fn output_targets(
    output_path: &Path,
    source: Option<OutputFormat>,
    formats: &[FormatSpec],
) -> Vec<OutputTarget> {
    let mut targets = Vec::new();

    for format in formats {
        let target = match format {
            FormatSpec::Source => source.map(|format| OutputTarget {
                format,
                path: output_path.to_path_buf(),
            }),
            FormatSpec::WebP => Some(OutputTarget {
                format: OutputFormat::WebP,
                path: output_path.with_extension(OutputFormat::WebP.extension()),
            }),
            FormatSpec::Avif => Some(OutputTarget {
                format: OutputFormat::Avif,
                path: output_path.with_extension(OutputFormat::Avif.extension()),
            }),
            FormatSpec::Other(_) => None,
        };
        targets.extend(target);
    }

    targets
}
