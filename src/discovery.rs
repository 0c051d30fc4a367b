//! Input discovery: directory walk and image filtering

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{PicslimError, Result};
use crate::processing::is_image;

/// A file found under the input root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path as reached from the input root
    pub path: PathBuf,
    /// Path relative to the input root, used to mirror the output tree
    pub relative: PathBuf,
}

/// List the files under `root`, depth-first in directory listing order
///
/// Subdirectories are descended only when `recursive` is set and are never
/// returned themselves. A missing root yields no files. Any other failure to
/// read the root is fatal; failures below it are logged and that subtree is
/// skipped.
pub fn walk<P: AsRef<Path>>(root: P, recursive: bool) -> Result<Vec<DiscoveredFile>> {
    let root = root.as_ref();

    match std::fs::metadata(root) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            return Err(PicslimError::walk(root.to_path_buf(), "not a directory"));
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Input directory {:?} does not exist", root);
            return Ok(Vec::new());
        }
        Err(e) => return Err(PicslimError::walk(root.to_path_buf(), e.to_string())),
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                if e.depth() == 0 {
                    return Err(PicslimError::walk(path, e.to_string()));
                }
                warn!("Error walking directory {:?}: {}", path, e);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.into_path();
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        files.push(DiscoveredFile { path, relative });
    }

    debug!("Walked {:?}: {} files", root, files.len());
    Ok(files)
}

/// Keep only supported input images, preserving order
pub fn filter_images(files: Vec<DiscoveredFile>) -> Vec<DiscoveredFile> {
    files.into_iter().filter(|file| is_image(&file.path)).collect()
}

/// Walk `root` and return the images found
pub fn discover_images<P: AsRef<Path>>(root: P, recursive: bool) -> Result<Vec<DiscoveredFile>> {
    walk(root, recursive).map(filter_images)
}
