//! Error types and handling for Picslim

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Picslim operations
pub type Result<T> = std::result::Result<T, PicslimError>;

/// Main error type for Picslim operations
#[derive(Debug, Error)]
pub enum PicslimError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image decode or encode errors raised by the codec
    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Configuration errors (fatal)
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory traversal errors
    #[error("Cannot read directory {path:?}: {message}")]
    WalkError { path: PathBuf, message: String },

    /// A single output format failed to encode or write
    #[error("Failed to write {format} output {file:?}: {message}")]
    EncodeError {
        format: String,
        message: String,
        file: Option<PathBuf>,
    },

    /// I/O failure on a known path
    #[error("I/O error on {path:?}: {source}")]
    FileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerdeError(String),

    /// System resource errors
    #[error("System resource error: {message}")]
    SystemError { message: String },
}

impl PicslimError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new directory traversal error
    pub fn walk<S: Into<String>>(path: PathBuf, message: S) -> Self {
        Self::WalkError {
            path,
            message: message.into(),
        }
    }

    /// Create a new encode error for one output format
    pub fn encode<F: Into<String>, S: Into<String>>(format: F, message: S, file: Option<PathBuf>) -> Self {
        Self::EncodeError {
            format: format.into(),
            message: message.into(),
            file,
        }
    }

    /// Create a new system error
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::SystemError {
            message: message.into(),
        }
    }

    /// Get the associated file path if available
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::EncodeError { file, .. } => file.as_ref(),
            Self::WalkError { path, .. } | Self::FileError { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::IoError(e) => format!("File system error: {}", e),
            Self::ImageError(e) => format!("Image processing failed: {}", e),
            Self::EncodeError { format, message, .. } => {
                format!("{} encoding failed: {}", format, message)
            }
            Self::FileError { path, source } => {
                format!("File system error at {}: {}", path.display(), source)
            }
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for PicslimError {
    fn from(err: toml::de::Error) -> Self {
        Self::SerdeError(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for PicslimError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerdeError(format!("YAML parsing error: {}", err))
    }
}

impl From<serde_json::Error> for PicslimError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerdeError(format!("JSON parsing error: {}", err))
    }
}

/// Error context extension for adding file path information
pub trait ErrorContext<T> {
    /// Attach `file` to errors that do not name a path yet
    ///
    /// Bare I/O errors become [`PicslimError::FileError`].
    fn with_file_context(self, file: PathBuf) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<PicslimError>,
{
    fn with_file_context(self, file: PathBuf) -> Result<T> {
        self.map_err(|e| match e.into() {
            PicslimError::IoError(source) => PicslimError::FileError { path: file, source },
            PicslimError::EncodeError {
                format,
                message,
                file: None,
            } => PicslimError::EncodeError {
                format,
                message,
                file: Some(file),
            },
            other => other,
        })
    }
}
